//! Streaming event output.

pub mod printer;
