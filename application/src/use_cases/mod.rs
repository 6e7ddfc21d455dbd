//! Use cases for the application layer

pub mod fanout;
pub mod run_council;
pub mod stream_council;
