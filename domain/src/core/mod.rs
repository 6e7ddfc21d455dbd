//! Core domain types shared across all council stages

pub mod model;
pub mod question;
