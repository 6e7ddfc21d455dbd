//! Conversation turn types exchanged with providers

pub mod message;
