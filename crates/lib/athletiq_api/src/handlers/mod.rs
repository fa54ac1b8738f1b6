//! Request handlers.

pub mod coach;
