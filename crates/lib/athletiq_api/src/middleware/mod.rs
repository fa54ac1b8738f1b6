//! Router-wide layers.

pub mod cors;
