//! Response services shared by handlers.

pub mod relay;
