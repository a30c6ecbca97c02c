//! Ambient utilities shared by the settlement binaries.

pub mod logging;
