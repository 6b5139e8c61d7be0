//! Episode sequencing on top of a simulation backend.

pub mod session;
