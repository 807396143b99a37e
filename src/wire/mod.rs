//! Wire-level types: command objects and message framing

pub mod command;
pub mod framing;

pub use command::{Command, Reply};
pub use framing::{Framing, HalfClose, LengthPrefixed};
