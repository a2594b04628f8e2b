//! Shared types for ringdump
//!
//! This crate holds the types every other ringdump crate agrees on: the
//! error enum, the `Result` alias, and the packet record passed from the
//! capture source to the output sink.

pub mod error;
pub mod packet;

pub use error::{Error, Result};
pub use packet::{PacketRecord, RecordHeader};
