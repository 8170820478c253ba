#![no_std]

//! Bridges the CAN bus of a Pyromat wood-fired oven onto a LoRa uplink.
//!
//! Frames from the oven controller are decoded through a [`Catalog`] into an
//! [`OvenRecord`], which is sent as 36 raw bytes once per period and then
//! reset:
//!
//! ```text
//! bus ─▶ IngestLoop ─▶ SharedRecord ─▶ TransmitLoop ─▶ radio
//! ```

mod bridge;
mod catalog;
mod codec;
mod config;
mod decoder;
mod field;
mod frame;
mod ingest;
mod lifecycle;
mod radio;
mod record;
mod shared;
mod transmit;

/// Words in a telemetry record, node id included
pub const FIELD_COUNT: usize = 18;
/// Bytes in a transmitted record
pub const RECORD_LEN: usize = FIELD_COUNT * 2;
/// A payload has room for three words after the sub-identifier
pub const MAX_SLOTS_PER_ENTRY: usize = 3;

pub use bridge::*;
pub use catalog::*;
pub use config::*;
pub use decoder::*;
pub use field::*;
pub use frame::*;
pub use ingest::*;
pub use lifecycle::*;
pub use radio::*;
pub use record::*;
pub use shared::*;
pub use transmit::*;

pub use embedded_can::{ExtendedId, Id, StandardId};
