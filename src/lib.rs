//! User-facing Rust SDK for the FleetLink IoT cloud.
//!
//! The crate is organized by transport surface:
//! - `client`: authenticated REST request/response pipeline.
//! - `stream`: realtime websocket output streams and protocol types.
//! - `downstream`: messages sent down to devices.
//! - `output`: polymorphic output configurations.
//! - `field`: tri-state optional fields for partial updates.

pub(crate) mod base64_bytes;
/// REST client, request verbs, and the client error taxonomy.
pub mod client;
/// Downstream message types and send/broadcast operations.
pub mod downstream;
/// Tri-state optional field wrapper.
pub mod field;
/// Output configuration variants and their wire record.
pub mod output;
/// Realtime output stream session, protocol types, and close handles.
pub mod stream;
/// Shared resource types embedded in stream payloads.
pub mod types;

pub use client::{Client, ClientError, Error, DEFAULT_ADDR};
pub use field::Field;
