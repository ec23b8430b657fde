//! Realtime output stream modules.
//!
//! - `proto`: wire envelopes and the device message payload.
//! - `session`: stream sessions, the reader worker, and close handles.

/// Wire envelope and device message types.
pub mod proto;
/// Stream session lifecycle and receive loop.
pub mod session;
