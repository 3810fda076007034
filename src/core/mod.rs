//! Core types and traits for the echo probe
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

pub use self::error::{DecodeError, Error, ErrorKind, Result};
pub use self::types::{Config, MismatchPolicy, NodeId, PeerEntry};

/// Default UDP port for echo probes
pub const DEFAULT_PORT: u16 = 4444;

/// Largest datagram the endpoint will read
pub const MAX_DATAGRAM_SIZE: usize = 1500;
