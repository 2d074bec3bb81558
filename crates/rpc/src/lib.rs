//! Message channel between the host and the re-evaluation worker.
//!
//! This crate provides the wire layer only:
//! * `Envelope`: the `{ "type": ..., "data": ... }` frame every message travels in
//! * `HostMessage` / `CoreMessage`: typed views of the two directions
//! * `JsonLinesReader` / `JsonLinesWriter`: one envelope per line over async IO

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{JsonLinesReader, JsonLinesWriter};
pub use error::{Error, Result};
pub use message::{CoreMessage, Envelope, HostMessage, MarkText};
