//! Core value types shared between the host protocol and the re-evaluation engine.

/// Edit notifications reported by the host.
pub mod edit;
/// Host-visible range annotation handles.
pub mod marker;
/// Document coordinates and their total order.
pub mod position;

pub use edit::EditNotice;
pub use marker::{MarkerId, MarkerStyle};
pub use position::Position;
