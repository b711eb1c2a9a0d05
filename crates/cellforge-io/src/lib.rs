//! # Cellforge I/O
//!
//! GDS-II output for the Cellforge layout kernel: an in-memory library
//! model, the binary stream writer that serializes it, and the recursive
//! emitter that materializes a resolved cell hierarchy into the library.

pub mod emit;
pub mod gds;

pub use emit::{ExportError, GdsExporter};
pub use gds::{GdsCell, GdsElement, GdsError, GdsLibrary};
