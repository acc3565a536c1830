//! JPEG container plumbing.
//!
//! This module handles the byte-level side of UltraHDR files:
//! - header segment walking and APP1/APP2 helpers
//! - locating the embedded JPEG streams
//! - MPF (Multi-Picture Format) directories
//! - the XMP gain map codec
//! - the boundary to the pixel codec

pub mod codec;
pub mod mpf;
pub mod parser;
pub mod scanner;
pub mod writer;
pub mod xmp;

pub use parser::{AppSegment, MarkerType, Segment};
pub use scanner::scan_jpegs;
pub use writer::JpegWriter;
