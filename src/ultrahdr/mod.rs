//! UltraHDR (JPEG/R) container operations.
//!
//! Everything here works on whole container buffers: splitting and joining
//! the two streams, metadata bundles, detection, and the pixel pipelines
//! (decode, encode, resize, rebase) built on [`crate::gainmap`].

pub mod bundle;
pub mod container;
pub mod decoder;
pub mod detect;
pub mod encoder;
pub mod rebase;
pub mod resize;
pub mod split;

pub use bundle::MetadataBundle;
pub use container::{assemble_container, assemble_with_metadata};
pub use decoder::{decode, extract_base, probe, split_with_dimensions, Decoded};
pub use detect::{has_gainmap_metadata, is_ultra_hdr};
pub use encoder::{encode, encode_pixels, Encoded};
pub use rebase::{rebase_ultrahdr, Rebased};
pub use resize::{resize_jpeg, resize_ultrahdr, Resized};
pub use split::{extract_metadata, join, join_with_segments, split, MetadataSegments, SplitResult};
