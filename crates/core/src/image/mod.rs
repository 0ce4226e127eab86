//! Signature image handling.
//!
//! - `decoder` - PNG payload decoding to 8-bit raster samples
//! - `xobject` - image XObject construction and registration

pub mod decoder;
pub mod xobject;

pub use decoder::{ColorModel, RasterImage, decode_png};
pub use xobject::{EmbeddedImage, register_image};
