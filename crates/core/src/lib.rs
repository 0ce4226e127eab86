//! signflow-core - PDF signature compositing engine.
//!
//! Stamps a raster signature image onto one page of an existing PDF
//! without re-flowing or re-encoding any other page content. The crate
//! carries its own minimal PDF object model, parser and writer covering
//! the object/stream/xref subset that image embedding needs - it is not a
//! general-purpose PDF editor, and makes no attempt to repair malformed
//! documents.
//!
//! The orchestrated entry point is [`compose`]; the capture-space to
//! document-space conversion lives in [`to_document_space`].

pub mod compose;
pub mod document;
pub mod error;
pub mod geom;
pub mod image;
pub mod model;
pub mod parser;
pub mod writer;

pub use compose::compose;
pub use document::catalog::PDFDocument;
pub use document::page::PDFPage;
pub use error::{PdfError, Result};
pub use geom::{CaptureContext, Placement, Rect, to_document_space};
pub use image::decoder::{ColorModel, RasterImage, decode_png};
pub use model::objects::{PDFObjRef, PDFObject, PDFStream};
