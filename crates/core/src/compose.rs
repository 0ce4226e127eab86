//! The compositor - stamps one raster signature onto one page.
//!
//! Orchestrates parse, page resolution, image registration, content
//! append and serialization. Each call parses its own document from the
//! supplied bytes and holds no state afterwards, so independent calls can
//! run concurrently without coordination.

use crate::document::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::geom::Placement;
use crate::image::xobject::register_image;
use crate::model::objects::{PDFObjRef, PDFObject};
use crate::writer::{self, DocumentEdit, fmt_real};

/// Compose a signature image onto a document.
///
/// Parses `document_bytes`, embeds `image_bytes` (PNG) as an image
/// XObject on the page `placement` names (out-of-range page numbers clamp
/// to the nearest page), appends a self-contained paint instruction at
/// the placement rectangle, and returns the re-serialized document.
///
/// The input bytes are never modified; errors leave no observable side
/// effect.
pub fn compose(document_bytes: &[u8], image_bytes: &[u8], placement: Placement) -> Result<Vec<u8>> {
    let doc = PDFDocument::parse(document_bytes.to_vec())?;
    let page = doc.get_page_clamped(placement.page)?;
    tracing::debug!(
        page_objid = page.pageid,
        width = page.width(),
        height = page.height(),
        "resolved target page"
    );

    let mut edit = DocumentEdit::new(&doc);
    let mut attrs = page.attrs.clone();

    let embedded = register_image(&doc, &mut edit, &mut attrs, image_bytes)?;

    // Explicit placement size wins; fall back to intrinsic pixel
    // dimensions at one point per pixel.
    let width = placement.width.unwrap_or(embedded.width_px as f64);
    let height = placement.height.unwrap_or(embedded.height_px as f64);

    let block = paint_block(&embedded.name, placement.x, placement.y, width, height);
    let content_ref = edit.add_object(content_stream(block));

    let new_contents = match attrs.get("Contents") {
        None => PDFObject::Ref(content_ref),
        Some(existing) => append_content_ref(&doc, &mut edit, existing, content_ref)?,
    };
    attrs.insert("Contents".to_string(), new_contents);

    edit.rewrite_object(page.pageid, PDFObject::Dict(attrs));

    writer::serialize(&doc, &edit)
}

/// The injected graphics block: save state, map the unit square to the
/// placement rectangle, paint the image, restore state.
///
/// The save/restore pair is mandatory - without it the transform would
/// leak into whatever drawing operators follow in the combined content
/// stream.
fn paint_block(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        fmt_real(width),
        fmt_real(height),
        fmt_real(x),
        fmt_real(y),
        name
    )
    .into_bytes()
}

/// Wrap a content block in a stream object.
fn content_stream(data: Vec<u8>) -> PDFObject {
    let mut attrs = std::collections::HashMap::new();
    attrs.insert("Length".to_string(), PDFObject::Int(data.len() as i64));
    PDFObject::Stream(Box::new(crate::model::objects::PDFStream::new(
        attrs, data,
    )))
}

/// Extend the page's existing Contents with a reference to the new
/// stream, leaving the existing stream objects untouched.
fn append_content_ref(
    doc: &PDFDocument,
    edit: &mut DocumentEdit,
    existing: &PDFObject,
    content_ref: PDFObjRef,
) -> Result<PDFObject> {
    match existing {
        PDFObject::Ref(r) => match doc.resolve(existing)? {
            // Reference to an array of streams: extend the array in place
            PDFObject::Array(mut arr) => {
                arr.push(PDFObject::Ref(content_ref));
                Ok(PDFObject::Array(arr))
            }
            // Reference to a single stream: promote to a two-entry array
            PDFObject::Stream(_) => Ok(PDFObject::Array(vec![
                PDFObject::Ref(r.clone()),
                PDFObject::Ref(content_ref),
            ])),
            other => Err(PdfError::TypeError {
                expected: "stream",
                got: other.type_name(),
            }),
        },
        PDFObject::Array(arr) => {
            let mut arr = arr.clone();
            arr.push(PDFObject::Ref(content_ref));
            Ok(PDFObject::Array(arr))
        }
        // A stream stored directly in the page dict is off-spec but seen
        // in the wild; move it into its own object first.
        PDFObject::Stream(stream) => {
            let moved = edit.add_object(PDFObject::Stream(stream.clone()));
            Ok(PDFObject::Array(vec![
                PDFObject::Ref(moved),
                PDFObject::Ref(content_ref),
            ]))
        }
        other => Err(PdfError::TypeError {
            expected: "stream",
            got: other.type_name(),
        }),
    }
}
