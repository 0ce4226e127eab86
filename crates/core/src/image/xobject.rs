//! Image XObject construction and registration.
//!
//! Turns a decoded raster image into the object-graph pieces a PDF needs:
//! a FlateDecode-compressed image XObject, an optional DeviceGray soft
//! mask carrying the alpha plane, and a collision-free `/ImN` entry in the
//! target page's XObject resource dictionary.

use crate::document::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::image::decoder::decode_png;
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};
use crate::writer::DocumentEdit;
use std::collections::HashMap;
use std::io::Write;

/// Handle to an image registered into a document edit.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Resource name the page's content stream paints with (e.g. `Im0`)
    pub name: String,
    /// Reference to the image XObject
    pub objref: PDFObjRef,
    /// Intrinsic pixel width
    pub width_px: u32,
    /// Intrinsic pixel height
    pub height_px: u32,
}

/// Decode a signature payload and register it as an image XObject in the
/// page's resources.
///
/// `page_attrs` is the compose call's working copy of the target page
/// dictionary; its Resources entry is replaced with a direct dictionary
/// carrying the new XObject entry. Other pages sharing the original
/// resources object are unaffected since that object itself is never
/// touched.
pub fn register_image(
    doc: &PDFDocument,
    edit: &mut DocumentEdit,
    page_attrs: &mut HashMap<String, PDFObject>,
    image_bytes: &[u8],
) -> Result<EmbeddedImage> {
    let image = decode_png(image_bytes)?;

    let mut resources = match page_attrs.get("Resources") {
        Some(obj) => doc.resolve(obj)?.as_dict()?.clone(),
        None => HashMap::new(),
    };
    let mut xobjects = match resources.get("XObject") {
        Some(obj) => doc.resolve(obj)?.as_dict()?.clone(),
        None => HashMap::new(),
    };

    let name = allocate_resource_name(&xobjects);

    // Alpha rides along as a DeviceGray soft mask so drawn signatures
    // composite over existing page content instead of painting a box.
    let smask_ref = match &image.alpha {
        Some(plane) => Some(edit.add_object(build_image_xobject(
            image.width,
            image.height,
            "DeviceGray",
            plane,
            None,
        )?)),
        None => None,
    };

    let image_obj = build_image_xobject(
        image.width,
        image.height,
        image.color.pdf_color_space(),
        &image.samples,
        smask_ref.as_ref(),
    )?;
    let objref = edit.add_object(image_obj);

    xobjects.insert(name.clone(), PDFObject::Ref(objref.clone()));
    resources.insert("XObject".to_string(), PDFObject::Dict(xobjects));
    page_attrs.insert("Resources".to_string(), PDFObject::Dict(resources));

    tracing::debug!(
        name = %name,
        width = image.width,
        height = image.height,
        soft_mask = smask_ref.is_some(),
        "registered signature image"
    );

    Ok(EmbeddedImage {
        name,
        objref,
        width_px: image.width,
        height_px: image.height,
    })
}

/// Build one image XObject stream with FlateDecode-compressed samples.
fn build_image_xobject(
    width: u32,
    height: u32,
    color_space: &str,
    samples: &[u8],
    smask: Option<&PDFObjRef>,
) -> Result<PDFObject> {
    let compressed = deflate(samples)?;

    let mut attrs = HashMap::new();
    attrs.insert("Type".to_string(), PDFObject::Name("XObject".into()));
    attrs.insert("Subtype".to_string(), PDFObject::Name("Image".into()));
    attrs.insert("Width".to_string(), PDFObject::Int(width as i64));
    attrs.insert("Height".to_string(), PDFObject::Int(height as i64));
    attrs.insert(
        "ColorSpace".to_string(),
        PDFObject::Name(color_space.to_string()),
    );
    attrs.insert("BitsPerComponent".to_string(), PDFObject::Int(8));
    attrs.insert("Filter".to_string(), PDFObject::Name("FlateDecode".into()));
    attrs.insert(
        "Length".to_string(),
        PDFObject::Int(compressed.len() as i64),
    );
    if let Some(r) = smask {
        attrs.insert("SMask".to_string(), PDFObject::Ref(r.clone()));
    }

    Ok(PDFObject::Stream(Box::new(PDFStream::new(
        attrs, compressed,
    ))))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfError::SerializationError(format!("deflate: {}", e)))
}

/// Pick the next free `ImN` name: one past the highest existing index,
/// so names stay monotonic within a document and never collide.
fn allocate_resource_name(xobjects: &HashMap<String, PDFObject>) -> String {
    let next = xobjects
        .keys()
        .filter_map(|key| key.strip_prefix("Im"))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .map(|n| n + 1)
        .max()
        .unwrap_or(0);
    format!("Im{}", next)
}
