//! PDF Page - pages and page-tree traversal.
//!
//! Pages are collected in document order by walking the /Pages tree depth
//! first. Inheritable attributes (Resources, MediaBox, Rotate) flow down
//! from intermediate nodes to leaves.

use super::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A PDF page object.
#[derive(Debug, Clone)]
pub struct PDFPage {
    /// Page object ID
    pub pageid: u32,
    /// Page attributes dictionary, inherited attributes applied
    pub attrs: HashMap<String, PDFObject>,
    /// Media box (physical page size): [x0, y0, x1, y1] in points
    pub mediabox: [f64; 4],
    /// Page rotation in degrees
    pub rotate: i64,
    /// Page resources, resolved to a plain dictionary
    pub resources: HashMap<String, PDFObject>,
}

impl PDFPage {
    /// Create a page from attributes.
    pub(crate) fn from_attrs(
        pageid: u32,
        attrs: HashMap<String, PDFObject>,
        doc: &PDFDocument,
    ) -> Result<Self> {
        let mediabox = Self::parse_box(&attrs, "MediaBox", doc)?.ok_or_else(|| {
            PdfError::SyntaxError(format!("page {} has no resolvable MediaBox", pageid))
        })?;
        let rotate = attrs
            .get("Rotate")
            .and_then(|r| doc.resolve(r).ok())
            .and_then(|r| r.as_int().ok())
            .map(|r| (r % 360 + 360) % 360)
            .unwrap_or(0);
        let resources = match attrs.get("Resources") {
            Some(obj) => doc.resolve(obj)?.as_dict()?.clone(),
            None => HashMap::new(),
        };

        Ok(Self {
            pageid,
            attrs,
            mediabox,
            rotate,
            resources,
        })
    }

    /// Page width in points.
    pub fn width(&self) -> f64 {
        (self.mediabox[2] - self.mediabox[0]).abs()
    }

    /// Page height in points.
    pub fn height(&self) -> f64 {
        (self.mediabox[3] - self.mediabox[1]).abs()
    }

    /// Decoded content streams, in stream order.
    ///
    /// Contents can be a single stream or an array of streams.
    pub fn contents_data(&self, doc: &PDFDocument) -> Result<Vec<Vec<u8>>> {
        let contents_obj = match self.attrs.get("Contents") {
            Some(obj) => obj,
            None => return Ok(Vec::new()),
        };

        match doc.resolve(contents_obj)? {
            PDFObject::Stream(stream) => Ok(vec![doc.decode_stream(&stream)?]),
            PDFObject::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for item in &arr {
                    let stream_obj = doc.resolve(item)?;
                    out.push(doc.decode_stream(stream_obj.as_stream()?)?);
                }
                Ok(out)
            }
            other => Err(PdfError::TypeError {
                expected: "stream",
                got: other.type_name(),
            }),
        }
    }

    fn parse_box(
        attrs: &HashMap<String, PDFObject>,
        key: &str,
        doc: &PDFDocument,
    ) -> Result<Option<[f64; 4]>> {
        let obj = match attrs.get(key) {
            Some(obj) => obj,
            None => return Ok(None),
        };
        let resolved = doc.resolve(obj)?;
        let arr = resolved.as_array()?;
        if arr.len() != 4 {
            return Err(PdfError::SyntaxError(format!(
                "{} must have 4 elements, got {}",
                key,
                arr.len()
            )));
        }
        let mut nums = [0.0f64; 4];
        for (slot, item) in nums.iter_mut().zip(arr.iter()) {
            *slot = doc.resolve(item)?.as_num()?;
        }
        Ok(Some(nums))
    }
}

/// Inheritable page-tree attributes, chained parent-ward.
#[derive(Debug)]
struct InheritedNode {
    parent: Option<Arc<InheritedNode>>,
    resources: Option<PDFObject>,
    mediabox: Option<PDFObject>,
    rotate: Option<PDFObject>,
}

impl InheritedNode {
    fn from_dict(
        parent: Option<Arc<InheritedNode>>,
        dict: &HashMap<String, PDFObject>,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent,
            resources: dict.get("Resources").cloned(),
            mediabox: dict.get("MediaBox").cloned(),
            rotate: dict.get("Rotate").cloned(),
        })
    }

    fn resolve_resources(&self) -> Option<&PDFObject> {
        self.resources.as_ref().or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.resolve_resources())
        })
    }

    fn resolve_mediabox(&self) -> Option<&PDFObject> {
        self.mediabox.as_ref().or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.resolve_mediabox())
        })
    }

    fn resolve_rotate(&self) -> Option<&PDFObject> {
        self.rotate.as_ref().or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.resolve_rotate())
        })
    }

    fn apply_to(&self, dest: &mut HashMap<String, PDFObject>) {
        if !dest.contains_key("Resources")
            && let Some(val) = self.resolve_resources()
        {
            dest.insert("Resources".to_string(), val.clone());
        }
        if !dest.contains_key("MediaBox")
            && let Some(val) = self.resolve_mediabox()
        {
            dest.insert("MediaBox".to_string(), val.clone());
        }
        if !dest.contains_key("Rotate")
            && let Some(val) = self.resolve_rotate()
        {
            dest.insert("Rotate".to_string(), val.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PageRef {
    objid: u32,
    inherited: Option<Arc<InheritedNode>>,
}

/// Document-order list of the page objects in a document.
#[derive(Debug, Default)]
pub(crate) struct PageIndex {
    pages: Vec<PageRef>,
}

impl PageIndex {
    /// Walk the /Pages tree depth first, collecting leaves in document
    /// order. Cycles are broken with a visited set; a tree yielding no
    /// pages is a parse error.
    pub(crate) fn build(doc: &PDFDocument) -> Result<Self> {
        let catalog = doc.catalog();
        let pages_ref = catalog
            .get("Pages")
            .ok_or_else(|| PdfError::SyntaxError("catalog has no /Pages".into()))?;
        let pages_ref = pages_ref.as_ref()?;

        let mut stack = vec![(pages_ref.objid, InheritedNode::from_dict(None, catalog))];
        let mut visited = HashSet::new();
        let mut pages = Vec::new();

        while let Some((objid, parent_inherited)) = stack.pop() {
            if !visited.insert(objid) {
                continue;
            }

            let obj = doc.getobj(objid)?;
            let dict = obj.as_dict().map_err(|_| {
                PdfError::SyntaxError(format!("page tree node {} is not a dictionary", objid))
            })?;

            match dict.get("Type") {
                Some(PDFObject::Name(name)) if name == "Pages" => {
                    let inherited =
                        InheritedNode::from_dict(Some(Arc::clone(&parent_inherited)), dict);
                    let kids = dict
                        .get("Kids")
                        .ok_or_else(|| {
                            PdfError::SyntaxError(format!("/Pages node {} has no /Kids", objid))
                        })
                        .and_then(|kids| doc.resolve(kids))?;
                    let kids_arr = kids.as_array()?;
                    for kid in kids_arr.iter().rev() {
                        if let Ok(kid_ref) = kid.as_ref() {
                            stack.push((kid_ref.objid, Arc::clone(&inherited)));
                        } else if let Ok(kid_int) = kid.as_int() {
                            // Some producers store kids as bare integers
                            stack.push((kid_int as u32, Arc::clone(&inherited)));
                        } else {
                            return Err(PdfError::SyntaxError(format!(
                                "invalid /Kids entry in node {}",
                                objid
                            )));
                        }
                    }
                }
                Some(PDFObject::Name(name)) if name == "Page" => {
                    pages.push(PageRef {
                        objid,
                        inherited: Some(parent_inherited),
                    });
                }
                _ => {
                    return Err(PdfError::SyntaxError(format!(
                        "page tree node {} has no valid /Type",
                        objid
                    )));
                }
            }
        }

        if pages.is_empty() {
            return Err(PdfError::SyntaxError("document has no pages".into()));
        }

        Ok(Self { pages })
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    /// Build the page at the given 0-based index.
    pub(crate) fn page(&self, doc: &PDFDocument, index: usize) -> Result<PDFPage> {
        let page_ref = self
            .pages
            .get(index)
            .ok_or_else(|| PdfError::SyntaxError("page index out of range".into()))?;

        let obj = doc.getobj(page_ref.objid)?;
        let dict = obj.as_dict().map_err(|_| {
            PdfError::SyntaxError(format!("page object {} is not a dictionary", page_ref.objid))
        })?;
        let mut attrs = dict.clone();
        if let Some(inherited) = &page_ref.inherited {
            inherited.apply_to(&mut attrs);
        }

        PDFPage::from_attrs(page_ref.objid, attrs, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::InheritedNode;
    use crate::model::objects::PDFObject;
    use std::collections::HashMap;

    #[test]
    fn test_inherited_node_apply_to_fills_missing() {
        let mut root = HashMap::new();
        root.insert("MediaBox".to_string(), PDFObject::Name("root".into()));
        root.insert("Rotate".to_string(), PDFObject::Int(90));

        let mut mid = HashMap::new();
        mid.insert("Resources".to_string(), PDFObject::Name("mid".into()));

        let root_node = InheritedNode::from_dict(None, &root);
        let mid_node = InheritedNode::from_dict(Some(root_node), &mid);

        let mut leaf = HashMap::new();
        leaf.insert("Resources".to_string(), PDFObject::Name("leaf".into()));

        mid_node.apply_to(&mut leaf);

        assert_eq!(leaf.get("Resources"), Some(&PDFObject::Name("leaf".into())));
        assert_eq!(leaf.get("MediaBox"), Some(&PDFObject::Name("root".into())));
        assert_eq!(leaf.get("Rotate"), Some(&PDFObject::Int(90)));
    }
}
