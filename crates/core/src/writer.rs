//! PDF serializer - writes an edited document back out as bytes.
//!
//! The writer rebuilds the file front to back: original header, every live
//! object, then a freshly computed cross-reference table and trailer.
//! Objects the edit did not touch are copied byte-identical from their
//! original standalone spans; edited and newly inserted objects are
//! encoded from their in-memory form. Objects that lived inside object
//! streams are re-encoded standalone, and the now-superseded ObjStm and
//! XRef stream containers are dropped.

use crate::document::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject};
use std::collections::{HashMap, HashSet};

/// A set of edits staged against a parsed document.
///
/// Holds newly allocated objects and per-object rewrites until
/// [`serialize`] folds them into an output file. One edit belongs to one
/// compose call; nothing is shared across calls.
#[derive(Debug, Default)]
pub struct DocumentEdit {
    next_objid: u32,
    new_objects: Vec<(u32, PDFObject)>,
    rewritten: HashMap<u32, PDFObject>,
}

impl DocumentEdit {
    /// Start an edit against a document; new object ids are allocated
    /// past the document's highest existing id.
    pub fn new(doc: &PDFDocument) -> Self {
        Self {
            next_objid: doc.max_objid() + 1,
            new_objects: Vec::new(),
            rewritten: HashMap::new(),
        }
    }

    /// Allocate a fresh object id.
    pub fn allocate_objid(&mut self) -> u32 {
        let objid = self.next_objid;
        self.next_objid += 1;
        objid
    }

    /// Insert a new object under a previously allocated id.
    pub fn insert_object(&mut self, objid: u32, obj: PDFObject) {
        self.new_objects.push((objid, obj));
    }

    /// Allocate an id, insert the object, return a reference to it.
    pub fn add_object(&mut self, obj: PDFObject) -> PDFObjRef {
        let objid = self.allocate_objid();
        self.insert_object(objid, obj);
        PDFObjRef::new(objid, 0)
    }

    /// Replace an existing object wholesale.
    pub fn rewrite_object(&mut self, objid: u32, obj: PDFObject) {
        self.rewritten.insert(objid, obj);
    }

    /// Ids of objects staged for rewrite.
    pub fn rewritten_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rewritten.keys().copied()
    }
}

/// Serialize a document with its staged edits into a complete PDF file.
pub fn serialize(doc: &PDFDocument, edit: &DocumentEdit) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(doc.bytes().len() + 8192);
    out.extend_from_slice(doc.header());
    if !out.ends_with(b"\n") && !out.ends_with(b"\r") {
        out.push(b'\n');
    }

    let entries = doc.object_entries();
    let mut ids: Vec<u32> = entries.keys().copied().filter(|&id| id != 0).collect();
    ids.sort_unstable();

    // (objid, genno, byte offset) per emitted object
    let mut emitted: Vec<(u32, u32, usize)> = Vec::new();
    // Every reference held by an emitted object, for dangling detection
    let mut held_refs: Vec<PDFObjRef> = Vec::new();
    let mut rewritten_seen: HashSet<u32> = HashSet::new();

    for objid in ids {
        let entry = &entries[&objid];

        if let Some(replacement) = edit.rewritten.get(&objid) {
            rewritten_seen.insert(objid);
            emitted.push((objid, entry.genno, out.len()));
            replacement.collect_refs(&mut held_refs);
            encode_indirect(objid, entry.genno, replacement, &mut out);
            continue;
        }

        if entry.in_stream {
            // Standalone re-encode of an object-stream resident
            let obj = doc.getobj(objid)?;
            emitted.push((objid, 0, out.len()));
            obj.collect_refs(&mut held_refs);
            encode_indirect(objid, 0, &obj, &mut out);
            continue;
        }

        let (obj, end) = doc.parse_object_at(entry.offset)?;
        if is_dropped_container(&obj) {
            continue;
        }

        emitted.push((objid, entry.genno, out.len()));
        obj.collect_refs(&mut held_refs);
        out.extend_from_slice(&doc.bytes()[entry.offset..end]);
        if !out.ends_with(b"\n") && !out.ends_with(b"\r") {
            out.push(b'\n');
        }
    }

    for objid in edit.rewritten.keys() {
        if !rewritten_seen.contains(objid) {
            return Err(PdfError::SerializationError(format!(
                "rewrite targets unknown object {}",
                objid
            )));
        }
    }

    for (objid, obj) in &edit.new_objects {
        emitted.push((*objid, 0, out.len()));
        obj.collect_refs(&mut held_refs);
        encode_indirect(*objid, 0, obj, &mut out);
    }

    // Every reference reachable from an emitted object must itself be
    // emitted; a dangling reference is a compositor defect, not bad input.
    let emitted_ids: HashSet<u32> = emitted.iter().map(|(id, _, _)| *id).collect();
    held_refs.push(doc.root_ref().clone());
    for r in &held_refs {
        if !emitted_ids.contains(&r.objid) {
            return Err(PdfError::DanglingReference(r.objid));
        }
    }

    // Cross-reference table
    emitted.sort_unstable_by_key(|(id, _, _)| *id);
    let max_id = emitted.last().map(|(id, _, _)| *id).unwrap_or(0);

    let mut lines: Vec<(u32, String)> = Vec::with_capacity(emitted.len() + 1);
    lines.push((0, "0000000000 65535 f \n".to_string()));
    for (id, genno, offset) in &emitted {
        lines.push((*id, format!("{:010} {:05} n \n", offset, genno)));
    }

    let xref_pos = out.len();
    out.extend_from_slice(b"xref\n");
    let mut i = 0;
    while i < lines.len() {
        let mut j = i;
        while j + 1 < lines.len() && lines[j + 1].0 == lines[j].0 + 1 {
            j += 1;
        }
        out.extend_from_slice(format!("{} {}\n", lines[i].0, j - i + 1).as_bytes());
        for line in &lines[i..=j] {
            out.extend_from_slice(line.1.as_bytes());
        }
        i = j + 1;
    }

    // Trailer: built fresh so stale Prev/XRefStm pointers never survive
    let mut trailer: HashMap<String, PDFObject> = HashMap::new();
    trailer.insert("Size".to_string(), PDFObject::Int(max_id as i64 + 1));
    trailer.insert("Root".to_string(), PDFObject::Ref(doc.root_ref().clone()));
    for key in ["Info", "ID"] {
        if let Some(value) = doc.trailer().get(key) {
            trailer.insert(key.to_string(), value.clone());
        }
    }
    if let Some(PDFObject::Ref(info)) = doc.trailer().get("Info")
        && !emitted_ids.contains(&info.objid)
    {
        trailer.remove("Info");
    }

    out.extend_from_slice(b"trailer\n");
    encode_object(&PDFObject::Dict(trailer), &mut out);
    out.extend_from_slice(b"\nstartxref\n");
    out.extend_from_slice(xref_pos.to_string().as_bytes());
    out.extend_from_slice(b"\n%%EOF\n");

    Ok(out)
}

/// ObjStm and XRef stream containers are superseded by the rewritten
/// table and must not reappear in the output.
fn is_dropped_container(obj: &PDFObject) -> bool {
    if let PDFObject::Stream(stream) = obj
        && let Some(PDFObject::Name(name)) = stream.get("Type")
    {
        return name == "ObjStm" || name == "XRef";
    }
    false
}

/// Encode `objid genno obj ... endobj`.
pub fn encode_indirect(objid: u32, genno: u32, obj: &PDFObject, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{} {} obj\n", objid, genno).as_bytes());
    encode_object(obj, out);
    out.extend_from_slice(b"\nendobj\n");
}

/// Encode a single object body.
///
/// Dictionary keys are written in sorted order so output is deterministic.
pub fn encode_object(obj: &PDFObject, out: &mut Vec<u8>) {
    match obj {
        PDFObject::Null => out.extend_from_slice(b"null"),
        PDFObject::Bool(true) => out.extend_from_slice(b"true"),
        PDFObject::Bool(false) => out.extend_from_slice(b"false"),
        PDFObject::Int(n) => out.extend_from_slice(n.to_string().as_bytes()),
        PDFObject::Real(v) => out.extend_from_slice(fmt_real(*v).as_bytes()),
        PDFObject::Name(name) => encode_name(name, out),
        PDFObject::String(s) => encode_string(s, out),
        PDFObject::Array(arr) => {
            out.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                encode_object(item, out);
            }
            out.push(b']');
        }
        PDFObject::Dict(dict) => encode_dict(dict, out),
        PDFObject::Stream(stream) => {
            // The declared length always reflects the actual data
            let mut attrs = stream.attrs.clone();
            attrs.insert(
                "Length".to_string(),
                PDFObject::Int(stream.get_rawdata().len() as i64),
            );
            encode_dict(&attrs, out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(stream.get_rawdata());
            out.extend_from_slice(b"\nendstream");
        }
        PDFObject::Ref(r) => {
            out.extend_from_slice(format!("{} {} R", r.objid, r.genno).as_bytes());
        }
    }
}

fn encode_dict(dict: &HashMap<String, PDFObject>, out: &mut Vec<u8>) {
    let mut keys: Vec<&String> = dict.keys().collect();
    keys.sort();

    out.extend_from_slice(b"<<");
    for key in keys {
        out.push(b' ');
        encode_name(key, out);
        out.push(b' ');
        encode_object(&dict[key], out);
    }
    out.extend_from_slice(b" >>");
}

fn encode_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    for b in name.bytes() {
        let regular = (0x21..=0x7e).contains(&b)
            && !matches!(
                b,
                b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
            );
        if regular {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{:02X}", b).as_bytes());
        }
    }
}

fn encode_string(s: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    for &b in s {
        match b {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7e => out.push(b),
            _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
        }
    }
    out.push(b')');
}

/// Format a real the way PDF expects: plain decimal, no exponent, no
/// trailing zeros.
pub fn fmt_real(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let mut s = format!("{:.6}", v);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
