//! PDF Document - main entry point for PDF parsing.
//!
//! Handles:
//! - startxref discovery and xref chain loading (tables and streams)
//! - object loading, including objects compressed in object streams
//! - reference resolution with cycle detection
//! - stream decoding (FlateDecode, PNG predictors)
//!
//! Parsing is strict: input that does not yield a resolvable trailer,
//! catalog and page tree is rejected outright rather than repaired.

use super::page::{PDFPage, PageIndex};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};
use crate::parser::pdf_parser::PDFParser;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};

/// How far from the start of the file the %PDF- signature may sit.
const HEADER_SCAN_WINDOW: usize = 1024;
/// How far from the end of the file the startxref keyword may sit.
const STARTXREF_SCAN_WINDOW: usize = 1024;

/// XRef entry - location of an object in the PDF file.
#[derive(Debug, Clone)]
pub(crate) struct XRefEntry {
    /// Byte offset in file (regular objects) or index within the object
    /// stream (compressed objects)
    pub(crate) offset: usize,
    /// Generation number
    pub(crate) genno: u32,
    /// Whether this object lives in an object stream
    pub(crate) in_stream: bool,
    /// Object stream ID (if in_stream)
    pub(crate) stream_objid: Option<u32>,
}

/// Cross-reference table for locating objects in a PDF.
#[derive(Debug, Default)]
struct XRef {
    /// Map from object ID to XRef entry
    offsets: HashMap<u32, XRefEntry>,
    /// Trailer dictionary
    trailer: HashMap<String, PDFObject>,
}

impl XRef {
    fn new() -> Self {
        Self::default()
    }
}

/// PDF Document - provides read access to PDF objects and pages.
///
/// Owns its data via `Bytes`; each compose call parses its own private
/// instance, so no state is shared or cached across calls.
#[derive(Debug)]
pub struct PDFDocument {
    data: Bytes,
    /// Byte length of the header comment block at the start of the file
    header_len: usize,
    /// XRef sections, newest first
    xrefs: Vec<XRef>,
    /// Trailer of the newest xref, with Root/Info merged in from older
    /// sections when the newest lacks them
    trailer: HashMap<String, PDFObject>,
    /// Reference to the document catalog
    root_ref: PDFObjRef,
    /// Resolved catalog dictionary
    catalog: HashMap<String, PDFObject>,
    /// Document-order page list
    page_index: PageIndex,
}

impl PDFDocument {
    /// Parse a PDF document from raw bytes.
    pub fn parse(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();

        let header_len = Self::find_header(&data)?;

        let mut doc = Self {
            data,
            header_len,
            xrefs: Vec::new(),
            trailer: HashMap::new(),
            root_ref: PDFObjRef::new(0, 0),
            catalog: HashMap::new(),
            page_index: PageIndex::default(),
        };

        let startxref = doc.find_startxref()?;
        doc.load_xrefs(startxref)?;
        if doc.xrefs.is_empty() {
            return Err(PdfError::NoValidXRef);
        }

        // Encrypted documents are out of scope for this crate.
        for xref in &doc.xrefs {
            if xref.trailer.contains_key("Encrypt") {
                return Err(PdfError::SyntaxError(
                    "encrypted documents are not supported".into(),
                ));
            }
        }

        doc.trailer = doc.xrefs[0].trailer.clone();
        for key in ["Root", "Info", "ID"] {
            if !doc.trailer.contains_key(key)
                && let Some(value) = doc
                    .xrefs
                    .iter()
                    .find_map(|xref| xref.trailer.get(key))
            {
                doc.trailer.insert(key.to_string(), value.clone());
            }
        }

        let root = doc
            .trailer
            .get("Root")
            .ok_or_else(|| PdfError::SyntaxError("trailer has no /Root".into()))?;
        doc.root_ref = root.as_ref()?.clone();
        doc.catalog = doc.resolve(root)?.as_dict()?.clone();

        let page_index = PageIndex::build(&doc)?;
        doc.page_index = page_index;

        Ok(doc)
    }

    /// Returns the raw PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// The header comment block (e.g. `%PDF-1.4` plus a binary marker line).
    pub fn header(&self) -> &[u8] {
        &self.data[..self.header_len]
    }

    /// Get document catalog.
    pub fn catalog(&self) -> &HashMap<String, PDFObject> {
        &self.catalog
    }

    /// Get the merged trailer dictionary.
    pub fn trailer(&self) -> &HashMap<String, PDFObject> {
        &self.trailer
    }

    /// Reference to the document catalog object.
    pub fn root_ref(&self) -> &PDFObjRef {
        &self.root_ref
    }

    /// Number of pages, in document order.
    pub fn page_count(&self) -> usize {
        self.page_index.len()
    }

    /// Get a page by 0-based index.
    pub fn get_page(&self, index: usize) -> Result<PDFPage> {
        self.page_index.page(self, index)
    }

    /// Get a page by 1-based page number, clamping out-of-range numbers
    /// into `[1, page_count]`.
    ///
    /// Out-of-range requests resolve to the nearest valid page rather than
    /// failing; the clamp is reported through `tracing`.
    pub fn get_page_clamped(&self, number: u32) -> Result<PDFPage> {
        let count = self.page_count();
        let resolved = (number.max(1) as usize).min(count);
        if resolved != number as usize {
            tracing::warn!(
                requested = number,
                resolved,
                pages = count,
                "page number out of range, clamped"
            );
        }
        self.get_page(resolved - 1)
    }

    // === Header and startxref discovery ===

    /// Locate the %PDF- signature and measure the header comment block.
    fn find_header(data: &[u8]) -> Result<usize> {
        let window = &data[..data.len().min(HEADER_SCAN_WINDOW)];
        let sig_pos = find_subslice(window, b"%PDF-")
            .ok_or_else(|| PdfError::SyntaxError("missing %PDF- header".into()))?;
        if sig_pos != 0 {
            return Err(PdfError::SyntaxError(
                "junk before %PDF- header".into(),
            ));
        }

        // Header line, plus the following comment line when present (the
        // conventional binary marker, e.g. "%\xE2\xE3\xCF\xD3").
        let mut end = line_end(data, 0);
        if data.get(end) == Some(&b'%') {
            end = line_end(data, end);
        }
        Ok(end)
    }

    /// Find the startxref position by scanning the end of the file.
    fn find_startxref(&self) -> Result<usize> {
        let search = b"startxref";
        let data = self.data.as_ref();

        if data.len() < search.len() {
            return Err(PdfError::SyntaxError("PDF too small".into()));
        }

        let search_start = data.len().saturating_sub(STARTXREF_SCAN_WINDOW);
        let hay = &data[search_start..];
        let mut found = None;
        for pos in 0..=hay.len() - search.len() {
            if &hay[pos..pos + search.len()] == search {
                found = Some(search_start + pos);
            }
        }
        let Some(i) = found else {
            return Err(PdfError::NoValidXRef);
        };

        let rest = &data[i + search.len()..];
        let mut pos = 0;
        while pos < rest.len() && matches!(rest[pos], b' ' | b'\n' | b'\r') {
            pos += 1;
        }
        let mut num_end = pos;
        while num_end < rest.len() && rest[num_end].is_ascii_digit() {
            num_end += 1;
        }
        if num_end > pos {
            let num_str =
                std::str::from_utf8(&rest[pos..num_end]).map_err(|_| PdfError::NoValidXRef)?;
            return num_str.parse().map_err(|_| PdfError::NoValidXRef);
        }

        Err(PdfError::NoValidXRef)
    }

    // === XRef loading ===

    /// Load xref sections starting from the given position, following
    /// /Prev and hybrid /XRefStm pointers.
    fn load_xrefs(&mut self, mut pos: usize) -> Result<()> {
        let mut visited = HashSet::new();

        while visited.insert(pos) {
            let xref = self.load_xref_at(pos)?;

            let xref_stm = xref
                .trailer
                .get("XRefStm")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);
            let prev = xref
                .trailer
                .get("Prev")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);

            self.xrefs.push(xref);

            if let Some(xref_stm_pos) = xref_stm
                && visited.insert(xref_stm_pos)
            {
                let xref_stm = self.load_xref_stream(xref_stm_pos)?;
                self.xrefs.push(xref_stm);
            }

            match prev {
                Some(prev_pos) => pos = prev_pos,
                None => break,
            }
        }

        Ok(())
    }

    /// Load the xref section at the given position.
    fn load_xref_at(&self, pos: usize) -> Result<XRef> {
        if pos >= self.data.len() {
            return Err(PdfError::NoValidXRef);
        }
        if self.data[pos..].starts_with(b"xref") {
            self.load_traditional_xref(pos)
        } else {
            // PDF 1.5+ cross-reference stream
            self.load_xref_stream(pos)
        }
    }

    /// Load a traditional `xref` table and its trailing trailer dict.
    fn load_traditional_xref(&self, pos: usize) -> Result<XRef> {
        let mut xref = XRef::new();
        let data = &self.data[pos..];

        // Skip "xref" and whitespace
        let mut cursor = 4;
        cursor += count_whitespace(&data[cursor..]);

        // Parse subsections until "trailer"
        loop {
            cursor += count_whitespace(&data[cursor..]);

            if cursor >= data.len() {
                return Err(PdfError::SyntaxError("xref table missing trailer".into()));
            }

            if data[cursor..].starts_with(b"trailer") {
                cursor += 7;
                break;
            }

            let (start_objid, consumed) = read_number(&data[cursor..])?;
            cursor += consumed;
            cursor += count_whitespace(&data[cursor..]);

            let (count, consumed) = read_number(&data[cursor..])?;
            cursor += consumed;
            cursor += skip_to_next_line(&data[cursor..]);

            let mut base_objid = start_objid;
            for i in 0..count {
                let (offset, consumed1) = read_number(&data[cursor..])?;
                cursor += consumed1;
                while cursor < data.len() && data[cursor] == b' ' {
                    cursor += 1;
                }

                let (genno, consumed2) = read_number(&data[cursor..])?;
                cursor += consumed2;
                while cursor < data.len() && data[cursor] == b' ' {
                    cursor += 1;
                }

                let marker = if cursor < data.len() {
                    data[cursor]
                } else {
                    b'f'
                };
                cursor = (cursor + 1).min(data.len());

                // Some producers start a subsection at 1 but still include
                // the object 0 free entry. Shift base_objid so entries align.
                if i == 0 && base_objid > 0 && marker == b'f' && offset == 0 && genno == 65535 {
                    base_objid -= 1;
                }

                let objid = base_objid + i;
                cursor += skip_to_next_line(&data[cursor..]);

                if marker == b'n' {
                    xref.offsets.insert(
                        objid as u32,
                        XRefEntry {
                            offset: offset as usize,
                            genno: genno as u32,
                            in_stream: false,
                            stream_objid: None,
                        },
                    );
                }
            }
        }

        // Parse trailer dictionary
        cursor += count_whitespace(&data[cursor..]);
        if !data[cursor..].starts_with(b"<<") {
            return Err(PdfError::SyntaxError("xref trailer is not a dict".into()));
        }
        let mut parser = PDFParser::new(&data[cursor..]);
        let trailer_obj = parser.parse_object()?;
        xref.trailer = trailer_obj.as_dict()?.clone();

        Ok(xref)
    }

    /// Load a cross-reference stream (PDF 1.5+).
    fn load_xref_stream(&self, pos: usize) -> Result<XRef> {
        let (obj, _) = self.parse_object_at(pos)?;
        let stream = obj.as_stream()?;

        let w = stream
            .get("W")
            .ok_or_else(|| PdfError::SyntaxError("missing W in xref stream".into()))?;
        let w_arr = w.as_array()?;
        if w_arr.len() != 3 {
            return Err(PdfError::SyntaxError("W must have 3 elements".into()));
        }
        let w0 = w_arr[0].as_int()? as usize;
        let w1 = w_arr[1].as_int()? as usize;
        let w2 = w_arr[2].as_int()? as usize;
        let entry_size = w0 + w1 + w2;
        if entry_size == 0 {
            return Err(PdfError::SyntaxError("empty xref stream entries".into()));
        }

        let size = stream
            .get("Size")
            .ok_or_else(|| PdfError::SyntaxError("missing Size in xref stream".into()))?
            .as_int()? as usize;

        // Subsection index pairs (default is the whole range)
        let index = if let Some(idx) = stream.get("Index") {
            let arr = idx.as_array()?;
            let mut pairs = Vec::new();
            let mut i = 0;
            while i + 1 < arr.len() {
                let start = arr[i].as_int()? as u32;
                let count = arr[i + 1].as_int()? as usize;
                pairs.push((start, count));
                i += 2;
            }
            pairs
        } else {
            vec![(0, size)]
        };

        let data = self.decode_stream(stream)?;

        let mut xref = XRef::new();
        let mut data_pos = 0;

        for (start_objid, count) in index {
            for i in 0..count {
                if data_pos + entry_size > data.len() {
                    return Err(PdfError::SyntaxError("truncated xref stream".into()));
                }

                let objid = start_objid + i as u32;

                // Entry type defaults to 1 when the first field is absent
                let obj_type = if w0 > 0 {
                    read_bytes_as_int(&data[data_pos..data_pos + w0])
                } else {
                    1
                };
                let field1 = read_bytes_as_int(&data[data_pos + w0..data_pos + w0 + w1]);
                let field2 = read_bytes_as_int(&data[data_pos + w0 + w1..data_pos + entry_size]);
                data_pos += entry_size;

                match obj_type {
                    0 => {
                        // Free object
                    }
                    1 => {
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset: field1 as usize,
                                genno: field2 as u32,
                                in_stream: false,
                                stream_objid: None,
                            },
                        );
                    }
                    2 => {
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset: field2 as usize,
                                genno: 0,
                                in_stream: true,
                                stream_objid: Some(field1 as u32),
                            },
                        );
                    }
                    _ => {}
                }
            }
        }

        // Copy trailer entries from the stream dict, minus stream bookkeeping
        for (key, value) in &stream.attrs {
            if !matches!(
                key.as_str(),
                "Length" | "Filter" | "DecodeParms" | "W" | "Index" | "Type"
            ) {
                xref.trailer.insert(key.clone(), value.clone());
            }
        }

        Ok(xref)
    }

    // === Object loading ===

    /// Look up the newest xref entry for an object.
    pub(crate) fn entry_for(&self, objid: u32) -> Option<&XRefEntry> {
        self.xrefs.iter().find_map(|xref| xref.offsets.get(&objid))
    }

    /// All live object entries, newest xref section winning.
    pub(crate) fn object_entries(&self) -> HashMap<u32, XRefEntry> {
        let mut map = HashMap::new();
        for xref in &self.xrefs {
            for (objid, entry) in &xref.offsets {
                map.entry(*objid).or_insert_with(|| entry.clone());
            }
        }
        map
    }

    /// Highest object id referenced by any xref section.
    pub(crate) fn max_objid(&self) -> u32 {
        self.xrefs
            .iter()
            .flat_map(|xref| xref.offsets.keys().copied())
            .max()
            .unwrap_or(0)
    }

    /// Get an object by ID.
    pub fn getobj(&self, objid: u32) -> Result<PDFObject> {
        let entry = self
            .entry_for(objid)
            .ok_or(PdfError::ObjectNotFound(objid))?;

        if entry.in_stream {
            let stream_objid = entry
                .stream_objid
                .ok_or_else(|| PdfError::SyntaxError("compressed entry missing stream id".into()))?;
            return self.getobj_from_objstm(stream_objid, entry.offset, objid);
        }

        let (obj, _) = self.parse_object_at(entry.offset)?;
        Ok(obj)
    }

    /// Load an object stored inside an object stream.
    fn getobj_from_objstm(&self, stream_objid: u32, index: usize, want: u32) -> Result<PDFObject> {
        let container_entry = self
            .entry_for(stream_objid)
            .ok_or(PdfError::ObjectNotFound(stream_objid))?;
        if container_entry.in_stream {
            return Err(PdfError::SyntaxError(
                "object stream stored inside another object stream".into(),
            ));
        }

        let (container, _) = self.parse_object_at(container_entry.offset)?;
        let stream = container.as_stream()?;
        match stream.get("Type") {
            Some(PDFObject::Name(name)) if name == "ObjStm" => {}
            _ => {
                return Err(PdfError::SyntaxError(format!(
                    "object {} is not an object stream",
                    stream_objid
                )));
            }
        }

        let n = self
            .resolve(stream.get("N").ok_or_else(|| {
                PdfError::SyntaxError("object stream missing /N".into())
            })?)?
            .as_int()? as usize;
        let first = self
            .resolve(stream.get("First").ok_or_else(|| {
                PdfError::SyntaxError("object stream missing /First".into())
            })?)?
            .as_int()? as usize;

        let data = self.decode_stream(stream)?;
        if first > data.len() {
            return Err(PdfError::SyntaxError("object stream /First out of range".into()));
        }

        // Header: n pairs of (objid, relative offset)
        let mut parser = PDFParser::new(&data[..first]);
        let mut pairs = Vec::with_capacity(n);
        for _ in 0..n {
            let id = parser.parse_object()?.as_int()? as u32;
            let off = parser.parse_object()?.as_int()? as usize;
            pairs.push((id, off));
        }

        let (_, offset) = pairs
            .iter()
            .copied()
            .find(|(id, _)| *id == want)
            .or_else(|| pairs.get(index).copied())
            .ok_or(PdfError::ObjectNotFound(want))?;

        let start = first + offset;
        if start > data.len() {
            return Err(PdfError::SyntaxError("object stream offset out of range".into()));
        }
        PDFParser::new(&data[start..]).parse_object()
    }

    /// Parse the indirect object at a byte offset.
    ///
    /// Returns the object and the offset just past its `endobj` keyword,
    /// so callers can copy the standalone span verbatim.
    pub(crate) fn parse_object_at(&self, offset: usize) -> Result<(PDFObject, usize)> {
        let full = self.data.as_ref();
        if offset >= full.len() {
            return Err(PdfError::SyntaxError(format!(
                "object offset {} exceeds file size {}",
                offset,
                full.len()
            )));
        }
        let mut cursor = offset;
        let data = &full[offset..];

        // Parse "objid genno obj"
        let (objid, consumed1) = read_number(data)?;
        cursor += consumed1;
        cursor += count_whitespace(&full[cursor..]);

        let (genno, consumed2) = read_number(&full[cursor..])?;
        cursor += consumed2;
        cursor += count_whitespace(&full[cursor..]);

        if !full[cursor..].starts_with(b"obj") {
            return Err(PdfError::SyntaxError(format!(
                "expected 'obj' at offset {}, got {:?}",
                offset,
                String::from_utf8_lossy(&full[cursor..(cursor + 10).min(full.len())])
            )));
        }
        cursor += 3;
        cursor += count_whitespace(&full[cursor..]);

        // Parse the object body
        let mut parser = PDFParser::new(&full[cursor..]);
        let obj = parser.parse_object()?;
        let mut end = cursor + parser.tell();

        // A dict followed by "stream" is a stream object
        if let PDFObject::Dict(ref dict) = obj {
            let mut pos = end + count_whitespace(&full[end..]);
            if full[pos..].starts_with(b"stream") {
                pos += 6;
                if full.get(pos) == Some(&b'\r') {
                    pos += 1;
                }
                if full.get(pos) == Some(&b'\n') {
                    pos += 1;
                }

                // XRef and ObjStm streams carry the table needed to resolve
                // indirect /Length values; always scan for endstream there.
                let force_scan = matches!(
                    dict.get("Type"),
                    Some(PDFObject::Name(name)) if name == "XRef" || name == "ObjStm"
                );

                let length: usize = if force_scan {
                    0
                } else {
                    dict.get("Length")
                        .and_then(|len_obj| self.resolve(len_obj).ok())
                        .and_then(|resolved| resolved.as_int().ok())
                        .filter(|&len| len > 0)
                        .map(|len| len as usize)
                        .unwrap_or(0)
                };

                let stream_end = if length > 0
                    && pos + length <= full.len()
                    && is_endstream_ahead(&full[pos + length..])
                {
                    // Trust the declared /Length when endstream follows it
                    pos + length
                } else {
                    pos + find_endstream(&full[pos..]).ok_or_else(|| {
                        PdfError::SyntaxError("stream missing endstream".into())
                    })?
                };

                let rawdata = self.data.slice(pos..stream_end);
                let mut stream = PDFStream::new(dict.clone(), rawdata);
                stream.set_objid(objid as u32, genno as u32);

                // Advance past endstream and endobj
                end = stream_end + count_whitespace(&full[stream_end..]);
                if full[end..].starts_with(b"endstream") {
                    end += 9;
                }
                end += count_whitespace(&full[end..]);
                if full[end..].starts_with(b"endobj") {
                    end += 6;
                }

                return Ok((PDFObject::Stream(Box::new(stream)), end));
            }
        }

        end += count_whitespace(&full[end..]);
        if full[end..].starts_with(b"endobj") {
            end += 6;
        }

        Ok((obj, end))
    }

    /// Resolve a reference to its actual object, following chains and
    /// refusing cycles.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        let mut seen = HashSet::new();
        let mut current = match obj {
            PDFObject::Ref(r) => {
                seen.insert(r.objid);
                self.getobj(r.objid)?
            }
            _ => return Ok(obj.clone()),
        };
        loop {
            match current {
                PDFObject::Ref(r) => {
                    if !seen.insert(r.objid) {
                        return Err(PdfError::SyntaxError(format!(
                            "circular reference detected for obj {}",
                            r.objid
                        )));
                    }
                    current = self.getobj(r.objid)?;
                }
                other => return Ok(other),
            }
        }
    }

    // === Stream decoding ===

    /// Decode a PDF stream (FlateDecode plus optional PNG predictor).
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        let mut output = stream.get_rawdata().to_vec();

        if let Some(filter) = stream.get("Filter") {
            let filter = self.resolve(filter)?;
            let filter_name = match &filter {
                PDFObject::Name(name) => name.as_str(),
                PDFObject::Array(arr) if arr.is_empty() => return Ok(output),
                PDFObject::Array(arr) if arr.len() == 1 => match &arr[0] {
                    PDFObject::Name(name) => name.as_str(),
                    other => {
                        return Err(PdfError::DecodeError(format!(
                            "invalid filter entry: {}",
                            other.type_name()
                        )));
                    }
                },
                other => {
                    return Err(PdfError::DecodeError(format!(
                        "unsupported filter chain: {}",
                        other.type_name()
                    )));
                }
            };

            match filter_name {
                "FlateDecode" | "Fl" => {
                    use std::io::Read;
                    let mut decoder = flate2::read::ZlibDecoder::new(&output[..]);
                    let mut decompressed = Vec::new();
                    decoder
                        .read_to_end(&mut decompressed)
                        .map_err(|e| PdfError::DecodeError(format!("flate: {}", e)))?;
                    output = decompressed;
                }
                other => {
                    return Err(PdfError::DecodeError(format!(
                        "unsupported filter: {}",
                        other
                    )));
                }
            }
        }

        if let Some(parms) = stream.get("DecodeParms") {
            let parms = self.resolve(parms)?;
            let parms_dict = match &parms {
                PDFObject::Dict(d) => Some(d),
                PDFObject::Array(arr) if !arr.is_empty() => match &arr[0] {
                    PDFObject::Dict(d) => Some(d),
                    _ => None,
                },
                _ => None,
            };

            if let Some(parms) = parms_dict {
                let predictor = parms
                    .get("Predictor")
                    .and_then(|p| p.as_int().ok())
                    .unwrap_or(1) as usize;

                if predictor >= 10 {
                    let columns = parms
                        .get("Columns")
                        .and_then(|c| c.as_int().ok())
                        .unwrap_or(1) as usize;
                    let colors = parms
                        .get("Colors")
                        .and_then(|c| c.as_int().ok())
                        .unwrap_or(1) as usize;
                    let bits = parms
                        .get("BitsPerComponent")
                        .and_then(|b| b.as_int().ok())
                        .unwrap_or(8) as usize;

                    output = apply_png_predictor(&output, columns, colors, bits)?;
                }
            }
        }

        Ok(output)
    }
}

/// Undo PNG row prediction (predictor >= 10 in DecodeParms).
///
/// Each row is prefixed with a filter-type byte; reversing the filter
/// recovers the original samples.
fn apply_png_predictor(
    data: &[u8],
    columns: usize,
    colors: usize,
    bits_per_component: usize,
) -> Result<Vec<u8>> {
    let row_bytes = columns * colors * bits_per_component / 8;
    if row_bytes == 0 {
        return Err(PdfError::DecodeError("invalid predictor row size".into()));
    }
    let bpp = std::cmp::max(1, colors * bits_per_component / 8);

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut pos = 0;

    while pos < data.len() {
        let filter_type = data[pos];
        pos += 1;
        if pos + row_bytes > data.len() {
            return Err(PdfError::DecodeError("truncated predictor row".into()));
        }
        let mut row = data[pos..pos + row_bytes].to_vec();
        pos += row_bytes;

        match filter_type {
            0 => {}
            1 => {
                // Sub: add left neighbor
                for i in bpp..row_bytes {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            2 => {
                // Up: add above neighbor
                for i in 0..row_bytes {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                // Average of left and above
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let above = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                // Paeth
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row[i].wrapping_add(paeth_predictor(left, above, upper_left));
                }
            }
            other => {
                return Err(PdfError::DecodeError(format!(
                    "unknown PNG predictor filter: {}",
                    other
                )));
            }
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i16;
    let b = above as i16;
    let c = upper_left as i16;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

/// Read a nonnegative decimal number, returning (value, bytes consumed).
fn read_number(data: &[u8]) -> Result<(i64, usize)> {
    let mut end = 0;
    while end < data.len() && data[end].is_ascii_digit() {
        end += 1;
    }
    if end == 0 {
        return Err(PdfError::SyntaxError("expected number".into()));
    }
    let s = std::str::from_utf8(&data[..end])
        .map_err(|_| PdfError::SyntaxError("invalid number".into()))?;
    let value = s
        .parse()
        .map_err(|_| PdfError::SyntaxError(format!("invalid number: {}", s)))?;
    Ok((value, end))
}

fn count_whitespace(data: &[u8]) -> usize {
    let mut n = 0;
    while n < data.len() && matches!(data[n], b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c') {
        n += 1;
    }
    n
}

/// Skip the rest of the current line plus its line ending.
fn skip_to_next_line(data: &[u8]) -> usize {
    let mut n = 0;
    while n < data.len() && data[n] != b'\n' && data[n] != b'\r' {
        n += 1;
    }
    while n < data.len() && (data[n] == b'\n' || data[n] == b'\r') {
        n += 1;
    }
    n
}

fn line_end(data: &[u8], from: usize) -> usize {
    let mut end = from;
    while end < data.len() && data[end] != b'\n' && data[end] != b'\r' {
        end += 1;
    }
    while end < data.len() && (data[end] == b'\n' || data[end] == b'\r') {
        end += 1;
    }
    end
}

fn find_subslice(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Find the end of stream data: the position of "endstream", with any
/// immediately preceding EOL trimmed off.
fn find_endstream(data: &[u8]) -> Option<usize> {
    let pos = find_subslice(data, b"endstream")?;
    let mut end = pos;
    while end > 0 && matches!(data[end - 1], b' ' | b'\n' | b'\r') {
        end -= 1;
    }
    Some(end)
}

/// True when the next non-EOL bytes spell "endstream".
fn is_endstream_ahead(data: &[u8]) -> bool {
    let skip = count_whitespace(data);
    data[skip..].starts_with(b"endstream")
}

fn read_bytes_as_int(bytes: &[u8]) -> u64 {
    let mut val: u64 = 0;
    for &b in bytes {
        val = (val << 8) | (b as u64);
    }
    val
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_number() {
        assert_eq!(read_number(b"123 rest").unwrap(), (123, 3));
        assert!(read_number(b"abc").is_err());
    }

    #[test]
    fn test_find_endstream_trims_eol() {
        let data = b"hello\nendstream";
        assert_eq!(find_endstream(data), Some(5));
    }

    #[test]
    fn test_png_predictor_up() {
        // Two rows of 3 bytes, second row Up-filtered
        let data = [0u8, 1, 2, 3, 2, 1, 1, 1];
        let out = apply_png_predictor(&data, 3, 1, 8).unwrap();
        assert_eq!(out, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_paeth_predictor() {
        assert_eq!(paeth_predictor(1, 2, 3), 1);
        assert_eq!(paeth_predictor(10, 20, 10), 20);
    }
}
