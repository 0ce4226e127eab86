//! Shared fixture builders for integration tests.
//!
//! Fixtures are built in code rather than shipped as binaries: minimal
//! but well-formed PDFs (traditional xref table or xref stream + object
//! stream variants) and small PNG payloads.

#![allow(dead_code)]

/// One page of a fixture document.
pub struct PageSpec {
    pub mediabox: [f64; 4],
    pub content: String,
}

impl PageSpec {
    /// US Letter page with the given content stream.
    pub fn letter(content: &str) -> Self {
        Self {
            mediabox: [0.0, 0.0, 612.0, 792.0],
            content: content.to_string(),
        }
    }

    /// Page with explicit dimensions.
    pub fn sized(width: f64, height: f64, content: &str) -> Self {
        Self {
            mediabox: [0.0, 0.0, width, height],
            content: content.to_string(),
        }
    }
}

/// Build a PDF with a traditional xref table.
///
/// Object layout: 1 = catalog, 2 = pages, 3..3+n = page dicts,
/// 3+n..3+2n = content streams.
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::new();
    let push_obj = |buf: &mut Vec<u8>, obj: String, offsets: &mut Vec<usize>| {
        offsets.push(buf.len());
        buf.extend_from_slice(obj.as_bytes());
    };

    push_obj(
        &mut out,
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        &mut offsets,
    );

    let page_count = pages.len();
    let kids: String = (0..page_count)
        .map(|i| format!("{} 0 R", 3 + i))
        .collect::<Vec<_>>()
        .join(" ");
    push_obj(
        &mut out,
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids, page_count
        ),
        &mut offsets,
    );

    for (i, page) in pages.iter().enumerate() {
        let page_id = 3 + i;
        let contents_id = 3 + page_count + i;
        let [x0, y0, x1, y1] = page.mediabox;
        push_obj(
            &mut out,
            format!(
                "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [{} {} {} {}] /Contents {} 0 R >>\nendobj\n",
                page_id, x0, y0, x1, y1, contents_id
            ),
            &mut offsets,
        );
    }

    for (i, page) in pages.iter().enumerate() {
        let contents_id = 3 + page_count + i;
        push_obj(
            &mut out,
            format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                contents_id,
                page.content.len(),
                page.content
            ),
            &mut offsets,
        );
    }

    let xref_pos = out.len();
    let obj_count = offsets.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", obj_count + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer\n<< /Size ");
    out.extend_from_slice((obj_count + 1).to_string().as_bytes());
    out.extend_from_slice(b" /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(xref_pos.to_string().as_bytes());
    out.extend_from_slice(b"\n%%EOF");

    out
}

/// Build a one-page PDF 1.5 file using a cross-reference stream, with the
/// catalog, pages node and page dict compressed into an object stream.
///
/// Object layout: 1 = catalog, 2 = pages, 3 = page (all in ObjStm 5),
/// 4 = content stream, 5 = ObjStm, 6 = XRef stream.
pub fn build_pdf_with_xref_stream(content: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.5\n");

    // Object 4: page content stream
    let obj4_offset = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );

    // Object 5: object stream holding objects 1, 2, 3
    let body1 = "<< /Type /Catalog /Pages 2 0 R >>";
    let body2 = "<< /Type /Pages /Kids [3 0 R] /Count 1 >>";
    let body3 = "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>";
    let off2 = body1.len() + 1;
    let off3 = off2 + body2.len() + 1;
    let header = format!("1 0 2 {} 3 {} ", off2, off3);
    let first = header.len();
    let objstm_data = format!("{}{} {} {}", header, body1, body2, body3);

    let obj5_offset = out.len();
    out.extend_from_slice(
        format!(
            "5 0 obj\n<< /Type /ObjStm /N 3 /First {} /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            first,
            objstm_data.len(),
            objstm_data
        )
        .as_bytes(),
    );

    // Object 6: xref stream, W = [1 2 1], entries for objects 0-6
    let obj6_offset = out.len();
    let entries: Vec<[u8; 4]> = vec![
        [0, 0, 0, 0],                                            // 0: free
        [2, 0, 5, 0],                                            // 1: in ObjStm 5, index 0
        [2, 0, 5, 1],                                            // 2: in ObjStm 5, index 1
        [2, 0, 5, 2],                                            // 3: in ObjStm 5, index 2
        entry1(obj4_offset),                                     // 4: regular
        entry1(obj5_offset),                                     // 5: regular
        entry1(obj6_offset),                                     // 6: regular
    ];
    let xref_data: Vec<u8> = entries.concat();

    out.extend_from_slice(
        format!(
            "6 0 obj\n<< /Type /XRef /Size 7 /Root 1 0 R /W [1 2 1] /Length {} >>\nstream\n",
            xref_data.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(&xref_data);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    out.extend_from_slice(b"startxref\n");
    out.extend_from_slice(obj6_offset.to_string().as_bytes());
    out.extend_from_slice(b"\n%%EOF");

    out
}

fn entry1(offset: usize) -> [u8; 4] {
    assert!(offset < 0x10000, "fixture offset exceeds 2-byte field");
    [1, (offset >> 8) as u8, (offset & 0xFF) as u8, 0]
}

/// Encode an RGB PNG: a solid dark stroke color.
pub fn png_rgb(width: u32, height: u32) -> Vec<u8> {
    let data: Vec<u8> = (0..width * height).flat_map(|_| [20u8, 30, 90]).collect();
    encode_png(width, height, png::ColorType::Rgb, &data)
}

/// Encode an RGBA PNG whose right half is fully transparent, like a drawn
/// signature on a transparent canvas.
pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..height {
        for x in 0..width {
            let alpha = if x < width / 2 { 255 } else { 0 };
            data.extend_from_slice(&[10, 10, 60, alpha]);
        }
    }
    encode_png(width, height, png::ColorType::Rgba, &data)
}

pub fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}

/// Locate the standalone span of an indirect object (`"N G obj"` through
/// `endobj`) inside a serialized file.
pub fn object_span<'a>(data: &'a [u8], header: &str) -> &'a [u8] {
    let start = find(data, header.as_bytes()).expect("object header not found");
    let end_rel = find(&data[start..], b"endobj").expect("endobj not found");
    &data[start..start + end_rel + "endobj".len()]
}

pub fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}
