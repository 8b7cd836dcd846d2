//! Minimal text-only PDF output for history exports.
//!
//! Hand-rolls the handful of objects a Helvetica text document needs:
//! catalog, page tree, one content stream per page, font, xref table. The
//! target encoding is Latin-1, so the euro sign is substituted with the
//! literal text `EUR` before escaping.

const PAGE_WIDTH: i32 = 612;
const PAGE_HEIGHT: i32 = 792;
const LEFT_MARGIN: i32 = 54;
const TOP_MARGIN: i32 = 72;
const LEADING: i32 = 14;

/// Lines per page at the fixed leading, leaving a bottom margin.
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * TOP_MARGIN) / LEADING) as usize;

fn pdf_escape(text: &str) -> String {
    // Backslash first, then the string delimiters.
    text.replace('\\', r"\\").replace('(', r"\(").replace(')', r"\)")
}

fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if code <= 0xff { code as u8 } else { b'?' }
        })
        .collect()
}

// One page's content stream. The first line of the document is set larger,
// as a title.
fn page_stream(lines: &[String], with_title: bool) -> Vec<u8> {
    let start_y = PAGE_HEIGHT - TOP_MARGIN;
    let mut ops: Vec<String> = Vec::new();
    ops.push("BT".to_string());
    ops.push("/F1 11 Tf".to_string());
    ops.push(format!("{LEFT_MARGIN} {start_y} Td"));

    for (i, line) in lines.iter().enumerate() {
        let safe = pdf_escape(&line.replace('€', "EUR"));
        if with_title && i == 0 {
            ops.push("/F1 14 Tf".to_string());
            ops.push(format!("({safe}) Tj"));
            ops.push("/F1 11 Tf".to_string());
        } else {
            ops.push(format!("({safe}) Tj"));
        }
        ops.push(format!("0 -{LEADING} Td"));
    }

    ops.push("ET".to_string());
    latin1_bytes(&ops.join("\n"))
}

/// Render lines to a complete PDF document, paginating as needed.
pub fn build_simple_pdf(lines: &[String]) -> Vec<u8> {
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let page_count = chunks.len();

    // Object ids: 1 catalog, 2 page tree, then (page, content) pairs, font
    // last.
    let font_id = 3 + 2 * page_count;
    let mut objects: Vec<Vec<u8>> = Vec::new();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );

    for (page_index, chunk) in chunks.iter().enumerate() {
        let content_id = 4 + 2 * page_index;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Contents {content_id} 0 R /Resources << /Font << /F1 {font_id} 0 R >> >> >>"
            )
            .into_bytes(),
        );

        let stream = page_stream(chunk, page_index == 0);
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"\nendstream");
        objects.push(content);
    }

    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec());

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(obj);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(b"xref\n");
    out.extend_from_slice(format!("0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(b"trailer\n");
    out.extend_from_slice(format!("<< /Size {} /Root 1 0 R >>\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"startxref\n");
    out.extend_from_slice(format!("{xref_start}\n").as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}
