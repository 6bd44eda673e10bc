use std::io::{Cursor, Write};

use zip::{result::ZipResult, write::FileOptions, CompressionMethod, ZipWriter};

use crate::layout::Layout;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const LETTERHEAD_COLOR: &str = "0065BD";
const META_COLOR: &str = "808080";

#[derive(Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    color: Option<&'static str>,
    half_points: Option<u32>,
}

pub(crate) fn render(layout: &Layout) -> ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file("[Content_Types].xml", options)?;
    writer.write_all(CONTENT_TYPES_XML.as_bytes())?;

    writer.start_file("_rels/.rels", options)?;
    writer.write_all(ROOT_RELS_XML.as_bytes())?;

    writer.start_file("word/document.xml", options)?;
    writer.write_all(document_xml(layout).as_bytes())?;

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn document_xml(layout: &Layout) -> String {
    let mut body = String::new();

    body.push_str(&paragraph(
        &layout.heading,
        Some("center"),
        RunStyle {
            bold: true,
            color: Some(LETTERHEAD_COLOR),
            half_points: Some(32),
            ..RunStyle::default()
        },
    ));

    let meta = || RunStyle {
        italic: true,
        color: Some(META_COLOR),
        half_points: Some(20),
        ..RunStyle::default()
    };
    body.push_str(&paragraph(&layout.generated_on, None, meta()));
    body.push_str(&paragraph(&layout.tone, None, meta()));
    body.push_str(&paragraph(&Layout::separator(), None, RunStyle::default()));

    for line in layout.body_lines() {
        body.push_str(&paragraph(line, None, RunStyle::default()));
    }

    body.push_str(&paragraph(
        &layout.footer,
        Some("center"),
        RunStyle {
            color: Some(META_COLOR),
            half_points: Some(16),
            ..RunStyle::default()
        },
    ));

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        body
    )
}

fn paragraph(text: &str, align: Option<&str>, style: RunStyle) -> String {
    let mut xml = String::from("<w:p>");
    if let Some(align) = align {
        xml.push_str(&format!(r#"<w:pPr><w:jc w:val="{align}"/></w:pPr>"#));
    }

    if !text.is_empty() {
        xml.push_str("<w:r>");
        let mut props = String::new();
        if style.bold {
            props.push_str("<w:b/>");
        }
        if style.italic {
            props.push_str("<w:i/>");
        }
        if let Some(color) = style.color {
            props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
        }
        if let Some(size) = style.half_points {
            props.push_str(&format!(r#"<w:sz w:val="{size}"/>"#));
        }
        if !props.is_empty() {
            xml.push_str(&format!("<w:rPr>{props}</w:rPr>"));
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape_xml(text)
        ));
        xml.push_str("</w:r>");
    }

    xml.push_str("</w:p>");
    xml
}

/// Escapes markup characters and drops code points XML 1.0 cannot carry.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push(c),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}
