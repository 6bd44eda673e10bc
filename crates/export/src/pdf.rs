use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::layout::{self, Layout};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN_X: f32 = 56.0;
const TOP_Y: f32 = 790.0;
const BOTTOM_Y: f32 = 72.0;
const FOOTER_Y: f32 = 36.0;

const HEADING_SIZE: f32 = 16.0;
const META_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 8.0;
const LEADING: f32 = 15.0;

/// Helvetica at 11pt averages a little over 5pt per glyph.
const WRAP_COLUMNS: usize = 88;

/// Corporate blue (0, 101, 189) as PDF fill components.
const LETTERHEAD_RGB: (f32, f32, f32) = (0.0, 0.396, 0.741);

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Oblique => "F3",
        }
    }
}

/// Raw content stream for one page.
struct PageContent {
    ops: Vec<u8>,
}

impl PageContent {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn fill_rgb(&mut self, (r, g, b): (f32, f32, f32)) {
        self.ops
            .extend_from_slice(format!("{r:.3} {g:.3} {b:.3} rg\n").as_bytes());
    }

    fn fill_gray(&mut self, level: f32) {
        self.ops.extend_from_slice(format!("{level:.3} g\n").as_bytes());
    }

    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) {
        self.ops.extend_from_slice(
            format!("BT /{} {size:.1} Tf {x:.2} {y:.2} Td (", font.resource()).as_bytes(),
        );
        self.ops.extend(encode_literal(text));
        self.ops.extend_from_slice(b") Tj ET\n");
    }

    fn centered(&mut self, font: Font, size: f32, y: f32, text: &str) {
        let x = ((PAGE_WIDTH - estimate_width(text, size)) / 2.0).max(MARGIN_X);
        self.text(font, size, x, y, text);
    }
}

pub(crate) fn render(layout: &Layout) -> Result<Vec<u8>, String> {
    let pages = paginate(layout);
    let page_count = pages.len();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_ids = [
        ("F1", "Helvetica"),
        ("F2", "Helvetica-Bold"),
        ("F3", "Helvetica-Oblique"),
    ]
    .map(|(name, base)| {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        });
        (name, id)
    });

    let mut fonts = lopdf::Dictionary::new();
    for (name, id) in font_ids {
        fonts.set(name, Object::Reference(id));
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for (index, mut content) in pages.into_iter().enumerate() {
        content.fill_gray(0.5);
        content.centered(Font::Regular, FOOTER_SIZE, FOOTER_Y + 12.0, &layout.footer);
        content.centered(
            Font::Regular,
            FOOTER_SIZE,
            FOOTER_Y,
            &format!("Page {} of {}", index + 1, page_count),
        );

        let page_id = add_page(&mut doc, pages_id, content);
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "Resources" => Object::Reference(resources_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH as i64),
                Object::Integer(PAGE_HEIGHT as i64),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|err| err.to_string())?;
    Ok(bytes)
}

fn add_page(doc: &mut Document, parent: ObjectId, content: PageContent) -> ObjectId {
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.ops));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(parent),
        "Contents" => Object::Reference(content_id),
    })
}

/// Lays the heading block on the first page and flows the body across as many
/// pages as needed. Footers are added by the caller once the total is known.
fn paginate(layout: &Layout) -> Vec<PageContent> {
    let mut pages = Vec::new();
    let mut page = PageContent::new();
    let mut y = TOP_Y;

    page.fill_rgb(LETTERHEAD_RGB);
    page.centered(Font::Bold, HEADING_SIZE, y, &layout.heading);
    y -= LEADING * 2.0;

    page.fill_gray(0.5);
    page.text(Font::Oblique, META_SIZE, MARGIN_X, y, &layout.generated_on);
    y -= LEADING;
    page.text(Font::Oblique, META_SIZE, MARGIN_X, y, &layout.tone);
    y -= LEADING;
    page.text(Font::Regular, META_SIZE, MARGIN_X, y, &Layout::separator());
    y -= LEADING * 1.5;

    page.fill_gray(0.0);
    for line in layout::wrap(&layout.body, WRAP_COLUMNS) {
        if y < BOTTOM_Y {
            pages.push(std::mem::replace(&mut page, PageContent::new()));
            page.fill_gray(0.0);
            y = TOP_Y;
        }
        if !line.is_empty() {
            page.text(Font::Regular, BODY_SIZE, MARGIN_X, y, &line);
        }
        y -= LEADING;
    }

    pages.push(page);
    pages
}

fn estimate_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

/// Encodes `text` as the body of a PDF literal string in WinAnsi. Characters
/// outside the encoding become `?`.
fn encode_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match win_ansi_byte(c) {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(win_ansi_byte(c));
            }
            byte => out.push(byte),
        }
    }
    out
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        '\u{20}'..='\u{7e}' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_escape_delimiters() {
        assert_eq!(encode_literal("a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
    }

    #[test]
    fn latin_and_typographic_characters_map_to_win_ansi() {
        assert_eq!(encode_literal("ä"), vec![0xe4]);
        assert_eq!(encode_literal("’"), vec![0x92]);
        assert_eq!(encode_literal("–"), vec![0x96]);
        assert_eq!(encode_literal("✉"), vec![b'?']);
    }

    #[test]
    fn long_bodies_span_several_pages() {
        let body = "Line of text\n".repeat(200);
        let layout = Layout {
            heading: "TUM Announcement".into(),
            generated_on: "Generated on: 2025-01-01 10:00".into(),
            tone: "Tone: Formal".into(),
            body,
            footer: "Campus".into(),
        };
        assert!(paginate(&layout).len() > 1);
    }
}
