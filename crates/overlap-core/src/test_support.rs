//! In-memory PDF fixtures shared by the unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub(crate) const FONT_SIZE: i64 = 12;
pub(crate) const LEFT_MARGIN: i64 = 72;
pub(crate) const FIRST_BASELINE: i64 = 720;
pub(crate) const LINE_HEIGHT: i64 = 16;

fn text_operations(lines: &[&str]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = FIRST_BASELINE - LINE_HEIGHT * i as i64;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        ops.push(Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    })
}

fn build(pages: Vec<Vec<Operation>>) -> Document {
    build_with_font(pages, helvetica)
}

fn build_with_font(
    pages: Vec<Vec<Operation>>,
    font: impl FnOnce(&mut Document) -> ObjectId,
) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = font(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save pdf");
    buffer
}

/// One page per entry, one Helvetica 12pt line per string.
pub(crate) fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    save(build(pages.iter().map(|lines| text_operations(lines)).collect()))
}

/// One page per entry drawn in a subsetted Type0 font with `Identity-H`
/// encoding: each distinct character gets a small glyph id as its CID and
/// only the compressed `/ToUnicode` CMap says which character it is.
pub(crate) fn pdf_with_cid_font(pages: &[&[&str]]) -> Vec<u8> {
    let mut glyphs: Vec<char> = pages
        .iter()
        .flat_map(|lines| lines.iter().flat_map(|line| line.chars()))
        .collect();
    glyphs.sort_unstable();
    glyphs.dedup();
    let cid = |ch: char| glyphs.iter().position(|&g| g == ch).unwrap_or(0) as u16 + 1;

    let operations = pages
        .iter()
        .map(|lines| {
            let mut ops = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                let y = FIRST_BASELINE - LINE_HEIGHT * i as i64;
                let codes: Vec<u8> = line.chars().flat_map(|ch| cid(ch).to_be_bytes()).collect();
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
                ops.push(Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(codes, StringFormat::Hexadecimal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            ops
        })
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", glyphs.len()));
    for &ch in &glyphs {
        let mut units = [0u16; 2];
        let hex: String = ch
            .encode_utf16(&mut units)
            .iter()
            .map(|u| format!("{:04X}", u))
            .collect();
        cmap.push_str(&format!("<{:04X}> <{}>\n", cid(ch), hex));
    }
    cmap.push_str("endbfchar\nendcmap\nend\nend\n");

    let font = move |doc: &mut Document| {
        let mut to_unicode = Stream::new(dictionary! {}, cmap.into_bytes());
        to_unicode.compress().expect("compress cmap");
        let to_unicode_id = doc.add_object(to_unicode);
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "AAAAAA+NotoSans",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "DW" => 500,
        });
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "AAAAAA+NotoSans",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![descendant_id.into()],
            "ToUnicode" => to_unicode_id,
        })
    };
    save(build_with_font(operations, font))
}

/// Single page whose words are drawn by separate `Tj` operators with a `TJ`
/// kerning gap in the middle, as typesetters commonly emit them.
pub(crate) fn pdf_with_split_runs() -> Vec<u8> {
    let ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("Td", vec![LEFT_MARGIN.into(), FIRST_BASELINE.into()]),
        Operation::new("Tj", vec![Object::string_literal("ca")]),
        Operation::new("Tj", vec![Object::string_literal("t")]),
        Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal(" "),
                Object::string_literal("sat"),
                Object::Integer(-400),
                Object::string_literal("down"),
            ])],
        ),
        Operation::new("ET", vec![]),
    ];
    save(build(vec![ops]))
}

/// A page that only paints a filled rectangle, standing in for a scan.
pub(crate) fn image_only_pdf() -> Vec<u8> {
    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![0.5.into(), 0.5.into(), 0.5.into()]),
        Operation::new(
            "re",
            vec![72.into(), 72.into(), 468.into(), 648.into()],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ];
    save(build(vec![ops]))
}

/// A text PDF whose trailer declares an encryption dictionary.
pub(crate) fn encrypted_pdf() -> Vec<u8> {
    let mut doc = build(vec![text_operations(&["secret words"])]);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![1u8; 16]),
            Object::string_literal(vec![1u8; 16]),
        ],
    );
    save(doc)
}
