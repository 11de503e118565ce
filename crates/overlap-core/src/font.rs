//! Font-aware glyph decoding
//!
//! Turns the bytes of a string operand into glyphs carrying their Unicode
//! text and advance width. Text comes from the font's `/ToUnicode` CMap when
//! it maps the code, otherwise from the simple-font `/Encoding` (base
//! encoding plus `/Differences`). Type0 fonts are read two bytes per code;
//! a CID the CMap does not cover is taken as the code point itself, which
//! is what Identity-H producers without a CMap emit in practice.
//!
//! Layout and the lopdf extraction backend both decode through here, so the
//! scorer and the highlighter always see the same words.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as PdfDocument, Object, ObjectId};

/// Glyph width used when a simple font carries no metrics, in thousandths
/// of an em
pub(crate) const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// `/DW` default for composite fonts
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    /// Unicode text, empty when the code maps to nothing
    pub text: String,
    /// Advance in thousandths of an em
    pub width: f32,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_space: bool,
}

/// Built-in single-byte encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
}

impl BaseEncoding {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"StandardEncoding" => Some(BaseEncoding::Standard),
            b"WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            b"MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            _ => None,
        }
    }

    fn decode(self, byte: u8) -> Option<char> {
        match self {
            BaseEncoding::Standard => standard_char(byte),
            BaseEncoding::WinAnsi => win_ansi_char(byte),
            BaseEncoding::MacRoman => mac_roman_char(byte),
        }
    }
}

/// Everything needed to decode and measure strings shown in one font.
#[derive(Debug, Clone)]
pub(crate) struct FontDecoder {
    two_byte: bool,
    to_unicode: BTreeMap<u32, String>,
    base: BaseEncoding,
    differences: BTreeMap<u32, char>,
    widths: BTreeMap<u32, f32>,
    default_width: f32,
}

/// Decoder for fonts missing from the page resources
pub(crate) static FALLBACK_FONT: FontDecoder = FontDecoder {
    two_byte: false,
    to_unicode: BTreeMap::new(),
    base: BaseEncoding::Standard,
    differences: BTreeMap::new(),
    widths: BTreeMap::new(),
    default_width: DEFAULT_GLYPH_WIDTH,
};

impl FontDecoder {
    pub(crate) fn from_dict(doc: &PdfDocument, font: &Dictionary) -> Self {
        let two_byte = font.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Type0"[..]);
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| stream_bytes(doc, o))
            .map(|data| parse_to_unicode(&data))
            .unwrap_or_default();

        let mut decoder = FontDecoder {
            two_byte,
            to_unicode,
            ..FALLBACK_FONT.clone()
        };
        if two_byte {
            decoder.load_cid_widths(doc, font);
        } else {
            decoder.load_simple_encoding(doc, font);
            decoder.load_simple_widths(doc, font);
        }
        decoder
    }

    fn load_simple_encoding(&mut self, doc: &PdfDocument, font: &Dictionary) {
        let Ok(encoding) = font.get(b"Encoding") else {
            return;
        };
        match resolve(doc, encoding) {
            Object::Name(name) => {
                if let Some(base) = BaseEncoding::from_name(name) {
                    self.base = base;
                }
            }
            Object::Dictionary(dict) => {
                if let Some(base) = dict
                    .get(b"BaseEncoding")
                    .ok()
                    .and_then(|o| resolve(doc, o).as_name().ok())
                    .and_then(BaseEncoding::from_name)
                {
                    self.base = base;
                }
                if let Ok(differences) = dict.get(b"Differences") {
                    if let Ok(entries) = resolve(doc, differences).as_array() {
                        self.differences = parse_differences(doc, entries);
                    }
                }
            }
            _ => {}
        }
    }

    fn load_simple_widths(&mut self, doc: &PdfDocument, font: &Dictionary) {
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .unwrap_or(0.0) as u32;
        if let Some(widths) = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
        {
            for (offset, w) in widths.iter().enumerate() {
                let width = number(resolve(doc, w)).unwrap_or(0.0);
                self.widths.insert(first_char + offset as u32, width);
            }
        }
        if let Some(missing) = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| number(resolve(doc, o)))
            .filter(|w| *w > 0.0)
        {
            self.default_width = missing;
        }
    }

    /// `/W` and `/DW` of the first descendant font.
    fn load_cid_widths(&mut self, doc: &PdfDocument, font: &Dictionary) {
        self.default_width = DEFAULT_CID_WIDTH;
        let Some(descendant) = font
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|o| resolve(doc, o).as_dict().ok())
        else {
            return;
        };

        if let Some(dw) = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
        {
            self.default_width = dw;
        }
        if let Some(w) = descendant
            .get(b"W")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
        {
            self.widths = parse_cid_widths(doc, w);
        }
    }

    fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Split a string operand into glyphs.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.two_byte {
            return bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                    let text = match self.to_unicode.get(&code) {
                        Some(text) => text.clone(),
                        None => char::from_u32(code).map(String::from).unwrap_or_default(),
                    };
                    Glyph {
                        text,
                        width: self.width(code),
                        is_space: false,
                    }
                })
                .collect();
        }

        if self.to_unicode.is_empty() && bytes.starts_with(&[0xFE, 0xFF]) {
            return self.decode_utf16(&bytes[2..]);
        }

        bytes
            .iter()
            .map(|&b| {
                let code = b as u32;
                let text = match self.to_unicode.get(&code) {
                    Some(text) => text.clone(),
                    None => self
                        .differences
                        .get(&code)
                        .copied()
                        .or_else(|| self.base.decode(b))
                        .map(String::from)
                        .unwrap_or_default(),
                };
                Glyph {
                    text,
                    width: self.width(code),
                    is_space: b == b' ',
                }
            })
            .collect()
    }

    /// Text strings written as UTF-16BE; a surrogate pair is one glyph.
    fn decode_utf16(&self, bytes: &[u8]) -> Vec<Glyph> {
        let units = bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]));
        char::decode_utf16(units)
            .map(|unit| {
                let (code, text) = match unit {
                    Ok(ch) => (ch as u32, ch.to_string()),
                    Err(e) => (e.unpaired_surrogate() as u32, '\u{FFFD}'.to_string()),
                };
                Glyph {
                    text,
                    width: self.width(code),
                    is_space: code == 32,
                }
            })
            .collect()
    }
}

/// Decoders for every font in the page resources, keyed by resource name.
pub(crate) fn page_fonts(doc: &PdfDocument, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder> {
    let mut decoders = HashMap::new();
    let Some(fonts) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|f| resolve(doc, f).as_dict().ok())
    else {
        return decoders;
    };

    for (key, font) in fonts.iter() {
        if let Ok(font) = resolve(doc, font).as_dict() {
            decoders.insert(key.clone(), FontDecoder::from_dict(doc, font));
        }
    }
    decoders
}

pub(crate) fn resolve<'a>(doc: &'a PdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Find `Resources` on the page or the nearest ancestor that has it.
fn page_resources(doc: &PdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk guards against cyclic Parent links
    for _ in 0..32 {
        if let Ok(res) = node.get(b"Resources") {
            return resolve(doc, res).as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve(doc, parent).as_dict().ok()?;
    }
    None
}

/// Decoded stream data; unfiltered streams come back as stored.
fn stream_bytes(doc: &PdfDocument, obj: &Object) -> Option<Vec<u8>> {
    let stream = resolve(doc, obj).as_stream().ok()?;
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

fn parse_differences(doc: &PdfDocument, entries: &[Object]) -> BTreeMap<u32, char> {
    let mut map = BTreeMap::new();
    let mut next_code: Option<u32> = None;
    for entry in entries {
        match resolve(doc, entry) {
            Object::Integer(code) if (0..=255).contains(code) => next_code = Some(*code as u32),
            Object::Name(name) => {
                if let Some(code) = next_code {
                    if let Some(ch) = glyph_name_char(&String::from_utf8_lossy(name)) {
                        map.insert(code, ch);
                    }
                    next_code = Some(code + 1);
                }
            }
            _ => {}
        }
    }
    map
}

/// `/W` entries come as `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_cid_widths(doc: &PdfDocument, entries: &[Object]) -> BTreeMap<u32, f32> {
    let mut widths = BTreeMap::new();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = number(resolve(doc, &entries[i])) else {
            break;
        };
        let first = first as u32;
        match entries.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    entries.get(i + 2).and_then(|o| number(resolve(doc, o))),
                ) else {
                    break;
                };
                for code in first..=(last as u32).min(first + 0xFFFF) {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

// ---------------------------------------------------------------------------
// ToUnicode CMaps
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

fn cmap_tokens(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let b = data[pos];
        match b {
            b if b.is_ascii_whitespace() => pos += 1,
            b'%' => {
                while pos < data.len() && data[pos] != b'\n' && data[pos] != b'\r' {
                    pos += 1;
                }
            }
            b'<' if data.get(pos + 1) == Some(&b'<') => pos += 2,
            b'>' if data.get(pos + 1) == Some(&b'>') => pos += 2,
            b'<' => {
                let end = data[pos..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map_or(data.len(), |p| pos + p);
                let digits: Vec<u8> = data[pos + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .filter_map(|pair| {
                        let s = std::str::from_utf8(pair).ok()?;
                        // an odd trailing digit is padded with zero
                        u8::from_str_radix(&format!("{:0<2}", s), 16).ok()
                    })
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
                pos = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::Open);
                pos += 1;
            }
            b']' => {
                tokens.push(CMapToken::Close);
                pos += 1;
            }
            b'(' => {
                while pos < data.len() && data[pos] != b')' {
                    pos += 1;
                }
                pos += 1;
            }
            _ => {
                let start = pos;
                while pos < data.len()
                    && !data[pos].is_ascii_whitespace()
                    && !b"<>[]()%".contains(&data[pos])
                {
                    pos += 1;
                }
                if pos == start {
                    pos += 1;
                    continue;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..pos]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
pub(crate) fn parse_to_unicode(data: &[u8]) -> BTreeMap<u32, String> {
    let mut map = BTreeMap::new();
    let mut tokens = cmap_tokens(data).into_iter().peekable();

    while let Some(token) = tokens.next() {
        let CMapToken::Word(word) = token else {
            continue;
        };
        match word.as_str() {
            "beginbfchar" => {
                while let Some(CMapToken::Hex(src)) =
                    tokens.next_if(|t| matches!(t, CMapToken::Hex(_)))
                {
                    if let Some(CMapToken::Hex(dst)) = tokens.next() {
                        map.insert(code_of(&src), String::from_utf16_lossy(&utf16_units(&dst)));
                    }
                }
            }
            "beginbfrange" => {
                while let Some(CMapToken::Hex(start)) =
                    tokens.next_if(|t| matches!(t, CMapToken::Hex(_)))
                {
                    let Some(CMapToken::Hex(end)) = tokens.next() else {
                        break;
                    };
                    let (start, end) = (code_of(&start), code_of(&end));
                    if end < start || end - start > 0xFFFF {
                        continue;
                    }
                    match tokens.next() {
                        Some(CMapToken::Hex(dst)) => {
                            let units = utf16_units(&dst);
                            for (offset, code) in (start..=end).enumerate() {
                                let mut units = units.clone();
                                if let Some(last) = units.last_mut() {
                                    *last = last.wrapping_add(offset as u16);
                                }
                                map.insert(code, String::from_utf16_lossy(&units));
                            }
                        }
                        Some(CMapToken::Open) => {
                            let mut code = start;
                            while let Some(CMapToken::Hex(dst)) =
                                tokens.next_if(|t| matches!(t, CMapToken::Hex(_)))
                            {
                                if code <= end {
                                    map.insert(code, String::from_utf16_lossy(&utf16_units(&dst)));
                                }
                                code += 1;
                            }
                            tokens.next_if_eq(&CMapToken::Close);
                        }
                        _ => break,
                    }
                }
            }
            _ => {}
        }
    }
    map
}

// ---------------------------------------------------------------------------
// Glyph names and base encodings
// ---------------------------------------------------------------------------

/// Unicode for a glyph name from a `/Differences` array.
fn glyph_name_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Some(ch);
        }
    }
    if let Some(hex) = name.strip_prefix("uni").filter(|h| h.len() == 4) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(hex) = name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())) {
        if let Ok(cp) = u32::from_str_radix(hex, 16) {
            return char::from_u32(cp);
        }
    }
    let ch = match name {
        "space" | "nbspace" | "nonbreakingspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "ff" => '\u{FB00}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "ffi" => '\u{FB03}',
        "ffl" => '\u{FB04}',
        "germandbls" => 'ß',
        "aacute" => 'á',
        "agrave" => 'à',
        "acircumflex" => 'â',
        "adieresis" => 'ä',
        "ccedilla" => 'ç',
        "eacute" => 'é',
        "egrave" => 'è',
        "ecircumflex" => 'ê',
        "edieresis" => 'ë',
        "iacute" => 'í',
        "idieresis" => 'ï',
        "ntilde" => 'ñ',
        "oacute" => 'ó',
        "ocircumflex" => 'ô',
        "odieresis" => 'ö',
        "uacute" => 'ú',
        "udieresis" => 'ü',
        "Eacute" => 'É',
        _ => return None,
    };
    Some(ch)
}

fn standard_char(byte: u8) -> Option<char> {
    let ch = match byte {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x20..=0x7E => byte as char,
        0xA1 => '¡',
        0xA2 => '¢',
        0xA3 => '£',
        0xA4 => '\u{2044}',
        0xA5 => '¥',
        0xA6 => 'ƒ',
        0xA7 => '§',
        0xA8 => '¤',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '«',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '·',
        0xB6 => '¶',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '»',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '¿',
        0xC1 => '`',
        0xC2 => '´',
        0xC3 => 'ˆ',
        0xC4 => '˜',
        0xC5 => '¯',
        0xC6 => '˘',
        0xC7 => '˙',
        0xC8 => '¨',
        0xCA => '˚',
        0xCB => '¸',
        0xCD => '˝',
        0xCE => '˛',
        0xCF => 'ˇ',
        0xD0 => '\u{2014}',
        0xE1 => 'Æ',
        0xE3 => 'ª',
        0xE8 => 'Ł',
        0xE9 => 'Ø',
        0xEA => 'Œ',
        0xEB => 'º',
        0xF1 => 'æ',
        0xF5 => 'ı',
        0xF8 => 'ł',
        0xF9 => 'ø',
        0xFA => 'œ',
        0xFB => 'ß',
        _ => return None,
    };
    Some(ch)
}

fn win_ansi_char(byte: u8) -> Option<char> {
    const HIGH_CONTROL: [Option<char>; 32] = [
        Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
        Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
        None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
        Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
    ];
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        0x80..=0x9F => HIGH_CONTROL[(byte - 0x80) as usize],
        _ => None,
    }
}

fn mac_roman_char(byte: u8) -> Option<char> {
    const HIGH: [char; 128] = [
        'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
        'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
        '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
        '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
        '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
        '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '¤', '‹', '›', 'ﬁ', 'ﬂ',
        '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
        '\u{FFFD}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
    ];
    match byte {
        0x20..=0x7E => Some(byte as char),
        0x80..=0xFF => Some(HIGH[(byte - 0x80) as usize]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(glyphs: &[Glyph]) -> String {
        glyphs.iter().map(|g| g.text.as_str()).collect()
    }

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0001> <0063>
<0002> <0061>
endbfchar
2 beginbfrange
<0010> <0012> <0072>
<0020> <0021> [<0066006C> <D83DDE00>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_to_unicode_bfchar_and_bfrange() {
        let map = parse_to_unicode(CMAP);
        assert_eq!(map.get(&0x01).map(String::as_str), Some("c"));
        assert_eq!(map.get(&0x02).map(String::as_str), Some("a"));
        assert_eq!(map.get(&0x10).map(String::as_str), Some("r"));
        assert_eq!(map.get(&0x12).map(String::as_str), Some("t"));
        assert_eq!(map.get(&0x20).map(String::as_str), Some("fl"));
        assert_eq!(map.get(&0x21).map(String::as_str), Some("\u{1F600}"));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn test_two_byte_codes_go_through_to_unicode() {
        let decoder = FontDecoder {
            two_byte: true,
            to_unicode: parse_to_unicode(CMAP),
            default_width: DEFAULT_CID_WIDTH,
            ..FALLBACK_FONT.clone()
        };
        let glyphs = decoder.decode(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x12]);
        assert_eq!(texts(&glyphs), "cat");
        assert!(glyphs.iter().all(|g| g.width == DEFAULT_CID_WIDTH && !g.is_space));
    }

    #[test]
    fn test_unmapped_cid_reads_as_code_point() {
        let decoder = FontDecoder {
            two_byte: true,
            ..FALLBACK_FONT.clone()
        };
        assert_eq!(texts(&decoder.decode(&[0x00, 0x6D, 0x00, 0xE9])), "mé");
    }

    #[test]
    fn test_simple_encodings() {
        let standard = FALLBACK_FONT.decode(b"it's");
        assert_eq!(texts(&standard), "it\u{2019}s");
        assert!(standard.iter().all(|g| g.width == DEFAULT_GLYPH_WIDTH));

        let win_ansi = FontDecoder {
            base: BaseEncoding::WinAnsi,
            ..FALLBACK_FONT.clone()
        };
        assert_eq!(texts(&win_ansi.decode(&[b'c', 0xE9, 0x93, b'x', 0x94])), "c\u{e9}\u{201C}x\u{201D}");

        let mac = FontDecoder {
            base: BaseEncoding::MacRoman,
            ..FALLBACK_FONT.clone()
        };
        assert_eq!(texts(&mac.decode(&[b'n', 0x8E])), "né");
    }

    #[test]
    fn test_differences_override_base() {
        let doc = PdfDocument::with_version("1.7");
        let entries = vec![
            Object::Integer(1),
            Object::Name(b"c".to_vec()),
            Object::Name(b"a".to_vec()),
            Object::Name(b"t".to_vec()),
            Object::Integer(0x41),
            Object::Name(b"fi".to_vec()),
        ];
        let decoder = FontDecoder {
            differences: parse_differences(&doc, &entries),
            ..FALLBACK_FONT.clone()
        };
        assert_eq!(texts(&decoder.decode(&[1, 2, 3, b' ', 0x41, b'x'])), "cat \u{FB01}x");
    }

    #[test]
    fn test_cid_widths_both_forms() {
        let doc = PdfDocument::with_version("1.7");
        let entries = vec![
            Object::Integer(10),
            Object::Array(vec![Object::Integer(300), Object::Integer(400)]),
            Object::Integer(20),
            Object::Integer(22),
            Object::Integer(700),
        ];
        let widths = parse_cid_widths(&doc, &entries);
        assert_eq!(widths.get(&10), Some(&300.0));
        assert_eq!(widths.get(&11), Some(&400.0));
        assert_eq!(widths.get(&21), Some(&700.0));
        assert_eq!(widths.get(&23), None);
    }

    #[test]
    fn test_simple_widths_array() {
        let mut decoder = FALLBACK_FONT.clone();
        decoder.widths.insert(97, 1000.0);
        decoder.widths.insert(98, 250.0);
        let glyphs = decoder.decode(b"abx");
        assert_eq!(glyphs[0].width, 1000.0);
        assert_eq!(glyphs[1].width, 250.0);
        assert_eq!(glyphs[2].width, DEFAULT_GLYPH_WIDTH);
    }

    #[test]
    fn test_utf16_with_bom() {
        let glyphs = FALLBACK_FONT.decode(&[0xFE, 0xFF, 0x00, 0x63, 0x00, 0x61]);
        assert_eq!(texts(&glyphs), "ca");
    }

    #[test]
    fn test_utf16_surrogate_pair_is_one_glyph() {
        // "a", U+1F600, "b"
        let glyphs = FALLBACK_FONT.decode(&[0xFE, 0xFF, 0x00, 0x61, 0xD8, 0x3D, 0xDE, 0x00, 0x00, 0x62]);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(texts(&glyphs), "a\u{1F600}b");
        assert_eq!(glyphs[1].text.chars().count(), 1);
        assert!(!glyphs[2].is_space);
    }
}
