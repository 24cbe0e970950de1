//! # PDF Serializer
//!
//! Takes positioned sheet pages and writes a PDF 1.7 file by hand. The
//! sheet only needs filled/stroked rectangles, lines and single-line text,
//! so the writer stays small:
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! xref                <- byte offset of every object
//! trailer             <- root + info references
//! %%EOF
//! ```
//!
//! Standard fonts are referenced as Type1 with WinAnsiEncoding. TrueType
//! fonts are embedded whole as Type0/CIDFontType2 with Identity-H encoding,
//! so a CID is the font's own glyph ID.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use log::debug;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{RepairDocError, Result};
use crate::font::encoding::unicode_to_winansi;
use crate::font::{FontContext, FontData, FontKey};
use crate::model::Metadata;
use crate::render::{DrawCommand, LayoutPage, Stroke};
use crate::style::Color;

#[derive(Default)]
pub struct PdfWriter;

/// How text for one font resource is encoded in content streams.
enum TextEncoding {
    WinAnsi,
    Identity { char_to_gid: HashMap<char, u16> },
}

struct FontResource {
    key: FontKey,
    obj_id: usize,
    encoding: TextEncoding,
}

/// Object table under construction. Index 0 is the free-list head.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    fonts: Vec<FontResource>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: vec![Vec::new()],
            fonts: Vec::new(),
        }
    }

    /// Reserve an object ID to be filled in later.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn set(&mut self, id: usize, data: Vec<u8>) {
        self.objects[id] = data;
    }

    /// Push a zlib-compressed stream object. `extra` is spliced into the
    /// stream dictionary.
    fn push_stream(&mut self, extra: &str, raw: &[u8]) -> usize {
        let compressed = compress_to_vec_zlib(raw, 6);
        let mut data = Vec::with_capacity(compressed.len() + 64);
        let _ = write!(
            data,
            "<< /Length {} /Filter /FlateDecode{} >>\nstream\n",
            compressed.len(),
            extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: &FontKey) -> usize {
        self.fonts.iter().position(|f| &f.key == key).unwrap_or(0)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write positioned pages to PDF bytes.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        font_context: &FontContext,
    ) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder::new();
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        self.register_fonts(&mut builder, pages, font_context)?;

        let font_resources = builder
            .fonts
            .iter()
            .enumerate()
            .map(|(i, f)| format!("/F{} {} 0 R", i, f.obj_id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, &builder, font_context);
            let content_id = builder.push_stream("", content.as_bytes());
            let page_dict = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                pages_id, page.width, page.height, content_id, font_resources
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.set(
            catalog_id,
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes(),
        );
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.set(
            pages_id,
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes(),
        );

        let info_id = builder.push(Self::info_dict(metadata).into_bytes());
        debug!(
            "serializing {} page(s), {} font(s), {} objects",
            pages.len(),
            builder.fonts.len(),
            builder.objects.len() - 1
        );
        Ok(self.serialize(&builder, catalog_id, info_id))
    }

    fn info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} {} ", name, Self::text_string(value));
            }
        }
        info.push_str("/Producer (repairdoc) /Creator (repairdoc) >>");
        info
    }

    /// Collect every face used by text and create its font objects.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        font_context: &FontContext,
    ) -> Result<()> {
        let mut used: BTreeMap<FontKey, BTreeSet<char>> = BTreeMap::new();
        for element in pages.iter().flat_map(|p| p.elements.iter()) {
            if let DrawCommand::Text { text, font, .. } = element {
                let key = font_context.resolve_key(&font.family, font.weight);
                used.entry(key).or_default().extend(text.chars());
            }
        }
        if used.is_empty() {
            used.insert(FontKey::new("Helvetica", 400), BTreeSet::new());
        }

        for (key, chars) in used {
            let data = font_context.registry().get(&key).ok_or_else(|| {
                RepairDocError::FontError(format!("font {} ({}) is not registered", key.family, key.weight))
            })?;
            let resource = match data {
                FontData::Standard(font) => {
                    let dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        font.pdf_name()
                    );
                    FontResource {
                        key,
                        obj_id: builder.push(dict.into_bytes()),
                        encoding: TextEncoding::WinAnsi,
                    }
                }
                FontData::Custom { data, .. } => Self::embed_truetype(builder, key, data, &chars)?,
            };
            builder.fonts.push(resource);
        }
        Ok(())
    }

    /// Write FontFile2, FontDescriptor, CIDFont, ToUnicode and Type0 objects.
    fn embed_truetype(
        builder: &mut PdfBuilder,
        key: FontKey,
        ttf_data: &[u8],
        used_chars: &BTreeSet<char>,
    ) -> Result<FontResource> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            RepairDocError::FontError(format!("Failed to parse TTF data for font '{}': {}", key.family, e))
        })?;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid.0)))
            .collect();

        let name = Self::sanitize_font_name(&key.family, key.weight);
        let scale = 1000.0 / face.units_per_em() as f64;
        let scaled = |v: i16| (v as f64 * scale) as i32;

        let fontfile_id = builder.push_stream(&format!(" /Length1 {}", ttf_data.len()), ttf_data);

        let bbox = face.global_bounding_box();
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            name,
            scaled(bbox.x_min),
            scaled(bbox.y_min),
            scaled(bbox.x_max),
            scaled(bbox.y_max),
            scaled(face.ascender()),
            scaled(face.descender()),
            scaled(face.capital_height().unwrap_or(face.ascender())),
            if key.weight >= 700 { 120 } else { 80 },
            fontfile_id,
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            name,
            descriptor_id,
            default_width,
            Self::build_w_array(&char_to_gid, &face),
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        let cmap = Self::build_tounicode_cmap(&char_to_gid, &name);
        let tounicode_id = builder.push_stream("", cmap.as_bytes());

        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0.into_bytes());

        Ok(FontResource {
            key,
            obj_id: type0_id,
            encoding: TextEncoding::Identity { char_to_gid },
        })
    }

    /// `/W` array: `[gid [width] gid [width] ...]` in 1/1000 em.
    fn build_w_array(char_to_gid: &HashMap<char, u16>, face: &ttf_parser::Face) -> String {
        let scale = 1000.0 / face.units_per_em() as f64;
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();
        let mut out = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(out, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        out.push_str(" ]");
        out
    }

    /// ToUnicode CMap so text can be searched and copied.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut pairs: Vec<(u16, char)> = char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
        pairs.sort_unstable();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // At most 100 entries per bfchar block
        for chunk in pairs.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, ch) in chunk {
                let mut units = [0u16; 2];
                let hex: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    fn build_content_stream(
        &self,
        page: &LayoutPage,
        builder: &PdfBuilder,
        font_context: &FontContext,
    ) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            match element {
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    let pdf_y = page.height - y - height;
                    stream.push_str("q\n");
                    if let Some(c) = fill {
                        Self::set_fill(&mut stream, c);
                    }
                    if let Some(s) = stroke {
                        Self::set_stroke(&mut stream, s);
                    }
                    let op = match (fill.is_some(), stroke.is_some()) {
                        (true, true) => "B",
                        (true, false) => "f",
                        (false, true) => "S",
                        (false, false) => "n",
                    };
                    let _ = write!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} re\n{}\nQ\n",
                        x, pdf_y, width, height, op
                    );
                }
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                } => {
                    stream.push_str("q\n");
                    Self::set_stroke(&mut stream, stroke);
                    let _ = write!(
                        stream,
                        "{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        x1,
                        page.height - y1,
                        x2,
                        page.height - y2
                    );
                }
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font,
                    font_size,
                    color,
                } => {
                    let idx = builder.font_index(&font_context.resolve_key(&font.family, font.weight));
                    let encoded = match builder.fonts.get(idx).map(|f| &f.encoding) {
                        Some(TextEncoding::Identity { char_to_gid }) => {
                            let hex: String = text
                                .chars()
                                .map(|ch| format!("{:04X}", char_to_gid.get(&ch).copied().unwrap_or(0)))
                                .collect();
                            format!("<{}>", hex)
                        }
                        _ => format!("({})", Self::encode_winansi(text)),
                    };
                    let _ = write!(
                        stream,
                        "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n{} Tj\nET\n",
                        color.r,
                        color.g,
                        color.b,
                        idx,
                        font_size,
                        x,
                        page.height - y,
                        encoded
                    );
                }
            }
        }
        stream
    }

    fn set_fill(stream: &mut String, c: &Color) {
        let _ = writeln!(stream, "{:.3} {:.3} {:.3} rg", c.r, c.g, c.b);
    }

    fn set_stroke(stream: &mut String, s: &Stroke) {
        let _ = writeln!(
            stream,
            "{:.3} {:.3} {:.3} RG\n{:.2} w",
            s.color.r, s.color.g, s.color.b, s.width
        );
    }

    /// Encode text as the body of a WinAnsi literal string. Characters
    /// without a WinAnsi byte become `?`.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match unicode_to_winansi(ch).unwrap_or(b'?') {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                b @ 0x20..=0x7E => out.push(b as char),
                b => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// A PDF text string: a literal for ASCII, UTF-16BE hex otherwise.
    fn text_string(s: &str) -> String {
        if s.is_ascii() {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let hex: String = s.encode_utf16().map(|u| format!("{:04X}", u)).collect();
        format!("<FEFF{}>", hex)
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// PDF name for an embedded font: alphanumerics only, bold suffixed.
    fn sanitize_font_name(family: &str, weight: u32) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        name
    }

    fn serialize(&self, builder: &PdfBuilder, root_id: usize, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n0000000000 65535 f \n", builder.objects.len());
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            root_id,
            info_id,
            xref_offset
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_text(texts: &[(&str, u32)]) -> LayoutPage {
        LayoutPage {
            width: 841.89,
            height: 595.28,
            elements: texts
                .iter()
                .map(|(text, weight)| DrawCommand::Text {
                    x: 36.0,
                    y: 60.0,
                    text: text.to_string(),
                    font: FontKey::new("Helvetica", *weight),
                    font_size: 10.0,
                    color: Color::BLACK,
                })
                .collect(),
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_empty_page_produces_valid_pdf() {
        let bytes = PdfWriter::new()
            .write(&[page_with_text(&[])], &Metadata::default(), &FontContext::new())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let text = as_text(&bytes);
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = PdfWriter::new()
            .write(&[page_with_text(&[("Hi", 400)])], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = as_text(&bytes);
        let xref_start = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert!(!entries.is_empty());
        for (i, offset) in entries.iter().enumerate() {
            assert!(bytes[*offset..].starts_with(format!("{} 0 obj", i + 1).as_bytes()));
        }
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let bytes = PdfWriter::new()
            .write(
                &[page_with_text(&[("A", 400), ("A", 700)])],
                &Metadata::default(),
                &FontContext::new(),
            )
            .unwrap();
        let text = as_text(&bytes);
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(!text.contains("CIDFontType2"));
    }

    #[test]
    fn test_unknown_family_shares_the_fallback_resource() {
        let mut page = page_with_text(&[("A", 400)]);
        page.elements.push(DrawCommand::Text {
            x: 36.0,
            y: 80.0,
            text: "B".to_string(),
            font: FontKey::new("NanumGothic", 400),
            font_size: 10.0,
            color: Color::BLACK,
        });
        let bytes = PdfWriter::new()
            .write(&[page], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = as_text(&bytes);
        assert_eq!(text.matches("/Subtype /Type1").count(), 1);
    }

    #[test]
    fn test_metadata_uses_utf16_for_hangul() {
        let metadata = Metadata {
            title: Some("보수확인서".to_string()),
            author: Some("Facilities (HQ)".to_string()),
            subject: None,
        };
        let bytes = PdfWriter::new()
            .write(&[page_with_text(&[])], &metadata, &FontContext::new())
            .unwrap();
        let text = as_text(&bytes);
        assert!(text.contains("/Title <FEFFBCF4"));
        assert!(text.contains("/Author (Facilities \\(HQ\\))"));
    }

    #[test]
    fn test_encode_winansi() {
        assert_eq!(PdfWriter::encode_winansi("a(b)\\"), "a\\(b\\)\\\\");
        assert_eq!(PdfWriter::encode_winansi("합"), "?");
        assert_eq!(PdfWriter::encode_winansi("é"), "\\351");
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(PdfWriter::sanitize_font_name("Nanum Gothic", 400), "NanumGothic");
        assert_eq!(PdfWriter::sanitize_font_name("Nanum Gothic", 700), "NanumGothic-Bold");
        assert_eq!(PdfWriter::sanitize_font_name("나눔", 400), "CustomFont");
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let mut char_to_gid = HashMap::new();
        char_to_gid.insert('A', 36u16);
        char_to_gid.insert('가', 900u16);
        let cmap = PdfWriter::build_tounicode_cmap(&char_to_gid, "TestFont");
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0384> <AC00>"));
        assert!(cmap.contains("<0000> <FFFF>"));
    }
}
