//! # Font Management
//!
//! Standard PDF fonts (Helvetica, Courier) need no embedding but can only
//! encode WinAnsi text. Korean labels and work descriptions need a real
//! TrueType font, registered here and embedded by the PDF writer.

pub mod encoding;
pub mod metrics;

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::error::{RepairDocError, Result};
use crate::style::FontEntry;
pub use metrics::StandardFontMetrics;

/// Identifies a font face by family and weight (400 or 700).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
}

impl FontKey {
    pub fn new(family: &str, weight: u32) -> Self {
        Self {
            family: family.to_string(),
            weight: snap_weight(weight),
        }
    }
}

fn snap_weight(weight: u32) -> u32 {
    if weight >= 600 {
        700
    } else {
        400
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// A standard PDF font. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font embedded into the PDF.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

/// Metrics read from a TrueType font with ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub default_advance: u16,
    advance_widths: HashMap<char, u16>,
}

impl CustomFontMetrics {
    pub fn from_font_data(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| RepairDocError::FontError(format!("Failed to parse font: {e}")))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        for code in 0x20u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(gid) = face.glyph_index(ch) {
                advance_widths.insert(ch, face.glyph_hor_advance(gid).unwrap_or(0));
            }
        }

        let default_advance = match advance_widths.get(&' ') {
            Some(&w) if w > 0 => w,
            _ => units_per_em / 2,
        };

        Ok(Self {
            units_per_em,
            default_advance,
            advance_widths,
        })
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        w as f64 / self.units_per_em as f64 * font_size
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.advance_widths.contains_key(&ch)
    }
}

/// The standard fonts the writer can reference without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => metrics::HELVETICA,
            Self::HelveticaBold => metrics::HELVETICA_BOLD,
            Self::Courier | Self::CourierBold => metrics::COURIER,
        }
    }
}

/// Maps font keys to font data, with Helvetica as the last resort.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let standard = [
            (FontKey::new("Helvetica", 400), StandardFont::Helvetica),
            (FontKey::new("Helvetica", 700), StandardFont::HelveticaBold),
            (FontKey::new("Courier", 400), StandardFont::Courier),
            (FontKey::new("Courier", 700), StandardFont::CourierBold),
        ];
        let fonts = standard
            .into_iter()
            .map(|(key, font)| (key, FontData::Standard(font)))
            .collect();
        Self { fonts }
    }

    /// Resolve a face: exact match, then the family's regular weight, then
    /// Helvetica at the requested weight.
    pub fn resolve_key(&self, family: &str, weight: u32) -> FontKey {
        let exact = FontKey::new(family, weight);
        if self.fonts.contains_key(&exact) {
            return exact;
        }
        let regular = FontKey::new(family, 400);
        if self.fonts.contains_key(&regular) {
            return regular;
        }
        FontKey::new("Helvetica", weight)
    }

    pub fn resolve(&self, family: &str, weight: u32) -> &FontData {
        let key = self.resolve_key(family, weight);
        &self.fonts[&key]
    }

    pub fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts.get(key)
    }

    /// Register a TrueType font from raw bytes.
    pub fn register(&mut self, family: &str, weight: u32, data: Vec<u8>) -> Result<()> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        debug!(
            "registered font {} ({}), {} glyphs mapped",
            family,
            weight,
            metrics.advance_widths.len()
        );
        self.fonts
            .insert(FontKey::new(family, weight), FontData::Custom { data, metrics });
        Ok(())
    }
}

/// Shared font context used by the sheet renderer and the PDF writer.
#[derive(Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Build a context with every configured font file loaded.
    pub fn from_entries(entries: &[FontEntry]) -> Result<Self> {
        let mut ctx = Self::new();
        for entry in entries {
            ctx.load_file(&entry.family, entry.weight, &entry.path)?;
        }
        Ok(ctx)
    }

    pub fn load_file(&mut self, family: &str, weight: u32, path: &Path) -> Result<()> {
        let data = std::fs::read(path).map_err(|e| {
            RepairDocError::FontError(format!("Cannot read font {}: {e}", path.display()))
        })?;
        self.registry.register(family, weight, data)
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }

    pub fn resolve_key(&self, family: &str, weight: u32) -> FontKey {
        self.registry.resolve_key(family, weight)
    }

    pub fn char_width(&self, ch: char, key: &FontKey, font_size: f64) -> f64 {
        match self.registry.resolve(&key.family, key.weight) {
            FontData::Standard(font) => font.metrics().char_width(ch, font_size),
            FontData::Custom { metrics, .. } => metrics.char_width(ch, font_size),
        }
    }

    /// Width of `text` in points.
    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, key, font_size))
            .sum()
    }

    /// Whether every character of `text` can be drawn with this face.
    pub fn can_encode(&self, text: &str, key: &FontKey) -> bool {
        match self.registry.resolve(&key.family, key.weight) {
            FontData::Standard(_) => text.chars().all(|ch| encoding::unicode_to_winansi(ch).is_some()),
            FontData::Custom { metrics, .. } => text.chars().all(|ch| metrics.has_glyph(ch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_width() {
        let ctx = FontContext::new();
        let key = ctx.resolve_key("Helvetica", 400);
        assert!((ctx.char_width(' ', &key, 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn bold_is_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("abc", &FontKey::new("Helvetica", 400), 12.0);
        let bold = ctx.measure_string("abc", &FontKey::new("Helvetica", 700), 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn unknown_family_falls_back_to_helvetica() {
        let ctx = FontContext::new();
        assert_eq!(ctx.resolve_key("NanumGothic", 700), FontKey::new("Helvetica", 700));
        assert_eq!(ctx.resolve_key("Courier", 800), FontKey::new("Courier", 700));
    }

    #[test]
    fn standard_fonts_cannot_encode_hangul() {
        let ctx = FontContext::new();
        let key = FontKey::new("Helvetica", 400);
        assert!(ctx.can_encode("Total 1,000", &key));
        assert!(!ctx.can_encode("합계", &key));
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        let mut ctx = FontContext::new();
        let err = ctx
            .registry_mut()
            .register("Broken", 400, vec![0, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, RepairDocError::FontError(_)));
    }

    #[test]
    fn missing_font_file_is_a_font_error() {
        let mut ctx = FontContext::new();
        let err = ctx
            .load_file("Nanum", 400, Path::new("/nonexistent/font.ttf"))
            .unwrap_err();
        assert!(matches!(err, RepairDocError::FontError(_)));
    }
}
