use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use ttf_parser::Face;

use crate::layout::LayoutError;

const MONOSPACE_ADVANCE: f32 = 0.6;
const FALLBACK_ADVANCE: f32 = 0.56;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    /// CSS weight: `normal`, `bold` or a number such as `700`.
    pub font_weight: String,
}

impl TextStyle {
    pub fn new(font_family: &str, font_size: f32, font_weight: &str) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size,
            font_weight: font_weight.to_string(),
        }
    }

    pub fn weight(&self) -> u16 {
        match self.font_weight.trim() {
            "bold" | "bolder" => 700,
            "lighter" => 300,
            other => other.parse::<u16>().unwrap_or(400),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight() >= 600
    }

    pub fn is_monospace(&self) -> bool {
        self.font_family
            .split(',')
            .next()
            .map(|first| {
                let first = first.trim().trim_matches('"').to_ascii_lowercase();
                first == "monospace" || first == "ui-monospace"
            })
            .unwrap_or(false)
    }
}

/// One source line of box text with the style it is drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub style: TextStyle,
    /// Tighter wrap bound for this line, if any.
    pub max_width: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureOptions {
    pub max_width: f32,
    pub line_gap: f32,
    pub width_ratio: f32,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            max_width: 450.0,
            line_gap: 2.0,
            width_ratio: 1.0,
        }
    }
}

/// Text metrics provider the layout engine measures box content with.
///
/// Implementors supply the advance width of a run of text and the height of
/// a line; `measure` wraps and accumulates on top of those. Providers backed
/// by a real rendering surface can override `measure` wholesale.
pub trait TextMeasurer {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;

    fn line_height(&self, style: &TextStyle) -> f32 {
        style.font_size * 1.2
    }

    fn measure(&self, lines: &[TextLine], options: &MeasureOptions) -> TextSize {
        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for line in lines {
            if line.text.trim().is_empty() {
                continue;
            }
            let bound = line
                .max_width
                .map_or(options.max_width, |w| w.min(options.max_width));
            let line_height = self.line_height(&line.style);
            for wrapped in wrap_line(self, &line.text, &line.style, bound, options.width_ratio) {
                let line_width = self.text_width(&wrapped, &line.style) * options.width_ratio;
                width = width.max(line_width);
                height += line_height + options.line_gap;
            }
        }
        TextSize {
            width: width.min(options.max_width),
            height,
        }
    }
}

/// Greedy word wrap. Lines that already fit are returned untouched so
/// preformatted indentation survives.
pub fn wrap_line<M: TextMeasurer + ?Sized>(
    measurer: &M,
    line: &str,
    style: &TextStyle,
    max_width: f32,
    width_ratio: f32,
) -> Vec<String> {
    let width_of = |text: &str| measurer.text_width(text, style) * width_ratio;
    if width_of(line) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if width_of(&candidate) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Font-free metrics from a per-character advance table. Deterministic on
/// every machine.
#[derive(Debug, Clone, Default)]
pub struct FixedMetrics;

impl FixedMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl TextMeasurer for FixedMetrics {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        fallback_text_width(text, style)
    }
}

pub(crate) fn fallback_text_width(text: &str, style: &TextStyle) -> f32 {
    let font_size = style.font_size.max(0.0);
    if style.is_monospace() {
        return text.chars().filter(|ch| *ch != '\n').count() as f32
            * MONOSPACE_ADVANCE
            * font_size;
    }
    let bold_scale = if style.is_bold() { 1.06 } else { 1.0 };
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_advance)
        .sum::<f32>()
        * font_size
        * bold_scale
}

/// Advance widths in ems for a typical sans-serif face.
fn char_advance(ch: char) -> f32 {
    match ch {
        '\t' => 4.0 * 0.306,
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' => 0.26,
        '(' | ')' | '[' | ']' | '{' | '}' | '\\' | '/' => 0.33,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.95,
        _ if ch.is_ascii() => 0.56,
        _ => 1.0,
    }
}

/// Glyph-advance metrics from fonts discovered through `fontdb`.
///
/// Faces are resolved per family list and weight on first use and kept for
/// the lifetime of the measurer. Characters the chosen face has no glyph for
/// fall back to the fixed advance table.
pub struct SystemFontMetrics {
    db: Database,
    faces: RefCell<HashMap<FaceKey, Option<FontFace>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    weight: u16,
}

impl SystemFontMetrics {
    pub fn load_system() -> Result<Self, LayoutError> {
        let mut db = Database::new();
        db.load_system_fonts();
        if db.is_empty() {
            return Err(LayoutError::MeasurementUnavailable(
                "no system fonts found".to_string(),
            ));
        }
        Ok(Self::with_database(db))
    }

    /// Measures with a single font file; every family resolves to it.
    pub fn from_font_file(path: &Path) -> Result<Self, LayoutError> {
        let data = std::fs::read(path).map_err(|err| {
            LayoutError::MeasurementUnavailable(format!("{}: {err}", path.display()))
        })?;
        Self::from_font_data(data)
    }

    pub fn from_font_data(data: Vec<u8>) -> Result<Self, LayoutError> {
        if Face::parse(&data, 0).is_err() {
            return Err(LayoutError::MeasurementUnavailable(
                "font data could not be parsed".to_string(),
            ));
        }
        let mut db = Database::new();
        db.load_font_data(data);
        let family = db
            .faces()
            .next()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone());
        if let Some(family) = family {
            db.set_sans_serif_family(family.clone());
            db.set_serif_family(family.clone());
            db.set_monospace_family(family);
        }
        Ok(Self::with_database(db))
    }

    fn with_database(db: Database) -> Self {
        Self {
            db,
            faces: RefCell::new(HashMap::new()),
        }
    }

    fn with_face<R>(&self, style: &TextStyle, f: impl FnOnce(&FontFace) -> R) -> Option<R> {
        let key = FaceKey {
            family: normalize_family_key(&style.font_family),
            weight: style.weight(),
        };
        let mut faces = self.faces.borrow_mut();
        let face = faces
            .entry(key)
            .or_insert_with_key(|key| load_face(&self.db, &key.family, key.weight));
        face.as_ref().map(f)
    }
}

impl TextMeasurer for SystemFontMetrics {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        if text.is_empty() || style.font_size <= 0.0 {
            return 0.0;
        }
        let normalized = text.replace('\t', "    ");
        self.with_face(style, |face| face.measure_width(&normalized, style))
            .unwrap_or_else(|| fallback_text_width(&normalized, style))
    }

    fn line_height(&self, style: &TextStyle) -> f32 {
        self.with_face(style, |face| face.line_height(style.font_size))
            .unwrap_or(style.font_size * 1.2)
    }
}

fn load_face(db: &Database, font_family: &str, weight: u16) -> Option<FontFace> {
    let mut names: Vec<String> = Vec::new();
    let mut generics: Vec<Option<Family<'static>>> = Vec::new();
    for part in font_family.split(',') {
        let raw = part.trim().trim_matches('"').trim_matches('\'');
        if raw.is_empty() {
            continue;
        }
        let generic = match raw.to_ascii_lowercase().as_str() {
            "serif" => Some(Family::Serif),
            "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                Some(Family::SansSerif)
            }
            "monospace" | "ui-monospace" => Some(Family::Monospace),
            "cursive" => Some(Family::Cursive),
            "fantasy" => Some(Family::Fantasy),
            _ => {
                names.push(raw.to_string());
                None
            }
        };
        generics.push(generic);
    }

    let mut named = names.iter();
    let mut families: Vec<Family<'_>> = generics
        .into_iter()
        .filter_map(|generic| match generic {
            Some(family) => Some(family),
            None => named.next().map(|name| Family::Name(name.as_str())),
        })
        .collect();
    if families.is_empty() {
        families.push(Family::SansSerif);
    }

    let query = Query {
        families: &families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
        .flatten()
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = f32::from(face.units_per_em().max(1));
        let ascender = f32::from(face.ascender());
        let descender = f32::from(face.descender());
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
        })
    }

    fn line_height(&self, font_size: f32) -> f32 {
        (self.ascender - self.descender) / self.units_per_em * font_size
    }

    fn measure_width(&self, text: &str, style: &TextStyle) -> f32 {
        let scale = style.font_size / self.units_per_em;
        let fallback = style.font_size * FALLBACK_ADVANCE;

        if text.is_ascii() {
            return text
                .bytes()
                .filter(|byte| *byte != b'\n')
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => f32::from(advance) * scale,
                })
                .sum::<f32>()
                .max(0.0);
        }

        let Ok(face) = Face::parse(&self.data, self.index) else {
            return fallback_text_width(text, style);
        };
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map_or(fallback, |advance| f32::from(advance) * scale)
            })
            .sum::<f32>()
            .max(0.0)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
