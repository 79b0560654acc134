//! Text measurement and rasterisation for the `text` command.
//!
//! Fonts are TrueType files loaded with `ab_glyph`. Measurement is behind the
//! [`TextMeasure`] trait so the fitting loop does not depend on a font file.

use crate::utils::error::{LogoError, Result};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Vertical gap between lines, in pixels.
pub const LINE_SPACING: u32 = 4;

/// Fallback fonts tried when `font_file` is empty or missing.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::new(0, 0, 0)),
    ("white", Color::new(255, 255, 255)),
    ("red", Color::new(255, 0, 0)),
    ("green", Color::new(0, 128, 0)),
    ("lime", Color::new(0, 255, 0)),
    ("blue", Color::new(0, 0, 255)),
    ("yellow", Color::new(255, 255, 0)),
    ("orange", Color::new(255, 165, 0)),
    ("purple", Color::new(128, 0, 128)),
    ("cyan", Color::new(0, 255, 255)),
    ("magenta", Color::new(255, 0, 255)),
    ("gray", Color::new(128, 128, 128)),
    ("grey", Color::new(128, 128, 128)),
    ("silver", Color::new(192, 192, 192)),
    ("navy", Color::new(0, 0, 128)),
    ("teal", Color::new(0, 128, 128)),
    ("maroon", Color::new(128, 0, 0)),
    ("gold", Color::new(255, 215, 0)),
];

/// Parses `#RGB`, `#RRGGBB` or a color name such as `yellow`.
pub fn parse_color(value: &str) -> Result<Color> {
    let value = value.trim();
    let invalid = |reason: String| LogoError::InvalidConfigValueError {
        field: "font_color".to_string(),
        value: value.to_string(),
        reason,
    };

    let Some(hex) = value.strip_prefix('#') else {
        let lower = value.to_lowercase();
        return NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(|| invalid("Unknown color name; use #RRGGBB instead".to_string()));
    };

    if !hex.is_ascii() {
        return Err(invalid("Color must be #RGB or #RRGGBB format".to_string()));
    }

    let digit = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|_| invalid(format!("Invalid hex digits '{}'", s)))
    };

    match hex.len() {
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        n => Err(invalid(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            n
        ))),
    }
}

/// Splits a message on the `##` line-break marker.
pub fn split_lines(message: &str) -> Vec<String> {
    message.split("##").map(str::to_string).collect()
}

pub trait TextMeasure {
    /// Width and height of the rendered block at `size` pixels.
    fn measure(&self, lines: &[String], size: u32) -> (u32, u32);
}

pub struct TrueTypeFont {
    font: FontVec,
    path: PathBuf,
}

impl TrueTypeFont {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            LogoError::config(format!("font file '{}' is invalid: {}", path.display(), e))
        })?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// 優先使用設定的字型，找不到時改用系統字型
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        match configured {
            Some(path) if path.is_file() => return Self::from_file(path),
            Some(path) => tracing::warn!(
                "font file '{}' cannot be found, looking for a system font",
                path.display()
            ),
            None => tracing::info!("font file not configured, looking for a system font"),
        }

        let fallback = SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .ok_or_else(|| {
                LogoError::config("no usable font found; set 'font_file' in the settings file")
            })?;
        tracing::info!("using font {}", fallback.display());
        Self::from_file(fallback)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line_width(&self, line: &str, size: u32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        let mut width = 0.0f32;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for c in line.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    fn line_height(&self, size: u32) -> u32 {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32
    }

    /// Draws the lines, left-aligned, into a transparent overlay.
    pub fn render(&self, lines: &[String], size: u32, color: Color) -> RgbaImage {
        let (width, height) = self.measure(lines, size);
        let mut canvas = RgbaImage::new(width.max(1), height.max(1));

        let scale = PxScale::from(size as f32);
        let scaled = self.font.as_scaled(scale);
        let line_height = self.line_height(size);

        for (index, line) in lines.iter().enumerate() {
            let baseline = (index as u32 * (line_height + LINE_SPACING)) as f32 + scaled.ascent();
            let mut cursor_x = 0.0f32;
            let mut prev: Option<ab_glyph::GlyphId> = None;

            for c in line.chars() {
                let id = scaled.glyph_id(c);
                if let Some(prev) = prev {
                    cursor_x += scaled.kern(prev, id);
                }

                let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline));
                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|px, py, coverage| {
                        let x = px as i64 + bounds.min.x as i64;
                        let y = py as i64 + bounds.min.y as i64;
                        if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64
                        {
                            return;
                        }
                        let alpha = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                        let existing = canvas.get_pixel(x as u32, y as u32)[3];
                        if alpha > existing {
                            canvas.put_pixel(
                                x as u32,
                                y as u32,
                                Rgba([color.r, color.g, color.b, alpha]),
                            );
                        }
                    });
                }

                cursor_x += scaled.h_advance(id);
                prev = Some(id);
            }
        }

        canvas
    }
}

impl TextMeasure for TrueTypeFont {
    fn measure(&self, lines: &[String], size: u32) -> (u32, u32) {
        let width = lines
            .iter()
            .map(|line| self.line_width(line, size).ceil() as u32)
            .max()
            .unwrap_or(0);
        let count = lines.len() as u32;
        let height = count * self.line_height(size) + count.saturating_sub(1) * LINE_SPACING;
        (width, height)
    }
}
