//! Placement of a logo or text block inside the configured logo area.

use crate::core::text::{split_lines, TextMeasure};
use crate::domain::model::{Placement, Rectangle, TextPlacement};
use crate::utils::error::{LogoError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Smallest font size text is rendered at, even if it then overflows.
pub const DEFAULT_MIN_FONT_SIZE: u32 = 16;

/// Computes the overlay size and the offset that centers it on `rect`.
///
/// With `scale` set, an overlay that is larger than the area in any dimension,
/// or smaller in both, is scaled uniformly by the smaller of the two ratios.
pub fn fit_dimensions(width: u32, height: u32, rect: &Rectangle, scale: bool) -> Result<Placement> {
    if width == 0 || height == 0 {
        return Err(LogoError::InvalidDimension {
            what: "overlay".to_string(),
            width,
            height,
        });
    }
    if rect.width() == 0 || rect.height() == 0 {
        return Err(LogoError::InvalidDimension {
            what: "logo area".to_string(),
            width: rect.width(),
            height: rect.height(),
        });
    }

    let ratio_w = rect.width() as f64 / width as f64;
    let ratio_h = rect.height() as f64 / height as f64;
    let shrink_needed = ratio_w < 1.0 || ratio_h < 1.0;
    let both_smaller = ratio_w > 1.0 && ratio_h > 1.0;

    let (new_width, new_height, scaled) = if scale && (shrink_needed || both_smaller) {
        // the binding side touches the area exactly; only the other side is rounded
        if ratio_w <= ratio_h {
            let h = ((height as f64 * ratio_w) as u32).clamp(1, rect.height());
            (rect.width(), h, true)
        } else {
            let w = ((width as f64 * ratio_h) as u32).clamp(1, rect.width());
            (w, rect.height(), true)
        }
    } else {
        (width, height, false)
    };

    Ok(Placement {
        width: new_width,
        height: new_height,
        offset_x: rect.center_x() - (new_width / 2) as i64,
        offset_y: rect.center_y() - (new_height / 2) as i64,
        scaled,
    })
}

/// Resizes the overlay per [`fit_dimensions`] (nearest neighbour) and returns
/// it together with its placement.
pub fn fit_overlay_image(
    overlay: &DynamicImage,
    rect: &Rectangle,
    scale: bool,
) -> Result<(DynamicImage, Placement)> {
    let placement = fit_dimensions(overlay.width(), overlay.height(), rect, scale)?;
    let resized = if placement.scaled {
        tracing::debug!(
            "resizing logo {}x{} -> {}x{}",
            overlay.width(),
            overlay.height(),
            placement.width,
            placement.height
        );
        overlay.resize_exact(placement.width, placement.height, FilterType::Nearest)
    } else {
        overlay.clone()
    };
    Ok((resized, placement))
}

/// Picks the font size for `text` inside `rect`.
///
/// The width is fixed first by shrinking one point at a time, then the height
/// is fixed the same way at whatever size remains. The two loops are
/// independent, so a block that is both too wide and too tall can end up
/// smaller than strictly needed. Sizes below `min_size` are clamped to it.
pub fn fit_text<M: TextMeasure + ?Sized>(
    text: &str,
    rect: &Rectangle,
    font: &M,
    start_size: u32,
    min_size: u32,
) -> Result<TextPlacement> {
    if text.trim().is_empty() {
        return Err(LogoError::input("text to embed is empty"));
    }

    let lines = split_lines(text);
    let mut size = start_size.max(1);
    let (mut width, mut height) = font.measure(&lines, size);

    if width > rect.width() {
        while width > rect.width() && size > 1 {
            size -= 1;
            (width, height) = font.measure(&lines, size);
        }
        tracing::info!("font size changed to {} to fit in the logo area", size);
    }

    if height > rect.height() {
        while height > rect.height() && size > 1 {
            size -= 1;
            (width, height) = font.measure(&lines, size);
        }
        tracing::info!("font size changed to {} to fit in the logo area", size);
    }

    if size < min_size {
        tracing::info!(
            "calculated font size {} smaller than minimum, change to: {}",
            size,
            min_size
        );
        size = min_size;
        (width, height) = font.measure(&lines, size);
    }

    Ok(TextPlacement {
        lines,
        font_size: size,
        width,
        height,
        offset_x: rect.center_x() - (width / 2) as i64,
        offset_y: rect.center_y() - (height / 2) as i64,
    })
}

/// Blends `overlay` onto `canvas` with its top-left corner at the offset.
/// Parts falling outside the canvas are clipped.
pub fn composite(canvas: &mut RgbaImage, overlay: &RgbaImage, offset_x: i64, offset_y: i64) {
    let x_start = offset_x.max(0);
    let y_start = offset_y.max(0);
    let x_end = (offset_x + overlay.width() as i64).min(canvas.width() as i64);
    let y_end = (offset_y + overlay.height() as i64).min(canvas.height() as i64);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = overlay.get_pixel((tx - offset_x) as u32, (ty - offset_y) as u32);
            let bg = canvas.get_pixel(tx as u32, ty as u32);
            let blended = blend_pixels(*bg, *fg);
            canvas.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Porter-Duff "over".
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }
    if fg_alpha >= 1.0 {
        return foreground;
    }

    let channel = |fg: u8, bg: u8| -> u8 {
        let fg = fg as f32 / 255.0;
        let bg = bg as f32 / 255.0;
        let result = (fg * fg_alpha + bg * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(foreground[0], background[0]),
        channel(foreground[1], background[1]),
        channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
