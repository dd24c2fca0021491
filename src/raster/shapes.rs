use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::buffer::{Mask, RasterImage, apply_mask};
use crate::raster::composite::over_in_place;

const PATH_TOLERANCE: f64 = 0.1;

/// Draw a filled rounded rectangle onto `canvas`.
///
/// The radius is clamped to half the shorter side; geometry outside the canvas is clipped.
pub fn fill_rounded_rect(
    canvas: &mut RasterImage,
    rect: Rect,
    corner_radius: f64,
    color: Rgba8,
) -> ReelResult<()> {
    let rect = rect.abs();
    if rect.width() <= 0.0 || rect.height() <= 0.0 || color.a == 0 {
        return Ok(());
    }
    let radius = corner_radius
        .max(0.0)
        .min(rect.width().min(rect.height()) / 2.0);

    let shape =
        vello_cpu::kurbo::RoundedRect::new(rect.x0, rect.y0, rect.x1, rect.y1, radius)
            .to_path(PATH_TOLERANCE);
    let layer = render_layer(canvas.width(), canvas.height(), |ctx| {
        ctx.set_paint(color.to_cpu_color());
        ctx.fill_path(&shape);
    })?;
    over_in_place(canvas.as_bytes_mut(), layer.data_as_u8_slice())
}

/// Anti-aliased disc coverage inscribed in a `diameter` square.
pub fn circle_mask(diameter: u32) -> ReelResult<Mask> {
    if diameter == 0 {
        return Err(ReelError::invalid_image("circle diameter must be non-zero"));
    }
    let r = f64::from(diameter) / 2.0;
    let circle = vello_cpu::kurbo::Circle::new((r, r), r).to_path(PATH_TOLERANCE);
    let layer = render_layer(diameter, diameter, |ctx| {
        ctx.set_paint(Rgba8::WHITE.to_cpu_color());
        ctx.fill_path(&circle);
    })?;
    let coverage = layer
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| px[3])
        .collect();
    Mask::from_raw(diameter, diameter, coverage)
}

/// Scale-and-crop `source` into a `diameter` square, then cut it to a circle.
///
/// The source aspect ratio is preserved: the centered square of side `min(w, h)` is kept and
/// the overflow cropped. Corners of the result are fully transparent.
pub fn circular_crop(source: &RasterImage, diameter: u32) -> ReelResult<RasterImage> {
    if diameter == 0 {
        return Err(ReelError::invalid_image("circular crop diameter must be non-zero"));
    }
    let mut fitted = fit_square(source, diameter)?;
    let mask = circle_mask(diameter)?;
    apply_mask(&mut fitted, &mask)?;
    Ok(fitted)
}

fn fit_square(source: &RasterImage, side_out: u32) -> ReelResult<RasterImage> {
    let (w, h) = (source.width(), source.height());
    if w == 0 || h == 0 {
        return Err(ReelError::invalid_image("cannot fit a zero-size image"));
    }
    let side = w.min(h);
    let x = (w - side) / 2;
    let y = (h - side) / 2;

    let buf = image::RgbaImage::from_raw(w, h, source.as_bytes().to_vec())
        .ok_or_else(|| ReelError::invalid_image("image byte length mismatch"))?;
    let cropped = image::imageops::crop_imm(&buf, x, y, side, side).to_image();
    let resized = if side == side_out {
        cropped
    } else {
        image::imageops::resize(
            &cropped,
            side_out,
            side_out,
            image::imageops::FilterType::CatmullRom,
        )
    };

    let mut data = resized.into_raw();
    // Cubic overshoot can push a channel above its alpha.
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        px[0] = px[0].min(a);
        px[1] = px[1].min(a);
        px[2] = px[2].min(a);
    }
    RasterImage::from_premul(side_out, side_out, data)
}

/// Rasterize one drawing callback into a transparent pixmap of the given size.
pub(crate) fn render_layer(
    width: u32,
    height: u32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::invalid_image("raster layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::invalid_image("raster layer height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/shapes.rs"]
mod tests;
