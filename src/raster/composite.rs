use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;
use crate::raster::buffer::RasterImage;

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Source-over of two equally sized premultiplied RGBA8 buffers, into `dst`.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::invalid_image(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Source-over `source` onto `destination` with its top-left corner at `(x, y)`.
///
/// Offsets may be negative or push `source` past the edges; the overlap is clipped.
pub fn paste(destination: &mut RasterImage, source: &RasterImage, x: i64, y: i64) {
    let dw = i64::from(destination.width());
    let dh = i64::from(destination.height());
    let sw = i64::from(source.width());
    let sh = i64::from(source.height());

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let span = ((x1 - x0) * 4) as usize;
    let src = source.as_bytes();
    let dst_stride = dw as usize * 4;
    let src_stride = sw as usize * 4;
    let dst = destination.as_bytes_mut();

    for dy in y0..y1 {
        let sy = dy - y;
        let d_off = dy as usize * dst_stride + x0 as usize * 4;
        let s_off = sy as usize * src_stride + (x0 - x) as usize * 4;
        let drow = &mut dst[d_off..d_off + span];
        let srow = &src[s_off..s_off + span];
        for (d, s) in drow.chunks_exact_mut(4).zip(srow.chunks_exact(4)) {
            if s[3] == 0 {
                continue;
            }
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/composite.rs"]
mod tests;
