use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{mul_div255_u8, premul_channel, unpremul_channel};

/// Owned 2D pixel buffer in row-major premultiplied RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RasterImage {
    /// Fully transparent image.
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Image where every pixel is `premul_rgba`.
    pub fn filled(width: u32, height: u32, premul_rgba: [u8; 4]) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::invalid_image(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul_rgba);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::invalid_image(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(ReelError::invalid_image(format!(
                "pixel buffer has {} bytes, expected {} for {width}x{height}",
                data.len(),
                width as usize * height as usize * 4
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode PNG/JPEG/WebP/... bytes into a premultiplied image.
    pub fn decode(bytes: &[u8]) -> ReelResult<Self> {
        if bytes.is_empty() {
            return Err(ReelError::invalid_image("empty image byte stream"));
        }
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| ReelError::invalid_image(format!("decode image from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[off..off + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha RGBA8 copy, as expected by image encoders.
    pub fn to_straight_rgba(&self) -> image::RgbaImage {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 255 {
                continue;
            }
            px[0] = unpremul_channel(px[0], a);
            px[1] = unpremul_channel(px[1], a);
            px[2] = unpremul_channel(px[2], a);
        }
        // Length is validated at construction.
        image::RgbaImage::from_raw(self.width, self.height, out)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> ReelResult<Vec<u8>> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(self.to_straight_rgba())
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }

    /// Write the image as a PNG file.
    pub fn save_png(&self, path: &Path) -> ReelResult<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Single-channel coverage buffer gating an image of the same size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        if data.len() != width as usize * height as usize {
            return Err(ReelError::invalid_image("mask byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn value(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }
}

/// Multiply every channel of `image` by the mask coverage.
///
/// Coverage 255 keeps the pixel untouched, coverage 0 makes it fully transparent.
pub fn apply_mask(image: &mut RasterImage, mask: &Mask) -> ReelResult<()> {
    if image.width != mask.width || image.height != mask.height {
        return Err(ReelError::invalid_image(format!(
            "mask {}x{} does not match image {}x{}",
            mask.width, mask.height, image.width, image.height
        )));
    }
    for (px, &m) in image.data.chunks_exact_mut(4).zip(mask.data.iter()) {
        if m == 255 {
            continue;
        }
        let m = u16::from(m);
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), m);
        }
    }
    Ok(())
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = premul_channel(px[0], a);
        px[1] = premul_channel(px[1], a);
        px[2] = premul_channel(px[2], a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
