use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::buffer::RasterImage;
use crate::raster::composite::over_in_place;
use crate::raster::shapes::render_layer;

/// Where card text gets its font from.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FontSource {
    /// First sans-serif face found among the installed system fonts.
    #[default]
    System,
    /// A `.ttf`/`.otf`/`.ttc` file on disk.
    File { path: PathBuf },
    /// Font bytes already in memory.
    #[serde(skip)]
    Bytes(Arc<Vec<u8>>),
    /// Draw no text at all.
    None,
}

/// Raw font data plus the face index inside it.
#[derive(Clone, Debug)]
pub struct LoadedFont {
    pub bytes: Arc<Vec<u8>>,
    pub index: u32,
}

impl FontSource {
    /// Load font bytes. `Ok(None)` means text rendering is disabled or no system font exists.
    pub fn load(&self) -> ReelResult<Option<LoadedFont>> {
        match self {
            Self::None => Ok(None),
            Self::Bytes(bytes) => Ok(Some(LoadedFont {
                bytes: bytes.clone(),
                index: 0,
            })),
            Self::File { path } => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read font file '{}'", path.display()))?;
                Ok(Some(LoadedFont {
                    bytes: Arc::new(bytes),
                    index: 0,
                }))
            }
            Self::System => {
                let found = find_system_sans();
                if found.is_none() {
                    tracing::warn!("no system font found; card text will not be drawn");
                }
                Ok(found)
            }
        }
    }
}

fn find_system_sans() -> Option<LoadedFont> {
    use usvg::fontdb;

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let candidates = [
        fontdb::Family::SansSerif,
        fontdb::Family::Name("DejaVu Sans"),
        fontdb::Family::Name("Liberation Sans"),
        fontdb::Family::Name("Noto Sans"),
    ];
    let id = candidates
        .iter()
        .find_map(|family| {
            db.query(&fontdb::Query {
                families: std::slice::from_ref(family),
                ..Default::default()
            })
        })
        .or_else(|| {
            db.faces()
                .find(|face| face.style == fontdb::Style::Normal)
                .map(|face| face.id)
        })?;

    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
    tracing::debug!(face_index = index, bytes = bytes.len(), "resolved system font");
    Some(LoadedFont {
        bytes: Arc::new(bytes),
        index,
    })
}

/// RGBA8 brush color carried through Parley layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Shapes single lines of text with Parley and rasterizes them with `vello_cpu`.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextEngine {
    /// Register `font` and shape with the family that owns its face index.
    pub fn new(font: &LoadedFont) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families
            .iter()
            .find(|(_, faces)| faces.iter().any(|f| f.index() == font.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of `text` laid out as one line.
    pub fn measure(&mut self, text: &str, size_px: f32) -> ReelResult<f32> {
        let line = single_line(text);
        if line.is_empty() {
            return Ok(0.0);
        }
        Ok(self
            .layout_line(&line, size_px, TextBrushRgba8::default())?
            .width())
    }

    /// Draw `text` as one visual line whose line box starts at `position`.
    ///
    /// Line breaks inside `text` are flattened to spaces; glyphs past the canvas are clipped.
    pub fn draw_text(
        &mut self,
        canvas: &mut RasterImage,
        position: Point,
        text: &str,
        size_px: f32,
        color: Rgba8,
    ) -> ReelResult<()> {
        let line = single_line(text);
        if line.is_empty() || color.a == 0 {
            return Ok(());
        }
        let layout = self.layout_line(&line, size_px, color.into())?;

        let layer = render_layer(canvas.width(), canvas.height(), |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((position.x, position.y)));
            for visual_line in layout.lines() {
                for item in visual_line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };

                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));

                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    // Glyph ids are only valid for the face Parley shaped with.
                    let font = run.run().font();
                    ctx.glyph_run(font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        })?;
        over_in_place(canvas.as_bytes_mut(), layer.data_as_u8_slice())
    }
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/text.rs"]
mod tests;
