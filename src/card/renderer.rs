use std::path::Path;

use crate::card::metadata::TweetMetadata;
use crate::foundation::core::{Point, Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::buffer::RasterImage;
use crate::raster::composite::paste;
use crate::raster::shapes::{circular_crop, fill_rounded_rect};
use crate::raster::text::{FontSource, TextEngine};

const ELLIPSIS: &str = "...";

/// When the caption gets an ellipsis appended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipsisPolicy {
    /// Append after truncation whether or not anything was cut.
    #[default]
    Always,
    /// Append only when characters were actually dropped.
    WhenTruncated,
}

/// Placement and style of one text element.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextSlot {
    pub x: f64,
    pub y: f64,
    pub size: f32,
    pub color: Rgba8,
}

/// Placement of the circular avatar.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AvatarSlot {
    pub x: i64,
    pub y: i64,
    pub diameter: u32,
    /// Fill of the disc drawn when no avatar could be decoded.
    pub placeholder: Rgba8,
}

/// Card geometry, colors and font.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub width: u32,
    pub height: u32,
    pub corner_radius: f64,
    pub background: Rgba8,
    pub avatar: AvatarSlot,
    pub display_name: TextSlot,
    pub username: TextSlot,
    pub caption: TextSlot,
    pub caption_max_chars: usize,
    pub ellipsis: EllipsisPolicy,
    /// Distance between caption lines as a multiple of the caption size.
    pub caption_line_spacing: f32,
    pub font: FontSource,
}

impl Default for CardConfig {
    fn default() -> Self {
        let muted = Rgba8::rgba(0x88, 0x99, 0xA6, 255);
        Self {
            width: 800,
            height: 350,
            corner_radius: 30.0,
            background: Rgba8::rgba(0, 0, 0, 180),
            avatar: AvatarSlot {
                x: 40,
                y: 40,
                diameter: 100,
                placeholder: muted,
            },
            display_name: TextSlot {
                x: 160.0,
                y: 45.0,
                size: 32.0,
                color: Rgba8::WHITE,
            },
            username: TextSlot {
                x: 160.0,
                y: 85.0,
                size: 24.0,
                color: muted,
            },
            caption: TextSlot {
                x: 40.0,
                y: 160.0,
                size: 28.0,
                color: Rgba8::WHITE,
            },
            caption_max_chars: 140,
            ellipsis: EllipsisPolicy::Always,
            caption_line_spacing: 1.25,
            font: FontSource::System,
        }
    }
}

impl CardConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("card width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(ReelError::validation("card width/height must fit in u16"));
        }
        if self.avatar.diameter == 0 {
            return Err(ReelError::validation("avatar diameter must be non-zero"));
        }
        for (name, slot) in [
            ("display_name", &self.display_name),
            ("username", &self.username),
            ("caption", &self.caption),
        ] {
            if !slot.size.is_finite() || slot.size <= 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} text size must be finite and > 0"
                )));
            }
        }
        if !self.caption_line_spacing.is_finite() || self.caption_line_spacing <= 0.0 {
            return Err(ReelError::validation(
                "caption_line_spacing must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Truncate `caption` to `max_chars` characters and apply the ellipsis policy.
///
/// Counts `char`s, never bytes, so multi-byte text is never split inside a code point.
pub fn truncate_caption(caption: &str, max_chars: usize, policy: EllipsisPolicy) -> String {
    let mut out: String = caption.chars().take(max_chars).collect();
    let truncated = caption.chars().nth(max_chars).is_some();
    if policy == EllipsisPolicy::Always || truncated {
        out.push_str(ELLIPSIS);
    }
    out
}

/// Output of [`CardRenderer::render_card`].
#[derive(Debug)]
pub struct RenderedCard {
    pub image: RasterImage,
    /// Set when the avatar could not be used and the placeholder disc was drawn instead.
    pub avatar_unavailable: Option<ReelError>,
}

impl RenderedCard {
    pub fn used_placeholder(&self) -> bool {
        self.avatar_unavailable.is_some()
    }

    pub fn write_png(&self, path: &Path) -> ReelResult<()> {
        self.image.save_png(path)
    }
}

/// Builds card images. Holds the loaded font; everything else comes from [`CardConfig`].
pub struct CardRenderer {
    config: CardConfig,
    text: Option<TextEngine>,
}

impl CardRenderer {
    pub fn new(config: CardConfig) -> ReelResult<Self> {
        config.validate()?;
        let text = match config.font.load()? {
            Some(font) => Some(TextEngine::new(&font)?),
            None => None,
        };
        if let Some(engine) = &text {
            tracing::debug!(family = engine.family_name(), "card font loaded");
        }
        Ok(Self { config, text })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Whether text elements will actually be drawn.
    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Render the card for `metadata`.
    ///
    /// `avatar_bytes` of `None`, or bytes that fail to decode, produce the placeholder disc and
    /// an `AvatarUnavailable` note on the result; they never fail the render.
    #[tracing::instrument(skip(self, metadata, avatar_bytes), fields(user = %metadata.username))]
    pub fn render_card(
        &mut self,
        metadata: &TweetMetadata,
        avatar_bytes: Option<&[u8]>,
    ) -> ReelResult<RenderedCard> {
        let cfg = &self.config;
        let mut canvas = RasterImage::new(cfg.width, cfg.height)?;

        fill_rounded_rect(
            &mut canvas,
            Rect::new(0.0, 0.0, f64::from(cfg.width), f64::from(cfg.height)),
            cfg.corner_radius,
            cfg.background,
        )?;

        let (avatar, avatar_unavailable) = match decode_avatar(avatar_bytes, cfg.avatar.diameter)
        {
            Ok(img) => (img, None),
            Err(err) => {
                tracing::warn!(error = %err, "using placeholder avatar");
                let placeholder = placeholder_avatar(&cfg.avatar)?;
                (placeholder, Some(err))
            }
        };
        paste(&mut canvas, &avatar, cfg.avatar.x, cfg.avatar.y);

        let caption = truncate_caption(&metadata.caption, cfg.caption_max_chars, cfg.ellipsis);
        let handle = metadata.handle();
        let name_slot = cfg.display_name;
        let user_slot = cfg.username;
        let caption_slot = cfg.caption;
        let line_step = f64::from(caption_slot.size * cfg.caption_line_spacing);

        if let Some(text) = self.text.as_mut() {
            draw_slot(text, &mut canvas, &name_slot, &metadata.display_name)?;
            draw_slot(text, &mut canvas, &user_slot, &handle)?;
            for (i, line) in caption.split('\n').enumerate() {
                let slot = TextSlot {
                    y: caption_slot.y + line_step * i as f64,
                    ..caption_slot
                };
                draw_slot(text, &mut canvas, &slot, line)?;
            }
        } else {
            tracing::debug!("no font configured; skipping card text");
        }

        Ok(RenderedCard {
            image: canvas,
            avatar_unavailable,
        })
    }
}

fn draw_slot(
    text: &mut TextEngine,
    canvas: &mut RasterImage,
    slot: &TextSlot,
    value: &str,
) -> ReelResult<()> {
    text.draw_text(
        canvas,
        Point::new(slot.x, slot.y),
        value,
        slot.size,
        slot.color,
    )
}

fn decode_avatar(bytes: Option<&[u8]>, diameter: u32) -> ReelResult<RasterImage> {
    let bytes = bytes.ok_or_else(|| ReelError::avatar_unavailable("no avatar bytes"))?;
    let decoded = RasterImage::decode(bytes)
        .map_err(|e| ReelError::avatar_unavailable(format!("undecodable avatar: {e}")))?;
    circular_crop(&decoded, diameter)
        .map_err(|e| ReelError::avatar_unavailable(format!("avatar crop failed: {e}")))
}

/// Deterministic stand-in avatar: an opaque disc of the placeholder color.
pub fn placeholder_avatar(slot: &AvatarSlot) -> ReelResult<RasterImage> {
    let fill = Rgba8 {
        a: 255,
        ..slot.placeholder
    };
    let disc = RasterImage::filled(slot.diameter, slot.diameter, fill.to_premul())?;
    circular_crop(&disc, slot.diameter)
}

#[cfg(test)]
#[path = "../../tests/unit/card/renderer.rs"]
mod tests;
