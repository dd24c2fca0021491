use std::io::Cursor;

use super::*;

fn textless_config() -> CardConfig {
    CardConfig {
        font: FontSource::None,
        ..CardConfig::default()
    }
}

fn ada() -> TweetMetadata {
    TweetMetadata::new(
        "Ada",
        "ada",
        Some("https://example.invalid/ada.png".to_string()),
        "Hello world",
    )
}

fn avatar_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(64, 48, image::Rgba([200, 40, 90, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn caption_gets_ellipsis_even_when_short() {
    assert_eq!(
        truncate_caption("Hello world", 140, EllipsisPolicy::Always),
        "Hello world..."
    );
    assert_eq!(truncate_caption("", 140, EllipsisPolicy::Always), "...");
}

#[test]
fn caption_truncates_at_140_chars() {
    let long: String = "x".repeat(300);
    let out = truncate_caption(&long, 140, EllipsisPolicy::Always);
    assert_eq!(out, format!("{}...", "x".repeat(140)));

    for len in [0usize, 1, 139, 140, 141, 500] {
        let caption: String = "a".repeat(len);
        let expected: String = caption.chars().take(140).collect::<String>() + "...";
        assert_eq!(
            truncate_caption(&caption, 140, EllipsisPolicy::Always),
            expected
        );
    }
}

#[test]
fn caption_truncation_counts_chars_not_bytes() {
    let caption: String = "é🎬".repeat(100);
    let out = truncate_caption(&caption, 140, EllipsisPolicy::Always);
    assert_eq!(out.chars().count(), 143);
    assert!(out.ends_with("..."));
}

#[test]
fn when_truncated_policy_only_marks_real_cuts() {
    assert_eq!(
        truncate_caption("short", 140, EllipsisPolicy::WhenTruncated),
        "short"
    );
    assert_eq!(
        truncate_caption(&"b".repeat(140), 140, EllipsisPolicy::WhenTruncated),
        "b".repeat(140)
    );
    assert_eq!(
        truncate_caption(&"b".repeat(141), 140, EllipsisPolicy::WhenTruncated),
        format!("{}...", "b".repeat(140))
    );
}

#[test]
fn card_has_configured_size_and_translucent_background() {
    let mut renderer = CardRenderer::new(textless_config()).unwrap();
    let card = renderer.render_card(&ada(), Some(&avatar_png())).unwrap();
    assert_eq!((card.image.width(), card.image.height()), (800, 350));
    assert!(!card.used_placeholder());

    // Rounded corners stay transparent; the body is semi-transparent black.
    assert_eq!(card.image.pixel(0, 0).unwrap()[3], 0);
    let body = card.image.pixel(400, 300).unwrap();
    assert!((179..=181).contains(&body[3]), "alpha {}", body[3]);
}

#[test]
fn avatar_is_pasted_at_offset() {
    let mut renderer = CardRenderer::new(textless_config()).unwrap();
    let card = renderer.render_card(&ada(), Some(&avatar_png())).unwrap();
    // Center of the 100px avatar at (40, 40).
    assert_eq!(card.image.pixel(90, 90).unwrap(), [200, 40, 90, 255]);
}

#[test]
fn undecodable_avatar_falls_back_to_opaque_placeholder() {
    let mut renderer = CardRenderer::new(textless_config()).unwrap();
    let card = renderer
        .render_card(&ada(), Some(b"<html>404</html>"))
        .unwrap();
    assert!(card.used_placeholder());
    assert!(matches!(
        card.avatar_unavailable,
        Some(ReelError::AvatarUnavailable(_))
    ));
    let center = card.image.pixel(90, 90).unwrap();
    assert_eq!(center, [0x88, 0x99, 0xA6, 255]);
}

#[test]
fn missing_avatar_bytes_fall_back_too() {
    let mut renderer = CardRenderer::new(textless_config()).unwrap();
    let card = renderer.render_card(&ada(), None).unwrap();
    assert!(card.used_placeholder());
    assert_eq!(card.image.pixel(90, 90).unwrap()[3], 255);
}

#[test]
fn rendering_is_idempotent() {
    let mut a = CardRenderer::new(CardConfig::default()).unwrap();
    let mut b = CardRenderer::new(CardConfig::default()).unwrap();
    let first = a.render_card(&ada(), Some(&avatar_png())).unwrap();
    let second = a.render_card(&ada(), Some(&avatar_png())).unwrap();
    let third = b.render_card(&ada(), Some(&avatar_png())).unwrap();
    assert_eq!(first.image, second.image);
    assert_eq!(first.image, third.image);
}

#[test]
fn text_is_drawn_when_a_font_is_available() {
    let mut with_text = CardRenderer::new(CardConfig::default()).unwrap();
    if !with_text.has_font() {
        return;
    }
    let mut without_text = CardRenderer::new(textless_config()).unwrap();
    let a = with_text.render_card(&ada(), None).unwrap();
    let b = without_text.render_card(&ada(), None).unwrap();
    assert_ne!(a.image, b.image);
}

#[test]
fn invalid_config_is_rejected() {
    let bad = CardConfig {
        width: 0,
        ..textless_config()
    };
    assert!(matches!(
        CardRenderer::new(bad),
        Err(ReelError::Validation(_))
    ));

    let bad_size = CardConfig {
        caption: TextSlot {
            size: 0.0,
            ..CardConfig::default().caption
        },
        ..textless_config()
    };
    assert!(CardRenderer::new(bad_size).is_err());
}

#[test]
fn config_round_trips_through_json_with_defaults() {
    let cfg: CardConfig = serde_json::from_str(r#"{"caption_max_chars": 80}"#).unwrap();
    assert_eq!(cfg.caption_max_chars, 80);
    assert_eq!(cfg.width, 800);
    assert_eq!(cfg.username.color, Rgba8::rgba(0x88, 0x99, 0xA6, 255));
}
