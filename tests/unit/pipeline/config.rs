use super::*;

#[test]
fn defaults_target_vertical_hd_with_copied_audio() {
    let cfg = PipelineConfig::default();
    assert_eq!((cfg.target_width, cfg.target_height), (1080, 1920));
    assert_eq!(cfg.encode.audio, AudioMode::Copy);
    assert_eq!(cfg.encode.video_codec, "libx264");
    assert_eq!(cfg.fetch_timeout_secs, 30);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reel.json");
    std::fs::write(
        &path,
        r##"{"encode": {"audio": "aac"}, "card": {"background": "#00000080"}, "chunk_size": 4}"##,
    )
    .unwrap();

    let cfg = PipelineConfig::from_path(&path).unwrap();
    assert_eq!(cfg.encode.audio, AudioMode::Aac);
    assert_eq!(cfg.encode.video_codec, "libx264");
    assert_eq!(cfg.card.background, Rgba8::rgba(0, 0, 0, 0x80));
    assert_eq!(cfg.card.width, 800);
    assert_eq!(cfg.composite_options().chunk_size, 4);
}

#[test]
fn odd_target_is_rejected() {
    let cfg = PipelineConfig {
        target_width: 1081,
        ..PipelineConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(ReelError::Validation(_))));
}

#[test]
fn unreadable_or_invalid_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PipelineConfig::from_path(&dir.path().join("missing.json")).is_err());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_path(&bad),
        Err(ReelError::Other(_))
    ));

    let zero = dir.path().join("zero.json");
    std::fs::write(&zero, r#"{"chunk_size": 0}"#).unwrap();
    assert!(matches!(
        PipelineConfig::from_path(&zero),
        Err(ReelError::Validation(_))
    ));
}
