use super::*;

#[test]
fn info_json_maps_uploader_fields() {
    let json = br#"{"uploader":"Ada Lovelace","uploader_id":"ada","thumbnail":"https://pbs.example/ada.jpg","description":"Hello world","ext":"mp4"}"#;
    let meta = parse_info_json(json).unwrap();
    assert_eq!(meta.display_name, "Ada Lovelace");
    assert_eq!(meta.username, "ada");
    assert_eq!(
        meta.avatar_ref.as_deref(),
        Some("https://pbs.example/ada.jpg")
    );
    assert_eq!(meta.caption, "Hello world");
}

#[test]
fn missing_or_null_fields_use_fallbacks() {
    let meta = parse_info_json(b"{\"uploader\": null}\n").unwrap();
    assert_eq!(meta.display_name, "User");
    assert_eq!(meta.username, "user");
    assert_eq!(meta.avatar_ref, None);
    assert_eq!(meta.caption, "");
}

#[test]
fn last_json_line_wins_and_garbage_fails() {
    let two = b"[debug] noise is on stderr normally\n{\"uploader\":\"B\"}\n\n";
    assert!(parse_info_json(two).is_ok());
    assert!(matches!(
        parse_info_json(b"   \n"),
        Err(ReelError::Acquisition(_))
    ));
    assert!(matches!(
        parse_info_json(b"not json"),
        Err(ReelError::Acquisition(_))
    ));
}

#[test]
fn finished_download_is_found_and_partials_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("source.f137.mp4.part"), b"x").unwrap();
    std::fs::write(dir.path().join("card.png"), b"x").unwrap();
    assert!(find_download(dir.path()).is_err());

    std::fs::write(dir.path().join("source.mp4"), b"x").unwrap();
    assert_eq!(
        find_download(dir.path()).unwrap(),
        dir.path().join("source.mp4")
    );
}

#[test]
fn local_source_requires_an_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalSource {
        metadata: TweetMetadata::new("Ada", "ada", None, "hi"),
    };
    assert!(matches!(
        provider.fetch("/definitely/not/here.mp4", dir.path()),
        Err(ReelError::Acquisition(_))
    ));

    let video = dir.path().join("clip.mp4");
    std::fs::write(&video, b"fake").unwrap();
    let got = provider
        .fetch(video.to_str().unwrap(), dir.path())
        .unwrap();
    assert_eq!(got.video_path, video);
    assert_eq!(got.metadata.username, "ada");
}

#[test]
fn missing_ytdlp_binary_is_an_acquisition_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = YtDlpProvider {
        program: PathBuf::from("yt-dlp-does-not-exist-here"),
        ..YtDlpProvider::default()
    };
    assert!(matches!(
        provider.fetch("https://example.invalid/status/1", dir.path()),
        Err(ReelError::Acquisition(_))
    ));
}
