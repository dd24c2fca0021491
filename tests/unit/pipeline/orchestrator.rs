use super::*;
use crate::foundation::error::ReelError;

fn offline_config(root: &Path) -> PipelineConfig {
    let mut cfg = PipelineConfig {
        work_root: Some(root.to_path_buf()),
        ..PipelineConfig::default()
    };
    cfg.card.font = crate::raster::text::FontSource::None;
    cfg
}

#[test]
fn publish_moves_the_staged_file() {
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("stage/output.mp4");
    std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
    std::fs::write(&staged, b"mp4").unwrap();

    let out = dir.path().join("final/nested/reel.mp4");
    publish(&staged, &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"mp4");
    assert!(!staged.exists());
}

#[test]
fn copy_into_place_leaves_only_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("output.mp4");
    std::fs::write(&staged, b"encoded").unwrap();
    let out_dir = dir.path().join("final");
    std::fs::create_dir_all(&out_dir).unwrap();

    let out = out_dir.join("reel.mp4");
    copy_into_place(&staged, &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"encoded");
    assert!(staged.exists());
    assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
}

#[test]
fn failed_copy_into_place_removes_its_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("output.mp4");
    std::fs::write(&staged, b"encoded").unwrap();
    let out_dir = dir.path().join("final");
    // A directory sits where the output should go, so the final rename fails.
    let out = out_dir.join("reel.mp4");
    std::fs::create_dir_all(out.join("occupied")).unwrap();

    assert!(copy_into_place(&staged, &out).is_err());
    let names: Vec<_> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("reel.mp4")]);
    assert!(out.is_dir());
}

#[test]
fn unreadable_encode_fails_finalize_without_publishing() {
    if require_ffmpeg_tools().is_err() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("output.mp4");
    std::fs::write(&staged, b"not an mp4 at all").unwrap();

    let out = dir.path().join("out/reel.mp4");
    let err = finalize(&staged, &out).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Encode);
    assert!(!out.exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn cancelled_run_stops_before_acquisition_and_cleans_up() {
    if require_ffmpeg_tools().is_err() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let token = CancelToken::new();
    let mut pipeline = Pipeline::new(offline_config(root.path()))
        .unwrap()
        .with_cancel_token(token.clone());
    token.cancel();

    let out = root.path().join("out.mp4");
    let err = pipeline
        .run_local(Path::new("missing.mp4"), TweetMetadata::default(), &out)
        .unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));
    assert!(!out.exists());
    // Only the work root itself remains; the run workspace was removed.
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn missing_local_video_fails_in_acquire_stage() {
    if require_ffmpeg_tools().is_err() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let mut pipeline = Pipeline::new(offline_config(root.path())).unwrap();
    let out = root.path().join("out.mp4");
    let err = pipeline
        .run_local(
            &root.path().join("nope.mp4"),
            TweetMetadata::default(),
            &out,
        )
        .unwrap_err();
    assert_eq!(err.stage(), Some("acquire"));
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Acquisition);
    assert!(!out.exists());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let cfg = PipelineConfig {
        chunk_size: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(Pipeline::new(cfg), Err(ReelError::Validation(_))));
}

#[test]
fn acquired_metadata_cannot_pull_local_avatars() {
    let root = tempfile::tempdir().unwrap();
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = calls.clone();
    let pipeline = Pipeline::new(offline_config(root.path()))
        .unwrap()
        .with_avatar_fetcher(move |_: &str| -> ReelResult<Vec<u8>> {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(b"png".to_vec())
        });

    let local = TweetMetadata::new("Ada", "ada", Some("/home/ada/secret.png".into()), "");
    let (bytes, err) = pipeline.fetch_avatar(&local, AvatarRefs::RemoteOnly);
    assert!(bytes.is_none());
    assert!(matches!(err, Some(ReelError::AvatarUnavailable(_))));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

    let (bytes, err) = pipeline.fetch_avatar(&local, AvatarRefs::LocalAllowed);
    assert_eq!(bytes.as_deref(), Some(&b"png"[..]));
    assert!(err.is_none());

    let remote = TweetMetadata::new("Ada", "ada", Some("https://pbs.example/a.png".into()), "");
    let (bytes, _) = pipeline.fetch_avatar(&remote, AvatarRefs::RemoteOnly);
    assert!(bytes.is_some());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
