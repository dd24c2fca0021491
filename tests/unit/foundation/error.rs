use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::invalid_image("x")
            .to_string()
            .contains("invalid image:")
    );
    assert!(
        ReelError::acquisition("x")
            .to_string()
            .contains("acquisition failed:")
    );
    assert!(ReelError::encode("x").to_string().contains("encode failed:"));
    assert_eq!(
        ReelError::geometry(0, 720).to_string(),
        "unsupported geometry: 0x720"
    );
}

#[test]
fn stage_tag_keeps_kind_and_innermost_stage() {
    let err = ReelError::encode("ffmpeg died").in_stage("overlay");
    assert_eq!(err.kind(), ErrorKind::Encode);
    assert_eq!(err.stage(), Some("overlay"));
    assert!(err.to_string().starts_with("overlay stage failed:"));

    let retagged = err.in_stage("pipeline");
    assert_eq!(retagged.stage(), Some("overlay"));
}

#[test]
fn cancelled_is_never_stage_wrapped() {
    let err = ReelError::Cancelled.in_stage("reframe");
    assert!(matches!(err, ReelError::Cancelled));
    assert_eq!(err.stage(), None);
}

#[test]
fn only_avatar_failures_are_recoverable() {
    assert!(ReelError::avatar_unavailable("404").is_recoverable());
    assert!(!ReelError::acquisition("404").is_recoverable());
    assert!(!ReelError::geometry(0, 0).is_recoverable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}
