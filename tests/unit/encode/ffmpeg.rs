use super::*;
use crate::encode::sink::AudioInputConfig;

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn cfg(audio: Option<AudioInputConfig>) -> SinkConfig {
    SinkConfig {
        width: 1080,
        height: 1920,
        fps: Fps::new(30000, 1001).unwrap(),
        audio,
    }
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, Rgba8::rgba(10, 20, 30, 255)).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, Rgba8::rgba(10, 20, 30, 255)).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg(&mut dst, &[0u8; 4], Rgba8::BLACK).is_err());
}

#[test]
fn command_copies_audio_from_second_input() {
    let opts = FfmpegSinkOpts::new("/tmp/out.mp4");
    let audio = AudioInputConfig {
        path: PathBuf::from("/tmp/source.webm"),
        mode: AudioMode::Copy,
    };
    let args = args_of(&build_command(&opts, &cfg(Some(audio))));
    let joined = args.join(" ");
    assert!(joined.contains("-s 1080x1920 -r 30000/1001 -i pipe:0"));
    assert!(joined.contains("-i /tmp/source.webm -map 0:v:0 -map 1:a:0?"));
    assert!(joined.contains("-c:a copy"));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p -movflags +faststart"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    assert!(!args.iter().any(|a| a == "-an"));
}

#[test]
fn command_reencodes_audio_in_aac_mode() {
    let opts = FfmpegSinkOpts::new("out.mp4");
    let audio = AudioInputConfig {
        path: PathBuf::from("in.mp4"),
        mode: AudioMode::Aac,
    };
    let joined = args_of(&build_command(&opts, &cfg(Some(audio)))).join(" ");
    assert!(joined.contains("-c:a aac"));
}

#[test]
fn command_without_audio_disables_it() {
    let opts = FfmpegSinkOpts {
        overwrite: false,
        ..FfmpegSinkOpts::new("out.mp4")
    };
    let args = args_of(&build_command(&opts, &cfg(None)));
    assert_eq!(args.first().map(String::as_str), Some("-n"));
    assert!(args.iter().any(|a| a == "-an"));
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("x.mp4")));
    let err = sink
        .begin(SinkConfig {
            width: 1081,
            ..cfg(None)
        })
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = RasterImage::new(2, 2).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}

#[test]
fn ensure_parent_dir_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a/b/out.mp4");
    ensure_parent_dir(&target).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}
