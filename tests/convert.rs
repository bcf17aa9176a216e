use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
    thread,
    time::Duration,
};

use intralism_mania::{
    ConvertError, Converter, ConverterConfig, IntralismBeatmap,
    audio::{MediaTranscoder, ProbeError},
    convert::ConversionWarning,
    error::{AssetError, DecodeError},
    intralism::intralism_to_mania::IntralismToManiaWarning,
    mania::parse::parse_chart,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Copies audio as is and renames it to the target extension.
struct CopyTranscoder;

impl MediaTranscoder for CopyTranscoder {
    fn target_extension(&self) -> &str {
        "ogg"
    }

    fn transcode(&self, from: &Path, to: &Path) -> Result<(), AssetError> {
        fs::copy(from, to)
            .map(drop)
            .map_err(|source| AssetError::Copy {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            })
    }
}

/// [`CopyTranscoder`] that takes its time.
struct SlowTranscoder;

impl MediaTranscoder for SlowTranscoder {
    fn target_extension(&self) -> &str {
        "ogg"
    }

    fn transcode(&self, from: &Path, to: &Path) -> Result<(), AssetError> {
        thread::sleep(Duration::from_millis(200));
        CopyTranscoder.transcode(from, to)
    }
}

/// Fails like an external transcoder exiting with status 1.
struct FailingTranscoder;

impl MediaTranscoder for FailingTranscoder {
    fn target_extension(&self) -> &str {
        "ogg"
    }

    fn transcode(&self, from: &Path, _: &Path) -> Result<(), AssetError> {
        let status = Command::new("sh")
            .args(["-c", "exit 1"])
            .status()
            .map_err(|source| AssetError::Spawn {
                program: PathBuf::from("sh"),
                source,
            })?;
        Err(AssetError::TranscodeFailed {
            from: from.to_path_buf(),
            status,
            stderr: "Invalid data found when processing input".into(),
        })
    }
}

fn probe(_: &Path) -> Result<f64, ProbeError> {
    Ok(12.5)
}

fn chart_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("SB")).unwrap();
    fs::write(root.join("sample.osu"), include_str!("files/sample.osu")).unwrap();
    fs::write(root.join("audio.mp3"), b"mp3 bytes").unwrap();
    fs::write(root.join("bg.jpg"), b"background").unwrap();
    fs::write(root.join("SB/city.png"), b"city").unwrap();
    fs::write(root.join("flash.png"), b"flash").unwrap();
    dir
}

fn level_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("config.txt"), include_str!("files/config.txt")).unwrap();
    fs::write(root.join("track.ogg"), b"vorbis bytes").unwrap();
    for image in ["bg.jpg", "city.png", "flash.png"] {
        fs::write(root.join(image), image).unwrap();
    }
    dir
}

#[test]
fn chart_directory_becomes_level() {
    let source = chart_dir();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);

    let report = converter
        .mania_to_intralism(&source.path().join("sample.osu"), out.path(), Some(31.5))
        .expect("must be converted");

    assert_eq!(report.output, out.path().join("config.txt"));
    assert_eq!(report.audio, out.path().join("music.ogg"));
    assert_eq!(
        report.images,
        vec![
            out.path().join("bg.jpg"),
            out.path().join("city.png"),
            out.path().join("flash.png"),
        ]
    );
    assert_eq!(report.warnings.len(), 3);
    assert_eq!(fs::read(&report.audio).unwrap(), b"mp3 bytes");
    assert_eq!(fs::read(out.path().join("city.png")).unwrap(), b"city");

    let level = IntralismBeatmap::read_json(&report.output).expect("must be parsed");
    assert_eq!(level.speed, 31.5);
    assert_eq!(level.music_file, "music.ogg");
    assert_eq!(level.music_time, 12.5);
    assert_eq!(level.icon_file, "bg.jpg");
}

#[test]
fn zero_speed_keeps_default() {
    let source = chart_dir();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);
    let report = converter
        .mania_to_intralism(&source.path().join("sample.osu"), out.path(), Some(0.0))
        .expect("must be converted");
    let level = IntralismBeatmap::read_json(&report.output).expect("must be parsed");
    assert_eq!(level.speed, IntralismBeatmap::default().speed);
}

#[test]
fn level_directory_becomes_chart() {
    let source = level_dir();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);

    let report = converter
        .intralism_to_mania(&source.path().join("config.txt"), out.path(), Some(-20))
        .expect("must be converted");

    assert_eq!(
        report.output,
        out.path().join("Lumen  - Lumen - Night Drive [Intralism].osu")
    );
    assert_eq!(report.audio, out.path().join("track.ogg"));
    assert_eq!(report.images.len(), 3);
    assert_eq!(
        report.warnings,
        vec![ConversionWarning::IntralismToMania(
            IntralismToManiaWarning::UnsupportedEvent {
                kind: "SetPlayerDistance".into()
            }
        )]
    );

    let text = fs::read_to_string(&report.output).unwrap();
    let chart = parse_chart(&text).expect("must be parsed").chart;
    assert_eq!(chart.general.audio_filename, "track.ogg");
    let starts: Vec<_> = chart.hit_objects.iter().map(|o| o.start_time).collect();
    assert_eq!(starts, vec![480, 480, 730, 981, 981, 981]);
    assert_eq!(chart.events.storyboard.background.len(), 2);
}

#[test]
fn missing_source_is_decode_error() {
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);
    assert!(matches!(
        converter.intralism_to_mania(&out.path().join("config.txt"), out.path(), None),
        Err(ConvertError::Decode(DecodeError::Io { .. }))
    ));
    assert!(matches!(
        converter.mania_to_intralism(&out.path().join("missing.osu"), out.path(), None),
        Err(ConvertError::Decode(DecodeError::Io { .. }))
    ));
}

#[test]
fn missing_image_leaves_partial_output() {
    let source = level_dir();
    fs::remove_file(source.path().join("flash.png")).unwrap();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);

    let result = converter.intralism_to_mania(&source.path().join("config.txt"), out.path(), None);
    assert!(matches!(
        result,
        Err(ConvertError::Asset(AssetError::Copy { .. }))
    ));
    assert!(out.path().join("bg.jpg").exists());
    assert!(out.path().join("city.png").exists());
}

#[test]
fn level_converted_in_place_keeps_sources() {
    let level = level_dir();
    let root = level.path();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);

    let report = converter
        .intralism_to_mania(&root.join("config.txt"), root, None)
        .expect("must be converted");

    assert_eq!(report.audio, root.join("track.ogg"));
    assert_eq!(fs::read(root.join("track.ogg")).unwrap(), b"vorbis bytes");
    for image in ["bg.jpg", "city.png", "flash.png"] {
        assert_eq!(fs::read(root.join(image)).unwrap(), image.as_bytes());
    }
    assert!(report.output.exists());
}

#[test]
fn chart_converted_in_place_keeps_sources() {
    let chart = chart_dir();
    let root = chart.path();
    let converter = Converter::with_collaborators(probe, CopyTranscoder);

    converter
        .mania_to_intralism(&root.join("sample.osu"), root, None)
        .expect("must be converted");

    assert_eq!(fs::read(root.join("bg.jpg")).unwrap(), b"background");
    assert_eq!(fs::read(root.join("flash.png")).unwrap(), b"flash");
    assert_eq!(fs::read(root.join("city.png")).unwrap(), b"city");
    assert_eq!(fs::read(root.join("music.ogg")).unwrap(), b"mp3 bytes");
}

#[test]
fn failed_copy_still_waits_for_audio() {
    let source = level_dir();
    fs::remove_file(source.path().join("bg.jpg")).unwrap();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, SlowTranscoder);

    let result = converter.intralism_to_mania(&source.path().join("config.txt"), out.path(), None);
    assert!(matches!(
        result,
        Err(ConvertError::Asset(AssetError::Copy { .. }))
    ));
    assert_eq!(fs::read(out.path().join("track.ogg")).unwrap(), b"vorbis bytes");
}

#[test]
fn transcoder_failure_surfaces_after_output() {
    let source = chart_dir();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::with_collaborators(probe, FailingTranscoder);

    let result = converter.mania_to_intralism(&source.path().join("sample.osu"), out.path(), None);
    let Err(ConvertError::Asset(AssetError::TranscodeFailed { from, stderr, .. })) = result else {
        panic!("expected a transcode failure");
    };
    assert_eq!(from, source.path().join("audio.mp3"));
    assert!(stderr.contains("Invalid data"));
    assert!(out.path().join("config.txt").exists());
}

#[test]
fn audio_can_be_pipelined() {
    let source = level_dir();
    let out = tempfile::tempdir().unwrap();
    let converter = Converter::new(&ConverterConfig::default());
    let pending = converter.start_audio(
        &source.path().join("track.ogg"),
        &out.path().join("music.ogg"),
    );
    assert_eq!(pending.destination(), out.path().join("music.ogg").as_path());
    let written = pending.wait().expect("must be copied");
    assert_eq!(fs::read(written).unwrap(), b"vorbis bytes");
}
