//! End-to-end conversions between chart and level directories.
//!
//! A conversion decodes the source, translates it, starts bringing the audio over on a worker thread,
//! copies the images flat into the output directory and writes the converted chart or level. Nothing
//! is rolled back on failure: files written before an error stay in the output directory.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
};

use itertools::Itertools;
use log::{info, warn};
use thiserror::Error;

use crate::{
    audio::{AudioProbe, DurationProbe, FfmpegTranscoder, MediaTranscoder, copy_file, is_same_file},
    error::{AssetError, ConvertError},
    intralism::{
        CONFIG_FILE_NAME, IntralismBeatmap,
        intralism_to_mania::{IntralismToManiaOutput, IntralismToManiaWarning},
        mania_to_intralism::{ManiaToIntralismOutput, ManiaToIntralismWarning},
    },
    mania::parse::{ChartParseOutput, ChartParseWarning, decode_file},
    resource::{file_name, local_path},
};

/// Settings of a [`Converter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// The `ffmpeg` executable, looked up in `PATH` when it is a bare name.
    pub ffmpeg_path: PathBuf,
    /// Container extension audio is brought into, without the dot.
    pub audio_extension: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_extension: "ogg".into(),
        }
    }
}

/// A non-fatal issue found while converting, from any stage.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ConversionWarning {
    /// Found while decoding the source chart.
    #[error(transparent)]
    Chart(#[from] ChartParseWarning),
    /// Found while translating a chart into a level.
    #[error(transparent)]
    ManiaToIntralism(#[from] ManiaToIntralismWarning),
    /// Found while translating a level into a chart.
    #[error(transparent)]
    IntralismToMania(#[from] IntralismToManiaWarning),
}

/// What a conversion wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ConversionReport {
    /// The written chart or `config.txt`.
    pub output: PathBuf,
    /// The written audio file.
    pub audio: PathBuf,
    /// The copied images, in the order they were copied.
    pub images: Vec<PathBuf>,
    /// Non-fatal issues met on the way.
    pub warnings: Vec<ConversionWarning>,
}

/// An audio file being brought over on a worker thread.
///
/// Dropping it without [`PendingAudio::wait`] detaches the worker, which keeps writing the
/// destination in the background. The conversions of [`Converter`] always wait, even when a later
/// step fails.
#[derive(Debug)]
#[must_use = "the audio may still be written, wait for it"]
pub struct PendingAudio {
    from: PathBuf,
    to: PathBuf,
    /// `None` when the source already is the destination.
    handle: Option<JoinHandle<Result<(), AssetError>>>,
}

impl PendingAudio {
    /// The file being written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.to
    }

    /// Whether the worker has stopped, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Blocks until the audio is written and returns its path.
    ///
    /// # Errors
    ///
    /// Returns the [`AssetError`] of the transcoder, or [`AssetError::WorkerPanicked`].
    pub fn wait(self) -> Result<PathBuf, AssetError> {
        match self.handle.map(JoinHandle::join) {
            None => Ok(self.to),
            Some(Ok(result)) => result.map(|()| self.to),
            Some(Err(_)) => Err(AssetError::WorkerPanicked { from: self.from }),
        }
    }
}

/// Runs conversions with a fixed pair of audio collaborators.
#[derive(Clone)]
pub struct Converter {
    probe: Arc<dyn DurationProbe>,
    transcoder: Arc<dyn MediaTranscoder>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("audio_extension", &self.transcoder.target_extension())
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// A converter that measures audio with the built-in decoders and converts it with `ffmpeg`.
    #[must_use]
    pub fn new(config: &ConverterConfig) -> Self {
        Self::with_collaborators(
            AudioProbe,
            FfmpegTranscoder::new(&config.ffmpeg_path, &config.audio_extension),
        )
    }

    /// A converter using the given collaborators.
    pub fn with_collaborators(
        probe: impl DurationProbe + 'static,
        transcoder: impl MediaTranscoder + 'static,
    ) -> Self {
        Self {
            probe: Arc::new(probe),
            transcoder: Arc::new(transcoder),
        }
    }

    /// Starts bringing `from` over to `to` on a worker thread.
    ///
    /// No worker is started when both name the same file, the audio is already in place.
    pub fn start_audio(&self, from: &Path, to: &Path) -> PendingAudio {
        let handle = if is_same_file(from, to) {
            info!("{} is already in place", to.display());
            None
        } else {
            let transcoder = Arc::clone(&self.transcoder);
            let (source, destination) = (from.to_path_buf(), to.to_path_buf());
            Some(thread::spawn(move || transcoder.transcode(&source, &destination)))
        };
        PendingAudio {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            handle,
        }
    }

    /// Converts the chart at `chart_path` into a level in `out_dir`.
    ///
    /// The audio is written as `music.<ext>` and the level as `config.txt`. A non-zero `speed`
    /// replaces the approach speed of the level.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] from decoding, translating or writing; see the module docs for the
    /// state of `out_dir` afterwards.
    pub fn mania_to_intralism(
        &self,
        chart_path: &Path,
        out_dir: &Path,
        speed: Option<f64>,
    ) -> Result<ConversionReport, ConvertError> {
        info!("converting {} into a level", chart_path.display());
        let source_dir = parent_dir(chart_path);
        let ChartParseOutput {
            chart,
            warnings: parse_warnings,
        } = decode_file(chart_path)?;
        let ManiaToIntralismOutput {
            mut beatmap,
            image_paths,
            warnings: translate_warnings,
        } = chart.to_intralism(source_dir, self.probe.as_ref())?;
        if let Some(speed) = speed.filter(|&speed| speed != 0.0) {
            beatmap.speed = speed;
        }
        beatmap.music_file = format!("music.{}", self.transcoder.target_extension());

        let pending = self.start_audio(
            &source_dir.join(local_path(&chart.general.audio_filename)),
            &out_dir.join(&beatmap.music_file),
        );
        let output = out_dir.join(CONFIG_FILE_NAME);
        let written = copy_images(source_dir, &image_paths, out_dir).and_then(|images| {
            beatmap.write_json(&output)?;
            Ok(images)
        });
        let (images, audio) = join_audio(written, pending)?;

        let warnings = collect_warnings(parse_warnings, translate_warnings);
        info!("wrote {}", output.display());
        Ok(ConversionReport {
            output,
            audio,
            images,
            warnings,
        })
    }

    /// Converts the level at `config_path` into a chart in `out_dir`.
    ///
    /// The chart is written as `{Artist} - {Title} [Intralism].osu` and the audio keeps the stem of
    /// the level's music file. A non-zero `offset` shifts every note by that many milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] from decoding, translating or writing; see the module docs for the
    /// state of `out_dir` afterwards.
    pub fn intralism_to_mania(
        &self,
        config_path: &Path,
        out_dir: &Path,
        offset: Option<i32>,
    ) -> Result<ConversionReport, ConvertError> {
        info!("converting {} into a chart", config_path.display());
        let source_dir = parent_dir(config_path);
        let beatmap = IntralismBeatmap::read_json(config_path)?;
        let IntralismToManiaOutput {
            mut chart,
            image_paths,
            warnings: translate_warnings,
        } = beatmap.to_mania(source_dir, self.probe.as_ref())?;
        if let Some(offset) = offset.filter(|&offset| offset != 0) {
            chart.apply_offset(offset);
        }
        let stem = Path::new(file_name(&beatmap.music_file))
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("music");
        chart.general.audio_filename = format!("{stem}.{}", self.transcoder.target_extension());

        let pending = self.start_audio(
            &source_dir.join(local_path(&beatmap.music_file)),
            &out_dir.join(&chart.general.audio_filename),
        );
        let output = out_dir.join(chart.converted_file_name());
        let written = copy_images(source_dir, &image_paths, out_dir).and_then(|images| {
            chart
                .unparse()
                .and_then(|text| fs::write(&output, text))
                .map_err(|source| AssetError::Write {
                    path: output.clone(),
                    source,
                })?;
            Ok(images)
        });
        let (images, audio) = join_audio(written, pending)?;

        let warnings = collect_warnings(Vec::new(), translate_warnings);
        info!("wrote {}", output.display());
        Ok(ConversionReport {
            output,
            audio,
            images,
            warnings,
        })
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Waits for the audio worker whatever happened to the other outputs.
///
/// An error of `written` comes first, and an audio error next to it is only logged.
fn join_audio(
    written: Result<Vec<PathBuf>, AssetError>,
    pending: PendingAudio,
) -> Result<(Vec<PathBuf>, PathBuf), AssetError> {
    let audio = pending.wait();
    match (written, audio) {
        (Ok(images), Ok(audio)) => Ok((images, audio)),
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => Err(err),
        (Err(err), Err(audio_err)) => {
            warn!("{audio_err}");
            Err(err)
        }
    }
}

/// Copies every distinct image flat into `out_dir`, overwriting files already there.
fn copy_images(
    source_dir: &Path,
    image_paths: &[String],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, AssetError> {
    image_paths
        .iter()
        .filter(|path| !file_name(path).is_empty())
        .unique_by(|path| file_name(path).to_string())
        .map(|path| {
            let to = out_dir.join(file_name(path));
            copy_file(&source_dir.join(local_path(path)), &to)?;
            Ok(to)
        })
        .collect()
}

fn collect_warnings(
    parse: Vec<ChartParseWarning>,
    translate: Vec<impl Into<ConversionWarning>>,
) -> Vec<ConversionWarning> {
    parse
        .into_iter()
        .map(ConversionWarning::from)
        .chain(translate.into_iter().map(Into::into))
        .inspect(|warning| warn!("{warning}"))
        .collect()
}
