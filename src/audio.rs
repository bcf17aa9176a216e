//! Audio collaborators of a conversion: measuring the length of a track and bringing it into the
//! container the destination game plays.
//!
//! Both are traits so the orchestrator can run with other implementations, e.g. in tests.

use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    process::Command,
};

use lewton::inside_ogg::OggStreamReader;
use log::debug;
use thiserror::Error;

use crate::error::AssetError;

/// The length of an audio file could not be measured.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The file could not be opened or read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        /// The audio file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a decodable stream of its format.
    #[error("cannot decode `{}`: {message}", path.display())]
    Unreadable {
        /// The audio file.
        path: PathBuf,
        /// What the decoder reported.
        message: String,
    },
}

/// Measures the play length of an audio file.
pub trait DurationProbe: Send + Sync {
    /// Length of the audio at `path` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the file cannot be read or decoded.
    fn probe(&self, path: &Path) -> Result<f64, ProbeError>;
}

impl<F> DurationProbe for F
where
    F: Fn(&Path) -> Result<f64, ProbeError> + Send + Sync,
{
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        self(path)
    }
}

/// Brings an audio file into a target container.
pub trait MediaTranscoder: Send + Sync {
    /// Extension of the produced container, without the dot.
    fn target_extension(&self) -> &str;

    /// Writes `from` to `to` in the target container, overwriting `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] when the file cannot be copied or converted.
    fn transcode(&self, from: &Path, to: &Path) -> Result<(), AssetError>;
}

/// Decoder based [`DurationProbe`] for `.ogg`, `.wav` and `.mp3`.
///
/// Any other extension measures as `0` seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioProbe;

impl DurationProbe for AudioProbe {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let seconds = match extension.as_deref() {
            Some("ogg") => ogg_seconds(path)?,
            Some("wav") => wav_seconds(path)?,
            Some("mp3") => mp3_seconds(path)?,
            _ => 0.0,
        };
        debug!("{} is {seconds}s long", path.display());
        Ok(seconds)
    }
}

fn unreadable(path: &Path, err: impl ToString) -> ProbeError {
    ProbeError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn open(path: &Path) -> Result<File, ProbeError> {
    File::open(path).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Sample rate from the Vorbis header, sample count from the granule position of the last page.
fn ogg_seconds(path: &Path) -> Result<f64, ProbeError> {
    let data = fs::read(path).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = OggStreamReader::new(Cursor::new(&data)).map_err(|err| unreadable(path, err))?;
    let sample_rate = reader.ident_hdr.audio_sample_rate;
    if sample_rate == 0 {
        return Err(unreadable(path, "sample rate is 0"));
    }
    let samples = last_granule(&data).ok_or_else(|| unreadable(path, "no granule position"))?;
    Ok(samples as f64 / f64::from(sample_rate))
}

/// Granule position of the last Ogg page that carries one.
fn last_granule(data: &[u8]) -> Option<u64> {
    const CAPTURE: &[u8] = b"OggS";
    let mut end = data.len();
    while let Some(start) = data
        .get(..end)?
        .windows(CAPTURE.len())
        .rposition(|window| window == CAPTURE)
    {
        let granule = data
            .get(start + 6..start + 14)
            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
            .map(u64::from_le_bytes);
        match granule {
            // All ones marks a page on which no packet ends.
            Some(granule) if granule != u64::MAX => return Some(granule),
            _ => end = start,
        }
    }
    None
}

fn wav_seconds(path: &Path) -> Result<f64, ProbeError> {
    let reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::IoError(source) => ProbeError::Io {
            path: path.to_path_buf(),
            source,
        },
        err => unreadable(path, err),
    })?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(unreadable(path, "sample rate is 0"));
    }
    Ok(f64::from(reader.duration()) / f64::from(sample_rate))
}

/// Sums the lengths of all decodable frames.
fn mp3_seconds(path: &Path) -> Result<f64, ProbeError> {
    let mut decoder = minimp3::Decoder::new(BufReader::new(open(path)?));
    let mut seconds = 0.0;
    loop {
        match decoder.next_frame() {
            Ok(frame) if frame.channels > 0 && frame.sample_rate > 0 => {
                seconds +=
                    frame.data.len() as f64 / frame.channels as f64 / f64::from(frame.sample_rate);
            }
            Ok(_) | Err(minimp3::Error::SkippedData) => {}
            Err(minimp3::Error::Eof) => return Ok(seconds),
            Err(err) => return Err(unreadable(path, err)),
        }
    }
}

/// [`MediaTranscoder`] that runs an `ffmpeg` executable.
///
/// Files already in the target container are copied byte for byte instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    extension: String,
}

impl FfmpegTranscoder {
    /// A transcoder running `program` and producing `extension` files.
    pub fn new(program: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extension: extension.into(),
        }
    }

    /// The executable run for conversions.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MediaTranscoder for FfmpegTranscoder {
    fn target_extension(&self) -> &str {
        &self.extension
    }

    fn transcode(&self, from: &Path, to: &Path) -> Result<(), AssetError> {
        if has_extension(from, &self.extension) {
            debug!("copying {} to {}", from.display(), to.display());
            return copy_file(from, to);
        }
        debug!(
            "running {} on {} into {}",
            self.program.display(),
            from.display(),
            to.display()
        );
        let output = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(from)
            .arg(to)
            .output()
            .map_err(|source| AssetError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(AssetError::TranscodeFailed {
                from: from.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Whether the extension of `path` is `extension`, ignoring ASCII case.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Whether `a` and `b` name the same existing file.
///
/// Paths that cannot be resolved are never the same file.
#[must_use]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copies `from` over `to`.
///
/// Nothing is done when both name the same file, which [`fs::copy`] would truncate.
///
/// # Errors
///
/// Returns [`AssetError::Copy`] with both paths when the copy fails.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), AssetError> {
    if is_same_file(from, to) {
        debug!("{} is already in place", to.display());
        return Ok(());
    }
    fs::copy(from, to)
        .map(drop)
        .map_err(|source| AssetError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}
