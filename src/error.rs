//! Errors surfaced by the decoders, the translators and the conversion orchestrator.

use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error;

use crate::{
    audio::ProbeError, intralism::event::EventDecodeError, lane::LaneMappingError,
    resource::ResourceLookupError,
};

/// A source chart or config could not be read or is structurally invalid.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The Intralism config is not valid JSON for a beatmap, or is `null`.
    #[error("malformed config at `{field}`: {source}")]
    Json {
        /// Path of the offending field inside the document, `.` for the root.
        field: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The mania chart text is not a chart at all.
    #[error("malformed chart at line {line}: {message}")]
    Chart {
        /// The line number, starts with 1.
        line: usize,
        /// What was expected.
        message: String,
    },
    /// The chart codec rejected the text.
    #[error("malformed chart: {0}")]
    Codec(#[source] io::Error),
}

/// Copying or transcoding a sideband asset failed.
///
/// Files written before the failure are left in the output directory.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AssetError {
    /// A plain copy failed.
    #[error("failed to copy `{}` to `{}`: {source}", from.display(), to.display())]
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The transcoder process could not be started.
    #[error("failed to run transcoder `{}`: {source}", program.display())]
    Spawn {
        /// The transcoder executable.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The transcoder ran but reported a failure.
    #[error("transcoding `{}` failed ({status}): {stderr}", from.display())]
    TranscodeFailed {
        /// Source audio file.
        from: PathBuf,
        /// Exit status of the transcoder.
        status: ExitStatus,
        /// Captured standard error output.
        stderr: String,
    },
    /// The worker thread running the transcoder panicked.
    #[error("audio worker for `{}` panicked", from.display())]
    WorkerPanicked {
        /// Source audio file.
        from: PathBuf,
    },
    /// The converted chart or config could not be written.
    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        /// Destination file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Any failure of a conversion, surfaced to the caller without retry.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source could not be decoded.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    /// A lane coordinate or name is not one of the four lanes.
    #[error("lane: {0}")]
    LaneMapping(#[from] LaneMappingError),
    /// An event payload is malformed.
    #[error("event: {0}")]
    Event(#[from] EventDecodeError),
    /// A sprite names a resource that is not registered.
    #[error("resource: {0}")]
    ResourceLookup(#[from] ResourceLookupError),
    /// The audio duration could not be probed.
    #[error("probe: {0}")]
    Probe(#[from] ProbeError),
    /// Copying audio or images, or writing the output, failed.
    #[error("asset: {0}")]
    Asset(#[from] AssetError),
}
