//! Converter between osu!mania charts (`.osu`) and Intralism levels (`config.txt`).
//!
//! The crate is split by format, with the conversion between them living next to the destination
//! model:
//!
//! - [`mania`] models a chart and provides its text codec.
//! - [`intralism`] models a level, its events and its JSON codec, and holds both translators as
//!   [`mania::ManiaChart::to_intralism`] and [`intralism::IntralismBeatmap::to_mania`].
//! - [`lane`] is the fixed mapping between mania columns and Intralism lanes.
//! - [`resource`] matches sprites and image resources across the two formats.
//! - [`audio`] measures and transcodes the audio track.
//! - [`convert`] drives a whole conversion between directories.
//!
//! The translators are pure functions over in-memory models, apart from the audio length they ask a
//! [`audio::DurationProbe`] for. Non-fatal issues are returned as warnings next to the result, and
//! fatal ones as [`error::ConvertError`].
//!
//! In detail, our policies are:
//!
//! - Only the four lanes of a 4K chart are converted. Other columns are skipped with a warning.
//! - Notes are grouped by exact start time, without any snapping.
//! - Images are copied flat by their base name.
//! - Nothing is rolled back when a conversion fails midway.

pub mod audio;
pub mod convert;
pub mod error;
pub mod intralism;
pub mod lane;
pub mod mania;
pub mod resource;

pub use crate::{
    convert::{ConversionReport, Converter, ConverterConfig},
    error::ConvertError,
    intralism::IntralismBeatmap,
    mania::ManiaChart,
};
