//! The Intralism level model (`config.txt`).
//!
//! A level is a single JSON object. Every field falls back to the value the game itself uses when it
//! is absent, and fields the model does not know are ignored.
//!
//! - [`event`] defines the timed events and their payloads.
//! - [`mania_to_intralism`] builds a level from a [`ManiaChart`](crate::mania::ManiaChart).
//! - [`intralism_to_mania`] builds a chart from a level.

pub mod event;
pub mod intralism_to_mania;
pub mod mania_to_intralism;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use self::event::{Event, SHOW_SPRITE};
use crate::error::{AssetError, DecodeError};

/// File name the game loads a level from.
pub const CONFIG_FILE_NAME: &str = "config.txt";
/// Audio file name of converted levels.
pub const DEFAULT_MUSIC_FILE: &str = "music.ogg";

/// An image or other asset registered by a level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelResource {
    /// Name that events refer to.
    pub name: String,
    /// Asset type, `Sprite` for images.
    #[serde(rename = "type")]
    pub kind: String,
    /// File path relative to the level directory.
    pub path: String,
}

impl LevelResource {
    /// An image resource whose name and path are both `file_name`.
    #[must_use]
    pub fn sprite(file_name: &str) -> Self {
        Self {
            name: file_name.to_string(),
            kind: "Sprite".into(),
            path: file_name.to_string(),
        }
    }
}

/// An Intralism level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntralismBeatmap {
    /// Version of the config layout.
    pub config_version: u32,
    /// Display name, conventionally `Artist - Title`.
    pub name: String,
    /// Free text shown in the level description.
    pub info: String,
    /// Registered assets.
    pub level_resources: Vec<LevelResource>,
    /// Number of hands the level is played with.
    pub hand_count: u32,
    /// Approach speed of the notes.
    pub speed: f64,
    /// Lives at the start.
    pub lives: u32,
    /// Maximum lives.
    pub max_lives: u32,
    /// Audio file relative to the level directory.
    pub music_file: String,
    /// Length of the audio in seconds.
    pub music_time: f64,
    /// Image used as the level icon; also the first background.
    pub icon_file: String,
    /// Environment the level is played in.
    pub environment_type: u32,
    /// All events. The first one is the background sprite at time `0` for converted levels.
    pub events: Vec<Event>,
}

impl Default for IntralismBeatmap {
    fn default() -> Self {
        Self {
            config_version: 2,
            name: String::new(),
            info: String::new(),
            level_resources: Vec::new(),
            hand_count: 1,
            speed: 25.0,
            lives: 50,
            max_lives: 50,
            music_file: DEFAULT_MUSIC_FILE.into(),
            music_time: 0.0,
            icon_file: String::new(),
            environment_type: 0,
            events: Vec::new(),
        }
    }
}

impl IntralismBeatmap {
    /// Parses a level from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] with the path of the offending field when the text is not a
    /// level, including when it is `null`.
    pub fn from_json_str(source: &str) -> Result<Self, DecodeError> {
        let mut deserializer = serde_json::Deserializer::from_str(source);
        let beatmap: Option<Self> = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| DecodeError::Json {
                field: err.path().to_string(),
                source: err.into_inner(),
            })?;
        deserializer.end().map_err(|source| DecodeError::Json {
            field: ".".into(),
            source,
        })?;
        beatmap.ok_or_else(|| DecodeError::Json {
            field: ".".into(),
            source: serde::de::Error::custom("config is null"),
        })
    }

    /// Reads the level at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Io`] when the file cannot be read, and the errors of
    /// [`Self::from_json_str`].
    pub fn read_json(path: &Path) -> Result<Self, DecodeError> {
        let source = fs::read_to_string(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    /// Pretty printed JSON of the level.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        // Plain data with string keys always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Writes the level to `path` as pretty printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Write`] when the file cannot be written.
    pub fn write_json(&self, path: &Path) -> Result<(), AssetError> {
        fs::write(path, self.to_json_string()).map_err(|source| AssetError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Events of `kind`, in order.
    pub fn events_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |event| event.is_of_kind(kind))
    }

    /// Names of the images shown by sprite events, in order, with repeats.
    pub fn sprite_names(&self) -> impl Iterator<Item = &str> {
        self.events_of_kind(SHOW_SPRITE).map(Event::inner_payload)
    }
}
