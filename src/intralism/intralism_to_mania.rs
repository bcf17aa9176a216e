//! Part: Convert `IntralismBeatmap` to `ManiaChart`.

use std::path::Path;

use thiserror::Error;

use super::{
    IntralismBeatmap,
    event::{Event, EventDecodeError, EventPayload, MAP_END, SpriteEvent, SpriteLayer},
};
use crate::{
    audio::DurationProbe,
    error::ConvertError,
    mania::{
        HitObject, ManiaChart,
        storyboard::{Command, Layer, Origin, StoryboardSprite},
    },
    resource::{file_name, find_resource, local_path},
};

/// Artist of converted charts whose level name has no `Artist - Title` form.
pub const FALLBACK_ARTIST: &str = "Intralism";

/// Warnings that occur during conversion from `IntralismBeatmap` to `ManiaChart`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IntralismToManiaWarning {
    /// Events of this kind have no chart counterpart and were ignored.
    #[error("`{kind}` events are not supported, ignored")]
    UnsupportedEvent {
        /// Kind tag of the events.
        kind: String,
    },
    /// The level has no `MapEnd` time, so sprites last until the end of the audio.
    #[error("no map end time, using the audio length")]
    MapEndFallback,
}

/// Output of the conversion from `IntralismBeatmap` to `ManiaChart`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct IntralismToManiaOutput {
    /// The converted chart.
    pub chart: ManiaChart,
    /// Level relative paths of the images the chart uses, the icon first.
    pub image_paths: Vec<String>,
    /// Warnings that occurred during the conversion.
    pub warnings: Vec<IntralismToManiaWarning>,
}

impl IntralismBeatmap {
    /// Convert `IntralismBeatmap` to `ManiaChart`.
    ///
    /// Every sprite is shown from its event time until the end of the map, which is the first `MapEnd`
    /// time or, without one, the length of the level audio in `audio_dir` as measured by `probe`. The
    /// `MapEnd` payload is only read, and the probe only consulted, when the level shows sprites.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::LaneMapping`] when a spawn event names something other than a lane.
    /// - [`ConvertError::Event`] when a spawn payload is not a lane list, or the `MapEnd` payload is
    ///   not a number while sprites need it.
    /// - [`ConvertError::ResourceLookup`] when a sprite names an undeclared resource.
    /// - [`ConvertError::Probe`] when the audio length is needed and cannot be measured.
    pub fn to_mania(
        &self,
        audio_dir: &Path,
        probe: &dyn DurationProbe,
    ) -> Result<IntralismToManiaOutput, ConvertError> {
        let mut warnings = Vec::new();
        let mut sprites = Vec::new();
        let mut map_end = None;
        let mut chart = ManiaChart::intralism_template();

        for event in &self.events {
            if event.is_of_kind(MAP_END) {
                map_end.get_or_insert(event);
                continue;
            }
            match decode(event)? {
                EventPayload::SpawnNotes { lanes } => {
                    let time = millis(event.time);
                    chart
                        .hit_objects
                        .extend(lanes.into_iter().map(|lane| HitObject::circle(lane.x(), time)));
                }
                EventPayload::ShowSprite(sprite) => sprites.push((millis(event.time), sprite)),
                // Read on demand below.
                EventPayload::MapEnd { .. } => {}
                EventPayload::Other { kind, .. } => {
                    let warning = IntralismToManiaWarning::UnsupportedEvent { kind };
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                }
            }
        }

        let metadata = &mut chart.metadata;
        let artist = self
            .name
            .split_once('-')
            .map_or(FALLBACK_ARTIST, |(artist, _)| artist);
        metadata.title.clone_from(&self.name);
        metadata.title_unicode.clone_from(&self.name);
        metadata.artist = artist.to_string();
        metadata.artist_unicode = artist.to_string();
        chart.general.audio_filename.clone_from(&self.music_file);
        chart.general.preview_time = (self.music_time * 1000.0 / 2.0).floor() as i32;
        chart.events.background_image = file_name(&self.icon_file).to_string();

        let mut image_paths = Vec::new();
        if !self.icon_file.is_empty() {
            image_paths.push(self.icon_file.clone());
        }
        if !sprites.is_empty() {
            let end_seconds = match map_end.map(decode).transpose()? {
                Some(EventPayload::MapEnd { seconds }) => seconds,
                _ => None,
            };
            let end_time = match end_seconds {
                Some(seconds) => millis(seconds),
                None => {
                    warnings.push(IntralismToManiaWarning::MapEndFallback);
                    millis(probe.probe(&audio_dir.join(local_path(&self.music_file)))?)
                }
            };
            for (start_time, sprite) in sprites {
                let path = self.place_sprite(&mut chart, &sprite, start_time, end_time)?;
                image_paths.push(path);
            }
        }

        Ok(IntralismToManiaOutput {
            chart,
            image_paths,
            warnings,
        })
    }

    /// Adds `sprite` to its storyboard layer and returns the level relative path of its image.
    fn place_sprite(
        &self,
        chart: &mut ManiaChart,
        sprite: &SpriteEvent,
        start_time: i32,
        end_time: i32,
    ) -> Result<String, ConvertError> {
        let resource = find_resource(&self.level_resources, &sprite.name)?;
        let mut storyboard_sprite = StoryboardSprite::new(Origin::Centre, file_name(&resource.path));
        storyboard_sprite
            .commands
            .push(Command::visibility(start_time, end_time));
        let layer = match sprite.layer {
            SpriteLayer::Background => Layer::Background,
            SpriteLayer::Foreground => Layer::Foreground,
        };
        chart
            .events
            .storyboard
            .layer_mut(layer)
            .push(storyboard_sprite);
        Ok(resource.path.clone())
    }
}

fn decode(event: &Event) -> Result<EventPayload, ConvertError> {
    event.decode().map_err(|err| match err {
        EventDecodeError::Lane(err) => ConvertError::LaneMapping(err),
        err => ConvertError::Event(err),
    })
}

/// Seconds to whole milliseconds, rounded to the nearest.
fn millis(seconds: f64) -> i32 {
    (seconds * 1000.0).round() as i32
}
