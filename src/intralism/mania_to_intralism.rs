//! Part: Convert `ManiaChart` to `IntralismBeatmap`.

use std::{collections::HashMap, path::Path};

use thiserror::Error;

use super::{
    IntralismBeatmap,
    event::{Event, EventPayload, SpriteEvent, SpriteLayer},
};
use crate::{
    audio::DurationProbe,
    error::ConvertError,
    lane::Lane,
    mania::{ManiaChart, parse::background_file_name, storyboard::Layer},
    resource::{file_name, first_per_path, local_path, sprite_resources},
};

/// Warnings that occur during conversion from `ManiaChart` to `IntralismBeatmap`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ManiaToIntralismWarning {
    /// A hit object is not on one of the four lanes and was left out.
    #[error("hit object at x={x}, {time}ms is not on a lane, skipped")]
    SkippedHitObject {
        /// Its horizontal position.
        x: i32,
        /// Its start time in milliseconds.
        time: i32,
    },
    /// A storyboard sprite has no command to take a show time from and was left out.
    #[error("sprite `{path}` has no commands, skipped")]
    SpriteWithoutCommands {
        /// Image path of the sprite.
        path: String,
    },
}

/// Output of the conversion from `ManiaChart` to `IntralismBeatmap`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ManiaToIntralismOutput {
    /// The converted level.
    pub beatmap: IntralismBeatmap,
    /// Chart relative paths of the images the level uses, the background first.
    pub image_paths: Vec<String>,
    /// Warnings that occurred during the conversion.
    pub warnings: Vec<ManiaToIntralismWarning>,
}

impl ManiaChart {
    /// Convert `ManiaChart` to `IntralismBeatmap`.
    ///
    /// `audio_dir` is the directory the chart's audio file lives in, and `probe` measures its length
    /// for `musicTime`. The event list starts with the background sprite at time `0`, continues with
    /// the storyboard sprites and the note spawns, and ends with a `MapEnd` at the audio length.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Probe`] when the audio length cannot be measured.
    pub fn to_intralism(
        &self,
        audio_dir: &Path,
        probe: &dyn DurationProbe,
    ) -> Result<ManiaToIntralismOutput, ConvertError> {
        let mut warnings = Vec::new();
        let metadata = &self.metadata;
        let music_time =
            probe.probe(&audio_dir.join(local_path(&self.general.audio_filename)))?;

        let mut image_paths = vec![self.events.background_image.clone()];
        let mut events = vec![
            EventPayload::ShowSprite(SpriteEvent::new(
                background_file_name(self),
                SpriteLayer::Background,
            ))
            .into_event(0.0),
        ];
        for (layer, sprite_layer) in [
            (Layer::Background, SpriteLayer::Background),
            (Layer::Foreground, SpriteLayer::Foreground),
        ] {
            for sprite in first_per_path(self.events.storyboard.layer(layer)) {
                let Some(command) = sprite.commands.first() else {
                    warnings.push(ManiaToIntralismWarning::SpriteWithoutCommands {
                        path: sprite.path.clone(),
                    });
                    continue;
                };
                let mut shown = SpriteEvent::new(file_name(&sprite.path), sprite_layer);
                shown.duration =
                    (i64::from(command.end_time) - i64::from(command.start_time)) as f64;
                events.push(EventPayload::ShowSprite(shown).into_event(seconds(command.start_time)));
                image_paths.push(sprite.path.clone());
            }
        }

        events.extend(self.spawn_events(&mut warnings));
        events.push(
            EventPayload::MapEnd {
                seconds: Some(music_time),
            }
            .into_event(music_time),
        );

        let beatmap = IntralismBeatmap {
            name: format!("{} - {}", metadata.artist, metadata.title),
            info: format!(
                "Mania convert https://osu.ppy.sh/beatmapsets/{}/discussion/{} by {}",
                metadata.beatmap_set_id, metadata.beatmap_id, metadata.creator
            ),
            level_resources: sprite_resources(image_paths.iter().map(String::as_str)),
            music_time,
            icon_file: events
                .first()
                .map(|event| event.inner_payload().to_string())
                .unwrap_or_default(),
            events,
            ..IntralismBeatmap::default()
        };
        Ok(ManiaToIntralismOutput {
            beatmap,
            image_paths,
            warnings,
        })
    }

    /// One spawn event per distinct start time, in order of first appearance.
    fn spawn_events(&self, warnings: &mut Vec<ManiaToIntralismWarning>) -> Vec<Event> {
        let mut groups: Vec<(i32, Vec<Lane>)> = Vec::new();
        let mut group_of_time = HashMap::new();
        for object in &self.hit_objects {
            let Ok(lane) = Lane::from_x(object.x) else {
                warnings.push(ManiaToIntralismWarning::SkippedHitObject {
                    x: object.x,
                    time: object.start_time,
                });
                continue;
            };
            let index = *group_of_time.entry(object.start_time).or_insert_with(|| {
                groups.push((object.start_time, Vec::new()));
                groups.len() - 1
            });
            if let Some((_, lanes)) = groups.get_mut(index) {
                lanes.push(lane);
            }
        }
        groups
            .into_iter()
            .map(|(time, lanes)| EventPayload::SpawnNotes { lanes }.into_event(seconds(time)))
            .collect()
    }
}

fn seconds(millis: i32) -> f64 {
    f64::from(millis) / 1000.0
}
