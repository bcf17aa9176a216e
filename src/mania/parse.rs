//! Decoder of chart text into [`ManiaChart`].
//!
//! The sections are decoded by [`rosu_map`], and the storyboard sprites of `[Events]`, which it
//! skips, are read here line by line. The decoder is lenient like the game itself: a storyboard
//! value that fails to parse keeps its default and is reported as a [`ChartParseWarning`], and so is
//! every element the conversion does not carry. Only text that does not start with the
//! `osu file format v` header is rejected.

use std::{fs, path::Path, str::FromStr};

use rosu_map::{Beatmap, section::hit_objects::HitObjectKind as BeatmapObjectKind};
use thiserror::Error;

use super::{
    DifficultySection, EditorSection, EventsSection, GeneralSection, HitObject, HitObjectKind,
    ManiaChart, MetadataSection, TimingPoint,
    storyboard::{Command, Layer, Origin, Storyboard, StoryboardSprite},
};
use crate::{error::DecodeError, resource::file_name};

const HEADER: &str = "osu file format v";

/// A non-fatal issue found while decoding a chart.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ChartParseWarning {
    /// A storyboard field that could not be parsed.
    #[error("invalid value `{value}` at line {line}")]
    InvalidValue {
        /// The offending text.
        value: String,
        /// The line number, starts with 1.
        line: usize,
    },
    /// A storyboard element that the conversion does not carry, e.g. an animation or a loop.
    #[error("unsupported storyboard line `{content}` at line {line}")]
    UnsupportedStoryboard {
        /// The line content.
        content: String,
        /// The line number, starts with 1.
        line: usize,
    },
    /// A slider or a spinner, which have no mania counterpart.
    #[error("hit object at {time}ms is neither a note nor a hold, dropped")]
    UnsupportedObject {
        /// Its start time in milliseconds.
        time: i32,
    },
}

/// Decoded chart and the warnings met on the way.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ChartParseOutput {
    /// The decoded chart.
    pub chart: ManiaChart,
    /// Issues that were recovered from.
    pub warnings: Vec<ChartParseWarning>,
}

/// Reads and decodes the chart file at `path`.
///
/// # Errors
///
/// Returns [`DecodeError::Io`] when the file cannot be read, and the errors of [`parse_chart`].
pub fn decode_file(path: &Path) -> Result<ChartParseOutput, DecodeError> {
    let source = fs::read_to_string(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_chart(&source)
}

/// Decodes chart text.
///
/// # Errors
///
/// Returns [`DecodeError::Chart`] when the first non-empty line is not a format header, and
/// [`DecodeError::Codec`] when [`rosu_map`] rejects the text.
pub fn parse_chart(source: &str) -> Result<ChartParseOutput, DecodeError> {
    check_header(source)?;
    let beatmap: Beatmap = rosu_map::from_str(source).map_err(DecodeError::Codec)?;

    let mut parser = StoryboardParser::default();
    let mut in_events = false;
    for (index, content) in source.lines().enumerate() {
        let trimmed = content.trim_end();
        if trimmed.trim_start().is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with('[') {
            in_events = trimmed == "[Events]";
            parser.current_sprite = None;
            continue;
        }
        if in_events {
            parser.event(trimmed, index + 1);
        }
    }

    let mut warnings = parser.warnings;
    let chart = chart_from_beatmap(beatmap, parser.storyboard, &mut warnings);
    Ok(ChartParseOutput { chart, warnings })
}

fn check_header(source: &str) -> Result<(), DecodeError> {
    let (index, header) = source
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .enumerate()
        .find(|(_, line)| !line.is_empty())
        .ok_or_else(|| DecodeError::Chart {
            line: 1,
            message: "empty chart".into(),
        })?;
    if header.starts_with(HEADER) {
        Ok(())
    } else {
        Err(DecodeError::Chart {
            line: index + 1,
            message: format!("expected `{HEADER}<version>`"),
        })
    }
}

fn chart_from_beatmap(
    beatmap: Beatmap,
    storyboard: Storyboard,
    warnings: &mut Vec<ChartParseWarning>,
) -> ManiaChart {
    let mut hit_objects = Vec::with_capacity(beatmap.hit_objects.len());
    for object in &beatmap.hit_objects {
        let start_time = object.start_time as i32;
        match &object.kind {
            BeatmapObjectKind::Circle(circle) => hit_objects.push(HitObject {
                x: circle.pos.x as i32,
                y: circle.pos.y as i32,
                start_time,
                end_time: start_time,
                kind: HitObjectKind::Circle,
            }),
            BeatmapObjectKind::Hold(hold) => hit_objects.push(HitObject {
                x: hold.pos_x as i32,
                y: HitObject::CONVERTED_Y,
                start_time,
                end_time: (object.start_time + hold.duration) as i32,
                kind: HitObjectKind::Hold,
            }),
            _ => warnings.push(ChartParseWarning::UnsupportedObject { time: start_time }),
        }
    }

    ManiaChart {
        version: beatmap.format_version,
        general: GeneralSection {
            audio_filename: beatmap.audio_file,
            audio_lead_in: beatmap.audio_lead_in as i32,
            preview_time: beatmap.preview_time,
            countdown: beatmap.countdown,
            stack_leniency: beatmap.stack_leniency,
            mode: beatmap.mode,
            letterbox_in_breaks: beatmap.letterbox_in_breaks,
            special_style: beatmap.special_style,
            widescreen_storyboard: beatmap.widescreen_storyboard,
        },
        editor: EditorSection {
            distance_spacing: beatmap.distance_spacing,
            beat_divisor: beatmap.beat_divisor,
            grid_size: beatmap.grid_size,
            timeline_zoom: beatmap.timeline_zoom,
        },
        metadata: MetadataSection {
            title: beatmap.title,
            title_unicode: beatmap.title_unicode,
            artist: beatmap.artist,
            artist_unicode: beatmap.artist_unicode,
            creator: beatmap.creator,
            version: beatmap.version,
            source: beatmap.source,
            tags: beatmap.tags.split_whitespace().map(String::from).collect(),
            beatmap_id: beatmap.beatmap_id,
            beatmap_set_id: beatmap.beatmap_set_id,
        },
        difficulty: DifficultySection {
            hp_drain_rate: beatmap.hp_drain_rate,
            circle_size: beatmap.circle_size,
            overall_difficulty: beatmap.overall_difficulty,
            approach_rate: beatmap.approach_rate,
            slider_multiplier: beatmap.slider_multiplier,
            slider_tick_rate: beatmap.slider_tick_rate,
        },
        events: EventsSection {
            background_image: beatmap.background_file,
            storyboard,
        },
        timing_points: beatmap
            .control_points
            .timing_points
            .iter()
            .map(|point| TimingPoint {
                time: point.time,
                beat_length: point.beat_len,
            })
            .collect(),
        hit_objects,
    }
}

/// Reader of the sprite lines of `[Events]`.
#[derive(Default)]
struct StoryboardParser {
    storyboard: Storyboard,
    warnings: Vec<ChartParseWarning>,
    /// Sprite receiving the following command lines.
    current_sprite: Option<(Layer, usize)>,
}

impl StoryboardParser {
    fn warn_invalid(&mut self, value: &str, line: usize) {
        self.warnings.push(ChartParseWarning::InvalidValue {
            value: value.to_string(),
            line,
        });
    }

    fn parse_or_warn<T: FromStr>(&mut self, value: &str, line: usize) -> Option<T> {
        let parsed = value.trim().parse().ok();
        if parsed.is_none() {
            self.warn_invalid(value, line);
        }
        parsed
    }

    fn event(&mut self, content: &str, line: usize) {
        let command = content.trim_start_matches([' ', '_']);
        let depth = content.len() - command.len();
        if depth > 0 {
            self.command(command, depth, line);
            return;
        }
        self.current_sprite = None;

        let fields: Vec<&str> = content.split(',').map(str::trim).collect();
        match fields.as_slice() {
            ["Sprite" | "4", layer, origin, path, rest @ ..] => {
                let layer = match *layer {
                    "Background" | "0" => Layer::Background,
                    "Foreground" | "3" => Layer::Foreground,
                    _ => {
                        self.unsupported(content, line);
                        return;
                    }
                };
                let origin = origin.parse::<Origin>().unwrap_or_else(|()| {
                    self.warn_invalid(origin, line);
                    Origin::default()
                });
                let mut sprite = StoryboardSprite::new(origin, unquote(path));
                if let [x, y, ..] = rest {
                    if let Some(x) = self.parse_or_warn::<f64>(x, line) {
                        sprite.x = x;
                    }
                    if let Some(y) = self.parse_or_warn::<f64>(y, line) {
                        sprite.y = y;
                    }
                }
                let sprites = self.storyboard.layer_mut(layer);
                sprites.push(sprite);
                self.current_sprite = Some((layer, sprites.len() - 1));
            }
            ["0" | "Background" | "1" | "Video" | "2" | "Break" | "3", ..] => {}
            _ => self.unsupported(content, line),
        }
    }

    fn command(&mut self, content: &str, depth: usize, line: usize) {
        let Some((layer, index)) = self.current_sprite else {
            // Commands of an element that is not modelled, such as an animation.
            return;
        };
        let fields: Vec<&str> = content.splitn(5, ',').collect();
        let (code, easing, start, end, params) = match fields.as_slice() {
            [code, easing, start, end, params] => (*code, *easing, *start, *end, *params),
            [code, easing, start, end] => (*code, *easing, *start, *end, ""),
            _ => {
                self.unsupported(content, line);
                return;
            }
        };
        if depth > 1 || matches!(code, "L" | "T") {
            self.unsupported(content, line);
            return;
        }
        let Some(easing) = self.parse_or_warn::<u8>(easing, line) else {
            return;
        };
        let Some(start_time) = self.parse_or_warn::<f64>(start, line) else {
            return;
        };
        let start_time = start_time as i32;
        let end_time = if end.trim().is_empty() {
            start_time
        } else {
            match self.parse_or_warn::<f64>(end, line) {
                Some(end) => end as i32,
                None => return,
            }
        };
        let command = Command {
            code: code.to_string(),
            easing,
            start_time,
            end_time,
            params: params.to_string(),
        };
        if let Some(sprite) = self.storyboard.layer_mut(layer).get_mut(index) {
            sprite.commands.push(command);
        }
    }

    fn unsupported(&mut self, content: &str, line: usize) {
        self.warnings.push(ChartParseWarning::UnsupportedStoryboard {
            content: content.to_string(),
            line,
        });
    }
}

fn unquote(path: &str) -> &str {
    path.trim().trim_matches('"')
}

/// Base name of the chart's background image, empty when it has none.
#[must_use]
pub fn background_file_name(chart: &ManiaChart) -> &str {
    file_name(&chart.events.background_image)
}
