//! The osu!mania chart (`.osu`) model.
//!
//! The model covers what the conversion reads and writes: the `[General]`, `[Editor]`,
//! `[Metadata]` and `[Difficulty]` key-value sections, the background image and storyboard sprites of
//! `[Events]`, the uninherited `[TimingPoints]` and the notes of `[HitObjects]`. Everything else is
//! dropped on decode.
//!
//! - [`parse`] decodes chart text into a [`ManiaChart`], collecting non-fatal issues as warnings.
//! - [`unparse`] encodes a [`ManiaChart`] back into chart text.
//! - [`storyboard`] models the sprites of the events section.
//!
//! Both directions go through [`rosu_map::Beatmap`] for everything but the storyboard, which
//! `rosu_map` does not model.

pub mod parse;
pub mod storyboard;
pub mod unparse;

pub use rosu_map::section::general::{CountdownType, GameMode};

use self::storyboard::Storyboard;

/// `[General]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralSection {
    /// Audio file relative to the chart directory.
    pub audio_filename: String,
    /// Silence before the audio starts, in milliseconds.
    pub audio_lead_in: i32,
    /// Where the song select preview starts, in milliseconds. `-1` for none.
    pub preview_time: i32,
    /// Countdown played before the first object.
    pub countdown: CountdownType,
    /// Stacking threshold multiplier.
    pub stack_leniency: f32,
    /// Game mode.
    pub mode: GameMode,
    /// Whether breaks are letterboxed.
    pub letterbox_in_breaks: bool,
    /// Whether the special N+1 style is used.
    pub special_style: bool,
    /// Whether the storyboard is widescreen.
    pub widescreen_storyboard: bool,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            audio_filename: String::new(),
            audio_lead_in: 0,
            preview_time: -1,
            countdown: CountdownType::None,
            stack_leniency: 0.7,
            mode: GameMode::Osu,
            letterbox_in_breaks: false,
            special_style: false,
            widescreen_storyboard: false,
        }
    }
}

/// `[Editor]` section.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct EditorSection {
    pub distance_spacing: f64,
    pub beat_divisor: i32,
    pub grid_size: i32,
    pub timeline_zoom: f64,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            distance_spacing: 1.0,
            beat_divisor: 4,
            grid_size: 4,
            timeline_zoom: 1.0,
        }
    }
}

/// `[Metadata]` section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataSection {
    /// Romanised title.
    pub title: String,
    /// Title in its original script.
    pub title_unicode: String,
    /// Romanised artist.
    pub artist: String,
    /// Artist in its original script.
    pub artist_unicode: String,
    /// Who made the chart.
    pub creator: String,
    /// Difficulty name.
    pub version: String,
    /// Where the song comes from.
    pub source: String,
    /// Search terms.
    pub tags: Vec<String>,
    /// Online id of the difficulty.
    pub beatmap_id: i32,
    /// Online id of the set.
    pub beatmap_set_id: i32,
}

/// `[Difficulty]` section.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct DifficultySection {
    pub hp_drain_rate: f32,
    /// Key count in mania.
    pub circle_size: f32,
    pub overall_difficulty: f32,
    pub approach_rate: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Default for DifficultySection {
    fn default() -> Self {
        Self {
            hp_drain_rate: 5.0,
            circle_size: 5.0,
            overall_difficulty: 5.0,
            approach_rate: 5.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
        }
    }
}

/// `[Events]` section, reduced to the background and the storyboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventsSection {
    /// Background image relative to the chart directory. Empty when the chart has none.
    pub background_image: String,
    /// Storyboard sprites.
    pub storyboard: Storyboard,
}

/// An uninherited line of `[TimingPoints]`, the one carrying a tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingPoint {
    /// Start time in milliseconds.
    pub time: f64,
    /// Milliseconds per beat.
    pub beat_length: f64,
}

impl TimingPoint {
    /// A timing point at `time` with `bpm`.
    #[must_use]
    pub fn with_bpm(time: f64, bpm: f64) -> Self {
        Self {
            time,
            beat_length: 60_000.0 / bpm,
        }
    }
}

/// Kind of a hit object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitObjectKind {
    /// A single tap.
    Circle,
    /// A mania hold note.
    Hold,
}

/// A note of `[HitObjects]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitObject {
    /// Horizontal position; the column in mania.
    pub x: i32,
    /// Vertical position, unused in mania.
    pub y: i32,
    /// Start time in milliseconds.
    pub start_time: i32,
    /// End time in milliseconds. Equal to `start_time` for circles.
    pub end_time: i32,
    /// Object kind.
    pub kind: HitObjectKind,
}

impl HitObject {
    /// Vertical position given to converted notes.
    pub const CONVERTED_Y: i32 = 192;

    /// A plain note at `x` and `time`.
    #[must_use]
    pub const fn circle(x: i32, time: i32) -> Self {
        Self {
            x,
            y: Self::CONVERTED_Y,
            start_time: time,
            end_time: time,
            kind: HitObjectKind::Circle,
        }
    }
}

/// An osu! chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManiaChart {
    /// File format version.
    pub version: i32,
    /// `[General]`.
    pub general: GeneralSection,
    /// `[Editor]`.
    pub editor: EditorSection,
    /// `[Metadata]`.
    pub metadata: MetadataSection,
    /// `[Difficulty]`.
    pub difficulty: DifficultySection,
    /// `[Events]`.
    pub events: EventsSection,
    /// Uninherited `[TimingPoints]` in file order.
    pub timing_points: Vec<TimingPoint>,
    /// `[HitObjects]` in file order.
    pub hit_objects: Vec<HitObject>,
}

impl ManiaChart {
    /// Format version of converted charts.
    pub const FORMAT_VERSION: i32 = 14;
    /// Tempo of the single timing point of converted charts.
    pub const TEMPLATE_BPM: f64 = 120.0;

    /// The fixed frame every chart converted from Intralism starts from: 4K mania with default
    /// difficulty settings and one 120 BPM timing point, no metadata and no objects.
    #[must_use]
    pub fn intralism_template() -> Self {
        Self {
            version: Self::FORMAT_VERSION,
            general: GeneralSection {
                mode: GameMode::Mania,
                ..GeneralSection::default()
            },
            editor: EditorSection {
                timeline_zoom: 2.4,
                ..EditorSection::default()
            },
            metadata: MetadataSection {
                creator: "IntralismToolCollection".into(),
                version: "IntralismConvert".into(),
                source: "Intralism".into(),
                ..MetadataSection::default()
            },
            difficulty: DifficultySection {
                circle_size: 4.0,
                ..DifficultySection::default()
            },
            events: EventsSection::default(),
            timing_points: vec![TimingPoint::with_bpm(0.0, Self::TEMPLATE_BPM)],
            hit_objects: Vec::new(),
        }
    }

    /// Shifts every hit object by `offset` milliseconds, start and end alike.
    pub fn apply_offset(&mut self, offset: i32) {
        for object in &mut self.hit_objects {
            object.start_time = object.start_time.saturating_add(offset);
            object.end_time = object.end_time.saturating_add(offset);
        }
    }

    /// Conventional file name of a converted chart: `{Artist} - {Title} [Intralism].osu`.
    ///
    /// Characters that cannot appear in a file name are replaced with `_`.
    #[must_use]
    pub fn converted_file_name(&self) -> String {
        format!(
            "{} - {} [Intralism].osu",
            self.metadata.artist, self.metadata.title
        )
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
    }
}
