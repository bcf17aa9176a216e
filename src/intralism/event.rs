//! Intralism events.
//!
//! On disk an event is a time in seconds plus a pair of strings, the kind tag and a comma separated
//! payload:
//!
//! ```json
//! { "time": 1.25, "data": ["SpawnObj", "[Left-Right]"] }
//! { "time": 0.0, "data": ["ShowSprite", "bg.png,0,True,0,0,0"] }
//! { "time": 93.5, "data": ["MapEnd", "93.5"] }
//! ```
//!
//! [`Event`] keeps that wire shape so unknown kinds survive a read/write cycle untouched. All payload
//! parsing is done by [`Event::decode`] into the typed [`EventPayload`], and [`EventPayload::into_event`]
//! is its only writer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lane::{Lane, LaneMappingError, join_lanes, split_lanes};

/// Kind tag of note spawn events.
pub const SPAWN_OBJ: &str = "SpawnObj";
/// Kind tag of sprite events.
pub const SHOW_SPRITE: &str = "ShowSprite";
/// Kind tag of the map end marker.
pub const MAP_END: &str = "MapEnd";

/// An event as stored in `config.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Start time in seconds.
    pub time: f64,
    /// Kind tag followed by the payload.
    #[serde(default)]
    pub data: Vec<String>,
}

impl Event {
    /// Creates an event from its kind tag and raw payload.
    pub fn new(time: f64, kind: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            time,
            data: vec![kind.into(), payload.into()],
        }
    }

    /// The kind tag, or an empty string when `data` is empty.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.data.first().map_or("", String::as_str)
    }

    /// The raw payload, or an empty string when it is missing.
    #[must_use]
    pub fn payload(&self) -> &str {
        self.data.get(1).map_or("", String::as_str)
    }

    /// Whether the kind tag equals `kind` exactly.
    #[must_use]
    pub fn is_of_kind(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    /// First comma separated field of the payload: a sprite name or a bracketed lane list.
    #[must_use]
    pub fn inner_payload(&self) -> &str {
        self.payload().split(',').next().unwrap_or_default()
    }

    /// [`Self::inner_payload`] without its first and last character, i.e. `[Up-Down]` becomes `Up-Down`.
    #[must_use]
    pub fn trimmed_inner_payload(&self) -> &str {
        let mut chars = self.inner_payload().chars();
        chars.next();
        chars.next_back();
        chars.as_str()
    }

    /// Whether the second payload field is `0`, the sprite background layer.
    #[must_use]
    pub fn is_background_layer(&self) -> bool {
        self.payload().split(',').nth(1) == Some("0")
    }

    /// Parses the payload according to the kind tag.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] when a spawn or map end payload has the wrong shape. Sprite
    /// payloads never fail, see [`SpriteEvent`]. Unknown kinds never fail and decode into
    /// [`EventPayload::Other`].
    pub fn decode(&self) -> Result<EventPayload, EventDecodeError> {
        match self.kind() {
            SPAWN_OBJ => {
                let inner = self.inner_payload();
                if !(inner.starts_with('[') && inner.ends_with(']')) || inner.len() < 2 {
                    return Err(EventDecodeError::UnbracketedLanes(inner.to_string()));
                }
                let lanes = split_lanes(self.trimmed_inner_payload())?;
                Ok(EventPayload::SpawnNotes { lanes })
            }
            SHOW_SPRITE => Ok(EventPayload::ShowSprite(SpriteEvent::parse(self))),
            MAP_END => {
                let seconds = self.payload().trim();
                if seconds.is_empty() {
                    return Ok(EventPayload::MapEnd { seconds: None });
                }
                let seconds = seconds
                    .parse()
                    .map_err(|_| EventDecodeError::MalformedNumber(seconds.to_string()))?;
                Ok(EventPayload::MapEnd {
                    seconds: Some(seconds),
                })
            }
            kind => Ok(EventPayload::Other {
                kind: kind.to_string(),
                payload: self.payload().to_string(),
            }),
        }
    }
}

/// A payload that does not match the shape required by its kind tag.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum EventDecodeError {
    /// A spawn payload is not wrapped in `[` and `]`.
    #[error("spawn payload `{0}` is not a bracketed lane list")]
    UnbracketedLanes(String),
    /// A spawn payload names something that is not a lane.
    #[error(transparent)]
    Lane(#[from] LaneMappingError),
    /// A number field could not be parsed.
    #[error("`{0}` is not a number")]
    MalformedNumber(String),
}

/// The typed content of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// One or more notes sharing the event time, in payload order.
    SpawnNotes {
        /// Lanes to spawn.
        lanes: Vec<Lane>,
    },
    /// An image shown on the background or the foreground.
    ShowSprite(SpriteEvent),
    /// End of the map. `None` when the payload is empty.
    MapEnd {
        /// Total duration in seconds.
        seconds: Option<f64>,
    },
    /// Any other event, kept verbatim.
    Other {
        /// Kind tag.
        kind: String,
        /// Raw payload.
        payload: String,
    },
}

impl EventPayload {
    /// Kind tag of the payload.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::SpawnNotes { .. } => SPAWN_OBJ,
            Self::ShowSprite(_) => SHOW_SPRITE,
            Self::MapEnd { .. } => MAP_END,
            Self::Other { kind, .. } => kind,
        }
    }

    /// Encodes the payload into its wire form at `time` seconds.
    #[must_use]
    pub fn into_event(self, time: f64) -> Event {
        let payload = match &self {
            Self::SpawnNotes { lanes } => format!("[{}]", join_lanes(lanes)),
            Self::ShowSprite(sprite) => sprite.to_string(),
            Self::MapEnd { seconds } => seconds.map(|s| s.to_string()).unwrap_or_default(),
            Self::Other { payload, .. } => payload.clone(),
        };
        Event::new(time, self.kind(), payload)
    }
}

/// Layer a sprite is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpriteLayer {
    /// Behind the playfield, encoded as `0`.
    #[default]
    Background,
    /// In front of the playfield, encoded as `1`.
    Foreground,
}

impl SpriteLayer {
    const fn code(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Foreground => 1,
        }
    }
}

/// Parameters of a `ShowSprite` event: `name,layer,keepAspectRatio,duration,fadeIn,fadeOut`.
///
/// Durations are in milliseconds. A duration of `0` keeps the sprite until it is replaced.
///
/// Decoding is lenient: only the name is required, any layer but `0` is the foreground, and
/// missing or unreadable fields take the values of [`SpriteEvent::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteEvent {
    /// Name of the level resource to show.
    pub name: String,
    /// Drawing layer.
    pub layer: SpriteLayer,
    /// Whether the image keeps its aspect ratio when stretched.
    pub keep_aspect_ratio: bool,
    /// How long the sprite stays visible.
    pub duration: f64,
    /// Fade in length.
    pub fade_in: f64,
    /// Fade out length.
    pub fade_out: f64,
}

impl SpriteEvent {
    /// A sprite with the default parameters: aspect kept, open ended, no fades.
    pub fn new(name: impl Into<String>, layer: SpriteLayer) -> Self {
        Self {
            name: name.into(),
            layer,
            keep_aspect_ratio: true,
            duration: 0.0,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    fn parse(event: &Event) -> Self {
        let layer = if event.is_background_layer() {
            SpriteLayer::Background
        } else {
            SpriteLayer::Foreground
        };
        let mut sprite = Self::new(event.inner_payload(), layer);
        let mut fields = event.payload().split(',').skip(2).map(str::trim);
        if fields
            .next()
            .is_some_and(|keep| keep.eq_ignore_ascii_case("false"))
        {
            sprite.keep_aspect_ratio = false;
        }
        for value in [&mut sprite.duration, &mut sprite.fade_in, &mut sprite.fade_out] {
            if let Some(number) = fields.next().and_then(|field| field.parse().ok()) {
                *value = number;
            }
        }
        sprite
    }
}

impl fmt::Display for SpriteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Booleans are capitalised, as the game reads them with .NET's bool parser.
        write!(
            f,
            "{},{},{},{},{},{}",
            self.name,
            self.layer.code(),
            if self.keep_aspect_ratio {
                "True"
            } else {
                "False"
            },
            self.duration,
            self.fade_in,
            self.fade_out
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_comma_fields() {
        let spawn = Event::new(1.5, SPAWN_OBJ, "[Left-Right]");
        assert!(spawn.is_of_kind(SPAWN_OBJ));
        assert!(!spawn.is_of_kind("spawnobj"));
        assert_eq!(spawn.inner_payload(), "[Left-Right]");
        assert_eq!(spawn.trimmed_inner_payload(), "Left-Right");

        let sprite = Event::new(0.0, SHOW_SPRITE, "bg.png,0,True,0,0,0");
        assert_eq!(sprite.inner_payload(), "bg.png");
        assert!(sprite.is_background_layer());
        let front = Event::new(0.0, SHOW_SPRITE, "fg.png,1,True,0,0,0");
        assert!(!front.is_background_layer());
    }

    #[test]
    fn accessors_tolerate_short_data() {
        let event = Event {
            time: 0.0,
            data: vec![],
        };
        assert_eq!(event.kind(), "");
        assert_eq!(event.payload(), "");
        assert_eq!(event.trimmed_inner_payload(), "");
        assert!(!event.is_background_layer());
    }

    #[test]
    fn decodes_spawn() {
        let event = Event::new(0.25, SPAWN_OBJ, "[Up]");
        assert_eq!(
            event.decode(),
            Ok(EventPayload::SpawnNotes {
                lanes: vec![Lane::Up]
            })
        );
        assert_eq!(
            Event::new(0.0, SPAWN_OBJ, "Up").decode(),
            Err(EventDecodeError::UnbracketedLanes("Up".into()))
        );
        assert_eq!(
            Event::new(0.0, SPAWN_OBJ, "[Up-Centre]").decode(),
            Err(EventDecodeError::Lane(LaneMappingError::UnknownName(
                "Centre".into()
            )))
        );
    }

    #[test]
    fn decodes_sprite() {
        let event = Event::new(3.0, SHOW_SPRITE, "flash.png,1,false,2.5,0.5,0");
        let EventPayload::ShowSprite(sprite) = event.decode().unwrap() else {
            panic!("expected a sprite");
        };
        assert_eq!(sprite.name, "flash.png");
        assert_eq!(sprite.layer, SpriteLayer::Foreground);
        assert!(!sprite.keep_aspect_ratio);
        assert_eq!(sprite.duration, 2.5);
        assert_eq!(sprite.fade_in, 0.5);

        assert_eq!(
            Event::new(0.0, SHOW_SPRITE, "bg.png,0").decode(),
            Ok(EventPayload::ShowSprite(SpriteEvent::new(
                "bg.png",
                SpriteLayer::Background
            )))
        );
    }

    #[test]
    fn short_or_odd_sprites_take_defaults() {
        let decode = |payload: &str| match Event::new(0.0, SHOW_SPRITE, payload).decode() {
            Ok(EventPayload::ShowSprite(sprite)) => sprite,
            other => panic!("expected a sprite, got {other:?}"),
        };
        assert_eq!(
            decode("logo.png"),
            SpriteEvent::new("logo.png", SpriteLayer::Foreground)
        );
        let odd = decode("fx.png,2,maybe,long,0.5");
        assert_eq!(odd.layer, SpriteLayer::Foreground);
        assert!(odd.keep_aspect_ratio);
        assert_eq!(odd.duration, 0.0);
        assert_eq!(odd.fade_in, 0.5);
        assert_eq!(odd.fade_out, 0.0);
    }

    #[test]
    fn decodes_map_end() {
        assert_eq!(
            Event::new(90.0, MAP_END, "90.5").decode(),
            Ok(EventPayload::MapEnd {
                seconds: Some(90.5)
            })
        );
        assert_eq!(
            Event::new(90.0, MAP_END, "").decode(),
            Ok(EventPayload::MapEnd { seconds: None })
        );
        assert_eq!(
            Event::new(90.0, MAP_END, "soon").decode(),
            Err(EventDecodeError::MalformedNumber("soon".into()))
        );
    }

    #[test]
    fn unknown_kinds_are_kept() {
        let event = Event::new(4.0, "SetSpeed", "30");
        let payload = event.decode().unwrap();
        assert_eq!(payload.clone().into_event(4.0), event);
        assert_eq!(payload.kind(), "SetSpeed");
    }

    #[test]
    fn encodes_wire_form() {
        let spawn = EventPayload::SpawnNotes {
            lanes: vec![Lane::Left, Lane::Right],
        }
        .into_event(0.1);
        assert_eq!(spawn.data, vec!["SpawnObj", "[Left-Right]"]);

        let mut sprite = SpriteEvent::new("bg.png", SpriteLayer::Background);
        sprite.duration = 1.5;
        let sprite = EventPayload::ShowSprite(sprite).into_event(2.0);
        assert_eq!(sprite.data, vec!["ShowSprite", "bg.png,0,True,1.5,0,0"]);
    }
}
