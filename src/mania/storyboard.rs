//! Storyboard part of the `[Events]` section.
//!
//! Only sprites on the `Background` and `Foreground` layers take part in the conversion. Each sprite
//! carries the commands that were written directly below it; commands nested in loops or triggers are
//! not modelled.

use std::{fmt, str::FromStr};

/// Anchor point of a sprite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum Origin {
    TopLeft,
    TopCentre,
    TopRight,
    CentreLeft,
    #[default]
    Centre,
    CentreRight,
    BottomLeft,
    BottomCentre,
    BottomRight,
}

impl Origin {
    const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCentre,
        Self::TopRight,
        Self::CentreLeft,
        Self::Centre,
        Self::CentreRight,
        Self::BottomLeft,
        Self::BottomCentre,
        Self::BottomRight,
    ];

    /// Name used in chart files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "TopLeft",
            Self::TopCentre => "TopCentre",
            Self::TopRight => "TopRight",
            Self::CentreLeft => "CentreLeft",
            Self::Centre => "Centre",
            Self::CentreRight => "CentreRight",
            Self::BottomLeft => "BottomLeft",
            Self::BottomCentre => "BottomCentre",
            Self::BottomRight => "BottomRight",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Origin {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Old charts write the numeric index instead of the name.
        if let Ok(index) = s.parse::<usize>() {
            return Self::ALL.get(index).copied().ok_or(());
        }
        Self::ALL
            .into_iter()
            .find(|origin| origin.name() == s)
            .ok_or(())
    }
}

/// Storyboard layer of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Drawn behind the playfield.
    Background,
    /// Drawn in front of the playfield.
    Foreground,
}

impl Layer {
    /// Name used in chart files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Background => "Background",
            Self::Foreground => "Foreground",
        }
    }
}

/// A timed transformation applied to a sprite, e.g. ` F,0,1000,2000,0,1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command code such as `F`, `M` or `C`.
    pub code: String,
    /// Easing index.
    pub easing: u8,
    /// Start time in milliseconds.
    pub start_time: i32,
    /// End time in milliseconds. Equal to `start_time` for instantaneous commands.
    pub end_time: i32,
    /// Remaining comma separated parameters, verbatim.
    pub params: String,
}

impl Command {
    /// A colour command that keeps the sprite white from `start_time` to `end_time`.
    ///
    /// It changes nothing visually; it only delimits when the sprite is shown.
    #[must_use]
    pub fn visibility(start_time: i32, end_time: i32) -> Self {
        Self {
            code: "C".into(),
            easing: 0,
            start_time,
            end_time,
            params: "255,255,255,255,255,255".into(),
        }
    }
}

/// A static image on the storyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryboardSprite {
    /// Anchor of the image.
    pub origin: Origin,
    /// Image path relative to the chart directory.
    pub path: String,
    /// Horizontal position in storyboard pixels.
    pub x: f64,
    /// Vertical position in storyboard pixels.
    pub y: f64,
    /// Commands in file order.
    pub commands: Vec<Command>,
}

impl StoryboardSprite {
    /// Centre of the 640x480 storyboard canvas.
    pub const CANVAS_CENTRE: (f64, f64) = (320.0, 240.0);

    /// Creates a sprite at the centre of the canvas without commands.
    pub fn new(origin: Origin, path: impl Into<String>) -> Self {
        let (x, y) = Self::CANVAS_CENTRE;
        Self {
            origin,
            path: path.into(),
            x,
            y,
            commands: Vec::new(),
        }
    }
}

/// The two storyboard layers the conversion works with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Storyboard {
    /// Sprites behind the playfield, in file order.
    pub background: Vec<StoryboardSprite>,
    /// Sprites in front of the playfield, in file order.
    pub foreground: Vec<StoryboardSprite>,
}

impl Storyboard {
    /// Sprites of `layer`.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &[StoryboardSprite] {
        match layer {
            Layer::Background => &self.background,
            Layer::Foreground => &self.foreground,
        }
    }

    /// Mutable sprites of `layer`.
    pub fn layer_mut(&mut self, layer: Layer) -> &mut Vec<StoryboardSprite> {
        match layer {
            Layer::Background => &mut self.background,
            Layer::Foreground => &mut self.foreground,
        }
    }

    /// Whether neither layer has a sprite.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.background.is_empty() && self.foreground.is_empty()
    }
}
