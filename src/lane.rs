//! Mapping between osu!mania 4K columns and Intralism lanes.
//!
//! A 4K mania chart places its columns at fixed X-coordinates of the 512px wide playfield. Intralism
//! names the same four positions `Left`, `Up`, `Down` and `Right`. The mapping is a plain lookup
//! table; any other X-coordinate is not a lane.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Separator between lane names in a spawn payload, e.g. `Left-Right`.
pub const LANE_SEPARATOR: &str = "-";

/// One of the four note positions shared by both formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lane {
    /// Leftmost column, X = 64.
    Left,
    /// Second column, X = 192.
    Up,
    /// Third column, X = 320.
    Down,
    /// Rightmost column, X = 448.
    Right,
}

/// A lane coordinate or name that does not belong to any of the four lanes.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum LaneMappingError {
    /// The hit object X-coordinate is not a 4K column.
    #[error("x coordinate {0} is not one of the lane columns 64, 192, 320 or 448")]
    UnknownX(i32),
    /// The token in a spawn payload is not a lane name.
    #[error("`{0}` is not a lane name")]
    UnknownName(String),
}

impl Lane {
    /// All lanes, left to right.
    pub const ALL: [Self; 4] = [Self::Left, Self::Up, Self::Down, Self::Right];

    /// X-coordinate of the lane on the mania playfield.
    #[must_use]
    pub const fn x(self) -> i32 {
        match self {
            Self::Left => 64,
            Self::Up => 192,
            Self::Down => 320,
            Self::Right => 448,
        }
    }

    /// Finds the lane placed exactly at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`LaneMappingError::UnknownX`] for every coordinate other than the four columns.
    pub const fn from_x(x: i32) -> Result<Self, LaneMappingError> {
        match x {
            64 => Ok(Self::Left),
            192 => Ok(Self::Up),
            320 => Ok(Self::Down),
            448 => Ok(Self::Right),
            other => Err(LaneMappingError::UnknownX(other)),
        }
    }

    /// Name of the lane as written in Intralism payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lane {
    type Err = LaneMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lane| lane.name() == s)
            .ok_or_else(|| LaneMappingError::UnknownName(s.to_string()))
    }
}

impl TryFrom<i32> for Lane {
    type Error = LaneMappingError;

    fn try_from(x: i32) -> Result<Self, Self::Error> {
        Self::from_x(x)
    }
}

impl From<Lane> for i32 {
    fn from(lane: Lane) -> Self {
        lane.x()
    }
}

/// Joins lanes into the dash separated form, e.g. `Left-Right`.
#[must_use]
pub fn join_lanes(lanes: &[Lane]) -> String {
    itertools::join(lanes, LANE_SEPARATOR)
}

/// Splits a dash separated lane list such as `Up-Down`.
///
/// # Errors
///
/// Fails on the first token that is not a lane name, including empty tokens.
pub fn split_lanes(source: &str) -> Result<Vec<Lane>, LaneMappingError> {
    source.split(LANE_SEPARATOR).map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_lane_round_trips_through_x() {
        for lane in Lane::ALL {
            assert_eq!(Lane::from_x(lane.x()), Ok(lane));
        }
    }

    #[test]
    fn rejects_coordinates_between_columns() {
        for x in [0, 63, 65, 256, 449, 512, -64] {
            assert_eq!(Lane::from_x(x), Err(LaneMappingError::UnknownX(x)));
        }
    }

    #[test]
    fn join_and_split() {
        let lanes = [Lane::Left, Lane::Right, Lane::Up];
        assert_eq!(join_lanes(&lanes), "Left-Right-Up");
        assert_eq!(
            join_lanes(&lanes),
            ["Left", "Right", "Up"].join(LANE_SEPARATOR)
        );
        assert_eq!(split_lanes("Left-Right-Up"), Ok(lanes.to_vec()));
        assert_eq!(split_lanes("Down"), Ok(vec![Lane::Down]));
    }

    #[test]
    fn split_rejects_unknown_names() {
        assert_eq!(
            split_lanes("Left-Middle"),
            Err(LaneMappingError::UnknownName("Middle".into()))
        );
        assert_eq!(
            split_lanes(""),
            Err(LaneMappingError::UnknownName(String::new()))
        );
        // Lane names are case sensitive, like the enum names they come from.
        assert!(split_lanes("left").is_err());
    }
}
