//! The closed direction vocabulary (§6 Direction tokens).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical direction. Exits, headings, and `ExitInfo` are all expressed
/// in terms of this closed set - there is no "other" variant, by design:
/// anything that doesn't parse into one of these is an `unknown` input, not
/// a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
    Up,
    Down,
    In,
    Out,
}

impl Direction {
    pub const ALL: [Direction; 12] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Northeast,
        Direction::Northwest,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Up,
        Direction::Down,
        Direction::In,
        Direction::Out,
    ];

    /// Parse a trimmed, lowercased token into a canonical direction.
    /// Returns `None` for anything outside the closed set (relative tokens
    /// included - those are handled separately by the direction normalizer).
    pub fn parse(token: &str) -> Option<Direction> {
        match token {
            "north" => Some(Direction::North),
            "south" => Some(Direction::South),
            "east" => Some(Direction::East),
            "west" => Some(Direction::West),
            "northeast" => Some(Direction::Northeast),
            "northwest" => Some(Direction::Northwest),
            "southeast" => Some(Direction::Southeast),
            "southwest" => Some(Direction::Southwest),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// The plane a direction belongs to, used both for canonical exit
    /// ordering and for deciding whether a relative term makes sense
    /// against a given heading (§4.1).
    pub fn plane(&self) -> DirectionPlane {
        match self {
            Direction::North
            | Direction::South
            | Direction::East
            | Direction::West
            | Direction::Northeast
            | Direction::Northwest
            | Direction::Southeast
            | Direction::Southwest => DirectionPlane::Compass,
            Direction::Up | Direction::Down => DirectionPlane::Vertical,
            Direction::In | Direction::Out => DirectionPlane::Radial,
        }
    }

    /// Position of this direction within the canonical exit sort order:
    /// cardinal, then intercardinal, then vertical, then radial.
    /// Ties within a group (there are none among the 12 canonical
    /// directions) would fall through to alphabetical on the token.
    pub fn sort_rank(&self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
            Direction::Northeast => 4,
            Direction::Northwest => 5,
            Direction::Southeast => 6,
            Direction::Southwest => 7,
            Direction::Up => 8,
            Direction::Down => 9,
            Direction::In => 10,
            Direction::Out => 11,
        }
    }

    /// The fixed opposite-direction table used by
    /// `ensureExitBidirectional` (§4.3) to create a reciprocal edge.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Northeast => Direction::Southwest,
            Direction::Southwest => Direction::Northeast,
            Direction::Northwest => Direction::Southeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }

    /// Rotate a compass direction by a multiple of 45 degrees, wrapping
    /// around the 8-point compass rose. Used to resolve `left`/`right`
    /// relative to a heading.
    pub fn rotate_compass(&self, eighths: i32) -> Option<Direction> {
        if self.plane() != DirectionPlane::Compass {
            return None;
        }
        const ROSE: [Direction; 8] = [
            Direction::North,
            Direction::Northeast,
            Direction::East,
            Direction::Southeast,
            Direction::South,
            Direction::Southwest,
            Direction::West,
            Direction::Northwest,
        ];
        let idx = ROSE.iter().position(|d| d == self)? as i32;
        let rotated = ((idx + eighths).rem_euclid(8)) as usize;
        Some(ROSE[rotated])
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which plane a direction moves through; governs the limited semantics
/// relative terms have against non-compass headings (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionPlane {
    Compass,
    Vertical,
    Radial,
}

/// A relative direction token, resolved against a player's last heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeToken {
    Left,
    Right,
    Forward,
    Back,
}

impl RelativeToken {
    pub fn parse(token: &str) -> Option<RelativeToken> {
        match token {
            "left" => Some(RelativeToken::Left),
            "right" => Some(RelativeToken::Right),
            "forward" => Some(RelativeToken::Forward),
            "back" => Some(RelativeToken::Back),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn rotate_compass_is_none_off_plane() {
        assert_eq!(Direction::Up.rotate_compass(2), None);
    }

    #[test]
    fn rotate_compass_right_90_from_west_is_north() {
        // right = +90 degrees = +2 eighths
        assert_eq!(Direction::West.rotate_compass(2), Some(Direction::North));
    }

    #[test]
    fn sort_rank_groups_cardinal_before_intercardinal_before_vertical_before_radial() {
        let mut all = Direction::ALL;
        all.sort_by_key(|d| d.sort_rank());
        assert_eq!(all[0], Direction::North);
        assert_eq!(all[4], Direction::Northeast);
        assert_eq!(all[8], Direction::Up);
        assert_eq!(all[10], Direction::In);
    }
}
