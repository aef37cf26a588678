//! Locations and exits (§3 Data model: Location, Exit, ExitInfo).

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::ids::LocationId;

/// A directed edge rooted at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub direction: Direction,
    pub to_location_id: LocationId,
    pub description: Option<String>,
    pub kind: Option<String>,
}

/// A location in the world graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    /// Monotonic revision, incremented only when `name` or `description`
    /// change (exit mutations do not bump it).
    pub version: u64,
    /// Always stored and returned in canonical exit order.
    pub exits: Vec<Exit>,
    /// Regenerated on every mutation of `exits`; `None` only before the
    /// first mutation has ever run.
    pub exits_summary_cache: Option<String>,
    pub exit_availability: Option<ExitAvailabilityMetadata>,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            version: 1,
            exits: Vec::new(),
            exits_summary_cache: None,
            exit_availability: None,
        }
    }

    /// Sort `exits` into canonical order: cardinal, intercardinal,
    /// vertical, radial, with alphabetical tie-break on any future
    /// semantic extras (there are none among the 12 canonical tokens, so
    /// in practice this is a stable sort on `Direction::sort_rank`).
    pub fn sort_exits_canonical(exits: &mut [Exit]) {
        exits.sort_by(|a, b| {
            a.direction
                .sort_rank()
                .cmp(&b.direction.sort_rank())
                .then_with(|| a.direction.as_str().cmp(b.direction.as_str()))
        });
    }

    /// Regenerate `exits_summary_cache` from the current (already sorted)
    /// `exits`. Format: `"Exits: <dir>, <dir>, …"` or `"No exits
    /// available."`; descriptions are never included.
    pub fn regenerate_exits_summary(&mut self) {
        if self.exits.is_empty() {
            self.exits_summary_cache = Some("No exits available.".to_string());
            return;
        }
        let tokens: Vec<&str> = self.exits.iter().map(|e| e.direction.as_str()).collect();
        self.exits_summary_cache = Some(format!("Exits: {}", tokens.join(", ")));
    }
}

/// Availability classification for a direction at a location (§3 ExitInfo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitAvailability {
    Hard,
    Pending,
    Forbidden,
}

/// Out-of-band hints layered onto a location's exits: directions that are
/// known to be generatable (`pending`) or explicitly blocked
/// (`forbidden`), neither of which yet have a hard edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitAvailabilityMetadata {
    pub pending: Vec<Direction>,
    pub forbidden: Vec<Direction>,
}

/// The outward contract for a single direction at a location (§3 ExitInfo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    pub direction: Direction,
    pub availability: ExitAvailability,
    pub to_location_id: Option<LocationId>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit(dir: Direction, to: LocationId) -> Exit {
        Exit {
            direction: dir,
            to_location_id: to,
            description: None,
            kind: None,
        }
    }

    #[test]
    fn summary_cache_lists_directions_only_in_canonical_order() {
        let to = LocationId::new();
        let mut loc = Location::new(LocationId::new(), "Room", "A room.");
        loc.exits = vec![exit(Direction::Down, to), exit(Direction::North, to)];
        Location::sort_exits_canonical(&mut loc.exits);
        loc.regenerate_exits_summary();
        assert_eq!(loc.exits_summary_cache.as_deref(), Some("Exits: north, down"));
    }

    #[test]
    fn summary_cache_reports_no_exits() {
        let mut loc = Location::new(LocationId::new(), "Room", "A room.");
        loc.regenerate_exits_summary();
        assert_eq!(loc.exits_summary_cache.as_deref(), Some("No exits available."));
    }
}
