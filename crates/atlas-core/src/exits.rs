//! Exit Availability Model (C2, §4.2).

use atlas_types::{Direction, Exit, ExitAvailability, ExitAvailabilityMetadata, ExitInfo, Location};

/// A non-fatal signal that a direction was simultaneously described as
/// `hard` and `pending`/`forbidden` by stale metadata. Surfaced to the
/// caller as a warning, never as an error (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIntegrityWarning {
    pub direction: Direction,
    pub message: String,
}

/// Result of classifying a single direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityResult {
    pub availability: Option<ExitAvailability>,
    pub warning: Option<DataIntegrityWarning>,
}

/// Determine the availability of `direction` at a location, given its hard
/// `exits` and any `pending`/`forbidden` metadata. Precedence: hard >
/// forbidden > pending. Returns `availability: None` if the direction is
/// absent from all three sets.
pub fn determine_exit_availability(
    direction: Direction,
    exits: &[Exit],
    metadata: Option<&ExitAvailabilityMetadata>,
) -> AvailabilityResult {
    let is_hard = exits.iter().any(|e| e.direction == direction);
    let is_forbidden = metadata.map_or(false, |m| m.forbidden.contains(&direction));
    let is_pending = metadata.map_or(false, |m| m.pending.contains(&direction));

    if is_hard {
        let warning = if is_forbidden || is_pending {
            Some(DataIntegrityWarning {
                direction,
                message: format!(
                    "direction {direction} is both a hard exit and marked {} in metadata",
                    if is_forbidden { "forbidden" } else { "pending" }
                ),
            })
        } else {
            None
        };
        return AvailabilityResult {
            availability: Some(ExitAvailability::Hard),
            warning,
        };
    }

    if is_forbidden {
        return AvailabilityResult {
            availability: Some(ExitAvailability::Forbidden),
            warning: None,
        };
    }

    if is_pending {
        return AvailabilityResult {
            availability: Some(ExitAvailability::Pending),
            warning: None,
        };
    }

    AvailabilityResult {
        availability: None,
        warning: None,
    }
}

/// Build the full `ExitInfo` array for a location: the union of hard,
/// pending, and forbidden directions, sorted into canonical exit order
/// (§3 Exit). Also returns any data-integrity warnings collected along
/// the way.
pub fn build_exit_info_array(location: &Location) -> (Vec<ExitInfo>, Vec<DataIntegrityWarning>) {
    let mut candidates: Vec<Direction> = location.exits.iter().map(|e| e.direction).collect();
    if let Some(meta) = &location.exit_availability {
        for d in meta.pending.iter().chain(meta.forbidden.iter()) {
            if !candidates.contains(d) {
                candidates.push(*d);
            }
        }
    }
    candidates.sort_by_key(|d| d.sort_rank());
    candidates.dedup();

    let mut infos = Vec::with_capacity(candidates.len());
    let mut warnings = Vec::new();

    for direction in candidates {
        let result = determine_exit_availability(
            direction,
            &location.exits,
            location.exit_availability.as_ref(),
        );
        let Some(availability) = result.availability else {
            continue;
        };
        if let Some(w) = result.warning {
            warnings.push(w);
        }
        let to_location_id = if availability == ExitAvailability::Hard {
            location
                .exits
                .iter()
                .find(|e| e.direction == direction)
                .map(|e| e.to_location_id)
        } else {
            None
        };
        infos.push(ExitInfo {
            direction,
            availability,
            to_location_id,
            reason: None,
        });
    }

    (infos, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::LocationId;

    fn hard_exit(dir: Direction, to: LocationId) -> Exit {
        Exit {
            direction: dir,
            to_location_id: to,
            description: None,
            kind: None,
        }
    }

    #[test]
    fn hard_exit_wins_over_conflicting_metadata_and_warns() {
        let to = LocationId::new();
        let exits = vec![hard_exit(Direction::North, to)];
        let meta = ExitAvailabilityMetadata {
            pending: vec![],
            forbidden: vec![Direction::North],
        };
        let result = determine_exit_availability(Direction::North, &exits, Some(&meta));
        assert_eq!(result.availability, Some(ExitAvailability::Hard));
        assert!(result.warning.is_some());
    }

    #[test]
    fn forbidden_beats_pending_when_both_present() {
        let meta = ExitAvailabilityMetadata {
            pending: vec![Direction::East],
            forbidden: vec![Direction::East],
        };
        let result = determine_exit_availability(Direction::East, &[], Some(&meta));
        assert_eq!(result.availability, Some(ExitAvailability::Forbidden));
    }

    #[test]
    fn absent_direction_has_no_availability() {
        let result = determine_exit_availability(Direction::Up, &[], None);
        assert_eq!(result.availability, None);
    }

    #[test]
    fn build_exit_info_array_has_no_duplicate_directions_and_is_sorted() {
        let to = LocationId::new();
        let mut loc = Location::new(LocationId::new(), "Room", "desc");
        loc.exits = vec![hard_exit(Direction::South, to), hard_exit(Direction::North, to)];
        loc.exit_availability = Some(ExitAvailabilityMetadata {
            pending: vec![Direction::In],
            forbidden: vec![Direction::Up],
        });
        let (infos, _warnings) = build_exit_info_array(&loc);

        let mut seen = std::collections::HashSet::new();
        for info in &infos {
            assert!(seen.insert(info.direction), "duplicate direction in output");
        }

        let mut sorted = infos.clone();
        sorted.sort_by_key(|i| i.direction.sort_rank());
        assert_eq!(infos, sorted);

        assert_eq!(infos.len(), 4); // north, south, up(forbidden), in(pending)
    }

    #[test]
    fn pending_and_forbidden_never_carry_a_destination() {
        let mut loc = Location::new(LocationId::new(), "Room", "desc");
        loc.exit_availability = Some(ExitAvailabilityMetadata {
            pending: vec![Direction::In],
            forbidden: vec![Direction::Up],
        });
        let (infos, _) = build_exit_info_array(&loc);
        for info in infos {
            if info.availability != ExitAvailability::Hard {
                assert!(info.to_location_id.is_none());
            }
        }
    }
}
