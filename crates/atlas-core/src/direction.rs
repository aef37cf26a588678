//! Direction Normalizer (C1, §4.1).
//!
//! Maps a raw, possibly relative, direction token to a canonical
//! [`Direction`], given an optional player heading. Pure function; no
//! state, no I/O.

use atlas_types::Direction;
pub use atlas_types::RelativeToken;

/// Result of normalizing a raw direction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Ok { canonical: Direction },
    Ambiguous { clarification: String },
    Unknown { clarification: String },
}

/// Normalize `raw` (not yet trimmed/lowercased) against an optional
/// `heading` (the player's last canonical direction, if any).
pub fn normalize_direction(raw: &str, heading: Option<Direction>) -> NormalizeOutcome {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        return NormalizeOutcome::Unknown {
            clarification: "no direction given".to_string(),
        };
    }

    if let Some(canonical) = Direction::parse(&token) {
        return NormalizeOutcome::Ok { canonical };
    }

    if let Some(relative) = RelativeToken::parse(&token) {
        return resolve_relative(relative, heading);
    }

    NormalizeOutcome::Unknown {
        clarification: format!("\"{token}\" is not a recognized direction"),
    }
}

fn resolve_relative(relative: RelativeToken, heading: Option<Direction>) -> NormalizeOutcome {
    let Some(heading) = heading else {
        return NormalizeOutcome::Ambiguous {
            clarification:
                "no heading yet; try a canonical direction such as north or south".to_string(),
        };
    };

    match relative {
        RelativeToken::Forward => NormalizeOutcome::Ok { canonical: heading },
        RelativeToken::Back => NormalizeOutcome::Ok {
            canonical: heading.opposite(),
        },
        RelativeToken::Left | RelativeToken::Right => {
            let eighths = match relative {
                RelativeToken::Left => -2,
                RelativeToken::Right => 2,
                _ => unreachable!(),
            };
            match heading.rotate_compass(eighths) {
                Some(canonical) => NormalizeOutcome::Ok { canonical },
                None => NormalizeOutcome::Ambiguous {
                    clarification: format!(
                        "left/right has no meaning relative to heading {heading}; try forward or back"
                    ),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_input_is_unknown() {
        assert!(matches!(
            normalize_direction("", None),
            NormalizeOutcome::Unknown { .. }
        ));
        assert!(matches!(
            normalize_direction("   ", None),
            NormalizeOutcome::Unknown { .. }
        ));
    }

    #[test]
    fn unrecognized_token_is_unknown() {
        assert!(matches!(
            normalize_direction("diagonal-north", None),
            NormalizeOutcome::Unknown { .. }
        ));
    }

    #[test]
    fn canonical_tokens_pass_through_case_insensitively() {
        assert_eq!(
            normalize_direction("NoRTh", None),
            NormalizeOutcome::Ok {
                canonical: Direction::North
            }
        );
    }

    #[test]
    fn relative_without_heading_is_ambiguous() {
        assert!(matches!(
            normalize_direction("left", None),
            NormalizeOutcome::Ambiguous { .. }
        ));
    }

    #[test]
    fn left_relative_to_west_heading_is_south() {
        assert_eq!(
            normalize_direction("left", Some(Direction::West)),
            NormalizeOutcome::Ok {
                canonical: Direction::South
            }
        );
    }

    #[test]
    fn back_relative_to_heading_is_the_opposite_direction() {
        assert_eq!(
            normalize_direction("back", Some(Direction::East)),
            NormalizeOutcome::Ok {
                canonical: Direction::West
            }
        );
    }

    #[test]
    fn forward_passes_through_for_vertical_heading() {
        assert_eq!(
            normalize_direction("forward", Some(Direction::Up)),
            NormalizeOutcome::Ok {
                canonical: Direction::Up
            }
        );
    }

    #[test]
    fn back_passes_through_for_radial_heading() {
        assert_eq!(
            normalize_direction("back", Some(Direction::In)),
            NormalizeOutcome::Ok {
                canonical: Direction::Out
            }
        );
    }

    #[test]
    fn left_against_a_vertical_heading_is_ambiguous() {
        assert!(matches!(
            normalize_direction("right", Some(Direction::Down)),
            NormalizeOutcome::Ambiguous { .. }
        ));
    }
}
