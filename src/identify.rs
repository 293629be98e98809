//! Name the chords a set of touched fretboard positions could be.
//!
//! Every root and every catalog chord type is tried. A chord matches exactly
//! when its interval set equals the set of touched pitch classes measured from
//! that root. Near matches are chords that would match if exactly one of the
//! root, the third (3 or 4) or the fifth (7) were added.

use crate::chord::{ChordSpec, ChordType};
use crate::pitch::PitchClass;
use crate::traversal::FretPosition;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    Exact,
    NoRoot,
    NoThird,
    NoFifth,
}

impl MatchKind {
    fn suffix(self) -> &'static str {
        match self {
            MatchKind::Exact => "",
            MatchKind::NoRoot => " (no root)",
            MatchKind::NoThird => " (no 3rd)",
            MatchKind::NoFifth => " (no 5th)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedChord {
    pub title: String,
    pub root: PitchClass,
    pub chord: String,
    pub kind: MatchKind,
}

/// One position per string; later touches on a string replace earlier ones
/// and positions behind a capo are dropped
pub fn touched_by_string(touched: &[FretPosition], offsets: &[u8]) -> BTreeMap<usize, u8> {
    let mut by_string = BTreeMap::new();
    for position in touched {
        match offsets.get(position.string) {
            Some(&offset) if position.fret >= offset => {
                by_string.insert(position.string, position.fret);
            }
            _ => warn!(
                string = position.string,
                fret = position.fret,
                "ignoring touch off the playable neck"
            ),
        }
    }
    by_string
}

/// Chords matching the touched positions; exact matches first
pub fn identify(
    touched: &[FretPosition],
    open_pitches: &[i32],
    offsets: &[u8],
    chord_types: &[ChordType],
) -> Vec<IdentifiedChord> {
    let pitches: BTreeSet<PitchClass> = touched_by_string(touched, offsets)
        .into_iter()
        .filter_map(|(string, fret)| {
            open_pitches
                .get(string)
                .map(|&open| PitchClass::new(open + fret as i32))
        })
        .collect();
    if pitches.is_empty() {
        return Vec::new();
    }

    let mut exact = Vec::new();
    let mut near = Vec::new();
    for root in (0..12).map(PitchClass::new) {
        let played: BTreeSet<u8> = pitches.iter().map(|p| p.interval_from(root)).collect();
        for chord_type in chord_types {
            let spec = ChordSpec::new(root, chord_type);
            let wanted: BTreeSet<u8> = spec.intervals.iter().copied().collect();
            if !played.is_subset(&wanted) {
                continue;
            }
            let missing: Vec<u8> = wanted.difference(&played).copied().collect();
            let kind = match missing[..] {
                [] => MatchKind::Exact,
                [0] => MatchKind::NoRoot,
                [3] | [4] => MatchKind::NoThird,
                [7] => MatchKind::NoFifth,
                _ => continue,
            };
            let found = IdentifiedChord {
                title: format!("{}{}{}", root, chord_type.name, kind.suffix()),
                root,
                chord: chord_type.name.clone(),
                kind,
            };
            if kind == MatchKind::Exact {
                exact.push(found);
            } else {
                near.push(found);
            }
        }
    }
    exact.extend(near);
    exact
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUITAR: [i32; 6] = [4, 9, 14, 19, 23, 28];

    fn types() -> Vec<ChordType> {
        [("maj", vec![0, 4, 7]), ("m", vec![0, 3, 7]), ("7", vec![0, 4, 7, 10])]
            .into_iter()
            .map(|(name, intervals)| ChordType {
                name: name.to_string(),
                intervals,
            })
            .collect()
    }

    fn touch(positions: &[(usize, u8)]) -> Vec<FretPosition> {
        positions.iter().map(|&(s, f)| FretPosition::new(s, f)).collect()
    }

    #[test]
    fn test_identifies_open_c() {
        let found = identify(&touch(&[(1, 3), (2, 2), (3, 0), (4, 1), (5, 0)]), &GUITAR, &[0; 6], &types());
        assert_eq!(found[0].title, "Cmaj");
        assert_eq!(found[0].kind, MatchKind::Exact);
        // C E G is also C7 without its b7, which is not a near match
        assert!(found.iter().all(|c| c.title != "C7"));
    }

    #[test]
    fn test_near_matches_follow_exact() {
        // C E Bb: C7 without the fifth
        let found = identify(&touch(&[(1, 3), (2, 2), (3, 3)]), &GUITAR, &[0; 6], &types());
        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["C7 (no 5th)"]);
    }

    #[test]
    fn test_two_notes_give_several_near_matches() {
        // open E and open G
        let found = identify(&touch(&[(0, 0), (3, 0)]), &GUITAR, &[0; 6], &types());
        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Cmaj (no root)"));
        assert!(titles.contains(&"Em (no 5th)"));
    }

    #[test]
    fn test_later_touch_replaces_earlier_on_string() {
        let by_string = touched_by_string(&touch(&[(1, 3), (1, 5)]), &[0; 6]);
        assert_eq!(by_string.get(&1), Some(&5));
        assert_eq!(by_string.len(), 1);
    }

    #[test]
    fn test_touch_behind_capo_ignored() {
        let by_string = touched_by_string(&touch(&[(0, 1), (1, 3)]), &[2; 6]);
        assert!(!by_string.contains_key(&0));
        assert!(identify(&[], &GUITAR, &[0; 6], &types()).is_empty());
    }
}
