//! # Chord Progressions
//!
//! A progression is written relative to a root as `"<semitones>-<chord type>"`
//! entries (`["0-maj", "5-maj", "7-7"]` is I IV V7). [`ProgressionDef::resolve`]
//! turns it into concrete chords; the session computes one ranked fingering
//! list per chord and hands them to a [`ProgressionNavigator`].
//!
//! ## Position Continuity
//! With continuity on, moving to another chord picks the first fingering whose
//! centroid is within 0.5, 1.0, 2.0 or 3.0 frets of the current centroid
//! (tightest tolerance first), so the hand stays in the same neck region.
//! Without it, or when nothing is close enough, the fingering index carries
//! over, clamped to the new chord's list.
//!
//! ```
//! use fretcalc::progression::ProgressionNavigator;
//!
//! let mut nav = ProgressionNavigator::new(vec![Vec::new(), Vec::new()], true);
//! nav.step_chord(5);
//! assert_eq!(nav.current_chord(), 1);
//! assert!(nav.current_fingering().is_none());
//! ```

use crate::error::FretError;
use crate::fingering::{nearest_to_fret, RankedFingering};
use crate::pitch::PitchClass;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Centroid distances tried, in order, when matching neck position
pub const CENTROID_LADDER: [f64; 4] = [0.5, 1.0, 2.0, 3.0];

/// Progression as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionDef {
    pub title: String,
    pub chords: Vec<String>,
}

/// One resolved chord of a progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionChord {
    pub root: PitchClass,
    pub chord_type: String,
}

impl ProgressionDef {
    /// Concrete chords for a progression rooted on `root`
    ///
    /// # Errors
    /// [`FretError::Catalog`] when an entry is not `<semitones>-<chord type>`.
    pub fn resolve(&self, root: PitchClass) -> Result<Vec<ProgressionChord>, FretError> {
        self.chords
            .iter()
            .map(|entry| {
                let (offset, chord_type) = entry
                    .split_once('-')
                    .filter(|(_, t)| !t.is_empty())
                    .ok_or_else(|| bad_entry(&self.title, entry))?;
                let offset: i32 = offset
                    .trim()
                    .parse()
                    .map_err(|_| bad_entry(&self.title, entry))?;
                Ok(ProgressionChord {
                    root: root.transpose(offset),
                    chord_type: chord_type.trim().to_string(),
                })
            })
            .collect()
    }
}

fn bad_entry(title: &str, entry: &str) -> FretError {
    FretError::Catalog(format!(
        "progression '{}' has malformed entry '{}'",
        title, entry
    ))
}

/// Pointer state over the per-chord fingering lists of a progression
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionNavigator {
    lists: Vec<Vec<RankedFingering>>,
    pointers: Vec<usize>,
    current: usize,
    centroid: Option<f64>,
    continuity: bool,
}

impl ProgressionNavigator {
    pub fn new(lists: Vec<Vec<RankedFingering>>, continuity: bool) -> Self {
        let pointers = vec![0; lists.len()];
        let mut nav = ProgressionNavigator {
            lists,
            pointers,
            current: 0,
            centroid: None,
            continuity,
        };
        nav.refresh_centroid();
        nav
    }

    /// Rebuild a navigator around fresh lists, keeping saved pointers where
    /// they still fit
    ///
    /// With continuity on and a saved `centroid`, the current chord keeps its
    /// pointer only while that fingering is still within the closest ladder
    /// tolerance; otherwise it moves to the nearest fingering by the ladder.
    pub fn restore(
        lists: Vec<Vec<RankedFingering>>,
        pointers: &[usize],
        current: usize,
        continuity: bool,
        centroid: Option<f64>,
    ) -> Self {
        let mut pointers: Vec<usize> = lists
            .iter()
            .enumerate()
            .map(|(i, list)| clamp(pointers.get(i).copied().unwrap_or(0), list.len()))
            .collect();
        let current = current.min(lists.len().saturating_sub(1));
        if let (true, Some(saved), Some(list)) = (continuity, centroid, lists.get(current)) {
            let kept = list
                .get(pointers[current])
                .and_then(|r| r.centroid)
                .is_some_and(|c| (c - saved).abs() < CENTROID_LADDER[0]);
            if !kept {
                if let Some(index) = closest_by_ladder(list, saved) {
                    debug!(chord = current, pointer = index, "restored pointer by centroid");
                    pointers[current] = index;
                }
            }
        }
        let mut nav = ProgressionNavigator {
            lists,
            pointers,
            current,
            centroid: None,
            continuity,
        };
        nav.refresh_centroid();
        nav
    }

    pub fn lists(&self) -> &[Vec<RankedFingering>] {
        &self.lists
    }

    pub fn pointers(&self) -> &[usize] {
        &self.pointers
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn current_chord(&self) -> usize {
        self.current
    }

    pub fn centroid(&self) -> Option<f64> {
        self.centroid
    }

    pub fn continuity(&self) -> bool {
        self.continuity
    }

    pub fn set_continuity(&mut self, on: bool) {
        self.continuity = on;
    }

    pub fn current_fingering(&self) -> Option<&RankedFingering> {
        let list = self.lists.get(self.current)?;
        list.get(self.pointers[self.current])
    }

    /// Move `delta` chords forward or back, clamped to the progression
    pub fn step_chord(&mut self, delta: isize) {
        let target = self.current.saturating_add_signed(delta);
        self.set_chord(target);
    }

    /// Make chord `index` current, clamped to the progression
    pub fn set_chord(&mut self, index: usize) {
        if self.lists.is_empty() {
            return;
        }
        let target = index.min(self.lists.len() - 1);
        if target == self.current {
            return;
        }
        let carried = self.pointers[self.current];
        let matched = if self.continuity {
            self.centroid
                .and_then(|previous| closest_by_ladder(&self.lists[target], previous))
        } else {
            None
        };
        self.pointers[target] = matched.unwrap_or_else(|| clamp(carried, self.lists[target].len()));
        debug!(
            from = self.current,
            to = target,
            pointer = self.pointers[target],
            matched = matched.is_some(),
            "changed progression chord"
        );
        self.current = target;
        self.refresh_centroid();
    }

    /// Point at fingering `index` of the current chord, clamped to its list
    pub fn set_fingering(&mut self, index: usize) {
        if let Some(list) = self.lists.get(self.current) {
            self.pointers[self.current] = clamp(index, list.len());
            self.refresh_centroid();
        }
    }

    pub fn step_fingering(&mut self, delta: isize) {
        if let Some(&pointer) = self.pointers.get(self.current) {
            self.set_fingering(pointer.saturating_add_signed(delta));
        }
    }

    /// Jump the current chord to the first fingering near `fret`; returns
    /// whether one was found
    pub fn jump_to_fret(&mut self, fret: u8) -> bool {
        let found = self
            .lists
            .get(self.current)
            .and_then(|list| nearest_to_fret(list, fret));
        if let Some(index) = found {
            self.set_fingering(index);
        }
        found.is_some()
    }

    fn refresh_centroid(&mut self) {
        self.centroid = self.current_fingering().and_then(|r| r.centroid);
    }
}

/// First entry within the tightest ladder tolerance of `previous`
pub fn closest_by_ladder(list: &[RankedFingering], previous: f64) -> Option<usize> {
    CENTROID_LADDER.iter().find_map(|&tolerance| {
        list.iter().position(|r| {
            r.centroid
                .is_some_and(|centroid| (centroid - previous).abs() < tolerance)
        })
    })
}

fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingering::{Candidate, Fingering};

    fn at(centroid: f64) -> RankedFingering {
        let candidate = Candidate {
            fingering: Fingering::new(vec![Some(centroid.round() as u8)]),
            tones: vec![Some(0)],
        };
        RankedFingering {
            symbols: candidate.symbols(),
            candidate,
            centroid: Some(centroid),
        }
    }

    fn lists(centroids: &[&[f64]]) -> Vec<Vec<RankedFingering>> {
        centroids
            .iter()
            .map(|list| list.iter().map(|&c| at(c)).collect())
            .collect()
    }

    #[test]
    fn test_resolve_offsets() {
        let def = ProgressionDef {
            title: "I IV V7".to_string(),
            chords: vec!["0-maj".to_string(), "5-maj".to_string(), "7-7".to_string()],
        };
        let chords = def.resolve(PitchClass::new(7)).unwrap();
        let roots: Vec<u8> = chords.iter().map(|c| c.root.value()).collect();
        assert_eq!(roots, vec![7, 0, 2]);
        assert_eq!(chords[2].chord_type, "7");
    }

    #[test]
    fn test_resolve_rejects_malformed() {
        let def = ProgressionDef {
            title: "broken".to_string(),
            chords: vec!["IV".to_string()],
        };
        assert!(matches!(def.resolve(PitchClass::C), Err(FretError::Catalog(_))));
    }

    #[test]
    fn test_continuity_picks_nearest_centroid() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0, 3.0], &[0.5, 2.8, 5.0]]), true);
        nav.set_fingering(1);
        assert_eq!(nav.centroid(), Some(3.0));
        nav.step_chord(1);
        assert_eq!(nav.pointers()[1], 1);
        assert_eq!(nav.centroid(), Some(2.8));
    }

    #[test]
    fn test_ladder_widens_until_match() {
        let list: Vec<RankedFingering> = [0.0, 5.5, 9.0].iter().map(|&c| at(c)).collect();
        assert_eq!(closest_by_ladder(&list, 3.0), Some(1));
        assert_eq!(closest_by_ladder(&list, 12.5), None);
    }

    #[test]
    fn test_without_continuity_index_carries() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0, 3.0, 4.0], &[7.0, 8.0]]), false);
        nav.set_fingering(2);
        nav.step_chord(1);
        // index 2 clamped to the two-entry list
        assert_eq!(nav.pointers()[1], 1);
        assert_eq!(nav.centroid(), Some(8.0));
    }

    #[test]
    fn test_no_match_falls_back_to_index() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0], &[9.0, 10.0]]), true);
        nav.step_chord(1);
        assert_eq!(nav.pointers()[1], 0);
    }

    #[test]
    fn test_out_of_range_steps_clamp() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0, 2.0], &[3.0]]), false);
        nav.step_chord(-3);
        assert_eq!(nav.current_chord(), 0);
        nav.step_fingering(10);
        assert_eq!(nav.pointers()[0], 1);
        nav.step_fingering(-10);
        assert_eq!(nav.pointers()[0], 0);
        nav.step_chord(9);
        assert_eq!(nav.current_chord(), 1);
    }

    #[test]
    fn test_returning_carries_index_back() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0, 2.0, 3.0], &[3.0]]), false);
        nav.set_fingering(2);
        nav.step_chord(1);
        nav.step_chord(-1);
        // chord 1 only had index 0 to carry
        assert_eq!(nav.pointers()[0], 0);
        assert_eq!(nav.centroid(), Some(1.0));
    }

    #[test]
    fn test_restore_clamps_saved_state() {
        let nav = ProgressionNavigator::restore(lists(&[&[1.0, 2.0], &[4.0]]), &[5, 3, 9], 7, true, None);
        assert_eq!(nav.pointers(), &[1, 0]);
        assert_eq!(nav.current_chord(), 1);
        assert_eq!(nav.centroid(), Some(4.0));
    }

    #[test]
    fn test_restore_follows_saved_centroid() {
        // saved index 0 now sits at fret 1, the hand was at 7
        let nav = ProgressionNavigator::restore(lists(&[&[1.0, 6.8, 9.0]]), &[0], 0, true, Some(7.0));
        assert_eq!(nav.pointers(), &[1]);
        assert_eq!(nav.centroid(), Some(6.8));

        // without continuity the index is kept
        let nav = ProgressionNavigator::restore(lists(&[&[1.0, 6.8, 9.0]]), &[0], 0, false, Some(7.0));
        assert_eq!(nav.pointers(), &[0]);
    }

    #[test]
    fn test_restore_keeps_pointer_still_in_place() {
        let nav = ProgressionNavigator::restore(lists(&[&[7.0, 7.0, 9.0]]), &[1], 0, true, Some(7.0));
        assert_eq!(nav.pointers(), &[1]);
    }

    #[test]
    fn test_jump_to_fret() {
        let mut nav = ProgressionNavigator::new(lists(&[&[1.0, 5.0, 9.0]]), false);
        assert!(nav.jump_to_fret(8));
        assert_eq!(nav.pointers()[0], 2);
        assert!(!nav.jump_to_fret(14));
    }
}
