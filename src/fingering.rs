//! # Fingerings, Deduplication and Ranking
//!
//! ## Types
//! - [`Fingering`] - one fret (or muted) per string, low string first
//! - [`Candidate`] - a fingering plus the chord tone each string sounds
//! - [`RankedFingering`] - a candidate plus its centroid
//!
//! ## Centroid
//! The centroid is the mean fret of all sounding strings. Open strings count
//! as fret 0; muted strings are left out. A fingering with no sounding
//! string has no centroid and is dropped from centroid-sorted lists.
//!
//! ## Deduplication
//! Two candidates are duplicates when their tone sequences match string for
//! string (`X R 3 5 R 3`), whatever frets produce them. The first one seen
//! is kept and order is preserved.

use crate::chord::ChordSpec;
use crate::pitch::{tone_symbol, PitchClass, MUTED_SYMBOL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How far (in frets) a jump target may be from a fingering's lowest fretted note
const JUMP_TOLERANCE: u8 = 2;

/// Per-string fret choices; `None` is a muted string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingering(Vec<Option<u8>>);

impl Fingering {
    pub fn new(frets: Vec<Option<u8>>) -> Self {
        Fingering(frets)
    }

    /// All strings muted
    pub fn muted(string_count: usize) -> Self {
        Fingering(vec![None; string_count])
    }

    pub fn frets(&self) -> &[Option<u8>] {
        &self.0
    }

    pub fn string_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_muted(&self, string: usize) -> bool {
        self.0.get(string).map_or(true, |f| f.is_none())
    }

    /// `(string, fret)` for every sounding string
    pub fn played(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.map(|fret| (i, fret)))
    }

    pub fn has_muted(&self) -> bool {
        self.0.iter().any(|f| f.is_none())
    }

    pub fn has_open(&self) -> bool {
        self.0.iter().any(|f| *f == Some(0))
    }

    /// Mean fret of the sounding strings, `None` when nothing sounds
    ///
    /// # Example
    /// ```
    /// use fretcalc::Fingering;
    ///
    /// // x32010
    /// let c = Fingering::new(vec![None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
    /// assert_eq!(c.centroid(), Some(1.2));
    /// assert_eq!(Fingering::muted(6).centroid(), None);
    /// ```
    pub fn centroid(&self) -> Option<f64> {
        let (sum, count) = self
            .played()
            .fold((0u32, 0u32), |(sum, count), (_, fret)| (sum + fret as u32, count + 1));
        (count > 0).then(|| sum as f64 / count as f64)
    }

    /// Lowest fret above the nut among sounding strings
    pub fn lowest_fretted(&self) -> Option<u8> {
        self.played().map(|(_, fret)| fret).filter(|&f| f > 0).min()
    }
}

/// Fingering with the chord tone resolved on each string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub fingering: Fingering,
    /// Interval above the chord root per string, `None` when muted
    pub tones: Vec<Option<u8>>,
}

impl Candidate {
    /// Resolve the tones of a fingering; `None` if a sounding string is not a chord tone
    pub fn resolve(fingering: Fingering, open_pitches: &[i32], chord: &ChordSpec) -> Option<Self> {
        let tones = fingering
            .frets()
            .iter()
            .zip(open_pitches)
            .map(|(fret, &open)| match fret {
                None => Some(None),
                Some(f) => chord
                    .interval_of(PitchClass::new(open + *f as i32))
                    .map(Some),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Candidate { fingering, tones })
    }

    /// Interval symbols per string, `X` for muted
    pub fn symbols(&self) -> Vec<&'static str> {
        self.tones
            .iter()
            .map(|t| t.map_or(MUTED_SYMBOL, tone_symbol))
            .collect()
    }

    /// Canonical key used for deduplication
    pub fn key(&self) -> String {
        self.symbols().join(" ")
    }

    /// Set of chord intervals actually sounding
    pub fn sounding_intervals(&self) -> Vec<u8> {
        let mut intervals: Vec<u8> = self.tones.iter().flatten().copied().collect();
        intervals.sort_unstable();
        intervals.dedup();
        intervals
    }

    /// Copy of this candidate with only strings `keep` left sounding
    pub fn keep_only(&self, keep: &[usize]) -> Candidate {
        let frets = self
            .fingering
            .frets()
            .iter()
            .enumerate()
            .map(|(i, f)| if keep.contains(&i) { *f } else { None })
            .collect();
        let tones = self
            .tones
            .iter()
            .enumerate()
            .map(|(i, t)| if keep.contains(&i) { *t } else { None })
            .collect();
        Candidate {
            fingering: Fingering::new(frets),
            tones,
        }
    }

    /// Copy of this candidate with one string muted
    pub fn with_muted(&self, string: usize) -> Candidate {
        let keep: Vec<usize> = (0..self.tones.len()).filter(|&i| i != string).collect();
        self.keep_only(&keep)
    }
}

/// Candidate plus centroid, as handed to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFingering {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub symbols: Vec<&'static str>,
    pub centroid: Option<f64>,
}

impl RankedFingering {
    pub fn new(candidate: Candidate) -> Self {
        let centroid = candidate.fingering.centroid();
        let symbols = candidate.symbols();
        RankedFingering {
            candidate,
            symbols,
            centroid,
        }
    }

    pub fn fingering(&self) -> &Fingering {
        &self.candidate.fingering
    }
}

/// Remove musically identical candidates, keeping the first of each
pub fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.key()))
        .collect()
}

/// Remove candidates with identical frets, keeping the first of each
pub fn dedup_frets(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.fingering.clone()))
        .collect()
}

/// Keep enumeration order (chord-finder list)
pub fn in_order(candidates: Vec<Candidate>) -> Vec<RankedFingering> {
    candidates.into_iter().map(RankedFingering::new).collect()
}

/// Sort ascending by centroid, dropping candidates without one (progression lists)
pub fn rank_by_centroid(candidates: Vec<Candidate>) -> Vec<RankedFingering> {
    let mut ranked: Vec<RankedFingering> = candidates
        .into_iter()
        .map(RankedFingering::new)
        .filter(|r| r.centroid.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        a.centroid
            .unwrap_or_default()
            .total_cmp(&b.centroid.unwrap_or_default())
    });
    ranked
}

/// First fingering whose lowest fretted note is within two frets of `fret`
pub fn nearest_to_fret(fingerings: &[RankedFingering], fret: u8) -> Option<usize> {
    fingerings.iter().position(|r| {
        r.fingering()
            .lowest_fretted()
            .is_some_and(|low| low.abs_diff(fret) <= JUMP_TOLERANCE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordType;

    const GUITAR: [i32; 6] = [4, 9, 14, 19, 23, 28];

    fn c_major() -> ChordSpec {
        let triad = ChordType {
            name: "maj".to_string(),
            intervals: vec![0, 4, 7],
        };
        ChordSpec::new(PitchClass::C, &triad)
    }

    fn candidate(frets: &[Option<u8>]) -> Candidate {
        Candidate::resolve(Fingering::new(frets.to_vec()), &GUITAR, &c_major()).unwrap()
    }

    #[test]
    fn test_resolve_open_c() {
        let c = candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        assert_eq!(c.symbols(), vec!["X", "R", "3", "5", "R", "3"]);
    }

    #[test]
    fn test_resolve_rejects_non_chord_tone() {
        // F on the low E string is not in C major
        let f = Fingering::new(vec![Some(1), None, None, None, None, None]);
        assert!(Candidate::resolve(f, &GUITAR, &c_major()).is_none());
    }

    #[test]
    fn test_dedup_collapses_same_tones() {
        // open high E vs 12th-fret high E: same tone sequence
        let a = candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        let b = candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(12)]);
        let unique = dedup(vec![a.clone(), b]);
        assert_eq!(unique, vec![a]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let list = vec![
            candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]),
            candidate(&[None, Some(3), Some(5), Some(5), Some(5), Some(3)]),
            candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(12)]),
        ];
        let once = dedup(list);
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_rank_by_centroid_sorted_and_drops_empty() {
        let high = candidate(&[Some(8), Some(10), Some(10), Some(9), Some(8), Some(8)]);
        let open = candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        let empty = candidate(&[None; 6]);
        let ranked = rank_by_centroid(vec![high, empty, open]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].centroid.unwrap() <= ranked[1].centroid.unwrap());
        assert_eq!(ranked[0].centroid, Some(1.2));
    }

    #[test]
    fn test_keep_only_mutes_others() {
        let c = candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        let pair = c.keep_only(&[1, 2]);
        assert_eq!(pair.symbols(), vec!["X", "R", "3", "X", "X", "X"]);
        assert_eq!(pair.fingering.frets()[1], Some(3));
        assert!(pair.fingering.is_muted(3));
    }

    #[test]
    fn test_nearest_to_fret() {
        let list = in_order(vec![
            candidate(&[None, Some(3), Some(2), Some(0), Some(1), Some(0)]),
            candidate(&[Some(8), Some(10), Some(10), Some(9), Some(8), Some(8)]),
        ]);
        assert_eq!(nearest_to_fret(&list, 9), Some(1));
        assert_eq!(nearest_to_fret(&list, 0), Some(0));
        assert_eq!(nearest_to_fret(&list, 13), None);
    }
}
