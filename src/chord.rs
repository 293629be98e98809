//! Chord definitions and chord-name parsing
//!
//! A chord is a root pitch class plus a set of intervals above it
//! (major triad = `{0, 4, 7}`). Chord types themselves come from the catalog.

use crate::pitch::{prefers_flats, tone_symbol, PitchClass};
use serde::{Deserialize, Serialize};

/// Named interval set, e.g. `m7` = `[0, 3, 7, 10]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordType {
    pub name: String,
    pub intervals: Vec<u8>,
}

/// A chord rooted on a pitch class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSpec {
    pub root: PitchClass,
    pub name: String,
    /// Intervals above the root, each reduced to 0-11
    pub intervals: Vec<u8>,
}

impl ChordSpec {
    pub fn new(root: PitchClass, chord_type: &ChordType) -> Self {
        ChordSpec {
            root,
            name: chord_type.name.clone(),
            intervals: chord_type.intervals.iter().map(|i| i % 12).collect(),
        }
    }

    /// Absolute pitch classes of the chord tones, in interval order
    pub fn tones(&self) -> Vec<PitchClass> {
        self.intervals
            .iter()
            .map(|&i| self.root.transpose(i as i32))
            .collect()
    }

    /// Interval of `pitch` above the root if it is a chord tone
    pub fn interval_of(&self, pitch: PitchClass) -> Option<u8> {
        let interval = pitch.interval_from(self.root);
        self.intervals.contains(&interval).then_some(interval)
    }

    /// Note names and interval symbols of the chord
    ///
    /// `root_name` decides between sharps and flats (`Bb` spells `Bb D F`,
    /// `A#` spells `A# D F`).
    ///
    /// # Example
    /// ```
    /// use fretcalc::{ChordSpec, ChordType, PitchClass};
    ///
    /// let seventh = ChordType { name: "7".to_string(), intervals: vec![0, 4, 7, 10] };
    /// let chord = ChordSpec::new(PitchClass::from_name("F").unwrap(), &seventh);
    /// let spelling = chord.spell("F");
    /// assert_eq!(spelling.notes, vec!["F", "A", "C", "Eb"]);
    /// assert_eq!(spelling.tones, vec!["R", "3", "5", "b7"]);
    /// ```
    pub fn spell(&self, root_name: &str) -> ChordSpelling {
        let flats = prefers_flats(root_name);
        let notes = self
            .intervals
            .iter()
            .map(|&i| self.root.transpose(i as i32).name(flats).to_string())
            .collect();
        let tones = self
            .intervals
            .iter()
            .map(|&i| tone_symbol(i).to_string())
            .collect();
        ChordSpelling { notes, tones }
    }
}

/// Spelled-out chord for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordSpelling {
    pub notes: Vec<String>,
    pub tones: Vec<String>,
}

/// Split a chord symbol into root and chord type
///
/// The root is a letter A-G (any case) with an optional `#` or `b`; everything
/// after it is the chord type, which may be empty.
///
/// # Examples
/// ```
/// use fretcalc::chord::split_chord_name;
///
/// assert_eq!(split_chord_name("F#m7"), Some(("F#", "m7")));
/// assert_eq!(split_chord_name("Bb"), Some(("Bb", "")));
/// assert_eq!(split_chord_name("Hm"), None);
/// ```
pub fn split_chord_name(symbol: &str) -> Option<(&str, &str)> {
    let symbol = symbol.trim();
    let first = symbol.chars().next()?;
    if !matches!(first.to_ascii_uppercase(), 'A'..='G') {
        return None;
    }
    let root_len = match symbol[1..].chars().next() {
        Some('#') | Some('b') => 2,
        _ => 1,
    };
    Some((&symbol[..root_len], &symbol[root_len..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minor() -> ChordType {
        ChordType {
            name: "m".to_string(),
            intervals: vec![0, 3, 7],
        }
    }

    #[test]
    fn test_chord_tones() {
        let a_minor = ChordSpec::new(PitchClass::new(9), &minor());
        let tones: Vec<u8> = a_minor.tones().iter().map(|p| p.value()).collect();
        assert_eq!(tones, vec![9, 0, 4]);
    }

    #[test]
    fn test_interval_of() {
        let a_minor = ChordSpec::new(PitchClass::new(9), &minor());
        assert_eq!(a_minor.interval_of(PitchClass::new(0)), Some(3));
        assert_eq!(a_minor.interval_of(PitchClass::new(4)), Some(7));
        assert_eq!(a_minor.interval_of(PitchClass::new(1)), None);
    }

    #[test]
    fn test_extended_intervals_reduce() {
        let ninth = ChordType {
            name: "add9".to_string(),
            intervals: vec![0, 4, 7, 14],
        };
        let chord = ChordSpec::new(PitchClass::C, &ninth);
        assert_eq!(chord.intervals, vec![0, 4, 7, 2]);
    }

    #[test]
    fn test_split_lowercase_root() {
        assert_eq!(split_chord_name("ebdim"), Some(("eb", "dim")));
        assert_eq!(split_chord_name(""), None);
    }
}
