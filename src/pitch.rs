//! # Pitch Arithmetic
//!
//! Pitch classes, interval symbols and note naming.
//!
//! ## Pitch Values
//! - **Pitch class**: 0-11, C = 0. All comparisons between a fretted note and a
//!   chord or scale tone happen on pitch classes.
//! - **Absolute pitch**: a plain `i32` counted in semitones from C of the
//!   instrument's base octave. Tunings are stored this way (standard guitar is
//!   `[4, 9, 14, 19, 23, 28]` with base octave 2) and are only reduced mod 12
//!   when compared against a tone.
//!
//! ## Tone Symbols
//! Intervals above the root are named `R b2 2 b3 3 4 b5 5 #5 6 b7 7`. A muted
//! string is written `X`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interval names indexed by semitones above the root
pub const TONE_SYMBOLS: [&str; 12] = [
    "R", "b2", "2", "b3", "3", "4", "b5", "5", "#5", "6", "b7", "7",
];

/// Symbol used for a muted string in tone sequences
pub const MUTED_SYMBOL: &str = "X";

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Keys on the flat side of the circle of fifths
const FLAT_KEYS: [&str; 7] = ["F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];

/// Pitch class (0-11) with rotational arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Reduce any semitone value (including negatives) to a pitch class
    pub fn new(semitones: i32) -> Self {
        PitchClass(semitones.rem_euclid(12) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn transpose(self, semitones: i32) -> Self {
        PitchClass::new(self.0 as i32 + semitones)
    }

    /// Semitones from `root` up to this pitch class (0-11)
    pub fn interval_from(self, root: PitchClass) -> u8 {
        (self.0 as i32 - root.0 as i32).rem_euclid(12) as u8
    }

    /// Parse a note name such as `C`, `F#`, `Bb` or `c#` (case-insensitive letter)
    ///
    /// # Examples
    /// ```
    /// use fretcalc::PitchClass;
    ///
    /// assert_eq!(PitchClass::from_name("C").unwrap().value(), 0);
    /// assert_eq!(PitchClass::from_name("F#").unwrap().value(), 6);
    /// assert_eq!(PitchClass::from_name("Bb").unwrap().value(), 10);
    /// assert!(PitchClass::from_name("H").is_none());
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.trim().chars();
        let base = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let accidental = match chars.next() {
            None => 0,
            Some('#') => 1,
            Some('b') => -1,
            Some(_) => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(PitchClass::new(base + accidental))
    }

    pub fn name(self, prefer_flat: bool) -> &'static str {
        if prefer_flat {
            FLAT_NAMES[self.0 as usize]
        } else {
            SHARP_NAMES[self.0 as usize]
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name(false))
    }
}

/// Interval symbol for a relative tone, reduced mod 12
pub fn tone_symbol(interval: u8) -> &'static str {
    TONE_SYMBOLS[(interval % 12) as usize]
}

/// Whether a key should be spelled with flats
///
/// Flat-side keys of the circle of fifths (and any root written with a `b`)
/// spell with flats; everything else, including roots outside the circle,
/// spells with sharps.
pub fn prefers_flats(root_name: &str) -> bool {
    let trimmed = root_name.trim();
    FLAT_KEYS.contains(&trimmed) || (trimmed.len() > 1 && trimmed.ends_with('b'))
}

/// Render a tuning as note names with octave marks
///
/// Notes in the base octave are upper case; higher octaves are lower case
/// with `'`, `"`, `` ` `` and `^` marking successive octaves.
///
/// # Examples
/// ```
/// use fretcalc::pitch::tuning_label;
///
/// // standard guitar, base octave E2
/// assert_eq!(tuning_label(&[4, 9, 14, 19, 23, 28]), "E A d g b e'");
/// ```
pub fn tuning_label(notes: &[i32]) -> String {
    const OCTAVE_MARKS: [&str; 5] = ["", "'", "\"", "`", "^"];
    notes
        .iter()
        .map(|&note| {
            let range = note.div_euclid(12);
            let name = SHARP_NAMES[note.rem_euclid(12) as usize];
            if range <= 0 {
                name.to_string()
            } else {
                let mark = OCTAVE_MARKS[((range - 1) as usize).min(OCTAVE_MARKS.len() - 1)];
                format!("{}{}", name.to_lowercase(), mark)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_wraps() {
        assert_eq!(PitchClass::new(-1).value(), 11);
        assert_eq!(PitchClass::new(28).value(), 4);
        assert_eq!(PitchClass::new(7).transpose(7).value(), 2);
    }

    #[test]
    fn test_interval_from_root() {
        let c = PitchClass::C;
        let e = PitchClass::new(4);
        assert_eq!(e.interval_from(c), 4);
        assert_eq!(c.interval_from(e), 8);
    }

    #[test]
    fn test_flat_spelling() {
        assert!(prefers_flats("Bb"));
        assert!(prefers_flats("F"));
        assert!(!prefers_flats("G"));
        assert!(!prefers_flats("C#"));
        assert_eq!(PitchClass::new(10).name(true), "Bb");
        assert_eq!(PitchClass::new(10).name(false), "A#");
    }

    #[test]
    fn test_tone_symbols() {
        assert_eq!(tone_symbol(0), "R");
        assert_eq!(tone_symbol(8), "#5");
        assert_eq!(tone_symbol(14), "2");
    }

    #[test]
    fn test_tuning_label_mandolin() {
        // G3 D4 A4 E5 with base octave 3
        assert_eq!(tuning_label(&[7, 14, 21, 28]), "G d a e'");
    }
}
