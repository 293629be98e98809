//! # Scales and Fretboard Point Sets
//!
//! Scale definitions plus the two "where are the notes" sweeps over the neck:
//! - [`scale_notes`] - every scale tone on every string (scale mode)
//! - [`chord_scale`] - every chord tone on every string (the "show scale over
//!   chord" overlay in chord-finder and identify modes)
//!
//! ## Step Strings
//! Scales are written as step sequences: `S` = semitone, `T` = tone, a digit
//! = that many semitones. Major is `TTSTTTS`, minor pentatonic `3TT3T`.

use crate::chord::ChordSpec;
use crate::error::FretError;
use crate::pitch::PitchClass;
use serde::{Deserialize, Serialize};

/// Catalog entry for a scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleType {
    pub name: String,
    pub steps: String,
    /// For church modes: semitones from the relative major's tonic up to this
    /// mode's tonic (dorian = 2, aeolian = 9)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_degree: Option<u8>,
}

/// A scale rooted on a pitch class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSpec {
    pub root: PitchClass,
    pub name: String,
    /// Semitone steps between successive degrees
    pub steps: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_degree: Option<u8>,
}

impl ScaleSpec {
    pub fn new(root: PitchClass, scale_type: &ScaleType) -> Result<Self, FretError> {
        Ok(ScaleSpec {
            root,
            name: scale_type.name.clone(),
            steps: parse_steps(&scale_type.steps)?,
            mode_degree: scale_type.mode_degree,
        })
    }

    /// Distinct pitch classes of the scale, starting at the root
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut classes = vec![self.root];
        let mut current = self.root;
        for &step in &self.steps {
            current = current.transpose(step as i32);
            if !classes.contains(&current) {
                classes.push(current);
            }
        }
        classes
    }

    pub fn contains(&self, pitch: PitchClass) -> bool {
        self.pitch_classes().contains(&pitch)
    }

    /// Tonic of the relative major, for modal scales only
    pub fn relative_major(&self) -> Option<PitchClass> {
        self.mode_degree
            .map(|degree| self.root.transpose(-(degree as i32)))
    }
}

/// Parse a step string into semitone steps
///
/// # Examples
/// ```
/// use fretcalc::scale::parse_steps;
///
/// assert_eq!(parse_steps("TTSTTTS").unwrap(), vec![2, 2, 1, 2, 2, 2, 1]);
/// assert_eq!(parse_steps("3TT3T").unwrap(), vec![3, 2, 2, 3, 2]);
/// assert!(parse_steps("TTX").is_err());
/// ```
pub fn parse_steps(steps: &str) -> Result<Vec<u8>, FretError> {
    steps
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'S' | 's' => Ok(1),
            'T' | 't' => Ok(2),
            d if d.is_ascii_digit() && d != '0' => Ok(d as u8 - b'0'),
            step => Err(FretError::InvalidScaleStep { step }),
        })
        .collect()
}

/// A scale tone on one string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScaleNote {
    pub fret: u8,
    pub pitch: PitchClass,
}

/// A chord tone on one string, with its interval above the chord root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChordScalePoint {
    pub fret: u8,
    pub interval: u8,
}

/// Every fret from each string's capo offset to `max_fret` that plays a scale tone
pub fn scale_notes(
    open_pitches: &[i32],
    offsets: &[u8],
    max_fret: u8,
    scale: &ScaleSpec,
) -> Vec<Vec<ScaleNote>> {
    let classes = scale.pitch_classes();
    open_pitches
        .iter()
        .zip(offsets)
        .map(|(&open, &offset)| {
            (offset..=max_fret)
                .filter_map(|fret| {
                    let pitch = PitchClass::new(open + fret as i32);
                    classes
                        .contains(&pitch)
                        .then_some(ScaleNote { fret, pitch })
                })
                .collect()
        })
        .collect()
}

/// Every fret from each string's capo offset to `max_fret` that plays a chord tone
pub fn chord_scale(
    open_pitches: &[i32],
    offsets: &[u8],
    max_fret: u8,
    chord: &ChordSpec,
) -> Vec<Vec<ChordScalePoint>> {
    open_pitches
        .iter()
        .zip(offsets)
        .map(|(&open, &offset)| {
            (offset..=max_fret)
                .filter_map(|fret| {
                    chord
                        .interval_of(PitchClass::new(open + fret as i32))
                        .map(|interval| ChordScalePoint { fret, interval })
                })
                .collect()
        })
        .collect()
}
