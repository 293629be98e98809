//! # Two-Octave Scale Traversal
//!
//! Greedy walk that lays two ascending octaves of a scale across the strings,
//! starting from a root on a chosen string.
//!
//! At each step the next scale tone is looked up on the current string and on
//! the string above. If it is on only one of them, that one is taken. If it is
//! on both, the fret closer to the reference fret wins (ties move up a string),
//! subject to the mode:
//!
//! | Mode | Rule |
//! |---|---|
//! | `normal` | reference fret stays at the start fret |
//! | `down` | reference fret follows every chosen fret |
//! | `open` | an open string above is always taken |
//! | `FourOnString` | after four fretted notes on a string, move up |
//!
//! The walk ends when the next tone is on neither string. The string above
//! the top string never has any tones, so the walk always ends there.

use crate::error::FretError;
use crate::pitch::PitchClass;
use crate::scale::{ScaleNote, ScaleSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Fretted notes allowed on one string in `FourOnString` mode
const NOTES_PER_STRING: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraversalMode {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "FourOnString")]
    FourOnString,
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraversalMode::Normal => "normal",
            TraversalMode::Down => "down",
            TraversalMode::Open => "open",
            TraversalMode::FourOnString => "FourOnString",
        })
    }
}

impl FromStr for TraversalMode {
    type Err = FretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(TraversalMode::Normal),
            "down" => Ok(TraversalMode::Down),
            "open" => Ok(TraversalMode::Open),
            "fouronstring" | "four" => Ok(TraversalMode::FourOnString),
            _ => Err(FretError::Usage(format!("unknown traversal mode '{}'", s))),
        }
    }
}

/// A (string, fret) location on the neck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FretPosition {
    pub string: usize,
    pub fret: u8,
}

impl FretPosition {
    pub fn new(string: usize, fret: u8) -> Self {
        FretPosition { string, fret }
    }
}

/// `"<string>:<fret>"`, e.g. `1:3`
impl FromStr for FretPosition {
    type Err = FretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || FretError::Usage(format!("expected <string>:<fret>, got '{}'", s));
        let (string, fret) = s.trim().split_once(':').ok_or_else(bad)?;
        Ok(FretPosition {
            string: string.parse().map_err(|_| bad())?,
            fret: fret.parse().map_err(|_| bad())?,
        })
    }
}

struct Walk {
    mode: TraversalMode,
    string: usize,
    reference: u8,
    fretted_on_string: u8,
    path: Vec<FretPosition>,
}

impl Walk {
    fn stay(&mut self, fret: u8) {
        self.path.push(FretPosition::new(self.string, fret));
        if fret > 0 {
            self.fretted_on_string += 1;
        }
        if self.mode == TraversalMode::Down {
            self.reference = fret;
        }
    }

    fn move_up(&mut self, fret: u8) {
        self.string += 1;
        self.path.push(FretPosition::new(self.string, fret));
        self.fretted_on_string = u8::from(fret > 0);
        if self.mode == TraversalMode::Down {
            self.reference = fret;
        }
    }
}

/// Lay out two octaves of `scale` starting at `start`
///
/// `notes` is the per-string output of [`crate::scale::scale_notes`] for the
/// same instrument. Returns `None` when `start` is not an occurrence of the
/// scale root.
pub fn two_octave_scale(
    open_pitches: &[i32],
    notes: &[Vec<ScaleNote>],
    scale: &ScaleSpec,
    start: FretPosition,
    mode: TraversalMode,
) -> Option<Vec<FretPosition>> {
    let Some(&open) = open_pitches.get(start.string) else {
        warn!(string = start.string, "scale start is off the instrument");
        return None;
    };
    let start_tone = open + start.fret as i32;
    let on_string = notes
        .get(start.string)
        .is_some_and(|string| string.iter().any(|n| n.fret == start.fret));
    if !on_string || PitchClass::new(start_tone) != scale.root {
        warn!(
            string = start.string,
            fret = start.fret,
            "scale start is not a root, ignoring"
        );
        return None;
    }

    // two ascending octaves of absolute tones from the start note
    let mut tones = vec![start_tone];
    let mut tone = start_tone;
    for _ in 0..2 {
        for &step in &scale.steps {
            tone += step as i32;
            tones.push(tone);
        }
    }

    let fret_of = |string: usize, tone: i32| -> Option<u8> {
        let open = *open_pitches.get(string)?;
        notes
            .get(string)?
            .iter()
            .find(|n| open + n.fret as i32 == tone)
            .map(|n| n.fret)
    };

    let mut walk = Walk {
        mode,
        string: start.string,
        reference: start.fret,
        fretted_on_string: u8::from(start.fret > 0),
        path: vec![start],
    };

    for &next in &tones[1..] {
        let here = fret_of(walk.string, next);
        let above = fret_of(walk.string + 1, next);
        match (here, above) {
            (None, None) => break,
            (None, Some(up)) => walk.move_up(up),
            (Some(fret), None) => walk.stay(fret),
            (Some(fret), Some(up)) => {
                if mode == TraversalMode::Open && up == 0 {
                    walk.move_up(up);
                } else if mode == TraversalMode::FourOnString
                    && walk.fretted_on_string >= NOTES_PER_STRING
                {
                    walk.move_up(up);
                } else if walk.reference.abs_diff(fret) < walk.reference.abs_diff(up) {
                    walk.stay(fret);
                } else {
                    walk.move_up(up);
                }
            }
        }
    }
    Some(walk.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{scale_notes, ScaleType};

    const GUITAR: [i32; 6] = [4, 9, 14, 19, 23, 28];

    fn c_major() -> ScaleSpec {
        let major = ScaleType {
            name: "major".to_string(),
            steps: "TTSTTTS".to_string(),
            mode_degree: None,
        };
        ScaleSpec::new(PitchClass::C, &major).unwrap()
    }

    fn walk(start: (usize, u8), mode: TraversalMode) -> Option<Vec<(usize, u8)>> {
        let scale = c_major();
        let notes = scale_notes(&GUITAR, &[0; 6], 14, &scale);
        two_octave_scale(&GUITAR, &notes, &scale, FretPosition::new(start.0, start.1), mode)
            .map(|path| path.iter().map(|p| (p.string, p.fret)).collect())
    }

    #[test]
    fn test_normal_mode_from_a_string() {
        let path = walk((1, 3), TraversalMode::Normal).unwrap();
        assert_eq!(
            path,
            vec![
                (1, 3),
                (1, 5),
                (2, 2),
                (2, 3),
                (2, 5),
                (3, 2),
                (3, 4),
                (4, 1),
                (4, 3),
                (4, 5),
                (5, 1),
                (5, 3),
                (5, 5),
                (5, 7),
                (5, 8),
            ]
        );
    }

    #[test]
    fn test_open_mode_prefers_open_strings() {
        let path = walk((1, 3), TraversalMode::Open).unwrap();
        assert_eq!(path.len(), 15);
        for open in [(2, 0), (3, 0), (4, 0), (5, 0)] {
            assert!(path.contains(&open), "missing {:?}", open);
        }
    }

    #[test]
    fn test_down_mode_follows_the_hand() {
        let path = walk((1, 3), TraversalMode::Down).unwrap();
        assert!(path[..7].iter().all(|&(string, _)| string == 1));
        assert_eq!(path[6], (1, 14));
        assert_eq!(path[7], (2, 10));
    }

    #[test]
    fn test_four_on_string_forces_change() {
        let chromatic = ScaleSpec {
            root: PitchClass::C,
            name: "chromatic".to_string(),
            steps: vec![1; 12],
            mode_degree: None,
        };
        let open = [0, 9];
        let notes = scale_notes(&open, &[0, 0], 24, &chromatic);
        let start = FretPosition::new(0, 12);
        let normal = two_octave_scale(&open, &notes, &chromatic, start, TraversalMode::Normal).unwrap();
        let four = two_octave_scale(&open, &notes, &chromatic, start, TraversalMode::FourOnString).unwrap();
        assert_eq!(normal[4], FretPosition::new(0, 16));
        assert_eq!(four[4], FretPosition::new(1, 7));
    }

    #[test]
    fn test_stops_at_top_of_neck() {
        // C on the high e string at fret 8; only D E F fit below fret 15
        let path = walk((5, 8), TraversalMode::Normal).unwrap();
        assert_eq!(path, vec![(5, 8), (5, 10), (5, 12), (5, 13)]);
    }

    #[test]
    fn test_start_must_be_root() {
        assert!(walk((1, 2), TraversalMode::Normal).is_none()); // B
        assert!(walk((1, 1), TraversalMode::Normal).is_none()); // A#, not in scale
        assert!(walk((9, 3), TraversalMode::Normal).is_none());
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("FourOnString".parse::<TraversalMode>().unwrap(), TraversalMode::FourOnString);
        assert_eq!("down".parse::<TraversalMode>().unwrap(), TraversalMode::Down);
        assert!("sideways".parse::<TraversalMode>().is_err());
    }
}
