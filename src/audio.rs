//! Playback tone lists.
//!
//! Sound output belongs to the host; this module only says which notes to
//! play, low string first, as `(pitch class, octave)` pairs. The octave of an
//! absolute pitch is the instrument's base octave plus `pitch / 12`.

use crate::fingering::Fingering;
use crate::instrument::Instrument;
use crate::pitch::PitchClass;
use crate::traversal::FretPosition;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tone {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Tone {
    pub fn from_absolute(pitch: i32, base_octave: i32) -> Self {
        Tone {
            pitch_class: PitchClass::new(pitch),
            octave: base_octave + pitch.div_euclid(12),
        }
    }
}

/// Sounding strings of a fingering; muted strings are skipped
pub fn fingering_tones(fingering: &Fingering, open_pitches: &[i32], base_octave: i32) -> Vec<Tone> {
    fingering
        .played()
        .filter_map(|(string, fret)| {
            open_pitches
                .get(string)
                .map(|&open| Tone::from_absolute(open + fret as i32, base_octave))
        })
        .collect()
}

/// Tones for positions in the order given (a scale path, identify touches)
pub fn position_tones(positions: &[FretPosition], open_pitches: &[i32], base_octave: i32) -> Vec<Tone> {
    positions
        .iter()
        .filter_map(|p| {
            open_pitches
                .get(p.string)
                .map(|&open| Tone::from_absolute(open + p.fret as i32, base_octave))
        })
        .collect()
}

/// Open strings of the instrument
pub fn tuning_tones(instrument: &Instrument) -> Vec<Tone> {
    instrument
        .tuning
        .iter()
        .map(|&pitch| Tone::from_absolute(pitch, instrument.octave))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(tones: &[Tone]) -> Vec<(u8, i32)> {
        tones.iter().map(|t| (t.pitch_class.value(), t.octave)).collect()
    }

    #[test]
    fn test_open_c_tones() {
        let guitar = [4, 9, 14, 19, 23, 28];
        let c = Fingering::new(vec![None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        assert_eq!(
            pairs(&fingering_tones(&c, &guitar, 2)),
            vec![(0, 3), (4, 3), (7, 3), (0, 4), (4, 4)]
        );
    }

    #[test]
    fn test_tuning_tones_use_real_banjo_pitch() {
        let banjo = Instrument::new("Banjo", vec![19, 2, 7, 11, 14], 4, 3);
        assert_eq!(pairs(&tuning_tones(&banjo))[0], (7, 4));
        // fret 5 of the short string on the shared neck is the same g
        let open = banjo.open_pitches();
        let drone = position_tones(&[FretPosition::new(0, 5)], &open, 3);
        assert_eq!(pairs(&drone), vec![(7, 4)]);
    }
}
