//! # Instrument Model
//!
//! Tunings, instrument kinds and capos.
//!
//! ## Strings
//! Strings are indexed low to high: index 0 is the lowest-pitched string in
//! the tuning list (for a 5-string banjo this is the short drone string, which
//! is listed first).
//!
//! ## Capos
//! A [`CapoSet`] maps a fret to a per-string mask. A string's nut offset is the
//! highest fret of any capo whose mask covers it. The 5-string banjo is special:
//! its short string starts at fret 5 of the neck, is raised only by capos with a
//! one-entry mask, and ignores the first entry of full-width masks.

use crate::error::FretError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fret at which the short string of a 5-string banjo leaves the neck
pub const BANJO_FIFTH_STRING_FRET: u8 = 5;

/// Highest fret searched unless a host asks for more
pub const DEFAULT_MAX_FRET: u8 = 14;

/// Instrument family
///
/// Gates instrument-specific filters and the 5-string banjo layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Guitar,
    Mando,
    Ukulele,
    Banjo,
    #[default]
    Generic,
}

impl InstrumentKind {
    /// Infer the kind from an instrument title (`"Guitar (Drop D)"` is a guitar)
    pub fn detect(title: &str) -> Self {
        let lower = title.trim().to_lowercase();
        if lower.starts_with("guitar") {
            InstrumentKind::Guitar
        } else if lower.starts_with("mando") {
            InstrumentKind::Mando
        } else if lower.starts_with("ukulele") {
            InstrumentKind::Ukulele
        } else if lower.starts_with("banjo") {
            InstrumentKind::Banjo
        } else {
            InstrumentKind::Generic
        }
    }
}

/// A tuned, fretted instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub title: String,
    /// Open-string absolute pitches, low string first
    pub tuning: Vec<i32>,
    /// Default fret span for the chord search window
    pub span: u8,
    /// Octave of absolute pitch 0, used for playback
    pub octave: i32,
    pub kind: InstrumentKind,
}

impl Instrument {
    pub fn new(title: &str, tuning: Vec<i32>, span: u8, octave: i32) -> Self {
        Instrument {
            title: title.to_string(),
            tuning,
            span,
            octave,
            kind: InstrumentKind::detect(title),
        }
    }

    pub fn string_count(&self) -> usize {
        self.tuning.len()
    }

    pub fn is_five_string_banjo(&self) -> bool {
        self.kind == InstrumentKind::Banjo && self.tuning.len() == 5
    }

    /// Pitches used for fret arithmetic
    ///
    /// Identical to the tuning except on a 5-string banjo, where the short
    /// string is lowered by [`BANJO_FIFTH_STRING_FRET`] so that its open note
    /// sits at fret 5 of the shared neck numbering.
    pub fn open_pitches(&self) -> Vec<i32> {
        let banjo = self.is_five_string_banjo();
        self.tuning
            .iter()
            .enumerate()
            .map(|(i, &note)| {
                if banjo && i == 0 {
                    note - BANJO_FIFTH_STRING_FRET as i32
                } else {
                    note
                }
            })
            .collect()
    }
}

/// One capo placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capo {
    pub fret: u8,
    pub mask: Vec<bool>,
}

/// Capos currently on the neck, keyed by fret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapoSet {
    capos: BTreeMap<u8, Vec<bool>>,
}

impl CapoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a capo, replacing any capo already at that fret
    pub fn set(&mut self, fret: u8, mask: Vec<bool>) {
        self.capos.insert(fret, mask);
    }

    pub fn remove(&mut self, fret: u8) -> Option<Vec<bool>> {
        self.capos.remove(&fret)
    }

    pub fn clear(&mut self) {
        self.capos.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.capos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capo> + '_ {
        self.capos.iter().map(|(&fret, mask)| Capo {
            fret,
            mask: mask.clone(),
        })
    }
}

impl FromIterator<Capo> for CapoSet {
    fn from_iter<I: IntoIterator<Item = Capo>>(iter: I) -> Self {
        let mut set = CapoSet::new();
        for capo in iter {
            set.set(capo.fret, capo.mask);
        }
        set
    }
}

/// Lowest playable fret on each string given the capos in place
///
/// # Errors
/// [`FretError::CapoMask`] when a mask does not fit the instrument. On a
/// 5-string banjo, masks must have 1 entry (short string only), 4 entries
/// (the four long strings) or 5 entries (first entry ignored).
///
/// # Example
/// ```
/// use fretcalc::{capo_offsets, CapoSet};
///
/// let mut capos = CapoSet::new();
/// capos.set(2, vec![true; 6]);
/// assert_eq!(capo_offsets(6, &capos, false).unwrap(), vec![2, 2, 2, 2, 2, 2]);
/// ```
pub fn capo_offsets(
    string_count: usize,
    capos: &CapoSet,
    five_string_banjo: bool,
) -> Result<Vec<u8>, FretError> {
    if !five_string_banjo {
        let mut offsets = vec![0u8; string_count];
        for capo in capos.iter() {
            if capo.mask.len() != string_count {
                return Err(FretError::CapoMask {
                    fret: capo.fret,
                    expected: string_count,
                    actual: capo.mask.len(),
                });
            }
            for (offset, &covered) in offsets.iter_mut().zip(&capo.mask) {
                if covered {
                    *offset = (*offset).max(capo.fret);
                }
            }
        }
        return Ok(offsets);
    }

    let mut offsets = vec![BANJO_FIFTH_STRING_FRET, 0, 0, 0, 0];
    for capo in capos.iter() {
        let long_strings: &[bool] = match capo.mask.len() {
            1 => {
                if capo.mask[0] {
                    offsets[0] = offsets[0].max(capo.fret);
                }
                continue;
            }
            4 => &capo.mask[..],
            5 => &capo.mask[1..],
            actual => {
                return Err(FretError::CapoMask {
                    fret: capo.fret,
                    expected: 4,
                    actual,
                })
            }
        };
        for (offset, &covered) in offsets[1..].iter_mut().zip(long_strings) {
            if covered {
                *offset = (*offset).max(capo.fret);
            }
        }
    }
    Ok(offsets)
}

/// Instrument plus capos, reduced to what the searches need
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fretboard {
    pub open_pitches: Vec<i32>,
    pub offsets: Vec<u8>,
    pub kind: InstrumentKind,
    pub max_fret: u8,
}

impl Fretboard {
    pub fn new(instrument: &Instrument, capos: &CapoSet, max_fret: u8) -> Result<Self, FretError> {
        Ok(Fretboard {
            open_pitches: instrument.open_pitches(),
            offsets: capo_offsets(
                instrument.string_count(),
                capos,
                instrument.is_five_string_banjo(),
            )?,
            kind: instrument.kind,
            max_fret,
        })
    }

    pub fn string_count(&self) -> usize {
        self.open_pitches.len()
    }
}
