//! # Catalog and Presets
//!
//! The catalog holds every named thing a user picks from: chord types, scales,
//! instruments, capos, progressions and filter descriptions. The built-in
//! catalog is `catalog.yaml`, compiled into the binary. A replacement catalog
//! with the same shape can be loaded with [`Catalog::from_yaml`].
//!
//! YAML is first read into `Raw*` records and then checked: scale steps must
//! parse, tunings must not be empty and every progression entry must name a
//! known chord type.
//!
//! A [`Preset`] is a saved instrument setup (instrument, capos, filters, span).

use crate::chord::ChordType;
use crate::error::FretError;
use crate::filter::{FilterKind, FilterSet};
use crate::instrument::{CapoSet, Instrument, InstrumentKind};
use crate::pitch::PitchClass;
use crate::progression::ProgressionDef;
use crate::scale::{parse_steps, ScaleType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const BUILTIN: &str = include_str!("catalog.yaml");

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    chords: Vec<ChordType>,
    #[serde(default)]
    scales: Vec<ScaleType>,
    #[serde(default)]
    instruments: Vec<RawInstrument>,
    #[serde(default)]
    capos: Vec<CapoDef>,
    #[serde(default)]
    progressions: Vec<ProgressionDef>,
    #[serde(default)]
    filters: BTreeMap<FilterKind, String>,
}

#[derive(Debug, Deserialize)]
struct RawInstrument {
    title: String,
    tuning: Vec<i32>,
    span: u8,
    octave: i32,
    kind: Option<InstrumentKind>,
}

/// Named capo; without a mask it covers every string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapoDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,
}

impl CapoDef {
    pub fn mask_for(&self, string_count: usize) -> Vec<bool> {
        self.mask
            .clone()
            .unwrap_or_else(|| vec![true; string_count])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub chords: Vec<ChordType>,
    pub scales: Vec<ScaleType>,
    pub instruments: Vec<Instrument>,
    pub capos: Vec<CapoDef>,
    pub progressions: Vec<ProgressionDef>,
    pub filters: BTreeMap<FilterKind, String>,
}

impl Catalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self, FretError> {
        Self::from_yaml(BUILTIN)
    }

    pub fn from_yaml(content: &str) -> Result<Self, FretError> {
        let raw: RawCatalog = serde_yaml::from_str(content)?;
        let catalog = Self::validate(raw)?;
        debug!(
            chords = catalog.chords.len(),
            scales = catalog.scales.len(),
            instruments = catalog.instruments.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    fn validate(raw: RawCatalog) -> Result<Self, FretError> {
        if let Some(empty) = raw.chords.iter().find(|c| c.intervals.is_empty()) {
            return Err(FretError::Catalog(format!(
                "chord type '{}' has no intervals",
                empty.name
            )));
        }
        for scale in &raw.scales {
            parse_steps(&scale.steps)?;
        }

        let instruments = raw
            .instruments
            .into_iter()
            .map(|r| {
                if r.tuning.is_empty() || r.span == 0 {
                    return Err(FretError::Catalog(format!(
                        "instrument '{}' needs a tuning and a span",
                        r.title
                    )));
                }
                let mut instrument = Instrument::new(&r.title, r.tuning, r.span, r.octave);
                if let Some(kind) = r.kind {
                    instrument.kind = kind;
                }
                Ok(instrument)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for progression in &raw.progressions {
            for chord in progression.resolve(PitchClass::C)? {
                if !raw.chords.iter().any(|c| c.name == chord.chord_type) {
                    return Err(FretError::Catalog(format!(
                        "progression '{}' uses unknown chord type '{}'",
                        progression.title, chord.chord_type
                    )));
                }
            }
        }

        Ok(Catalog {
            chords: raw.chords,
            scales: raw.scales,
            instruments,
            capos: raw.capos,
            progressions: raw.progressions,
            filters: raw.filters,
        })
    }

    pub fn chord(&self, name: &str) -> Result<&ChordType, FretError> {
        self.chords
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FretError::UnknownChord(name.to_string()))
    }

    pub fn scale(&self, name: &str) -> Result<&ScaleType, FretError> {
        self.scales
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FretError::UnknownScale(name.to_string()))
    }

    /// Instrument by title, case-insensitive
    pub fn instrument(&self, title: &str) -> Result<&Instrument, FretError> {
        self.instruments
            .iter()
            .find(|i| i.title.eq_ignore_ascii_case(title))
            .ok_or_else(|| FretError::UnknownInstrument(title.to_string()))
    }

    pub fn capo(&self, name: &str) -> Result<&CapoDef, FretError> {
        self.capos
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FretError::UnknownCapo(name.to_string()))
    }

    pub fn progression(&self, title: &str) -> Result<&ProgressionDef, FretError> {
        self.progressions
            .iter()
            .find(|p| p.title.eq_ignore_ascii_case(title))
            .ok_or_else(|| FretError::UnknownProgression(title.to_string()))
    }

    pub fn filter_description(&self, kind: FilterKind) -> Option<&str> {
        self.filters.get(&kind).map(String::as_str)
    }
}

/// A capo placement inside a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetCapo {
    pub capo: String,
    pub fret: u8,
}

/// Saved instrument setup
///
/// ```
/// use fretcalc::{Catalog, Preset};
///
/// let preset = Preset::from_yaml(
///     "instrument: Guitar\ncapos:\n  - { capo: Full, fret: 2 }\nfilters: [NO_DEAD]\n",
/// ).unwrap();
/// let catalog = Catalog::builtin().unwrap();
/// let setup = preset.resolve(&catalog).unwrap();
/// assert_eq!(setup.instrument.string_count(), 6);
/// assert!(!setup.capos.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub instrument: String,
    #[serde(default)]
    pub capos: Vec<PresetCapo>,
    #[serde(default)]
    pub filters: Vec<FilterKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<u8>,
}

/// A preset with every name looked up
#[derive(Debug, Clone)]
pub struct ResolvedPreset {
    pub instrument: Instrument,
    pub capos: CapoSet,
    pub filters: FilterSet,
    pub span: u8,
}

impl Preset {
    pub fn from_yaml(content: &str) -> Result<Self, FretError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, FretError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn resolve(&self, catalog: &Catalog) -> Result<ResolvedPreset, FretError> {
        let instrument = catalog.instrument(&self.instrument)?.clone();
        let mut capos = CapoSet::new();
        for placed in &self.capos {
            let def = catalog.capo(&placed.capo)?;
            capos.set(placed.fret, def.mask_for(instrument.string_count()));
        }
        Ok(ResolvedPreset {
            span: self.span.unwrap_or(instrument.span),
            filters: self.filters.iter().copied().collect(),
            instrument,
            capos,
        })
    }
}
