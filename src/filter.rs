//! # Validity Check and Post-Filters
//!
//! ## Chord Completeness
//! [`is_valid_chord`] requires every chord tone to sound somewhere in the
//! fingering. Three relaxation flags excuse one missing tone each:
//! `NO3RD_OK` (interval 3 or 4), `NO5TH_OK` (7) and `NOROOT_OK` (0).
//! `FULL_CHORD` overrides all of them.
//!
//! ## Post-Filter Order
//! `FULL_CHORD`, `NO_DEAD`, `NO_OPEN`, `HIGH_4`, `LOW_4`, `HIGH_3`, `LOW_3`,
//! `DOUBLE_STOPS`, `NO_WIDOW`. Each stage returns a new list; none mutates its
//! input. Only `DOUBLE_STOPS` produces new fingerings (adjacent-string pairs),
//! and only on mandolins. `HIGH_3`/`LOW_3` may mute their designated string
//! when it carries just a root or fifth.
//!
//! ## String Designations
//! For an instrument with `n` strings (index 0 = lowest):
//! - `HIGH_4`: strings 0 and 1 muted, all others sounding
//! - `LOW_4`: strings `n-2` and `n-1` muted, all others sounding
//! - `HIGH_3`: string 0 muted (or mutable), all others sounding
//! - `LOW_3`: string `n-1` muted (or mutable), all others sounding
//! - `NO_WIDOW`: only strings 0 and `n-1` may be muted

use crate::chord::ChordSpec;
use crate::error::FretError;
use crate::fingering::{Candidate, Fingering};
use crate::instrument::InstrumentKind;
use crate::pitch::PitchClass;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Intervals that make up a literal triad (`R b3 3 #5 5`)
const TRIAD_TONES: [u8; 5] = [0, 3, 4, 8, 7];

/// Intervals a `HIGH_3`/`LOW_3` string may shed (`R 5 #5`)
const EXPENDABLE_TONES: [u8; 3] = [0, 7, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterKind {
    #[serde(rename = "FULL_CHORD")]
    FullChord,
    #[serde(rename = "NO3RD_OK")]
    No3rdOk,
    #[serde(rename = "NO5TH_OK")]
    No5thOk,
    #[serde(rename = "NOROOT_OK")]
    NoRootOk,
    #[serde(rename = "NO_DEAD")]
    NoDead,
    #[serde(rename = "NO_OPEN")]
    NoOpen,
    #[serde(rename = "HIGH_4")]
    High4,
    #[serde(rename = "LOW_4")]
    Low4,
    #[serde(rename = "HIGH_3")]
    High3,
    #[serde(rename = "LOW_3")]
    Low3,
    #[serde(rename = "DOUBLE_STOPS")]
    DoubleStops,
    #[serde(rename = "NO_WIDOW")]
    NoWidow,
}

impl FilterKind {
    pub const ALL: [FilterKind; 12] = [
        FilterKind::FullChord,
        FilterKind::No3rdOk,
        FilterKind::No5thOk,
        FilterKind::NoRootOk,
        FilterKind::NoDead,
        FilterKind::NoOpen,
        FilterKind::High4,
        FilterKind::Low4,
        FilterKind::High3,
        FilterKind::Low3,
        FilterKind::DoubleStops,
        FilterKind::NoWidow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::FullChord => "FULL_CHORD",
            FilterKind::No3rdOk => "NO3RD_OK",
            FilterKind::No5thOk => "NO5TH_OK",
            FilterKind::NoRootOk => "NOROOT_OK",
            FilterKind::NoDead => "NO_DEAD",
            FilterKind::NoOpen => "NO_OPEN",
            FilterKind::High4 => "HIGH_4",
            FilterKind::Low4 => "LOW_4",
            FilterKind::High3 => "HIGH_3",
            FilterKind::Low3 => "LOW_3",
            FilterKind::DoubleStops => "DOUBLE_STOPS",
            FilterKind::NoWidow => "NO_WIDOW",
        }
    }

    /// Filters that cannot be active together with this one
    pub fn excludes(self) -> &'static [FilterKind] {
        match self {
            FilterKind::FullChord => &[FilterKind::No3rdOk, FilterKind::No5thOk, FilterKind::NoRootOk],
            FilterKind::No3rdOk | FilterKind::No5thOk | FilterKind::NoRootOk => &[FilterKind::FullChord],
            FilterKind::High4 => &[FilterKind::Low4],
            FilterKind::Low4 => &[FilterKind::High4],
            FilterKind::High3 => &[FilterKind::Low3],
            FilterKind::Low3 => &[FilterKind::High3],
            FilterKind::NoDead => &[FilterKind::NoWidow],
            FilterKind::NoWidow => &[FilterKind::NoDead],
            FilterKind::NoOpen | FilterKind::DoubleStops => &[],
        }
    }

    /// Filters offered for an instrument kind
    pub fn available_for(kind: InstrumentKind) -> Vec<FilterKind> {
        let mut list = vec![
            FilterKind::FullChord,
            FilterKind::No3rdOk,
            FilterKind::No5thOk,
            FilterKind::NoRootOk,
            FilterKind::NoDead,
            FilterKind::NoOpen,
            FilterKind::NoWidow,
        ];
        match kind {
            InstrumentKind::Guitar => list.extend([FilterKind::High4, FilterKind::Low4]),
            InstrumentKind::Mando => {
                list.extend([FilterKind::High3, FilterKind::Low3, FilterKind::DoubleStops])
            }
            _ => {}
        }
        list
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        FilterKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| FretError::UnknownFilter(s.to_string()))
    }
}

/// Active filters, in the order they were switched on
///
/// Deserializing goes through [`FilterSet::insert`], so a stored list that
/// names two exclusive filters keeps only the later one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FilterKind>", into = "Vec<FilterKind>")]
pub struct FilterSet(Vec<FilterKind>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch a filter on, switching off any filter it excludes
    pub fn insert(&mut self, kind: FilterKind) {
        if self.contains(kind) {
            return;
        }
        self.0.retain(|k| !kind.excludes().contains(k));
        self.0.push(kind);
    }

    pub fn remove(&mut self, kind: FilterKind) {
        self.0.retain(|&k| k != kind);
    }

    pub fn toggle(&mut self, kind: FilterKind) {
        if self.contains(kind) {
            self.remove(kind);
        } else {
            self.insert(kind);
        }
    }

    pub fn contains(&self, kind: FilterKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<FilterKind>> for FilterSet {
    fn from(kinds: Vec<FilterKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<FilterSet> for Vec<FilterKind> {
    fn from(set: FilterSet) -> Self {
        set.0
    }
}

impl FromIterator<FilterKind> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterKind>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Does the fingering sound every chord tone not excused by a relaxation flag?
pub fn is_valid_chord(
    fingering: &Fingering,
    open_pitches: &[i32],
    chord: &ChordSpec,
    filters: &FilterSet,
) -> bool {
    let sounding: Vec<PitchClass> = fingering
        .played()
        .filter_map(|(string, fret)| {
            open_pitches
                .get(string)
                .map(|&open| PitchClass::new(open + fret as i32))
        })
        .collect();
    // nothing sounding is never a chord, whatever is excused
    if sounding.is_empty() {
        return false;
    }
    let strict = filters.contains(FilterKind::FullChord);

    chord.intervals.iter().all(|&interval| {
        if sounding.contains(&chord.root.transpose(interval as i32)) {
            return true;
        }
        if strict {
            return false;
        }
        match interval {
            3 | 4 => filters.contains(FilterKind::No3rdOk),
            7 => filters.contains(FilterKind::No5thOk),
            0 => filters.contains(FilterKind::NoRootOk),
            _ => false,
        }
    })
}

/// Run the post-filters named in `filters` over `candidates`, in fixed order
pub fn apply_filters(
    filters: &FilterSet,
    candidates: Vec<Candidate>,
    kind: InstrumentKind,
) -> Vec<Candidate> {
    if filters.is_empty() {
        return candidates;
    }
    let mut current = candidates;
    for stage in [
        FilterKind::FullChord,
        FilterKind::NoDead,
        FilterKind::NoOpen,
        FilterKind::High4,
        FilterKind::Low4,
        FilterKind::High3,
        FilterKind::Low3,
        FilterKind::DoubleStops,
        FilterKind::NoWidow,
    ] {
        if !filters.contains(stage) {
            continue;
        }
        let before = current.len();
        current = match stage {
            FilterKind::FullChord => keep(current, has_triad),
            FilterKind::NoDead => keep(current, |c| !c.fingering.has_muted()),
            FilterKind::NoOpen => keep(current, |c| !c.fingering.has_open()),
            FilterKind::High4 => keep(current, |c| muted_exactly(c, &[0, 1])),
            FilterKind::Low4 => {
                let n = string_count(&current);
                keep(current, |c| muted_exactly(c, &[n.saturating_sub(2), n.saturating_sub(1)]))
            }
            FilterKind::High3 => shed_string(current, |_| 0),
            FilterKind::Low3 => shed_string(current, |n| n.saturating_sub(1)),
            FilterKind::DoubleStops if kind == InstrumentKind::Mando => double_stops(current),
            FilterKind::DoubleStops => current,
            FilterKind::NoWidow => keep(current, no_widow),
            FilterKind::No3rdOk | FilterKind::No5thOk | FilterKind::NoRootOk => current,
        };
        debug!(filter = %stage, before, after = current.len(), "applied filter");
    }
    current
}

fn keep(candidates: Vec<Candidate>, predicate: impl Fn(&Candidate) -> bool) -> Vec<Candidate> {
    candidates.into_iter().filter(|c| predicate(c)).collect()
}

fn string_count(candidates: &[Candidate]) -> usize {
    candidates.first().map_or(0, |c| c.tones.len())
}

fn has_triad(candidate: &Candidate) -> bool {
    candidate
        .sounding_intervals()
        .iter()
        .filter(|i| TRIAD_TONES.contains(i))
        .count()
        == 3
}

/// Exactly the strings in `muted` are muted
fn muted_exactly(candidate: &Candidate, muted: &[usize]) -> bool {
    (0..candidate.tones.len()).all(|i| candidate.fingering.is_muted(i) == muted.contains(&i))
}

/// `HIGH_3` / `LOW_3`: the designated string must be muted, or carry only a
/// root or fifth (which is then muted); every other string must sound
fn shed_string(candidates: Vec<Candidate>, designated: impl Fn(usize) -> usize) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter_map(|c| {
            let n = c.tones.len();
            let target = designated(n);
            let others_sound = (0..n)
                .filter(|&i| i != target)
                .all(|i| !c.fingering.is_muted(i));
            if !others_sound {
                return None;
            }
            match c.tones.get(target).copied().flatten() {
                None => Some(c),
                Some(interval) if EXPENDABLE_TONES.contains(&interval) => Some(c.with_muted(target)),
                Some(_) => None,
            }
        })
        .collect()
}

/// Every adjacent pair of sounding strings with different tones, alone
fn double_stops(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut pairs = Vec::new();
    for candidate in &candidates {
        for i in 0..candidate.tones.len().saturating_sub(1) {
            if let (Some(low), Some(high)) = (candidate.tones[i], candidate.tones[i + 1]) {
                if low != high {
                    pairs.push(candidate.keep_only(&[i, i + 1]));
                }
            }
        }
    }
    pairs
}

/// Muted strings only on the outside
fn no_widow(candidate: &Candidate) -> bool {
    let last = candidate.tones.len().saturating_sub(1);
    (1..last).all(|i| !candidate.fingering.is_muted(i))
}
