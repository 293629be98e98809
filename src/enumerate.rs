//! # Candidate Enumeration
//!
//! Finds every fret choice that sounds a chord tone inside a fret window, then
//! forms the cartesian product of "one of those frets, or muted" across all
//! strings.
//!
//! ## Window
//! At `position` with span `s` each string is searched over
//! `[max(position, offset), position + s]`, where `offset` is the string's
//! capo/nut offset, and never past the board's last fret. When the window is away from the nut (`position > 0`) the
//! string's open (or capo) fret is searched too, so open-string voicings are
//! found at every neck position. A string whose offset lies beyond the window
//! has no valid frets there.
//!
//! ## Enumeration Order
//! Candidates come out as a mixed-radix odometer over the per-string choice
//! lists. The highest-index string turns fastest; each string's choices are its
//! valid frets in search order followed by "muted". Tests depend on this order.

use crate::chord::ChordSpec;
use crate::fingering::Fingering;
use crate::instrument::DEFAULT_MAX_FRET;
use crate::pitch::PitchClass;
use tracing::trace;

/// Chord search over one instrument setup
#[derive(Debug, Clone, Copy)]
pub struct Enumerator<'a> {
    pub open_pitches: &'a [i32],
    pub offsets: &'a [u8],
    pub chord: &'a ChordSpec,
    pub span: u8,
    pub max_fret: u8,
}

impl<'a> Enumerator<'a> {
    pub fn new(open_pitches: &'a [i32], offsets: &'a [u8], chord: &'a ChordSpec, span: u8) -> Self {
        Enumerator {
            open_pitches,
            offsets,
            chord,
            span,
            max_fret: DEFAULT_MAX_FRET,
        }
    }

    /// Limit the search to frets up to `max_fret`
    pub fn with_max_fret(mut self, max_fret: u8) -> Self {
        self.max_fret = max_fret;
        self
    }

    /// Span, cut down to the length of the neck
    fn effective_span(&self) -> u8 {
        self.span.min(self.max_fret)
    }

    /// Frets searched on one string at `position`, in search order
    fn window(&self, offset: u8, position: u8) -> Vec<u8> {
        let end = position.saturating_add(self.effective_span()).min(self.max_fret);
        if offset > end {
            return Vec::new();
        }
        let start = position.max(offset);
        let mut frets = Vec::with_capacity((end - start) as usize + 2);
        if position != 0 && offset < position {
            frets.push(offset);
        }
        frets.extend(start..=end);
        frets
    }

    /// Chord-tone frets on every string at `position`
    pub fn valid_frets(&self, position: u8) -> Vec<Vec<u8>> {
        let tones = self.chord.tones();
        self.open_pitches
            .iter()
            .zip(self.offsets)
            .map(|(&open, &offset)| {
                self.window(offset, position)
                    .into_iter()
                    .filter(|&fret| tones.contains(&PitchClass::new(open + fret as i32)))
                    .collect()
            })
            .collect()
    }

    /// Every fingering at `position`, before any validity check
    pub fn at_position(&self, position: u8) -> Vec<Fingering> {
        let valid = self.valid_frets(position);
        let found = candidates(&valid);
        trace!(position, count = found.len(), "enumerated candidates");
        found
    }

    /// Every fingering at every position from 0 to `max_fret - span`, concatenated
    pub fn all_positions(&self) -> Vec<Fingering> {
        let last = self.max_fret - self.effective_span();
        (0..=last).flat_map(|p| self.at_position(p)).collect()
    }
}

/// Cartesian product of "valid fret or muted" across strings
///
/// # Example
/// ```
/// use fretcalc::enumerate::candidates;
///
/// let found = candidates(&[vec![3], vec![0, 2]]);
/// let frets: Vec<_> = found.iter().map(|f| f.frets().to_vec()).collect();
/// assert_eq!(frets, vec![
///     vec![Some(3), Some(0)],
///     vec![Some(3), Some(2)],
///     vec![Some(3), None],
///     vec![None, Some(0)],
///     vec![None, Some(2)],
///     vec![None, None],
/// ]);
/// ```
pub fn candidates(valid_frets: &[Vec<u8>]) -> Vec<Fingering> {
    if valid_frets.iter().all(|frets| frets.is_empty()) {
        return Vec::new();
    }

    let choices: Vec<Vec<Option<u8>>> = valid_frets
        .iter()
        .map(|frets| {
            frets
                .iter()
                .map(|&f| Some(f))
                .chain(std::iter::once(None))
                .collect()
        })
        .collect();
    let total: usize = choices.iter().map(Vec::len).product();

    let mut counter = vec![0usize; choices.len()];
    let mut found = Vec::with_capacity(total);
    for _ in 0..total {
        found.push(Fingering::new(
            counter
                .iter()
                .zip(&choices)
                .map(|(&c, string)| string[c])
                .collect(),
        ));
        for i in (0..counter.len()).rev() {
            counter[i] += 1;
            if counter[i] < choices[i].len() {
                break;
            }
            counter[i] = 0;
        }
    }
    found
}
