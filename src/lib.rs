pub mod audio;
pub mod catalog;
pub mod chord;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod fingering;
pub mod identify;
pub mod instrument;
pub mod pitch;
pub mod progression;
pub mod scale;
pub mod session;
pub mod traversal;

pub use catalog::{Catalog, Preset};
pub use chord::{ChordSpec, ChordType};
pub use error::*;
pub use filter::{FilterKind, FilterSet};
pub use fingering::{Candidate, Fingering, RankedFingering};
pub use instrument::{capo_offsets, Capo, CapoSet, Fretboard, Instrument, InstrumentKind};
pub use pitch::PitchClass;
pub use progression::{ProgressionDef, ProgressionNavigator};
pub use scale::{ScaleSpec, ScaleType};
pub use session::{
    compute, ChordCalc, EventKind, Mode, NavigationEvent, NavigationState, Observer,
    RenderPayload, Root, SelectionEvent, SelectionState,
};
pub use traversal::{FretPosition, TraversalMode};

use enumerate::Enumerator;
use filter::{apply_filters, is_valid_chord};
use fingering::{dedup, dedup_frets, in_order, rank_by_centroid};
use tracing::debug;

/// Find every distinct fingering of a chord on a fretboard.
/// This is the main entry point for the library.
///
/// Runs the window search at every neck position, drops repeated frets,
/// checks chord completeness, applies the post-filters and finally removes
/// fingerings that sound the same tones on the same strings.
///
/// # Example
/// ```
/// use fretcalc::{find_fingerings, CapoSet, ChordSpec, ChordType, FilterSet, Fretboard, Instrument, PitchClass};
///
/// let guitar = Instrument::new("Guitar", vec![4, 9, 14, 19, 23, 28], 4, 2);
/// let board = Fretboard::new(&guitar, &CapoSet::new(), 14).unwrap();
/// let major = ChordType { name: "maj".to_string(), intervals: vec![0, 4, 7] };
/// let c = ChordSpec::new(PitchClass::C, &major);
///
/// let found = find_fingerings(&board, &c, 4, &FilterSet::new());
/// let open_c = [None, Some(3), Some(2), Some(0), Some(1), Some(0)];
/// assert!(found.iter().any(|f| f.fingering.frets() == open_c));
/// ```
pub fn find_fingerings(
    board: &Fretboard,
    chord: &ChordSpec,
    span: u8,
    filters: &FilterSet,
) -> Vec<Candidate> {
    let search = Enumerator::new(&board.open_pitches, &board.offsets, chord, span)
        .with_max_fret(board.max_fret);
    let enumerated = search.all_positions();
    let total = enumerated.len();

    let resolved: Vec<Candidate> = enumerated
        .into_iter()
        .filter_map(|f| Candidate::resolve(f, &board.open_pitches, chord))
        .collect();
    let valid: Vec<Candidate> = dedup_frets(resolved)
        .into_iter()
        .filter(|c| is_valid_chord(&c.fingering, &board.open_pitches, chord, filters))
        .collect();
    let checked = valid.len();
    let result = dedup(apply_filters(filters, valid, board.kind));

    debug!(
        chord = %format!("{}{}", chord.root, chord.name),
        enumerated = total,
        valid = checked,
        kept = result.len(),
        "found fingerings"
    );
    result
}

/// Chord-finder list: enumeration order, low on the neck first
pub fn chord_fingerings(
    board: &Fretboard,
    chord: &ChordSpec,
    span: u8,
    filters: &FilterSet,
) -> Vec<RankedFingering> {
    in_order(find_fingerings(board, chord, span, filters))
}

/// Progression list: sorted by centroid, fingerings with no centroid dropped
pub fn progression_fingerings(
    board: &Fretboard,
    chord: &ChordSpec,
    span: u8,
    filters: &FilterSet,
) -> Vec<RankedFingering> {
    rank_by_centroid(find_fingerings(board, chord, span, filters))
}
