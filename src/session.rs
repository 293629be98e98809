//! # Session Engine
//!
//! The host keeps a [`SelectionState`] (what is being looked at) and a
//! [`NavigationState`] (where the user is within the results). [`compute`]
//! turns the pair into a [`RenderPayload`] and is a pure function of them plus
//! the catalog.
//!
//! [`ChordCalc`] wraps that for interactive use. It applies
//! [`SelectionEvent`]s and [`NavigationEvent`]s, recomputes the payload and
//! tells each registered [`Observer`] which kind of change happened. An event
//! whose recomputation fails leaves the previous state in place.
//!
//! ## Pointer Lifetime
//! - The chord-finder pointer goes back to 0 on any selection change.
//! - Progression pointers survive everything except a new progression or root.
//! - Touched positions and the scale start are dropped with the instrument.

use crate::audio::{fingering_tones, position_tones, Tone};
use crate::catalog::{Catalog, ResolvedPreset};
use crate::chord::{ChordSpec, ChordSpelling, ChordType};
use crate::error::FretError;
use crate::filter::{FilterKind, FilterSet};
use crate::fingering::{nearest_to_fret, RankedFingering};
use crate::identify::{identify, touched_by_string, IdentifiedChord};
use crate::instrument::{Capo, CapoSet, Fretboard, Instrument, InstrumentKind, DEFAULT_MAX_FRET};
use crate::pitch::{prefers_flats, tuning_label, PitchClass};
use crate::progression::{ProgressionDef, ProgressionNavigator};
use crate::scale::{chord_scale, scale_notes, ChordScalePoint, ScaleNote, ScaleSpec, ScaleType};
use crate::traversal::{two_octave_scale, FretPosition, TraversalMode};
use crate::{chord_fingerings, progression_fingerings};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    ChordFinder,
    Identify,
    Scale,
    Progression,
}

impl FromStr for Mode {
    type Err = FretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chord" | "chordfinder" => Ok(Mode::ChordFinder),
            "identify" => Ok(Mode::Identify),
            "scale" => Ok(Mode::Scale),
            "progression" => Ok(Mode::Progression),
            _ => Err(FretError::Usage(format!("unknown mode '{}'", s))),
        }
    }
}

/// Selected root, keeping the spelling the user chose (`Bb` vs `A#`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Root {
    pub pitch: PitchClass,
    pub name: String,
}

impl FromStr for Root {
    type Err = FretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pitch = PitchClass::from_name(s).ok_or_else(|| FretError::InvalidNote(s.to_string()))?;
        let mut name = s.trim().to_string();
        name[..1].make_ascii_uppercase();
        Ok(Root { pitch, name })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub mode: Mode,
    pub instrument: Option<Instrument>,
    pub root: Option<Root>,
    pub chord: Option<ChordType>,
    pub scale: Option<ScaleType>,
    pub progression: Option<ProgressionDef>,
    /// Overrides the instrument's default span
    pub span: Option<u8>,
    pub max_fret: u8,
    pub capos: CapoSet,
    pub filters: FilterSet,
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState {
            mode: Mode::default(),
            instrument: None,
            root: None,
            chord: None,
            scale: None,
            progression: None,
            span: None,
            max_fret: DEFAULT_MAX_FRET,
            capos: CapoSet::new(),
            filters: FilterSet::new(),
        }
    }
}

impl SelectionState {
    /// Effective search span
    pub fn span(&self) -> Option<u8> {
        self.span.or(self.instrument.as_ref().map(|i| i.span))
    }

    pub fn apply_preset(&mut self, preset: ResolvedPreset) {
        self.span = Some(preset.span);
        self.instrument = Some(preset.instrument);
        self.capos = preset.capos;
        self.filters = preset.filters;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Root(Root),
    Chord(ChordType),
    Scale(ScaleType),
    Instrument(Instrument),
    Span(u8),
    AddCapo { fret: u8, mask: Vec<bool> },
    RemoveCapo(u8),
    ClearCapos,
    Filters(FilterSet),
    ToggleFilter(FilterKind),
    Mode(Mode),
    Progression(ProgressionDef),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationState {
    /// Chord-finder pointer
    pub fingering: usize,
    /// Current progression chord
    pub chord: usize,
    /// Progression pointer per chord
    pub pointers: Vec<usize>,
    pub continuity: bool,
    /// Centroid of the progression fingering last shown
    pub centroid: Option<f64>,
    pub scale_start: Option<FretPosition>,
    pub traversal: TraversalMode,
    /// Identify-mode touches
    pub touched: Vec<FretPosition>,
}

impl NavigationState {
    /// Add a touch, or take it away if already there; one per string
    pub fn toggle_touch(&mut self, position: FretPosition) {
        if let Some(i) = self.touched.iter().position(|&p| p == position) {
            self.touched.remove(i);
        } else {
            self.touched.retain(|p| p.string != position.string);
            self.touched.push(position);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    StepFingering(isize),
    SetFingering(usize),
    /// Long-press: first fingering near this fret
    JumpToFret(u8),
    StepChord(isize),
    SetContinuity(bool),
    AnchorScale { start: FretPosition, mode: TraversalMode },
    ClearScale,
    Touch(FretPosition),
    ClearTouches,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentView {
    pub title: String,
    pub tuning: Vec<i32>,
    pub tuning_label: String,
    pub kind: InstrumentKind,
    pub five_string_banjo: bool,
    pub span: u8,
    pub octave: i32,
    pub offsets: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionChordView {
    pub title: String,
    pub root: PitchClass,
    pub chord_type: String,
    pub fingerings: Vec<RankedFingering>,
    pub pointer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionView {
    pub title: String,
    pub chords: Vec<ProgressionChordView>,
    pub current: usize,
    pub centroid: Option<f64>,
    pub continuity: bool,
}

/// Everything a host needs to draw and play the current state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    pub mode: Mode,
    pub instrument: Option<InstrumentView>,
    pub capos: Vec<Capo>,
    pub root: Option<Root>,
    pub chord: Option<String>,
    pub spelling: Option<ChordSpelling>,
    pub filters: FilterSet,
    pub available_filters: Vec<FilterKind>,
    pub fingerings: Vec<RankedFingering>,
    pub pointer: Option<usize>,
    pub chord_scale: Vec<Vec<ChordScalePoint>>,
    pub scale: Option<String>,
    pub relative_major: Option<String>,
    pub scale_notes: Vec<Vec<ScaleNote>>,
    pub scale_path: Option<Vec<FretPosition>>,
    pub progression: Option<ProgressionView>,
    pub identified: Vec<IdentifiedChord>,
    /// Notes to play for the current fingering, path or touches
    pub tones: Vec<Tone>,
}

/// Compute the render payload for a selection
///
/// Missing pieces (no instrument, root or chord) give an emptier payload,
/// not an error.
///
/// # Errors
/// - [`FretError::CapoMask`] when a capo does not fit the instrument
/// - [`FretError::InvalidScaleStep`] for a bad scale
/// - [`FretError::UnknownChord`] for a progression naming an unknown chord type
pub fn compute(
    catalog: &Catalog,
    selection: &SelectionState,
    navigation: &NavigationState,
) -> Result<RenderPayload, FretError> {
    let mut payload = RenderPayload {
        mode: selection.mode,
        capos: selection.capos.iter().collect(),
        root: selection.root.clone(),
        filters: selection.filters.clone(),
        ..RenderPayload::default()
    };
    let Some(instrument) = &selection.instrument else {
        return Ok(payload);
    };
    let board = Fretboard::new(instrument, &selection.capos, selection.max_fret)?;
    let span = selection.span().unwrap_or(instrument.span);
    payload.available_filters = FilterKind::available_for(instrument.kind);
    payload.instrument = Some(InstrumentView {
        title: instrument.title.clone(),
        tuning: instrument.tuning.clone(),
        tuning_label: tuning_label(&instrument.tuning),
        kind: instrument.kind,
        five_string_banjo: instrument.is_five_string_banjo(),
        span,
        octave: instrument.octave,
        offsets: board.offsets.clone(),
    });

    let chord = match (&selection.root, &selection.chord) {
        (Some(root), Some(chord_type)) => {
            let spec = ChordSpec::new(root.pitch, chord_type);
            payload.chord = Some(spec.name.clone());
            payload.spelling = Some(spec.spell(&root.name));
            Some(spec)
        }
        _ => None,
    };

    match selection.mode {
        Mode::ChordFinder => {
            if let Some(chord) = &chord {
                payload.chord_scale =
                    chord_scale(&board.open_pitches, &board.offsets, board.max_fret, chord);
                payload.fingerings = chord_fingerings(&board, chord, span, &selection.filters);
                if !payload.fingerings.is_empty() {
                    let pointer = navigation.fingering.min(payload.fingerings.len() - 1);
                    payload.tones = fingering_tones(
                        payload.fingerings[pointer].fingering(),
                        &board.open_pitches,
                        instrument.octave,
                    );
                    payload.pointer = Some(pointer);
                }
            }
        }
        Mode::Identify => {
            if let Some(chord) = &chord {
                payload.chord_scale =
                    chord_scale(&board.open_pitches, &board.offsets, board.max_fret, chord);
            }
            payload.identified = identify(
                &navigation.touched,
                &board.open_pitches,
                &board.offsets,
                &catalog.chords,
            );
            let touched: Vec<FretPosition> = touched_by_string(&navigation.touched, &board.offsets)
                .into_iter()
                .map(|(string, fret)| FretPosition::new(string, fret))
                .collect();
            payload.tones = position_tones(&touched, &board.open_pitches, instrument.octave);
        }
        Mode::Scale => {
            if let (Some(root), Some(scale_type)) = (&selection.root, &selection.scale) {
                let scale = ScaleSpec::new(root.pitch, scale_type)?;
                let notes = scale_notes(&board.open_pitches, &board.offsets, board.max_fret, &scale);
                payload.scale = Some(scale.name.clone());
                payload.relative_major = scale
                    .relative_major()
                    .map(|p| p.name(prefers_flats(&root.name)).to_string());
                payload.scale_path = navigation.scale_start.and_then(|start| {
                    two_octave_scale(&board.open_pitches, &notes, &scale, start, navigation.traversal)
                });
                if let Some(path) = &payload.scale_path {
                    payload.tones = position_tones(path, &board.open_pitches, instrument.octave);
                }
                payload.scale_notes = notes;
            }
        }
        Mode::Progression => {
            if let (Some(root), Some(def)) = (&selection.root, &selection.progression) {
                let navigator = progression_navigator(catalog, selection, navigation, &board, span, root, def)?;
                if let Some(entry) = def.resolve(root.pitch)?.get(navigator.current_chord()) {
                    let spec = ChordSpec::new(entry.root, catalog.chord(&entry.chord_type)?);
                    payload.chord = Some(spec.name.clone());
                    payload.spelling = Some(spec.spell(&entry.root.name(prefers_flats(&root.name))));
                    payload.chord_scale =
                        chord_scale(&board.open_pitches, &board.offsets, board.max_fret, &spec);
                }
                if let Some(current) = navigator.current_fingering() {
                    payload.tones =
                        fingering_tones(current.fingering(), &board.open_pitches, instrument.octave);
                }
                payload.progression = Some(progression_view(def, root, &navigator)?);
            }
        }
    }
    Ok(payload)
}

fn progression_navigator(
    catalog: &Catalog,
    selection: &SelectionState,
    navigation: &NavigationState,
    board: &Fretboard,
    span: u8,
    root: &Root,
    def: &ProgressionDef,
) -> Result<ProgressionNavigator, FretError> {
    let lists = def
        .resolve(root.pitch)?
        .iter()
        .map(|entry| {
            let chord_type = catalog.chord(&entry.chord_type)?;
            let spec = ChordSpec::new(entry.root, chord_type);
            Ok(progression_fingerings(board, &spec, span, &selection.filters))
        })
        .collect::<Result<Vec<_>, FretError>>()?;
    Ok(ProgressionNavigator::restore(
        lists,
        &navigation.pointers,
        navigation.chord,
        navigation.continuity,
        navigation.centroid,
    ))
}

fn progression_view(
    def: &ProgressionDef,
    root: &Root,
    navigator: &ProgressionNavigator,
) -> Result<ProgressionView, FretError> {
    let flats = prefers_flats(&root.name);
    let chords = def
        .resolve(root.pitch)?
        .into_iter()
        .zip(navigator.lists())
        .zip(navigator.pointers())
        .map(|((entry, list), &pointer)| ProgressionChordView {
            title: format!("{}{}", entry.root.name(flats), entry.chord_type),
            root: entry.root,
            chord_type: entry.chord_type,
            fingerings: list.clone(),
            pointer,
        })
        .collect();
    Ok(ProgressionView {
        title: def.title.clone(),
        chords,
        current: navigator.current_chord(),
        centroid: navigator.centroid(),
        continuity: navigator.continuity(),
    })
}

/// Which half of the state an update touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SelectionChanged,
    NavigationChanged,
}

pub trait Observer {
    fn notify(&mut self, kind: EventKind, payload: &RenderPayload);
}

/// Interactive session over a catalog
///
/// ```
/// use fretcalc::{Catalog, ChordCalc, SelectionEvent};
///
/// let catalog = Catalog::builtin().unwrap();
/// let guitar = catalog.instrument("Guitar").unwrap().clone();
/// let major = catalog.chord("maj").unwrap().clone();
///
/// let mut calc = ChordCalc::new(catalog);
/// calc.select(SelectionEvent::Instrument(guitar)).unwrap();
/// calc.select(SelectionEvent::Root("G".parse().unwrap())).unwrap();
/// let payload = calc.select(SelectionEvent::Chord(major)).unwrap();
/// assert!(!payload.fingerings.is_empty());
/// assert_eq!(payload.pointer, Some(0));
/// ```
pub struct ChordCalc {
    catalog: Catalog,
    selection: SelectionState,
    navigation: NavigationState,
    payload: RenderPayload,
    observers: Vec<Box<dyn Observer>>,
}

impl ChordCalc {
    pub fn new(catalog: Catalog) -> Self {
        ChordCalc {
            catalog,
            selection: SelectionState::default(),
            navigation: NavigationState::default(),
            payload: RenderPayload::default(),
            observers: Vec::new(),
        }
    }

    /// Start from a prepared selection
    pub fn with_selection(catalog: Catalog, selection: SelectionState) -> Result<Self, FretError> {
        let navigation = NavigationState::default();
        let payload = compute(&catalog, &selection, &navigation)?;
        Ok(ChordCalc {
            catalog,
            selection,
            navigation,
            payload,
            observers: Vec::new(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn payload(&self) -> &RenderPayload {
        &self.payload
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn select(&mut self, event: SelectionEvent) -> Result<&RenderPayload, FretError> {
        let mut selection = self.selection.clone();
        let mut navigation = self.navigation.clone();
        navigation.fingering = 0;

        match event {
            SelectionEvent::Root(root) => {
                selection.root = Some(root);
                reset_progression(&mut navigation);
            }
            SelectionEvent::Chord(chord) => selection.chord = Some(chord),
            SelectionEvent::Scale(scale) => selection.scale = Some(scale),
            SelectionEvent::Instrument(instrument) => {
                info!(instrument = %instrument.title, "instrument changed");
                selection.instrument = Some(instrument);
                selection.span = None;
                selection.capos.clear();
                navigation.touched.clear();
                navigation.scale_start = None;
            }
            SelectionEvent::Span(span) => selection.span = Some(span.min(selection.max_fret)),
            SelectionEvent::AddCapo { fret, mask } => selection.capos.set(fret, mask),
            SelectionEvent::RemoveCapo(fret) => {
                selection.capos.remove(fret);
            }
            SelectionEvent::ClearCapos => selection.capos.clear(),
            SelectionEvent::Filters(filters) => selection.filters = filters,
            SelectionEvent::ToggleFilter(kind) => selection.filters.toggle(kind),
            SelectionEvent::Mode(mode) => selection.mode = mode,
            SelectionEvent::Progression(def) => {
                selection.progression = Some(def);
                reset_progression(&mut navigation);
            }
        }

        self.commit(selection, navigation, EventKind::SelectionChanged)
    }

    pub fn navigate(&mut self, event: NavigationEvent) -> Result<&RenderPayload, FretError> {
        let mut navigation = self.navigation.clone();
        let in_progression = self.selection.mode == Mode::Progression;

        match event {
            NavigationEvent::StepFingering(delta) if in_progression => {
                self.with_navigator(&mut navigation, |nav| nav.step_fingering(delta));
            }
            NavigationEvent::SetFingering(index) if in_progression => {
                self.with_navigator(&mut navigation, |nav| nav.set_fingering(index));
            }
            NavigationEvent::JumpToFret(fret) if in_progression => {
                self.with_navigator(&mut navigation, |nav| {
                    nav.jump_to_fret(fret);
                });
            }
            NavigationEvent::StepFingering(delta) => {
                let target = navigation.fingering.saturating_add_signed(delta);
                navigation.fingering = self.clamp_fingering(target);
            }
            NavigationEvent::SetFingering(index) => {
                navigation.fingering = self.clamp_fingering(index);
            }
            NavigationEvent::JumpToFret(fret) => {
                if let Some(index) = nearest_to_fret(&self.payload.fingerings, fret) {
                    navigation.fingering = index;
                }
            }
            NavigationEvent::StepChord(delta) => {
                self.with_navigator(&mut navigation, |nav| nav.step_chord(delta));
            }
            NavigationEvent::SetContinuity(on) => navigation.continuity = on,
            NavigationEvent::AnchorScale { start, mode } => {
                navigation.scale_start = Some(start);
                navigation.traversal = mode;
            }
            NavigationEvent::ClearScale => navigation.scale_start = None,
            NavigationEvent::Touch(position) => navigation.toggle_touch(position),
            NavigationEvent::ClearTouches => navigation.touched.clear(),
        }

        let selection = self.selection.clone();
        self.commit(selection, navigation, EventKind::NavigationChanged)
    }

    fn clamp_fingering(&self, index: usize) -> usize {
        index.min(self.payload.fingerings.len().saturating_sub(1))
    }

    /// Run a progression transition against the lists in the current payload
    fn with_navigator(&self, navigation: &mut NavigationState, step: impl FnOnce(&mut ProgressionNavigator)) {
        let Some(view) = &self.payload.progression else {
            return;
        };
        let lists = view.chords.iter().map(|c| c.fingerings.clone()).collect();
        let mut nav = ProgressionNavigator::restore(
            lists,
            &navigation.pointers,
            navigation.chord,
            navigation.continuity,
            navigation.centroid,
        );
        step(&mut nav);
        navigation.pointers = nav.pointers().to_vec();
        navigation.chord = nav.current_chord();
        navigation.centroid = nav.centroid();
    }

    fn commit(
        &mut self,
        selection: SelectionState,
        mut navigation: NavigationState,
        kind: EventKind,
    ) -> Result<&RenderPayload, FretError> {
        let payload = compute(&self.catalog, &selection, &navigation)?;
        if let Some(view) = &payload.progression {
            navigation.pointers = view.chords.iter().map(|c| c.pointer).collect();
            navigation.chord = view.current;
            navigation.centroid = view.centroid;
        }
        debug!(?kind, mode = ?payload.mode, fingerings = payload.fingerings.len(), "recomputed");
        self.selection = selection;
        self.navigation = navigation;
        self.payload = payload;
        for observer in &mut self.observers {
            observer.notify(kind, &self.payload);
        }
        Ok(&self.payload)
    }
}

fn reset_progression(navigation: &mut NavigationState) {
    navigation.chord = 0;
    navigation.pointers.clear();
    navigation.centroid = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{closest_by_ladder, CENTROID_LADDER};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<EventKind>>>);

    impl Observer for Recorder {
        fn notify(&mut self, kind: EventKind, _payload: &RenderPayload) {
            self.0.borrow_mut().push(kind);
        }
    }

    fn calc_with(instrument: &str, root: &str, chord: &str) -> ChordCalc {
        let catalog = Catalog::builtin().unwrap();
        let instrument = catalog.instrument(instrument).unwrap().clone();
        let chord = catalog.chord(chord).unwrap().clone();
        let mut calc = ChordCalc::new(catalog);
        calc.select(SelectionEvent::Instrument(instrument)).unwrap();
        calc.select(SelectionEvent::Root(root.parse().unwrap())).unwrap();
        calc.select(SelectionEvent::Chord(chord)).unwrap();
        calc
    }

    #[test]
    fn test_empty_selection_is_empty_payload() {
        let catalog = Catalog::builtin().unwrap();
        let payload = compute(&catalog, &SelectionState::default(), &NavigationState::default()).unwrap();
        assert!(payload.instrument.is_none());
        assert!(payload.fingerings.is_empty());
        assert_eq!(payload.pointer, None);
    }

    #[test]
    fn test_root_parse_keeps_spelling() {
        let root: Root = "bb".parse().unwrap();
        assert_eq!(root.name, "Bb");
        assert_eq!(root.pitch.value(), 10);
        assert!(matches!("X".parse::<Root>(), Err(FretError::InvalidNote(_))));
    }

    #[test]
    fn test_chord_finder_payload() {
        let calc = calc_with("Guitar", "C", "maj");
        let payload = calc.payload();
        assert_eq!(payload.chord.as_deref(), Some("maj"));
        assert_eq!(payload.spelling.as_ref().unwrap().notes, vec!["C", "E", "G"]);
        assert_eq!(payload.chord_scale.len(), 6);
        assert!(!payload.tones.is_empty());
        assert_eq!(payload.instrument.as_ref().unwrap().tuning_label, "E A d g b e'");
    }

    #[test]
    fn test_fingering_pointer_clamps() {
        let mut calc = calc_with("Guitar", "C", "maj");
        let len = calc.payload().fingerings.len();
        calc.navigate(NavigationEvent::StepFingering(-1)).unwrap();
        assert_eq!(calc.payload().pointer, Some(0));
        calc.navigate(NavigationEvent::SetFingering(len + 10)).unwrap();
        assert_eq!(calc.payload().pointer, Some(len - 1));
    }

    #[test]
    fn test_selection_change_resets_pointer() {
        let mut calc = calc_with("Guitar", "C", "maj");
        calc.navigate(NavigationEvent::SetFingering(3)).unwrap();
        calc.select(SelectionEvent::ToggleFilter(FilterKind::NoOpen)).unwrap();
        assert_eq!(calc.payload().pointer, Some(0));
        assert!(calc
            .payload()
            .fingerings
            .iter()
            .all(|f| !f.fingering().has_open()));
    }

    #[test]
    fn test_bad_capo_keeps_previous_state() {
        let mut calc = calc_with("Guitar", "C", "maj");
        let before = calc.payload().fingerings.len();
        let err = calc.select(SelectionEvent::AddCapo { fret: 2, mask: vec![true; 4] });
        assert!(matches!(err, Err(FretError::CapoMask { .. })));
        assert!(calc.selection().capos.is_empty());
        assert_eq!(calc.payload().fingerings.len(), before);
    }

    #[test]
    fn test_observers_hear_event_kinds() {
        let mut calc = calc_with("Guitar", "C", "maj");
        let seen = Rc::new(RefCell::new(Vec::new()));
        calc.subscribe(Box::new(Recorder(seen.clone())));
        calc.navigate(NavigationEvent::StepFingering(1)).unwrap();
        calc.select(SelectionEvent::Span(3)).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![EventKind::NavigationChanged, EventKind::SelectionChanged]
        );
    }

    #[test]
    fn test_scale_mode_path_and_relative_major() {
        let catalog = Catalog::builtin().unwrap();
        let guitar = catalog.instrument("Guitar").unwrap().clone();
        let dorian = catalog.scale("dorian").unwrap().clone();
        let mut calc = ChordCalc::new(catalog);
        calc.select(SelectionEvent::Instrument(guitar)).unwrap();
        calc.select(SelectionEvent::Mode(Mode::Scale)).unwrap();
        calc.select(SelectionEvent::Root("D".parse().unwrap())).unwrap();
        calc.select(SelectionEvent::Scale(dorian)).unwrap();
        assert_eq!(calc.payload().relative_major.as_deref(), Some("C"));
        assert!(calc.payload().scale_path.is_none());

        // open D string
        let start = FretPosition::new(2, 0);
        let payload = calc
            .navigate(NavigationEvent::AnchorScale { start, mode: TraversalMode::Normal })
            .unwrap();
        let path = payload.scale_path.as_ref().unwrap();
        assert_eq!(path[0], start);
        assert_eq!(payload.tones.len(), path.len());
    }

    #[test]
    fn test_identify_mode_from_touches() {
        let catalog = Catalog::builtin().unwrap();
        let guitar = catalog.instrument("Guitar").unwrap().clone();
        let mut calc = ChordCalc::new(catalog);
        calc.select(SelectionEvent::Instrument(guitar)).unwrap();
        calc.select(SelectionEvent::Mode(Mode::Identify)).unwrap();
        for (string, fret) in [(0, 3), (1, 2), (2, 0), (3, 0), (4, 0), (5, 3)] {
            calc.navigate(NavigationEvent::Touch(FretPosition::new(string, fret))).unwrap();
        }
        let payload = calc.payload();
        assert_eq!(payload.identified[0].title, "Gmaj");
        assert_eq!(payload.tones.len(), 6);

        // touching the same spot again lifts it
        calc.navigate(NavigationEvent::Touch(FretPosition::new(5, 3))).unwrap();
        assert_eq!(calc.navigation().touched.len(), 5);
    }

    #[test]
    fn test_progression_navigation() {
        let catalog = Catalog::builtin().unwrap();
        let guitar = catalog.instrument("Guitar").unwrap().clone();
        let def = catalog.progression("I IV V").unwrap().clone();
        let mut calc = ChordCalc::new(catalog);
        calc.select(SelectionEvent::Instrument(guitar)).unwrap();
        calc.select(SelectionEvent::Mode(Mode::Progression)).unwrap();
        calc.select(SelectionEvent::Root("G".parse().unwrap())).unwrap();
        calc.select(SelectionEvent::Progression(def)).unwrap();

        let view = calc.payload().progression.as_ref().unwrap();
        let titles: Vec<&str> = view.chords.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Gmaj", "Cmaj", "Dmaj"]);
        assert_eq!(view.current, 0);

        calc.navigate(NavigationEvent::SetContinuity(true)).unwrap();
        calc.navigate(NavigationEvent::SetFingering(5)).unwrap();
        let before = calc.payload().progression.as_ref().unwrap().centroid.unwrap();
        calc.navigate(NavigationEvent::StepChord(1)).unwrap();
        let view = calc.payload().progression.as_ref().unwrap();
        assert_eq!(view.current, 1);
        let after = view.centroid.unwrap();
        assert!((after - before).abs() < 3.0);

        // pointers survive a filter change but not a new root
        calc.select(SelectionEvent::Span(4)).unwrap();
        assert_eq!(calc.payload().progression.as_ref().unwrap().current, 1);
        calc.select(SelectionEvent::Root("A".parse().unwrap())).unwrap();
        assert_eq!(calc.payload().progression.as_ref().unwrap().current, 0);
    }

    fn progression_calc(title: &str, root: &str) -> ChordCalc {
        let catalog = Catalog::builtin().unwrap();
        let guitar = catalog.instrument("Guitar").unwrap().clone();
        let def = catalog.progression(title).unwrap().clone();
        let mut calc = ChordCalc::new(catalog);
        calc.select(SelectionEvent::Instrument(guitar)).unwrap();
        calc.select(SelectionEvent::Mode(Mode::Progression)).unwrap();
        calc.select(SelectionEvent::Root(root.parse().unwrap())).unwrap();
        calc.select(SelectionEvent::Progression(def)).unwrap();
        calc
    }

    #[test]
    fn test_progression_spells_current_chord() {
        let mut calc = progression_calc("I IV V", "G");
        let payload = calc.payload();
        assert_eq!(payload.spelling.as_ref().unwrap().notes, vec!["G", "B", "D"]);
        assert_eq!(payload.chord_scale.len(), 6);
        assert!(payload.chord_scale[0].iter().any(|p| p.fret == 3 && p.interval == 0));

        let payload = calc.navigate(NavigationEvent::StepChord(1)).unwrap();
        assert_eq!(payload.spelling.as_ref().unwrap().notes, vec!["C", "E", "G"]);
        assert!(payload.chord_scale[1].iter().any(|p| p.fret == 3 && p.interval == 0));
    }

    #[test]
    fn test_recompute_restores_by_centroid_with_continuity() {
        let mut calc = progression_calc("I IV V", "G");
        calc.navigate(NavigationEvent::SetContinuity(true)).unwrap();
        calc.navigate(NavigationEvent::SetFingering(5)).unwrap();
        let view = calc.payload().progression.as_ref().unwrap();
        assert_eq!(view.chords[0].pointer, 5);
        let saved = view.centroid.unwrap();
        assert_eq!(calc.navigation().centroid, Some(saved));

        // a capo shifts every fingering, the index no longer means the same place
        calc.select(SelectionEvent::AddCapo { fret: 2, mask: vec![true; 6] }).unwrap();
        let view = calc.payload().progression.as_ref().unwrap();
        let list = &view.chords[0].fingerings;
        let clamped = 5.min(list.len() - 1);
        let in_place = list[clamped]
            .centroid
            .is_some_and(|c| (c - saved).abs() < CENTROID_LADDER[0]);
        let expected = if in_place {
            clamped
        } else {
            closest_by_ladder(list, saved).unwrap_or(clamped)
        };
        assert_eq!(view.chords[0].pointer, expected);
        assert_eq!(calc.navigation().pointers[0], expected);
    }

    #[test]
    fn test_span_capped_at_neck_length() {
        let mut calc = calc_with("Guitar", "C", "maj");
        let payload = calc.select(SelectionEvent::Span(40)).unwrap();
        assert_eq!(payload.instrument.as_ref().unwrap().span, DEFAULT_MAX_FRET);
        assert!(payload
            .fingerings
            .iter()
            .all(|f| f.fingering().played().all(|(_, fret)| fret <= DEFAULT_MAX_FRET)));
    }
}
