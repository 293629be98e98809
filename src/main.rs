use fretcalc::catalog::ResolvedPreset;
use fretcalc::chord::split_chord_name;
use fretcalc::{
    audio, pitch, Catalog, ChordCalc, FilterKind, FretError, FretPosition, Mode, NavigationEvent,
    Preset, Root, SelectionState, TraversalMode,
};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "\
Usage: fretcalc <command> [options]

Commands:
  chord <symbol>                 fingerings for a chord (C, F#m7, Bbmaj7)
  scale <root> <scale>           scale notes, two-octave path with --start
  identify <string:fret>...      name the chord under the touched frets
  progression <root> <title>     fingerings for each chord of a progression
  tuning                         open-string tones of the instrument
  list <what>                    chords, scales, instruments, capos, progressions, filters

Options:
  --instrument <title>           default: Guitar
  --span <frets>                 search window width
  --capo <name>@<fret>           place a capo (repeatable)
  --filter <name>                switch a filter on (repeatable)
  --preset <file.yaml>           instrument, capos, filters and span from a preset
  --catalog <file.yaml>          replace the built-in catalog
  --start <string>:<fret>        scale path start, must be a root
  --mode <mode>                  normal, down, open or FourOnString
  --continuity                   keep neck position across progression chords
  --step <n>                     move the fingering (or progression chord) pointer";

#[derive(Debug, Default)]
struct Options {
    command: String,
    args: Vec<String>,
    instrument: Option<String>,
    span: Option<u8>,
    capos: Vec<(String, u8)>,
    filters: Vec<FilterKind>,
    preset: Option<String>,
    catalog: Option<String>,
    start: Option<FretPosition>,
    mode: TraversalMode,
    continuity: bool,
    step: isize,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fretcalc=info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    let output = parse_args(&args).and_then(|options| run(&options));
    match output {
        Ok(json) => println!("{}", json),
        Err(FretError::Usage(msg)) => {
            eprintln!("Error: {}", msg);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, FretError> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let flag = arg.as_str();
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| FretError::Usage(format!("{} needs a value", flag)))
        };
        match flag {
            "--instrument" => options.instrument = Some(value()?),
            "--span" => {
                let span = value()?;
                options.span = Some(
                    span.parse()
                        .map_err(|_| FretError::Usage(format!("bad span '{}'", span)))?,
                );
            }
            "--capo" => {
                let spec = value()?;
                let (name, fret) = spec
                    .rsplit_once('@')
                    .and_then(|(name, fret)| Some((name.to_string(), fret.parse().ok()?)))
                    .ok_or_else(|| FretError::Usage(format!("expected <name>@<fret>, got '{}'", spec)))?;
                options.capos.push((name, fret));
            }
            "--filter" => options.filters.push(value()?.parse()?),
            "--preset" => options.preset = Some(value()?),
            "--catalog" => options.catalog = Some(value()?),
            "--start" => options.start = Some(value()?.parse()?),
            "--mode" => options.mode = value()?.parse()?,
            "--continuity" => options.continuity = true,
            "--step" => {
                let step = value()?;
                options.step = step
                    .parse()
                    .map_err(|_| FretError::Usage(format!("bad step '{}'", step)))?;
            }
            _ if flag.starts_with("--") => {
                return Err(FretError::Usage(format!("unknown option {}", flag)))
            }
            _ if options.command.is_empty() => options.command = arg.clone(),
            _ => options.args.push(arg.clone()),
        }
    }
    Ok(options)
}

fn read(path: &str) -> Result<String, FretError> {
    fs::read_to_string(path)
        .map_err(|e| FretError::Usage(format!("cannot read '{}': {}", path, e)))
}

fn positional<'a>(options: &'a Options, index: usize, name: &str) -> Result<&'a str, FretError> {
    options
        .args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| FretError::Usage(format!("{} needs a {}", options.command, name)))
}

/// Instrument, capos, filters and span from the preset and flags
fn selection(catalog: &Catalog, options: &Options) -> Result<SelectionState, FretError> {
    let mut selection = SelectionState::default();
    let setup = match &options.preset {
        Some(path) => Preset::from_yaml(&read(path)?)?.resolve(catalog)?,
        None => {
            let instrument = catalog
                .instrument(options.instrument.as_deref().unwrap_or("Guitar"))?
                .clone();
            ResolvedPreset {
                span: instrument.span,
                instrument,
                capos: Default::default(),
                filters: Default::default(),
            }
        }
    };
    selection.apply_preset(setup);

    if let (Some(title), Some(_)) = (&options.instrument, &options.preset) {
        selection.instrument = Some(catalog.instrument(title)?.clone());
    }
    if let Some(span) = options.span {
        selection.span = Some(span.min(selection.max_fret));
    }
    let strings = selection.instrument.as_ref().map_or(0, |i| i.string_count());
    for (name, fret) in &options.capos {
        selection.capos.set(*fret, catalog.capo(name)?.mask_for(strings));
    }
    for &kind in &options.filters {
        selection.filters.insert(kind);
    }
    Ok(selection)
}

fn run(options: &Options) -> Result<String, FretError> {
    let catalog = match &options.catalog {
        Some(path) => Catalog::from_yaml(&read(path)?)?,
        None => Catalog::builtin()?,
    };

    if options.command == "list" {
        return list(&catalog, positional(options, 0, "list name")?);
    }

    let mut selection = selection(&catalog, options)?;
    match options.command.as_str() {
        "chord" => {
            let symbol = positional(options, 0, "chord symbol")?;
            let (root, chord) = split_chord_name(symbol)
                .ok_or_else(|| FretError::InvalidNote(symbol.to_string()))?;
            let chord = if chord.is_empty() { "maj" } else { chord };
            selection.root = Some(root.parse()?);
            selection.chord = Some(catalog.chord(chord)?.clone());
            selection.mode = Mode::ChordFinder;
        }
        "scale" => {
            let root: Root = positional(options, 0, "root")?.parse()?;
            let name = options.args[1..].join(" ");
            selection.root = Some(root);
            selection.scale = Some(catalog.scale(&name)?.clone());
            selection.mode = Mode::Scale;
        }
        "identify" => selection.mode = Mode::Identify,
        "progression" => {
            let root: Root = positional(options, 0, "root")?.parse()?;
            let title = options.args[1..].join(" ");
            selection.root = Some(root);
            selection.progression = Some(catalog.progression(&title)?.clone());
            selection.mode = Mode::Progression;
        }
        "tuning" => {
            let instrument = selection
                .instrument
                .as_ref()
                .ok_or_else(|| FretError::Usage("no instrument".to_string()))?;
            let out = serde_json::json!({
                "title": instrument.title,
                "label": pitch::tuning_label(&instrument.tuning),
                "tones": audio::tuning_tones(instrument),
            });
            return Ok(serde_json::to_string_pretty(&out)?);
        }
        other => return Err(FretError::Usage(format!("unknown command '{}'", other))),
    }

    let mut calc = ChordCalc::with_selection(catalog, selection)?;
    match options.command.as_str() {
        "identify" => {
            for arg in &options.args {
                calc.navigate(NavigationEvent::Touch(arg.parse()?))?;
            }
        }
        "scale" => {
            if let Some(start) = options.start {
                calc.navigate(NavigationEvent::AnchorScale {
                    start,
                    mode: options.mode,
                })?;
            }
        }
        "progression" => {
            calc.navigate(NavigationEvent::SetContinuity(options.continuity))?;
            for _ in 0..options.step.unsigned_abs() {
                calc.navigate(NavigationEvent::StepChord(options.step.signum()))?;
            }
        }
        _ => {
            if options.step != 0 {
                calc.navigate(NavigationEvent::StepFingering(options.step))?;
            }
        }
    }
    Ok(serde_json::to_string_pretty(calc.payload())?)
}

fn list(catalog: &Catalog, what: &str) -> Result<String, FretError> {
    let names: Vec<String> = match what {
        "chords" => catalog.chords.iter().map(|c| c.name.clone()).collect(),
        "scales" => catalog.scales.iter().map(|s| s.name.clone()).collect(),
        "instruments" => catalog.instruments.iter().map(|i| i.title.clone()).collect(),
        "capos" => catalog.capos.iter().map(|c| c.name.clone()).collect(),
        "progressions" => catalog.progressions.iter().map(|p| p.title.clone()).collect(),
        "filters" => FilterKind::ALL
            .iter()
            .map(|&k| match catalog.filter_description(k) {
                Some(text) => format!("{}: {}", k, text),
                None => k.to_string(),
            })
            .collect(),
        other => return Err(FretError::Usage(format!("cannot list '{}'", other))),
    };
    Ok(serde_json::to_string_pretty(&names)?)
}
