use crate::cli::CardArgs;
use magnet_card::{Bindings, EvaluationCard};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "MAGNET_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";
const CARD_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Exit code for a card that cannot be constructed.
pub const EXIT_CARD_INVALID: i32 = 1;
/// Exit code for unusable command-line input.
pub const EXIT_USAGE: i32 = 2;

static INIT: Once = Once::new();

/// Install the stderr log subscriber.
///
/// Reads `MAGNET_LOG` (e.g. `MAGNET_LOG=magnet_card=debug`); falls back to
/// `warn` when unset or invalid. Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

/// Resolve, load, and construct the card named by `args`, or exit.
pub fn construct_card_or_exit(args: &CardArgs) -> (EvaluationCard, PathBuf) {
    let bindings = load_bindings_or_exit(args);
    let path = resolve_card_path_or_exit(&args.card, &args.cards_dir);
    let card = EvaluationCard::from_path(&path, bindings).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_CARD_INVALID);
    });
    (card, path)
}

/// Use `card` as given when it exists, else look it up under `cards_dir`,
/// also trying the usual card extensions.
pub fn resolve_card_path_or_exit(card: &str, cards_dir: &str) -> PathBuf {
    resolve_card_path(card, Path::new(cards_dir)).unwrap_or_else(|| {
        eprintln!("error: card not found: {card} (also searched {cards_dir})");
        std::process::exit(EXIT_CARD_INVALID);
    })
}

fn resolve_card_path(card: &str, cards_dir: &Path) -> Option<PathBuf> {
    let requested = PathBuf::from(card);
    if requested.is_file() {
        return Some(requested);
    }

    let in_dir = cards_dir.join(card);
    let mut candidates = std::iter::once(in_dir.clone()).chain(
        CARD_EXTENSIONS
            .iter()
            .map(move |extension| in_dir.with_extension(extension)),
    );
    candidates.find(|candidate| candidate.is_file())
}

fn load_bindings_or_exit(args: &CardArgs) -> Bindings {
    let mut bindings = match &args.bindings {
        Some(path) => read_bindings_file(path).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(EXIT_USAGE);
        }),
        None => Bindings::new(),
    };
    for assignment in &args.bind {
        let (name, value) = parse_assignment(assignment).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(EXIT_USAGE);
        });
        if let Err(e) = bindings.insert_json(name, &value) {
            eprintln!("error: {e}");
            std::process::exit(EXIT_USAGE);
        }
    }
    bindings
}

fn read_bindings_file(path: &str) -> Result<Bindings, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read bindings file {path}: {e}"))?;
    let document: Value = serde_yaml::from_str(&text)
        .map_err(|e| format!("failed to parse bindings file {path}: {e}"))?;
    Bindings::from_json_object(&document).map_err(|e| format!("{path}: {e}"))
}

/// Split `NAME=VALUE`; VALUE is JSON when it parses, a string otherwise.
pub fn parse_assignment(raw: &str) -> Result<(&str, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("binding `{raw}` must have the form NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("binding `{raw}` has an empty name"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name, value))
}

pub fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}
