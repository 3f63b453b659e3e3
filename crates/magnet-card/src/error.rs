//! Error types for card construction and symbol resolution.
//!
//! Only [`CardError`] ever reaches a caller: it covers everything that makes a
//! card unevaluable in principle. Resolution and claim failures are folded
//! into the card status by [`crate::EvaluationCard::evaluate`].

use std::path::PathBuf;

/// A card document is missing a required field or carries an invalid one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{field}` {reason}")]
pub struct MalformedCardError {
    /// Dotted path of the offending field, e.g. `symbols.ratio.code`.
    pub field: String,
    pub reason: String,
}

impl MalformedCardError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The internal symbol graph has no valid resolution order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cyclic symbol dependency: {}", format_cycle(.members))]
pub struct CyclicDependencyError {
    /// Members of one concrete cycle; each member depends on the next.
    pub members: Vec<String>,
}

fn format_cycle(members: &[String]) -> String {
    match members.first() {
        Some(first) => format!("{} -> {first}", members.join(" -> ")),
        None => "<empty>".to_string(),
    }
}

/// Errors that prevent an [`crate::EvaluationCard`] from being constructed.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("malformed card: {0}")]
    Malformed(#[from] MalformedCardError),

    #[error(transparent)]
    Cycle(#[from] CyclicDependencyError),

    #[error("failed to read card {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to resolve one symbol. Always reported through the card status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// A declared dependency is neither a resolved symbol nor an external binding.
    #[error("symbol `{symbol}` depends on `{dependency}`, which is neither a resolved symbol nor an external binding")]
    UnresolvedDependency { symbol: String, dependency: String },

    /// The symbol's code faulted while executing.
    #[error("symbol `{symbol}` failed to resolve: {cause}")]
    SymbolResolution { symbol: String, cause: String },

    /// The symbol's code ran to completion without binding the symbol's name.
    #[error("symbol `{symbol}` code completed without binding `{symbol}`")]
    MissingBinding { symbol: String },
}

impl ResolutionError {
    /// Name of the symbol whose resolution failed.
    pub fn symbol(&self) -> &str {
        match self {
            ResolutionError::UnresolvedDependency { symbol, .. }
            | ResolutionError::SymbolResolution { symbol, .. }
            | ResolutionError::MissingBinding { symbol } => symbol,
        }
    }
}

/// An external binding could not be converted into a script value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("invalid binding name `{0}`: names must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName(String),

    #[error("binding `{name}` could not be converted: {reason}")]
    Conversion { name: String, reason: String },

    #[error("bindings document must be an object, got {0}")]
    NotAnObject(String),
}
