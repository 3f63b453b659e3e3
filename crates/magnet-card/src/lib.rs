//! # Magnet Evaluation Cards
//!
//! A card states an empirical claim over a set of named symbols. The engine
//! resolves every symbol in dependency order, runs the claim against the
//! resolved values, and classifies the result:
//!
//! - **VERIFIED**: the claim completed normally;
//! - **FALSIFIED**: the claim raised the falsification signal (`assert`/`falsify`);
//! - **INCONCLUSIVE**: anything else went wrong, in a symbol or in the claim.
//!
//! ## Architecture
//!
//! ```text
//! CardLoader         ← YAML/JSON document → CardSpec (validated, immutable)
//!     │
//! SymbolGraph        ← declared-symbol edges, deterministic topological order
//!     │
//! ExecutionContext   ← bindings + Unresolved/Value slots, strict scoping
//!     │
//! ClaimEvaluator     ← claim over the full context, three-way outcome
//!     │
//! EvaluationCard     ← façade: summarize() / evaluate()
//! ```
//!
//! Symbol and claim code is [Rhai](https://rhai.rs) script.

pub mod bindings;
pub mod card;
pub mod claim;
pub mod context;
pub mod error;
pub mod graph;
pub mod loader;
pub mod script;
pub mod spec;
pub mod status;
pub mod summary;

pub use bindings::Bindings;
pub use card::EvaluationCard;
pub use claim::{ClaimEvaluator, ClaimOutcome, ClaimRuntimeFault};
pub use context::{ExecutionContext, SymbolValue};
pub use error::{BindingError, CardError, CyclicDependencyError, MalformedCardError, ResolutionError};
pub use graph::SymbolGraph;
pub use loader::CardLoader;
pub use script::{FalsificationSignal, ScriptEngine, ScriptFault};
pub use spec::{CardSpec, SymbolSpec};
pub use status::{Detail, EvaluationStatus, Fault, FaultKind, FaultOrigin};
pub use summary::{CardSummary, SymbolReport, SymbolState};

/// Re-exported so callers can build binding values without depending on Rhai.
pub use rhai::{Dynamic, FLOAT, INT};
