//! The evaluation card façade and its status state machine.
//!
//! ```text
//! UNVERIFIED ──evaluate()──▶ VERIFIED | FALSIFIED | INCONCLUSIVE
//!      ▲                              │
//!      └─────── (any state) ◀─evaluate() re-runs from scratch
//! ```

use crate::bindings::Bindings;
use crate::claim::{ClaimEvaluator, ClaimOutcome};
use crate::context::{ExecutionContext, SymbolValue};
use crate::error::CardError;
use crate::graph::SymbolGraph;
use crate::loader::CardLoader;
use crate::script::ScriptEngine;
use crate::spec::CardSpec;
use crate::status::{Detail, EvaluationStatus, Fault, FaultKind, FaultOrigin};
use crate::summary::{CardSummary, SymbolReport, SymbolState};
use rhai::Dynamic;
use std::path::Path;

pub struct EvaluationCard {
    spec: CardSpec,
    graph: SymbolGraph,
    order: Vec<usize>,
    context: ExecutionContext,
    engine: ScriptEngine,
    status: EvaluationStatus,
    detail: Option<Detail>,
}

impl std::fmt::Debug for EvaluationCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationCard")
            .field("title", &self.spec.title())
            .field("status", &self.status)
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}

impl EvaluationCard {
    /// Build a card from a validated spec.
    ///
    /// Fails with [`CardError::Cycle`] when the symbol graph has no
    /// resolution order.
    pub fn new(spec: CardSpec, bindings: Bindings) -> Result<Self, CardError> {
        let graph = SymbolGraph::build(&spec);
        let order = graph.resolution_indices()?;
        for shadowed in spec.symbols().filter(|symbol| bindings.contains(&symbol.name)) {
            tracing::warn!(
                symbol = %shadowed.name,
                "external binding shadowed by a declared symbol"
            );
        }
        let context = ExecutionContext::new(&spec, bindings);
        Ok(Self {
            spec,
            graph,
            order,
            context,
            engine: ScriptEngine::new(),
            status: EvaluationStatus::Unverified,
            detail: None,
        })
    }

    /// Load a card file.
    pub fn from_path(path: impl AsRef<Path>, bindings: Bindings) -> Result<Self, CardError> {
        Self::new(CardLoader::load_path(path)?, bindings)
    }

    /// Load a card from YAML or JSON text.
    pub fn from_yaml_str(text: &str, bindings: Bindings) -> Result<Self, CardError> {
        Self::new(CardLoader::load_str(text)?, bindings)
    }

    pub fn spec(&self) -> &CardSpec {
        &self.spec
    }

    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub fn status(&self) -> EvaluationStatus {
        self.status
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    /// Symbol names in the order `evaluate()` resolves them.
    pub fn resolution_order(&self) -> Vec<&str> {
        self.order.iter().map(|&index| self.graph.name(index)).collect()
    }

    /// Current value of a symbol or external binding.
    pub fn value(&self, name: &str) -> Option<&Dynamic> {
        self.context.lookup(name)
    }

    /// Resolve every symbol, run the claim, and adopt its outcome.
    ///
    /// Never fails: resolution faults end INCONCLUSIVE without running the
    /// claim, and claim faults are classified by [`ClaimEvaluator`].
    pub fn evaluate(&mut self) -> EvaluationStatus {
        let span = tracing::info_span!("evaluate", card = %self.spec.title());
        let _entered = span.enter();

        self.context.reset();
        self.detail = None;

        for &index in &self.order {
            let Some(symbol) = self.spec.symbol_at(index) else {
                continue;
            };
            if let Err(err) = self.context.resolve_symbol(&self.engine, symbol) {
                tracing::warn!(symbol = %symbol.name, error = %err, "symbol resolution failed");
                self.status = EvaluationStatus::Inconclusive;
                self.detail = Some(Detail::Fault(Fault::from(&err)));
                return self.finish();
            }
        }

        let outcome = ClaimEvaluator::new(&self.engine).evaluate(self.spec.claim_code(), &self.context);
        self.status = outcome.status();
        self.detail = match outcome {
            ClaimOutcome::Verified => None,
            ClaimOutcome::Falsified { message } => Some(Detail::Falsified(message)),
            ClaimOutcome::Fault(fault) => {
                tracing::warn!(error = %fault, "claim faulted");
                Some(Detail::Fault(Fault {
                    origin: FaultOrigin::Claim,
                    kind: FaultKind::ClaimRuntime,
                    message: fault.cause,
                }))
            }
        };
        self.finish()
    }

    fn finish(&self) -> EvaluationStatus {
        tracing::info!(
            status = %self.status,
            resolved = self.context.resolved_count(),
            symbols = self.spec.symbol_count(),
            "card evaluated"
        );
        self.status
    }

    /// Report of the card as it stands; never changes state.
    pub fn summarize(&self) -> CardSummary {
        let symbols = self
            .spec
            .symbols()
            .map(|symbol| {
                let slot = self
                    .context
                    .symbol_value(&symbol.name)
                    .cloned()
                    .unwrap_or(SymbolValue::Unresolved);
                SymbolReport {
                    name: symbol.name.clone(),
                    declared_type: symbol.declared_type.clone(),
                    depends_on: symbol.depends_on.iter().cloned().collect(),
                    state: SymbolState::from_slot(&slot),
                    runtime_type: slot.as_value().map(|value| value.type_name().to_string()),
                }
            })
            .collect();

        let (falsification, fault) = match &self.detail {
            Some(Detail::Falsified(message)) => (Some(message.clone()), None),
            Some(Detail::Fault(fault)) => (None, Some(fault.clone())),
            None => (None, None),
        };

        CardSummary {
            title: self.spec.title().to_string(),
            description: self.spec.description().to_string(),
            symbols,
            claim: self.spec.claim_code().to_string(),
            status: self.status,
            falsification,
            fault,
        }
    }
}
