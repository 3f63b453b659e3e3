//! Claim execution and three-way outcome classification.

use crate::context::ExecutionContext;
use crate::script::{ScriptEngine, ScriptFault};
use crate::status::EvaluationStatus;

/// Any fault during claim execution other than the falsification signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("claim could not be evaluated: {cause}")]
pub struct ClaimRuntimeFault {
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim code completed normally.
    Verified,
    /// Claim code raised the falsification signal.
    Falsified { message: String },
    /// Claim code faulted in any other way.
    Fault(ClaimRuntimeFault),
}

impl ClaimOutcome {
    pub fn status(&self) -> EvaluationStatus {
        match self {
            ClaimOutcome::Verified => EvaluationStatus::Verified,
            ClaimOutcome::Falsified { .. } => EvaluationStatus::Falsified,
            ClaimOutcome::Fault(_) => EvaluationStatus::Inconclusive,
        }
    }
}

pub struct ClaimEvaluator<'a> {
    engine: &'a ScriptEngine,
}

impl<'a> ClaimEvaluator<'a> {
    pub fn new(engine: &'a ScriptEngine) -> Self {
        Self { engine }
    }

    /// Run `claim_code` against the complete context.
    pub fn evaluate(&self, claim_code: &str, context: &ExecutionContext) -> ClaimOutcome {
        let mut scope = context.claim_scope();
        match self.engine.run(claim_code, &mut scope) {
            Ok(()) => ClaimOutcome::Verified,
            Err(ScriptFault::Falsified(message)) => ClaimOutcome::Falsified { message },
            Err(ScriptFault::Fault(cause)) => ClaimOutcome::Fault(ClaimRuntimeFault { cause }),
        }
    }
}
