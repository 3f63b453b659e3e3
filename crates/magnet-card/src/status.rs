//! Evaluation status and the diagnostic that explains it.

use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    /// Not evaluated yet.
    #[default]
    Unverified,
    /// The claim holds.
    Verified,
    /// The claim provably does not hold.
    Falsified,
    /// The claim could not be evaluated.
    Inconclusive,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Unverified => "UNVERIFIED",
            EvaluationStatus::Verified => "VERIFIED",
            EvaluationStatus::Falsified => "FALSIFIED",
            EvaluationStatus::Inconclusive => "INCONCLUSIVE",
        }
    }

    /// Whether this status is the outcome of an `evaluate()` call.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EvaluationStatus::Unverified)
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNVERIFIED" => Ok(EvaluationStatus::Unverified),
            "VERIFIED" => Ok(EvaluationStatus::Verified),
            "FALSIFIED" => Ok(EvaluationStatus::Falsified),
            "INCONCLUSIVE" => Ok(EvaluationStatus::Inconclusive),
            other => Err(format!("unknown evaluation status: {other}")),
        }
    }
}

/// Where a fault happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "name", rename_all = "snake_case")]
pub enum FaultOrigin {
    Symbol(String),
    Claim,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultOrigin::Symbol(name) => write!(f, "symbol `{name}`"),
            FaultOrigin::Claim => f.write_str("claim"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    UnresolvedDependency,
    SymbolResolution,
    MissingBinding,
    ClaimRuntime,
}

/// Why an evaluation ended INCONCLUSIVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub origin: FaultOrigin,
    pub kind: FaultKind,
    pub message: String,
}

impl From<&ResolutionError> for Fault {
    fn from(err: &ResolutionError) -> Self {
        let kind = match err {
            ResolutionError::UnresolvedDependency { .. } => FaultKind::UnresolvedDependency,
            ResolutionError::SymbolResolution { .. } => FaultKind::SymbolResolution,
            ResolutionError::MissingBinding { .. } => FaultKind::MissingBinding,
        };
        Fault {
            origin: FaultOrigin::Symbol(err.symbol().to_string()),
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

/// Diagnostic attached to a terminal status other than VERIFIED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    /// Message carried by the falsification signal, verbatim.
    Falsified(String),
    Fault(Fault),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            EvaluationStatus::Unverified,
            EvaluationStatus::Verified,
            EvaluationStatus::Falsified,
            EvaluationStatus::Inconclusive,
        ] {
            assert_eq!(status.to_string().parse::<EvaluationStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).expect("serializes"),
                serde_json::json!(status.as_str())
            );
        }
        assert!(!EvaluationStatus::Unverified.is_terminal());
        assert!(EvaluationStatus::Inconclusive.is_terminal());
    }

    #[test]
    fn fault_from_resolution_error_keeps_symbol_origin() {
        let err = ResolutionError::SymbolResolution {
            symbol: "ratio".to_string(),
            cause: "Variable not found: sample_count".to_string(),
        };
        let fault = Fault::from(&err);
        assert_eq!(fault.origin, FaultOrigin::Symbol("ratio".to_string()));
        assert_eq!(fault.kind, FaultKind::SymbolResolution);
        assert!(fault.message.contains("sample_count"));
        assert_eq!(
            serde_json::to_value(&fault.origin).expect("serializes"),
            serde_json::json!({"stage": "symbol", "name": "ratio"})
        );
    }
}
