//! Read-only report of a card in its current state.

use crate::context::SymbolValue;
use crate::status::{EvaluationStatus, Fault};
use rhai::Dynamic;
use serde::Serialize;
use std::fmt;

const RULE: &str = "================================";

/// A symbol's slot as reported: unresolved, or its value rendered as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SymbolState {
    Unresolved,
    Resolved(serde_json::Value),
}

impl SymbolState {
    pub(crate) fn from_slot(slot: &SymbolValue) -> Self {
        match slot {
            SymbolValue::Unresolved => SymbolState::Unresolved,
            SymbolValue::Value(value) => SymbolState::Resolved(render(value)),
        }
    }
}

impl fmt::Display for SymbolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolState::Unresolved => f.write_str("<unresolved>"),
            SymbolState::Resolved(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub state: SymbolState,
    /// Runtime type of the resolved value, next to the declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSummary {
    pub title: String,
    pub description: String,
    pub symbols: Vec<SymbolReport>,
    pub claim: String,
    pub status: EvaluationStatus,
    /// Falsification message, only for FALSIFIED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub falsification: Option<String>,
    /// Fault description, only for INCONCLUSIVE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<Fault>,
}

impl CardSummary {
    pub fn symbol(&self, name: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|report| report.name == name)
    }
}

impl fmt::Display for CardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:       {}", self.title)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "SYMBOLS:")?;
        for report in &self.symbols {
            write!(f, "  {}", report.name)?;
            if let Some(declared) = &report.declared_type {
                write!(f, ": {declared}")?;
            }
            writeln!(f, " = {}", report.state)?;
        }
        writeln!(f, "CLAIM:")?;
        writeln!(f, "{}", self.claim.trim_end())?;
        writeln!(f, "{RULE}")?;
        write!(f, "STATUS:      {}", self.status)?;
        if let Some(message) = &self.falsification {
            write!(f, "\nFALSIFIED:   {message}")?;
        }
        if let Some(fault) = &self.fault {
            write!(f, "\nFAULT:       {fault}")?;
        }
        Ok(())
    }
}

/// JSON rendering of a script value; non-serializable values fall back to
/// their display text.
pub(crate) fn render(value: &Dynamic) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()))
}
