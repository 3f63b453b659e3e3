//! Embedded script engine for symbol and claim code.
//!
//! Card code is Rhai. On top of the standard packages the engine registers:
//!
//! - `assert(cond)`, `assert(cond, message)`, `falsify(message)`: raise the
//!   falsification signal, the only way a claim can end FALSIFIED;
//! - `sum(array)`, `mean(array)`: numeric aggregates;
//! - `print`/`debug` forwarded to `tracing`.
//!
//! The signal travels as a [`FalsificationSignal`] payload inside a runtime
//! error. Scripts cannot construct that type, so `throw` never counts as
//! falsification.

use rhai::{Array, Dynamic, Engine, EvalAltResult, FLOAT, INT, Position, Scope};

const SCRIPT_LOG_TARGET: &str = "magnet_card::script";
const DEFAULT_ASSERT_MESSAGE: &str = "assertion does not hold";

/// Payload of the designated "claim does not hold" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FalsificationSignal {
    pub message: String,
}

/// How a script run ended when it did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptFault {
    /// The falsification signal was raised.
    Falsified(String),
    /// Anything else: parse errors, runtime errors, user `throw`.
    Fault(String),
}

/// A configured Rhai engine. One per card; holds no state between runs.
pub struct ScriptEngine {
    engine: Engine,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine").finish_non_exhaustive()
    }
}

impl ScriptEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.register_type_with_name::<FalsificationSignal>("FalsificationSignal");

        engine.register_fn("assert", |condition: bool| -> Result<(), Box<EvalAltResult>> {
            if condition {
                Ok(())
            } else {
                Err(falsified(DEFAULT_ASSERT_MESSAGE))
            }
        });
        engine.register_fn(
            "assert",
            |condition: bool, message: &str| -> Result<(), Box<EvalAltResult>> {
                if condition { Ok(()) } else { Err(falsified(message)) }
            },
        );
        engine.register_fn("falsify", |message: &str| -> Result<(), Box<EvalAltResult>> {
            Err(falsified(message))
        });

        engine.register_fn("sum", sum);
        engine.register_fn("mean", mean);

        engine.on_print(|text| tracing::info!(target: SCRIPT_LOG_TARGET, "{text}"));
        engine.on_debug(|text, source, position| {
            tracing::debug!(
                target: SCRIPT_LOG_TARGET,
                source = source.unwrap_or_default(),
                position = %position,
                "{text}"
            );
        });

        Self { engine }
    }

    /// Compile and run `code` against `scope`.
    ///
    /// Top-level `let` bindings made by the script remain in `scope`.
    pub fn run(&self, code: &str, scope: &mut Scope<'static>) -> Result<(), ScriptFault> {
        let ast = self
            .engine
            .compile(code)
            .map_err(|err| ScriptFault::Fault(format!("parse error: {err}")))?;
        self.engine
            .run_ast_with_scope(scope, &ast)
            .map_err(|err| classify(&err))
    }
}

fn falsified(message: &str) -> Box<EvalAltResult> {
    let signal = FalsificationSignal {
        message: message.to_string(),
    };
    EvalAltResult::ErrorRuntime(Dynamic::from(signal), Position::NONE).into()
}

fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(message.into()), Position::NONE).into()
}

fn classify(err: &EvalAltResult) -> ScriptFault {
    match signal_of(err) {
        Some(signal) => ScriptFault::Falsified(signal.message),
        None => ScriptFault::Fault(err.to_string()),
    }
}

/// The signal may surface wrapped by calls into script-defined functions.
fn signal_of(err: &EvalAltResult) -> Option<FalsificationSignal> {
    match err {
        EvalAltResult::ErrorRuntime(value, _) => value.clone().try_cast::<FalsificationSignal>(),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => signal_of(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => signal_of(inner),
        _ => None,
    }
}

enum Number {
    Int(INT),
    Float(FLOAT),
}

fn numbers(items: &Array, function: &str) -> Result<Vec<Number>, Box<EvalAltResult>> {
    items
        .iter()
        .map(|item| {
            if let Ok(value) = item.as_int() {
                Ok(Number::Int(value))
            } else if let Ok(value) = item.as_float() {
                Ok(Number::Float(value))
            } else {
                Err(runtime_error(format!(
                    "{function} expects an array of numbers, found {}",
                    item.type_name()
                )))
            }
        })
        .collect()
}

/// Integer sum when every item is an integer, float sum otherwise.
fn sum(items: Array) -> Result<Dynamic, Box<EvalAltResult>> {
    let values = numbers(&items, "sum")?;
    if values.iter().all(|value| matches!(value, Number::Int(_))) {
        let mut total: INT = 0;
        for value in &values {
            if let Number::Int(value) = value {
                total = total
                    .checked_add(*value)
                    .ok_or_else(|| runtime_error("sum overflowed"))?;
            }
        }
        return Ok(Dynamic::from_int(total));
    }
    Ok(Dynamic::from_float(float_total(&values)))
}

fn mean(items: Array) -> Result<FLOAT, Box<EvalAltResult>> {
    let values = numbers(&items, "mean")?;
    if values.is_empty() {
        return Err(runtime_error("mean of an empty array"));
    }
    Ok(float_total(&values) / values.len() as FLOAT)
}

fn float_total(values: &[Number]) -> FLOAT {
    values
        .iter()
        .map(|value| match value {
            Number::Int(value) => *value as FLOAT,
            Number::Float(value) => *value,
        })
        .sum()
}
