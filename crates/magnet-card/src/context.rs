//! Symbol-name → value store used during one evaluation.
//!
//! Visibility is strict: a symbol's code runs in a fresh scope holding only
//! the names listed in its `depends_on`, pushed as constants. Anything else,
//! including bindings present in the context, is invisible to it. The claim
//! is the only code that sees the whole context.

use crate::bindings::Bindings;
use crate::error::ResolutionError;
use crate::script::{ScriptEngine, ScriptFault};
use crate::spec::{CardSpec, SymbolSpec};
use indexmap::IndexMap;
use rhai::{Dynamic, Scope};

/// Per-symbol slot: not computed yet, or the bound value.
#[derive(Debug, Clone, Default)]
pub enum SymbolValue {
    #[default]
    Unresolved,
    Value(Dynamic),
}

impl SymbolValue {
    pub fn as_value(&self) -> Option<&Dynamic> {
        match self {
            SymbolValue::Unresolved => None,
            SymbolValue::Value(value) => Some(value),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SymbolValue::Value(_))
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    bindings: Bindings,
    symbols: IndexMap<String, SymbolValue>,
}

impl ExecutionContext {
    /// A context with every declared symbol unresolved, seeded with `bindings`.
    pub fn new(spec: &CardSpec, bindings: Bindings) -> Self {
        let symbols = spec
            .symbols()
            .map(|symbol| (symbol.name.clone(), SymbolValue::Unresolved))
            .collect();
        Self { bindings, symbols }
    }

    /// Forget all resolved values; seeded bindings are kept.
    pub fn reset(&mut self) {
        for slot in self.symbols.values_mut() {
            *slot = SymbolValue::Unresolved;
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn symbol_value(&self, name: &str) -> Option<&SymbolValue> {
        self.symbols.get(name)
    }

    /// Symbol slots in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &SymbolValue)> {
        self.symbols.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn resolved_count(&self) -> usize {
        self.symbols.values().filter(|slot| slot.is_resolved()).count()
    }

    /// Current value of `name`.
    ///
    /// A declared symbol always takes precedence over a binding of the same
    /// name, so an unresolved symbol yields `None` even when such a binding
    /// exists.
    pub fn lookup(&self, name: &str) -> Option<&Dynamic> {
        match self.symbols.get(name) {
            Some(slot) => slot.as_value(),
            None => self.bindings.get(name),
        }
    }

    /// Resolve one declared symbol with its declared dependencies visible.
    pub fn resolve_symbol(
        &mut self,
        engine: &ScriptEngine,
        symbol: &SymbolSpec,
    ) -> Result<(), ResolutionError> {
        self.resolve(
            engine,
            &symbol.name,
            &symbol.code,
            symbol.depends_on.iter().map(String::as_str),
        )
    }

    /// Execute `code`, which must bind `name`, seeing only `visible`.
    ///
    /// A symbol that already holds a value is not executed again.
    pub fn resolve<'a>(
        &mut self,
        engine: &ScriptEngine,
        name: &str,
        code: &str,
        visible: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ResolutionError> {
        if self.symbols.get(name).is_some_and(SymbolValue::is_resolved) {
            tracing::debug!(symbol = name, "symbol already resolved");
            return Ok(());
        }

        let mut scope = Scope::new();
        for dependency in visible {
            let value = self
                .lookup(dependency)
                .cloned()
                .ok_or_else(|| ResolutionError::UnresolvedDependency {
                    symbol: name.to_string(),
                    dependency: dependency.to_string(),
                })?;
            scope.push_constant_dynamic(dependency, value);
        }
        tracing::debug!(symbol = name, visible = scope.len(), "resolving symbol");

        engine.run(code, &mut scope).map_err(|fault| {
            let cause = match fault {
                ScriptFault::Fault(cause) => cause,
                ScriptFault::Falsified(message) => {
                    format!("falsification signal raised outside the claim: {message}")
                }
            };
            ResolutionError::SymbolResolution {
                symbol: name.to_string(),
                cause,
            }
        })?;

        let value = scope
            .get_value::<Dynamic>(name)
            .ok_or_else(|| ResolutionError::MissingBinding {
                symbol: name.to_string(),
            })?;
        tracing::debug!(symbol = name, value_type = value.type_name(), "symbol resolved");
        self.symbols.insert(name.to_string(), SymbolValue::Value(value));
        Ok(())
    }

    /// Scope for the claim: every binding and every resolved symbol.
    pub fn claim_scope(&self) -> Scope<'static> {
        let mut scope = Scope::new();
        for (name, value) in self.bindings.iter() {
            if !self.symbols.contains_key(name) {
                scope.push_constant_dynamic(name, value.clone());
            }
        }
        for (name, slot) in &self.symbols {
            if let SymbolValue::Value(value) = slot {
                scope.push_constant_dynamic(name.as_str(), value.clone());
            }
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::CardLoader;
    use rhai::INT;

    fn spec() -> CardSpec {
        CardLoader::load_str(
            r#"
title: Context
claim: { code: "true" }
symbols:
  base:
    code: let base = 10;
  doubled:
    depends_on: [base]
    code: let doubled = base * 2;
  sneaky:
    code: let sneaky = base + 1;
  scaled:
    depends_on: [doubled, factor]
    code: let scaled = doubled * factor;
  forgetful:
    code: let other = 1;
  mutating:
    depends_on: [base]
    code: base = 3; let mutating = base;
"#,
        )
        .expect("context card should load")
    }

    fn resolve(ctx: &mut ExecutionContext, spec: &CardSpec, name: &str) -> Result<(), ResolutionError> {
        let engine = ScriptEngine::new();
        ctx.resolve_symbol(&engine, spec.symbol(name).expect("declared"))
    }

    fn int(ctx: &ExecutionContext, name: &str) -> Option<INT> {
        ctx.lookup(name).and_then(|value| value.as_int().ok())
    }

    #[test]
    fn starts_unresolved() {
        let spec = spec();
        let ctx = ExecutionContext::new(&spec, Bindings::new());
        assert!(ctx.symbols().all(|(_, slot)| !slot.is_resolved()));
        assert_eq!(ctx.resolved_count(), 0);
    }

    #[test]
    fn dependencies_are_visible() {
        let spec = spec();
        let mut ctx = ExecutionContext::new(&spec, Bindings::new());
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        resolve(&mut ctx, &spec, "doubled").expect("doubled resolves");
        assert_eq!(int(&ctx, "doubled"), Some(20));
    }

    #[test]
    fn undeclared_symbols_are_invisible() {
        let spec = spec();
        let mut ctx = ExecutionContext::new(&spec, Bindings::new());
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        let err = resolve(&mut ctx, &spec, "sneaky").expect_err("base is not declared");
        assert!(matches!(err, ResolutionError::SymbolResolution { ref symbol, .. } if symbol == "sneaky"));
        assert!(!ctx.symbol_value("sneaky").expect("slot").is_resolved());
    }

    #[test]
    fn declared_external_binding_is_visible() {
        let spec = spec();
        let bindings = Bindings::new().with("factor", 3 as INT).expect("valid binding");
        let mut ctx = ExecutionContext::new(&spec, bindings);
        for name in ["base", "doubled", "scaled"] {
            resolve(&mut ctx, &spec, name).expect("resolves");
        }
        assert_eq!(int(&ctx, "scaled"), Some(60));
    }

    #[test]
    fn missing_external_binding_is_unresolved_dependency() {
        let spec = spec();
        let mut ctx = ExecutionContext::new(&spec, Bindings::new());
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        resolve(&mut ctx, &spec, "doubled").expect("doubled resolves");
        let err = resolve(&mut ctx, &spec, "scaled").expect_err("factor missing");
        assert_eq!(
            err,
            ResolutionError::UnresolvedDependency {
                symbol: "scaled".to_string(),
                dependency: "factor".to_string(),
            }
        );
    }

    #[test]
    fn code_must_bind_its_own_name() {
        let spec = spec();
        let mut ctx = ExecutionContext::new(&spec, Bindings::new());
        let err = resolve(&mut ctx, &spec, "forgetful").expect_err("never binds forgetful");
        assert_eq!(
            err,
            ResolutionError::MissingBinding {
                symbol: "forgetful".to_string()
            }
        );
    }

    #[test]
    fn dependencies_are_read_only() {
        let spec = spec();
        let mut ctx = ExecutionContext::new(&spec, Bindings::new());
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        let err = resolve(&mut ctx, &spec, "mutating").expect_err("constants cannot be assigned");
        assert!(matches!(err, ResolutionError::SymbolResolution { .. }));
        assert_eq!(int(&ctx, "base"), Some(10));
    }

    #[test]
    fn reset_keeps_bindings() {
        let spec = spec();
        let bindings = Bindings::new().with("factor", 2 as INT).expect("valid binding");
        let mut ctx = ExecutionContext::new(&spec, bindings);
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        ctx.reset();
        assert_eq!(ctx.resolved_count(), 0);
        assert_eq!(int(&ctx, "factor"), Some(2));
    }

    #[test]
    fn claim_scope_sees_everything_resolved() {
        let spec = spec();
        let bindings = Bindings::new().with("factor", 2 as INT).expect("valid binding");
        let mut ctx = ExecutionContext::new(&spec, bindings);
        resolve(&mut ctx, &spec, "base").expect("base resolves");
        let scope = ctx.claim_scope();
        assert_eq!(scope.get_value::<INT>("base"), Some(10));
        assert_eq!(scope.get_value::<INT>("factor"), Some(2));
        assert!(!scope.contains("doubled"));
    }
}
