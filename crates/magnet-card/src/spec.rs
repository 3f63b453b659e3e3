//! Immutable card specification produced by the loader.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// One named, resolvable value of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolSpec {
    pub name: String,
    /// Informational only; never enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    /// Declared dependencies, deduplicated, in authoring order.
    pub depends_on: IndexSet<String>,
    /// Script that must bind `name` when executed.
    pub code: String,
}

/// A parsed and validated evaluation card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSpec {
    title: String,
    description: String,
    claim_code: String,
    symbols: IndexMap<String, SymbolSpec>,
}

impl CardSpec {
    pub(crate) fn new(
        title: String,
        description: String,
        claim_code: String,
        symbols: IndexMap<String, SymbolSpec>,
    ) -> Self {
        Self {
            title,
            description,
            claim_code,
            symbols,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn claim_code(&self) -> &str {
        &self.claim_code
    }

    /// Symbols in declaration order.
    pub fn symbols(&self) -> impl ExactSizeIterator<Item = &SymbolSpec> {
        self.symbols.values()
    }

    pub fn symbol(&self, name: &str) -> Option<&SymbolSpec> {
        self.symbols.get(name)
    }

    /// Symbol at a declaration index.
    pub fn symbol_at(&self, index: usize) -> Option<&SymbolSpec> {
        self.symbols.get_index(index).map(|(_, symbol)| symbol)
    }

    /// Declaration index of a symbol.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.symbols.get_index_of(name)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}
