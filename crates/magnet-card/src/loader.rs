//! Card documents → validated [`CardSpec`].
//!
//! Accepted shape (YAML, or JSON since it parses as YAML):
//!
//! ```yaml
//! title: Addition commutes
//! description: optional free text
//! claim:
//!   code: |
//!     for a in even { for b in odd { assert(a + b == b + a); } }
//! symbols:
//!   even:
//!     type: List[int]          # informational
//!     depends_on: []           # optional
//!     code: let even = [-2, 0, 2];
//! ```
//!
//! `dependencies` is accepted for `depends_on`, and `rhai`/`script` for `code`.

use crate::error::{CardError, MalformedCardError};
use crate::spec::{CardSpec, SymbolSpec};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::sync::OnceLock;

const CODE_KEYS: [&str; 3] = ["code", "rhai", "script"];
const DEPENDS_ON_KEYS: [&str; 2] = ["depends_on", "dependencies"];

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile"))
}

/// Rhai keywords plus the words Rhai reserves for future use. None of them
/// can name a variable.
const RESERVED_WORDS: &[&str] = &[
    "true", "false", "let", "const", "if", "else", "switch", "do", "while", "until", "loop",
    "for", "in", "continue", "break", "return", "throw", "try", "catch", "fn", "private",
    "import", "export", "as", "global", "this", "is", "Fn", "call", "curry", "print", "debug",
    "type_of", "eval", "is_def_var", "is_def_fn", "is_shared", "var", "static", "shared",
    "goto", "exit", "match", "case", "default", "void", "null", "nil", "spawn", "thread", "go",
    "sync", "async", "await", "yield", "public", "protected", "super", "new", "use", "module",
    "package", "with",
];

/// Whether `name` is a script keyword or reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Whether `name` can be referenced as a variable by card scripts.
pub fn is_identifier(name: &str) -> bool {
    identifier_re().is_match(name) && !is_reserved_word(name)
}

fn identifier_problem(name: &str) -> String {
    if is_reserved_word(name) {
        format!("`{name}` is a reserved word in card scripts")
    } else {
        format!("`{name}` is not a valid identifier")
    }
}

/// Parses card documents into [`CardSpec`]s.
pub struct CardLoader;

impl CardLoader {
    /// Read and parse a card file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<CardSpec, CardError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::load_str(&text)?)
    }

    /// Parse a card from YAML or JSON text.
    pub fn load_str(text: &str) -> Result<CardSpec, MalformedCardError> {
        let document: Value = serde_yaml::from_str(text)
            .map_err(|err| MalformedCardError::new("<document>", format!("is not valid YAML: {err}")))?;
        Self::load_value(&document)
    }

    /// Validate an already-parsed document.
    pub fn load_value(document: &Value) -> Result<CardSpec, MalformedCardError> {
        let root = document
            .as_mapping()
            .ok_or_else(|| MalformedCardError::new("<document>", format!("must be a mapping, got {}", kind(document))))?;

        let title = required_string(root, "title", "title")?;
        let description = optional_string(root, "description", "description")?.unwrap_or_default();

        let claim = root
            .get("claim")
            .ok_or_else(|| MalformedCardError::new("claim", "is required"))?;
        let claim = claim
            .as_mapping()
            .ok_or_else(|| MalformedCardError::new("claim", format!("must be a mapping, got {}", kind(claim))))?;
        let claim_code = required_code(claim, "claim")?;

        let symbols = match root.get("symbols") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Mapping(entries)) => load_symbols(entries)?,
            Some(other) => {
                return Err(MalformedCardError::new(
                    "symbols",
                    format!("must be a mapping, got {}", kind(other)),
                ));
            }
        };

        Ok(CardSpec::new(title, description, claim_code, symbols))
    }
}

fn load_symbols(entries: &Mapping) -> Result<IndexMap<String, SymbolSpec>, MalformedCardError> {
    let mut symbols = IndexMap::with_capacity(entries.len());
    for (key, body) in entries {
        let name = key
            .as_str()
            .ok_or_else(|| MalformedCardError::new("symbols", format!("keys must be strings, got {}", kind(key))))?;
        let field = format!("symbols.{name}");
        if !is_identifier(name) {
            return Err(MalformedCardError::new(field, identifier_problem(name)));
        }
        let body = body
            .as_mapping()
            .ok_or_else(|| MalformedCardError::new(&field, format!("must be a mapping, got {}", kind(body))))?;

        let declared_type = optional_string(body, "type", &format!("{field}.type"))?;
        let depends_on = load_depends_on(body, &field)?;
        let code = required_code(body, &field)?;

        symbols.insert(
            name.to_string(),
            SymbolSpec {
                name: name.to_string(),
                declared_type,
                depends_on,
                code,
            },
        );
    }
    Ok(symbols)
}

fn load_depends_on(body: &Mapping, field: &str) -> Result<IndexSet<String>, MalformedCardError> {
    let Some((key, raw)) = first_present(body, &DEPENDS_ON_KEYS) else {
        return Ok(IndexSet::new());
    };
    let field = format!("{field}.{key}");
    let items = match raw {
        Value::Null => return Ok(IndexSet::new()),
        Value::Sequence(items) => items,
        other => {
            return Err(MalformedCardError::new(
                field,
                format!("must be a list of strings, got {}", kind(other)),
            ));
        }
    };

    let mut depends_on = IndexSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_field = format!("{field}[{index}]");
        let name = item
            .as_str()
            .ok_or_else(|| MalformedCardError::new(&item_field, format!("must be a string, got {}", kind(item))))?;
        if !is_identifier(name) {
            return Err(MalformedCardError::new(item_field, identifier_problem(name)));
        }
        depends_on.insert(name.to_string());
    }
    Ok(depends_on)
}

fn required_code(body: &Mapping, field: &str) -> Result<String, MalformedCardError> {
    let Some((key, raw)) = first_present(body, &CODE_KEYS) else {
        return Err(MalformedCardError::new(format!("{field}.code"), "is required"));
    };
    non_empty_string(raw, &format!("{field}.{key}"))
}

fn required_string(map: &Mapping, key: &str, field: &str) -> Result<String, MalformedCardError> {
    match map.get(key) {
        None | Some(Value::Null) => Err(MalformedCardError::new(field, "is required")),
        Some(raw) => non_empty_string(raw, field),
    }
}

fn optional_string(map: &Mapping, key: &str, field: &str) -> Result<Option<String>, MalformedCardError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(MalformedCardError::new(
            field,
            format!("must be a string, got {}", kind(other)),
        )),
    }
}

fn non_empty_string(raw: &Value, field: &str) -> Result<String, MalformedCardError> {
    match raw {
        Value::String(value) if !value.trim().is_empty() => Ok(value.clone()),
        Value::String(_) => Err(MalformedCardError::new(field, "must not be empty")),
        other => Err(MalformedCardError::new(
            field,
            format!("must be a string, got {}", kind(other)),
        )),
    }
}

fn first_present<'a>(map: &'a Mapping, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter().find_map(|key| map.get(*key).map(|value| (*key, value)))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
title: Minimal
claim:
  code: assert(x == 1);
symbols:
  x:
    code: let x = 1;
"#;

    fn malformed(text: &str) -> MalformedCardError {
        CardLoader::load_str(text).expect_err("card should be rejected")
    }

    #[test]
    fn loads_minimal_card_with_defaults() {
        let spec = CardLoader::load_str(MINIMAL).expect("minimal card should load");
        assert_eq!(spec.title(), "Minimal");
        assert_eq!(spec.description(), "");
        assert_eq!(spec.claim_code(), "assert(x == 1);");
        let x = spec.symbol("x").expect("x declared");
        assert!(x.depends_on.is_empty());
        assert_eq!(x.declared_type, None);
    }

    #[test]
    fn preserves_declaration_order() {
        let spec = CardLoader::load_str(
            r#"
title: Order
claim: { code: "true" }
symbols:
  zeta: { code: "let zeta = 1;" }
  alpha: { code: "let alpha = 2;" }
  mid: { code: "let mid = 3;" }
"#,
        )
        .expect("card should load");
        let names: Vec<&str> = spec.symbols().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn canonicalizes_depends_on_into_a_set() {
        let spec = CardLoader::load_str(
            r#"
title: Deps
claim: { code: "true" }
symbols:
  a: { code: "let a = 1;" }
  b:
    depends_on: [a, path, a]
    code: let b = a;
"#,
        )
        .expect("card should load");
        let b = spec.symbol("b").expect("b declared");
        assert_eq!(b.depends_on.iter().collect::<Vec<_>>(), vec!["a", "path"]);
    }

    #[test]
    fn accepts_legacy_key_aliases() {
        let spec = CardLoader::load_str(
            r#"
title: Legacy
claim: { rhai: "assert(b == 2);" }
symbols:
  a: { script: "let a = 1;" }
  b: { dependencies: [a], rhai: "let b = a + 1;" }
"#,
        )
        .expect("aliases should load");
        assert_eq!(spec.claim_code(), "assert(b == 2);");
        assert!(spec.symbol("b").expect("b").depends_on.contains("a"));
    }

    #[test]
    fn rejects_missing_title() {
        let err = malformed("claim: { code: \"true\" }\n");
        assert_eq!(err.field, "title");
    }

    #[test]
    fn rejects_blank_title() {
        let err = malformed("title: \"  \"\nclaim: { code: \"true\" }\n");
        assert_eq!(err.field, "title");
        assert_eq!(err.reason, "must not be empty");
    }

    #[test]
    fn rejects_missing_claim_code() {
        let err = malformed("title: T\nclaim: {}\n");
        assert_eq!(err.field, "claim.code");
    }

    #[test]
    fn rejects_symbol_without_code() {
        let err = malformed("title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { type: int }\n");
        assert_eq!(err.field, "symbols.x.code");
    }

    #[test]
    fn rejects_empty_symbol_code() {
        let err = malformed("title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { code: \"\" }\n");
        assert_eq!(err.field, "symbols.x.code");
    }

    #[test]
    fn rejects_scalar_depends_on() {
        let err = malformed(
            "title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { depends_on: y, code: \"let x = y;\" }\n",
        );
        assert_eq!(err.field, "symbols.x.depends_on");
        assert!(err.reason.contains("list of strings"));
    }

    #[test]
    fn rejects_non_string_dependency_entry() {
        let err = malformed(
            "title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { depends_on: [y, 3], code: \"let x = y;\" }\n",
        );
        assert_eq!(err.field, "symbols.x.depends_on[1]");
    }

    #[test]
    fn rejects_non_identifier_symbol_name() {
        let err = malformed("title: T\nclaim: { code: \"true\" }\nsymbols:\n  my-sym: { code: \"1\" }\n");
        assert_eq!(err.field, "symbols.my-sym");
    }

    #[test]
    fn rejects_reserved_word_symbol_name() {
        let err = malformed("title: T\nclaim: { code: \"true\" }\nsymbols:\n  this: { code: \"let this = 1;\" }\n");
        assert_eq!(err.field, "symbols.this");
        assert!(err.reason.contains("reserved word"), "{}", err.reason);
    }

    #[test]
    fn rejects_reserved_word_dependency() {
        let err = malformed(
            "title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { depends_on: [fn], code: \"let x = 1;\" }\n",
        );
        assert_eq!(err.field, "symbols.x.depends_on[0]");
        assert!(err.reason.contains("reserved word"), "{}", err.reason);
    }

    #[test]
    fn rejects_non_string_type() {
        let err = malformed("title: T\nclaim: { code: \"true\" }\nsymbols:\n  x: { type: 3, code: \"let x = 1;\" }\n");
        assert_eq!(err.field, "symbols.x.type");
        assert_eq!(err.reason, "must be a string, got a number");
    }

    #[test]
    fn rejects_unparseable_document() {
        let err = malformed("title: [unterminated\n");
        assert_eq!(err.field, "<document>");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CardLoader::load_path("/definitely/not/here/card.yaml").expect_err("missing file");
        assert!(matches!(err, CardError::Io { .. }));
    }

    #[test]
    fn identifier_rule() {
        assert!(is_identifier("scores"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
        for word in ["let", "fn", "this", "print"] {
            assert!(!is_identifier(word), "{word}");
        }
        assert!(is_identifier("letter"));
    }
}
