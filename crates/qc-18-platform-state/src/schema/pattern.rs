//! # Pattern Compatibility
//!
//! Document `pattern` keywords are enforced at write time by a linear-time
//! regex engine. A contract may only declare patterns that engine accepts:
//! no look-around, no backreferences, and no unbounded repetition nested
//! inside another unbounded repetition.
//!
//! The engine is an explicit once-initialized capability. Callers await
//! [`PatternEngine::shared`] (or build their own with
//! [`PatternEngine::initialize`]) and pass it where it is needed.

use crate::config::DEFAULT_REGEX_SIZE_LIMIT;
use crate::domain::ConsensusError;
use regex::RegexBuilder;
use regex_syntax::ast::{self, Ast, RepetitionKind, RepetitionRange};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

static SHARED: OnceCell<Arc<PatternEngine>> = OnceCell::const_new();

/// Probe compiled during initialization.
const WARM_UP_PATTERN: &str = r"^[a-zA-Z0-9]+(\.[a-z]{2,})*$";

/// Compatibility checker for contract `pattern` keywords.
#[derive(Debug)]
pub struct PatternEngine {
    size_limit: usize,
}

impl PatternEngine {
    /// Process-wide engine with the default size limit.
    pub async fn shared() -> Arc<PatternEngine> {
        SHARED
            .get_or_init(|| async {
                Arc::new(Self::initialize(DEFAULT_REGEX_SIZE_LIMIT).await)
            })
            .await
            .clone()
    }

    /// Build an engine bounded by `size_limit` compiled bytes.
    pub async fn initialize(size_limit: usize) -> PatternEngine {
        let engine = PatternEngine { size_limit };
        let ready = engine.check(WARM_UP_PATTERN).is_ok();
        debug!(size_limit, ready, "Pattern engine initialized");
        engine
    }

    /// Check one pattern, returning the compiler diagnostic on rejection.
    pub fn check(&self, pattern: &str) -> Result<(), String> {
        RegexBuilder::new(pattern)
            .size_limit(self.size_limit)
            .build()
            .map_err(|e| e.to_string())?;

        let parsed = ast::parse::Parser::new()
            .parse(pattern)
            .map_err(|e| e.to_string())?;
        match find_nested_unbounded(&parsed, false) {
            Some(span) => Err(format!(
                "nested unbounded repetition at offset {}",
                span.start.offset
            )),
            None => Ok(()),
        }
    }

    /// Walk a schema tree once and report every incompatible `pattern`.
    ///
    /// `base_path` is the JSON pointer of `root` within the contract.
    pub fn validate_schema_patterns(&self, root: &Value, base_path: &str) -> Vec<ConsensusError> {
        let mut errors = Vec::new();
        self.walk(root, base_path.to_string(), &mut errors);
        errors
    }

    fn walk(&self, value: &Value, path: String, errors: &mut Vec<ConsensusError>) {
        match value {
            Value::Object(object) => {
                for (key, child) in object {
                    let child_path = format!("{path}/{}", escape_pointer(key));
                    if key == "pattern" {
                        if let Value::String(pattern) = child {
                            if let Err(message) = self.check(pattern) {
                                errors.push(ConsensusError::IncompatibleRegexPattern {
                                    pattern: pattern.clone(),
                                    path: child_path,
                                    message,
                                });
                            }
                            continue;
                        }
                    }
                    self.walk(child, child_path, errors);
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.walk(item, format!("{path}/{index}"), errors);
                }
            }
            _ => {}
        }
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn is_unbounded(kind: &RepetitionKind) -> bool {
    match kind {
        RepetitionKind::ZeroOrOne => false,
        RepetitionKind::ZeroOrMore | RepetitionKind::OneOrMore => true,
        RepetitionKind::Range(range) => match range {
            RepetitionRange::Exactly(_) | RepetitionRange::Bounded(_, _) => false,
            RepetitionRange::AtLeast(_) => true,
        },
    }
}

fn find_nested_unbounded(node: &Ast, inside_unbounded: bool) -> Option<ast::Span> {
    match node {
        Ast::Repetition(repetition) => {
            let unbounded = is_unbounded(&repetition.op.kind);
            if unbounded && inside_unbounded {
                return Some(repetition.span);
            }
            find_nested_unbounded(&repetition.ast, inside_unbounded || unbounded)
        }
        Ast::Group(group) => find_nested_unbounded(&group.ast, inside_unbounded),
        Ast::Alternation(alternation) => alternation
            .asts
            .iter()
            .find_map(|child| find_nested_unbounded(child, inside_unbounded)),
        Ast::Concat(concat) => concat
            .asts
            .iter()
            .find_map(|child| find_nested_unbounded(child, inside_unbounded)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_simple_pattern_accepted() {
        let engine = PatternEngine::shared().await;
        assert!(engine.check("^[a-z]+$").is_ok());
        assert!(engine.check("^(ab|cd){1,3}[0-9]*$").is_ok());
    }

    #[tokio::test]
    async fn test_nested_unbounded_repetition_rejected() {
        let engine = PatternEngine::shared().await;
        let message = engine.check("(a+)+$").unwrap_err();
        assert!(message.contains("nested unbounded repetition"));
        assert!(engine.check("(a*b{2,})*").is_err());
        assert!(engine.check("(a{1,5})+").is_ok());
    }

    #[tokio::test]
    async fn test_lookaround_and_backreferences_rejected() {
        let engine = PatternEngine::shared().await;
        assert!(engine.check("^(?=a)a$").is_err());
        assert!(engine.check(r"(a)\1").is_err());
    }

    #[tokio::test]
    async fn test_shared_engine_is_initialized_once() {
        let first = PatternEngine::shared().await;
        let second = PatternEngine::shared().await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_every_bad_pattern_reported_with_path() {
        let engine = PatternEngine::initialize(DEFAULT_REGEX_SIZE_LIMIT).await;
        let documents = json!({
            "note": {
                "properties": {
                    "a": { "type": "string", "pattern": "(a+)+$" },
                    "b": { "type": "string", "pattern": "^[a-z]+$" },
                    "c": { "items": [{ "pattern": "(?<=x)y" }] },
                    "pattern": { "type": "string" }
                }
            }
        });

        let errors = engine.validate_schema_patterns(&documents, "/documents");
        let paths: Vec<String> = errors
            .iter()
            .map(|e| match e {
                ConsensusError::IncompatibleRegexPattern { path, .. } => path.clone(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                "/documents/note/properties/a/pattern".to_string(),
                "/documents/note/properties/c/items/0/pattern".to_string(),
            ]
        );
    }
}
