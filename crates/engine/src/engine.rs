use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::ast::{self, AstNode};
use crate::combiner::{self, CombinedRule};
use crate::error::{ParseError, RuleResult, SerializationError};
use crate::evaluator;
use crate::parser;

/// Facade over the pure engine operations with a parse cache keyed by
/// rule expression text.
///
/// The cache holds immutable trees; parsing the same text twice hands
/// out independent clones, and re-parsing an edited expression always
/// produces a brand-new tree rather than mutating a cached one.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    ast_cache: HashMap<String, AstNode>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            ast_cache: HashMap::new(),
        }
    }

    /// Create an engine with the given rules pre-parsed, failing on the
    /// first invalid expression.
    pub fn with_rules(rules: &[&str]) -> RuleResult<Self> {
        let mut engine = Self::new();
        for rule in rules {
            engine.parse_rule(rule)?;
        }
        Ok(engine)
    }

    /// Parse a rule expression, reusing the cached tree for repeated
    /// text.
    pub fn parse_rule(&mut self, rule: &str) -> Result<AstNode, ParseError> {
        if let Some(ast) = self.ast_cache.get(rule) {
            debug!(rule, "rule parse cache hit");
            return Ok(ast.clone());
        }
        let ast = parser::parse(rule)?;
        self.ast_cache.insert(rule.to_string(), ast.clone());
        Ok(ast)
    }

    /// Check rule syntax without keeping the parsed tree.
    pub fn validate_syntax(&self, rule: &str) -> Result<(), ParseError> {
        parser::parse(rule).map(|_| ())
    }

    /// Parse (or fetch from cache) and evaluate a rule against input
    /// data.
    pub fn evaluate_rule(&mut self, rule: &str, data: &Map<String, Value>) -> RuleResult<bool> {
        let ast = self.parse_rule(rule)?;
        let result = evaluator::evaluate(&ast, data)?;
        debug!(rule, result, "rule evaluated");
        Ok(result)
    }

    /// Parse each expression and fold the trees into one conjunction.
    pub fn combine_rules(&mut self, rules: &[&str]) -> RuleResult<CombinedRule> {
        let mut asts = Vec::with_capacity(rules.len());
        for rule in rules {
            asts.push(self.parse_rule(rule)?);
        }
        Ok(combiner::combine(&asts)?)
    }

    /// Parse the replacement expression for an edited rule. The caller
    /// swaps its stored record wholesale; any tree parsed from the old
    /// expression is untouched.
    pub fn reparse(&mut self, new_rule: &str) -> Result<AstNode, ParseError> {
        self.parse_rule(new_rule)
    }

    /// Serialize a tree to the stored byte form.
    pub fn to_stored(&self, ast: &AstNode) -> Result<Vec<u8>, SerializationError> {
        ast::serialize(ast)
    }

    /// Rebuild a tree from stored bytes.
    pub fn from_stored(&self, bytes: &[u8]) -> Result<AstNode, SerializationError> {
        ast::deserialize(bytes)
    }

    pub fn clear_cache(&mut self) {
        self.ast_cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.ast_cache.len()
    }
}
