use crate::ast::{AstNode, LogicalOperator};
use crate::error::CombineError;

/// Result of folding several rule trees into one conjunction: the
/// combined tree plus a derived expression string that re-parses to an
/// equivalent tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRule {
    pub ast: AstNode,
    pub expression: String,
}

/// Left-fold an ordered list of rule trees into a strictly binary
/// `AND` tree: `((a AND b) AND c) AND ...`. A single input passes
/// through unchanged.
pub fn combine(rules: &[AstNode]) -> Result<CombinedRule, CombineError> {
    let (first, rest) = rules.split_first().ok_or(CombineError::EmptyInput)?;

    if rest.is_empty() {
        return Ok(CombinedRule {
            ast: first.clone(),
            expression: first.to_string(),
        });
    }

    let mut ast = first.clone();
    for rule in rest {
        ast = AstNode::operator(LogicalOperator::And, ast, rule.clone());
    }

    // Compound inputs are wrapped in parentheses so the joined text
    // keeps each rule's own grouping when parsed again.
    let expression = rules
        .iter()
        .map(|rule| {
            if rule.is_compound() {
                format!("({})", rule)
            } else {
                rule.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    Ok(CombinedRule { ast, expression })
}
