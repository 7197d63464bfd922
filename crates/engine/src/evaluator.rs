use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::ast::{AstNode, Comparison, ComparisonOperator, Literal, LogicalOperator};
use crate::error::EvaluationError;

/// Walk a rule tree against a flat field mapping.
///
/// AND and OR short-circuit on the left operand: a false left AND (or
/// a true left OR) never touches the right subtree, so a missing field
/// in an unreached branch is never reported.
pub fn evaluate(node: &AstNode, data: &Map<String, Value>) -> Result<bool, EvaluationError> {
    match node {
        AstNode::Operator {
            op: LogicalOperator::And,
            left,
            right,
        } => {
            if !evaluate(left, data)? {
                return Ok(false);
            }
            evaluate(right, data)
        }
        AstNode::Operator {
            op: LogicalOperator::Or,
            left,
            right,
        } => {
            if evaluate(left, data)? {
                return Ok(true);
            }
            evaluate(right, data)
        }
        AstNode::Operand(comparison) => evaluate_comparison(comparison, data),
    }
}

fn evaluate_comparison(
    comparison: &Comparison,
    data: &Map<String, Value>,
) -> Result<bool, EvaluationError> {
    // JSON null carries no comparable value, same as an absent key.
    let value = data
        .get(&comparison.field)
        .filter(|value| !value.is_null())
        .ok_or_else(|| EvaluationError::MissingField {
            field: comparison.field.clone(),
        })?;

    let ordered = || {
        compare_values(value, &comparison.literal).ok_or_else(|| EvaluationError::TypeMismatch {
            field: comparison.field.clone(),
        })
    };

    match comparison.operator {
        // Equality across mismatched types is false, never an error.
        ComparisonOperator::Eq => Ok(values_equal(value, &comparison.literal)),
        ComparisonOperator::Ne => Ok(!values_equal(value, &comparison.literal)),
        ComparisonOperator::Gt => Ok(ordered()? == Ordering::Greater),
        ComparisonOperator::Lt => Ok(ordered()? == Ordering::Less),
        ComparisonOperator::Ge => Ok(ordered()? != Ordering::Less),
        ComparisonOperator::Le => Ok(ordered()? != Ordering::Greater),
    }
}

fn values_equal(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::Number(n), Literal::Integer(i)) => n.as_f64() == Some(*i as f64),
        (Value::Number(n), Literal::Float(x)) => n.as_f64() == Some(*x),
        (Value::String(s), Literal::Text(t)) => s == t,
        _ => false,
    }
}

/// Ordering across number/number and string/string only; anything else
/// (including booleans) has no defined order against a literal.
fn compare_values(value: &Value, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::Number(n), Literal::Integer(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), Literal::Float(x)) => n.as_f64()?.partial_cmp(x),
        (Value::String(s), Literal::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        _ => None,
    }
}
