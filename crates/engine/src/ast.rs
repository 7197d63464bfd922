use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SerializationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Le => "<=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(ComparisonOperator::Eq),
            "!=" => Some(ComparisonOperator::Ne),
            ">" => Some(ComparisonOperator::Gt),
            "<" => Some(ComparisonOperator::Lt),
            ">=" => Some(ComparisonOperator::Ge),
            "<=" => Some(ComparisonOperator::Le),
            _ => None,
        }
    }
}

/// Right-hand side of a comparison. Always a literal, never a second
/// field reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// A leaf fact: `field operator literal`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub operator: ComparisonOperator,
    pub literal: Literal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator.symbol(), self.literal)
    }
}

/// Rule expression tree. Operator nodes always own exactly two
/// children; an operator with a missing child is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Operand(Comparison),
    Operator {
        op: LogicalOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    pub fn operator(op: LogicalOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// True for AND/OR nodes, false for a bare comparison.
    pub fn is_compound(&self) -> bool {
        matches!(self, AstNode::Operator { .. })
    }
}

impl fmt::Display for AstNode {
    /// Renders a re-parseable expression string. Compound children are
    /// parenthesized so the printed text parses back to an equivalent
    /// tree regardless of precedence.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Operand(comparison) => write!(f, "{}", comparison),
            AstNode::Operator { op, left, right } => {
                write_child(f, left)?;
                write!(f, " {} ", op.keyword())?;
                write_child(f, right)
            }
        }
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &AstNode) -> fmt::Result {
    if child.is_compound() {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

/// Stored tree-of-records shape: one record per node. Operator records
/// carry `op`/`left`/`right`, operand records carry `field`/`operator`/
/// `literal`. The layout is the persisted artifact and must stay
/// stable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeRecord {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    left: Option<Box<NodeRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right: Option<Box<NodeRecord>>,
}

impl AstNode {
    fn to_record(&self) -> NodeRecord {
        match self {
            AstNode::Operator { op, left, right } => NodeRecord {
                kind: "operator".to_string(),
                op: Some(op.keyword().to_string()),
                field: None,
                operator: None,
                literal: None,
                left: Some(Box::new(left.to_record())),
                right: Some(Box::new(right.to_record())),
            },
            AstNode::Operand(comparison) => NodeRecord {
                kind: "operand".to_string(),
                op: None,
                field: Some(comparison.field.clone()),
                operator: Some(comparison.operator.symbol().to_string()),
                literal: Some(literal_to_value(&comparison.literal)),
                left: None,
                right: None,
            },
        }
    }

    fn from_record(record: NodeRecord) -> Result<AstNode, SerializationError> {
        match record.kind.as_str() {
            "operator" => {
                reject_key("operator", "field", record.field.is_some())?;
                reject_key("operator", "operator", record.operator.is_some())?;
                reject_key("operator", "literal", record.literal.is_some())?;
                let keyword = record.op.ok_or(SerializationError::MissingKey {
                    kind: "operator",
                    key: "op",
                })?;
                let op = LogicalOperator::from_keyword(&keyword)
                    .ok_or(SerializationError::UnknownLogicalOperator(keyword))?;
                let left = record.left.ok_or(SerializationError::MissingKey {
                    kind: "operator",
                    key: "left",
                })?;
                let right = record.right.ok_or(SerializationError::MissingKey {
                    kind: "operator",
                    key: "right",
                })?;
                Ok(AstNode::operator(
                    op,
                    AstNode::from_record(*left)?,
                    AstNode::from_record(*right)?,
                ))
            }
            "operand" => {
                reject_key("operand", "op", record.op.is_some())?;
                reject_key("operand", "left", record.left.is_some())?;
                reject_key("operand", "right", record.right.is_some())?;
                let field = record.field.ok_or(SerializationError::MissingKey {
                    kind: "operand",
                    key: "field",
                })?;
                let symbol = record.operator.ok_or(SerializationError::MissingKey {
                    kind: "operand",
                    key: "operator",
                })?;
                let operator = ComparisonOperator::from_symbol(&symbol)
                    .ok_or(SerializationError::UnknownComparisonOperator(symbol))?;
                let value = record.literal.ok_or(SerializationError::MissingKey {
                    kind: "operand",
                    key: "literal",
                })?;
                Ok(AstNode::Operand(Comparison {
                    field,
                    operator,
                    literal: literal_from_value(value)?,
                }))
            }
            other => Err(SerializationError::UnknownKind(other.to_string())),
        }
    }
}

fn reject_key(
    kind: &'static str,
    key: &'static str,
    present: bool,
) -> Result<(), SerializationError> {
    if present {
        Err(SerializationError::UnexpectedKey { kind, key })
    } else {
        Ok(())
    }
}

fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(n) => Value::from(*n),
        Literal::Float(x) => Value::from(*x),
        Literal::Text(s) => Value::String(s.clone()),
    }
}

fn literal_from_value(value: Value) -> Result<Literal, SerializationError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Literal::Integer(i))
            } else if let Some(x) = n.as_f64() {
                Ok(Literal::Float(x))
            } else {
                Err(SerializationError::UnsupportedLiteral(n.to_string()))
            }
        }
        Value::String(s) => Ok(Literal::Text(s)),
        other => Err(SerializationError::UnsupportedLiteral(other.to_string())),
    }
}

/// Serialize a tree to its stored byte form. The write is a single
/// atomic replace from the caller's point of view: there is no partial
/// tree state.
pub fn serialize(node: &AstNode) -> Result<Vec<u8>, SerializationError> {
    serde_json::to_vec(&node.to_record())
        .map_err(|e| SerializationError::Malformed(e.to_string()))
}

/// Rebuild a tree from stored bytes, validating shape as it goes.
pub fn deserialize(bytes: &[u8]) -> Result<AstNode, SerializationError> {
    let record: NodeRecord = serde_json::from_slice(bytes)
        .map_err(|e| SerializationError::Malformed(e.to_string()))?;
    AstNode::from_record(record)
}
