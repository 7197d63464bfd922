pub mod ast;
pub mod combiner;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod token;

pub use ast::{
    deserialize, serialize, AstNode, Comparison, ComparisonOperator, Literal, LogicalOperator,
};
pub use combiner::{combine, CombinedRule};
pub use engine::RuleEngine;
pub use error::{
    CombineError, EvaluationError, ParseError, RuleError, RuleResult, SerializationError,
};
pub use evaluator::evaluate;
pub use parser::{parse, parse_tokens};
pub use token::{tokenize, Token};
