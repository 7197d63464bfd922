use thiserror::Error;

pub type RuleResult<T> = Result<T, RuleError>;

/// Crate-level error covering every stage of the engine.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Combine(#[from] CombineError),
}

/// Malformed rule expression text. Positions are token indices into
/// the tokenized expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty rule expression")]
    EmptyExpression,

    #[error("unbalanced parenthesis at token {position}")]
    UnbalancedParen { position: usize },

    #[error("dangling `{keyword}` at token {position}")]
    DanglingOperator {
        keyword: &'static str,
        position: usize,
    },

    #[error("comparison must be `field operator literal`, found {pieces} piece(s) at token {position}")]
    MalformedComparison { pieces: usize, position: usize },

    #[error("unknown comparison operator `{symbol}` at token {position}")]
    UnknownOperator { symbol: String, position: usize },
}

/// Malformed stored tree record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("malformed stored tree: {0}")]
    Malformed(String),

    #[error("unknown node kind `{0}`")]
    UnknownKind(String),

    #[error("missing key `{key}` on {kind} node")]
    MissingKey {
        kind: &'static str,
        key: &'static str,
    },

    #[error("unexpected key `{key}` on {kind} node")]
    UnexpectedKey {
        kind: &'static str,
        key: &'static str,
    },

    #[error("unknown logical operator `{0}`")]
    UnknownLogicalOperator(String),

    #[error("unknown comparison operator `{0}`")]
    UnknownComparisonOperator(String),

    #[error("unsupported literal value `{0}`")]
    UnsupportedLiteral(String),
}

/// Failure while walking a tree against input data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("field `{field}` missing from input data")]
    MissingField { field: String },

    #[error("cannot order-compare field `{field}`: incompatible types")]
    TypeMismatch { field: String },
}

/// Failure while folding rule trees into a conjunction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombineError {
    #[error("cannot combine an empty list of rules")]
    EmptyInput,
}
