/// A single lexical unit of a rule expression. Operand fragments are
/// whitespace-free; grouping them into a comparison happens at parse
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    And,
    Or,
    Operand(String),
}

/// Split rule expression text into tokens. Total: unknown characters
/// simply become part of an operand fragment.
///
/// Parentheses are padded with spaces first so they always separate
/// from adjacent fragments, then the text is split on whitespace runs.
/// `AND` and `OR` match case-sensitively.
pub fn tokenize(text: &str) -> Vec<Token> {
    let padded = text.replace('(', " ( ").replace(')', " ) ");
    padded
        .split_whitespace()
        .map(|piece| match piece {
            "(" => Token::LParen,
            ")" => Token::RParen,
            "AND" => Token::And,
            "OR" => Token::Or,
            other => Token::Operand(other.to_string()),
        })
        .collect()
}
