use crate::ast::{AstNode, Comparison, ComparisonOperator, Literal, LogicalOperator};
use crate::error::ParseError;
use crate::token::{tokenize, Token};

/// Parse rule expression text into a tree.
pub fn parse(text: &str) -> Result<AstNode, ParseError> {
    parse_tokens(&tokenize(text))
}

/// Parse an already-tokenized expression.
///
/// Tokens are first grouped by parenthesis depth into nested runs,
/// then each flat run is split with two precedence levels: the last
/// top-level `OR` first, else the last top-level `AND`, so that AND
/// binds tighter than OR and same-precedence chains associate left
/// (`A OR B OR C` parses as `(A OR B) OR C`). A run with neither
/// keyword must be a lone parenthesized group or a bare comparison of
/// exactly three pieces.
pub fn parse_tokens(tokens: &[Token]) -> Result<AstNode, ParseError> {
    let run = group(tokens)?;
    if run.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    parse_run(&run)
}

/// One element of a flat run at a single nesting depth. Each element
/// remembers the index of the token it came from for error reporting.
#[derive(Debug)]
enum RunItem {
    Piece(String, usize),
    Keyword(LogicalOperator, usize),
    Group(Vec<RunItem>, usize),
}

fn group(tokens: &[Token]) -> Result<Vec<RunItem>, ParseError> {
    // Stack of open runs; each entry remembers where its `(` was.
    let mut stack: Vec<(Vec<RunItem>, usize)> = vec![(Vec::new(), 0)];
    for (position, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => stack.push((Vec::new(), position)),
            Token::RParen => {
                if stack.len() == 1 {
                    return Err(ParseError::UnbalancedParen { position });
                }
                let (run, open) = stack.pop().expect("stack has at least two entries");
                stack
                    .last_mut()
                    .expect("outer run remains")
                    .0
                    .push(RunItem::Group(run, open));
            }
            Token::And => stack
                .last_mut()
                .expect("outer run remains")
                .0
                .push(RunItem::Keyword(LogicalOperator::And, position)),
            Token::Or => stack
                .last_mut()
                .expect("outer run remains")
                .0
                .push(RunItem::Keyword(LogicalOperator::Or, position)),
            Token::Operand(text) => stack
                .last_mut()
                .expect("outer run remains")
                .0
                .push(RunItem::Piece(text.clone(), position)),
        }
    }
    if stack.len() != 1 {
        let position = stack.last().expect("stack is non-empty").1;
        return Err(ParseError::UnbalancedParen { position });
    }
    Ok(stack.pop().expect("outer run remains").0)
}

fn parse_run(items: &[RunItem]) -> Result<AstNode, ParseError> {
    if items.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    if let Some(split) = last_keyword(items, LogicalOperator::Or) {
        return split_run(items, LogicalOperator::Or, split);
    }
    if let Some(split) = last_keyword(items, LogicalOperator::And) {
        return split_run(items, LogicalOperator::And, split);
    }
    match items {
        [RunItem::Group(inner, _)] => {
            if inner.is_empty() {
                return Err(ParseError::EmptyExpression);
            }
            parse_run(inner)
        }
        _ => parse_comparison(items),
    }
}

/// Index and source position of the last top-level occurrence of `op`.
fn last_keyword(items: &[RunItem], op: LogicalOperator) -> Option<(usize, usize)> {
    items.iter().enumerate().rev().find_map(|(index, item)| match item {
        RunItem::Keyword(found, position) if *found == op => Some((index, *position)),
        _ => None,
    })
}

fn split_run(
    items: &[RunItem],
    op: LogicalOperator,
    (index, position): (usize, usize),
) -> Result<AstNode, ParseError> {
    let (left, right) = (&items[..index], &items[index + 1..]);
    if left.is_empty() || right.is_empty() {
        return Err(ParseError::DanglingOperator {
            keyword: op.keyword(),
            position,
        });
    }
    Ok(AstNode::operator(op, parse_run(left)?, parse_run(right)?))
}

/// A keyword-free run must decompose into exactly `field operator
/// literal`.
fn parse_comparison(items: &[RunItem]) -> Result<AstNode, ParseError> {
    let position = run_position(&items[0]);
    let mut pieces = Vec::with_capacity(items.len());
    for item in items {
        match item {
            RunItem::Piece(text, _) => pieces.push(text.as_str()),
            // A parenthesized group mixed into a comparison (or next to
            // one with no joining keyword) has no grammatical reading.
            RunItem::Group(_, open) => {
                return Err(ParseError::MalformedComparison {
                    pieces: items.len(),
                    position: *open,
                })
            }
            RunItem::Keyword(op, position) => {
                return Err(ParseError::DanglingOperator {
                    keyword: op.keyword(),
                    position: *position,
                })
            }
        }
    }
    if pieces.len() != 3 {
        return Err(ParseError::MalformedComparison {
            pieces: pieces.len(),
            position,
        });
    }
    let operator =
        ComparisonOperator::from_symbol(pieces[1]).ok_or_else(|| ParseError::UnknownOperator {
            symbol: pieces[1].to_string(),
            position: position + 1,
        })?;
    Ok(AstNode::Operand(Comparison {
        field: pieces[0].to_string(),
        operator,
        literal: parse_literal(pieces[2]),
    }))
}

fn run_position(item: &RunItem) -> usize {
    match item {
        RunItem::Piece(_, position)
        | RunItem::Keyword(_, position)
        | RunItem::Group(_, position) => *position,
    }
}

/// Integer first, then float, then text with surrounding quotes
/// stripped.
fn parse_literal(text: &str) -> Literal {
    if let Ok(n) = text.parse::<i64>() {
        return Literal::Integer(n);
    }
    // Non-finite floats ("NaN", "inf") have no stored representation
    // and no total ordering; they stay text.
    if let Ok(x) = text.parse::<f64>() {
        if x.is_finite() {
            return Literal::Float(x);
        }
    }
    Literal::Text(strip_quotes(text).to_string())
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['\'', '"'] {
        let quoted = text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote);
        if quoted {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: &str, operator: ComparisonOperator, literal: Literal) -> AstNode {
        AstNode::Operand(Comparison {
            field: field.to_string(),
            operator,
            literal,
        })
    }

    #[test]
    fn test_parse_simple_comparison() {
        let ast = parse("age > 30").unwrap();
        assert_eq!(ast, leaf("age", ComparisonOperator::Gt, Literal::Integer(30)));
    }

    #[test]
    fn test_parse_all_comparison_operators() {
        for (text, operator) in [
            ("a = 1", ComparisonOperator::Eq),
            ("a != 1", ComparisonOperator::Ne),
            ("a > 1", ComparisonOperator::Gt),
            ("a < 1", ComparisonOperator::Lt),
            ("a >= 1", ComparisonOperator::Ge),
            ("a <= 1", ComparisonOperator::Le),
        ] {
            let ast = parse(text).unwrap();
            assert_eq!(ast, leaf("a", operator, Literal::Integer(1)), "{}", text);
        }
    }

    #[test]
    fn test_parse_literal_kinds() {
        let ast = parse("age > 30").unwrap();
        assert_eq!(ast, leaf("age", ComparisonOperator::Gt, Literal::Integer(30)));

        let ast = parse("score >= 4.5").unwrap();
        assert_eq!(ast, leaf("score", ComparisonOperator::Ge, Literal::Float(4.5)));

        let ast = parse("department = 'Sales'").unwrap();
        assert_eq!(
            ast,
            leaf(
                "department",
                ComparisonOperator::Eq,
                Literal::Text("Sales".to_string())
            )
        );

        // Double quotes strip the same way; unquoted words stay text.
        let ast = parse("department = \"Sales\"").unwrap();
        assert_eq!(
            ast,
            leaf(
                "department",
                ComparisonOperator::Eq,
                Literal::Text("Sales".to_string())
            )
        );

        let ast = parse("department = Sales").unwrap();
        assert_eq!(
            ast,
            leaf(
                "department",
                ComparisonOperator::Eq,
                Literal::Text("Sales".to_string())
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse("a = 1 OR b = 2 AND c = 3").unwrap();
        let expected = AstNode::operator(
            LogicalOperator::Or,
            leaf("a", ComparisonOperator::Eq, Literal::Integer(1)),
            AstNode::operator(
                LogicalOperator::And,
                leaf("b", ComparisonOperator::Eq, Literal::Integer(2)),
                leaf("c", ComparisonOperator::Eq, Literal::Integer(3)),
            ),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_same_precedence_chains_associate_left() {
        let ast = parse("a = 1 AND b = 2 AND c = 3").unwrap();
        let expected = AstNode::operator(
            LogicalOperator::And,
            AstNode::operator(
                LogicalOperator::And,
                leaf("a", ComparisonOperator::Eq, Literal::Integer(1)),
                leaf("b", ComparisonOperator::Eq, Literal::Integer(2)),
            ),
            leaf("c", ComparisonOperator::Eq, Literal::Integer(3)),
        );
        assert_eq!(ast, expected);

        let ast = parse("a = 1 OR b = 2 OR c = 3").unwrap();
        let expected = AstNode::operator(
            LogicalOperator::Or,
            AstNode::operator(
                LogicalOperator::Or,
                leaf("a", ComparisonOperator::Eq, Literal::Integer(1)),
                leaf("b", ComparisonOperator::Eq, Literal::Integer(2)),
            ),
            leaf("c", ComparisonOperator::Eq, Literal::Integer(3)),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let ast = parse("(a = 1 OR b = 2) AND c = 3").unwrap();
        let expected = AstNode::operator(
            LogicalOperator::And,
            AstNode::operator(
                LogicalOperator::Or,
                leaf("a", ComparisonOperator::Eq, Literal::Integer(1)),
                leaf("b", ComparisonOperator::Eq, Literal::Integer(2)),
            ),
            leaf("c", ComparisonOperator::Eq, Literal::Integer(3)),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_redundant_parentheses_collapse() {
        let plain = parse("age > 30").unwrap();
        assert_eq!(parse("(age > 30)").unwrap(), plain);
        assert_eq!(parse("((age > 30))").unwrap(), plain);
    }

    #[test]
    fn test_parse_scenario_expression() {
        let ast = parse("(age > 30 AND department = 'Sales')").unwrap();
        let expected = AstNode::operator(
            LogicalOperator::And,
            leaf("age", ComparisonOperator::Gt, Literal::Integer(30)),
            leaf(
                "department",
                ComparisonOperator::Eq,
                Literal::Text("Sales".to_string()),
            ),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_empty_expression_fails() {
        assert_eq!(parse(""), Err(ParseError::EmptyExpression));
        assert_eq!(parse("   "), Err(ParseError::EmptyExpression));
        assert_eq!(parse("()"), Err(ParseError::EmptyExpression));
    }

    #[test]
    fn test_unbalanced_parentheses_fail() {
        assert_eq!(
            parse("(age > 30"),
            Err(ParseError::UnbalancedParen { position: 0 })
        );
        assert_eq!(
            parse("age > 30)"),
            Err(ParseError::UnbalancedParen { position: 3 })
        );
    }

    #[test]
    fn test_two_piece_operand_fails() {
        assert_eq!(
            parse("(age >)"),
            Err(ParseError::MalformedComparison {
                pieces: 2,
                position: 1
            })
        );
    }

    #[test]
    fn test_four_piece_operand_fails() {
        assert!(matches!(
            parse("age > 30 extra"),
            Err(ParseError::MalformedComparison { pieces: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_operator_fails() {
        assert!(matches!(
            parse("age ~ 30"),
            Err(ParseError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_dangling_operators_fail() {
        assert!(matches!(
            parse("age > 30 AND"),
            Err(ParseError::DanglingOperator { keyword: "AND", .. })
        ));
        assert!(matches!(
            parse("OR age > 30"),
            Err(ParseError::DanglingOperator { keyword: "OR", .. })
        ));
        assert!(matches!(
            parse("a = 1 AND AND b = 2"),
            Err(ParseError::DanglingOperator { keyword: "AND", .. })
        ));
    }

    #[test]
    fn test_adjacent_groups_without_keyword_fail() {
        assert!(matches!(
            parse("(a = 1) (b = 2)"),
            Err(ParseError::MalformedComparison { .. })
        ));
    }
}
