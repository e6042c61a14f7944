//! Expression parser
//!
//! Parses string expressions into Expression AST nodes.
//!
//! Supported syntax:
//! - Variable access: `customer.age`, `sys.hour`
//! - Literals: `42`, `3.14`, `"string"`, `'string'`, `true`, `false`, `null`, `["a", "b"]`
//! - Binary operators: `>`, `<`, `>=`, `<=`, `==`, `!=`, `+`, `-`, `*`, `/`, `%`, `&&`, `||`
//! - Keyword operators: `and`, `or`, `in`, `not in`, `contains`, `starts_with`, `ends_with`
//! - Unary operators: `!`, `not`, `-`
//! - Function calls: `len(items)`, `loyalty.tier(customer.id)`
//! - Parentheses for grouping: `(a + b) * c`
//!
//! Precedence, lowest first: `||`, `&&`, comparison / membership, `+ -`, `* / %`, unary.

use crate::error::{ParseError, Result};
use std::fmt;
use tabula_core::ast::{Expression, Operator, UnaryOperator};
use tabula_core::Value;

const KEYWORD_OPERATORS: &[&str] = &["and", "or", "in", "contains", "starts_with", "ends_with"];

/// Expression parser
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Expression> {
        let source = input.trim();
        if source.is_empty() {
            return Err(invalid(input, "empty expression"));
        }

        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };

        let expression = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error(format!("unexpected token {}", token)));
        }
        Ok(expression)
    }
}

fn invalid(expression: &str, message: impl Into<String>) -> ParseError {
    ParseError::InvalidExpression {
        expression: expression.to_string(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Symbol(&'static str),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "'{}'", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Symbol(s) => write!(f, "'{}'", s),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let number = text
                .parse::<f64>()
                .map_err(|_| invalid(source, format!("invalid number '{}'", text)))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut literal = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(invalid(source, "unterminated string literal")),
                    Some(&ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = chars
                            .get(i + 1)
                            .ok_or_else(|| invalid(source, "unterminated string literal"))?;
                        literal.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => *other,
                        });
                        i += 2;
                    }
                    Some(&ch) => {
                        literal.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(literal));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        let pair: String = chars[i..(i + 2).min(chars.len())].iter().collect();
        let double = match pair.as_str() {
            "==" => Some("=="),
            "!=" => Some("!="),
            "<=" => Some("<="),
            ">=" => Some(">="),
            "&&" => Some("&&"),
            "||" => Some("||"),
            _ => None,
        };
        if let Some(symbol) = double {
            tokens.push(Token::Symbol(symbol));
            i += 2;
            continue;
        }

        let single = match c {
            '<' => "<",
            '>' => ">",
            '+' => "+",
            '-' => "-",
            '*' => "*",
            '/' => "/",
            '%' => "%",
            '!' => "!",
            '(' => "(",
            ')' => ")",
            '[' => "[",
            ']' => "]",
            ',' => ",",
            '.' => ".",
            other => return Err(invalid(source, format!("unexpected character '{}'", other))),
        };
        tokens.push(Token::Symbol(single));
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos + offset), Some(Token::Ident(s)) if s == keyword)
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        if matches!(self.peek(), Some(Token::Symbol(s)) if *s == symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword_at(0, keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "end of input".to_string());
            Err(self.error(format!("expected '{}', found {}", symbol, found)))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        invalid(self.source, message)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.eat_symbol("||") || self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expression::binary(left, Operator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;
        while self.eat_symbol("&&") || self.eat_keyword("and") {
            let right = self.parse_comparison()?;
            left = Expression::binary(left, Operator::And, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_additive()?;

        let op = if self.eat_symbol("==") {
            Some(Operator::Eq)
        } else if self.eat_symbol("!=") {
            Some(Operator::Ne)
        } else if self.eat_symbol("<=") {
            Some(Operator::Le)
        } else if self.eat_symbol(">=") {
            Some(Operator::Ge)
        } else if self.eat_symbol("<") {
            Some(Operator::Lt)
        } else if self.eat_symbol(">") {
            Some(Operator::Gt)
        } else if self.eat_keyword("in") {
            Some(Operator::In)
        } else if self.is_keyword_at(0, "not") && self.is_keyword_at(1, "in") {
            self.pos += 2;
            Some(Operator::NotIn)
        } else if self.eat_keyword("contains") {
            Some(Operator::Contains)
        } else if self.eat_keyword("starts_with") {
            Some(Operator::StartsWith)
        } else if self.eat_keyword("ends_with") {
            Some(Operator::EndsWith)
        } else {
            None
        };

        match op {
            Some(op) => {
                let right = self.parse_additive()?;
                Ok(Expression::binary(left, op, right))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat_symbol("+") {
                Operator::Add
            } else if self.eat_symbol("-") {
                Operator::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat_symbol("*") {
                Operator::Mul
            } else if self.eat_symbol("/") {
                Operator::Div
            } else if self.eat_symbol("%") {
                Operator::Mod
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        if self.eat_symbol("!") || self.eat_keyword("not") {
            let operand = self.parse_unary()?;
            return Ok(Expression::unary(UnaryOperator::Not, operand));
        }

        if self.eat_symbol("-") {
            let operand = self.parse_unary()?;
            // Fold negative number literals
            if let Expression::Literal(Value::Number(n)) = operand {
                return Ok(Expression::Literal(Value::Number(-n)));
            }
            return Ok(Expression::unary(UnaryOperator::Negate, operand));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = match self.tokens.get(self.pos).cloned() {
            Some(token) => token,
            None => return Err(self.error("unexpected end of input")),
        };
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(Expression::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expression::Literal(Value::String(s))),
            Token::Symbol("(") => {
                let inner = self.parse_or()?;
                self.expect_symbol(")")?;
                Ok(inner)
            }
            Token::Symbol("[") => {
                let items = self.parse_sequence("]")?;
                Ok(Expression::List(items))
            }
            Token::Ident(ident) => match ident.as_str() {
                "true" => Ok(Expression::Literal(Value::Bool(true))),
                "false" => Ok(Expression::Literal(Value::Bool(false))),
                "null" => Ok(Expression::Literal(Value::Null)),
                kw if KEYWORD_OPERATORS.contains(&kw) => {
                    Err(self.error(format!("unexpected keyword '{}'", kw)))
                }
                _ => self.parse_path(ident),
            },
            other => Err(self.error(format!("unexpected token {}", other))),
        }
    }

    /// Parse a dotted path, then decide between variable access and function call
    fn parse_path(&mut self, first: String) -> Result<Expression> {
        let mut path = vec![first];
        while self.eat_symbol(".") {
            match self.tokens.get(self.pos).cloned() {
                Some(Token::Ident(segment)) => {
                    self.pos += 1;
                    path.push(segment);
                }
                _ => return Err(self.error("expected identifier after '.'")),
            }
        }

        if self.eat_symbol("(") {
            let args = self.parse_sequence(")")?;
            return Ok(Expression::function_call(path.join("."), args));
        }

        Ok(Expression::field_access(path))
    }

    /// Parse comma-separated expressions up to and including `close`
    fn parse_sequence(&mut self, close: &str) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if self.eat_symbol(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_or()?);
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol(close)?;
            return Ok(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(path: &str) -> Expression {
        Expression::variable(path)
    }

    #[test]
    fn test_parse_comparison() {
        let expr = ExpressionParser::parse("customer.age >= 18").unwrap();
        assert_eq!(
            expr,
            Expression::binary(var("customer.age"), Operator::Ge, Expression::literal(18.0))
        );
    }

    #[test]
    fn test_precedence() {
        let expr = ExpressionParser::parse("a + b * 2 > 10 && flag").unwrap();
        let expected = Expression::binary(
            Expression::binary(
                Expression::binary(
                    var("a"),
                    Operator::Add,
                    Expression::binary(var("b"), Operator::Mul, Expression::literal(2.0)),
                ),
                Operator::Gt,
                Expression::literal(10.0),
            ),
            Operator::And,
            var("flag"),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_left_associativity() {
        let expr = ExpressionParser::parse("10 - 3 - 2").unwrap();
        let expected = Expression::binary(
            Expression::binary(Expression::literal(10.0), Operator::Sub, Expression::literal(3.0)),
            Operator::Sub,
            Expression::literal(2.0),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_keyword_operators() {
        let expr = ExpressionParser::parse("tier not in [\"gold\", 'silver']").unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::NotIn);
                assert_eq!(
                    *right,
                    Expression::List(vec![
                        Expression::literal("gold"),
                        Expression::literal("silver"),
                    ])
                );
            }
            _ => panic!("Expected Binary expression"),
        }

        let expr = ExpressionParser::parse("email ends_with \"@example.com\" or vip").unwrap();
        assert!(matches!(expr, Expression::Binary { op: Operator::Or, .. }));
    }

    #[test]
    fn test_function_calls() {
        let expr = ExpressionParser::parse("max(len(items), loyalty.points(customer.id))").unwrap();
        assert_eq!(
            expr,
            Expression::function_call(
                "max",
                vec![
                    Expression::function_call("len", vec![var("items")]),
                    Expression::function_call("loyalty.points", vec![var("customer.id")]),
                ],
            )
        );

        let expr = ExpressionParser::parse("now()").unwrap();
        assert_eq!(expr, Expression::function_call("now", vec![]));
    }

    #[test]
    fn test_unary_and_negative_literals() {
        assert_eq!(
            ExpressionParser::parse("-5").unwrap(),
            Expression::literal(-5.0)
        );
        assert_eq!(
            ExpressionParser::parse("!active").unwrap(),
            Expression::unary(UnaryOperator::Not, var("active"))
        );
        assert_eq!(
            ExpressionParser::parse("-balance").unwrap(),
            Expression::unary(UnaryOperator::Negate, var("balance"))
        );
    }

    #[test]
    fn test_string_with_operator_characters() {
        let expr = ExpressionParser::parse("note == \"a && b || c\"").unwrap();
        assert_eq!(
            expr,
            Expression::binary(var("note"), Operator::Eq, Expression::literal("a && b || c"))
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(ExpressionParser::parse("null").unwrap(), Expression::Literal(Value::Null));
        assert_eq!(ExpressionParser::parse("true").unwrap(), Expression::literal(true));
        assert_eq!(ExpressionParser::parse("3.25").unwrap(), Expression::literal(3.25));
        assert_eq!(ExpressionParser::parse("[]").unwrap(), Expression::List(vec![]));
    }

    #[test]
    fn test_errors() {
        assert!(ExpressionParser::parse("").is_err());
        assert!(ExpressionParser::parse("a >").is_err());
        assert!(ExpressionParser::parse("(a > 1").is_err());
        assert!(ExpressionParser::parse("\"open").is_err());
        assert!(ExpressionParser::parse("a # b").is_err());
        assert!(ExpressionParser::parse("a b").is_err());
        assert!(ExpressionParser::parse("in > 3").is_err());
        assert!(ExpressionParser::parse("customer.").is_err());
    }
}
