//! Arithmetic parser
//!
//! A recursive descent parser over a closed token set: numbers, `+ - * /`
//! and parentheses. Anything else is a parse error, so a parsed expression
//! can only ever be evaluated as arithmetic.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Nesting depth used by [`parse_formula`]
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse an arithmetic expression into an AST
///
/// Whitespace-only input parses to [`FormulaExpr::Empty`].
///
/// # Example
/// ```rust
/// use lotledger_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("(12500 + 570.5) / 30").unwrap();
/// assert!(parse_formula("1 +").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_formula_with_depth(formula, DEFAULT_MAX_DEPTH)
}

/// Parse an arithmetic expression, failing once nesting exceeds `max_depth`
///
/// Each parenthesized group and each prefix sign counts as one level.
pub fn parse_formula_with_depth(formula: &str, max_depth: usize) -> FormulaResult<FormulaExpr> {
    if formula.trim().is_empty() {
        return Ok(FormulaExpr::Empty);
    }

    let mut parser = FormulaParser::new(formula, max_depth);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    // Delimiters
    LeftParen,
    RightParen,

    /// Character outside the arithmetic token set
    Invalid(char),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
    max_depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, max_depth: usize) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
            max_depth,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            _ if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                return self.scan_number();
            }
            _ => Token::Invalid(c),
        };

        self.advance();
        token
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) => Token::Number(num),
            // Unreachable for ASCII digits with at most one dot
            Err(_) => Token::Invalid('.'),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(FormulaError::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Primary: numbers, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.consume();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::LeftParen => {
                self.consume();
                self.enter()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                self.leave();
                Ok(expr)
            }

            Token::Eof => Err(FormulaError::Parse("Unexpected end of formula".into())),

            token => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("3.14").unwrap(), FormulaExpr::Number(3.14));
        assert_eq!(parse_formula(".5").unwrap(), FormulaExpr::Number(0.5));
        assert_eq!(parse_formula("5.").unwrap(), FormulaExpr::Number(5.0));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_formula("").unwrap(), FormulaExpr::Empty);
        assert_eq!(parse_formula("  \t ").unwrap(), FormulaExpr::Empty);
    }

    #[test]
    fn test_parse_arithmetic() {
        let ast = parse_formula("1+2*3").unwrap();
        // Should parse as 1+(2*3) due to precedence
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, FormulaExpr::Number(1.0));
            assert!(matches!(
                *right,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_left_associative() {
        let ast = parse_formula("8 - 3 - 1").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Subtract);
            assert!(matches!(
                *left,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Subtract,
                    ..
                }
            ));
            assert_eq!(*right, FormulaExpr::Number(1.0));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_unary() {
        let ast = parse_formula("-5").unwrap();
        assert!(matches!(
            ast,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            }
        ));

        // Substituted negative values follow a binary operator
        let ast = parse_formula("10 - -5").unwrap();
        if let FormulaExpr::BinaryOp { op, right, .. } = ast {
            assert_eq!(op, BinaryOperator::Subtract);
            assert!(matches!(
                *right,
                FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_formula("(1+2)*3").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Multiply);
            assert!(matches!(
                *left,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Add,
                    ..
                }
            ));
            assert_eq!(*right, FormulaExpr::Number(3.0));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("1 +").is_err());
        assert!(parse_formula("()").is_err());
        assert!(parse_formula("(1").is_err());
        assert!(parse_formula("1)").is_err());
        assert!(parse_formula("1 2").is_err());
        assert!(parse_formula("1.2.3").is_err());
        assert!(parse_formula("(1)(2)").is_err());
        assert!(parse_formula("* 3").is_err());
        assert!(parse_formula(".").is_err());
    }

    #[test]
    fn test_parse_rejects_non_arithmetic() {
        assert!(matches!(
            parse_formula("1; x"),
            Err(FormulaError::Parse(_))
        ));
        assert!(parse_formula("2 ^ 3").is_err());
        assert!(parse_formula("1e5").is_err());
        assert!(parse_formula("{a}").is_err());
    }

    #[test]
    fn test_parse_depth_limit() {
        let nested = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_formula_with_depth(&nested, 10).is_ok());
        assert_eq!(
            parse_formula_with_depth(&nested, 9),
            Err(FormulaError::TooDeep { limit: 9 })
        );

        let signs = format!("{}1", "-".repeat(100));
        assert_eq!(
            parse_formula(&signs),
            Err(FormulaError::TooDeep {
                limit: DEFAULT_MAX_DEPTH
            })
        );
    }
}
