//! Tokenizer and recursive-descent parser for report formulas.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := unary (('*' | '/') unary)*
//! unary      := '-' unary | factor
//! factor     := number | call | '(' expression ')'
//! call       := TOTAL_<STAGE>_<SIDE>_AMOUNT '(' selector ')'
//! selector   := 'COLLECTION' '[' id ']' | MACRO_NAME
//! ```

use std::{iter::Peekable, str::Chars};

use num_rational::BigRational;

use crate::{ExpressionError, Side, Stage, money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Number(String),
    Identifier(String),
    /// Raw text between `[` and `]`.
    Bracketed(String),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    EndOfInput,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.input.next_if(|ch| ch.is_whitespace()).is_some() {}
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut number = String::from(first);
        while let Some(ch) = self.input.next_if(|ch| ch.is_ascii_digit() || *ch == '.') {
            number.push(ch);
        }
        Token::Number(number)
    }

    fn read_identifier(&mut self, first: char) -> Token {
        let mut identifier = String::from(first);
        while let Some(ch) = self
            .input
            .next_if(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        {
            identifier.push(ch);
        }
        Token::Identifier(identifier)
    }

    fn read_bracketed(&mut self) -> Result<Token, ExpressionError> {
        let mut content = String::new();
        for ch in self.input.by_ref() {
            if ch == ']' {
                return Ok(Token::Bracketed(content.trim().to_string()));
            }
            content.push(ch);
        }
        Err(ExpressionError::syntax("unterminated '['"))
    }

    pub fn next_token(&mut self) -> Result<Token, ExpressionError> {
        self.skip_whitespace();
        let Some(ch) = self.input.next() else {
            return Ok(Token::EndOfInput);
        };
        match ch {
            '+' => Ok(Token::Plus),
            '-' => Ok(Token::Minus),
            '*' => Ok(Token::Star),
            '/' => Ok(Token::Slash),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),
            '[' => self.read_bracketed(),
            ch if ch.is_ascii_digit() || ch == '.' => Ok(self.read_number(ch)),
            ch if ch.is_ascii_alphabetic() || ch == '_' => Ok(self.read_identifier(ch)),
            other => Err(ExpressionError::syntax(format!(
                "unexpected character '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// One of the `TOTAL_<STAGE>_<SIDE>_AMOUNT` functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregateFunction {
    pub stage: Stage,
    pub side: Side,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("TOTAL_")?.strip_suffix("_AMOUNT")?;
        let (stage, side) = rest.split_once('_')?;
        let stage = match stage {
            "OPENED" => Stage::Opened,
            "UNADJUSTED" => Stage::Unadjusted,
            "CLOSED" => Stage::Closed,
            _ => return None,
        };
        let side = match side {
            "DEBIT" => Side::Debit,
            "CREDIT" => Side::Credit,
            _ => return None,
        };
        Some(Self { stage, side })
    }
}

/// Account set an aggregate is computed over. Kept unresolved until
/// evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `COLLECTION[<id>]`, with the raw id text.
    Collection(String),
    /// A named account-kind set such as `EXPENSE_ACCOUNTS`.
    Macro(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Literal(BigRational),
    Negate(Box<Expr>),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    AggregateCall {
        function: AggregateFunction,
        selector: Selector,
    },
}

impl Expr {
    /// Every selector of the tree, left to right.
    pub fn selectors(&self) -> Vec<&Selector> {
        let mut selectors = Vec::new();
        self.collect_selectors(&mut selectors);
        selectors
    }

    fn collect_selectors<'e>(&'e self, selectors: &mut Vec<&'e Selector>) {
        match self {
            Self::Literal(_) => {}
            Self::Negate(inner) => inner.collect_selectors(selectors),
            Self::BinaryOp { left, right, .. } => {
                left.collect_selectors(selectors);
                right.collect_selectors(selectors);
            }
            Self::AggregateCall { selector, .. } => selectors.push(selector),
        }
    }
}

pub struct ExprParser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> ExprParser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ExpressionError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Self {
            lexer,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), ExpressionError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        if self.current_token == expected {
            self.advance()
        } else {
            Err(ExpressionError::syntax(format!(
                "expected {expected:?}, found {:?}",
                self.current_token
            )))
        }
    }

    pub fn parse(&mut self) -> Result<Expr, ExpressionError> {
        if self.current_token == Token::EndOfInput {
            return Err(ExpressionError::syntax("empty formula"));
        }
        let expr = self.parse_expression()?;
        if self.current_token != Token::EndOfInput {
            return Err(ExpressionError::syntax(format!(
                "unexpected {:?} after expression",
                self.current_token
            )));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_term()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_token {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.current_token == Token::Minus {
            self.advance()?;
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_factor()
    }

    fn parse_factor(&mut self) -> Result<Expr, ExpressionError> {
        match self.current_token.clone() {
            Token::Number(text) => {
                let value = money::parse_amount(&text)
                    .map_err(|_| ExpressionError::syntax(format!("invalid number '{text}'")))?;
                self.advance()?;
                Ok(Expr::Literal(value))
            }
            Token::Identifier(name) => {
                let function = AggregateFunction::from_name(&name).ok_or_else(|| {
                    ExpressionError::syntax(format!("unknown function '{name}'"))
                })?;
                self.advance()?;
                self.expect(Token::LeftParen)?;
                let selector = self.parse_selector()?;
                self.expect(Token::RightParen)?;
                Ok(Expr::AggregateCall { function, selector })
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            other => Err(ExpressionError::syntax(format!("unexpected {other:?}"))),
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, ExpressionError> {
        let Token::Identifier(name) = self.current_token.clone() else {
            return Err(ExpressionError::syntax(format!(
                "expected a selector, found {:?}",
                self.current_token
            )));
        };
        self.advance()?;
        if name != "COLLECTION" {
            return Ok(Selector::Macro(name));
        }
        let Token::Bracketed(id) = self.current_token.clone() else {
            return Err(ExpressionError::syntax("expected COLLECTION[<id>]"));
        };
        self.advance()?;
        Ok(Selector::Collection(id))
    }
}

/// Parses a whole formula.
pub fn parse_formula(input: &str) -> Result<Expr, ExpressionError> {
    ExprParser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::ExpressionErrorKind;

    fn literal(n: i64) -> Expr {
        Expr::Literal(BigRational::from_integer(BigInt::from(n)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_formula("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(literal(1)),
                right: Box::new(Expr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    left: Box::new(literal(2)),
                    right: Box::new(literal(3)),
                }),
            }
        );
    }

    #[test]
    fn operators_are_left_associative() {
        let expr = parse_formula("8 - 4 - 2").unwrap();
        let Expr::BinaryOp { op, left, right } = expr else {
            panic!("expected a binary operation");
        };
        assert_eq!(op, BinaryOperator::Subtract);
        assert_eq!(*right, literal(2));
        assert!(matches!(*left, Expr::BinaryOp { op: BinaryOperator::Subtract, .. }));
    }

    #[test]
    fn parses_calls_and_selectors() {
        let expr = parse_formula(
            "-TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[ abc-123 ]) / (TOTAL_OPENED_CREDIT_AMOUNT(EXPENSE_ACCOUNTS) + 1.5)",
        )
        .unwrap();
        let selectors = expr.selectors();
        assert_eq!(
            selectors,
            vec![
                &Selector::Collection("abc-123".to_string()),
                &Selector::Macro("EXPENSE_ACCOUNTS".to_string()),
            ]
        );
        assert_eq!(
            AggregateFunction::from_name("TOTAL_UNADJUSTED_CREDIT_AMOUNT"),
            Some(AggregateFunction {
                stage: Stage::Unadjusted,
                side: Side::Credit,
            })
        );
    }

    #[test]
    fn malformed_formulas_are_syntax_errors() {
        for formula in [
            "",
            "1 +",
            "(1 + 2",
            "TOTAL_CLOSED_CREDIT_AMOUNT(#123)",
            "SUM(EXPENSE_ACCOUNTS)",
            "TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[abc)",
            "1.2.3",
            "2 3",
        ] {
            let err = parse_formula(formula).unwrap_err();
            assert_eq!(err.kind, ExpressionErrorKind::Syntax, "{formula}");
        }
    }
}
