use std::slice::Iter;
use thiserror::Error;
use tracing::debug;

use crate::ast::*;
use crate::token::Token;
use crate::variables::VariableProvider;

/// Builds the expression tree in a single left-to-right pass.
///
/// There is no precedence table: every binary operator takes the whole tree
/// built so far at its nesting level as its left operand, so only parentheses
/// change grouping. Identifiers are resolved through `variables` as they are
/// read. Returns `None` when the input holds no operand at all.
pub fn parse(
    tokens: Vec<Token>,
    variables: &dyn VariableProvider,
) -> Result<Option<Expression>, ParseError> {
    let mut parser = Parser::new(tokens.iter(), variables);
    parser.read();
    while parser.next()? {}
    parser.finish()
}

/// One level of parenthesis nesting.
#[derive(Debug, Default)]
struct Frame {
    root: Option<Expression>,
}

impl Frame {
    fn attach(&mut self, expression: Expression, token: &Token) -> Result<(), ParseError> {
        let Some(root) = self.root.as_mut() else {
            self.root = Some(expression);
            return Ok(());
        };
        match open_slot(root) {
            Some(slot) => {
                *slot = Some(expression.boxed());
                Ok(())
            }
            None => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    fn promote(&mut self, operator: Operator) {
        let left = self.root.take();
        self.root = Some(Expression::binary(operator, left));
    }
}

/// The right operand slot of the rightmost operator still waiting for one.
fn open_slot(expression: &mut Expression) -> Option<&mut Option<Box<Expression>>> {
    match expression {
        Expression::Leaf(_) => None,
        Expression::Operator(node) => {
            if node.right.is_none() {
                return Some(&mut node.right);
            }
            node.right.as_deref_mut().and_then(open_slot)
        }
    }
}

struct Parser<'p> {
    tokens: Iter<'p, Token>,
    current: Token,
    variables: &'p dyn VariableProvider,
    frames: Vec<Frame>,
}

impl<'p> Parser<'p> {
    fn new(tokens: Iter<'p, Token>, variables: &'p dyn VariableProvider) -> Self {
        Self {
            tokens,
            current: Token::EoF,
            variables,
            frames: vec![Frame::default()],
        }
    }

    fn next(&mut self) -> Result<bool, ParseError> {
        if self.current_is(Token::EoF) {
            return Ok(false);
        }
        match self.current.clone() {
            Token::Identifier(name) => {
                let value = self.variables.value(&name);
                self.attach(Expression::Leaf(value))?;
            }
            Token::Bool(b) => self.attach(Expression::Leaf(Value::Bool(b)))?,
            Token::String(s) => self.attach(Expression::Leaf(Value::Str(s)))?,
            Token::Bang => self.attach(Expression::not())?,
            t @ (Token::And | Token::Or | Token::Equals | Token::NotEquals) => {
                self.frame()?.promote(Operator::token(t));
            }
            Token::LeftParen => self.frames.push(Frame::default()),
            Token::RightParen => self.close_group()?,
            Token::UnterminatedString => return Err(ParseError::UnterminatedString),
            Token::Unexpected(c) => debug!(character = %c, "ignoring unexpected character"),
            Token::EoF | Token::Error => {}
        }
        self.read();
        Ok(true)
    }

    fn read(&mut self) {
        self.current = if let Some(token) = self.tokens.next() {
            token.clone()
        } else {
            Token::EoF
        };
    }

    fn current_is(&self, token: Token) -> bool {
        std::mem::discriminant(&self.current) == std::mem::discriminant(&token)
    }

    fn frame(&mut self) -> Result<&mut Frame, ParseError> {
        self.frames.last_mut().ok_or(ParseError::UnbalancedParen)
    }

    fn attach(&mut self, expression: Expression) -> Result<(), ParseError> {
        let token = self.current.clone();
        self.frame()?.attach(expression, &token)
    }

    fn close_group(&mut self) -> Result<(), ParseError> {
        if self.frames.len() < 2 {
            return Err(ParseError::UnbalancedParen);
        }
        let group = self.frames.pop().and_then(|frame| frame.root);
        match group {
            Some(expression) => self.attach(expression),
            None => Ok(()),
        }
    }

    /// Folds groups left open at end of input into their parents.
    fn finish(mut self) -> Result<Option<Expression>, ParseError> {
        while self.frames.len() > 1 {
            if let Some(expression) = self.frames.pop().and_then(|frame| frame.root) {
                self.frame()?.attach(expression, &Token::LeftParen)?;
            }
        }
        Ok(self.frames.pop().and_then(|frame| frame.root))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token {0:?}.")]
    UnexpectedToken(Token),
    #[error("Closing parenthesis without an open group.")]
    UnbalancedParen,
    #[error("String literal is not terminated.")]
    UnterminatedString,
}
