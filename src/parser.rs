/// Parser adapter
///
/// Consumes the token stream and builds expression trees directly on the
/// interpreter heap: symbols become fresh atoms, `( E1 E2 )` becomes a
/// pair. Every intermediate node is rooted across the allocations that
/// follow it, so a collection triggered mid-parse cannot reclaim a
/// half-built tree.

use crate::errors::{InterpError, ParserError, Span};
use crate::interp::Interp;
use crate::lexer::{Lexer, Token};
use crate::object::ObjRef;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str, source_id: u32) -> Self {
        let mut lexer = Lexer::new(source, source_id);
        Parser {
            tokens: lexer.tokenize(),
            pos: 0,
        }
    }

    fn peek(&self) -> &(Token, Span) {
        // tokenize() always terminates the stream with an Eof token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> (Token, Span) {
        let entry = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        entry
    }

    /// Parse the next top-level expression, or `None` at end of input.
    pub fn parse_next(&mut self, interp: &mut Interp) -> Result<Option<ObjRef>, InterpError> {
        if matches!(self.peek().0, Token::Eof) {
            return Ok(None);
        }
        self.parse_expr(interp).map(Some)
    }

    fn parse_expr(&mut self, interp: &mut Interp) -> Result<ObjRef, InterpError> {
        let (token, span) = self.advance();
        match token {
            Token::Symbol(bytes) => Ok(interp.atom(&bytes)?),
            Token::LParen => {
                let first = self.parse_expr(interp)?;
                interp.heap.push_root(first);
                let result = self.parse_pair_tail(interp, first);
                interp.heap.pop_root();
                result
            }
            Token::RParen => Err(ParserError::UnexpectedToken {
                found: token.describe(),
                span,
            }
            .into()),
            Token::Eof => Err(ParserError::UnexpectedEof {
                context: "an expression",
                span,
            }
            .into()),
        }
    }

    /// `first` is rooted by the caller for the duration of this call.
    fn parse_pair_tail(&mut self, interp: &mut Interp, first: ObjRef) -> Result<ObjRef, InterpError> {
        let second = self.parse_expr(interp)?;
        let (token, span) = self.advance();
        match token {
            Token::RParen => Ok(interp.cons(first, second)?),
            Token::Eof => Err(ParserError::UnexpectedEof {
                context: "a pair",
                span,
            }
            .into()),
            _ => Err(ParserError::MissingCloseParen { span }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interp;
    use crate::object::ObjKind;

    fn parse_one(interp: &mut Interp, src: &str) -> ObjRef {
        let mut parser = Parser::new(src, 0);
        parser
            .parse_next(interp)
            .expect("parse should succeed")
            .expect("source should contain an expression")
    }

    #[test]
    fn test_symbol_becomes_atom() {
        let mut interp = Interp::new();
        let expr = parse_one(&mut interp, "hello");
        assert_eq!(interp.heap.atom_bytes(expr).unwrap(), b"hello");
    }

    #[test]
    fn test_pair_is_right_shaped() {
        let mut interp = Interp::new();
        let expr = parse_one(&mut interp, "(quote (a b))");
        let (head, tail) = interp.heap.cons_parts(expr).unwrap();
        assert_eq!(interp.heap.atom_bytes(head).unwrap(), b"quote");
        let (a, b) = interp.heap.cons_parts(tail).unwrap();
        assert_eq!(interp.heap.atom_bytes(a).unwrap(), b"a");
        assert_eq!(interp.heap.atom_bytes(b).unwrap(), b"b");
    }

    #[test]
    fn test_each_symbol_is_a_fresh_atom() {
        let mut interp = Interp::new();
        let expr = parse_one(&mut interp, "(x x)");
        let (head, tail) = interp.heap.cons_parts(expr).unwrap();
        assert_ne!(head, tail, "atoms are compared by contents, not interned");
        assert_eq!(
            interp.heap.atom_bytes(head).unwrap(),
            interp.heap.atom_bytes(tail).unwrap()
        );
    }

    #[test]
    fn test_multiple_top_level_expressions() {
        let mut interp = Interp::new();
        let mut parser = Parser::new("a b", 0);
        let first = parser.parse_next(&mut interp).unwrap().unwrap();
        interp.heap.push_root(first);
        let second = parser.parse_next(&mut interp).unwrap().unwrap();
        assert_eq!(interp.heap.kind(first), ObjKind::Atom);
        assert_eq!(interp.heap.kind(second), ObjKind::Atom);
        assert!(parser.parse_next(&mut interp).unwrap().is_none());
        interp.heap.pop_root();
    }

    #[test]
    fn test_stray_close_paren_is_rejected() {
        let mut interp = Interp::new();
        let mut parser = Parser::new(")", 0);
        let err = parser.parse_next(&mut interp).unwrap_err();
        assert!(matches!(
            err,
            InterpError::Parser(ParserError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_truncated_pair_is_rejected() {
        let mut interp = Interp::new();
        let mut parser = Parser::new("(a", 0);
        let err = parser.parse_next(&mut interp).unwrap_err();
        assert!(matches!(
            err,
            InterpError::Parser(ParserError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_overlong_pair_is_rejected() {
        let mut interp = Interp::new();
        let mut parser = Parser::new("(a b c)", 0);
        let err = parser.parse_next(&mut interp).unwrap_err();
        assert!(matches!(
            err,
            InterpError::Parser(ParserError::MissingCloseParen { .. })
        ));
    }
}
