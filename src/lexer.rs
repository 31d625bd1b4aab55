/// Lexer for revl source
///
/// Three token shapes: `(`, `)`, and symbols. A symbol is any maximal run
/// of non-whitespace, non-paren bytes; the raw bytes are carried through to
/// the atom that will own them. Tokens are whitespace separated and every
/// token carries a byte span for diagnostics.

use crate::errors::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Symbol(Vec<u8>),
    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Symbol(bytes) => format!("'{}'", String::from_utf8_lossy(bytes)),
            Token::Eof => "end of input".to_string(),
        }
    }
}

pub struct Lexer {
    input: Vec<u8>,
    pos: usize,
    source_id: u32,
}

impl Lexer {
    pub fn new(input: &str, source_id: u32) -> Self {
        Lexer {
            input: input.as_bytes().to_vec(),
            pos: 0,
            source_id,
        }
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.current();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.current() {
            if byte.is_ascii_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_symbol(&mut self) -> Vec<u8> {
        let start = self.pos;
        while let Some(byte) = self.current() {
            if byte.is_ascii_whitespace() || byte == b'(' || byte == b')' {
                break;
            }
            self.advance();
        }
        self.input[start..self.pos].to_vec()
    }

    pub fn next_token(&mut self) -> (Token, Span) {
        self.skip_whitespace();

        let start = self.pos;

        let token = match self.current() {
            None => Token::Eof,
            Some(b'(') => {
                self.advance();
                Token::LParen
            }
            Some(b')') => {
                self.advance();
                Token::RParen
            }
            Some(_) => Token::Symbol(self.read_symbol()),
        };

        let span = Span::new(self.source_id, start, self.pos);
        (token, span)
    }

    pub fn tokenize(&mut self) -> Vec<(Token, Span)> {
        let mut tokens = Vec::new();
        loop {
            let (token, span) = self.next_token();
            if token == Token::Eof {
                tokens.push((token, span));
                break;
            }
            tokens.push((token, span));
        }
        tokens
    }
}
