/// Revl error types
/// Supports lexer/parser and runtime errors with Miette integration.
/// Every error is fatal: the interpreter never recovers, it reports one
/// diagnostic and the process exits non-zero.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub source_id: u32,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(source_id: u32, start: usize, end: usize) -> Self {
        Span { source_id, start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            source_id: self.source_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl Default for Span {
    fn default() -> Self {
        Span { source_id: 0, start: 0, end: 0 }
    }
}

// ---------------------------------------------------------------------------
// Parser errors
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub enum ParserError {
    UnexpectedToken {
        found: String,
        span: Span,
    },
    MissingCloseParen {
        span: Span,
    },
    UnexpectedEof {
        context: &'static str,
        span: Span,
    },
}

impl ParserError {
    pub fn span(&self) -> Span {
        match self {
            ParserError::UnexpectedToken { span, .. } => *span,
            ParserError::MissingCloseParen { span } => *span,
            ParserError::UnexpectedEof { span, .. } => *span,
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::UnexpectedToken { found, .. } => {
                write!(f, "[RVL_101] Unexpected token: {}", found)
            }
            ParserError::MissingCloseParen { .. } => {
                write!(f, "[RVL_102] Expected ')' to close this pair")
            }
            ParserError::UnexpectedEof { context, .. } => {
                write!(f, "[RVL_103] Unexpected end of input in {}", context)
            }
        }
    }
}

impl std::error::Error for ParserError {}

// ---------------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub enum RuntimeError {
    /// RVL_201: atom lookup found no binding in the environment
    UnboundAtom { name: String },
    /// RVL_202: a pair was required where some other object appeared
    ConsExpected { found: &'static str },
    /// RVL_203: attempt to apply a non-function value
    NotAFunction { found: &'static str },
    /// RVL_204: atom comparison on non-atom operands
    AtomsExpected { found: &'static str },
    /// RVL_205: pop from an empty operand or continuation stack
    StackUnderflow { stack: &'static str },
    /// RVL_206: print_atom applied to a non-atom
    PrintAtomExpected { found: &'static str },
    /// RVL_207: fun clause whose parameter position is not an atom
    FunParamNotAtom { found: &'static str },
    /// RVL_208: expression that is neither an atom nor a pair
    CannotEvaluate { found: &'static str },
    /// RVL_401: the live-object limit still holds after a collection
    ObjectLimit { limit: usize },
    /// RVL_402: write to the output sink failed
    Io { message: String },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnboundAtom { name } => {
                write!(f, "[RVL_201] Unbound atom: '{}'", name)
            }
            RuntimeError::ConsExpected { found } => {
                write!(f, "[RVL_202] cons expected, found {}", found)
            }
            RuntimeError::NotAFunction { found } => {
                write!(f, "[RVL_203] apply: not a function, found {}", found)
            }
            RuntimeError::AtomsExpected { found } => {
                write!(f, "[RVL_204] atom_equals: atoms expected, found {}", found)
            }
            RuntimeError::StackUnderflow { stack } => {
                write!(f, "[RVL_205] pop: {} stack underflow", stack)
            }
            RuntimeError::PrintAtomExpected { found } => {
                write!(f, "[RVL_206] print_atom: argument is not an atom, found {}", found)
            }
            RuntimeError::FunParamNotAtom { found } => {
                write!(f, "[RVL_207] fun: param should be an atom, found {}", found)
            }
            RuntimeError::CannotEvaluate { found } => {
                write!(f, "[RVL_208] cannot evaluate: not an atom or a cons, found {}", found)
            }
            RuntimeError::ObjectLimit { limit } => {
                write!(f, "[RVL_401] object limit exceeded: {} live objects after collection", limit)
            }
            RuntimeError::Io { message } => {
                write!(f, "[RVL_402] I/O error: {}", message)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io { message: err.to_string() }
    }
}

// ---------------------------------------------------------------------------
// InterpError — top-level wrapper
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub enum InterpError {
    Parser(ParserError),
    Runtime(RuntimeError),
}

impl fmt::Display for InterpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpError::Parser(e) => write!(f, "Parse error: {}", e),
            InterpError::Runtime(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for InterpError {}

impl From<ParserError> for InterpError {
    fn from(e: ParserError) -> Self {
        InterpError::Parser(e)
    }
}

impl From<RuntimeError> for InterpError {
    fn from(e: RuntimeError) -> Self {
        InterpError::Runtime(e)
    }
}
