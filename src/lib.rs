/// Revl Language Library
///
/// Module layout:
///   - errors      — error taxonomy ([RVL_xxx] codes, all fatal)
///   - diagnostics — miette-backed source-context reports
///   - lexer       — byte-level tokenizer: '(', ')', symbols
///   - parser      — token stream → rooted expression trees
///   - object      — heap node model + Schorr-Waite class protocol
///   - heap        — object pool, live list, soft limit, root stack
///   - gc          — pointer-reversal mark phase + linear sweep
///   - interp      — interpreter context, operand/continuation stacks
///   - eval        — continuation-loop evaluator and apply routines
///   - printer     — S-expression renderer

pub mod errors;
pub mod diagnostics;

pub mod lexer;
pub mod parser;

pub mod object;
pub mod heap;
pub mod gc;

pub mod interp;
pub mod eval;
pub mod printer;

// ── Re-exports for convenience ───────────────────────────────────────────────
pub use errors::{InterpError, ParserError, RuntimeError, Span};
pub use gc::GcStats;
pub use heap::{Heap, RootId, DEFAULT_OBJECT_LIMIT};
pub use interp::{Interp, InterpConfig};
pub use lexer::{Lexer, Token};
pub use object::{ObjKind, ObjRef};
pub use parser::Parser;
