/// Diagnostic rendering
///
/// Parse errors carry byte spans, so they are routed through a miette
/// diagnostic that shows the offending source line with a caret. Runtime
/// errors have no spans (the offending expression may be the product of
/// arbitrary evaluation) and stay one-line.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::errors::ParserError;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(help("{help}"))]
pub struct ParseDiagnostic {
    pub message: String,
    pub help: String,
    #[source_code]
    pub src: NamedSource,
    #[label("here")]
    pub span: SourceSpan,
}

pub struct DiagnosticEngine {
    source_name: String,
    source_text: String,
}

impl DiagnosticEngine {
    pub fn new(source_name: impl Into<String>, source_text: impl Into<String>) -> Self {
        DiagnosticEngine {
            source_name: source_name.into(),
            source_text: source_text.into(),
        }
    }

    pub fn from_parser(&self, err: &ParserError) -> ParseDiagnostic {
        let help = match err {
            ParserError::UnexpectedToken { .. } => {
                "An expression is an atom or a pair: ATOM | '(' EXPR EXPR ')'.".to_string()
            }
            ParserError::MissingCloseParen { .. } => {
                "Pairs hold exactly two expressions; close this one with ')'.".to_string()
            }
            ParserError::UnexpectedEof { .. } => {
                "The input ended mid-expression; check for an unclosed '('.".to_string()
            }
        };
        let span = err.span();
        ParseDiagnostic {
            message: err.to_string(),
            help,
            src: NamedSource::new(self.source_name.clone(), self.source_text.clone()),
            span: (span.start, span.len().max(1)).into(),
        }
    }
}
