//! Error types and reporting
//!
//! This module defines the error types used throughout the compiler and provides
//! functionality for generating user-friendly error reports using the Ariadne library.

use ariadne::{Label, Report, ReportKind};
use thiserror::Error;

use crate::ast::Loc;
use crate::context::{Interner, Symbol};

/// Format a Symbol using the interner to get the actual name.
fn format_symbol(sym: Symbol, interner: &Interner) -> String {
    interner.try_resolve(sym).unwrap_or("<unknown>").to_string()
}

/// Format an optional struct tag. Anonymous aggregates have no tag.
fn format_tag(tag: Option<Symbol>, interner: &Interner) -> String {
    match tag {
        Some(tag) => format!("struct '{}'", format_symbol(tag, interner)),
        None => "anonymous struct".to_string(),
    }
}

/// A compilation error with location and optional context
#[derive(Debug, Error)]
#[error("{kind:?}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub loc: Loc,
    pub context: Option<String>,
    pub suggestions: Vec<ErrorSuggestion>,
}

/// Collection of compilation errors
#[derive(Debug)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: CompileError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result<T>(self, ok: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(ok)
        } else {
            Err(self)
        }
    }
}

impl Default for CompileErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CompileError> for CompileErrors {
    fn from(err: CompileError) -> Self {
        Self(vec![err])
    }
}

/// Suggestion for fixing a compilation error
#[derive(Debug, Clone)]
pub enum ErrorSuggestion {
    DidYouMean {
        wrong: String,
        suggestion: String,
        confidence: f32,
    },
}

impl ErrorSuggestion {
    pub fn format(&self) -> String {
        match self {
            Self::DidYouMean {
                wrong,
                suggestion,
                confidence,
            } => {
                if *confidence > 0.8 {
                    format!("Did you mean '{}'?", suggestion)
                } else {
                    format!("Did you mean '{}' (similar to '{}')?", suggestion, wrong)
                }
            }
        }
    }
}

/// The specific kind of compilation error
#[derive(Clone, Debug)]
pub enum CompileErrorKind {
    Parse(String),
    UnknownTag { tag: Symbol },
    UnknownMember { member: Symbol, tag: Option<Symbol> },
    IncompleteType { tag: Option<Symbol> },
    DuplicateMember { member: Symbol, tag: Option<Symbol> },
    Redefinition { tag: Option<Symbol> },
    UndefinedVariable { name: Symbol },
    UndefinedFunction { name: Symbol },
    NotAnAggregate,
    AlreadyDefined(Symbol),
    ArityMismatch { expected: usize, actual: usize },
    TypeMismatch,
    Runtime(String),
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: ErrorSuggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Get a human-readable error message with proper symbol resolution
    pub fn message(&self, interner: &Interner) -> String {
        use CompileErrorKind::*;

        // For errors with context, prefer the context as it contains pre-formatted details
        match &self.kind {
            Parse(msg) => format!("Parse error: {}", msg),
            UnknownTag { tag } => {
                format!("Unknown struct tag '{}'", format_symbol(*tag, interner))
            }
            UnknownMember { member, tag } => format!(
                "No member '{}' in {}",
                format_symbol(*member, interner),
                format_tag(*tag, interner)
            ),
            IncompleteType { tag } => {
                format!("Type {} is incomplete", format_tag(*tag, interner))
            }
            DuplicateMember { member, tag } => format!(
                "Duplicate member '{}' in {}",
                format_symbol(*member, interner),
                format_tag(*tag, interner)
            ),
            Redefinition { tag } => {
                format!("Redefinition of {}", format_tag(*tag, interner))
            }
            UndefinedVariable { name } => {
                format!("Undefined variable '{}'", format_symbol(*name, interner))
            }
            UndefinedFunction { name } => {
                format!("Undefined function '{}'", format_symbol(*name, interner))
            }
            NotAnAggregate => {
                if let Some(ctx) = &self.context {
                    ctx.clone()
                } else {
                    "Member access on a value that is not a struct".to_string()
                }
            }
            AlreadyDefined(name) => {
                format!("Name '{}' is already defined", format_symbol(*name, interner))
            }
            ArityMismatch { expected, actual } => {
                format!("Expected {} arguments, got {}", expected, actual)
            }
            TypeMismatch => {
                if let Some(ctx) = &self.context {
                    ctx.clone()
                } else {
                    "Type mismatch".to_string()
                }
            }
            Runtime(msg) => msg.clone(),
        }
    }

    /// Generate an Ariadne error report
    pub fn report(&self, interner: &Interner) -> Report<'_, Loc> {
        let mut report = Report::build(ReportKind::Error, self.loc.clone())
            .with_message(self.message(interner));

        let mut label = Label::new(self.loc.clone());

        if let Some(ctx) = &self.context {
            label = label.with_message(ctx);
        }

        report = report.with_label(label);

        for suggestion in &self.suggestions {
            report = report.with_note(suggestion.format());
        }

        match &self.kind {
            CompileErrorKind::UndefinedVariable { .. } => {
                if self.suggestions.is_empty() {
                    report = report.with_help(
                        "Variables must be declared before use. Check spelling and scope.",
                    );
                }
            }
            CompileErrorKind::UnknownTag { .. } => {
                report = report.with_help(
                    "Struct tags are visible from their declaration to the end of the enclosing scope.",
                );
            }
            CompileErrorKind::IncompleteType { .. } => {
                report = report
                    .with_help("Attach a member list to the struct before it is used here.");
            }
            CompileErrorKind::ArityMismatch { .. } => {
                report = report.with_help(
                    "Check the function definition to see the expected number of arguments.",
                );
            }
            _ => {}
        }

        report.finish()
    }
}
