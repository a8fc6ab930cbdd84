use std::error;
use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, Error>;

/// Where a specification line came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source name, `STDIN` for standard input.
    pub source: String,
    /// 1-based line number within the source.
    pub line_no: usize,
    /// The line text with trailing whitespace removed.
    pub text: String,
}

impl Location {
    pub fn new(source: impl Into<String>, line_no: usize, text: impl Into<String>) -> Self {
        Location {
            source: source.into(),
            line_no,
            text: text.into(),
        }
    }
}

/// A fatal diagnostic. Every error stops the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Problem with specification content, tied to a line.
    Positional { location: Location, message: String },
    /// Problem with configuration, environment, or the grammar as a whole.
    Global(String),
}

impl Error {
    pub fn at(location: &Location, message: impl Display) -> Self {
        Error::Positional {
            location: location.clone(),
            message: message.to_string(),
        }
    }

    pub fn global(message: impl Display) -> Self {
        Error::Global(message.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Positional { message, .. } => message,
            Error::Global(message) => message,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Positional {
                ref location,
                ref message,
            } => write!(
                f,
                "{:>4} [{}]: {}\nline: {}",
                location.line_no, location.source, message, location.text
            ),
            Error::Global(ref message) => write!(f, "{}", message),
        }
    }
}

impl error::Error for Error {}

/// Failures found while taking a single specification line apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    NoPattern,
    PuzzlingPattern,
    NoSymbol,
    IllegalLexical,
    NoLexicalKind,
    IllegalTerminalName(String),
    IllegalRule,
    IllegalRuleSyntax,
    IllegalLhs(String),
    MissingNonterminal,
    VoidNonterminal(String),
    IllegalNonterminal { nonterminal: String, lhs: String },
    IllegalClass { class: String, lhs: String },
    MalformedItem(String),
    SeparatorNotTerminal(String),
    IllDefinedClass(String),
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyntaxError::NoPattern => write!(f, "No legal pattern found!"),
            SyntaxError::PuzzlingPattern => write!(f, "Puzzling skip/token pattern specification"),
            SyntaxError::NoSymbol => write!(f, "No skip/token symbol"),
            SyntaxError::IllegalLexical => write!(f, "Illegal skip/token specification"),
            SyntaxError::NoLexicalKind => write!(f, "No skip/token specification found"),
            SyntaxError::IllegalTerminalName(name) => {
                write!(f, "{}: illegal skip/token name", name)
            }
            SyntaxError::IllegalRule => write!(f, "illegal grammar rule"),
            SyntaxError::IllegalRuleSyntax => write!(f, "illegal grammar rule syntax"),
            SyntaxError::IllegalLhs(lhs) => write!(f, "illegal LHS: {}", lhs),
            SyntaxError::MissingNonterminal => write!(f, "missing nonterminal"),
            SyntaxError::VoidNonterminal(lhs) => {
                write!(f, "cannot use \"void\" as a nonterminal in LHS {}", lhs)
            }
            SyntaxError::IllegalNonterminal { nonterminal, lhs } => write!(
                f,
                "illegal nonterminal format {} in LHS {}",
                nonterminal, lhs
            ),
            SyntaxError::IllegalClass { class, lhs } => {
                write!(f, "illegal class name {} in LHS {}", class, lhs)
            }
            SyntaxError::MalformedItem(item) => write!(f, "malformed RHS grammar item {}", item),
            SyntaxError::SeparatorNotTerminal(sep) => write!(
                f,
                "final separator {} in an arbno rule must be a Terminal",
                sep
            ),
            SyntaxError::IllDefinedClass(class) => write!(f, "{}: ill-defined class name", class),
        }
    }
}

impl error::Error for SyntaxError {}
