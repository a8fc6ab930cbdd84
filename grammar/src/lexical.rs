use std::collections::HashSet;
use std::fmt::{self, Display};

use crate::error::{Error, Location, Result};
use crate::parser::LexicalDecl;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TerminalKind {
    /// Recognized and dropped by the scanner.
    Skip,
    /// Handed to the parser.
    Token,
}

impl Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TerminalKind::Skip => write!(f, "skip"),
            TerminalKind::Token => write!(f, "token"),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TerminalSpec {
    pub kind: TerminalKind,
    pub name: String,
    /// The raw pattern text; `None` when patterns are turned off.
    pub pattern: Option<String>,
}

/// Skip and token declarations in declaration order.
#[derive(Debug, Default)]
pub struct LexicalRegistry {
    specs: Vec<TerminalSpec>,
    names: HashSet<String>,
}

impl LexicalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a declaration. Names are unique across skips and tokens.
    pub fn declare(&mut self, decl: LexicalDecl, location: &Location) -> Result<()> {
        if !self.names.insert(decl.name.clone()) {
            return Err(Error::at(
                location,
                format!("Duplicate skip/token name: {}", decl.name),
            ));
        }
        self.specs.push(TerminalSpec {
            kind: decl.kind,
            name: decl.name,
            pattern: decl.pattern,
        });
        Ok(())
    }

    /// Closes the lexical section. A specification needs at least one token.
    pub fn finish(&self) -> Result<()> {
        if self.tokens().next().is_none() {
            return Err(Error::global("No tokens specified -- quitting"));
        }
        Ok(())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TerminalSpec> {
        self.specs.iter().filter(|s| s.kind == TerminalKind::Token)
    }

    pub fn skips(&self) -> impl Iterator<Item = &TerminalSpec> {
        self.specs.iter().filter(|s| s.kind == TerminalKind::Skip)
    }

    pub fn token_names(&self) -> HashSet<String> {
        self.tokens().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{lexical_line, LexicalLine};

    fn declare_all(lines: &[&str]) -> Result<LexicalRegistry> {
        let mut registry = LexicalRegistry::new();
        for (idx, line) in lines.iter().enumerate() {
            let location = Location::new("test", idx + 1, *line);
            match lexical_line(line, true).map_err(|e| Error::at(&location, e))? {
                LexicalLine::Decl(decl) => registry.declare(decl, &location)?,
                LexicalLine::Blank | LexicalLine::Flag(_) => {}
            }
        }
        registry.finish()?;
        Ok(registry)
    }

    #[test]
    fn keeps_declaration_order() {
        let registry = declare_all(&[
            "skip WHITESPACE '\\s+'",
            "token NUM '[0-9]+'",
            "PLUS '\\+'",
            "skip COMMENT '%.*'",
        ])
        .unwrap();
        let names: Vec<_> = registry.specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["WHITESPACE", "NUM", "PLUS", "COMMENT"]);
        let tokens: Vec<_> = registry.tokens().map(|s| s.name.as_str()).collect();
        assert_eq!(tokens, vec!["NUM", "PLUS"]);
        let skips: Vec<_> = registry.skips().map(|s| s.name.as_str()).collect();
        assert_eq!(skips, vec!["WHITESPACE", "COMMENT"]);
        assert!(registry.token_names().contains("NUM"));
        assert!(!registry.token_names().contains("WHITESPACE"));
        assert_eq!(registry.specs[0].pattern.as_deref(), Some("\\s+"));
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let err = declare_all(&["skip FOO 'a'", "token FOO 'b'"]).unwrap_err();
        match err {
            Error::Positional { location, message } => {
                assert_eq!(location.line_no, 2);
                assert_eq!(message, "Duplicate skip/token name: FOO");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn needs_at_least_one_token() {
        let err = declare_all(&["skip WHITESPACE '\\s+'"]).unwrap_err();
        assert_eq!(err, Error::global("No tokens specified -- quitting"));
    }

    #[test]
    fn missing_pattern_is_fatal() {
        let err = declare_all(&["token FOO"]).unwrap_err();
        assert_eq!(err.message(), "No legal pattern found!");
    }
}
