//! Run configuration. Flags come from the command line and from `!` lines in
//! the lexical section, both written as `key`, `key=` or `key=value`.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::PathBuf;

use nom::{
    bytes::complete::take_while,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    sequence::pair,
    IResult,
};

pub const DEBUG: &str = "debug";
pub const DESTDIR: &str = "destdir";
pub const PATTERN: &str = "pattern";
pub const LL1: &str = "LL1";
pub const PARSER: &str = "parser";
pub const SEMANTICS: &str = "semantics";
pub const NOWRITE: &str = "nowrite";
pub const TOKEN: &str = "Token";
pub const RUNTIME: &str = "runtime";

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Value {
    Bool(bool),
    /// Only `debug` holds an integer.
    Int(u32),
    Text(String),
}

impl Value {
    pub fn is_true(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Text(s) => !s.is_empty(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    Malformed(String),
    ImproperDebug,
    /// A flag whose value has the wrong shape for how it is used.
    Illegal(&'static str),
}

impl Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FlagError::Malformed(ref spec) => {
                write!(f, "malformed flag specification: {}", spec)
            }
            FlagError::ImproperDebug => write!(f, "improper debug flag value"),
            FlagError::Illegal(key) => write!(f, "illegal {} flag value", key),
        }
    }
}

impl std::error::Error for FlagError {}

fn key(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

#[derive(Debug, Clone)]
pub struct Flags {
    values: BTreeMap<String, Value>,
}

impl Default for Flags {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(DEBUG.to_owned(), Value::Int(0));
        values.insert(DESTDIR.to_owned(), Value::Text("Rust".to_owned()));
        values.insert(PATTERN.to_owned(), Value::Bool(true));
        values.insert(LL1.to_owned(), Value::Bool(true));
        values.insert(PARSER.to_owned(), Value::Bool(true));
        values.insert(SEMANTICS.to_owned(), Value::Bool(true));
        values.insert(NOWRITE.to_owned(), Value::Bool(false));
        values.insert(TOKEN.to_owned(), Value::Bool(true));
        values.insert(RUNTIME.to_owned(), Value::Text("crate::runtime".to_owned()));
        Flags { values }
    }
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one `key[=value]` specification.
    pub fn apply(&mut self, spec: &str) -> Result<(), FlagError> {
        let (name, value) = match spec.find('=') {
            Some(idx) => {
                let value = spec[idx + 1..].trim_start();
                if value.is_empty() {
                    (&spec[..idx], Value::Bool(false))
                } else {
                    (&spec[..idx], Value::Text(value.to_owned()))
                }
            }
            None => (spec, Value::Bool(true)),
        };
        let name = name.trim();
        if all_consuming(key)(name).is_err() {
            return Err(FlagError::Malformed(spec.to_owned()));
        }
        let value = if name == DEBUG {
            Value::Int(debug_level(value)?)
        } else {
            value
        };
        self.values.insert(name.to_owned(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Unset flags are false.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).map_or(false, Value::is_true)
    }

    pub fn debug(&self) -> u32 {
        match self.get(DEBUG) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    fn text(&self, key: &'static str) -> Result<&str, FlagError> {
        match self.get(key) {
            Some(Value::Text(s)) => Ok(s),
            _ => Err(FlagError::Illegal(key)),
        }
    }

    pub fn destdir(&self) -> Result<PathBuf, FlagError> {
        self.text(DESTDIR).map(PathBuf::from)
    }

    pub fn runtime(&self) -> Result<&str, FlagError> {
        self.text(RUNTIME)
    }
}

fn debug_level(value: Value) -> Result<u32, FlagError> {
    match value {
        Value::Bool(b) => Ok(b as u32),
        Value::Int(n) => Ok(n),
        Value::Text(s) => {
            let n: i64 = s.trim().parse().map_err(|_| FlagError::ImproperDebug)?;
            Ok(n.max(0).min(u32::MAX as i64) as u32)
        }
    }
}
