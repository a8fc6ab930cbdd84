//! Front half of the parser generator: reading specification lines, the
//! token registry, rule compilation and LL(1) analysis.

pub mod classes;
pub mod error;
pub mod lexical;
pub mod ll1;
pub mod names;
pub mod parser;
pub mod rules;
pub mod symbol;

pub use classes::{ClassModel, ClassRecord, Field, FieldType};
pub use error::{Error, Location, Result, SyntaxError};
pub use lexical::{LexicalRegistry, TerminalKind, TerminalSpec};
pub use ll1::{analyze, Analysis, FirstSet, TerminalSet};
pub use rules::{Grammar, GrammarBuilder, Rule};
pub use symbol::{Nonterminal, Role, RuleItem, Symbol};
