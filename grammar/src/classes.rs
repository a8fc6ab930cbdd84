use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display};

use crate::symbol::{Nonterminal, RuleItem, Symbol};

/// A concrete class and the rule that declared it.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ClassRecord {
    pub nonterminal: Nonterminal,
    /// Left-hand side as written, e.g. `<exp>:AddExp`.
    pub lhs: String,
    /// Right-hand side items, synthetic references excluded.
    pub items: Vec<RuleItem>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum FieldType {
    Token,
    Class(String),
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Repetition classes collect every occurrence.
    pub repeated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassError {
    AlreadyDefined(String),
    ConcreteIsAbstract(String),
    AbstractIsConcrete(String),
}

impl Display for ClassError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassError::AlreadyDefined(cls) => write!(f, "class {} is already defined", cls),
            ClassError::ConcreteIsAbstract(cls) => write!(
                f,
                "non-abstract class {} is already defined as an abstract class",
                cls
            ),
            ClassError::AbstractIsConcrete(cls) => write!(
                f,
                "abstract base class {} already exists as a non-abstract class",
                cls
            ),
        }
    }
}

impl std::error::Error for ClassError {}

/// Base/derived relations, per-class fields and repetition markers, built up
/// while rules are compiled.
#[derive(Debug, Default)]
pub struct ClassModel {
    records: BTreeMap<String, ClassRecord>,
    /// Abstract base to its derived classes, in registration order.
    derives: BTreeMap<String, Vec<String>>,
    extends: HashMap<String, String>,
    /// Repetition classes and their separator terminal.
    arbno: HashMap<String, Option<String>>,
}

impl ClassModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class that is its nonterminal's default class.
    pub fn register(&mut self, class: &str, record: ClassRecord) -> Result<(), ClassError> {
        if self.derives.contains_key(class) {
            return Err(ClassError::ConcreteIsAbstract(class.to_owned()));
        }
        if self.records.contains_key(class) {
            return Err(ClassError::AlreadyDefined(class.to_owned()));
        }
        self.records.insert(class.to_owned(), record);
        Ok(())
    }

    /// Registers `class` as a concrete class derived from the abstract `base`.
    pub fn register_derived(
        &mut self,
        base: &str,
        class: &str,
        record: ClassRecord,
    ) -> Result<(), ClassError> {
        if self.derives.contains_key(class) {
            return Err(ClassError::ConcreteIsAbstract(class.to_owned()));
        }
        if self.records.contains_key(base) {
            return Err(ClassError::AbstractIsConcrete(base.to_owned()));
        }
        self.register(class, record)?;
        self.extends.insert(class.to_owned(), base.to_owned());
        self.derives
            .entry(base.to_owned())
            .or_insert_with(Vec::new)
            .push(class.to_owned());
        Ok(())
    }

    pub fn mark_repetition(&mut self, class: &str, separator: Option<String>) {
        self.arbno.insert(class.to_owned(), separator);
    }

    pub fn record(&self, class: &str) -> Option<&ClassRecord> {
        self.records.get(class)
    }

    pub fn is_abstract(&self, class: &str) -> bool {
        self.derives.contains_key(class)
    }

    pub fn is_concrete(&self, class: &str) -> bool {
        self.records.contains_key(class)
    }

    /// `Some(separator)` for repetition classes.
    pub fn repetition(&self, class: &str) -> Option<Option<&str>> {
        self.arbno.get(class).map(|sep| sep.as_deref())
    }

    pub fn base_of(&self, class: &str) -> Option<&str> {
        self.extends.get(class).map(String::as_str)
    }

    pub fn derived(&self, base: &str) -> &[String] {
        self.derives.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Abstract base classes, sorted.
    pub fn abstract_classes(&self) -> impl Iterator<Item = &str> {
        self.derives.keys().map(String::as_str)
    }

    /// Concrete classes, sorted.
    pub fn concrete_classes(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Typed fields of a concrete class in declaration order.
    pub fn fields(&self, class: &str) -> Vec<Field> {
        let repeated = self.arbno.contains_key(class);
        let record = match self.records.get(class) {
            Some(record) => record,
            None => return Vec::new(),
        };
        record
            .items
            .iter()
            .filter_map(|item| {
                let field = item.field.as_ref()?;
                let ty = match &item.symbol {
                    Symbol::Terminal(_) => FieldType::Token,
                    Symbol::Nonterminal(nt) => FieldType::Class(nt.class_name()),
                };
                Some(Field {
                    name: if repeated {
                        format!("{}List", field)
                    } else {
                        field.clone()
                    },
                    ty,
                    repeated,
                })
            })
            .collect()
    }
}
