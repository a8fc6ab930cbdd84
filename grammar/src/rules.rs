//! Grammar rule compilation.
//!
//! A repetition rule `<x> **= items [+SEP]` is rewritten into plain rules and
//! each of them is fed back through [`GrammarBuilder::compile`], so desugared
//! rules are validated exactly like hand-written ones:
//!
//! ```text
//! <x>          ::= items <x_aux>        <x>          ::= items <x_sep>
//! <x>:void     ::=                      <x>:void     ::=
//! <x_aux>:void ::= <x>                  <x_aux>:void ::= items <x_sep>
//!                                       <x_sep>:void ::= SEP <x_aux>
//!                                       <x_sep>:void ::=
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt::{self, Display};

use crate::classes::{ClassModel, ClassRecord};
use crate::error::{Error, Location, Result};
use crate::lexical::LexicalRegistry;
use crate::names;
use crate::parser;
use crate::symbol::{ClassAnnot, ItemSyntax, Nonterminal, Role, RuleItem, RuleLine, RuleOp, Symbol};

/// A primitive rule. `class` is `None` for void rules.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Rule {
    pub nonterminal: Nonterminal,
    pub class: Option<String>,
    pub items: Vec<RuleItem>,
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}> ::=", self.nonterminal)?;
        for item in &self.items {
            write!(f, " {}", item)?;
        }
        Ok(())
    }
}

/// The compiled grammar: read-only input to analysis and synthesis.
#[derive(Debug)]
pub struct Grammar {
    pub rules: Vec<Rule>,
    /// Left-hand-side nonterminals in order of first appearance.
    pub nonterminals: Vec<Nonterminal>,
    pub start: Nonterminal,
    pub classes: ClassModel,
    pub terminals: BTreeSet<String>,
}

impl Grammar {
    /// Class of the start symbol.
    pub fn start_class(&self) -> String {
        self.start.class_name()
    }
}

/// Accumulates rules one grammar line at a time.
#[derive(Debug)]
pub struct GrammarBuilder {
    tokens: HashSet<String>,
    rules: Vec<Rule>,
    nonterminals: Vec<Nonterminal>,
    seen: HashSet<Nonterminal>,
    start: Option<Nonterminal>,
    classes: ClassModel,
}

impl GrammarBuilder {
    pub fn new(registry: &LexicalRegistry) -> Self {
        GrammarBuilder {
            tokens: registry.token_names(),
            rules: Vec::new(),
            nonterminals: Vec::new(),
            seen: HashSet::new(),
            start: None,
            classes: ClassModel::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parses and compiles one grammar line. The caller has already removed
    /// comments and skipped blank lines.
    pub fn compile_line(&mut self, text: &str, location: &Location) -> Result<()> {
        if text.contains('_') {
            return Err(Error::at(
                location,
                "underscore \"_\" not permitted in grammar rule line",
            ));
        }
        let line = parser::rule_line(text).map_err(|e| Error::at(location, e))?;
        self.compile(line, location)
    }

    /// Compiles one rule, expanding repetition rules in place.
    pub fn compile(&mut self, line: RuleLine, location: &Location) -> Result<()> {
        let base = line.nonterminal.class_name();
        if names::is_reserved_class(&base) {
            return Err(Error::at(location, format!("{}: reserved class name", base)));
        }
        if let ClassAnnot::Named(cls) = &line.class {
            if names::is_reserved_class(cls) {
                return Err(Error::at(location, format!("{}: reserved class name", cls)));
            }
            if *cls == base {
                return Err(Error::at(
                    location,
                    "base class and derived class names cannot be the same!",
                ));
            }
        }
        match line.op {
            RuleOp::Repeat => self.desugar(line, &base, location),
            RuleOp::Plain => self.compile_plain(line, &base, location),
        }
    }

    fn desugar(&mut self, line: RuleLine, base: &str, location: &Location) -> Result<()> {
        if line.class != ClassAnnot::Default {
            return Err(Error::at(
                location,
                "arbno rule cannot specify a non base class name",
            ));
        }
        if self.start.is_none() {
            return Err(Error::at(
                location,
                "arbno rule cannot be the first grammar rule",
            ));
        }
        if line.items.is_empty() {
            return Err(Error::at(location, "arbno rules cannot be empty"));
        }
        if let Some(sep) = &line.separator {
            if !self.tokens.contains(sep) {
                return Err(Error::at(
                    location,
                    format!("unknown separator token {} in arbno rule", sep),
                ));
            }
        }
        self.classes.mark_repetition(base, line.separator.clone());

        let RuleLine {
            nonterminal: nt,
            items: body,
            separator,
            ..
        } = line;
        let aux = Nonterminal::synthetic(&nt, Role::Aux);
        let with = |tail: &Nonterminal| {
            let mut items = body.clone();
            items.push(ItemSyntax::Synthetic(tail.clone()));
            items
        };
        let expanded = match separator {
            Some(sep) => {
                let tail = Nonterminal::synthetic(&nt, Role::Sep);
                vec![
                    RuleLine::plain(nt.clone(), ClassAnnot::Default, with(&tail)),
                    RuleLine::plain(nt.clone(), ClassAnnot::Void, vec![]),
                    RuleLine::plain(aux.clone(), ClassAnnot::Void, with(&tail)),
                    RuleLine::plain(
                        tail.clone(),
                        ClassAnnot::Void,
                        vec![ItemSyntax::Bare(sep), ItemSyntax::Synthetic(aux)],
                    ),
                    RuleLine::plain(tail, ClassAnnot::Void, vec![]),
                ]
            }
            None => vec![
                RuleLine::plain(nt.clone(), ClassAnnot::Default, with(&aux)),
                RuleLine::plain(nt.clone(), ClassAnnot::Void, vec![]),
                RuleLine::plain(
                    aux,
                    ClassAnnot::Void,
                    vec![ItemSyntax::Synthetic(nt.clone())],
                ),
            ],
        };
        for rule in expanded {
            self.compile(rule, location)?;
        }
        Ok(())
    }

    fn compile_plain(&mut self, line: RuleLine, base: &str, location: &Location) -> Result<()> {
        let items = self.decode_items(&line.items, location)?;
        let lhs = line.lhs();
        let nt = line.nonterminal;
        if self.seen.insert(nt.clone()) {
            self.nonterminals.push(nt.clone());
        }

        let class = match line.class {
            ClassAnnot::Void => None,
            ClassAnnot::Default => {
                self.start.get_or_insert_with(|| nt.clone());
                let record = ClassRecord {
                    nonterminal: nt.clone(),
                    lhs,
                    items: user_items(&items),
                };
                self.classes
                    .register(base, record)
                    .map_err(|e| Error::at(location, e))?;
                Some(base.to_owned())
            }
            ClassAnnot::Named(cls) => {
                self.start.get_or_insert_with(|| nt.clone());
                let record = ClassRecord {
                    nonterminal: nt.clone(),
                    lhs,
                    items: user_items(&items),
                };
                self.classes
                    .register_derived(base, &cls, record)
                    .map_err(|e| Error::at(location, e))?;
                Some(cls)
            }
        };
        self.rules.push(Rule {
            nonterminal: nt,
            class,
            items,
        });
        Ok(())
    }

    /// Turns written items into terminal/nonterminal references with their
    /// field bindings.
    fn decode_items(&self, items: &[ItemSyntax], location: &Location) -> Result<Vec<RuleItem>> {
        let rhs = items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let mut fields = HashSet::new();
        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            let decoded_item = self.decode_item(item, location)?;
            if let Some(field) = &decoded_item.field {
                if !fields.insert(field.clone()) {
                    return Err(Error::at(
                        location,
                        format!("duplicate field name {} in rule RHS {}", field, rhs),
                    ));
                }
            }
            decoded.push(decoded_item);
        }
        Ok(decoded)
    }

    fn decode_item(&self, item: &ItemSyntax, location: &Location) -> Result<RuleItem> {
        let malformed = || Error::at(location, format!("malformed RHS grammar item {}", item));
        let (name, field) = match item {
            ItemSyntax::Synthetic(nt) => {
                return Ok(RuleItem {
                    symbol: Symbol::Nonterminal(nt.clone()),
                    field: Some(nt.to_string()),
                })
            }
            ItemSyntax::Bare(name) => (name, None),
            ItemSyntax::Angle { name, field } => (name, Some(field.as_deref())),
        };

        let symbol = if names::is_terminal(name) {
            if !self.tokens.contains(name.as_str()) {
                return Err(Error::at(
                    location,
                    format!("unknown token name in RHS grammar item {}", item),
                ));
            }
            Symbol::Terminal(name.clone())
        } else if names::is_nonterminal(name) {
            Symbol::Nonterminal(Nonterminal::new(name.as_str()))
        } else {
            return Err(malformed());
        };

        let field = match field {
            None => {
                if let Symbol::Nonterminal(_) = symbol {
                    return Err(Error::at(
                        location,
                        format!("cannot have a bare nonterm in RHS grammar item {}", item),
                    ));
                }
                None
            }
            Some(None) => Some(RuleItem::default_field(&symbol)),
            Some(Some(field)) => {
                if !names::is_field(field) {
                    return Err(Error::at(
                        location,
                        format!(
                            "field {} is an invalid identifier in RHS grammar item {}",
                            field, item
                        ),
                    ));
                }
                Some(field.to_owned())
            }
        };
        Ok(RuleItem { symbol, field })
    }

    /// Closes the grammar section. Every nonterminal used on a right-hand side
    /// must have a rule of its own.
    pub fn finish(self) -> Result<Grammar> {
        for rule in &self.rules {
            for item in &rule.items {
                if let Symbol::Nonterminal(nt) = &item.symbol {
                    if !self.seen.contains(nt) {
                        return Err(Error::global(format!(
                            "nonterm {} appears on the RHS of rule \"{}\" but not on any LHS",
                            nt, rule
                        )));
                    }
                }
            }
        }
        let start = self
            .start
            .ok_or_else(|| Error::global("no start symbol!"))?;
        Ok(Grammar {
            rules: self.rules,
            nonterminals: self.nonterminals,
            start,
            classes: self.classes,
            terminals: self.tokens.into_iter().collect(),
        })
    }
}

fn user_items(items: &[RuleItem]) -> Vec<RuleItem> {
    items
        .iter()
        .filter(|item| !item.symbol.is_synthetic())
        .cloned()
        .collect()
}
