use std::fmt::{self, Display};

use crate::names::class_name_of;

/// Distinguishes user-written nonterminals from the ones repetition
/// desugaring invents.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Role {
    User,
    /// Re-entry point that loops back into the repeated body.
    Aux,
    /// Separator-guarded tail of a separated repetition.
    Sep,
}

/// A grammar nonterminal. Synthetic nonterminals compare unequal to every
/// user nonterminal, whatever their spelling.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct Nonterminal {
    name: String,
    role: Role,
}

impl Nonterminal {
    pub fn new(name: impl Into<String>) -> Self {
        Nonterminal {
            name: name.into(),
            role: Role::User,
        }
    }

    pub fn synthetic(base: &Nonterminal, role: Role) -> Self {
        Nonterminal {
            name: base.name.clone(),
            role,
        }
    }

    /// The user-visible name this nonterminal derives from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_synthetic(&self) -> bool {
        self.role != Role::User
    }

    pub fn class_name(&self) -> String {
        class_name_of(&self.name)
    }
}

impl Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.role {
            Role::User => write!(f, "{}", self.name),
            Role::Aux => write!(f, "{}_aux", self.name),
            Role::Sep => write!(f, "{}_sep", self.name),
        }
    }
}

impl From<&str> for Nonterminal {
    fn from(s: &str) -> Self {
        Nonterminal::new(s)
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(Nonterminal),
}

impl Symbol {
    pub fn as_nonterminal(&self) -> Option<&Nonterminal> {
        match self {
            Symbol::Nonterminal(nt) => Some(nt),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.as_nonterminal().map_or(false, Nonterminal::is_synthetic)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::Nonterminal(nt) => write!(f, "{}", nt),
        }
    }
}

/// A decoded right-hand-side item. A terminal without a field is matched and
/// discarded.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RuleItem {
    pub symbol: Symbol,
    pub field: Option<String>,
}

impl RuleItem {
    pub fn default_field(symbol: &Symbol) -> String {
        match symbol {
            Symbol::Terminal(t) => t.to_lowercase(),
            Symbol::Nonterminal(nt) => nt.to_string(),
        }
    }
}

impl Display for RuleItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.field {
            None => write!(f, "{}", self.symbol),
            Some(field) if *field == RuleItem::default_field(&self.symbol) => {
                write!(f, "<{}>", self.symbol)
            }
            Some(field) => write!(f, "<{}>{}", self.symbol, field),
        }
    }
}

/// A right-hand-side item as written, before it is checked against the
/// terminal set.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ItemSyntax {
    /// `NAME`
    Bare(String),
    /// `<name>` or `<name>field`
    Angle { name: String, field: Option<String> },
    /// A reference produced by desugaring.
    Synthetic(Nonterminal),
}

impl Display for ItemSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ItemSyntax::Bare(name) => write!(f, "{}", name),
            ItemSyntax::Angle { name, field } => {
                write!(f, "<{}>{}", name, field.as_deref().unwrap_or(""))
            }
            ItemSyntax::Synthetic(nt) => write!(f, "<{}>", nt),
        }
    }
}

/// The `:Cls` part of a rule's left-hand side.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ClassAnnot {
    Default,
    Void,
    Named(String),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum RuleOp {
    /// `::=`
    Plain,
    /// `**=`
    Repeat,
}

impl Display for RuleOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleOp::Plain => write!(f, "::="),
            RuleOp::Repeat => write!(f, "**="),
        }
    }
}

/// One grammar line, parsed but not yet validated against the rest of the
/// grammar.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RuleLine {
    pub nonterminal: Nonterminal,
    pub class: ClassAnnot,
    pub op: RuleOp,
    pub items: Vec<ItemSyntax>,
    pub separator: Option<String>,
}

impl RuleLine {
    pub fn plain(nonterminal: Nonterminal, class: ClassAnnot, items: Vec<ItemSyntax>) -> Self {
        RuleLine {
            nonterminal,
            class,
            op: RuleOp::Plain,
            items,
            separator: None,
        }
    }

    pub fn lhs(&self) -> String {
        match &self.class {
            ClassAnnot::Default => format!("<{}>", self.nonterminal),
            ClassAnnot::Void => format!("<{}>:void", self.nonterminal),
            ClassAnnot::Named(cls) => format!("<{}>:{}", self.nonterminal, cls),
        }
    }
}

impl Display for RuleLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.lhs(), self.op)?;
        for item in &self.items {
            write!(f, " {}", item)?;
        }
        if let Some(sep) = &self.separator {
            write!(f, " +{}", sep)?;
        }
        Ok(())
    }
}
