use std::fmt::{self, Display};

use crate::error::{Result, StubError};

/// Name of an insertion point: `Class` or `Class:modifier`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct SlotName {
    pub class: String,
    pub modifier: Option<String>,
}

impl SlotName {
    pub fn new(class: &str, modifier: Option<&str>) -> Self {
        SlotName {
            class: class.to_owned(),
            modifier: modifier.map(str::to_owned),
        }
    }
}

impl Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.modifier {
            Some(modifier) => write!(f, "{}:{}", self.class, modifier),
            None => write!(f, "{}", self.class),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    /// Holds spliced code once a semantic entry targets it.
    Slot { name: SlotName, code: Option<String> },
}

/// A source unit for one class: generated text interleaved with named slots.
/// Slots stay in place until rendering, so splicing never searches text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    class: String,
    nodes: Vec<Node>,
}

impl Stub {
    pub fn new(class: &str) -> Stub {
        Stub {
            class: class.to_owned(),
            nodes: Vec::new(),
        }
    }

    /// A stub made entirely of user code, for a class with no grammar rule.
    pub fn user(class: &str, code: String) -> Stub {
        let mut stub = Stub::new(class);
        stub.nodes.push(Node::Slot {
            name: SlotName::new(class, None),
            code: Some(code),
        });
        stub
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.nodes.push(Node::Text(text.into()));
    }

    /// Reserves the next position for the slot `Class[:modifier]`.
    pub fn reserve_slot(&mut self, modifier: Option<&str>) {
        let name = SlotName::new(&self.class, modifier);
        debug_assert!(!self.has_slot(&name), "duplicate slot {}", name);
        self.nodes.push(Node::Slot { name, code: None });
    }

    pub fn has_slot(&self, name: &SlotName) -> bool {
        self.slots().any(|slot| slot == name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotName> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Slot { name, .. } => Some(name),
            Node::Text(_) => None,
        })
    }

    /// Places `code` in the named slot, replacing earlier code.
    pub fn splice(&mut self, name: &SlotName, code: &str) -> Result<()> {
        for node in self.nodes.iter_mut() {
            if let Node::Slot {
                name: slot,
                code: current,
            } = node
            {
                if slot == name {
                    *current = Some(code.to_owned());
                    return Ok(());
                }
            }
        }
        Err(StubError::NoSlot {
            class: self.class.clone(),
            slot: name.to_string(),
        })
    }

    /// Serializes the stub. Unfilled slots leave a marker comment behind.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Slot {
                    code: Some(code), ..
                } => out.push_str(code),
                Node::Slot { name, code: None } => {
                    out.push_str("// ");
                    out.push_str(&name.to_string());
                }
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
