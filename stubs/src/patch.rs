use grammar::names;

use crate::error::{Result, StubError};
use crate::stub::{SlotName, Stub};
use crate::StubSet;

/// Modifier that drops an entry without touching any stub.
pub const IGNORE: &str = "ignore!";

/// One code block from the semantic section.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Entry {
    pub class: String,
    pub modifier: Option<String>,
    pub code: String,
}

impl Entry {
    pub fn slot(&self) -> SlotName {
        SlotName::new(&self.class, self.modifier.as_deref())
    }
}

/// Splices an entry into its stub. A class without a stub gets a new one
/// made of the entry's code, provided no modifier was given.
pub fn apply(stubs: &mut StubSet, entry: Entry) -> Result<()> {
    if entry.modifier.as_deref() == Some(IGNORE) {
        return Ok(());
    }
    let slot = entry.slot();
    match stubs.get_mut(&entry.class) {
        Some(stub) => stub.splice(&slot, &entry.code),
        None if entry.modifier.is_some() => Err(StubError::NoStub {
            class: entry.class,
            slot: slot.to_string(),
        }),
        None => {
            if names::is_reserved_class(&entry.class) {
                return Err(StubError::ReservedClass(entry.class));
            }
            let stub = Stub::user(&entry.class, entry.code);
            stubs.insert(entry.class, stub);
            Ok(())
        }
    }
}
