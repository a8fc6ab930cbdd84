use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, StubError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    /// A semantic entry targets a slot of a class that has no stub.
    NoStub { class: String, slot: String },
    /// The stub exists but has no slot with that name.
    NoSlot { class: String, slot: String },
    ReservedClass(String),
    /// A field name that cannot be spelled as a Rust identifier.
    FieldName { class: String, field: String },
    /// A class whose unit file is already taken by another unit.
    FileClash { class: String, file: String },
    /// A class whose file stem cannot name a Rust module.
    ModuleName(String),
    Runtime(String),
}

impl Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StubError::NoStub {
                ref class,
                ref slot,
            } => write!(f, "no stub for class {} -- cannot replace {}", class, slot),
            StubError::NoSlot {
                ref class,
                ref slot,
            } => write!(f, "no insertion point {} in stub for class {}", slot, class),
            StubError::ReservedClass(ref class) => write!(f, "{}: reserved class name", class),
            StubError::FieldName {
                ref class,
                ref field,
            } => write!(f, "field {} of class {} is not a usable identifier", field, class),
            StubError::FileClash {
                ref class,
                ref file,
            } => write!(f, "{}: file {} is already taken", class, file),
            StubError::ModuleName(ref class) => {
                write!(f, "{}: class name cannot be used as a module name", class)
            }
            StubError::Runtime(ref path) => write!(f, "{}: not a module path", path),
        }
    }
}

impl std::error::Error for StubError {}

