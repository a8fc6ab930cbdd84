//! Stub synthesis: per-class parse routines with named insertion points, and
//! splicing of user code into them.

use std::collections::BTreeMap;

mod error;
mod generate;
mod patch;
mod plan;
mod stub;

#[cfg(test)]
mod testing;

pub use error::{Result, StubError};
pub use generate::{
    class_units, file_stem, format_rust, mod_unit, start_unit, stubs, token_unit, Target, Unit,
};
pub use patch::{apply, Entry, IGNORE};
pub use plan::{class_plans, Case, ClassPlan, Plan, Step};
pub use stub::{SlotName, Stub};

/// Stubs keyed by class name.
pub type StubSet = BTreeMap<String, Stub>;
