//! ahkforge-types: pure data types shared by the ahkforge crates.
//!
//! Nothing in here does any work beyond construction and formatting:
//!
//! - **ScriptText**: immutable line sequence that every pipeline stage consumes
//!   and replaces wholesale
//! - **Violation**: one finding from the detector or the structural validator
//! - **ConversionRecord**: one rewrite applied by the converter
//! - **ValidationResult**: the final verdict for a script

mod record;
mod result;
mod script;
mod violation;

pub use record::ConversionRecord;
pub use result::ValidationResult;
pub use script::ScriptText;
pub use violation::{Violation, ViolationKind};
