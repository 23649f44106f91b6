// Per-section editors: provisional working copies that submit whole-section
// candidates to the autosave scheduler.

pub mod session;
pub mod validation;

pub use session::{EditorError, SectionEditor};
pub use validation::{validate, Validate, ValidationReport};
