// Resume document persistence: the single-blob store and the change detector
// that keeps redundant candidates away from it.

pub mod change_detector;
pub mod store;

pub use change_detector::ChangeDetector;
pub use store::{DocumentStore, PersistenceError};
