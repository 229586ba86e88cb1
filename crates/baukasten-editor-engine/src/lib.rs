pub mod editing;
pub mod error;
pub mod model;

// Re-export key types for easier usage
pub use editing::{commands::*, editor::*, patch::*, snapshot::*};
pub use error::EngineError;
pub use model::{Segment, Tree};
