//! # Content Model
//!
//! Editor content lives in an arena [`Tree`] of nodes (root, blocks, text,
//! line breaks, mentions and decorator wrappers). The tree is the persistent
//! structure; [`Segment`]s are a flattened projection of it, recomputed by
//! [`serialize`] whenever the content changes.
//!
//! ## Modules
//!
//! - **`node`**: `NodeKind`, `Mention` and `DecoratorMark`
//! - **`tree`**: the `Tree` arena and `NodeId` handles
//! - **`segment`**: `Segment`, `serialize()` and `plain_text()`

pub mod node;
pub mod segment;
pub mod tree;

pub use node::{DecoratorMark, Mention, NodeKind};
pub use segment::{Segment, plain_text, serialize};
pub use tree::{NodeId, Tree};
