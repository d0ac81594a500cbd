//! Context descriptors and the context tree.
//!
//! A context is the logical owner of one view: its capability flags decide how
//! the binder places it, and its [`PanelContent`] supplies the content height
//! and redraws on demand.

mod descriptor;
mod tree;

pub use descriptor::{ContextDescriptor, ContextKind, PanelContent, StaticContent, WidthRerender};
pub use tree::{Context, ContextId, ContextTree};
