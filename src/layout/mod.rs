//! Layout module orchestrator.
//!
//! The constraint solver lives in the private `core` module; `windows` turns
//! solved trees into per-pass window dimensions.

mod core;
pub mod windows;

pub use self::core::{Constraint, Direction, LayoutNode, LayoutTree, NodeId};
pub use windows::{ArrangementConfig, GeometryResolver, WindowArrangement, WindowDimensions};
