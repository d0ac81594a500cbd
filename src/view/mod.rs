//! Views and the terminal surface they live on.
//!
//! Every terminal-control call made by a layout pass goes through the
//! [`ViewSurface`] trait so the binder can run against the in-memory
//! [`ViewRegistry`] in tests.

mod core;

pub use self::core::{PLACEHOLDER_BOUNDS, View, ViewRegistry, ViewSurface};
