//! The layout pass.
//!
//! [`LayoutEngine::layout`] runs one pass: resolve window geometry, bind
//! controlled contexts to their views, adjust visibility, run the one-shot
//! lifecycle phases, react to main-view resizes, dispatch re-renders and
//! finally drain the deferred mailbox. Everything the pass does to the
//! terminal goes through [`ViewSurface`](crate::view::ViewSurface); everything
//! it asks of the application goes through [`LayoutHooks`].

mod binder;
mod config;
mod core;
mod hooks;

pub use binder::{BindOutcome, bind_views, content_area, outer_bounds};
pub use config::{EngineConfig, ViewNames};
pub use self::core::{LayoutEngine, PassReport};
pub use hooks::{LayoutHooks, NoopHooks};
