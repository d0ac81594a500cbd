//! View layout and focus coordination for terminal user interfaces.
//!
//! Every redraw runs one layout pass: a [`GeometryResolver`] computes window
//! rectangles, the binder places each geometry-controlled context's view,
//! the focus stack decides which popups are shown, two one-shot lifecycle
//! gates run setup work, and finally the deferred mailbox is drained.

pub mod context;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod runtime;
pub mod view;
pub mod width;

pub use context::{
    Context, ContextDescriptor, ContextId, ContextKind, ContextTree, PanelContent, StaticContent,
    WidthRerender,
};
pub use deferred::{DeferredAction, DeferredQueue, DeferredSender};
pub use engine::{
    BindOutcome, EngineConfig, LayoutEngine, LayoutHooks, NoopHooks, PassReport, ViewNames,
    bind_views, content_area, outer_bounds,
};
pub use error::{LayoutError, Result};
pub use focus::{FocusStack, WindowAssignments};
pub use geometry::{Rect, Size};
pub use layout::{
    ArrangementConfig, Constraint, Direction, GeometryResolver, LayoutNode, LayoutTree,
    WindowArrangement, WindowDimensions,
};
pub use lifecycle::{
    AppState, AppStateStore, JsonStateFile, Lifecycle, LifecycleState, MemoryStateStore,
    STARTUP_POPUP_VERSION, StartupConfig, StartupLatch, StartupPopup,
};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{MetricSnapshot, RuntimeMetrics};
pub use render::{AnsiRenderer, RendererSettings};
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::{
    EventFlow, PaneRuntime, RuntimeConfig, RuntimeContext, RuntimeEvent, RuntimeHandler,
};
pub use view::{PLACEHOLDER_BOUNDS, View, ViewRegistry, ViewSurface};
pub use width::display_width;
