use std::time::Instant;

use serde_json::json;

use crate::context::{ContextDescriptor, ContextId, ContextKind, ContextTree, PanelContent};
use crate::deferred::{DeferredQueue, DeferredSender};
use crate::error::{LayoutError, Result};
use crate::focus::{FocusStack, WindowAssignments};
use crate::geometry::Size;
use crate::layout::{GeometryResolver, WindowDimensions};
use crate::lifecycle::{AppStateStore, Lifecycle, LifecycleState, StartupLatch, startup_popup};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::view::{View, ViewSurface};

use super::binder::{bind_views, content_area};
use super::config::EngineConfig;
use super::hooks::LayoutHooks;

const LOG_TARGET: &str = "pane_layout::engine";

/// Side effects of one layout pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Views whose context was told to re-render, in traversal order.
    pub rerendered: Vec<String>,
    /// Controlled views skipped because they do not exist yet.
    pub unknown_views: Vec<String>,
    pub process_setup: bool,
    pub repo_setup: bool,
    /// The main view changed size and the resize hook ran.
    pub resized: bool,
    pub deferred_actions: usize,
}

/// What the previous pass left behind for comparison.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PrevLayout {
    information: Option<String>,
    main_width: i32,
    main_height: i32,
}

/// Owns every context, the focus stack, the lifecycle and the deferred
/// mailbox, and runs layout passes against a [`ViewSurface`].
pub struct LayoutEngine {
    config: EngineConfig,
    resolver: Box<dyn GeometryResolver + Send>,
    contexts: ContextTree,
    focus: FocusStack,
    windows: WindowAssignments,
    lifecycle: Lifecycle,
    deferred: DeferredQueue,
    app_state: Box<dyn AppStateStore>,
    latch: StartupLatch,
    prev: PrevLayout,
    default_context: Option<ContextId>,
    information: String,
    app_status: String,
    show_recent_repos: bool,
    started: Instant,
}

impl LayoutEngine {
    pub fn new<R, S>(config: EngineConfig, resolver: R, app_state: S) -> Self
    where
        R: GeometryResolver + Send + 'static,
        S: AppStateStore + 'static,
    {
        let show_recent_repos = config.startup.show_recent_repos;
        Self {
            config,
            resolver: Box::new(resolver),
            contexts: ContextTree::new(),
            focus: FocusStack::new(),
            windows: WindowAssignments::new(),
            lifecycle: Lifecycle::new(),
            deferred: DeferredQueue::new(),
            app_state: Box::new(app_state),
            latch: StartupLatch::new(),
            prev: PrevLayout::default(),
            default_context: None,
            information: String::new(),
            app_status: String::new(),
            show_recent_repos,
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn register_context<C>(&mut self, descriptor: ContextDescriptor, content: C) -> Result<ContextId>
    where
        C: PanelContent + 'static,
    {
        self.contexts.register(descriptor, content)
    }

    pub fn register_child<C>(
        &mut self,
        parent: ContextId,
        descriptor: ContextDescriptor,
        content: C,
    ) -> Result<ContextId>
    where
        C: PanelContent + 'static,
    {
        self.contexts.register_child(parent, descriptor, content)
    }

    pub fn contexts(&self) -> &ContextTree {
        &self.contexts
    }

    /// Mutable access to a context's content collaborator. Descriptors stay
    /// immutable.
    pub fn content_mut(&mut self, id: ContextId) -> Option<&mut dyn PanelContent> {
        self.contexts.get_mut(id).map(|context| context.content_mut())
    }

    /// Context activated during process setup and after repository switches.
    pub fn set_default_context(&mut self, id: ContextId) {
        self.default_context = Some(id);
    }

    /// The configured default, else the first normal controlled context.
    pub fn default_context(&self) -> Option<ContextId> {
        self.default_context.or_else(|| {
            self.contexts.flatten().into_iter().find(|id| {
                self.contexts.descriptor(*id).is_some_and(|descriptor| {
                    descriptor.kind() == ContextKind::Normal && descriptor.has_controlled_bounds()
                })
            })
        })
    }

    pub fn current_context(&self) -> Option<ContextId> {
        self.focus.current()
    }

    pub fn activate(&mut self, id: ContextId, surface: &mut dyn ViewSurface) -> Result<()> {
        self.focus
            .activate(id, &self.contexts, &mut self.windows, surface)
    }

    pub fn activate_view(&mut self, view_name: &str, surface: &mut dyn ViewSurface) -> Result<()> {
        let id = self
            .contexts
            .by_view_name(view_name)
            .ok_or_else(|| LayoutError::UnknownContext(view_name.to_string()))?;
        self.activate(id, surface)
    }

    /// Close the topmost context. Returns the closed context, if any.
    pub fn pop_context(&mut self, surface: &mut dyn ViewSurface) -> Result<Option<ContextId>> {
        self.focus.pop(&self.contexts, &mut self.windows, surface)
    }

    pub fn windows_mut(&mut self) -> &mut WindowAssignments {
        &mut self.windows
    }

    pub fn set_information(&mut self, information: impl Into<String>) {
        self.information = information.into();
    }

    pub fn set_app_status(&mut self, status: impl Into<String>) {
        self.app_status = status.into();
    }

    /// Start a new repository session: the focus stack is rebuilt and repo
    /// setup runs again on the next pass.
    pub fn switch_repo(&mut self) {
        self.focus = FocusStack::new();
        self.windows = WindowAssignments::new();
        self.lifecycle.reset_repo();
        self.log(
            LogLevel::Info,
            "repo_switched",
            [json_kv("state", json!(format!("{:?}", self.lifecycle.state())))],
        );
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn deferred_sender(&self) -> DeferredSender {
        self.deferred.sender()
    }

    pub fn enqueue<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.deferred.enqueue(action)
    }

    /// Released once process setup has completed.
    pub fn startup_latch(&self) -> StartupLatch {
        self.latch.clone()
    }

    pub fn app_state(&self) -> &dyn AppStateStore {
        self.app_state.as_ref()
    }

    /// Run one layout pass.
    pub fn layout(
        &mut self,
        surface: &mut dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) -> Result<PassReport> {
        let result = self.run_pass(surface, hooks);
        self.record_metrics(&result);
        match &result {
            Ok(report) => self.log(
                LogLevel::Debug,
                "layout_pass",
                [
                    json_kv("rerendered", json!(report.rerendered)),
                    json_kv("unknown_views", json!(report.unknown_views)),
                    json_kv("resized", json!(report.resized)),
                    json_kv("deferred_actions", json!(report.deferred_actions)),
                ],
            ),
            Err(err) => self.log(
                LogLevel::Warn,
                "layout_pass_failed",
                [json_kv("error", json!(err.to_string()))],
            ),
        }
        result
    }

    fn run_pass(
        &mut self,
        surface: &mut dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) -> Result<PassReport> {
        let mut report = PassReport::default();
        let size = surface.size();
        let dimensions = self
            .resolver
            .resolve(size, &self.information, &self.app_status);

        self.prefetch_main_lines(&dimensions, surface, hooks);

        let bound = bind_views(&self.contexts, &dimensions, surface)?;
        report.unknown_views = bound.unknown_views;

        self.apply_visibility(size, surface)?;
        self.sync_information(surface)?;

        if self.lifecycle.needs_process_setup() {
            self.process_setup(surface, hooks)?;
            hooks.handle_test_mode();
            self.lifecycle.mark_process_ready()?;
            report.process_setup = true;
            self.note(LogLevel::Info, "process_ready");
        }

        if self.lifecycle.needs_repo_setup() {
            self.repo_setup(surface, hooks)?;
            self.lifecycle.mark_repo_ready()?;
            report.repo_setup = true;
            self.note(LogLevel::Info, "repo_ready");
        }

        report.resized = self.react_to_resize(surface, hooks)?;

        for id in bound.rerender {
            let Some(context) = self.contexts.get_mut(id) else {
                continue;
            };
            let view_name = context.descriptor().view_name().to_string();
            let view = surface.view_mut(&view_name)?;
            context.content_mut().handle_render(view)?;
            report.rerendered.push(view_name);
        }

        hooks.after_layout(surface)?;
        report.deferred_actions = self.deferred.drain()?;
        Ok(report)
    }

    /// Ask buffered readers for more lines before the main area grows.
    fn prefetch_main_lines(
        &self,
        dimensions: &WindowDimensions,
        surface: &dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) {
        let names = &self.config.views;
        let Ok(main) = surface.view(&names.main) else {
            return;
        };
        let window = self
            .contexts
            .by_view_name(&names.main)
            .and_then(|id| self.contexts.descriptor(id))
            .map_or(names.main.as_str(), ContextDescriptor::window_name);
        let Some(rect) = dimensions.get(window) else {
            return;
        };

        let new_height = content_area(*rect, main.frame()).height();
        let grown = usize::try_from(new_height - main.height()).unwrap_or(0);
        if grown > 0 {
            hooks.read_lines(&names.main, grown);
            hooks.read_lines(&names.secondary, grown);
        }
    }

    fn apply_visibility(&self, size: Size, surface: &mut dyn ViewSurface) -> Result<()> {
        let names = &self.config.views;
        let min = self.config.min_size;

        let too_small = size.width < min.width || size.height < min.height;
        set_visible_if_known(surface, &names.limit, too_small)?;

        let menu_visible = known(surface.view(&names.menu))?.is_some_and(View::is_visible);
        let tooltip_has_text =
            known(surface.view(&names.tooltip))?.is_some_and(|view| !view.is_buffer_empty());
        set_visible_if_known(surface, &names.tooltip, menu_visible && tooltip_has_text)?;

        for id in self.contexts.transient_contexts() {
            let Some(descriptor) = self.contexts.descriptor(id) else {
                continue;
            };
            let occupant = self
                .windows
                .view_for_window(descriptor.window_name(), &self.contexts);
            let visible = occupant.as_deref() == Some(descriptor.view_name());
            set_visible_if_known(surface, descriptor.view_name(), visible)?;
        }
        Ok(())
    }

    fn sync_information(&mut self, surface: &mut dyn ViewSurface) -> Result<()> {
        if self.prev.information.as_deref() == Some(self.information.as_str()) {
            return Ok(());
        }
        match surface.view_mut(&self.config.views.information) {
            Ok(view) => {
                view.set_content(self.information.clone());
                self.prev.information = Some(self.information.clone());
                Ok(())
            }
            Err(err) if err.is_unknown_view() => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn process_setup(
        &mut self,
        surface: &mut dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) -> Result<()> {
        hooks.print_command_log_header(surface)?;

        if let Some(default) = self.default_context() {
            known(
                self.focus
                    .activate(default, &self.contexts, &mut self.windows, surface),
            )?;
        }

        if let Some(popup) = startup_popup(&self.config.startup, self.app_state.app_state()) {
            hooks.show_startup_popup(popup)?;
        }

        self.app_state.app_state_mut().last_version = self.config.startup.app_version.clone();
        if let Err(err) = self.app_state.save() {
            self.log(
                LogLevel::Warn,
                "app_state_save_failed",
                [json_kv("error", json!(err.to_string()))],
            );
        }

        if self.show_recent_repos {
            hooks.create_recent_repos_menu()?;
            self.show_recent_repos = false;
        }

        hooks.check_for_update_in_background(self.deferred.sender());
        self.latch.release();
        Ok(())
    }

    fn repo_setup(
        &mut self,
        surface: &mut dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) -> Result<()> {
        for view_name in &self.config.views.stacking_order {
            match surface.set_view_on_top(view_name) {
                Ok(()) => {}
                Err(err) if err.is_unknown_view() => {}
                Err(err) => return Err(err),
            }
        }

        for id in self.contexts.popup_contexts() {
            if let Some(descriptor) = self.contexts.descriptor(id) {
                set_visible_if_known(surface, descriptor.view_name(), false)?;
            }
        }

        if let Some(current) = self.focus.current().or_else(|| self.default_context()) {
            known(
                self.focus
                    .activate(current, &self.contexts, &mut self.windows, surface),
            )?;
        }

        hooks.load_new_repo()
    }

    fn react_to_resize(
        &mut self,
        surface: &dyn ViewSurface,
        hooks: &mut dyn LayoutHooks,
    ) -> Result<bool> {
        let Some(main) = known(surface.view(&self.config.views.main))? else {
            return Ok(false);
        };
        let (width, height) = (main.width(), main.height());
        if width == self.prev.main_width && height == self.prev.main_height {
            return Ok(false);
        }

        self.prev.main_width = width;
        self.prev.main_height = height;
        self.log(
            LogLevel::Info,
            "main_view_resized",
            [
                json_kv("width", json!(width)),
                json_kv("height", json!(height)),
            ],
        );
        hooks.on_resize()?;
        Ok(true)
    }

    fn record_metrics(&self, result: &Result<PassReport>) {
        let Some(metrics) = self.config.metrics.as_ref() else {
            return;
        };
        if let Ok(mut guard) = metrics.lock() {
            match result {
                Ok(report) => {
                    guard.record_pass(true);
                    guard.record_rerenders(report.rerendered.len());
                    guard.record_deferred(report.deferred_actions);
                    guard.record_unknown_views(report.unknown_views.len());
                    if report.resized {
                        guard.record_resize();
                    }
                }
                Err(_) => guard.record_pass(false),
            }
        }
    }

    /// Emit a metrics snapshot through the configured logger.
    pub fn log_metrics_snapshot(&self) {
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(self.started.elapsed())
                    .to_log_event("pane_layout::metrics");
                let _ = logger.log_event(event);
            }
        }
    }

    fn note(&self, level: LogLevel, message: &str) {
        self.log(level, message, std::iter::empty::<(String, serde_json::Value)>());
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

/// Turn an unknown-view failure into `None`, keeping every other error.
fn known<T>(lookup: Result<T>) -> Result<Option<T>> {
    match lookup {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_unknown_view() => Ok(None),
        Err(err) => Err(err),
    }
}

fn set_visible_if_known(surface: &mut dyn ViewSurface, view_name: &str, visible: bool) -> Result<()> {
    if let Some(view) = known(surface.view_mut(view_name))? {
        view.set_visible(visible);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{StaticContent, WidthRerender};
    use crate::engine::NoopHooks;
    use crate::layout::WindowArrangement;
    use crate::lifecycle::{AppState, MemoryStateStore, StartupPopup};
    use crate::logging::{Logger, MemorySink};
    use crate::view::ViewRegistry;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_header: bool,
    }

    impl LayoutHooks for Recorder {
        fn print_command_log_header(&mut self, _surface: &mut dyn ViewSurface) -> Result<()> {
            if self.fail_header {
                return Err(LayoutError::Backend("header".to_string()));
            }
            self.calls.push("header".to_string());
            Ok(())
        }

        fn show_startup_popup(&mut self, popup: StartupPopup) -> Result<()> {
            self.calls.push(format!("popup:{popup:?}"));
            Ok(())
        }

        fn create_recent_repos_menu(&mut self) -> Result<()> {
            self.calls.push("recent".to_string());
            Ok(())
        }

        fn check_for_update_in_background(&mut self, _deferred: DeferredSender) {
            self.calls.push("update".to_string());
        }

        fn handle_test_mode(&mut self) {
            self.calls.push("test_mode".to_string());
        }

        fn load_new_repo(&mut self) -> Result<()> {
            self.calls.push("load_repo".to_string());
            Ok(())
        }

        fn on_resize(&mut self) -> Result<()> {
            self.calls.push("resize".to_string());
            Ok(())
        }
    }

    impl Recorder {
        fn count(&self, call: &str) -> usize {
            self.calls.iter().filter(|name| name.as_str() == call).count()
        }
    }

    fn engine_with(config: EngineConfig) -> LayoutEngine {
        let mut engine = LayoutEngine::new(
            config,
            WindowArrangement::default(),
            MemoryStateStore::new(AppState::default()),
        );
        engine
            .register_context(ContextDescriptor::new("files", "files"), StaticContent::new("a\nb"))
            .unwrap();
        engine
            .register_context(
                ContextDescriptor::new("main", "main")
                    .with_width_rerender(WidthRerender::WhenWidthChanges),
                StaticContent::new("diff"),
            )
            .unwrap();
        engine
            .register_context(
                ContextDescriptor::new("menu", "menu")
                    .with_kind(ContextKind::TemporaryPopup)
                    .with_controlled_bounds(false),
                StaticContent::default(),
            )
            .unwrap();
        engine
    }

    fn surface(size: Size) -> ViewRegistry {
        let mut surface = ViewRegistry::new(size);
        for name in ["files", "main", "menu", "tooltip", "limit", "information"] {
            surface.prepare_view(name).unwrap();
        }
        surface
    }

    #[test]
    fn process_setup_runs_once() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();
        let latch = engine.startup_latch();

        for _ in 0..5 {
            engine.layout(&mut surface, &mut hooks).unwrap();
        }

        assert_eq!(hooks.count("header"), 1);
        assert_eq!(hooks.count("popup:Intro"), 1);
        assert_eq!(hooks.count("update"), 1);
        assert_eq!(hooks.count("test_mode"), 1);
        assert_eq!(hooks.count("load_repo"), 1);
        assert!(latch.is_released());
        assert_eq!(engine.lifecycle_state(), LifecycleState::RepoReady);
        assert_eq!(
            engine.app_state().app_state().last_version,
            env!("CARGO_PKG_VERSION")
        );
        assert_eq!(surface.current_view(), Some("files"));
    }

    #[test]
    fn failed_setup_is_retried_next_pass() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder {
            fail_header: true,
            ..Recorder::default()
        };

        assert!(engine.layout(&mut surface, &mut hooks).is_err());
        assert_eq!(engine.lifecycle_state(), LifecycleState::Uninitialized);
        assert!(!engine.startup_latch().is_released());

        hooks.fail_header = false;
        let report = engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(report.process_setup);
        assert!(report.repo_setup);
    }

    #[test]
    fn repo_switch_reruns_only_repo_setup() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();

        engine.layout(&mut surface, &mut hooks).unwrap();
        engine.switch_repo();
        let report = engine.layout(&mut surface, &mut hooks).unwrap();

        assert!(!report.process_setup);
        assert!(report.repo_setup);
        assert_eq!(hooks.count("header"), 1);
        assert_eq!(hooks.count("load_repo"), 2);
    }

    #[test]
    fn recent_repos_menu_is_shown_once() {
        let mut config = EngineConfig::default();
        config.startup.show_recent_repos = true;
        let mut engine = engine_with(config);
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();

        engine.layout(&mut surface, &mut hooks).unwrap();
        engine.switch_repo();
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(hooks.count("recent"), 1);
    }

    #[test]
    fn width_change_rerenders_once() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();

        let first = engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(first.rerendered, ["main"]);
        let steady = engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(steady.rerendered.is_empty());
        assert!(!steady.resized);

        surface.resize(Size::new(120, 30));
        let wider = engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(wider.rerendered, ["main"]);
        assert!(wider.resized);
        let again = engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(again.rerendered.is_empty());
        assert_eq!(hooks.count("resize"), 2);
    }

    #[test]
    fn limit_view_covers_tiny_terminals() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(9, 30));
        let mut hooks = Recorder::default();

        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(surface.view("limit").unwrap().is_visible());

        surface.resize(Size::new(90, 30));
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(!surface.view("limit").unwrap().is_visible());
    }

    #[test]
    fn tooltip_follows_menu_and_text() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();
        engine.layout(&mut surface, &mut hooks).unwrap();

        surface.view_mut("menu").unwrap().set_visible(true);
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(!surface.view("tooltip").unwrap().is_visible());

        surface.view_mut("tooltip").unwrap().set_content("press enter");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(surface.view("tooltip").unwrap().is_visible());

        surface.view_mut("menu").unwrap().set_visible(false);
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(!surface.view("tooltip").unwrap().is_visible());
    }

    #[test]
    fn information_is_written_only_when_changed() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();

        engine.set_information("v1.0");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(surface.view("information").unwrap().content(), "v1.0");

        surface.view_mut("information").unwrap().set_content("scribbled");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(surface.view("information").unwrap().content(), "scribbled");

        engine.set_information("v1.1");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(surface.view("information").unwrap().content(), "v1.1");
    }

    #[test]
    fn transient_views_show_only_when_they_own_the_window() {
        let mut engine = engine_with(EngineConfig::default());
        for name in ["search", "filter"] {
            engine
                .register_context(
                    ContextDescriptor::new(name, "extras").with_transient(true),
                    StaticContent::default(),
                )
                .unwrap();
        }
        let mut surface = surface(Size::new(90, 30));
        surface.prepare_view("search").unwrap();
        surface.prepare_view("filter").unwrap();
        let mut hooks = Recorder::default();

        engine.windows_mut().assign("extras", "filter");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(surface.view("filter").unwrap().is_visible());
        assert!(!surface.view("search").unwrap().is_visible());
    }

    #[test]
    fn repo_switch_forgets_window_occupants() {
        let mut engine = engine_with(EngineConfig::default());
        for name in ["search", "filter"] {
            engine
                .register_context(
                    ContextDescriptor::new(name, "extras").with_transient(true),
                    StaticContent::default(),
                )
                .unwrap();
        }
        let mut surface = surface(Size::new(90, 30));
        surface.prepare_view("search").unwrap();
        surface.prepare_view("filter").unwrap();
        let mut hooks = Recorder::default();

        engine.windows_mut().assign("extras", "filter");
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(surface.view("filter").unwrap().is_visible());

        engine.switch_repo();
        engine.layout(&mut surface, &mut hooks).unwrap();
        assert!(surface.view("search").unwrap().is_visible());
        assert!(!surface.view("filter").unwrap().is_visible());
    }

    #[test]
    fn unknown_views_do_not_abort_the_pass() {
        let mut engine = engine_with(EngineConfig::default());
        engine
            .register_context(ContextDescriptor::new("commits", "commits"), StaticContent::default())
            .unwrap();
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();

        let report = engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(report.unknown_views, ["commits"]);
        assert!(report.repo_setup);
    }

    #[test]
    fn deferred_actions_run_at_the_end_of_the_pass() {
        let mut engine = engine_with(EngineConfig::default());
        let mut surface = surface(Size::new(90, 30));
        let mut hooks = Recorder::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            engine
                .enqueue(move || {
                    seen.lock().unwrap().push(label);
                    Ok(())
                })
                .unwrap();
        }

        let report = engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(report.deferred_actions, 3);
        assert_eq!(*seen.lock().unwrap(), ["a", "b", "c"]);
        let next = engine.layout(&mut surface, &mut hooks).unwrap();
        assert_eq!(next.deferred_actions, 0);
    }

    #[test]
    fn passes_are_logged_and_counted() {
        let sink = MemorySink::new();
        let mut config = EngineConfig {
            logger: Some(Logger::new(sink.clone())),
            ..EngineConfig::default()
        };
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        let mut engine = engine_with(config);
        let mut surface = surface(Size::new(90, 30));

        engine.layout(&mut surface, &mut NoopHooks).unwrap();
        engine.layout(&mut surface, &mut NoopHooks).unwrap();

        let messages = sink.messages();
        assert!(messages.iter().any(|m| m == "process_ready"));
        assert_eq!(messages.iter().filter(|m| *m == "layout_pass").count(), 2);
        let snapshot = metrics.lock().unwrap().snapshot(std::time::Duration::ZERO);
        assert_eq!(snapshot.passes, 2);
        assert_eq!(snapshot.rerenders, 1);
    }
}
