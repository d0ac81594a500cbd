//! Host event loop.
//!
//! [`PaneRuntime`] owns a [`LayoutEngine`], the in-memory view surface and a
//! renderer. Every event is offered to the registered handlers, then a layout
//! pass runs and dirty views are flushed, mirroring how a terminal UI library
//! calls its layout function on every flush.

use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use serde_json::json;

use crate::engine::{LayoutEngine, LayoutHooks, PassReport};
use crate::error::Result;
use crate::geometry::Size;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::render::AnsiRenderer;
use crate::view::{ViewRegistry, ViewSurface};

pub mod driver;

const LOG_TARGET: &str = "pane_layout::runtime";

/// Configuration knobs for the runtime loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            logger: None,
            metrics_interval: Duration::from_secs(5),
        }
    }
}

/// Events delivered to handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize(Size),
    /// Run a pass without any other input, e.g. after background work.
    Render,
    /// The active repository changed; repo setup runs on the next pass.
    RepoSwitched,
}

/// Control the propagation of an event across handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Handed to handlers so they can drive the engine while an event is
/// dispatched.
pub struct RuntimeContext<'a> {
    engine: &'a mut LayoutEngine,
    surface: &'a mut ViewRegistry,
    exit_requested: bool,
    cursor_hint: Option<(u16, u16)>,
}

impl<'a> RuntimeContext<'a> {
    fn new(engine: &'a mut LayoutEngine, surface: &'a mut ViewRegistry) -> Self {
        Self {
            engine,
            surface,
            exit_requested: false,
            cursor_hint: None,
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &*self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine {
        &mut *self.engine
    }

    pub fn surface(&self) -> &ViewRegistry {
        &*self.surface
    }

    pub fn surface_mut(&mut self) -> &mut ViewRegistry {
        &mut *self.surface
    }

    /// Focus the context owning `view_name`.
    pub fn activate(&mut self, view_name: &str) -> Result<()> {
        self.engine.activate_view(view_name, &mut *self.surface)
    }

    /// Close the topmost popup.
    pub fn pop_context(&mut self) -> Result<()> {
        self.engine.pop_context(&mut *self.surface).map(|_| ())
    }

    /// Replace a view's buffer.
    pub fn set_content(&mut self, view_name: &str, content: impl Into<String>) -> Result<()> {
        self.surface.view_mut(view_name)?.set_content(content);
        Ok(())
    }

    /// Signal that the loop should stop after this event.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Where the cursor should be parked after rendering.
    pub fn set_cursor_hint(&mut self, row: u16, col: u16) {
        self.cursor_hint = Some((row, col));
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            exit_requested: self.exit_requested,
            cursor_hint: self.cursor_hint,
        }
    }
}

struct ContextOutcome {
    exit_requested: bool,
    cursor_hint: Option<(u16, u16)>,
}

/// Behaviour injection point for the runtime.
pub trait RuntimeHandler {
    fn name(&self) -> &str {
        "runtime_handler"
    }

    /// Runs once before the first pass, typically to create views.
    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        _event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }

    fn after_pass(&mut self, _ctx: &mut RuntimeContext<'_>, _report: &PassReport) -> Result<()> {
        Ok(())
    }
}

pub struct PaneRuntime {
    engine: LayoutEngine,
    surface: ViewRegistry,
    hooks: Box<dyn LayoutHooks>,
    renderer: AnsiRenderer,
    handlers: Vec<Box<dyn RuntimeHandler>>,
    config: RuntimeConfig,
    should_exit: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl PaneRuntime {
    pub fn new<H>(engine: LayoutEngine, hooks: H, renderer: AnsiRenderer, size: Size) -> Self
    where
        H: LayoutHooks + 'static,
    {
        Self {
            engine,
            surface: ViewRegistry::new(size),
            hooks: Box::new(hooks),
            renderer,
            handlers: Vec::new(),
            config: RuntimeConfig::default(),
            should_exit: false,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine {
        &mut self.engine
    }

    pub fn surface(&self) -> &ViewRegistry {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut ViewRegistry {
        &mut self.surface
    }

    pub fn register_handler<H>(&mut self, handler: H)
    where
        H: RuntimeHandler + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn resize(&mut self, size: Size) {
        if self.surface.size() == size {
            return;
        }
        self.surface.resize(size);
        self.log_runtime_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
    }

    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                let runtime_event = map_event(event::read()?);
                self.step(stdout, runtime_event)?;
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.step(stdout, RuntimeEvent::Tick { elapsed })?;
            }

            self.maybe_emit_metrics();
        }

        self.finalize();
        Ok(())
    }

    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap(stdout)?;
        for event in events {
            self.step(stdout, event)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    /// Dispatch one event, run a pass and flush.
    fn step(&mut self, stdout: &mut impl Write, event: RuntimeEvent) -> Result<()> {
        match &event {
            RuntimeEvent::Resize(size) => self.resize(*size),
            RuntimeEvent::RepoSwitched => self.engine.switch_repo(),
            _ => {}
        }
        self.dispatch_event(&event)?;
        self.pass_and_render(stdout)
    }

    fn dispatch_event(&mut self, event: &RuntimeEvent) -> Result<()> {
        let mut consumed = false;
        for idx in 0..self.handlers.len() {
            let (flow, outcome) = {
                let handler = &mut self.handlers[idx];
                let mut ctx = RuntimeContext::new(&mut self.engine, &mut self.surface);
                let flow = handler.on_event(&mut ctx, event)?;
                (flow, ctx.into_outcome())
            };
            self.apply_outcome(outcome);
            if flow == EventFlow::Consumed {
                consumed = true;
                break;
            }
        }
        self.log_runtime_event(
            LogLevel::Debug,
            "event_dispatched",
            [
                json_kv("event", json!(describe_event(event))),
                json_kv("consumed", json!(consumed)),
            ],
        );
        Ok(())
    }

    fn pass_and_render(&mut self, stdout: &mut impl Write) -> Result<()> {
        let report = self
            .engine
            .layout(&mut self.surface, self.hooks.as_mut())?;

        for idx in 0..self.handlers.len() {
            let outcome = {
                let handler = &mut self.handlers[idx];
                let mut ctx = RuntimeContext::new(&mut self.engine, &mut self.surface);
                handler.after_pass(&mut ctx, &report)?;
                ctx.into_outcome()
            };
            self.apply_outcome(outcome);
        }

        let (full_redraw, views) = self.surface.take_dirty();
        if full_redraw || !views.is_empty() {
            self.renderer
                .render(stdout, self.surface.size(), full_redraw, &views)?;
            self.log_runtime_event(
                LogLevel::Debug,
                "render_completed",
                [
                    json_kv("views", json!(views.len())),
                    json_kv("full_redraw", json!(full_redraw)),
                ],
            );
        }
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) {
        if let Some(cursor) = outcome.cursor_hint {
            self.renderer.settings_mut().restore_cursor = Some(cursor);
        }
        if outcome.exit_requested {
            self.should_exit = true;
            self.log_runtime_event(LogLevel::Info, "exit_requested", std::iter::empty());
        }
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("handlers", json!(self.handlers.len())),
                json_kv("contexts", json!(self.engine.contexts().len())),
            ],
        );

        for idx in 0..self.handlers.len() {
            let outcome = {
                let handler = &mut self.handlers[idx];
                let handler_name = handler.name().to_string();
                let mut ctx = RuntimeContext::new(&mut self.engine, &mut self.surface);
                handler.init(&mut ctx)?;
                let outcome = ctx.into_outcome();
                self.log_runtime_event(
                    LogLevel::Debug,
                    "handler_initialized",
                    [json_kv("handler", json!(handler_name))],
                );
                outcome
            };
            self.apply_outcome(outcome);
        }

        self.pass_and_render(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.engine.log_metrics_snapshot();
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }
        self.engine.log_metrics_snapshot();
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

fn map_event(event: CrosstermEvent) -> RuntimeEvent {
    match event {
        CrosstermEvent::Key(key) => RuntimeEvent::Key(key),
        CrosstermEvent::Mouse(mouse) => RuntimeEvent::Mouse(mouse),
        CrosstermEvent::Paste(data) => RuntimeEvent::Paste(data),
        CrosstermEvent::FocusGained => RuntimeEvent::FocusGained,
        CrosstermEvent::FocusLost => RuntimeEvent::FocusLost,
        CrosstermEvent::Resize(width, height) => RuntimeEvent::Resize(Size::new(width, height)),
    }
}

fn describe_event(event: &RuntimeEvent) -> &'static str {
    match event {
        RuntimeEvent::Tick { .. } => "tick",
        RuntimeEvent::Key(_) => "key",
        RuntimeEvent::Mouse(_) => "mouse",
        RuntimeEvent::Paste(_) => "paste",
        RuntimeEvent::FocusGained => "focus_gained",
        RuntimeEvent::FocusLost => "focus_lost",
        RuntimeEvent::Resize(_) => "resize",
        RuntimeEvent::Render => "render",
        RuntimeEvent::RepoSwitched => "repo_switched",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextDescriptor, ContextKind, StaticContent};
    use crate::engine::{EngineConfig, NoopHooks};
    use crate::layout::WindowArrangement;
    use crate::lifecycle::{LifecycleState, MemoryStateStore};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::{Arc, Mutex};

    struct Panels {
        passes: Arc<Mutex<Vec<PassReport>>>,
    }

    impl RuntimeHandler for Panels {
        fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
            for name in ["files", "main", "menu"] {
                ctx.surface_mut().prepare_view(name)?;
            }
            Ok(())
        }

        fn on_event(
            &mut self,
            ctx: &mut RuntimeContext<'_>,
            event: &RuntimeEvent,
        ) -> Result<EventFlow> {
            let RuntimeEvent::Key(key) = event else {
                return Ok(EventFlow::Continue);
            };
            match key.code {
                KeyCode::Char('q') => ctx.request_exit(),
                KeyCode::Char('m') => ctx.activate("menu")?,
                KeyCode::Esc => ctx.pop_context()?,
                _ => return Ok(EventFlow::Continue),
            }
            Ok(EventFlow::Consumed)
        }

        fn after_pass(&mut self, _ctx: &mut RuntimeContext<'_>, report: &PassReport) -> Result<()> {
            if let Ok(mut passes) = self.passes.lock() {
                passes.push(report.clone());
            }
            Ok(())
        }
    }

    fn key(ch: char) -> RuntimeEvent {
        RuntimeEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
    }

    fn runtime() -> (PaneRuntime, Arc<Mutex<Vec<PassReport>>>) {
        let mut engine = LayoutEngine::new(
            EngineConfig::default(),
            WindowArrangement::default(),
            MemoryStateStore::default(),
        );
        engine
            .register_context(ContextDescriptor::new("files", "files"), StaticContent::new("a"))
            .unwrap();
        engine
            .register_context(ContextDescriptor::new("main", "main"), StaticContent::new("b"))
            .unwrap();
        engine
            .register_context(
                ContextDescriptor::new("menu", "menu")
                    .with_kind(ContextKind::TemporaryPopup)
                    .with_controlled_bounds(false),
                StaticContent::default(),
            )
            .unwrap();

        let passes = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = PaneRuntime::new(
            engine,
            NoopHooks,
            AnsiRenderer::with_default(),
            Size::new(90, 30),
        );
        runtime.register_handler(Panels {
            passes: Arc::clone(&passes),
        });
        (runtime, passes)
    }

    #[test]
    fn every_event_runs_a_pass() {
        let (mut runtime, passes) = runtime();
        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, [RuntimeEvent::Render, RuntimeEvent::Render])
            .unwrap();

        let passes = passes.lock().unwrap();
        assert_eq!(passes.len(), 3);
        assert!(passes[0].process_setup && passes[0].repo_setup);
        assert!(!passes[1].process_setup && !passes[2].repo_setup);
        assert!(!output.is_empty());
    }

    #[test]
    fn exit_stops_the_script() {
        let (mut runtime, passes) = runtime();
        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, [key('q'), RuntimeEvent::Render])
            .unwrap();
        assert_eq!(passes.lock().unwrap().len(), 2);
    }

    #[test]
    fn popups_open_and_close_through_handlers() {
        let (mut runtime, _) = runtime();
        let mut output = Vec::new();
        runtime.run_scripted(&mut output, [key('m')]).unwrap();
        assert_eq!(runtime.surface().current_view(), Some("menu"));
        assert!(runtime.surface().view("menu").unwrap().is_visible());

        runtime
            .run_scripted(
                &mut output,
                [RuntimeEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))],
            )
            .unwrap();
        assert_eq!(runtime.surface().current_view(), Some("files"));
        assert!(!runtime.surface().view("menu").unwrap().is_visible());
    }

    #[test]
    fn resize_and_repo_switch_reach_the_engine() {
        let (mut runtime, passes) = runtime();
        let mut output = Vec::new();
        runtime
            .run_scripted(
                &mut output,
                [RuntimeEvent::Resize(Size::new(120, 40)), RuntimeEvent::RepoSwitched],
            )
            .unwrap();

        assert_eq!(runtime.surface().size(), Size::new(120, 40));
        let passes = passes.lock().unwrap();
        assert!(passes[1].resized);
        assert!(passes[2].repo_setup);
        assert_eq!(runtime.engine().lifecycle_state(), LifecycleState::RepoReady);
    }
}
