use crate::error::Result;
use crate::view::View;

/// How a context overlays the rest of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Normal,
    /// Popup that keeps its state and re-appears.
    PersistentPopup,
    /// One-shot popup such as a confirmation prompt.
    TemporaryPopup,
}

impl ContextKind {
    pub fn is_popup(self) -> bool {
        matches!(self, Self::PersistentPopup | Self::TemporaryPopup)
    }
}

/// Whether a width change forces the content to be regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthRerender {
    #[default]
    Never,
    WhenWidthChanges,
}

/// Immutable capability flags and names for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDescriptor {
    view_name: String,
    window_name: String,
    kind: ContextKind,
    controlled_bounds: bool,
    transient: bool,
    rerender_on_width: WidthRerender,
    rerender_on_height: bool,
    can_scroll_past_bottom: bool,
}

impl ContextDescriptor {
    /// A normal, geometry-controlled context.
    pub fn new(view_name: impl Into<String>, window_name: impl Into<String>) -> Self {
        Self {
            view_name: view_name.into(),
            window_name: window_name.into(),
            kind: ContextKind::Normal,
            controlled_bounds: true,
            transient: false,
            rerender_on_width: WidthRerender::Never,
            rerender_on_height: false,
            can_scroll_past_bottom: false,
        }
    }

    pub fn with_kind(mut self, kind: ContextKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_controlled_bounds(mut self, controlled: bool) -> Self {
        self.controlled_bounds = controlled;
        self
    }

    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    pub fn with_width_rerender(mut self, policy: WidthRerender) -> Self {
        self.rerender_on_width = policy;
        self
    }

    pub fn with_height_rerender(mut self, rerender: bool) -> Self {
        self.rerender_on_height = rerender;
        self
    }

    pub fn with_scroll_past_bottom(mut self, allowed: bool) -> Self {
        self.can_scroll_past_bottom = allowed;
        self
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn window_name(&self) -> &str {
        &self.window_name
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn has_controlled_bounds(&self) -> bool {
        self.controlled_bounds
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn rerender_on_width(&self) -> WidthRerender {
        self.rerender_on_width
    }

    pub fn rerender_on_height(&self) -> bool {
        self.rerender_on_height
    }

    pub fn can_scroll_past_bottom(&self) -> bool {
        self.can_scroll_past_bottom
    }
}

/// Content collaborator behind a context.
pub trait PanelContent: Send {
    /// Logical content height; may exceed the viewport.
    fn total_content_height(&self) -> usize;

    /// Regenerate content for the freshly bound view.
    fn handle_render(&mut self, view: &mut View) -> Result<()>;
}

/// Fixed text content, enough for banners and simple lists.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    text: String,
}

impl StaticContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl PanelContent for StaticContent {
    fn total_content_height(&self) -> usize {
        self.text.lines().count()
    }

    fn handle_render(&mut self, view: &mut View) -> Result<()> {
        view.set_content(self.text.clone());
        Ok(())
    }
}
