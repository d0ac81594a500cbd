use std::collections::HashMap;

use blake3::Hash;

use crate::error::{LayoutError, Result};
use crate::geometry::{Rect, Size};

/// Bounds given to a view that is created ahead of its first real layout.
pub const PLACEHOLDER_BOUNDS: Rect = Rect::new(0, 0, 10, 10);

/// A named drawable slot on the terminal.
///
/// The content area defaults to the outer bounds shrunk by one cell per edge,
/// which is where framed views draw their border. A layout pass may record a
/// different logical area when the outer bounds were clipped to the screen.
#[derive(Debug, Clone)]
pub struct View {
    name: String,
    bounds: Rect,
    content_area: Option<Rect>,
    frame: bool,
    visible: bool,
    origin_y: usize,
    content: String,
    hash: Option<Hash>,
    dirty: bool,
}

impl View {
    fn new(name: &str, bounds: Rect) -> Self {
        Self {
            name: name.to_string(),
            bounds,
            content_area: None,
            frame: true,
            visible: true,
            origin_y: 0,
            content: String::new(),
            hash: None,
            dirty: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        if self.bounds != bounds {
            self.bounds = bounds;
            self.content_area = None;
            self.dirty = true;
        }
    }

    pub fn frame(&self) -> bool {
        self.frame
    }

    pub fn set_frame(&mut self, frame: bool) {
        if self.frame != frame {
            self.frame = frame;
            self.dirty = true;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    /// Width of the content area.
    pub fn width(&self) -> i32 {
        self.content_rect().width()
    }

    /// Height of the content area.
    pub fn height(&self) -> i32 {
        self.content_rect().height()
    }

    pub fn content_rect(&self) -> Rect {
        self.content_area.unwrap_or_else(|| self.bounds.expand(-1))
    }

    /// Record the logical content area, which may extend past the on-screen
    /// bounds. Cleared again when the bounds change.
    pub fn set_content_area(&mut self, area: Rect) {
        if self.content_rect() != area {
            self.dirty = true;
        }
        self.content_area = Some(area);
    }

    pub fn origin_y(&self) -> usize {
        self.origin_y
    }

    pub fn set_origin_y(&mut self, origin_y: usize) {
        if self.origin_y != origin_y {
            self.origin_y = origin_y;
            self.dirty = true;
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.set_origin_y(self.origin_y.saturating_sub(lines));
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the buffer. Returns `true` when the content actually changed.
    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        let new_hash = blake3::hash(content.as_bytes());
        if self.hash == Some(new_hash) {
            return false;
        }
        self.content = content;
        self.hash = Some(new_hash);
        self.dirty = true;
        true
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Terminal-control operations a layout pass relies on.
pub trait ViewSurface {
    /// Current terminal size.
    fn size(&self) -> Size;

    /// Look a view up by name. Fails with [`LayoutError::UnknownView`] when it
    /// was never created.
    fn view(&self, name: &str) -> Result<&View>;

    fn view_mut(&mut self, name: &str) -> Result<&mut View>;

    /// Create the view if needed, then move and resize it to `bounds`.
    fn set_view(&mut self, name: &str, bounds: Rect) -> Result<&mut View>;

    /// Raise a view to the top of the stacking order.
    fn set_view_on_top(&mut self, name: &str) -> Result<()>;

    fn set_current_view(&mut self, name: &str) -> Result<()>;

    fn current_view(&self) -> Option<&str>;
}

/// In-memory surface keeping every view ever created plus the stacking order.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    size: Size,
    entries: HashMap<String, View>,
    stack: Vec<String>,
    current: Option<String>,
    full_redraw: bool,
}

impl ViewRegistry {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            full_redraw: true,
            ..Self::default()
        }
    }

    /// Record a terminal resize. Every view is redrawn on the next flush.
    pub fn resize(&mut self, size: Size) {
        if self.size == size {
            return;
        }
        self.size = size;
        self.full_redraw = true;
        for view in self.entries.values_mut() {
            view.dirty = true;
        }
    }

    /// Create a view with placeholder bounds so it exists before its first
    /// real layout.
    pub fn prepare_view(&mut self, name: &str) -> Result<&mut View> {
        self.set_view(name, PLACEHOLDER_BOUNDS)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// View names, bottom of the stack first.
    pub fn stacking_order(&self) -> &[String] {
        &self.stack
    }

    /// Drain dirty state, returning visible views bottom to top plus whether
    /// the whole screen must be cleared first.
    pub fn take_dirty(&mut self) -> (bool, Vec<View>) {
        let full_redraw = std::mem::take(&mut self.full_redraw);
        let any_dirty = self.entries.values().any(|view| view.dirty);
        if !full_redraw && !any_dirty {
            return (false, Vec::new());
        }

        // A hidden or moved view can expose whatever sits beneath it, so any
        // change repaints the visible stack.
        let views = self
            .stack
            .iter()
            .filter_map(|name| self.entries.get(name))
            .filter(|view| view.visible)
            .cloned()
            .collect();
        for view in self.entries.values_mut() {
            view.dirty = false;
        }
        (true, views)
    }
}

impl ViewSurface for ViewRegistry {
    fn size(&self) -> Size {
        self.size
    }

    fn view(&self, name: &str) -> Result<&View> {
        self.entries
            .get(name)
            .ok_or_else(|| LayoutError::UnknownView(name.to_string()))
    }

    fn view_mut(&mut self, name: &str) -> Result<&mut View> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| LayoutError::UnknownView(name.to_string()))
    }

    fn set_view(&mut self, name: &str, bounds: Rect) -> Result<&mut View> {
        if bounds.x0 > bounds.x1 || bounds.y0 > bounds.y1 {
            return Err(LayoutError::InvalidBounds {
                view: name.to_string(),
                bounds,
            });
        }

        if !self.entries.contains_key(name) {
            self.stack.push(name.to_string());
        }
        let view = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| View::new(name, bounds));
        view.set_bounds(bounds);
        Ok(view)
    }

    fn set_view_on_top(&mut self, name: &str) -> Result<()> {
        let idx = self
            .stack
            .iter()
            .position(|entry| entry == name)
            .ok_or_else(|| LayoutError::UnknownView(name.to_string()))?;
        let entry = self.stack.remove(idx);
        self.stack.push(entry);
        self.full_redraw = true;
        Ok(())
    }

    fn set_current_view(&mut self, name: &str) -> Result<()> {
        if !self.entries.contains_key(name) {
            return Err(LayoutError::UnknownView(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    fn current_view(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ViewRegistry {
        ViewRegistry::new(Size::new(80, 24))
    }

    #[test]
    fn unknown_views_are_reported() {
        let registry = registry();
        let err = registry.view("files").unwrap_err();
        assert!(err.is_unknown_view());
    }

    #[test]
    fn set_view_creates_then_moves() {
        let mut registry = registry();
        registry.set_view("files", Rect::new(0, 0, 20, 10)).unwrap();
        registry.set_view("files", Rect::new(1, 1, 21, 11)).unwrap();

        let view = registry.view("files").unwrap();
        assert_eq!(view.bounds(), Rect::new(1, 1, 21, 11));
        assert_eq!(view.width(), 19);
        assert_eq!(view.height(), 9);
        assert_eq!(registry.stacking_order(), ["files".to_string()]);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut registry = registry();
        let err = registry.set_view("files", Rect::new(5, 0, 4, 3)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidBounds { .. }));
    }

    #[test]
    fn content_changes_are_detected() {
        let mut registry = registry();
        registry.prepare_view("main").unwrap();
        registry.take_dirty();

        let view = registry.view_mut("main").unwrap();
        assert!(view.set_content("hello"));
        assert!(!view.set_content("hello"));

        let (_, dirty) = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        let (_, again) = registry.take_dirty();
        assert!(again.is_empty());
    }

    #[test]
    fn restacking_moves_view_to_top() {
        let mut registry = registry();
        registry.prepare_view("a").unwrap();
        registry.prepare_view("b").unwrap();
        registry.set_view_on_top("a").unwrap();
        assert_eq!(registry.stacking_order(), ["b".to_string(), "a".to_string()]);
        assert!(registry.set_view_on_top("missing").unwrap_err().is_unknown_view());
    }

    #[test]
    fn content_area_survives_until_the_next_move() {
        let mut registry = registry();
        registry
            .set_view("main", Rect::new(0, 0, 80, 24))
            .unwrap()
            .set_content_area(Rect::new(0, 0, 79, 23));
        let view = registry.view("main").unwrap();
        assert_eq!((view.width(), view.height()), (80, 24));

        registry.take_dirty();
        registry.set_view("main", Rect::new(0, 0, 80, 24)).unwrap();
        assert_eq!(registry.view("main").unwrap().width(), 80);
        assert!(!registry.view("main").unwrap().is_dirty());

        registry.set_view("main", Rect::new(0, 0, 40, 12)).unwrap();
        let view = registry.view("main").unwrap();
        assert_eq!(view.content_rect(), Rect::new(1, 1, 39, 11));
    }

    #[test]
    fn scroll_up_saturates() {
        let mut registry = registry();
        let view = registry.prepare_view("main").unwrap();
        view.set_origin_y(3);
        view.scroll_up(10);
        assert_eq!(view.origin_y(), 0);
    }
}
