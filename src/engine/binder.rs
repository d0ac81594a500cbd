use crate::context::{Context, ContextId, ContextTree, WidthRerender};
use crate::error::Result;
use crate::geometry::{Rect, Size};
use crate::layout::WindowDimensions;
use crate::view::ViewSurface;

/// Result of binding every controlled context for one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// Contexts whose size change requires a re-render, in traversal order.
    pub rerender: Vec<ContextId>,
    /// Views that were referenced but not created yet.
    pub unknown_views: Vec<String>,
}

fn frame_offset(frame: bool) -> i32 {
    if frame { 0 } else { 1 }
}

/// Outer bounds for a view placed at `rect`.
///
/// A frameless view is grown by one cell per edge so that its content area
/// (outer bounds minus one cell per edge) lines up with `rect`. The result is
/// clamped to the canvas.
pub fn outer_bounds(rect: Rect, frame: bool, size: Size) -> Rect {
    rect.expand(frame_offset(frame)).clamp_to(size)
}

/// Logical content area for a view placed at `rect`, before any clamping.
///
/// Frameless views use `rect` as is; framed views lose one cell per edge to
/// the border.
pub fn content_area(rect: Rect, frame: bool) -> Rect {
    rect.expand(frame_offset(frame) - 1)
}

/// Place every geometry-controlled context, in [`ContextTree::flatten`] order.
///
/// Unknown views are skipped and reported; any other surface error aborts.
pub fn bind_views(
    contexts: &ContextTree,
    dimensions: &WindowDimensions,
    surface: &mut dyn ViewSurface,
) -> Result<BindOutcome> {
    let mut outcome = BindOutcome::default();
    for id in contexts.flatten() {
        let Some(context) = contexts.get(id) else {
            continue;
        };
        if !context.descriptor().has_controlled_bounds() {
            continue;
        }

        match bind_context(context, dimensions, surface) {
            Ok(true) => outcome.rerender.push(id),
            Ok(false) => {}
            Err(err) if err.is_unknown_view() => outcome
                .unknown_views
                .push(context.descriptor().view_name().to_string()),
            Err(err) => return Err(err),
        }
    }
    Ok(outcome)
}

/// Bind one context. Returns whether it must re-render.
fn bind_context(
    context: &Context,
    dimensions: &WindowDimensions,
    surface: &mut dyn ViewSurface,
) -> Result<bool> {
    let descriptor = context.descriptor();
    let view_name = descriptor.view_name();
    let size = surface.size();
    let view = surface.view_mut(view_name)?;

    let Some(rect) = dimensions.get(descriptor.window_name()) else {
        // No slot this pass: keep the view full-size in the background so
        // lazily loaded, size-dependent content is ready when it appears.
        surface
            .set_view(view_name, Rect::canvas(size))?
            .set_visible(false);
        return Ok(false);
    };

    let bounds = outer_bounds(*rect, view.frame(), size);
    let content = content_area(*rect, view.frame());
    let new_width = content.width();
    let new_height = content.height();
    let viewport_height = usize::try_from(new_height).unwrap_or(0);

    let mut must_rerender = false;

    let total_height = context.content().total_content_height();
    let max_origin = if descriptor.can_scroll_past_bottom() {
        total_height
    } else {
        total_height.saturating_sub(viewport_height)
    };
    let old_origin = view.origin_y();
    if old_origin > max_origin {
        view.scroll_up(old_origin - max_origin);
        if view.origin_y() != old_origin && descriptor.rerender_on_height() {
            must_rerender = true;
        }
    }

    if descriptor.rerender_on_width() == WidthRerender::WhenWidthChanges
        && view.width() != new_width
    {
        must_rerender = true;
    }

    if descriptor.rerender_on_height() && view.height() != new_height {
        must_rerender = true;
    }

    let view = surface.set_view(view_name, bounds)?;
    view.set_content_area(content);
    view.set_visible(true);
    Ok(must_rerender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextDescriptor, StaticContent};
    use crate::view::ViewRegistry;

    #[test]
    fn frameless_views_grow_by_one_cell() {
        let size = Size::new(80, 24);
        let rect = Rect::new(2, 2, 10, 10);
        assert_eq!(outer_bounds(rect, false, size), Rect::new(1, 1, 11, 11));
        assert_eq!(outer_bounds(rect, true, size), rect);
    }

    #[test]
    fn outer_bounds_stay_on_the_canvas() {
        let size = Size::new(20, 10);
        let rect = Rect::new(0, 9, 19, 9);
        assert_eq!(outer_bounds(rect, false, size), Rect::new(0, 8, 20, 10));
    }

    #[test]
    fn content_area_ignores_the_canvas_clamp() {
        let rect = Rect::new(0, 0, 79, 23);
        assert_eq!(content_area(rect, false), rect);
        assert_eq!(content_area(rect, true), Rect::new(1, 1, 78, 22));
    }

    #[test]
    fn edge_view_keeps_its_full_viewport() {
        let mut contexts = ContextTree::new();
        let body: Vec<String> = (0..100).map(|idx| idx.to_string()).collect();
        contexts
            .register(
                ContextDescriptor::new("main", "main").with_height_rerender(true),
                StaticContent::new(body.join("\n")),
            )
            .unwrap();
        let mut surface = ViewRegistry::new(Size::new(80, 24));
        let view = surface.prepare_view("main").unwrap();
        view.set_frame(false);
        view.set_origin_y(90);
        let dims = WindowDimensions::from([("main".to_string(), Rect::new(0, 0, 79, 23))]);

        bind_views(&contexts, &dims, &mut surface).unwrap();
        let view = surface.view("main").unwrap();
        assert_eq!(view.bounds(), Rect::new(0, 0, 80, 24));
        assert_eq!((view.width(), view.height()), (80, 24));
        assert_eq!(view.origin_y(), 76);

        let again = bind_views(&contexts, &dims, &mut surface).unwrap();
        assert!(again.rerender.is_empty());
    }

    #[test]
    fn missing_window_stages_view_in_background() {
        let mut contexts = ContextTree::new();
        contexts
            .register(
                ContextDescriptor::new("extras", "extras"),
                StaticContent::default(),
            )
            .unwrap();
        let mut surface = ViewRegistry::new(Size::new(80, 24));
        surface.prepare_view("extras").unwrap();

        let outcome = bind_views(&contexts, &WindowDimensions::new(), &mut surface).unwrap();

        let view = surface.view("extras").unwrap();
        assert!(outcome.rerender.is_empty());
        assert!(!view.is_visible());
        assert_eq!(view.bounds(), Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn uncontrolled_contexts_are_left_alone() {
        let mut contexts = ContextTree::new();
        contexts
            .register(
                ContextDescriptor::new("menu", "menu").with_controlled_bounds(false),
                StaticContent::default(),
            )
            .unwrap();
        let mut surface = ViewRegistry::new(Size::new(80, 24));
        surface.prepare_view("menu").unwrap();
        let dims = WindowDimensions::from([("menu".to_string(), Rect::new(5, 5, 30, 10))]);

        bind_views(&contexts, &dims, &mut surface).unwrap();
        assert_eq!(
            surface.view("menu").unwrap().bounds(),
            crate::view::PLACEHOLDER_BOUNDS
        );
    }
}
