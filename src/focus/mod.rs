//! Focus stack and window ownership.
//!
//! [`FocusStack`] tracks which context is active; [`WindowAssignments`] is the
//! authority deciding which view currently occupies a shared window.

use std::collections::HashMap;

use crate::context::{ContextId, ContextTree};
use crate::error::{LayoutError, Result};
use crate::view::ViewSurface;

/// Window name to the view name currently occupying it.
#[derive(Debug, Default, Clone)]
pub struct WindowAssignments {
    assignments: HashMap<String, String>,
}

impl WindowAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, window_name: impl Into<String>, view_name: impl Into<String>) {
        self.assignments.insert(window_name.into(), view_name.into());
    }

    pub fn clear(&mut self, window_name: &str) {
        self.assignments.remove(window_name);
    }

    /// The occupant of `window_name`: the explicit assignment if any, else the
    /// first context registered in that window.
    pub fn view_for_window(&self, window_name: &str, contexts: &ContextTree) -> Option<String> {
        if let Some(view) = self.assignments.get(window_name) {
            return Some(view.clone());
        }
        contexts
            .first_in_window(window_name)
            .and_then(|id| contexts.descriptor(id))
            .map(|descriptor| descriptor.view_name().to_string())
    }
}

/// Active contexts, bottom first. The top entry owns keyboard focus.
///
/// Activating a normal context replaces the whole stack; popups stack on top
/// of whatever is active.
#[derive(Debug, Default, Clone)]
pub struct FocusStack {
    stack: Vec<ContextId>,
}

impl FocusStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ContextId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.stack.contains(&id)
    }

    pub fn activate(
        &mut self,
        id: ContextId,
        contexts: &ContextTree,
        windows: &mut WindowAssignments,
        surface: &mut dyn ViewSurface,
    ) -> Result<()> {
        let descriptor = contexts
            .descriptor(id)
            .ok_or_else(|| LayoutError::UnknownContext(format!("#{id:?}")))?;

        if descriptor.kind().is_popup() {
            self.stack.retain(|entry| *entry != id);
            self.stack.push(id);
        } else {
            let dropped: Vec<ContextId> = self
                .stack
                .drain(..)
                .filter(|entry| *entry != id)
                .collect();
            hide_popups(&dropped, contexts, surface)?;
            self.stack.push(id);
        }

        windows.assign(descriptor.window_name(), descriptor.view_name());
        let view_name = descriptor.view_name();
        if descriptor.kind().is_popup() {
            surface.view_mut(view_name)?.set_visible(true);
            surface.set_view_on_top(view_name)?;
        }
        surface.set_current_view(view_name)
    }

    /// Close the top context and re-activate the one beneath it. The last
    /// remaining context is never popped.
    pub fn pop(
        &mut self,
        contexts: &ContextTree,
        windows: &mut WindowAssignments,
        surface: &mut dyn ViewSurface,
    ) -> Result<Option<ContextId>> {
        if self.stack.len() <= 1 {
            return Ok(None);
        }
        let Some(popped) = self.stack.pop() else {
            return Ok(None);
        };
        hide_popups(&[popped], contexts, surface)?;
        if let Some(next) = self.current() {
            self.activate(next, contexts, windows, surface)?;
        }
        Ok(Some(popped))
    }
}

fn hide_popups(
    ids: &[ContextId],
    contexts: &ContextTree,
    surface: &mut dyn ViewSurface,
) -> Result<()> {
    for descriptor in ids.iter().filter_map(|id| contexts.descriptor(*id)) {
        if !descriptor.kind().is_popup() {
            continue;
        }
        match surface.view_mut(descriptor.view_name()) {
            Ok(view) => view.set_visible(false),
            Err(err) if err.is_unknown_view() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
