use std::collections::HashMap;

use crate::error::{LayoutError, Result};

use super::descriptor::{ContextDescriptor, PanelContent};

/// Stable handle to a registered context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

/// A registered context: immutable descriptor plus its content collaborator.
pub struct Context {
    descriptor: ContextDescriptor,
    content: Box<dyn PanelContent>,
}

impl Context {
    pub fn descriptor(&self) -> &ContextDescriptor {
        &self.descriptor
    }

    pub fn content(&self) -> &dyn PanelContent {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> &mut dyn PanelContent {
        self.content.as_mut()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Every context the application registered at startup, possibly nested.
///
/// [`ContextTree::flatten`] is the single traversal order used by binding and
/// by every filter, so bounds and visibility come out the same on each pass.
#[derive(Debug, Default)]
pub struct ContextTree {
    contexts: Vec<Context>,
    children: Vec<Vec<ContextId>>,
    roots: Vec<ContextId>,
    by_view: HashMap<String, ContextId>,
}

impl ContextTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level context.
    pub fn register<C>(&mut self, descriptor: ContextDescriptor, content: C) -> Result<ContextId>
    where
        C: PanelContent + 'static,
    {
        let id = self.insert(descriptor, Box::new(content))?;
        self.roots.push(id);
        Ok(id)
    }

    /// Register a context nested under `parent`.
    pub fn register_child<C>(
        &mut self,
        parent: ContextId,
        descriptor: ContextDescriptor,
        content: C,
    ) -> Result<ContextId>
    where
        C: PanelContent + 'static,
    {
        if parent.0 >= self.contexts.len() {
            return Err(LayoutError::UnknownContext(format!("#{}", parent.0)));
        }
        let id = self.insert(descriptor, Box::new(content))?;
        self.children[parent.0].push(id);
        Ok(id)
    }

    fn insert(
        &mut self,
        descriptor: ContextDescriptor,
        content: Box<dyn PanelContent>,
    ) -> Result<ContextId> {
        let view_name = descriptor.view_name().to_string();
        if self.by_view.contains_key(&view_name) {
            return Err(LayoutError::DuplicateContext(view_name));
        }
        let id = ContextId(self.contexts.len());
        self.contexts.push(Context {
            descriptor,
            content,
        });
        self.children.push(Vec::new());
        self.by_view.insert(view_name, id);
        Ok(id)
    }

    pub fn get(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.0)
    }

    pub fn get_mut(&mut self, id: ContextId) -> Option<&mut Context> {
        self.contexts.get_mut(id.0)
    }

    pub fn descriptor(&self, id: ContextId) -> Option<&ContextDescriptor> {
        self.get(id).map(Context::descriptor)
    }

    pub fn by_view_name(&self, view_name: &str) -> Option<ContextId> {
        self.by_view.get(view_name).copied()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Pre-order traversal: each root in registration order, followed by its
    /// children.
    pub fn flatten(&self) -> Vec<ContextId> {
        let mut order = Vec::with_capacity(self.contexts.len());
        let mut pending: Vec<ContextId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            order.push(id);
            pending.extend(self.children[id.0].iter().rev().copied());
        }
        order
    }

    pub fn controlled_contexts(&self) -> Vec<ContextId> {
        self.filter(ContextDescriptor::has_controlled_bounds)
    }

    /// Persistent and temporary popups, hidden whenever the repository changes.
    pub fn popup_contexts(&self) -> Vec<ContextId> {
        self.filter(|descriptor| descriptor.kind().is_popup())
    }

    /// Contexts sharing a window with others; only the occupant is shown.
    pub fn transient_contexts(&self) -> Vec<ContextId> {
        self.filter(ContextDescriptor::is_transient)
    }

    /// First context in traversal order living in `window_name`.
    pub fn first_in_window(&self, window_name: &str) -> Option<ContextId> {
        self.flatten()
            .into_iter()
            .find(|id| self.contexts[id.0].descriptor.window_name() == window_name)
    }

    fn filter(&self, keep: impl Fn(&ContextDescriptor) -> bool) -> Vec<ContextId> {
        self.flatten()
            .into_iter()
            .filter(|id| keep(&self.contexts[id.0].descriptor))
            .collect()
    }
}
