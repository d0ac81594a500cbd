//! Window geometry resolution.
//!
//! A resolver turns the terminal size and the two banner strings into a fresh
//! [`WindowDimensions`] map every pass. Windows left out of the map are staged
//! in the background by the binder.

use std::collections::HashMap;

use crate::geometry::{Rect, Size};
use crate::width::display_width;

use super::core::{Constraint, Direction, LayoutNode, LayoutTree};

/// Window name to resolved rectangle. Rebuilt from scratch on every pass.
pub type WindowDimensions = HashMap<String, Rect>;

pub const STATUS_WINDOW: &str = "status";
pub const FILES_WINDOW: &str = "files";
pub const BRANCHES_WINDOW: &str = "branches";
pub const COMMITS_WINDOW: &str = "commits";
pub const STASH_WINDOW: &str = "stash";
pub const MAIN_WINDOW: &str = "main";
pub const SECONDARY_WINDOW: &str = "secondary";
pub const EXTRAS_WINDOW: &str = "extras";
pub const APP_STATUS_WINDOW: &str = "appStatus";
pub const OPTIONS_WINDOW: &str = "options";
pub const INFORMATION_WINDOW: &str = "information";

/// Computes window rectangles for the current terminal.
///
/// Implementations must be deterministic and keep no state between calls.
pub trait GeometryResolver {
    fn resolve(&self, size: Size, information: &str, app_status: &str) -> WindowDimensions;
}

impl<F> GeometryResolver for F
where
    F: Fn(Size, &str, &str) -> WindowDimensions,
{
    fn resolve(&self, size: Size, information: &str, app_status: &str) -> WindowDimensions {
        self(size, information, app_status)
    }
}

/// Knobs for [`WindowArrangement`].
#[derive(Debug, Clone)]
pub struct ArrangementConfig {
    /// Side column windows, top to bottom.
    pub side_windows: Vec<(String, Constraint)>,
    /// Share of the terminal width given to the side column.
    pub side_percent: u8,
    /// Show the secondary window next to main.
    pub split_main: bool,
    /// Height of the extras window under main, `None` hides it.
    pub extras_height: Option<u16>,
    /// Reserve the last row for app status, options and information.
    pub bottom_line: bool,
}

impl Default for ArrangementConfig {
    fn default() -> Self {
        Self {
            side_windows: vec![
                (STATUS_WINDOW.to_string(), Constraint::Fixed(3)),
                (FILES_WINDOW.to_string(), Constraint::Flex(1)),
                (BRANCHES_WINDOW.to_string(), Constraint::Flex(1)),
                (COMMITS_WINDOW.to_string(), Constraint::Flex(1)),
                (STASH_WINDOW.to_string(), Constraint::Fixed(3)),
            ],
            side_percent: 33,
            split_main: false,
            extras_height: None,
            bottom_line: true,
        }
    }
}

/// Default resolver: a side column, the main area and a one-line bottom bar
/// whose reserved widths follow the banner strings.
#[derive(Debug, Clone, Default)]
pub struct WindowArrangement {
    config: ArrangementConfig,
}

impl WindowArrangement {
    pub fn new(config: ArrangementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArrangementConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ArrangementConfig {
        &mut self.config
    }

    fn tree(&self, information: &str, app_status: &str) -> LayoutTree {
        let side = LayoutNode::container(
            "layout:side",
            Direction::Column,
            self.config
                .side_windows
                .iter()
                .map(|(_, constraint)| *constraint)
                .collect(),
            self.config
                .side_windows
                .iter()
                .map(|(name, _)| LayoutNode::leaf(name.clone()))
                .collect(),
        );

        let main_area = if self.config.split_main {
            LayoutNode::container(
                "layout:main-area",
                Direction::Row,
                vec![Constraint::Flex(1), Constraint::Flex(1)],
                vec![
                    LayoutNode::leaf(MAIN_WINDOW),
                    LayoutNode::leaf(SECONDARY_WINDOW),
                ],
            )
        } else {
            LayoutNode::leaf(MAIN_WINDOW)
        };

        let main_column = match self.config.extras_height {
            Some(height) => LayoutNode::container(
                "layout:main-column",
                Direction::Column,
                vec![Constraint::Flex(1), Constraint::Fixed(height)],
                vec![main_area, LayoutNode::leaf(EXTRAS_WINDOW)],
            ),
            None => LayoutNode::container(
                "layout:main-column",
                Direction::Column,
                vec![Constraint::Flex(1)],
                vec![main_area],
            ),
        };

        let body = LayoutNode::container(
            "layout:body",
            Direction::Row,
            vec![
                Constraint::Percent(self.config.side_percent),
                Constraint::Flex(1),
            ],
            vec![side, main_column],
        );

        if !self.config.bottom_line {
            return LayoutTree::new(LayoutNode::container(
                "layout:root",
                Direction::Column,
                vec![Constraint::Flex(1)],
                vec![body],
            ));
        }

        let status_width = match display_width(app_status) {
            0 => 0,
            width => width + 1,
        };
        let bottom = LayoutNode::container(
            "layout:bottom",
            Direction::Row,
            vec![
                Constraint::Fixed(clamp_u16(status_width)),
                Constraint::Flex(1),
                Constraint::Fixed(clamp_u16(display_width(information))),
            ],
            vec![
                LayoutNode::leaf(APP_STATUS_WINDOW),
                LayoutNode::leaf(OPTIONS_WINDOW),
                LayoutNode::leaf(INFORMATION_WINDOW),
            ],
        );

        LayoutTree::new(LayoutNode::container(
            "layout:root",
            Direction::Column,
            vec![Constraint::Flex(1), Constraint::Fixed(1)],
            vec![body, bottom],
        ))
    }
}

impl GeometryResolver for WindowArrangement {
    fn resolve(&self, size: Size, information: &str, app_status: &str) -> WindowDimensions {
        let tree = self.tree(information, app_status);
        let leaves = tree.root.leaf_ids();
        let Ok(mut solved) = tree.solve(size) else {
            return WindowDimensions::new();
        };

        leaves
            .into_iter()
            .filter_map(|name| {
                let rect = solved.remove(&name)?;
                (!rect.is_empty()).then_some((name, rect))
            })
            .collect()
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
