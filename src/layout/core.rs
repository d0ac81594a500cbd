use std::collections::HashMap;

use crate::error::{LayoutError, Result};
use crate::geometry::{Rect, Size};

/// Layout direction for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Space distribution rules for child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Fixed(u16),
    Percent(u8),
    Min(u16),
    Max(u16),
    Flex(u16),
}

/// Unique identifier for layout nodes. Leaf ids double as window names.
pub type NodeId = String;

/// Layout node representation (container or leaf).
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub direction: Direction,
    pub constraints: Vec<Constraint>,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            direction: Direction::Row,
            constraints: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn container(
        id: impl Into<NodeId>,
        direction: Direction,
        constraints: Vec<Constraint>,
        children: Vec<LayoutNode>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            constraints,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Ids of every leaf below (and including) this node, depth first.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_leaves(&mut ids);
        ids
    }

    fn collect_leaves(&self, ids: &mut Vec<NodeId>) {
        if self.is_leaf() {
            ids.push(self.id.clone());
            return;
        }
        for child in &self.children {
            child.collect_leaves(ids);
        }
    }
}

/// Layout tree orchestrator.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub root: LayoutNode,
}

#[derive(Debug, Clone, Copy)]
struct Area {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl LayoutTree {
    pub fn new(root: LayoutNode) -> Self {
        Self { root }
    }

    /// Solve the tree for a terminal size, returning inclusive rects keyed by node id.
    pub fn solve(&self, size: Size) -> Result<HashMap<NodeId, Rect>> {
        if self.root.children.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }

        let mut rects = HashMap::new();
        let area = Area {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        };
        solve_node(&self.root, area, &mut rects);
        Ok(rects)
    }
}

fn solve_node(node: &LayoutNode, area: Area, accum: &mut HashMap<NodeId, Rect>) {
    accum.insert(
        node.id.clone(),
        Rect::from_origin_size(area.x, area.y, area.width, area.height),
    );

    if node.is_leaf() {
        return;
    }

    let axis_length = match node.direction {
        Direction::Row => area.width,
        Direction::Column => area.height,
    };
    let spans = distribute(axis_length, node.children.len(), &node.constraints);

    let mut cursor = match node.direction {
        Direction::Row => area.x,
        Direction::Column => area.y,
    };
    for (child, span) in node.children.iter().zip(spans) {
        let child_area = match node.direction {
            Direction::Row => Area {
                x: cursor,
                width: span,
                ..area
            },
            Direction::Column => Area {
                y: cursor,
                height: span,
                ..area
            },
        };
        solve_node(child, child_area, accum);
        cursor = cursor.saturating_add(span);
    }
}

#[derive(Debug, Clone, Copy)]
struct Track {
    length: u32,
    min: u32,
    max: Option<u32>,
    weight: u32,
}

impl Track {
    fn from_constraint(constraint: Constraint, available: u32) -> Self {
        match constraint {
            Constraint::Fixed(value) => Self::locked(u32::from(value)),
            Constraint::Percent(percent) => {
                let percent = u32::from(percent.min(100));
                Self::locked((available * percent + 50) / 100)
            }
            Constraint::Min(min) => Self {
                length: u32::from(min),
                min: u32::from(min),
                max: None,
                weight: 1,
            },
            Constraint::Max(max) => Self {
                length: 0,
                min: 0,
                max: Some(u32::from(max)),
                weight: 1,
            },
            Constraint::Flex(weight) => Self {
                length: 0,
                min: 0,
                max: None,
                weight: u32::from(weight.max(1)),
            },
        }
    }

    fn locked(value: u32) -> Self {
        Self {
            length: value,
            min: value,
            max: Some(value),
            weight: 0,
        }
    }

    fn room(&self) -> u32 {
        self.max
            .map(|max| max.saturating_sub(self.length))
            .unwrap_or(u32::MAX)
    }
}

/// Split `available` cells between `count` children. Children without an
/// explicit constraint behave as `Flex(1)`. The result never sums past
/// `available`.
fn distribute(available: u16, count: usize, constraints: &[Constraint]) -> Vec<u16> {
    let available = u32::from(available);
    let mut tracks: Vec<Track> = (0..count)
        .map(|idx| {
            let constraint = constraints.get(idx).copied().unwrap_or(Constraint::Flex(1));
            Track::from_constraint(constraint, available)
        })
        .collect();

    let used: u32 = tracks.iter().map(|track| track.length).sum();
    if used > available {
        shrink(&mut tracks, used - available);
    } else {
        grow(&mut tracks, available - used);
    }

    tracks
        .into_iter()
        .map(|track| track.length.min(u32::from(u16::MAX)) as u16)
        .collect()
}

fn shrink(tracks: &mut [Track], mut excess: u32) {
    // Slack above each minimum goes first, then the tail gives way entirely.
    for track in tracks.iter_mut().rev() {
        let take = (track.length - track.min).min(excess);
        track.length -= take;
        excess -= take;
    }
    for track in tracks.iter_mut().rev() {
        let take = track.length.min(excess);
        track.length -= take;
        excess -= take;
    }
}

fn grow(tracks: &mut [Track], mut remaining: u32) {
    while remaining > 0 {
        let total_weight: u32 = tracks
            .iter()
            .filter(|track| track.weight > 0 && track.room() > 0)
            .map(|track| track.weight)
            .sum();
        if total_weight == 0 {
            return;
        }

        let pool = remaining;
        let mut handed_out = 0;
        for track in tracks.iter_mut() {
            if track.weight == 0 || track.room() == 0 {
                continue;
            }
            let share = (pool * track.weight / total_weight)
                .min(track.room())
                .min(remaining - handed_out);
            track.length += share;
            handed_out += share;
        }

        if handed_out == 0 {
            // Rounding left every share at zero; hand out single cells in order.
            for track in tracks.iter_mut() {
                if handed_out == remaining {
                    break;
                }
                if track.weight > 0 && track.room() > 0 {
                    track.length += 1;
                    handed_out += 1;
                }
            }
        }
        remaining -= handed_out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_single_child() {
        assert_eq!(distribute(80, 1, &[]), vec![80]);
    }

    #[test]
    fn flex_weights_split_proportionally() {
        assert_eq!(
            distribute(90, 2, &[Constraint::Flex(2), Constraint::Flex(1)]),
            vec![60, 30]
        );
    }

    #[test]
    fn rounding_leftovers_are_handed_out() {
        let spans = distribute(10, 3, &[]);
        assert_eq!(spans.iter().sum::<u16>(), 10);
        assert_eq!(spans, vec![4, 3, 3]);
    }

    #[test]
    fn overflow_shrinks_tail_first() {
        let spans = distribute(
            5,
            3,
            &[Constraint::Fixed(3), Constraint::Flex(1), Constraint::Fixed(3)],
        );
        assert_eq!(spans, vec![3, 0, 2]);
    }

    #[test]
    fn row_layout_with_mixed_constraints() {
        let root = LayoutNode::container(
            "root",
            Direction::Row,
            vec![
                Constraint::Fixed(20),
                Constraint::Percent(25),
                Constraint::Flex(1),
            ],
            vec![
                LayoutNode::leaf("left"),
                LayoutNode::leaf("middle"),
                LayoutNode::leaf("right"),
            ],
        );

        let rects = LayoutTree::new(root).solve(Size::new(100, 20)).unwrap();

        assert_eq!(rects["left"], Rect::new(0, 0, 19, 19));
        assert_eq!(rects["middle"], Rect::new(20, 0, 44, 19));
        assert_eq!(rects["right"], Rect::new(45, 0, 99, 19));
    }

    #[test]
    fn column_layout_respects_min_and_max() {
        let root = LayoutNode::container(
            "root",
            Direction::Column,
            vec![Constraint::Min(6), Constraint::Max(4), Constraint::Flex(1)],
            vec![
                LayoutNode::leaf("top"),
                LayoutNode::leaf("middle"),
                LayoutNode::leaf("bottom"),
            ],
        );

        let rects = LayoutTree::new(root).solve(Size::new(40, 20)).unwrap();
        let top = rects["top"];
        let middle = rects["middle"];
        let bottom = rects["bottom"];

        assert!(top.height() >= 6);
        assert!(middle.height() <= 4);
        assert!(bottom.height() > 0);
        assert_eq!(top.height() + middle.height() + bottom.height(), 20);
        assert_eq!(middle.y0, top.y1 + 1);
        assert_eq!(bottom.y0, middle.y1 + 1);
    }

    #[test]
    fn empty_root_is_rejected() {
        let tree = LayoutTree::new(LayoutNode::leaf("root"));
        assert!(matches!(
            tree.solve(Size::new(10, 10)),
            Err(LayoutError::EmptyLayout)
        ));
    }
}
