//! Tidy layered layout for pedigree trees.
//!
//! Each generation sits at a fixed offset from the focal individual, leaves are
//! spaced evenly along the other axis, and every inner node is centered between
//! its first and last parent. The result is index-based: the same ancestor can
//! appear in several branches and gets one positioned node per appearance.

use serde::Serialize;
use std::fmt;

use crate::models::{Sex, TreeNode};

/// Default drawing surface width in pixels
pub const DEFAULT_WIDTH: f64 = 900.0;
/// Default drawing surface height in pixels
pub const DEFAULT_HEIGHT: f64 = 600.0;

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Direction generations grow in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Focal individual on the left, ancestors to the right
    #[default]
    LeftToRight,
    /// Focal individual on top, ancestors below
    TopToBottom,
}

impl Orientation {
    /// Parse a config or flag value (`horizontal` / `vertical`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" | "left-to-right" | "ltr" => Some(Orientation::LeftToRight),
            "vertical" | "top-to-bottom" | "ttb" => Some(Orientation::TopToBottom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::LeftToRight => "horizontal",
            Orientation::TopToBottom => "vertical",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Orientation::LeftToRight)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Space reserved around the tree when fitting it to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margin {
    /// Wide side margins leave room for labels beside the outermost nodes.
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 120.0,
            bottom: 20.0,
            left: 120.0,
        }
    }
}

/// One placed appearance of an individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub display_name: String,
    pub sex: Sex,
    /// Generation distance from the focal individual
    pub depth: usize,
    pub position: Position,
    /// Index of the descendant this node is a parent of
    pub parent: Option<usize>,
    pub has_children: bool,
}

impl PositionedNode {
    /// True for the focal individual.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Connection from a descendant (`source`) to one of its parents (`target`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutLink {
    pub source: usize,
    pub target: usize,
}

/// Axis-aligned bounding box of node centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Output of [`TreeLayout::layout`]. Nodes are in pre-order; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PedigreeLayout {
    pub orientation: Orientation,
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<LayoutLink>,
}

impl PedigreeLayout {
    pub fn root(&self) -> Option<&PositionedNode> {
        self.nodes.first()
    }

    /// First appearance of `id`, in pre-order.
    pub fn find(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Endpoints of a link, if both indexes are valid.
    pub fn link_endpoints(&self, link: &LayoutLink) -> Option<(Position, Position)> {
        let source = self.nodes.get(link.source)?;
        let target = self.nodes.get(link.target)?;
        Some((source.position, target.position))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?.position;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.position.x),
            min_y: b.min_y.min(n.position.y),
            max_x: b.max_x.max(n.position.x),
            max_y: b.max_y.max(n.position.y),
        }))
    }

    /// Stretch the layout to fill a `width` x `height` surface inside `margin`.
    ///
    /// Each axis is scaled independently. An axis with no extent (a single
    /// node, or a single chain) is centered.
    pub fn fit(&mut self, width: f64, height: f64, margin: Margin) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let inner_w = (width - margin.left - margin.right).max(0.0);
        let inner_h = (height - margin.top - margin.bottom).max(0.0);

        for node in &mut self.nodes {
            let Position { x, y } = node.position;
            node.position = Position::new(
                margin.left + scale_axis(x, bounds.min_x, bounds.width(), inner_w),
                margin.top + scale_axis(y, bounds.min_y, bounds.height(), inner_h),
            );
        }
    }
}

fn scale_axis(value: f64, min: f64, extent: f64, target: f64) -> f64 {
    if extent > f64::EPSILON {
        (value - min) / extent * target
    } else {
        target / 2.0
    }
}

/// Layered tree layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    pub orientation: Orientation,
    /// Distance between consecutive generations
    pub level_spacing: f64,
    /// Distance between adjacent leaves
    pub sibling_spacing: f64,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            orientation: Orientation::LeftToRight,
            level_spacing: 180.0,
            sibling_spacing: 40.0,
        }
    }
}

impl TreeLayout {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn with_spacing(mut self, level_spacing: f64, sibling_spacing: f64) -> Self {
        self.level_spacing = level_spacing;
        self.sibling_spacing = sibling_spacing;
        self
    }

    /// Place every node of the tree rooted at `root`.
    pub fn layout(&self, root: &TreeNode) -> PedigreeLayout {
        let mut placer = Placer {
            nodes: Vec::with_capacity(root.node_count()),
            links: Vec::new(),
            breadth: Vec::with_capacity(root.node_count()),
            next_leaf: 0,
        };
        placer.place(root);

        let nodes = placer
            .nodes
            .into_iter()
            .zip(placer.breadth)
            .map(|(mut node, slot)| {
                let along = node.depth as f64 * self.level_spacing;
                let across = slot * self.sibling_spacing;
                node.position = match self.orientation {
                    Orientation::LeftToRight => Position::new(along, across),
                    Orientation::TopToBottom => Position::new(across, along),
                };
                node
            })
            .collect();

        PedigreeLayout {
            orientation: self.orientation,
            nodes,
            links: placer.links,
        }
    }
}

struct Placer {
    nodes: Vec<PositionedNode>,
    links: Vec<LayoutLink>,
    /// Position across generations, in leaf slots
    breadth: Vec<f64>,
    next_leaf: usize,
}

impl Placer {
    /// Place nodes in pre-order. Leaves take consecutive slots and a parent sits
    /// midway between its first and last child.
    fn place(&mut self, root: &TreeNode) {
        // First and last child index of each placed node
        let mut spans: Vec<Option<(usize, usize)>> = Vec::new();
        let mut stack: Vec<(&TreeNode, usize, Option<usize>)> = vec![(root, 0, None)];

        while let Some((node, depth, parent)) = stack.pop() {
            let index = self.nodes.len();
            self.nodes.push(PositionedNode {
                id: node.id.clone(),
                display_name: node.display_name.clone(),
                sex: node.sex,
                depth,
                position: Position::default(),
                parent,
                has_children: !node.children.is_empty(),
            });
            spans.push(None);

            let slot = if node.children.is_empty() {
                let slot = self.next_leaf as f64;
                self.next_leaf += 1;
                slot
            } else {
                0.0
            };
            self.breadth.push(slot);

            if let Some(source) = parent {
                self.links.push(LayoutLink {
                    source,
                    target: index,
                });
                spans[source].get_or_insert((index, index)).1 = index;
            }
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, depth + 1, Some(index))),
            );
        }

        // Children always follow their parent in pre-order
        for index in (0..self.nodes.len()).rev() {
            if let Some((first, last)) = spans[index] {
                self.breadth[index] = (self.breadth[first] + self.breadth[last]) / 2.0;
            }
        }
    }
}
