//! Pedigree visualization.
//!
//! Platform-agnostic drawing logic shared by the CLI (`tree --svg`) and the
//! browser viewer.
//!
//! - `layout`: tidy layered tree layout
//! - `render`: backend-neutral drawing commands and the SVG writer
//! - `theme`: node and link colors
//! - `tree_view`: per-view state with stale-response protection

pub mod layout;
pub mod render;
pub mod theme;
pub mod tree_view;

pub use layout::{
    Bounds, DEFAULT_HEIGHT, DEFAULT_WIDTH, LayoutLink, Margin, Orientation, PedigreeLayout,
    Position, PositionedNode, TreeLayout,
};
pub use render::{
    PathPoint, RenderCommand, TextAlign, TextBaseline, render_layout, render_message, to_svg,
};
pub use tree_view::TreeView;

use crate::models::TreeNode;

/// Lay out `root` and fit it to a `width` x `height` surface with default margins.
pub fn render_tree(
    root: &TreeNode,
    orientation: Orientation,
    width: f64,
    height: f64,
) -> Vec<RenderCommand> {
    let mut layout = TreeLayout::new(orientation).layout(root);
    layout.fit(width, height, Margin::default());
    render_layout(&layout)
}

/// Standalone SVG for the tree rooted at `root`.
pub fn tree_to_svg(root: &TreeNode, orientation: Orientation, width: f64, height: f64) -> String {
    to_svg(&render_tree(root, orientation, width, height), width, height)
}
