//! Colors and sizes for pedigree drawings.

use crate::models::Sex;

/// Node fill colors
pub mod node {
    /// Focal individual (tree root)
    pub const FOCAL: &str = "#4caf50";
    pub const MALE: &str = "#1976d2";
    pub const FEMALE: &str = "#e91e63";
    pub const UNKNOWN: &str = "#9e9e9e";
    /// Outline drawn around every node
    pub const STROKE: &str = "#ffffff";
}

/// Link colors
pub mod link {
    pub const STROKE: &str = "#cccccc";
}

/// Text colors
pub mod text {
    pub const LABEL: &str = "#333333";
    pub const ERROR: &str = "#d32f2f";
}

/// Surface background
pub const BACKGROUND: &str = "#ffffff";

/// Node circle radius
pub const NODE_RADIUS: f64 = 10.0;
/// Gap between a node's center and its label
pub const LABEL_OFFSET: f64 = 13.0;
/// Label font size in pixels
pub const LABEL_FONT_SIZE: f64 = 12.0;
/// Link stroke width
pub const LINK_WIDTH: f64 = 1.5;
/// Node outline width
pub const NODE_STROKE_WIDTH: f64 = 1.5;

/// Fill color for a node.
pub fn node_color(is_root: bool, sex: Sex) -> &'static str {
    if is_root {
        return node::FOCAL;
    }
    match sex {
        Sex::Male => node::MALE,
        Sex::Female => node::FEMALE,
        Sex::Unknown => node::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_always_focal_color() {
        assert_eq!(node_color(true, Sex::Male), node::FOCAL);
        assert_eq!(node_color(true, Sex::Unknown), node::FOCAL);
    }

    #[test]
    fn test_node_color_by_sex() {
        assert_eq!(node_color(false, Sex::Male), node::MALE);
        assert_eq!(node_color(false, Sex::Female), node::FEMALE);
        assert_eq!(node_color(false, Sex::Unknown), node::UNKNOWN);
    }
}
