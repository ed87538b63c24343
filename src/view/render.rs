//! Backend-neutral drawing commands for pedigree layouts.
//!
//! A [`PedigreeLayout`] is turned into a flat list of [`RenderCommand`]s that a
//! canvas (browser) or the SVG writer in this module can execute in order.
//! Links are drawn first so node circles sit on top of them.

use serde::Serialize;
use std::fmt::Write;

use super::layout::{Orientation, PedigreeLayout, Position, PositionedNode};
use super::theme;

/// A drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Fill the whole surface
    Clear { color: String },
    /// Stroke an open path
    StrokePath {
        points: Vec<PathPoint>,
        color: String,
        line_width: f64,
    },
    /// Filled and outlined circle
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        fill: String,
        stroke: String,
        line_width: f64,
    },
    /// Single-line label
    Text {
        x: f64,
        y: f64,
        text: String,
        color: String,
        font_size: f64,
        align: TextAlign,
        baseline: TextBaseline,
    },
}

/// A path segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathPoint {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    /// Cubic bezier with two control points
    CubicTo {
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    },
}

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    fn svg_anchor(&self) -> &'static str {
        match self {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        }
    }
}

/// Vertical text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl TextBaseline {
    fn svg_baseline(&self) -> &'static str {
        match self {
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "central",
            TextBaseline::Bottom => "text-after-edge",
        }
    }
}

/// Smooth curve from a descendant to one of its parents.
///
/// Both control points sit halfway along the generation axis, so the curve
/// leaves and enters each node parallel to that axis.
pub fn link_path(source: Position, target: Position, orientation: Orientation) -> Vec<PathPoint> {
    let curve = match orientation {
        Orientation::LeftToRight => {
            let mid = (source.x + target.x) / 2.0;
            PathPoint::CubicTo {
                c1x: mid,
                c1y: source.y,
                c2x: mid,
                c2y: target.y,
                x: target.x,
                y: target.y,
            }
        }
        Orientation::TopToBottom => {
            let mid = (source.y + target.y) / 2.0;
            PathPoint::CubicTo {
                c1x: source.x,
                c1y: mid,
                c2x: target.x,
                c2y: mid,
                x: target.x,
                y: target.y,
            }
        }
    };
    vec![
        PathPoint::MoveTo {
            x: source.x,
            y: source.y,
        },
        curve,
    ]
}

pub fn render_link(source: Position, target: Position, orientation: Orientation) -> RenderCommand {
    RenderCommand::StrokePath {
        points: link_path(source, target, orientation),
        color: theme::link::STROKE.to_string(),
        line_width: theme::LINK_WIDTH,
    }
}

/// Circle plus label for one node.
///
/// Labels go on the side away from the node's parents: left of nodes that have
/// parents drawn, right of leaves.
pub fn render_node(node: &PositionedNode) -> Vec<RenderCommand> {
    let Position { x, y } = node.position;
    let (label_x, align) = if node.has_children {
        (x - theme::LABEL_OFFSET, TextAlign::Right)
    } else {
        (x + theme::LABEL_OFFSET, TextAlign::Left)
    };

    vec![
        RenderCommand::Circle {
            cx: x,
            cy: y,
            radius: theme::NODE_RADIUS,
            fill: theme::node_color(node.is_root(), node.sex).to_string(),
            stroke: theme::node::STROKE.to_string(),
            line_width: theme::NODE_STROKE_WIDTH,
        },
        RenderCommand::Text {
            x: label_x,
            y,
            text: node.display_name.clone(),
            color: theme::text::LABEL.to_string(),
            font_size: theme::LABEL_FONT_SIZE,
            align,
            baseline: TextBaseline::Middle,
        },
    ]
}

/// Every command needed to draw `layout`, background first.
pub fn render_layout(layout: &PedigreeLayout) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(1 + layout.links.len() + layout.nodes.len() * 2);
    commands.push(RenderCommand::Clear {
        color: theme::BACKGROUND.to_string(),
    });

    for link in &layout.links {
        if let Some((source, target)) = layout.link_endpoints(link) {
            commands.push(render_link(source, target, layout.orientation));
        }
    }
    for node in &layout.nodes {
        commands.extend(render_node(node));
    }
    commands
}

/// A centered message in place of a tree (loading, errors, empty states).
pub fn render_message(
    width: f64,
    height: f64,
    message: &str,
    is_error: bool,
) -> Vec<RenderCommand> {
    let color = if is_error {
        theme::text::ERROR
    } else {
        theme::text::LABEL
    };
    vec![
        RenderCommand::Clear {
            color: theme::BACKGROUND.to_string(),
        },
        RenderCommand::Text {
            x: width / 2.0,
            y: height / 2.0,
            text: message.to_string(),
            color: color.to_string(),
            font_size: theme::LABEL_FONT_SIZE,
            align: TextAlign::Center,
            baseline: TextBaseline::Middle,
        },
    ]
}

/// Serialize commands as a standalone SVG document.
pub fn to_svg(commands: &[RenderCommand], width: f64, height: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg""#,
            r#" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        ),
        w = num(width),
        h = num(height)
    );

    for command in commands {
        match command {
            RenderCommand::Clear { color } => {
                let _ = writeln!(
                    out,
                    r#"  <rect width="100%" height="100%" fill="{}"/>"#,
                    escape(color)
                );
            }
            RenderCommand::StrokePath {
                points,
                color,
                line_width,
            } => {
                let _ = writeln!(
                    out,
                    r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                    path_data(points),
                    escape(color),
                    num(*line_width)
                );
            }
            RenderCommand::Circle {
                cx,
                cy,
                radius,
                fill,
                stroke,
                line_width,
            } => {
                let _ = writeln!(
                    out,
                    r#"  <circle cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
                    num(*cx),
                    num(*cy),
                    num(*radius),
                    escape(fill),
                    escape(stroke),
                    num(*line_width)
                );
            }
            RenderCommand::Text {
                x,
                y,
                text,
                color,
                font_size,
                align,
                baseline,
            } => {
                let _ = writeln!(
                    out,
                    concat!(
                        r#"  <text x="{}" y="{}" fill="{}" font-size="{}""#,
                        r#" font-family="sans-serif" text-anchor="{}" dominant-baseline="{}">"#,
                        r#"{}</text>"#
                    ),
                    num(*x),
                    num(*y),
                    escape(color),
                    num(*font_size),
                    align.svg_anchor(),
                    baseline.svg_baseline(),
                    escape(text)
                );
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

fn path_data(points: &[PathPoint]) -> String {
    points
        .iter()
        .map(|p| match p {
            PathPoint::MoveTo { x, y } => format!("M{},{}", num(*x), num(*y)),
            PathPoint::LineTo { x, y } => format!("L{},{}", num(*x), num(*y)),
            PathPoint::CubicTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => format!(
                "C{},{} {},{} {},{}",
                num(*c1x),
                num(*c1y),
                num(*c2x),
                num(*c2y),
                num(*x),
                num(*y)
            ),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sex, TreeNode};
    use crate::view::layout::TreeLayout;

    fn two_generation_layout() -> PedigreeLayout {
        let mut root = TreeNode::leaf("X", "Estrela", Sex::Female);
        root.children = vec![
            TreeNode::leaf("A", "Trovão", Sex::Male),
            TreeNode::leaf("B", "Brisa", Sex::Female),
        ];
        TreeLayout::default().layout(&root)
    }

    #[test]
    fn test_link_path_horizontal_midpoints() {
        let path = link_path(
            Position::new(0.0, 10.0),
            Position::new(100.0, 50.0),
            Orientation::LeftToRight,
        );
        assert_eq!(path[0], PathPoint::MoveTo { x: 0.0, y: 10.0 });
        assert_eq!(
            path[1],
            PathPoint::CubicTo {
                c1x: 50.0,
                c1y: 10.0,
                c2x: 50.0,
                c2y: 50.0,
                x: 100.0,
                y: 50.0
            }
        );
    }

    #[test]
    fn test_link_path_vertical_midpoints() {
        let path = link_path(
            Position::new(10.0, 0.0),
            Position::new(50.0, 100.0),
            Orientation::TopToBottom,
        );
        assert!(matches!(
            path[1],
            PathPoint::CubicTo { c1x, c1y, c2x, .. } if c1x == 10.0 && c1y == 50.0 && c2x == 50.0
        ));
    }

    #[test]
    fn test_render_layout_order_and_colors() {
        let layout = two_generation_layout();
        let commands = render_layout(&layout);

        assert!(matches!(commands[0], RenderCommand::Clear { .. }));
        assert!(matches!(commands[1], RenderCommand::StrokePath { .. }));
        assert!(matches!(commands[2], RenderCommand::StrokePath { .. }));

        let fills: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Circle { fill, .. } => Some(fill.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fills, vec![theme::node::FOCAL, theme::node::MALE, theme::node::FEMALE]);
    }

    #[test]
    fn test_label_placement() {
        let layout = two_generation_layout();
        let root = &layout.nodes[0];
        let leaf = &layout.nodes[1];

        match &render_node(root)[1] {
            RenderCommand::Text { x, align, .. } => {
                assert_eq!(*align, TextAlign::Right);
                assert_eq!(*x, root.position.x - theme::LABEL_OFFSET);
            }
            other => panic!("expected text, got {:?}", other),
        }
        match &render_node(leaf)[1] {
            RenderCommand::Text { x, align, .. } => {
                assert_eq!(*align, TextAlign::Left);
                assert_eq!(*x, leaf.position.x + theme::LABEL_OFFSET);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_to_svg_document() {
        let svg = to_svg(&render_layout(&two_generation_layout()), 900.0, 600.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 900 600""#));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(">Trovão</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_to_svg_escapes_labels() {
        let commands = render_message(100.0, 100.0, "<Tom & Jerry>", true);
        let svg = to_svg(&commands, 100.0, 100.0);
        assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
        assert!(svg.contains(theme::text::ERROR));
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_commands_serialize_tagged() {
        let json = serde_json::to_value(&render_message(10.0, 10.0, "hi", false)).unwrap();
        assert_eq!(json[0]["type"], "clear");
        assert_eq!(json[1]["type"], "text");
        assert_eq!(json[1]["align"], "center");
    }
}
