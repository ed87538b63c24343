//! Pedigree tree command.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{CommandResult, Context, json_string};
use crate::models::{AncestryPayload, BuildReport, MAX_GENERATIONS, PedigreeTree, TreeNode};
use crate::view::{Orientation, TreeView, tree_to_svg};
use crate::{Error, Result};

/// Where the ancestry comes from.
#[derive(Debug, Clone)]
pub enum TreeSource {
    /// Fetch from the API by animal ID
    Remote(String),
    /// Read an ancestry JSON file
    File(PathBuf),
}

#[derive(Debug, Serialize)]
pub struct TreeResult {
    pub animal_id: String,
    pub generations: usize,
    pub node_count: usize,
    pub orientation: Orientation,
    pub tree: TreeNode,
    pub report: BuildReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<PathBuf>,
}

impl CommandResult for TreeResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} ({})", self.tree.display_name, self.tree.sex)];
        draw_branches(&self.tree, &mut lines);

        lines.push(String::new());
        lines.push(format!(
            "{} individual{} across {} generation{}",
            self.node_count,
            if self.node_count == 1 { "" } else { "s" },
            self.generations,
            if self.generations == 1 { "" } else { "s" }
        ));
        for cycle in &self.report.cycles {
            lines.push(format!(
                "Warning: {} loops back through descendant {}; branch cut",
                cycle.ancestor_id, cycle.descendant_id
            ));
        }
        for (id, count) in &self.report.duplicates {
            lines.push(format!("Warning: {} duplicate record(s) for {} ignored", count, id));
        }
        for id in &self.report.multi_parent {
            lines.push(format!("Warning: {} has more than two parents recorded", id));
        }
        for id in &self.report.truncated {
            lines.push(format!(
                "Warning: ancestors of {} left out after {} generations",
                id, MAX_GENERATIONS
            ));
        }
        if let Some(ref path) = self.svg {
            lines.push(format!("SVG written to {}", path.display()));
        }
        lines.join("\n")
    }
}

fn draw_branches(root: &TreeNode, lines: &mut Vec<String>) {
    let mut stack: Vec<(&TreeNode, String, bool)> = Vec::new();
    push_parents(&mut stack, root, String::new());

    while let Some((node, prefix, last)) = stack.pop() {
        let (branch, extension) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        lines.push(format!("{}{}{} ({})", prefix, branch, node.display_name, node.sex));
        push_parents(&mut stack, node, format!("{}{}", prefix, extension));
    }
}

/// Queue `node`'s parents so they pop in input order.
fn push_parents<'t>(
    stack: &mut Vec<(&'t TreeNode, String, bool)>,
    node: &'t TreeNode,
    prefix: String,
) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate().rev() {
        stack.push((child, prefix.clone(), i + 1 == count));
    }
}

/// Build the pedigree for `source`, optionally writing an SVG drawing.
pub fn tree(
    ctx: &Context,
    source: TreeSource,
    svg: Option<&Path>,
    orientation: Option<Orientation>,
    width: f64,
    height: f64,
) -> Result<TreeResult> {
    if !(width > 0.0 && height > 0.0) {
        return Err(Error::InvalidInput(format!(
            "Drawing size must be positive, got {}x{}",
            width, height
        )));
    }
    let orientation = orientation.unwrap_or_else(|| ctx.config.layout());

    let tree = match source {
        TreeSource::File(path) => load_payload(&path)?.build(),
        TreeSource::Remote(id) => fetch_tree(ctx, &id)?,
    };

    if !tree.report.is_clean() {
        warn!(
            cycles = tree.report.cycles.len(),
            duplicates = tree.report.duplicate_count(),
            truncated = tree.report.truncated.len(),
            "ancestry data has structural problems"
        );
    }

    if let Some(path) = svg {
        fs::write(path, tree_to_svg(&tree.root, orientation, width, height))?;
        debug!(path = %path.display(), "svg written");
    }

    Ok(TreeResult {
        animal_id: tree.root.id.clone(),
        generations: tree.generations(),
        node_count: tree.node_count(),
        orientation,
        tree: tree.root,
        report: tree.report,
        svg: svg.map(Path::to_path_buf),
    })
}

fn load_payload(path: &Path) -> Result<AncestryPayload> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::InvalidInput(format!("Invalid ancestry JSON in {}: {}", path.display(), e))
    })
}

fn fetch_tree(ctx: &Context, animal_id: &str) -> Result<PedigreeTree> {
    let client = ctx.authorized_client(&format!("/dashboard/animals/{}", animal_id))?;

    let mut view = TreeView::new();
    let generation = view.begin_fetch();
    match client.fetch_ancestry(animal_id) {
        Ok(payload) => {
            view.apply(generation, &payload);
        }
        Err(e) => {
            view.fail(generation, &e);
            return Err(e.into());
        }
    }

    view.tree()
        .cloned()
        .ok_or_else(|| Error::Other(format!("No tree for animal {}", animal_id)))
}
