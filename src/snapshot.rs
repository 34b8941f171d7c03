//! Owned accessibility tree snapshots.
//!
//! A `SnapshotNode` is a plain copy of an accessibility subtree, as dumped by
//! a backend to JSON. It implements [`AccessibleNode`] so the detector can run
//! against a dump exactly as it runs against a live tree.

use crate::detector::AccessibleNode;
use crate::types::{AccessibleComponent, ControlType, Rect, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// One node of a dumped accessibility tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotNode {
    #[serde(flatten)]
    pub component: AccessibleComponent,

    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(name: impl Into<String>, control_type: ControlType, rect: Rect) -> Self {
        Self {
            component: AccessibleComponent {
                name: name.into(),
                control_type,
                bounding_rectangle: rect,
                is_enabled: true,
                ..Default::default()
            },
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SnapshotNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_automation_id(mut self, automation_id: impl Into<String>) -> Self {
        self.component.automation_id = automation_id.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json.trim_start_matches('\u{feff}'))?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SnapshotNode::node_count).sum::<usize>()
    }

    /// Render the subtree as an indented outline.
    ///
    /// Each line is `{indent}{control type} - {name} {rect}` with two spaces
    /// per level.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        let rect = self.component.bounding_rectangle;
        let _ = writeln!(
            out,
            "{}{} - {} [{}, {}, {}x{}]",
            "  ".repeat(indent),
            self.component.control_type,
            self.component.name,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        for child in &self.children {
            child.render_into(out, indent + 1);
        }
    }
}

impl<'a> AccessibleNode for &'a SnapshotNode {
    fn bounding_rectangle(&self) -> Rect {
        self.component.bounding_rectangle
    }

    fn control_type(&self) -> ControlType {
        self.component.control_type
    }

    fn children(&self) -> Result<Vec<Self>> {
        let node: &'a SnapshotNode = *self;
        Ok(node.children.iter().collect())
    }

    fn component(&self) -> AccessibleComponent {
        self.component.clone()
    }
}
