//! Point-based element detection over an accessibility tree.
//!
//! [`AccessibleDetector::locate`] walks the descendants of a root element
//! depth first and returns the innermost element under a screen point whose
//! classification is not structural according to the detector's
//! [`Descriptor`].

use crate::descriptor::{Descriptor, DescriptorKind};
use crate::types::{AccessibleComponent, ControlType, Point, Rect, Result};

/// Default limit on how far below the root the walk descends.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A tree-walkable accessibility element.
///
/// Backends implement this for their element handle (a UIA element, an
/// AXUIElement, a DOM node proxy). Errors from `children` are propagated by
/// the detector untouched.
pub trait AccessibleNode: Sized {
    fn bounding_rectangle(&self) -> Rect;

    fn control_type(&self) -> ControlType;

    /// Immediate children in their natural enumeration order.
    fn children(&self) -> Result<Vec<Self>>;

    /// Snapshot of the attributes a descriptor and the store need.
    fn component(&self) -> AccessibleComponent;
}

/// Finds the element under a point, parameterized by a family policy.
pub struct AccessibleDetector {
    descriptor: Box<dyn Descriptor>,
    max_depth: usize,
}

impl AccessibleDetector {
    pub fn new(descriptor: Box<dyn Descriptor>) -> Self {
        Self {
            descriptor,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_kind(kind: DescriptorKind) -> Self {
        Self::new(kind.descriptor())
    }

    /// Limit the walk to `max_depth` levels below the root. A node at the
    /// limit is judged as a leaf.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn descriptor(&self) -> &dyn Descriptor {
        self.descriptor.as_ref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Locate the innermost interactive descendant of `root` under `point`.
    ///
    /// Children are visited in enumeration order. For the first child whose
    /// rectangle contains the point, its own subtree is searched first; if
    /// that finds nothing and the child is not structural, the child is the
    /// result. Otherwise the next containing sibling is tried. Overlapping
    /// siblings are therefore decided by enumeration order alone.
    ///
    /// `root` itself is never returned and its rectangle is not checked.
    pub fn locate<N: AccessibleNode>(&self, root: &N, point: Point) -> Result<Option<N>> {
        let found = self.find_descendant(root, point, 0)?;
        match &found {
            Some(node) => log::debug!(
                "[DETECTOR] {} resolved {:?} to {}",
                self.descriptor.family(),
                point,
                node.control_type()
            ),
            None => log::debug!(
                "[DETECTOR] {} found nothing at {:?}",
                self.descriptor.family(),
                point
            ),
        }
        Ok(found)
    }

    fn find_descendant<N: AccessibleNode>(
        &self,
        parent: &N,
        point: Point,
        depth: usize,
    ) -> Result<Option<N>> {
        if depth >= self.max_depth {
            log::trace!("[DETECTOR] Depth limit {} reached", self.max_depth);
            return Ok(None);
        }

        for child in parent.children()? {
            if !child.bounding_rectangle().contains(point) {
                continue;
            }

            if let Some(inner) = self.find_descendant(&child, point, depth + 1)? {
                return Ok(Some(inner));
            }

            if !self.descriptor.is_structural(child.control_type()) {
                return Ok(Some(child));
            }
        }

        Ok(None)
    }
}

impl Default for AccessibleDetector {
    fn default() -> Self {
        Self::from_kind(DescriptorKind::Generic)
    }
}
