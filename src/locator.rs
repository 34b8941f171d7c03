//! Resolve-and-remember flow.
//!
//! `ElementLocator` ties a detector to a store: it resolves the element under
//! a point, turns it into an [`AccessibleEntity`] using the detector's
//! descriptor, and upserts it into the store.

use crate::config::Config;
use crate::detector::{AccessibleDetector, AccessibleNode};
use crate::store::LocatorStore;
use crate::types::{is_blank, AccessibleEntity, LocatorError, Point, Result};
use std::sync::Arc;

pub struct ElementLocator {
    detector: AccessibleDetector,
    store: Arc<LocatorStore>,
}

impl ElementLocator {
    pub fn new(detector: AccessibleDetector, store: Arc<LocatorStore>) -> Self {
        Self { detector, store }
    }

    /// Build a locator from configuration. The store is not loaded.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.detector(), Arc::new(config.open_store()))
    }

    pub fn detector(&self) -> &AccessibleDetector {
        &self.detector
    }

    pub fn store(&self) -> &Arc<LocatorStore> {
        &self.store
    }

    /// Resolve the element under `point` into an entity for `file_name`.
    ///
    /// Returns `None` when nothing interactive is under the point, or when
    /// the descriptor cannot derive an identity for what was found. The store
    /// is not modified.
    pub fn resolve<N: AccessibleNode>(
        &self,
        root: &N,
        point: Point,
        file_name: &str,
    ) -> Result<Option<AccessibleEntity>> {
        if is_blank(file_name) {
            return Err(LocatorError::InvalidArgument("file_name is empty".to_string()));
        }

        let Some(node) = self.detector.locate(root, point)? else {
            return Ok(None);
        };

        let descriptor = self.detector.descriptor();
        let component = node.component();
        let Some(unique_id) = descriptor.unique_id(&component) else {
            log::warn!(
                "[LOCATOR] {} element at {:?} has no usable identity",
                descriptor.family(),
                point
            );
            return Ok(None);
        };

        let name = descriptor.display_name(&component);
        Ok(Some(
            AccessibleEntity::from_component(file_name.trim(), unique_id, &component)
                .with_name(name),
        ))
    }

    /// Resolve the element under `point` and remember it.
    ///
    /// An entity already stored under the same id is replaced.
    pub fn capture<N: AccessibleNode>(
        &self,
        root: &N,
        point: Point,
        file_name: &str,
    ) -> Result<Option<AccessibleEntity>> {
        let Some(entity) = self.resolve(root, point, file_name)? else {
            return Ok(None);
        };
        self.store.set(entity.clone())?;
        log::debug!(
            "[LOCATOR] Captured {} ({}) in {}",
            entity.unique_id,
            entity.control_type,
            entity.file_name
        );
        Ok(Some(entity))
    }

    /// Previously captured entity, if any.
    pub fn recall(&self, unique_id: &str, file_name: &str) -> Option<AccessibleEntity> {
        self.store.get(unique_id, file_name)
    }
}
