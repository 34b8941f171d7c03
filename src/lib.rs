//! Element Locator - find UI elements through accessibility trees and remember them.
//!
//! This crate resolves the element under a screen point inside a third-party
//! application window and caches it so automation can find it again across
//! runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use element_locator::{Config, ElementLocator, Point, SnapshotNode};
//!
//! let config = Config::load();
//! let locator = ElementLocator::from_config(&config);
//! locator.store().load().ok();
//!
//! let tree = SnapshotNode::from_file("window.json").unwrap();
//! if let Ok(Some(entity)) = locator.capture(&&tree, Point::new(120, 48), "notepad") {
//!     println!("Captured {} ({})", entity.name, entity.unique_id);
//! }
//! locator.store().save().unwrap();
//! ```
//!
//! # Modules
//!
//! - [`types`]: Geometry, control types, entities and errors
//! - [`store`]: Concurrent, file-backed locator store
//! - [`detector`]: Point-based element detection over an accessibility tree
//! - [`descriptor`]: Per application family detection policy
//! - [`snapshot`]: Owned accessibility tree dumps
//! - [`locator`]: Resolve-and-remember flow
//! - [`config`]: TOML configuration

pub mod config;
pub mod descriptor;
pub mod detector;
pub mod locator;
pub mod snapshot;
pub mod store;
pub mod types;

pub use config::Config;
pub use descriptor::{BrowserDescriptor, Descriptor, DescriptorKind, GenericDescriptor, WeChatDescriptor};
pub use detector::{AccessibleDetector, AccessibleNode};
pub use locator::ElementLocator;
pub use snapshot::SnapshotNode;
pub use store::LocatorStore;
pub use types::{
    AccessibleComponent, AccessibleEntity, ControlType, LocatorError, Point, Rect, Result,
};
