//! Per application family detection policy.
//!
//! A [`Descriptor`] tells the detector which classifications are purely
//! structural (containers to look through, never to return) and how to derive
//! a stable identity for a resolved element. Each supported host application
//! family has its own implementation; [`DescriptorKind`] selects one from
//! configuration.

use crate::types::{generate_identity_hash, is_blank, AccessibleComponent, ControlType};
use serde::{Deserialize, Serialize};

/// Classifications every family treats as structural.
pub const STRUCTURAL_CONTROL_TYPES: &[ControlType] =
    &[ControlType::Pane, ControlType::Window, ControlType::Custom];

/// Extra classifications skipped inside browser-hosted web content.
const BROWSER_STRUCTURAL_CONTROL_TYPES: &[ControlType] = &[
    ControlType::Pane,
    ControlType::Window,
    ControlType::Custom,
    ControlType::Group,
    ControlType::Document,
];

/// Detection policy for one family of host applications.
pub trait Descriptor: Send + Sync {
    /// Short family name, used in logs.
    fn family(&self) -> &'static str;

    /// Classifications the detector looks through but never returns.
    fn structural_types(&self) -> &[ControlType];

    fn is_structural(&self, control_type: ControlType) -> bool {
        self.structural_types().contains(&control_type)
    }

    /// Stable identity for a resolved element, or `None` if the family cannot
    /// derive one from the available attributes.
    fn unique_id(&self, component: &AccessibleComponent) -> Option<String> {
        if !is_blank(&component.automation_id) {
            return Some(component.automation_id.trim().to_string());
        }
        attribute_digest(component)
    }

    /// Display name for a resolved element.
    fn display_name(&self, component: &AccessibleComponent) -> String {
        component.name.trim().to_string()
    }
}

/// Digest of control type, class name and name. `None` if all are empty.
fn attribute_digest(component: &AccessibleComponent) -> Option<String> {
    if is_blank(&component.name)
        && is_blank(&component.class_name)
        && component.control_type == ControlType::Unknown
    {
        return None;
    }
    Some(generate_identity_hash(&[
        component.control_type.as_str(),
        component.class_name.trim(),
        component.name.trim(),
    ]))
}

/// Default policy for native desktop applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDescriptor;

impl Descriptor for GenericDescriptor {
    fn family(&self) -> &'static str {
        "generic"
    }

    fn structural_types(&self) -> &[ControlType] {
        STRUCTURAL_CONTROL_TYPES
    }
}

/// Policy for the WeChat desktop client.
///
/// The client exposes no automation ids, and the few it reports are reused
/// across unrelated controls, so identity always comes from the attribute
/// digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeChatDescriptor;

impl Descriptor for WeChatDescriptor {
    fn family(&self) -> &'static str {
        "wechat"
    }

    fn structural_types(&self) -> &[ControlType] {
        STRUCTURAL_CONTROL_TYPES
    }

    fn unique_id(&self, component: &AccessibleComponent) -> Option<String> {
        attribute_digest(component)
    }

    fn display_name(&self, component: &AccessibleComponent) -> String {
        // Message list items carry the whole message as their name.
        let name = component.name.trim();
        match name.lines().next() {
            Some(first) => first.trim().to_string(),
            None => String::new(),
        }
    }
}

/// Policy for web content hosted in a browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDescriptor;

impl Descriptor for BrowserDescriptor {
    fn family(&self) -> &'static str {
        "browser"
    }

    fn structural_types(&self) -> &[ControlType] {
        BROWSER_STRUCTURAL_CONTROL_TYPES
    }
}

/// Descriptor selection, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    #[default]
    Generic,
    WeChat,
    Browser,
}

impl DescriptorKind {
    pub fn descriptor(self) -> Box<dyn Descriptor> {
        match self {
            DescriptorKind::Generic => Box::new(GenericDescriptor),
            DescriptorKind::WeChat => Box::new(WeChatDescriptor),
            DescriptorKind::Browser => Box::new(BrowserDescriptor),
        }
    }

    /// Parses a family name, ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use element_locator::DescriptorKind;
    ///
    /// assert_eq!(DescriptorKind::from_name("WeChat"), Some(DescriptorKind::WeChat));
    /// assert_eq!(DescriptorKind::from_name("gtk"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "generic" => Some(DescriptorKind::Generic),
            "wechat" => Some(DescriptorKind::WeChat),
            "browser" => Some(DescriptorKind::Browser),
            _ => None,
        }
    }
}
