//! Core data types for the element-locator crate.
//!
//! This module defines the fundamental types used throughout the crate:
//! - `Point` / `Rect`: Screen-space geometry
//! - `ControlType`: Accessibility classification of an element
//! - `AccessibleComponent`: Attributes read from a live accessibility node
//! - `AccessibleEntity`: The cached record kept by the locator store
//! - `LocatorError`: Error types that can occur in the crate

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Result type alias for locator operations.
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Errors that can occur while locating or storing elements.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// A required identifier or path was empty or unset
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem failure while loading or saving locator files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A locator file did not contain a valid entity array
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The accessibility backend failed (e.g., child enumeration faulted)
    #[error("Platform error: {0}")]
    Platform(String),

    /// Locator files on disk disagree (one group stored in several files)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An element's bounding rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Check if a point is inside this rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges are
    /// exclusive, so an empty rectangle contains nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use element_locator::types::{Point, Rect};
    ///
    /// let rect = Rect::new(10, 10, 100, 50);
    /// assert!(rect.contains(Point::new(10, 10)));
    /// assert!(rect.contains(Point::new(109, 59)));
    /// assert!(!rect.contains(Point::new(110, 30)));
    /// ```
    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (point.x as i64, point.y as i64);
        px >= self.x as i64 && px < self.right() && py >= self.y as i64 && py < self.bottom()
    }

}

/// Accessibility classification of an element.
///
/// Mirrors the UI Automation control type set. Values that a newer backend
/// or a hand-edited locator file introduces deserialize as `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlType {
    AppBar,
    Button,
    Calendar,
    CheckBox,
    ComboBox,
    Custom,
    DataGrid,
    DataItem,
    Document,
    Edit,
    Group,
    Header,
    HeaderItem,
    Hyperlink,
    Image,
    List,
    ListItem,
    Menu,
    MenuBar,
    MenuItem,
    Pane,
    ProgressBar,
    RadioButton,
    ScrollBar,
    SemanticZoom,
    Separator,
    Slider,
    Spinner,
    SplitButton,
    StatusBar,
    Tab,
    TabItem,
    Table,
    Text,
    Thumb,
    TitleBar,
    ToolBar,
    ToolTip,
    Tree,
    TreeItem,
    Window,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ControlType {
    /// Returns the string identifier for this control type.
    ///
    /// # Examples
    ///
    /// ```
    /// use element_locator::ControlType;
    ///
    /// assert_eq!(ControlType::Button.as_str(), "Button");
    /// assert_eq!(ControlType::TreeItem.as_str(), "TreeItem");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::AppBar => "AppBar",
            ControlType::Button => "Button",
            ControlType::Calendar => "Calendar",
            ControlType::CheckBox => "CheckBox",
            ControlType::ComboBox => "ComboBox",
            ControlType::Custom => "Custom",
            ControlType::DataGrid => "DataGrid",
            ControlType::DataItem => "DataItem",
            ControlType::Document => "Document",
            ControlType::Edit => "Edit",
            ControlType::Group => "Group",
            ControlType::Header => "Header",
            ControlType::HeaderItem => "HeaderItem",
            ControlType::Hyperlink => "Hyperlink",
            ControlType::Image => "Image",
            ControlType::List => "List",
            ControlType::ListItem => "ListItem",
            ControlType::Menu => "Menu",
            ControlType::MenuBar => "MenuBar",
            ControlType::MenuItem => "MenuItem",
            ControlType::Pane => "Pane",
            ControlType::ProgressBar => "ProgressBar",
            ControlType::RadioButton => "RadioButton",
            ControlType::ScrollBar => "ScrollBar",
            ControlType::SemanticZoom => "SemanticZoom",
            ControlType::Separator => "Separator",
            ControlType::Slider => "Slider",
            ControlType::Spinner => "Spinner",
            ControlType::SplitButton => "SplitButton",
            ControlType::StatusBar => "StatusBar",
            ControlType::Tab => "Tab",
            ControlType::TabItem => "TabItem",
            ControlType::Table => "Table",
            ControlType::Text => "Text",
            ControlType::Thumb => "Thumb",
            ControlType::TitleBar => "TitleBar",
            ControlType::ToolBar => "ToolBar",
            ControlType::ToolTip => "ToolTip",
            ControlType::Tree => "Tree",
            ControlType::TreeItem => "TreeItem",
            ControlType::Window => "Window",
            ControlType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ControlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes read from a live accessibility node.
///
/// This is what a backend hands to a [`Descriptor`](crate::descriptor::Descriptor)
/// so it can derive a stable identity without knowing the backend's node type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessibleComponent {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub control_type: ControlType,

    /// Backend-provided identifier (UIA AutomationId, DOM id)
    #[serde(default)]
    pub automation_id: String,

    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub bounding_rectangle: Rect,

    #[serde(default = "default_true")]
    pub is_enabled: bool,

    #[serde(default)]
    pub is_offscreen: bool,

    #[serde(default)]
    pub is_password: bool,

    #[serde(default)]
    pub is_dialog: bool,
}

/// Cached metadata for one located UI element.
///
/// Identity is `(file_name, unique_id)`, both compared case-insensitively.
/// Every other field is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessibleEntity {
    /// Group key: the window, document or file the element belongs to
    #[serde(default)]
    pub file_name: String,

    /// Identifier stable across sessions within the group
    #[serde(default)]
    pub unique_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub control_type: ControlType,

    #[serde(default)]
    pub automation_id: String,

    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub bounding_rectangle: Rect,

    #[serde(default = "default_true")]
    pub is_enabled: bool,

    #[serde(default)]
    pub is_offscreen: bool,

    #[serde(default)]
    pub is_password: bool,

    #[serde(default)]
    pub is_dialog: bool,
}

impl AccessibleEntity {
    /// Creates an entity with only its identity set.
    pub fn new(file_name: impl Into<String>, unique_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            unique_id: unique_id.into(),
            name: String::new(),
            control_type: ControlType::Unknown,
            automation_id: String::new(),
            class_name: String::new(),
            bounding_rectangle: Rect::default(),
            is_enabled: true,
            is_offscreen: false,
            is_password: false,
            is_dialog: false,
        }
    }

    /// Creates an entity from a component's attributes.
    pub fn from_component(
        file_name: impl Into<String>,
        unique_id: impl Into<String>,
        component: &AccessibleComponent,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            unique_id: unique_id.into(),
            name: component.name.clone(),
            control_type: component.control_type,
            automation_id: component.automation_id.clone(),
            class_name: component.class_name.clone(),
            bounding_rectangle: component.bounding_rectangle,
            is_enabled: component.is_enabled,
            is_offscreen: component.is_offscreen,
            is_password: component.is_password,
            is_dialog: component.is_dialog,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_control_type(mut self, control_type: ControlType) -> Self {
        self.control_type = control_type;
        self
    }

    pub fn with_bounding_rectangle(mut self, rect: Rect) -> Self {
        self.bounding_rectangle = rect;
        self
    }

    /// Both identity fields are non-blank.
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.file_name) && !is_blank(&self.unique_id)
    }

    /// Case-insensitive identity match against another unique id.
    pub fn has_id(&self, unique_id: &str) -> bool {
        ids_match(&self.unique_id, unique_id)
    }
}

fn default_true() -> bool {
    true
}

/// Empty or whitespace-only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Case-insensitive comparison used for unique ids and group keys.
pub fn ids_match(a: &str, b: &str) -> bool {
    a == b
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

/// Normalized form of a group key, used as the index key.
pub fn group_key(file_name: &str) -> String {
    file_name.trim().to_lowercase()
}

/// Derive a stable identity digest from an element's attributes.
///
/// The parts are joined with a separator that cannot appear in a control type
/// name so that `("ab", "c")` and `("a", "bc")` hash differently.
///
/// # Example
///
/// ```
/// use element_locator::types::generate_identity_hash;
///
/// let hash = generate_identity_hash(&["Button", "Chrome_WidgetWin_1", "Send"]);
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, generate_identity_hash(&["Button", "Chrome_WidgetWin_1", "Send"]));
/// ```
pub fn generate_identity_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
