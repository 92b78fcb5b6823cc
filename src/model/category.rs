//! Category data model for annotation categories.

use serde::{Deserialize, Serialize};

/// A project category. Annotations refer to it by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category
    pub id: String,
    /// Display name, unique within a project
    pub name: String,
    /// Hex colour (`#rrggbb`) used for rendering
    pub color: String,
    /// Owning project
    #[serde(default)]
    pub project_id: String,
}

impl Category {
    /// Create a new category with the given ID, name, and color.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            project_id: String::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }
}

/// Look up the colour of the category called `name`.
pub fn color_for<'a>(categories: &'a [Category], name: &str) -> Option<&'a str> {
    categories
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.color.as_str())
}
