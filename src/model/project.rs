//! Project and image metadata supplied by the hosting application.
//!
//! The editor never creates or mutates these; it reads them for rendering
//! (category colours) and for export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::category::{Category, color_for};

/// Project metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: String,
    /// Category names declared on the project.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl ProjectInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Image metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ImageInfo {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Category reference data plus the host's "current category" selection.
///
/// The current category is read when an annotation is committed, not when
/// drawing starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub current_category: Option<String>,
}

impl ProjectContext {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            current_category: None,
        }
    }

    /// Colour of the category called `name`, if the project defines one.
    pub fn color_for(&self, name: &str) -> Option<&str> {
        color_for(&self.categories, name)
    }

    /// Current category name, or `default` when none is configured.
    pub fn current_category_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.current_category
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(default)
    }

    pub fn set_current_category(&mut self, name: Option<String>) {
        self.current_category = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lookup_by_name() {
        let ctx = ProjectContext::new(vec![
            Category::new("1", "car", "#ff0000"),
            Category::new("2", "person", "#00ff00"),
        ]);
        assert_eq!(ctx.color_for("person"), Some("#00ff00"));
        assert_eq!(ctx.color_for("bicycle"), None);
    }

    #[test]
    fn test_current_category_default() {
        let mut ctx = ProjectContext::default();
        assert_eq!(ctx.current_category_or("default"), "default");

        ctx.set_current_category(Some(String::new()));
        assert_eq!(ctx.current_category_or("default"), "default");

        ctx.set_current_category(Some("car".into()));
        assert_eq!(ctx.current_category_or("default"), "car");
    }
}
