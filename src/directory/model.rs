use serde::{Deserialize, Serialize};

pub const PATH_SEPARATOR: char = '/';
pub const LABEL_SEPARATOR: &str = " > ";

fn default_icon() -> String {
    "folder".to_string()
}

/// A node of a project's directory tree. The id is the full path of the node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DirectoryNode {
    pub id: String,
    pub label: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
}

impl DirectoryNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        DirectoryNode {
            id: id.into(),
            label: label.into(),
            icon: default_icon(),
            count: None,
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: Vec<DirectoryNode>) -> Self {
        self.children = children;
        self
    }
}

/// Stored form of a project's tree.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DirectoryTree {
    pub project_id: String,
    #[serde(default)]
    pub nodes: Vec<DirectoryNode>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DirectoryOption {
    pub id: String,
    pub label: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewDirectory {
    pub parent_id: Option<String>,
    pub name: String,
}

/// What the directory sidebar has selected. `All`, `Drafts` and `Trash` are
/// synthetic entries that filter by status instead of by path.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum DirectorySelection {
    #[default]
    All,
    Drafts,
    Trash,
    Path(String),
}

/// Names the sidebar reserves for its synthetic entries.
pub const RESERVED_NAMES: [&str; 3] = ["All", "Drafts", "Trash"];

/// True for names that would collide with a synthetic entry, in any casing.
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.iter().any(|reserved| reserved.eq_ignore_ascii_case(name.trim()))
}

impl DirectorySelection {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "All" => DirectorySelection::All,
            "Drafts" => DirectorySelection::Drafts,
            "Trash" => DirectorySelection::Trash,
            path => {
                let path = path.trim_matches(PATH_SEPARATOR);
                if path.is_empty() {
                    DirectorySelection::All
                } else {
                    DirectorySelection::Path(path.to_string())
                }
            }
        }
    }

    /// Segment-aware prefix match: `auth` selects `auth` and `auth/sso`, not `authz`.
    pub fn includes(&self, directory: &str) -> bool {
        match self {
            DirectorySelection::Path(path) => {
                directory == path
                    || (directory.starts_with(path.as_str())
                        && directory[path.len()..].starts_with(PATH_SEPARATOR))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_selections() {
        assert_eq!(DirectorySelection::parse("All"), DirectorySelection::All);
        assert_eq!(DirectorySelection::parse(""), DirectorySelection::All);
        assert_eq!(DirectorySelection::parse("Drafts"), DirectorySelection::Drafts);
        assert_eq!(DirectorySelection::parse("Trash"), DirectorySelection::Trash);
        assert_eq!(
            DirectorySelection::parse("authentication/sso/"),
            DirectorySelection::Path("authentication/sso".to_string())
        );
    }

    #[test]
    fn reserved_names_ignore_case() {
        assert!(is_reserved_name("Trash"));
        assert!(is_reserved_name("drafts"));
        assert!(is_reserved_name(" ALL "));
        assert!(!is_reserved_name("trashcan"));
    }

    #[test]
    fn path_selection_is_segment_aware() {
        let selection = DirectorySelection::parse("auth");
        assert!(selection.includes("auth"));
        assert!(selection.includes("auth/sso"));
        assert!(!selection.includes("authentication"));
        assert!(!selection.includes("legacy/auth"));
    }
}
