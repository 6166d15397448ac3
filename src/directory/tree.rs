use crate::api::AppError;
use crate::case::model::TestCase;
use crate::directory::model::{DirectoryNode, DirectoryOption, DirectorySelection, LABEL_SEPARATOR, PATH_SEPARATOR};

/// Returns a copy of `tree` with `node` appended under `parent_id`, or as a
/// new root when no parent is given.
pub fn add_node(tree: &[DirectoryNode], parent_id: Option<&str>, node: DirectoryNode) -> Result<Vec<DirectoryNode>, AppError> {
    let mut nodes = tree.to_vec();
    match parent_id {
        None => {
            nodes.push(node);
            Ok(nodes)
        }
        Some(parent_id) => {
            if insert_under(&mut nodes, parent_id, node) {
                Ok(nodes)
            } else {
                Err(AppError::NotFound(format!("Directory '{}' not found", parent_id)))
            }
        }
    }
}

fn insert_under(nodes: &mut [DirectoryNode], parent_id: &str, node: DirectoryNode) -> bool {
    for candidate in nodes.iter_mut() {
        if candidate.id == parent_id {
            candidate.children.push(node);
            return true;
        }
    }
    for candidate in nodes.iter_mut() {
        if find(&candidate.children, parent_id).is_some() {
            return insert_under(&mut candidate.children, parent_id, node);
        }
    }
    false
}

pub fn find<'a>(tree: &'a [DirectoryNode], id: &str) -> Option<&'a DirectoryNode> {
    tree.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find(&node.children, id)
        }
    })
}

pub fn contains(tree: &[DirectoryNode], id: &str) -> bool {
    find(tree, id).is_some()
}

/// Path id of a new child: the parent's path plus the name.
pub fn child_id(parent_id: Option<&str>, name: &str) -> String {
    let segment = name.trim().replace(PATH_SEPARATOR, "-");
    match parent_id {
        Some(parent) => format!("{}{}{}", parent, PATH_SEPARATOR, segment),
        None => segment,
    }
}

/// Depth-first list of every node with its root-to-node label path.
pub fn flatten(tree: &[DirectoryNode]) -> Vec<DirectoryOption> {
    let mut options = vec![];
    flatten_into(tree, None, &mut options);
    options
}

fn flatten_into(nodes: &[DirectoryNode], prefix: Option<&str>, options: &mut Vec<DirectoryOption>) {
    for node in nodes {
        let label = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, LABEL_SEPARATOR, node.label),
            None => node.label.clone(),
        };
        options.push(DirectoryOption {
            id: node.id.clone(),
            label: label.clone(),
        });
        flatten_into(&node.children, Some(&label), options);
    }
}

/// Sets every node's count to the number of active test cases in its subtree.
pub fn annotate_counts(tree: &[DirectoryNode], test_cases: &[TestCase]) -> Vec<DirectoryNode> {
    tree.iter()
        .map(|node| {
            let selection = DirectorySelection::Path(node.id.clone());
            let count = test_cases
                .iter()
                .filter(|tc| !tc.is_archived() && selection.includes(&tc.directory))
                .count();
            DirectoryNode {
                count: Some(count),
                children: annotate_counts(&node.children, test_cases),
                ..node.clone()
            }
        })
        .collect()
}
