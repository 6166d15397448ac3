use crate::api::AppError;
use crate::directory::model::{is_reserved_name, DirectoryNode, DirectoryOption, DirectoryTree, NewDirectory};
use crate::directory::tree;
use crate::persistence::repo::{Backend, Repository, Table};
use crate::validation::required;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, info};

const TREE_SORT_KEY: &str = "tree";

/// One item per project holding the whole tree.
pub(crate) struct DirectoryTable();

impl Table<DirectoryTree> for DirectoryTable {
    fn table_name() -> String {
        "directory_trees".to_string()
    }

    fn partition_key_name() -> String {
        "project_id".to_string()
    }

    fn sort_key_name() -> String {
        "id".to_string()
    }

    fn partition_key_from_entity(entity: &DirectoryTree) -> (String, AttributeValue) {
        Self::partition_key(entity.project_id.clone())
    }

    fn sort_key_from_entity(_entity: &DirectoryTree) -> (String, AttributeValue) {
        Self::sort_key(TREE_SORT_KEY.to_string())
    }
}

pub struct DirectoryOperations {
    pub(crate) repository: Repository,
}

impl DirectoryOperations {
    async fn nodes(&self, project_id: &str) -> Result<Vec<DirectoryNode>, AppError> {
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store
                .directories
                .read()
                .await
                .get(project_id)
                .cloned()
                .unwrap_or_default()),
            Backend::DynamoDb(client) => Ok(DirectoryTable::get_item(client, project_id.to_string(), TREE_SORT_KEY.to_string())
                .await?
                .map(|t| t.nodes)
                .unwrap_or_default()),
        }
    }

    /// The project's tree with active test case counts on every node.
    pub async fn tree(&self, project_id: &str) -> Result<DirectoryTree, AppError> {
        self.repository.projects().require(project_id).await?;
        self.repository.simulate_latency().await;
        let nodes = self.nodes(project_id).await?;
        let test_cases = self.repository.test_cases().records(project_id).await?;
        Ok(DirectoryTree {
            project_id: project_id.to_string(),
            nodes: tree::annotate_counts(&nodes, &test_cases),
        })
    }

    pub async fn add(&self, project_id: &str, new_directory: NewDirectory) -> Result<DirectoryNode, AppError> {
        let name = required("name", &new_directory.name)?;
        let parent_id = new_directory
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if parent_id.is_none() && is_reserved_name(&name) {
            return Err(AppError::validation(
                "name",
                format!("'{}' is reserved for a built-in view", name),
            ));
        }
        self.repository.projects().require(project_id).await?;
        self.repository.simulate_latency().await;

        let node = DirectoryNode::new(tree::child_id(parent_id, &name), name);
        let insert = |nodes: &[DirectoryNode]| {
            if tree::contains(nodes, &node.id) {
                return Err(AppError::validation("name", format!("directory '{}' already exists", node.id)));
            }
            tree::add_node(nodes, parent_id, node.clone())
        };
        match self.repository.backend() {
            Backend::Memory(store) => {
                let mut directories = store.directories.write().await;
                let current = directories.get(project_id).map(Vec::as_slice).unwrap_or_default();
                let updated = insert(current)?;
                directories.insert(project_id.to_string(), updated);
            }
            Backend::DynamoDb(client) => {
                let current = self.nodes(project_id).await?;
                let updated = insert(&current)?;
                DirectoryTable::put_item(
                    client,
                    DirectoryTree {
                        project_id: project_id.to_string(),
                        nodes: updated,
                    },
                )
                .await?;
            }
        }
        info!(project_id, directory = %node.id, "Added directory");
        Ok(node)
    }

    /// Flattened tree for directory pickers.
    pub async fn options(&self, project_id: &str) -> Result<Vec<DirectoryOption>, AppError> {
        self.repository.simulate_latency().await;
        let options = tree::flatten(&self.nodes(project_id).await?);
        debug!(project_id, count = options.len(), "Listed directory options");
        Ok(options)
    }

    pub async fn contains(&self, project_id: &str, directory_id: &str) -> Result<bool, AppError> {
        Ok(tree::contains(&self.nodes(project_id).await?, directory_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use std::sync::Arc;
    use std::time::Duration;

    async fn seeded() -> Repository {
        let repository = Repository::in_memory(Arc::new(SequentialIds::default()), Duration::ZERO);
        repository.seed().await;
        repository
    }

    fn new_directory(parent_id: Option<&str>, name: &str) -> NewDirectory {
        NewDirectory {
            parent_id: parent_id.map(str::to_string),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn tree_carries_active_counts() {
        let tree = seeded().await.directories().tree("proj-001").await.unwrap();
        let authentication = &tree.nodes[0];
        assert_eq!(authentication.id, "authentication");
        // 6 fixed cases plus the 25 generated ones
        assert_eq!(authentication.count, Some(31));
        let legacy = tree.nodes.iter().find(|n| n.id == "legacy").unwrap();
        assert_eq!(legacy.count, Some(0));
    }

    #[tokio::test]
    async fn added_directory_shows_up_in_options() {
        let repository = seeded().await;
        let node = repository
            .directories()
            .add("proj-001", new_directory(Some("authentication"), " mfa "))
            .await
            .unwrap();
        assert_eq!(node.id, "authentication/mfa");
        assert_eq!(node.label, "mfa");

        let options = repository.directories().options("proj-001").await.unwrap();
        assert!(options
            .iter()
            .any(|o| o.id == "authentication/mfa" && o.label == "authentication > mfa"));
        assert!(repository.directories().contains("proj-001", "authentication/mfa").await.unwrap());
    }

    #[tokio::test]
    async fn first_directory_of_an_empty_project() {
        let repository = seeded().await;
        repository.directories().add("proj-004", new_directory(None, "stock")).await.unwrap();
        let tree = repository.directories().tree("proj-004").await.unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].count, Some(0));
    }

    #[tokio::test]
    async fn invalid_additions_are_rejected() {
        let repository = seeded().await;
        let directories = repository.directories();
        assert!(matches!(
            directories.add("proj-001", new_directory(None, "  ")).await,
            Err(AppError::Validation { field: "name", .. })
        ));
        assert!(matches!(
            directories.add("proj-001", new_directory(Some("authentication"), "sso")).await,
            Err(AppError::Validation { field: "name", .. })
        ));
        assert!(matches!(
            directories.add("proj-001", new_directory(Some("missing"), "x")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            directories.add("proj-404", new_directory(None, "x")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn built_in_view_names_are_reserved_at_the_root() {
        let repository = seeded().await;
        let directories = repository.directories();
        for name in ["Trash", "drafts", " ALL "] {
            assert!(matches!(
                directories.add("proj-001", new_directory(None, name)).await,
                Err(AppError::Validation { field: "name", .. })
            ));
        }
        assert!(!directories.contains("proj-001", "Trash").await.unwrap());

        // nested paths never parse as a built-in view
        let nested = directories
            .add("proj-001", new_directory(Some("legacy"), "Trash"))
            .await
            .unwrap();
        assert_eq!(nested.id, "legacy/Trash");
    }
}
