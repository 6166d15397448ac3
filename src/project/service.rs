use crate::activity::model::ActivityAction;
use crate::api::AppError;
use crate::persistence::repo::{Backend, Repository, Table};
use crate::project::model::{NewProject, Project, ProjectChanges, MAX_KEY_LENGTH, NO_CLIENT};
use crate::validation::{required, required_if_present};
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, info};

const PROJECT_PARTITION: &str = "projects";

pub(crate) struct ProjectTable();

impl Table<Project> for ProjectTable {
    fn table_name() -> String {
        "projects".to_string()
    }

    fn partition_key_name() -> String {
        "partition".to_string()
    }

    fn sort_key_name() -> String {
        "id".to_string()
    }

    fn partition_key_from_entity(_entity: &Project) -> (String, AttributeValue) {
        Self::partition_key(PROJECT_PARTITION.to_string())
    }

    fn sort_key_from_entity(entity: &Project) -> (String, AttributeValue) {
        Self::sort_key(entity.id.clone())
    }
}

/// Upper-cases the key and checks its length.
pub fn normalize_key(key: &str) -> Result<String, AppError> {
    let key = required("key", key)?.to_uppercase();
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(AppError::validation(
            "key",
            format!("key must be at most {} characters", MAX_KEY_LENGTH),
        ));
    }
    Ok(key)
}

fn ensure_key_free(projects: &[Project], key: &str, except_id: Option<&str>) -> Result<(), AppError> {
    let taken = projects
        .iter()
        .any(|p| p.key == key && Some(p.id.as_str()) != except_id);
    if taken {
        Err(AppError::validation("key", format!("key '{}' is already used by another project", key)))
    } else {
        Ok(())
    }
}

fn apply_changes(project: &mut Project, name: Option<String>, key: Option<String>, client: Option<String>) {
    if let Some(name) = name {
        project.name = name;
    }
    if let Some(key) = key {
        project.key = key;
    }
    if let Some(client) = client {
        project.client = client;
    }
}

pub struct ProjectOperations {
    pub(crate) repository: Repository,
}

impl ProjectOperations {
    pub async fn list(&self) -> Result<Vec<Project>, AppError> {
        self.repository.simulate_latency().await;
        let projects = match self.repository.backend() {
            Backend::Memory(store) => store.projects.read().await.clone(),
            Backend::DynamoDb(client) => ProjectTable::list_all_items(client, PROJECT_PARTITION.to_string()).await?,
        };
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Project>, AppError> {
        self.repository.simulate_latency().await;
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store.projects.read().await.iter().find(|p| p.id == id).cloned()),
            Backend::DynamoDb(client) => ProjectTable::get_item(client, PROJECT_PARTITION.to_string(), id.to_string()).await,
        }
    }

    /// Fails with `NotFound` instead of returning `None`.
    pub async fn require(&self, id: &str) -> Result<Project, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", id)))
    }

    pub async fn create(&self, new_project: NewProject) -> Result<Project, AppError> {
        let name = required("name", &new_project.name)?;
        let key = normalize_key(&new_project.key)?;
        let project = Project::builder()
            .id(self.repository.next_id("proj"))
            .name(name)
            .key(key)
            .maybe_client(new_project.client.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()))
            .build();
        self.repository.simulate_latency().await;

        let project = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut projects = store.projects.write().await;
                ensure_key_free(&projects, &project.key, None)?;
                projects.push(project.clone());
                project
            }
            Backend::DynamoDb(client) => {
                let existing = ProjectTable::list_all_items(client, PROJECT_PARTITION.to_string()).await?;
                ensure_key_free(&existing, &project.key, None)?;
                ProjectTable::put_item(client, project).await?
            }
        };
        info!(project_id = %project.id, key = %project.key, "Created project");
        self.repository
            .activity()
            .record(&project.id, ActivityAction::Created, format!("project '{}'", project.name))
            .await?;
        Ok(project)
    }

    pub async fn update(&self, id: &str, changes: ProjectChanges) -> Result<Project, AppError> {
        let name = required_if_present("name", changes.name.as_deref())?;
        let key = changes.key.as_deref().map(normalize_key).transpose()?;
        let client = changes
            .client
            .map(|c| c.trim().to_string())
            .map(|c| if c.is_empty() { NO_CLIENT.to_string() } else { c });
        self.repository.simulate_latency().await;

        let not_found = || AppError::NotFound(format!("Project '{}' not found", id));
        let project = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut projects = store.projects.write().await;
                if let Some(key) = &key {
                    ensure_key_free(&projects, key, Some(id))?;
                }
                let project = projects.iter_mut().find(|p| p.id == id).ok_or_else(not_found)?;
                apply_changes(project, name, key, client);
                project.clone()
            }
            Backend::DynamoDb(dynamo) => {
                let existing = ProjectTable::list_all_items(dynamo, PROJECT_PARTITION.to_string()).await?;
                if let Some(key) = &key {
                    ensure_key_free(&existing, key, Some(id))?;
                }
                let mut project = existing.into_iter().find(|p| p.id == id).ok_or_else(not_found)?;
                apply_changes(&mut project, name, key, client);
                ProjectTable::put_item(dynamo, project).await?
            }
        };
        info!(project_id = %project.id, "Updated project");
        self.repository
            .activity()
            .record(&project.id, ActivityAction::Updated, format!("project '{}'", project.name))
            .await?;
        Ok(project)
    }

    /// Removes the project permanently. Suites and test cases are left in place.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repository.simulate_latency().await;
        let removed = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut projects = store.projects.write().await;
                let before = projects.len();
                projects.retain(|p| p.id != id);
                projects.len() < before
            }
            Backend::DynamoDb(client) => ProjectTable::delete_item(client, PROJECT_PARTITION.to_string(), id.to_string())
                .await?
                .is_some(),
        };
        if !removed {
            return Err(AppError::NotFound(format!("Project '{}' not found", id)));
        }
        info!(project_id = %id, "Deleted project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use std::sync::Arc;
    use std::time::Duration;

    fn repository() -> Repository {
        Repository::in_memory(Arc::new(SequentialIds::default()), Duration::ZERO)
    }

    fn demo() -> NewProject {
        NewProject {
            name: "Demo".to_string(),
            key: "DEMO".to_string(),
            client: None,
        }
    }

    #[tokio::test]
    async fn created_project_is_listed() {
        let repository = repository();
        let created = repository.projects().create(demo()).await.unwrap();
        assert_eq!(created.id, "proj-0001");
        assert_eq!(created.client, "N/A");

        let projects = repository.projects().list().await.unwrap();
        assert!(projects.iter().any(|p| p.key == "DEMO"));
    }

    #[tokio::test]
    async fn empty_name_is_a_validation_error() {
        let result = repository()
            .projects()
            .create(NewProject {
                name: "".to_string(),
                key: "X".to_string(),
                client: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation { field: "name", .. })));
    }

    #[tokio::test]
    async fn key_rules_are_enforced() {
        let repository = repository();
        let too_long = NewProject {
            key: "TOOLONG".to_string(),
            ..demo()
        };
        assert!(matches!(
            repository.projects().create(too_long).await,
            Err(AppError::Validation { field: "key", .. })
        ));

        let lower = repository
            .projects()
            .create(NewProject {
                key: " shop ".to_string(),
                ..demo()
            })
            .await
            .unwrap();
        assert_eq!(lower.key, "SHOP");

        let duplicate = repository
            .projects()
            .create(NewProject {
                key: "Shop".to_string(),
                ..demo()
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::Validation { field: "key", .. })));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_own_key() {
        let repository = repository();
        let created = repository.projects().create(demo()).await.unwrap();
        let updated = repository
            .projects()
            .update(
                &created.id,
                ProjectChanges {
                    key: Some("demo".to_string()),
                    client: Some("Acme".to_string()),
                    ..ProjectChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Demo");
        assert_eq!(updated.key, "DEMO");
        assert_eq!(updated.client, "Acme");

        let cleared = repository
            .projects()
            .update(
                &created.id,
                ProjectChanges {
                    client: Some("  ".to_string()),
                    ..ProjectChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.client, NO_CLIENT);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let repository = repository();
        assert!(matches!(
            repository.projects().update("proj-x", ProjectChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(repository.projects().delete("proj-x").await, Err(AppError::NotFound(_))));
        assert!(repository.projects().get("proj-x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let repository = repository();
        let created = repository.projects().create(demo()).await.unwrap();
        repository.projects().delete(&created.id).await.unwrap();
        assert!(repository.projects().get(&created.id).await.unwrap().is_none());
        assert!(matches!(repository.projects().delete(&created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_latency_is_applied() {
        let repository = Repository::in_memory(Arc::new(SequentialIds::default()), Duration::from_millis(800));
        let started = tokio::time::Instant::now();
        repository.projects().list().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(800));
    }
}
