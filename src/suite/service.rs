use crate::activity::model::ActivityAction;
use crate::api::AppError;
use crate::persistence::repo::{Backend, Repository, Table};
use crate::suite::model::{NewTestSuite, TestSuite, TestSuiteChanges};
use crate::validation::{required, required_if_present};
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, info};

pub(crate) struct SuiteTable();

impl Table<TestSuite> for SuiteTable {
    fn table_name() -> String {
        "test_suites".to_string()
    }

    fn partition_key_name() -> String {
        "project_id".to_string()
    }

    fn sort_key_name() -> String {
        "id".to_string()
    }

    fn partition_key_from_entity(entity: &TestSuite) -> (String, AttributeValue) {
        Self::partition_key(entity.project_id.clone())
    }

    fn sort_key_from_entity(entity: &TestSuite) -> (String, AttributeValue) {
        Self::sort_key(entity.id.clone())
    }
}

fn not_found(project_id: &str, id: &str) -> AppError {
    AppError::NotFound(format!("Test suite '{}' not found in project '{}'", id, project_id))
}

pub struct SuiteOperations {
    pub(crate) repository: Repository,
}

impl SuiteOperations {
    pub async fn list(&self, project_id: &str) -> Result<Vec<TestSuite>, AppError> {
        self.repository.simulate_latency().await;
        let suites = match self.repository.backend() {
            Backend::Memory(store) => store
                .suites
                .read()
                .await
                .iter()
                .filter(|s| s.project_id == project_id)
                .cloned()
                .collect(),
            Backend::DynamoDb(client) => SuiteTable::list_all_items(client, project_id.to_string()).await?,
        };
        debug!(project_id, count = suites.len(), "Listed test suites");
        Ok(suites)
    }

    pub async fn get(&self, project_id: &str, id: &str) -> Result<Option<TestSuite>, AppError> {
        self.repository.simulate_latency().await;
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store
                .suites
                .read()
                .await
                .iter()
                .find(|s| s.project_id == project_id && s.id == id)
                .cloned()),
            Backend::DynamoDb(client) => SuiteTable::get_item(client, project_id.to_string(), id.to_string()).await,
        }
    }

    pub async fn create(&self, project_id: &str, new_suite: NewTestSuite) -> Result<TestSuite, AppError> {
        let name = required("name", &new_suite.name)?;
        self.repository.projects().require(project_id).await?;
        let suite = TestSuite::builder()
            .id(self.repository.next_id("ts"))
            .project_id(project_id.to_string())
            .name(name)
            .description(new_suite.description.unwrap_or_default().trim().to_string())
            .build();

        let suite = match self.repository.backend() {
            Backend::Memory(store) => {
                store.suites.write().await.push(suite.clone());
                suite
            }
            Backend::DynamoDb(client) => SuiteTable::put_item(client, suite).await?,
        };
        info!(project_id, suite_id = %suite.id, "Created test suite");
        self.repository
            .activity()
            .record(project_id, ActivityAction::Created, format!("test suite '{}'", suite.name))
            .await?;
        Ok(suite)
    }

    pub async fn update(&self, project_id: &str, id: &str, changes: TestSuiteChanges) -> Result<TestSuite, AppError> {
        let name = required_if_present("name", changes.name.as_deref())?;
        let description = changes.description.map(|d| d.trim().to_string());
        self.repository.simulate_latency().await;

        let apply = |suite: &mut TestSuite| {
            if let Some(name) = name.clone() {
                suite.name = name;
            }
            if let Some(description) = description.clone() {
                suite.description = description;
            }
        };
        let suite = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut suites = store.suites.write().await;
                let suite = suites
                    .iter_mut()
                    .find(|s| s.project_id == project_id && s.id == id)
                    .ok_or_else(|| not_found(project_id, id))?;
                apply(suite);
                suite.clone()
            }
            Backend::DynamoDb(client) => {
                let mut suite = SuiteTable::get_item(client, project_id.to_string(), id.to_string())
                    .await?
                    .ok_or_else(|| not_found(project_id, id))?;
                apply(&mut suite);
                SuiteTable::put_item(client, suite).await?
            }
        };
        info!(project_id, suite_id = %suite.id, "Updated test suite");
        self.repository
            .activity()
            .record(project_id, ActivityAction::Updated, format!("test suite '{}'", suite.name))
            .await?;
        Ok(suite)
    }

    pub async fn delete(&self, project_id: &str, id: &str) -> Result<(), AppError> {
        self.repository.simulate_latency().await;
        let removed = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut suites = store.suites.write().await;
                let before = suites.len();
                suites.retain(|s| !(s.project_id == project_id && s.id == id));
                suites.len() < before
            }
            Backend::DynamoDb(client) => SuiteTable::delete_item(client, project_id.to_string(), id.to_string())
                .await?
                .is_some(),
        };
        if !removed {
            return Err(not_found(project_id, id));
        }
        info!(project_id, suite_id = %id, "Deleted test suite");
        self.repository
            .activity()
            .record(project_id, ActivityAction::Deleted, format!("test suite '{}'", id))
            .await?;
        Ok(())
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

    fn checkout() -> NewTestSuite {
        NewTestSuite {
            name: " Returns ".to_string(),
            description: Some("Refund and return flows.".to_string()),
        }
    }

    #[tokio::test]
    async fn lists_only_the_projects_suites() {
        let suites = seeded().await.suites().list("proj-001").await.unwrap();
        let ids: Vec<&str> = suites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ts-01", "ts-02", "ts-06"]);
    }

    #[tokio::test]
    async fn create_trims_and_requires_project() {
        let repository = seeded().await;
        let created = repository.suites().create("proj-003", checkout()).await.unwrap();
        assert_eq!(created.name, "Returns");
        assert_eq!(created.id, "ts-0001");
        assert!(repository.suites().get("proj-003", &created.id).await.unwrap().is_some());

        assert!(matches!(
            repository.suites().create("proj-missing", checkout()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repository
                .suites()
                .create("proj-003", NewTestSuite { name: "  ".to_string(), description: None })
                .await,
            Err(AppError::Validation { field: "name", .. })
        ));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let repository = seeded().await;
        let updated = repository
            .suites()
            .update(
                "proj-001",
                "ts-02",
                TestSuiteChanges {
                    description: Some("Payments only".to_string()),
                    ..TestSuiteChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Checkout");
        assert_eq!(updated.description, "Payments only");
    }

    #[tokio::test]
    async fn suites_are_scoped_by_project() {
        let repository = seeded().await;
        assert!(repository.suites().get("proj-002", "ts-01").await.unwrap().is_none());
        assert!(matches!(
            repository.suites().delete("proj-002", "ts-01").await,
            Err(AppError::NotFound(_))
        ));
        repository.suites().delete("proj-001", "ts-01").await.unwrap();
        assert!(repository.suites().get("proj-001", "ts-01").await.unwrap().is_none());
    }
}
