use crate::activity::model::{Activity, ActivityAction};
use crate::api::AppError;
use crate::persistence::repo::{Backend, Repository, Table};
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use tracing::debug;

pub(crate) struct ActivityTable();

impl Table<Activity> for ActivityTable {
    fn table_name() -> String {
        "project_activity".to_string()
    }

    fn partition_key_name() -> String {
        "project_id".to_string()
    }

    fn sort_key_name() -> String {
        "id".to_string()
    }

    fn partition_key_from_entity(entity: &Activity) -> (String, AttributeValue) {
        Self::partition_key(entity.project_id.clone())
    }

    fn sort_key_from_entity(entity: &Activity) -> (String, AttributeValue) {
        Self::sort_key(entity.id.clone())
    }
}

pub struct ActivityOperations {
    pub(crate) repository: Repository,
}

impl ActivityOperations {
    pub async fn record(
        &self,
        project_id: &str,
        action: ActivityAction,
        subject: impl Into<String>,
    ) -> Result<Activity, AppError> {
        let activity = Activity {
            id: self.repository.next_id("act"),
            project_id: project_id.to_string(),
            action,
            subject: subject.into(),
            at: Utc::now(),
        };
        match self.repository.backend() {
            Backend::Memory(store) => store.activity.write().await.push(activity.clone()),
            Backend::DynamoDb(client) => {
                ActivityTable::put_item(client, activity.clone()).await?;
            }
        }
        debug!(project_id, action = ?activity.action, subject = %activity.subject, "Recorded activity");
        Ok(activity)
    }

    /// Newest first, at most `limit` entries.
    pub async fn recent(&self, project_id: &str, limit: usize) -> Result<Vec<Activity>, AppError> {
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store
                .activity
                .read()
                .await
                .iter()
                .rev()
                .filter(|a| a.project_id == project_id)
                .take(limit)
                .cloned()
                .collect()),
            Backend::DynamoDb(client) => {
                let mut entries = ActivityTable::list_all_items(client, project_id.to_string()).await?;
                entries.sort_by(|a, b| b.at.cmp(&a.at));
                entries.truncate(limit);
                Ok(entries)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn recent_is_newest_first_and_per_project() {
        let repository = Repository::in_memory(Arc::new(SequentialIds::default()), Duration::ZERO);
        let activity = repository.activity();
        activity.record("proj-001", ActivityAction::Created, "suite 'Login'").await.unwrap();
        activity.record("proj-002", ActivityAction::Created, "suite 'Cards'").await.unwrap();
        activity.record("proj-001", ActivityAction::Updated, "suite 'Login'").await.unwrap();

        let recent = activity.recent("proj-001", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, ActivityAction::Updated);
        assert_eq!(recent[1].id, "act-0001");

        assert_eq!(activity.recent("proj-001", 1).await.unwrap().len(), 1);
        assert!(activity.recent("proj-404", 10).await.unwrap().is_empty());
    }
}
