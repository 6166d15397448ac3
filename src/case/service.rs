use crate::activity::model::ActivityAction;
use crate::api::AppError;
use crate::case::model::{NewTestCase, Priority, Status, TestCase, TestCaseChanges, UNASSIGNED};
use crate::case::query::{run_query, QueryPage, TestCaseQuery};
use crate::ids::short_code;
use crate::persistence::repo::{Backend, Repository, Table};
use crate::suggestion::model::AiSuggestion;
use crate::validation::{required, required_if_present};
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

pub(crate) struct TestCaseTable();

impl Table<TestCase> for TestCaseTable {
    fn table_name() -> String {
        "test_cases".to_string()
    }

    fn partition_key_name() -> String {
        "project_id".to_string()
    }

    fn sort_key_name() -> String {
        "id".to_string()
    }

    fn partition_key_from_entity(entity: &TestCase) -> (String, AttributeValue) {
        Self::partition_key(entity.project_id.clone())
    }

    fn sort_key_from_entity(entity: &TestCase) -> (String, AttributeValue) {
        Self::sort_key(entity.id.clone())
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn subject(test_case: &TestCase) -> String {
    format!("test case '{}: {}'", test_case.case_code, test_case.name)
}

fn not_found(project_id: &str, id: &str) -> AppError {
    AppError::NotFound(format!("Test case '{}' not found in project '{}'", id, project_id))
}

pub struct TestCaseOperations {
    pub(crate) repository: Repository,
}

impl TestCaseOperations {
    /// Every stored case of the project, archived ones included.
    pub(crate) async fn records(&self, project_id: &str) -> Result<Vec<TestCase>, AppError> {
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store
                .test_cases
                .read()
                .await
                .iter()
                .filter(|tc| tc.project_id == project_id)
                .cloned()
                .collect()),
            Backend::DynamoDb(client) => TestCaseTable::list_all_items(client, project_id.to_string()).await,
        }
    }

    pub async fn query(&self, query: TestCaseQuery) -> Result<QueryPage<TestCase>, AppError> {
        self.repository.simulate_latency().await;
        let page = match self.repository.backend() {
            Backend::Memory(store) => run_query(store.test_cases.read().await.iter(), &query),
            Backend::DynamoDb(_) => run_query(&self.records(&query.project_id).await?, &query),
        };
        debug!(
            project_id = %query.project_id,
            total = page.total_count,
            page = page.page,
            "Queried test cases"
        );
        Ok(page)
    }

    pub async fn get(&self, project_id: &str, id: &str) -> Result<Option<TestCase>, AppError> {
        self.repository.simulate_latency().await;
        match self.repository.backend() {
            Backend::Memory(store) => Ok(store
                .test_cases
                .read()
                .await
                .iter()
                .find(|tc| tc.project_id == project_id && tc.id == id)
                .cloned()),
            Backend::DynamoDb(client) => TestCaseTable::get_item(client, project_id.to_string(), id.to_string()).await,
        }
    }

    async fn record(&self, project_id: &str, action: ActivityAction, subject: String) -> Result<(), AppError> {
        self.repository.activity().record(project_id, action, subject).await?;
        Ok(())
    }

    async fn require_directory(&self, project_id: &str, directory: &str) -> Result<String, AppError> {
        let directory = required("directory", directory)?;
        if !self.repository.directories().contains(project_id, &directory).await? {
            return Err(AppError::validation(
                "directory",
                format!("directory '{}' does not exist in project '{}'", directory, project_id),
            ));
        }
        Ok(directory)
    }

    pub async fn create(&self, project_id: &str, new_case: NewTestCase) -> Result<TestCase, AppError> {
        let name = required("name", &new_case.name)?;
        self.repository.projects().require(project_id).await?;
        let directory = self.require_directory(project_id, &new_case.directory).await?;

        let id = self.repository.next_id("tc");
        let case_code = match required_if_present("case_code", new_case.case_code.as_deref())? {
            Some(code) => code,
            None => format!("TC-{}", short_code(&id)),
        };
        let test_case = TestCase::builder()
            .id(id)
            .case_code(case_code)
            .name(name)
            .maybe_description(new_case.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()))
            .maybe_priority(new_case.priority)
            .maybe_status(new_case.status)
            .maybe_assignee(new_case.assignee.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()))
            .last_updated(today())
            .project_id(project_id.to_string())
            .directory(directory)
            .build();
        self.repository.simulate_latency().await;

        let test_case = match self.repository.backend() {
            Backend::Memory(store) => {
                store.test_cases.write().await.push(test_case.clone());
                test_case
            }
            Backend::DynamoDb(client) => TestCaseTable::put_item(client, test_case).await?,
        };
        info!(project_id, test_case_id = %test_case.id, directory = %test_case.directory, "Created test case");
        self.record(project_id, ActivityAction::Created, subject(&test_case)).await?;
        Ok(test_case)
    }

    /// Applies `change` to one stored case and stamps `last_updated`.
    async fn modify<F>(&self, project_id: &str, id: &str, change: F) -> Result<TestCase, AppError>
    where
        F: FnOnce(&mut TestCase),
    {
        self.repository.simulate_latency().await;
        match self.repository.backend() {
            Backend::Memory(store) => {
                let mut test_cases = store.test_cases.write().await;
                let test_case = test_cases
                    .iter_mut()
                    .find(|tc| tc.project_id == project_id && tc.id == id)
                    .ok_or_else(|| not_found(project_id, id))?;
                change(test_case);
                test_case.last_updated = today();
                Ok(test_case.clone())
            }
            Backend::DynamoDb(client) => {
                let mut test_case = TestCaseTable::get_item(client, project_id.to_string(), id.to_string())
                    .await?
                    .ok_or_else(|| not_found(project_id, id))?;
                change(&mut test_case);
                test_case.last_updated = today();
                TestCaseTable::put_item(client, test_case).await
            }
        }
    }

    pub async fn update(&self, project_id: &str, id: &str, changes: TestCaseChanges) -> Result<TestCase, AppError> {
        let name = required_if_present("name", changes.name.as_deref())?;
        let directory = match changes.directory.as_deref() {
            Some(directory) => Some(self.require_directory(project_id, directory).await?),
            None => None,
        };
        let assignee = changes
            .assignee
            .map(|a| a.trim().to_string())
            .map(|a| if a.is_empty() { UNASSIGNED.to_string() } else { a });

        let test_case = self
            .modify(project_id, id, |tc| {
                if let Some(name) = name {
                    tc.name = name;
                }
                if let Some(description) = changes.description {
                    let description = description.trim().to_string();
                    tc.description = Some(description).filter(|d| !d.is_empty());
                }
                if let Some(priority) = changes.priority {
                    tc.priority = priority;
                }
                if let Some(status) = changes.status {
                    tc.status = status;
                }
                if let Some(assignee) = assignee {
                    tc.assignee = assignee;
                }
                if let Some(directory) = directory {
                    tc.directory = directory;
                }
            })
            .await?;
        info!(project_id, test_case_id = %id, "Updated test case");
        self.record(project_id, ActivityAction::Updated, subject(&test_case)).await?;
        Ok(test_case)
    }

    /// Soft delete: the case moves to `Archived` and stays queryable from the trash.
    pub async fn delete(&self, project_id: &str, id: &str) -> Result<TestCase, AppError> {
        let test_case = self.modify(project_id, id, |tc| tc.status = Status::Archived).await?;
        info!(project_id, test_case_id = %id, "Archived test case");
        self.record(project_id, ActivityAction::Archived, subject(&test_case)).await?;
        Ok(test_case)
    }

    /// Archives every listed case that exists and is not archived yet.
    /// Unknown ids are skipped. Returns how many cases were archived.
    pub async fn archive(&self, project_id: &str, ids: &[String]) -> Result<usize, AppError> {
        self.repository.simulate_latency().await;
        let wanted = |tc: &TestCase| tc.project_id == project_id && !tc.is_archived() && ids.contains(&tc.id);
        let archived = match self.repository.backend() {
            Backend::Memory(store) => {
                let mut test_cases = store.test_cases.write().await;
                let mut archived = 0;
                for test_case in test_cases.iter_mut().filter(|tc| wanted(tc)) {
                    test_case.status = Status::Archived;
                    test_case.last_updated = today();
                    archived += 1;
                }
                archived
            }
            Backend::DynamoDb(client) => {
                let changed: Vec<TestCase> = self
                    .records(project_id)
                    .await?
                    .into_iter()
                    .filter(|tc| wanted(tc))
                    .map(|tc| TestCase {
                        status: Status::Archived,
                        last_updated: today(),
                        ..tc
                    })
                    .collect();
                TestCaseTable::batch_put_items(client, &changed).await?;
                changed.len()
            }
        };
        info!(project_id, requested = ids.len(), archived, "Archived test cases");
        if archived > 0 {
            self.record(project_id, ActivityAction::Archived, format!("{} test cases", archived))
                .await?;
        }
        Ok(archived)
    }

    /// Brings an archived case back as a draft.
    pub async fn restore(&self, project_id: &str, id: &str) -> Result<TestCase, AppError> {
        let test_case = self
            .modify(project_id, id, |tc| {
                if tc.is_archived() {
                    tc.status = Status::Draft;
                }
            })
            .await?;
        info!(project_id, test_case_id = %id, "Restored test case");
        self.record(project_id, ActivityAction::Restored, subject(&test_case)).await?;
        Ok(test_case)
    }

    /// Turns accepted suggestions into draft cases in `directory`.
    pub async fn materialize(
        &self,
        project_id: &str,
        directory: &str,
        suggestions: &[AiSuggestion],
    ) -> Result<Vec<TestCase>, AppError> {
        self.repository.projects().require(project_id).await?;
        let directory = self.require_directory(project_id, directory).await?;
        let test_cases = suggestions
            .iter()
            .map(|suggestion| -> Result<TestCase, AppError> {
                let id = self.repository.next_id("tc");
                Ok(TestCase::builder()
                    .case_code(format!("TC-AI-{}", short_code(&id)))
                    .id(id)
                    .name(required("title", &suggestion.title)?)
                    .maybe_description(Some(suggestion.description.trim().to_string()).filter(|d| !d.is_empty()))
                    .priority(Priority::Medium)
                    .status(Status::Draft)
                    .assignee(UNASSIGNED.to_string())
                    .last_updated(today())
                    .project_id(project_id.to_string())
                    .directory(directory.clone())
                    .build())
            })
            .collect::<Result<Vec<TestCase>, AppError>>()?;
        self.repository.simulate_latency().await;

        match self.repository.backend() {
            Backend::Memory(store) => store.test_cases.write().await.extend(test_cases.iter().cloned()),
            Backend::DynamoDb(client) => TestCaseTable::batch_put_items(client, &test_cases).await?,
        }
        info!(project_id, directory = %directory, created = test_cases.len(), "Materialized suggestions");
        self.record(
            project_id,
            ActivityAction::Generated,
            format!("{} test cases in '{}'", test_cases.len(), directory),
        )
        .await?;
        Ok(test_cases)
    }
}
