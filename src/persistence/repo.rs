use crate::activity::service::ActivityOperations;
use crate::api::AppError;
use crate::case::service::TestCaseOperations;
use crate::directory::service::DirectoryOperations;
use crate::ids::IdGenerator;
use crate::persistence::memory::MemoryStore;
use crate::persistence::model::{PageKey, QueryResult};
use crate::persistence::seed;
use crate::project::service::ProjectOperations;
use crate::suite::service::SuiteOperations;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, ReturnValue, WriteRequest};
use aws_sdk_dynamodb::Client;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_dynamo::aws_sdk_dynamodb_1::to_item;
use serde_dynamo::from_item;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const BATCH_WRITE_LIMIT: usize = 25;

pub(crate) trait Table<T>
where
    T: DeserializeOwned + Serialize + Clone,
{
    fn table_name() -> String;
    fn partition_key_name() -> String;
    fn sort_key_name() -> String;

    fn partition_key(value: String) -> (String, AttributeValue) {
        (Self::partition_key_name(), AttributeValue::S(value))
    }

    fn sort_key(value: String) -> (String, AttributeValue) {
        (Self::sort_key_name(), AttributeValue::S(value))
    }

    fn partition_key_from_entity(entity: &T) -> (String, AttributeValue);
    fn sort_key_from_entity(entity: &T) -> (String, AttributeValue);

    fn unique_key(partition_key: String, sort_key: String) -> HashMap<String, AttributeValue> {
        HashMap::from([Self::partition_key(partition_key), Self::sort_key(sort_key)])
    }

    fn to_table_item(entity: &T) -> Result<HashMap<String, AttributeValue>, AppError> {
        let mut item = to_item(entity).map_err(internal)?;
        let partition_key = Self::partition_key_from_entity(entity);
        let sort_key = Self::sort_key_from_entity(entity);
        item.insert(partition_key.0, partition_key.1);
        item.insert(sort_key.0, sort_key.1);
        Ok(item)
    }

    async fn get_item(client: &Client, partition_key: String, sort_key: String) -> Result<Option<T>, AppError> {
        let output = client
            .get_item()
            .table_name(Self::table_name())
            .set_key(Some(Self::unique_key(partition_key, sort_key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(internal)?;
        match output.item {
            Some(item_map) => Ok(Some(from_item(item_map).map_err(internal)?)),
            None => Ok(None),
        }
    }

    async fn put_item(client: &Client, entity: T) -> Result<T, AppError> {
        let item = Self::to_table_item(&entity)?;
        client
            .put_item()
            .table_name(Self::table_name())
            .set_item(Some(item))
            .send()
            .await
            .map_err(internal)?;
        Ok(entity)
    }

    /// Deletes the item and returns what was stored, `None` when nothing matched.
    async fn delete_item(client: &Client, partition_key: String, sort_key: String) -> Result<Option<T>, AppError> {
        let output = client
            .delete_item()
            .table_name(Self::table_name())
            .set_key(Some(Self::unique_key(partition_key, sort_key)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(internal)?;
        match output.attributes {
            Some(item_map) => Ok(Some(from_item(item_map).map_err(internal)?)),
            None => Ok(None),
        }
    }

    async fn list_items(
        client: &Client,
        partition_key: String,
        next_page_key: Option<String>,
    ) -> Result<QueryResult<T>, AppError> {
        let exclusive_start_key = match next_page_key {
            Some(next) => Some(PageKey::from_next_page_key(&next).map_err(internal)?.to_attribute_values()),
            None => None,
        };
        let output = client
            .query()
            .table_name(Self::table_name())
            .expression_attribute_names("#pk", Self::partition_key_name())
            .expression_attribute_values(":pk", AttributeValue::S(partition_key))
            .key_condition_expression("#pk = :pk")
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(internal)?;
        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| from_item(item).map_err(internal))
            .collect::<Result<Vec<T>, AppError>>()?;
        let next_page_key = match output.last_evaluated_key {
            Some(last_key) => Some(PageKey::from_attribute_values(last_key).to_next_page_key().map_err(internal)?),
            None => None,
        };
        Ok(QueryResult { items, next_page_key })
    }

    async fn list_all_items(client: &Client, partition_key: String) -> Result<Vec<T>, AppError> {
        let mut next_page_key = None;
        let mut items: Vec<T> = vec![];
        loop {
            let query_result = Self::list_items(client, partition_key.clone(), next_page_key).await?;
            items.extend(query_result.items);
            next_page_key = query_result.next_page_key;
            if next_page_key.is_none() {
                break;
            }
        }
        Ok(items)
    }

    async fn batch_put_items(client: &Client, entities: &[T]) -> Result<(), AppError> {
        let write_requests = entities
            .iter()
            .map(|entity| {
                let put_request = PutRequest::builder()
                    .set_item(Some(Self::to_table_item(entity)?))
                    .build()
                    .map_err(internal)?;
                Ok(WriteRequest::builder().put_request(put_request).build())
            })
            .collect::<Result<Vec<WriteRequest>, AppError>>()?;
        batch_write(client, write_requests, &Self::table_name()).await
    }
}

#[derive(Clone)]
pub(crate) enum Backend {
    Memory(Arc<MemoryStore>),
    DynamoDb(Arc<Client>),
}

/// Entry point to all stores. Cheap to clone; each clone shares the backend.
#[derive(Clone)]
pub struct Repository {
    backend: Backend,
    ids: Arc<dyn IdGenerator>,
    latency: Duration,
}

impl Repository {
    pub fn in_memory(ids: Arc<dyn IdGenerator>, latency: Duration) -> Self {
        Repository {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
            ids,
            latency,
        }
    }

    pub async fn dynamodb(ids: Arc<dyn IdGenerator>) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        Repository {
            backend: Backend::DynamoDb(Arc::new(client)),
            ids,
            latency: Duration::ZERO,
        }
    }

    /// Loads the demo data set. Only the memory backend is seeded.
    pub async fn seed(&self) {
        match &self.backend {
            Backend::Memory(store) => seed::load(store).await,
            Backend::DynamoDb(_) => tracing::warn!("seeding is only supported by the memory backend"),
        }
    }

    pub fn ids(&self) -> Arc<dyn IdGenerator> {
        self.ids.clone()
    }

    pub(crate) fn next_id(&self, prefix: &str) -> String {
        self.ids.next_id(prefix)
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Sleeps for the configured latency; a no-op for DynamoDB and zero latency.
    pub(crate) async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub fn projects(&self) -> ProjectOperations {
        ProjectOperations {
            repository: self.clone(),
        }
    }

    pub fn suites(&self) -> SuiteOperations {
        SuiteOperations {
            repository: self.clone(),
        }
    }

    pub fn test_cases(&self) -> TestCaseOperations {
        TestCaseOperations {
            repository: self.clone(),
        }
    }

    pub fn directories(&self) -> DirectoryOperations {
        DirectoryOperations {
            repository: self.clone(),
        }
    }

    pub fn activity(&self) -> ActivityOperations {
        ActivityOperations {
            repository: self.clone(),
        }
    }
}

pub(crate) fn internal<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Internal(err.to_string())
}

async fn batch_write(client: &Client, write_requests: Vec<WriteRequest>, table_name: &str) -> Result<(), AppError> {
    let writes = write_requests.chunks(BATCH_WRITE_LIMIT).map(|chunk| {
        client
            .batch_write_item()
            .set_request_items(Some(HashMap::from([(table_name.to_string(), chunk.to_vec())])))
            .send()
    });
    try_join_all(writes).await.map_err(internal)?;
    Ok(())
}
