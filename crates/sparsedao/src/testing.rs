//! Fixtures shared by the crate's tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sparsedao_core::filter::Scan;
use sparsedao_core::row::{decode_version, encode_version, Column, Deletion, Mutation, Row};
use sparsedao_core::schema::{FilterConfig, SchemaInfo};
use sparsedao_core::storage::{
    DaoError, Entity, Result, StoreError, StoreResult, Table, TableProvider,
};

use crate::config::{DaoConfig, ExecutorConfig};
use crate::dao::{EntityDao, EntityDaoBuilder, LockAttainer, RowConverter};
use crate::executor::ExecutorService;
use crate::storage::memory::MemoryStore;

pub const PEOPLE: &str = "people";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
    pub version: Option<i64>,
}

impl Person {
    pub fn new(id: &str, name: &str, age: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            age,
            email: None,
            version: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}

impl Entity for Person {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn version(&self) -> Option<i64> {
        self.version
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }
}

pub fn person_schema() -> SchemaInfo<String> {
    SchemaInfo::new(PEOPLE)
        .with_filter("id", FilterConfig::row_key())
        .with_filter("name", FilterConfig::column("info", "name"))
        .with_filter(
            "age",
            FilterConfig::column("info", "age").with_filter_if_missing(true),
        )
        .with_filter("email", FilterConfig::column("info", "email"))
        .with_version_column("meta", "version")
}

pub struct PersonConverter;

#[async_trait]
impl RowConverter<Person> for PersonConverter {
    async fn to_rows(
        &self,
        person: &Person,
        _executor: &ExecutorService,
        _pessimistic: bool,
    ) -> Result<Vec<(String, Mutation)>> {
        let mut mutation = Mutation::new(&person.id)
            .with_put("info", "name", &person.name)
            .with_put("info", "age", person.age.to_string());
        if let Some(email) = &person.email {
            mutation.put("info", "email", email);
        }
        if let Some(version) = person.version {
            mutation.put("meta", "version", encode_version(version));
        }
        Ok(vec![(PEOPLE.to_string(), mutation)])
    }

    async fn to_deletable_rows(
        &self,
        person: &Person,
        _executor: &ExecutorService,
        _pessimistic: bool,
    ) -> Result<Vec<(String, Deletion)>> {
        Ok(vec![(PEOPLE.to_string(), Deletion::row(&person.id))])
    }

    async fn from_row(&self, row: &Row, _executor: &ExecutorService) -> Result<Option<Person>> {
        let id = String::from_utf8_lossy(row.key()).into_owned();
        let name = info_text(row, b"name")
            .ok_or_else(|| DaoError::Conversion(format!("row {id} has no name")))?;
        let age = info_text(row, b"age")
            .unwrap_or_default()
            .parse::<u32>()
            .map_err(|_| DaoError::Conversion(format!("row {id} has no valid age")))?;
        let version = match row.get(b"meta", b"version") {
            Some(bytes) => Some(decode_version(bytes).ok_or_else(|| {
                DaoError::InvalidData(format!("row {id} has a malformed version"))
            })?),
            None => None,
        };

        Ok(Some(Person {
            id,
            name,
            age,
            email: info_text(row, b"email"),
            version,
        }))
    }
}

fn info_text(row: &Row, qualifier: &[u8]) -> Option<String> {
    row.get(b"info", qualifier)
        .map(|value| String::from_utf8_lossy(value).into_owned())
}

/// Records every release, in order.
#[derive(Default)]
pub struct RecordingLockAttainer {
    released: Mutex<Vec<String>>,
}

impl RecordingLockAttainer {
    pub fn releases(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    pub fn release_count(&self, id: &str) -> usize {
        self.releases().iter().filter(|released| *released == id).count()
    }
}

#[async_trait]
impl LockAttainer<Person> for RecordingLockAttainer {
    async fn unlock_and_evict(&self, person: &Person) {
        self.released.lock().unwrap().push(person.id.clone());
    }
}

/// Serves tables whose reads work and whose writes all fail.
pub struct FailingWrites {
    inner: MemoryStore,
}

impl FailingWrites {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TableProvider for FailingWrites {
    async fn table(&self, name: &str) -> StoreResult<Arc<dyn Table>> {
        let inner = self.inner.table(name).await?;
        Ok(Arc::new(FailingTable { inner }))
    }
}

struct FailingTable {
    inner: Arc<dyn Table>,
}

fn rejected() -> StoreError {
    StoreError::OperationFailed("write rejected".to_string())
}

#[async_trait]
impl Table for FailingTable {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, row: &[u8]) -> StoreResult<Option<Row>> {
        self.inner.get(row).await
    }

    async fn exists(&self, row: &[u8]) -> StoreResult<bool> {
        self.inner.exists(row).await
    }

    async fn scan(&self, scan: &Scan, limit: usize) -> StoreResult<Vec<Row>> {
        self.inner.scan(scan, limit).await
    }

    async fn put(&self, _mutations: Vec<Mutation>) -> StoreResult<()> {
        Err(rejected())
    }

    async fn check_and_put(
        &self,
        _row: &[u8],
        _column: &Column,
        _expected: Option<&[u8]>,
        _mutation: Mutation,
    ) -> StoreResult<bool> {
        Err(rejected())
    }

    async fn delete(&self, _deletions: Vec<Deletion>) -> StoreResult<()> {
        Err(rejected())
    }

    async fn check_and_delete(
        &self,
        _row: &[u8],
        _column: &Column,
        _expected: Option<&[u8]>,
        _deletion: Deletion,
    ) -> StoreResult<bool> {
        Err(rejected())
    }
}

pub fn people_executor() -> (ExecutorService, MemoryStore) {
    let store = MemoryStore::with_tables([PEOPLE]);
    let executor = ExecutorService::new(ExecutorConfig::default(), Arc::new(store.clone()));
    (executor, store)
}

pub fn person_dao_builder(executor: ExecutorService) -> EntityDaoBuilder<Person> {
    EntityDao::builder()
        .with_schema(Arc::new(person_schema()))
        .with_converter(Arc::new(PersonConverter))
        .with_executor(executor)
}

pub fn person_dao() -> (EntityDao<Person>, MemoryStore) {
    person_dao_with(DaoConfig::default())
}

pub fn person_dao_with(config: DaoConfig) -> (EntityDao<Person>, MemoryStore) {
    let (executor, store) = people_executor();
    let dao = person_dao_builder(executor)
        .with_config(config)
        .build()
        .unwrap();
    (dao, store)
}

/// Stores Ada (1, 36), Alan (2, 29) and Grace (3, 45), each at version 1.
pub async fn seed_people(store: &MemoryStore) {
    let table = store.memory_table(PEOPLE).await.unwrap();
    let rows = [("1", "Ada", "36"), ("2", "Alan", "29"), ("3", "Grace", "45")]
        .into_iter()
        .map(|(id, name, age)| {
            Mutation::new(id)
                .with_put("info", "name", name)
                .with_put("info", "age", age)
                .with_put("meta", "version", encode_version(1))
        })
        .collect();
    table.put(rows).await.unwrap();
}

/// Version stored for `id`, read directly from the table.
pub async fn stored_version(store: &MemoryStore, id: &str) -> Option<i64> {
    let table = store.memory_table(PEOPLE).await.unwrap();
    let row = table.get(id.as_bytes()).await.unwrap()?;
    row.get(b"meta", b"version").and_then(decode_version)
}
