use std::sync::Arc;

use sparsedao_core::schema::SchemaInfoProvider;
use sparsedao_core::storage::{DaoError, Entity, Result};

use crate::config::DaoConfig;
use crate::executor::ExecutorService;

use super::engine::EntityDao;
use super::traits::{LockAttainer, MergeService, RowConverter};

/// Wires an [`EntityDao`] from its collaborators.
///
/// Schema, converter and executor are required. The lock attainer and merge
/// service are optional; enabling merging without a merge service is a
/// configuration error.
pub struct EntityDaoBuilder<E: Entity> {
    schema: Option<Arc<dyn SchemaInfoProvider<E::Id>>>,
    converter: Option<Arc<dyn RowConverter<E>>>,
    executor: Option<ExecutorService>,
    lock_attainer: Option<Arc<dyn LockAttainer<E>>>,
    merge_service: Option<Arc<dyn MergeService>>,
    config: DaoConfig,
}

impl<E: Entity> Default for EntityDaoBuilder<E> {
    fn default() -> Self {
        Self {
            schema: None,
            converter: None,
            executor: None,
            lock_attainer: None,
            merge_service: None,
            config: DaoConfig::default(),
        }
    }
}

impl<E: Entity> EntityDaoBuilder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Arc<dyn SchemaInfoProvider<E::Id>>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn RowConverter<E>>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_executor(mut self, executor: ExecutorService) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_lock_attainer(mut self, attainer: Arc<dyn LockAttainer<E>>) -> Self {
        self.lock_attainer = Some(attainer);
        self
    }

    pub fn with_merge_service(mut self, service: Arc<dyn MergeService>) -> Self {
        self.merge_service = Some(service);
        self
    }

    pub fn with_config(mut self, config: DaoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<EntityDao<E>> {
        let schema = self.schema.ok_or_else(|| missing("schema"))?;
        let converter = self.converter.ok_or_else(|| missing("row converter"))?;
        let executor = self.executor.ok_or_else(|| missing("execution service"))?;

        if self.config.merge_enabled && self.merge_service.is_none() {
            return Err(DaoError::Configuration(
                "merging is enabled but no merge service is configured".to_string(),
            ));
        }

        tracing::debug!(
            table = %schema.main_table_name(),
            lock_type = ?self.config.lock_type,
            versioned = schema.version_column().is_some(),
            merge_enabled = self.config.merge_enabled,
            "Entity DAO built"
        );

        Ok(EntityDao {
            schema,
            converter,
            executor,
            lock_attainer: self.lock_attainer,
            merge_service: self.merge_service,
            config: self.config,
        })
    }
}

fn missing(part: &str) -> DaoError {
    DaoError::Configuration(format!("{part} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::DiffMergeService;
    use crate::testing::{people_executor, person_schema, Person, PersonConverter};

    fn complete() -> EntityDaoBuilder<Person> {
        EntityDaoBuilder::new()
            .with_schema(Arc::new(person_schema()))
            .with_converter(Arc::new(PersonConverter))
            .with_executor(people_executor().0)
    }

    #[test]
    fn test_build_complete() {
        let dao = complete().build().unwrap();
        assert_eq!(dao.table(), "people");
        assert!(dao.cas_column().is_some());
    }

    #[test]
    fn test_missing_converter() {
        let result = EntityDaoBuilder::<Person>::new()
            .with_schema(Arc::new(person_schema()))
            .with_executor(people_executor().0)
            .build();

        assert_eq!(
            result.err(),
            Some(DaoError::Configuration(
                "row converter is required".to_string()
            ))
        );
    }

    #[test]
    fn test_merge_enabled_requires_service() {
        let config = DaoConfig::default().with_merge_enabled(true);

        assert!(matches!(
            complete().with_config(config).build(),
            Err(DaoError::Configuration(_))
        ));

        let dao = complete()
            .with_config(config)
            .with_merge_service(Arc::new(DiffMergeService::new(None)))
            .build()
            .unwrap();
        assert!(dao.active_merge_service(true).is_some());
        assert!(dao.active_merge_service(false).is_none());
    }

    #[test]
    fn test_pessimistic_mode_disables_cas() {
        let config = DaoConfig::default()
            .with_lock_type(sparsedao_core::storage::LockType::Pessimistic);
        let dao = complete().with_config(config).build().unwrap();

        assert!(dao.cas_column().is_none());
    }
}
