//! End-to-end walk through the engine on the in-memory store.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use sparsedao::cache::MemoryCache;
use sparsedao::config::Config;
use sparsedao::dao::{EntityDao, EntityDaoBuilder, RowConverter};
use sparsedao::executor::ExecutorService;
use sparsedao::lock::LocalLockAttainer;
use sparsedao::merge::DiffMergeService;
use sparsedao::storage::memory::MemoryStore;
use sparsedao_core::query::{MatchMode, QueryParameter};
use sparsedao_core::row::{decode_version, encode_version, Column, Deletion, Mutation, Row};
use sparsedao_core::schema::{FilterConfig, SchemaInfo};
use sparsedao_core::storage::{dao_error_kind, DaoError, Entity};

const ACCOUNTS: &str = "accounts";

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    owner: String,
    balance: i64,
    version: Option<i64>,
}

impl Account {
    fn open(owner: &str, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            balance,
            version: None,
        }
    }
}

impl Entity for Account {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> Option<i64> {
        self.version
    }

    fn is_valid(&self) -> bool {
        !self.owner.trim().is_empty()
    }
}

struct AccountConverter;

#[async_trait]
impl RowConverter<Account> for AccountConverter {
    async fn to_rows(
        &self,
        account: &Account,
        _executor: &ExecutorService,
        _pessimistic: bool,
    ) -> sparsedao_core::storage::Result<Vec<(String, Mutation)>> {
        let mut mutation = Mutation::new(account.id.to_string())
            .with_put("data", "owner", &account.owner)
            .with_put("data", "balance", account.balance.to_string());
        if let Some(version) = account.version {
            mutation.put("meta", "version", encode_version(version));
        }
        Ok(vec![(ACCOUNTS.to_string(), mutation)])
    }

    async fn to_deletable_rows(
        &self,
        account: &Account,
        _executor: &ExecutorService,
        _pessimistic: bool,
    ) -> sparsedao_core::storage::Result<Vec<(String, Deletion)>> {
        Ok(vec![(
            ACCOUNTS.to_string(),
            Deletion::row(account.id.to_string()),
        )])
    }

    async fn from_row(
        &self,
        row: &Row,
        _executor: &ExecutorService,
    ) -> sparsedao_core::storage::Result<Option<Account>> {
        let key = String::from_utf8_lossy(row.key()).into_owned();
        let id = key
            .parse::<Uuid>()
            .map_err(|_| DaoError::Conversion(format!("row {key} is not an account id")))?;
        let owner = row
            .get(b"data", b"owner")
            .map(|owner| String::from_utf8_lossy(owner).into_owned())
            .ok_or_else(|| DaoError::Conversion(format!("account {key} has no owner")))?;
        let balance = row
            .get(b"data", b"balance")
            .and_then(|balance| std::str::from_utf8(balance).ok())
            .and_then(|balance| balance.parse::<i64>().ok())
            .ok_or_else(|| DaoError::Conversion(format!("account {key} has no balance")))?;

        Ok(Some(Account {
            id,
            owner,
            balance,
            version: row.get(b"meta", b"version").and_then(decode_version),
        }))
    }
}

fn account_dao(config: &Config, store: &MemoryStore) -> Result<EntityDao<Account>> {
    let schema: SchemaInfo<Uuid> = SchemaInfo::new(ACCOUNTS)
        .with_filter("id", FilterConfig::row_key())
        .with_filter("owner", FilterConfig::column("data", "owner"))
        .with_filter(
            "balance",
            FilterConfig::column("data", "balance").with_filter_if_missing(true),
        )
        .with_version_column("meta", "version");

    let cache: Arc<MemoryCache<String, Account>> =
        Arc::new(MemoryCache::new(config.cache_max_entries).with_default_ttl(config.cache_ttl()));
    let locks = LocalLockAttainer::<Account>::default().with_cache(cache);
    let executor = ExecutorService::new(config.executor, Arc::new(store.clone()));

    let dao = EntityDaoBuilder::new()
        .with_schema(Arc::new(schema))
        .with_converter(Arc::new(AccountConverter))
        .with_executor(executor)
        .with_lock_attainer(Arc::new(locks))
        .with_merge_service(Arc::new(DiffMergeService::new(Some(Column::new(
            "meta", "version",
        )))))
        .with_config(config.dao)
        .build()?;
    Ok(dao)
}

pub async fn run(config: &Config) -> Result<()> {
    let store = MemoryStore::with_tables([ACCOUNTS]);
    let dao = account_dao(config, &store)?;

    let alice = Account::open("Alice", 120);
    let bob = Account::open("Bob", 80);
    dao.save(&[alice.clone(), bob.clone()]).await?;
    tracing::info!(alice = %alice.id, bob = %bob.id, "Saved two accounts");

    let mut current = dao
        .get_by_id(&alice.id)
        .await?
        .context("saved account is missing")?;
    tracing::info!(version = ?current.version, "Fetched account");

    current.balance += 50;
    dao.update(std::slice::from_ref(&current)).await?;

    let stale = Account {
        balance: 0,
        ..alice.clone()
    };
    match dao.update(&[stale]).await {
        Err(e @ DaoError::Concurrency(_)) => {
            tracing::info!(kind = dao_error_kind(&e), error = %e, "Stale update rejected");
        }
        Err(e) => return Err(e.into()),
        Ok(()) => tracing::warn!("Stale update was applied"),
    }

    let rich = dao
        .get_list(&[
            QueryParameter::like("owner", "A", MatchMode::Start),
            QueryParameter::greater_equal("balance", "150"),
        ])
        .await?;
    tracing::info!(matches = rich.len(), "Queried accounts");

    let everyone = dao.get_by_ids(&[alice.id, bob.id, Uuid::new_v4()]).await?;
    tracing::info!(found = everyone.len(), "Bulk read");

    let latest = dao
        .get_by_id(&alice.id)
        .await?
        .context("updated account is missing")?;
    dao.delete(&[latest]).await?;
    tracing::info!(
        remaining = dao.get_all().await?.len(),
        writes = store.write_count().await,
        "Deleted account"
    );

    Ok(())
}
