//! Catalog browsing and DDL generation with caching
//!
//! Listings are cached per key for a fixed time to live so repeated browsing
//! does not hit the warehouse again. DDL is never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use sqlfan_core::{Session, SessionFactory, close_quietly};
use sqlfan_query::ddl::{self, join_ddl};
use sqlfan_query::{ObjectKind, RetryPolicy, metadata};
use tokio::time::Instant;

use crate::error::ServiceResult;

/// Default lifetime of a cached listing
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ListingKey {
    Databases,
    Schemas {
        database: String,
    },
    Objects {
        kind: ObjectKind,
        database: String,
        schema: String,
    },
}

#[derive(Debug, Clone)]
struct CachedListing {
    names: Vec<String>,
    cached_at: Instant,
}

/// Service for listing databases, schemas and objects, and scripting their DDL
pub struct MetadataService {
    factory: Arc<dyn SessionFactory>,
    policy: RetryPolicy,
    ttl: Duration,
    listings: RwLock<HashMap<ListingKey, CachedListing>>,
}

impl MetadataService {
    /// Create a new metadata service with the default retry policy and TTL
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            policy: RetryPolicy::default(),
            ttl: DEFAULT_LISTING_TTL,
            listings: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Names of every visible database
    #[tracing::instrument(skip(self))]
    pub async fn databases(&self) -> ServiceResult<Vec<String>> {
        self.listing(ListingKey::Databases).await
    }

    /// Names of the schemas in `database`
    #[tracing::instrument(skip(self))]
    pub async fn schemas(&self, database: &str) -> ServiceResult<Vec<String>> {
        self.listing(ListingKey::Schemas {
            database: database.to_string(),
        })
        .await
    }

    /// Names of the objects of `kind` in `database.schema`
    #[tracing::instrument(skip(self))]
    pub async fn objects(
        &self,
        kind: ObjectKind,
        database: &str,
        schema: &str,
    ) -> ServiceResult<Vec<String>> {
        self.listing(ListingKey::Objects {
            kind,
            database: database.to_string(),
            schema: schema.to_string(),
        })
        .await
    }

    /// Drop every cached listing
    pub fn invalidate(&self) {
        let mut listings = self.listings.write();
        tracing::debug!(entries = listings.len(), "invalidating listing cache");
        listings.clear();
    }

    /// DDL of the named objects, joined with the DDL separator.
    ///
    /// Routine names may still carry their listed signature; it is stripped
    /// before the lookup. The first failing object aborts the whole request.
    #[tracing::instrument(skip(self, names), fields(count = names.len()))]
    pub async fn object_ddl(
        &self,
        kind: ObjectKind,
        database: &str,
        schema: &str,
        names: &[String],
    ) -> ServiceResult<String> {
        let session = self.factory.connect().await?;
        let result = collect_object_ddl(session.as_ref(), kind, database, schema, names).await;
        close_quietly(session.as_ref()).await;
        Ok(join_ddl(&result?))
    }

    /// DDL of a whole database
    #[tracing::instrument(skip(self))]
    pub async fn database_ddl(&self, database: &str) -> ServiceResult<String> {
        let session = self.factory.connect().await?;
        let result = ddl::database_ddl(session.as_ref(), database).await;
        close_quietly(session.as_ref()).await;
        Ok(result?)
    }

    fn cached(&self, key: &ListingKey) -> Option<Vec<String>> {
        let listings = self.listings.read();
        let cached = listings.get(key)?;
        if cached.cached_at.elapsed() < self.ttl {
            tracing::debug!(?key, "listing cache hit");
            Some(cached.names.clone())
        } else {
            tracing::debug!(?key, "listing cache entry expired");
            None
        }
    }

    async fn listing(&self, key: ListingKey) -> ServiceResult<Vec<String>> {
        if let Some(names) = self.cached(&key) {
            return Ok(names);
        }

        let session = self.factory.connect().await?;
        let result = self.fetch_listing(session.as_ref(), &key).await;
        close_quietly(session.as_ref()).await;
        let names = result?;

        self.listings.write().insert(
            key,
            CachedListing {
                names: names.clone(),
                cached_at: Instant::now(),
            },
        );
        Ok(names)
    }

    async fn fetch_listing(
        &self,
        session: &dyn Session,
        key: &ListingKey,
    ) -> sqlfan_core::Result<Vec<String>> {
        match key {
            ListingKey::Databases => metadata::list_databases(session, &self.policy).await,
            ListingKey::Schemas { database } => {
                metadata::list_schemas(session, database, &self.policy).await
            }
            ListingKey::Objects {
                kind,
                database,
                schema,
            } => metadata::list_objects(session, *kind, database, schema, &self.policy).await,
        }
    }
}

async fn collect_object_ddl(
    session: &dyn Session,
    kind: ObjectKind,
    database: &str,
    schema: &str,
    names: &[String],
) -> sqlfan_core::Result<Vec<String>> {
    let mut scripts = Vec::with_capacity(names.len());
    for name in names {
        scripts.push(ddl::object_ddl(session, kind, database, schema, name).await?);
    }
    Ok(scripts)
}
