//! Store bootstrap: create the item schema and seed the catalog.
//!
//! Runs once at process start, before (or alongside) request traffic:
//!
//! ```text
//! create_schema ── ok ──────────────▶ seed catalog ──▶ Seeded
//!       │
//!       ├── SchemaConflict ─────────▶ AlreadyProvisioned (never re-seed)
//!       │
//!       └── other error ── wait ──▶ retry (bounded by RetryPolicy)
//!                                      └── budget spent ──▶ Exhausted
//! ```
//!
//! Exhaustion is logged, not raised: the process keeps serving and requests
//! fail with a store-unavailable error until the store is provisioned.

use tracing::{error, info, warn};

use storefront_core::DomainResult;
use storefront_inventory::{seed_catalog, Item};

use crate::item_store::{ItemStore, ItemStoreError};
use crate::retry::RetryPolicy;

/// How a bootstrap run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapReport {
    /// Fresh store: schema created and `items` seed records written.
    Seeded { items: usize, attempts: u32 },
    /// Schema already existed; nothing was written.
    AlreadyProvisioned { attempts: u32 },
    /// Retry budget spent without reaching the store.
    Exhausted {
        attempts: u32,
        last_error: ItemStoreError,
    },
}

impl BootstrapReport {
    pub fn is_ready(&self) -> bool {
        !matches!(self, BootstrapReport::Exhausted { .. })
    }
}

enum Provisioned {
    Seeded(usize),
    AlreadyPresent,
}

/// Idempotent schema-create-and-seed routine.
#[derive(Debug)]
pub struct Bootstrapper<S> {
    store: S,
    policy: RetryPolicy,
    catalog: Vec<Item>,
}

impl<S> Bootstrapper<S>
where
    S: ItemStore,
{
    pub fn new(store: S, policy: RetryPolicy, catalog: Vec<Item>) -> Self {
        Self {
            store,
            policy,
            catalog,
        }
    }

    /// Bootstrapper seeding the fixed storefront catalog.
    pub fn with_seed_catalog(store: S, policy: RetryPolicy) -> DomainResult<Self> {
        Ok(Self::new(store, policy, seed_catalog()?))
    }

    pub async fn run(&self) -> BootstrapReport {
        let max_attempts = self.policy.attempts();
        // Once the schema exists, later attempts resume at seeding: calling
        // create_schema again would answer SchemaConflict and strand a
        // half-seeded catalog.
        let mut schema_created = false;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let last_error = match self.provision(&mut schema_created).await {
                Ok(Provisioned::Seeded(items)) => {
                    info!(items, attempts = attempt, "item store seeded");
                    return BootstrapReport::Seeded {
                        items,
                        attempts: attempt,
                    };
                }
                Ok(Provisioned::AlreadyPresent) => {
                    info!(attempts = attempt, "item schema already exists; skipping seed");
                    return BootstrapReport::AlreadyProvisioned { attempts: attempt };
                }
                Err(e) => e,
            };

            if !self.policy.should_retry(attempt) {
                error!(
                    attempts = attempt,
                    error = %last_error,
                    "failed to bootstrap item store after {attempt} attempts; continuing degraded"
                );
                return BootstrapReport::Exhausted {
                    attempts: attempt,
                    last_error,
                };
            }

            let delay = self.policy.delay_after_attempt(attempt);
            warn!(
                attempt,
                retries_left = max_attempts - attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "waiting for item store to become ready"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn provision(&self, schema_created: &mut bool) -> Result<Provisioned, ItemStoreError> {
        if !*schema_created {
            match self.store.create_schema().await {
                Ok(()) => {
                    *schema_created = true;
                    info!("created item schema");
                }
                Err(ItemStoreError::SchemaConflict) => return Ok(Provisioned::AlreadyPresent),
                Err(e) => return Err(e),
            }
        }

        for item in &self.catalog {
            self.store.put_item(item).await?;
        }
        Ok(Provisioned::Seeded(self.catalog.len()))
    }
}
