use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use storefront_infra::{
    AppConfig, BootstrapReport, Bootstrapper, InMemoryItemStore, InventoryQuery, ItemStore,
    PostgresItemStore, PurchaseEngine, StoreBackend,
};
use storefront_observability::{PurchaseMetrics, TracingPurchaseObserver};

pub type SharedStore = Arc<dyn ItemStore>;

/// Process-wide services shared by all handlers.
pub struct AppServices {
    backend: &'static str,
    engine: PurchaseEngine<SharedStore, TracingPurchaseObserver>,
    query: InventoryQuery<SharedStore>,
    bootstrapper: Bootstrapper<SharedStore>,
    metrics: Arc<PurchaseMetrics>,
    bootstrapped: AtomicBool,
}

impl AppServices {
    pub fn new(
        backend: &'static str,
        store: SharedStore,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(PurchaseMetrics::new()?);
        let observer = TracingPurchaseObserver::new(metrics.clone());

        let engine =
            PurchaseEngine::new(store.clone(), observer).with_store_timeout(config.store.timeout);
        let query = InventoryQuery::new(store.clone()).with_timeout(config.store.timeout);
        let bootstrapper = Bootstrapper::with_seed_catalog(store, config.bootstrap.clone())?;

        Ok(Self {
            backend,
            engine,
            query,
            bootstrapper,
            metrics,
            bootstrapped: AtomicBool::new(false),
        })
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn engine(&self) -> &PurchaseEngine<SharedStore, TracingPurchaseObserver> {
        &self.engine
    }

    pub fn query(&self) -> &InventoryQuery<SharedStore> {
        &self.query
    }

    pub fn metrics(&self) -> &Arc<PurchaseMetrics> {
        &self.metrics
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped.load(Ordering::Acquire)
    }

    /// Provision the store; exhaustion is logged by the bootstrapper and
    /// leaves the process serving in degraded mode.
    pub async fn run_bootstrap(&self) -> BootstrapReport {
        let report = self.bootstrapper.run().await;
        if report.is_ready() {
            self.bootstrapped.store(true, Ordering::Release);
        }
        report
    }
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.store.backend {
        StoreBackend::InMemory => build_in_memory_services(config),
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => build_persistent_services(config, database_url, *max_connections),
    }
}

fn build_in_memory_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    // In-memory store (dev/test): state lives for the life of the process.
    tracing::warn!("USE_PERSISTENT_STORES is not set; using the in-memory item store");
    let store: SharedStore = Arc::new(InMemoryItemStore::new());
    AppServices::new(config.store.backend.name(), store, config)
}

fn build_persistent_services(
    config: &AppConfig,
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<AppServices> {
    let store =
        PostgresItemStore::connect_lazy(database_url, max_connections, config.store.timeout)?;
    let store: SharedStore = Arc::new(store);
    AppServices::new(config.store.backend.name(), store, config)
}
