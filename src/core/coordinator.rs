//! Run coordinator
//!
//! Sequences the entity seeders in dependency order and builds the final
//! [`RunReport`]. The order is data: an ordered list of
//! [`SeederDescriptor`]s checked by a small topological sort before
//! anything runs.
//!
//! # Workflow
//!
//! 1. **Pre-flight**: apply the schema and probe store health (fatal)
//! 2. **Load sources**: read all three source files (fatal)
//! 3. **Resume**: compute skip offsets from store counts (fails open)
//! 4. **Seed**: run each enabled seeder; a failing seeder does not stop
//!    the ones after it
//! 5. **Report**: per-entity results and totals

use crate::adapters::database::{Backends, CheckpointStore, SeedStore};
use crate::adapters::source::SourceProvider;
use crate::config::{EntityToggles, SeederConfig};
use crate::core::executor::{BatchExecutor, ExecutorSettings};
use crate::core::progress::ProgressTracker;
use crate::core::report::RunReport;
use crate::core::resume::{ResumeCalculator, SkipPlan};
use crate::core::retry::RetryPolicy;
use crate::core::seeders::{all_seeders, SeedContext, Seeder};
use crate::core::state::CheckpointManager;
use crate::domain::{EntityKind, HealthStatus, Result, SeedError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One entry of the seeding plan
pub struct SeederDescriptor {
    pub entity: EntityKind,
    pub enabled: bool,
    pub depends_on: &'static [EntityKind],
    seeder: Box<dyn Seeder>,
}

impl SeederDescriptor {
    pub fn new(seeder: Box<dyn Seeder>, enabled: bool) -> Self {
        Self {
            entity: seeder.entity(),
            enabled,
            depends_on: seeder.depends_on(),
            seeder,
        }
    }
}

impl std::fmt::Debug for SeederDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeederDescriptor")
            .field("entity", &self.entity)
            .field("enabled", &self.enabled)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// Descriptors for every seeder, enabled per `toggles`, in a valid order
///
/// # Errors
///
/// Returns an error if the declared dependencies contain a cycle or name
/// an entity without a seeder.
pub fn seeding_plan(toggles: &EntityToggles) -> Result<Vec<SeederDescriptor>> {
    let descriptors = all_seeders()
        .into_iter()
        .map(|seeder| {
            let enabled = toggles.is_enabled(seeder.entity());
            SeederDescriptor::new(seeder, enabled)
        })
        .collect();
    order_descriptors(descriptors)
}

/// Stable topological sort: among ready descriptors, declaration order wins
pub fn order_descriptors(descriptors: Vec<SeederDescriptor>) -> Result<Vec<SeederDescriptor>> {
    let known: HashSet<EntityKind> = descriptors.iter().map(|d| d.entity).collect();
    for descriptor in &descriptors {
        if let Some(missing) = descriptor.depends_on.iter().find(|dep| !known.contains(dep)) {
            return Err(SeedError::Configuration(format!(
                "{} depends on {missing}, which has no seeder",
                descriptor.entity
            )));
        }
    }

    let mut pending: Vec<Option<SeederDescriptor>> = descriptors.into_iter().map(Some).collect();
    let mut placed: HashSet<EntityKind> = HashSet::new();
    let mut ordered = Vec::with_capacity(pending.len());

    while ordered.len() < pending.len() {
        let ready = pending.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|d| d.depends_on.iter().all(|dep| placed.contains(dep)))
        });

        let Some(index) = ready else {
            let stuck: Vec<String> = pending
                .iter()
                .flatten()
                .map(|d| d.entity.to_string())
                .collect();
            return Err(SeedError::Configuration(format!(
                "Seeder dependencies contain a cycle among: {}",
                stuck.join(", ")
            )));
        };

        if let Some(descriptor) = pending[index].take() {
            placed.insert(descriptor.entity);
            ordered.push(descriptor);
        }
    }

    Ok(ordered)
}

/// Drives one seeding run
pub struct RunCoordinator {
    store: Arc<dyn SeedStore + Send + Sync>,
    checkpoint_store: Option<Arc<dyn CheckpointStore + Send + Sync>>,
    sources: Arc<dyn SourceProvider + Send + Sync>,
    settings: ExecutorSettings,
    retry: RetryPolicy,
    fanout_concurrency: usize,
    toggles: EntityToggles,
    dry_run: bool,
    run_id: String,
}

impl RunCoordinator {
    pub fn new(
        config: &SeederConfig,
        backends: Backends,
        sources: Arc<dyn SourceProvider + Send + Sync>,
        dry_run: bool,
    ) -> Self {
        Self {
            settings: ExecutorSettings::from_config(&config.seed, backends.connection_ceiling),
            store: backends.store,
            checkpoint_store: backends.checkpoints,
            sources,
            retry: RetryPolicy::from_config(&config.retry),
            fanout_concurrency: config.seed.fanout_concurrency,
            toggles: config.seed.entities.clone(),
            dry_run,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Replace the generated run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Apply the schema and check store health
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Database`] if the store is unreachable or
    /// reports itself unhealthy.
    pub async fn preflight(&self) -> Result<HealthStatus> {
        self.store
            .ensure_schema()
            .await
            .map_err(|e| SeedError::Database(format!("Failed to apply schema: {e}")))?;

        let health = self
            .store
            .health_check()
            .await
            .map_err(|e| SeedError::Database(format!("Store health check failed: {e}")))?;

        if !health.is_healthy() {
            return Err(SeedError::Database(format!(
                "Store reported status '{}'",
                health.status
            )));
        }

        tracing::info!(
            backend = %self.store.backend_name(),
            response_time_ms = health.response_time_ms,
            "Store is healthy"
        );
        Ok(health)
    }

    fn checkpoint_manager(&self, fingerprints: HashMap<EntityKind, String>) -> CheckpointManager {
        let fingerprints = fingerprints
            .into_iter()
            .map(|(kind, fingerprint)| (kind.as_str().to_string(), fingerprint))
            .collect();
        match &self.checkpoint_store {
            Some(storage) => CheckpointManager::new_with_storage(Arc::clone(storage), &self.run_id)
                .with_fingerprints(fingerprints),
            None => CheckpointManager::disabled(&self.run_id),
        }
    }

    async fn current_fingerprints(&self) -> HashMap<EntityKind, String> {
        match self.sources.fingerprints().await {
            Ok(fingerprints) => fingerprints,
            Err(e) => {
                tracing::warn!(error = %e, "Could not fingerprint source files");
                HashMap::new()
            }
        }
    }

    /// Compute the skip plan the next run would use
    ///
    /// Unreadable sources fall back to a plan that skips nothing.
    pub async fn skip_plan(&self) -> SkipPlan {
        let sources = match self.sources.load_all().await {
            Ok(sources) => sources,
            Err(e) => return ResumeCalculator::fallback(&e),
        };
        let fingerprints = self.current_fingerprints().await;
        let checkpoints = Arc::new(self.checkpoint_manager(HashMap::new()));
        ResumeCalculator::new(Arc::clone(&self.store), checkpoints)
            .calculate(&sources, &fingerprints)
            .await
    }

    /// Execute the whole run
    ///
    /// # Errors
    ///
    /// Returns an error only for pre-flight failures, unreadable sources or
    /// an invalid seeding plan. Seeder failures are recorded in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let progress = Arc::new(ProgressTracker::new());

        tracing::info!(
            run_id = %self.run_id,
            backend = %self.store.backend_name(),
            sources = %self.sources.describe(),
            dry_run = self.dry_run,
            batch_size = self.settings.batch_size,
            parallel_groups = self.settings.parallel_groups,
            "Starting seeding run"
        );

        let plan = seeding_plan(&self.toggles)?;
        self.preflight().await?;

        let sources = Arc::new(self.sources.load_all().await?);
        let fingerprints = self.current_fingerprints().await;
        let checkpoints = Arc::new(self.checkpoint_manager(fingerprints.clone()));

        let skip_plan = ResumeCalculator::new(Arc::clone(&self.store), Arc::clone(&checkpoints))
            .calculate(&sources, &fingerprints)
            .await;

        let ctx = SeedContext {
            store: Arc::clone(&self.store),
            executor: BatchExecutor::new(self.settings, checkpoints, Arc::clone(&progress)),
            retry: self.retry,
            sources,
            fanout_concurrency: self.fanout_concurrency,
        };

        let mut report = RunReport::new(&self.run_id, self.dry_run);
        let enabled: HashSet<EntityKind> =
            plan.iter().filter(|d| d.enabled).map(|d| d.entity).collect();

        for descriptor in &plan {
            if !descriptor.enabled {
                tracing::info!(entity = %descriptor.entity, "Seeder disabled, skipping");
                continue;
            }

            for dependency in descriptor.depends_on {
                if !enabled.contains(dependency) {
                    tracing::warn!(
                        entity = %descriptor.entity,
                        dependency = %dependency,
                        "Dependency disabled for this run; relying on rows already stored"
                    );
                }
            }

            let skip = skip_plan.skip_for(descriptor.entity);
            tracing::info!(entity = %descriptor.entity, skip = skip, "Running seeder");

            match descriptor.seeder.seed(&ctx, skip).await {
                Ok(result) => report.record(descriptor.entity, skip, result),
                Err(e) => {
                    tracing::error!(
                        entity = %descriptor.entity,
                        error = %e,
                        "Seeder failed, continuing with the next entity"
                    );
                    report.record_failure(descriptor.entity, skip, e);
                }
            }
        }

        let report = report.finish(&progress);
        report.log_summary();
        Ok(report)
    }
}
