//! Application state and composition.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    ports::{AccessPolicy, ClockPort, CreatureRepo, EncounterTableRepo, OwnerOnly, RandomPort},
    sqlite::{SqliteCreatureRepo, SqliteEncounterTableRepo},
};
use crate::use_cases::encounter::{
    CloneTable, EncounterSettings, EncounterUseCases, GenerateTable, ReplaceEntry,
    ResolveCandidates, SnapshotBuilder, TableOps, UniqueSampler,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Port traits injected directly.
pub struct Repositories {
    pub creatures: Arc<dyn CreatureRepo>,
    pub tables: Arc<dyn EncounterTableRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub encounter: EncounterUseCases,
}

impl App {
    /// Wire the SQLite adapters and system clock/RNG.
    pub fn new(pool: SqlitePool, settings: EncounterSettings) -> Self {
        Self::from_ports(
            Arc::new(SqliteCreatureRepo::new(pool.clone())),
            Arc::new(SqliteEncounterTableRepo::new(pool)),
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            Arc::new(OwnerOnly),
            settings,
        )
    }

    /// Compose the application from arbitrary port implementations.
    pub fn from_ports(
        creatures: Arc<dyn CreatureRepo>,
        tables: Arc<dyn EncounterTableRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        access: Arc<dyn AccessPolicy>,
        settings: EncounterSettings,
    ) -> Self {
        let resolver = Arc::new(ResolveCandidates::new(creatures.clone()));
        let sampler = Arc::new(UniqueSampler::new(random.clone()));
        let snapshots = Arc::new(SnapshotBuilder::new(
            creatures.clone(),
            clock.clone(),
            settings.snapshot_concurrency,
        ));

        let encounter = EncounterUseCases::new(
            Arc::new(GenerateTable::new(
                resolver.clone(),
                sampler.clone(),
                snapshots.clone(),
                tables.clone(),
                access.clone(),
                clock.clone(),
                random.clone(),
            )),
            Arc::new(ReplaceEntry::new(
                resolver,
                sampler,
                snapshots,
                tables.clone(),
                access.clone(),
                clock.clone(),
                settings.replace_max_attempts,
            )),
            Arc::new(CloneTable::new(tables.clone(), clock.clone(), random.clone())),
            Arc::new(TableOps::new(
                tables.clone(),
                access,
                clock,
                random,
                settings.slug_max_attempts,
            )),
        );

        Self {
            repositories: Repositories { creatures, tables },
            use_cases: UseCases { encounter },
        }
    }
}
