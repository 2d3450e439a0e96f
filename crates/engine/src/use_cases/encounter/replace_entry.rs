//! Replace entry use case.
//!
//! Swaps the creature on one roll of a table, either by a fresh random draw
//! from the table's stored filter or by an explicitly chosen creature.

use std::collections::HashSet;
use std::sync::Arc;

use tablesmith_domain::{
    CreatureId, CreatureSnapshot, EncounterFilter, EncounterTableEntry, RollNumber, TableId,
    TableWithEntries,
};

use crate::infrastructure::ports::{AccessPolicy, ClockPort, EncounterTableRepo, Requester};

use super::error::EncounterError;
use super::resolve_candidates::ResolveCandidates;
use super::sampler::UniqueSampler;
use super::snapshot::SnapshotBuilder;
use super::types::ReplaceMode;

pub struct ReplaceEntry {
    resolver: Arc<ResolveCandidates>,
    sampler: Arc<UniqueSampler>,
    snapshots: Arc<SnapshotBuilder>,
    tables: Arc<dyn EncounterTableRepo>,
    access: Arc<dyn AccessPolicy>,
    clock: Arc<dyn ClockPort>,
    max_attempts: u32,
}

impl ReplaceEntry {
    pub fn new(
        resolver: Arc<ResolveCandidates>,
        sampler: Arc<UniqueSampler>,
        snapshots: Arc<SnapshotBuilder>,
        tables: Arc<dyn EncounterTableRepo>,
        access: Arc<dyn AccessPolicy>,
        clock: Arc<dyn ClockPort>,
        max_attempts: u32,
    ) -> Self {
        Self {
            resolver,
            sampler,
            snapshots,
            tables,
            access,
            clock,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Replace the creature on `roll` of `table_id`.
    ///
    /// Only the entry's creature ref, snapshot and `updated_at` change; the
    /// other entries are never touched.
    pub async fn execute(
        &self,
        table_id: TableId,
        roll: u16,
        mode: ReplaceMode,
        requester: &Requester,
    ) -> Result<EncounterTableEntry, EncounterError> {
        let table = self
            .tables
            .get_table(table_id)
            .await?
            .ok_or_else(|| EncounterError::TableNotFound(table_id.to_string()))?;
        if !self.access.can_modify(table.owner_id, requester) {
            return Err(EncounterError::Forbidden);
        }

        let roll_number = RollNumber::new(roll)
            .ok()
            .filter(|r| table.die_size.contains(*r))
            .ok_or(EncounterError::RollOutOfRange {
                roll_number: roll,
                die_size: table.die_size,
            })?;

        let entries = self.tables.list_entries(table_id).await?;
        let current = TableWithEntries::new(table, entries);
        let mut entry = current
            .entry(roll_number)
            .cloned()
            .ok_or(EncounterError::EntryNotFound {
                table_id,
                roll_number: roll,
            })?;
        let excluded = current.other_creature_ids(roll_number);

        let snapshot = match mode {
            ReplaceMode::Random => {
                self.draw_replacement(&current.table.filter, excluded, requester)
                    .await?
            }
            ReplaceMode::Search { creature_id } => {
                if excluded.contains(&creature_id) {
                    return Err(EncounterError::DuplicateInTable { creature_id });
                }
                self.snapshots.build_by_id(creature_id, requester).await?
            }
        };

        let previous = entry.creature_ref.id;
        entry.replace_with(snapshot, self.clock.now());
        if let Err(e) = self.tables.update_entry(&entry).await {
            if e.is_constraint_violation() {
                // Lost a race with a concurrent replace on the same table
                return Err(EncounterError::DuplicateInTable {
                    creature_id: entry.creature_ref.id,
                });
            }
            return Err(e.into());
        }

        tracing::info!(
            table_id = %table_id,
            roll_number = roll,
            previous_creature = %previous,
            creature_id = %entry.creature_ref.id,
            "Encounter table entry replaced"
        );
        Ok(entry)
    }

    /// One creature from `filter` that is not in `excluded`.
    ///
    /// Creatures that vanish between resolution and snapshotting are excluded
    /// and the draw repeated, up to `max_attempts` draws in total.
    async fn draw_replacement(
        &self,
        filter: &EncounterFilter,
        mut excluded: HashSet<CreatureId>,
        requester: &Requester,
    ) -> Result<CreatureSnapshot, EncounterError> {
        let pool = self.resolver.execute(filter, requester).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let candidate = self
                .sampler
                .sample(&pool, 1, &excluded)?
                .into_iter()
                .next()
                .ok_or(EncounterError::InsufficientCandidates {
                    needed: 1,
                    available: 0,
                })?;

            match self.snapshots.build(candidate, requester).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(EncounterError::CreatureUnavailable {
                    creature_id,
                    reason,
                }) if attempt < self.max_attempts => {
                    tracing::warn!(
                        creature_id = %creature_id,
                        attempt,
                        reason = %reason,
                        "Drawn creature unavailable, drawing again"
                    );
                    excluded.insert(creature_id);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{
        CreatureRepo, MockCreatureRepo, MockEncounterTableRepo, OwnerOnly, RepoError,
    };
    use crate::test_fixtures::{creatures, fixed_now, InMemoryCreatureRepo};
    use chrono::Duration;
    use tablesmith_domain::{
        CreaturePartition, CreatureRecord, CreatureSummary, DieSize, EncounterTable, EntryId,
        TableName, UserId,
    };

    struct Fixture {
        owner: UserId,
        table: TableWithEntries,
        spare: Vec<CreatureRecord>,
    }

    /// A d4 owned by `owner` built from four records, plus `spare` creatures
    /// not on the table.
    fn fixture(spare: usize) -> (Fixture, InMemoryCreatureRepo) {
        let owner = UserId::new();
        let on_table = creatures::official_pack(4, 3);
        let spare: Vec<_> = (0..spare)
            .map(|i| creatures::official(&format!("Spare {}", i), 3))
            .collect();

        let header = EncounterTable::new(
            TableId::new(),
            owner,
            TableName::new("Marsh").unwrap(),
            None,
            DieSize::new(4).unwrap(),
            EncounterFilter::new([CreaturePartition::Official]).with_levels(1, 5),
            fixed_now(),
        );
        let snapshots = on_table
            .iter()
            .map(|r| CreatureSnapshot::from_record(r.clone(), fixed_now()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let table = TableWithEntries::assemble(header, snapshots, EntryId::new, fixed_now())
            .unwrap();

        let mut all = on_table;
        all.extend(spare.iter().cloned());
        (
            Fixture {
                owner,
                table,
                spare,
            },
            InMemoryCreatureRepo::with_records(all),
        )
    }

    fn use_case(
        creatures: Arc<dyn CreatureRepo>,
        tables: MockEncounterTableRepo,
        random: FixedRandom,
    ) -> ReplaceEntry {
        let later = FixedClock(fixed_now() + Duration::hours(1));
        let clock: Arc<dyn ClockPort> = Arc::new(later);
        ReplaceEntry::new(
            Arc::new(ResolveCandidates::new(creatures.clone())),
            Arc::new(UniqueSampler::new(Arc::new(random))),
            Arc::new(SnapshotBuilder::new(creatures, clock.clone(), 4)),
            Arc::new(tables),
            Arc::new(OwnerOnly),
            clock,
            3,
        )
    }

    fn serving(table: &TableWithEntries) -> MockEncounterTableRepo {
        let header = table.table.clone();
        let entries = table.entries.clone();
        let mut repo = MockEncounterTableRepo::new();
        repo.expect_get_table()
            .returning(move |_| Ok(Some(header.clone())));
        repo.expect_list_entries()
            .returning(move |_| Ok(entries.clone()));
        repo
    }

    #[tokio::test]
    async fn random_replace_draws_outside_other_entries() {
        let (fx, creatures) = fixture(1);
        let spare_id = fx.spare[0].id;
        let before = fx.table.entry(RollNumber::new(2).unwrap()).cloned().unwrap();

        let mut tables = serving(&fx.table);
        tables
            .expect_update_entry()
            .withf(move |e| e.id == before.id && e.creature_ref.id == spare_id)
            .times(1)
            .returning(|_| Ok(()));

        // Eligible pool is [slot's own creature, spare]; index 1 is the spare
        let replace = use_case(Arc::new(creatures), tables, FixedRandom(1));
        let entry = replace
            .execute(fx.table.table.id, 2, ReplaceMode::Random, &Requester::User(fx.owner))
            .await
            .unwrap();

        assert_eq!(entry.roll_number.get(), 2);
        assert_eq!(entry.creature_ref.id, spare_id);
        assert_eq!(entry.created_at, fixed_now());
        assert!(entry.updated_at > entry.created_at);
    }

    #[tokio::test]
    async fn search_replace_rejects_creature_on_another_roll() {
        let (fx, creatures) = fixture(0);
        let on_roll_1 = fx.table.entries[0].creature_ref.id;

        let mut tables = serving(&fx.table);
        tables.expect_update_entry().never();

        let replace = use_case(Arc::new(creatures), tables, FixedRandom(0));
        let result = replace
            .execute(
                fx.table.table.id,
                3,
                ReplaceMode::Search {
                    creature_id: on_roll_1,
                },
                &Requester::User(fx.owner),
            )
            .await;
        assert!(matches!(
            result,
            Err(EncounterError::DuplicateInTable { creature_id }) if creature_id == on_roll_1
        ));
    }

    #[tokio::test]
    async fn search_replace_bypasses_filter() {
        let (fx, creatures) = fixture(0);
        // Level 18 lies outside the table's 1-5 filter
        let outsider = creatures::official("Ancient Wyrm", 18);
        let outsider_id = outsider.id;
        creatures.upsert(&outsider).await.unwrap();

        let mut tables = serving(&fx.table);
        tables.expect_update_entry().times(1).returning(|_| Ok(()));

        let replace = use_case(Arc::new(creatures), tables, FixedRandom(0));
        let entry = replace
            .execute(
                fx.table.table.id,
                4,
                ReplaceMode::Search {
                    creature_id: outsider_id,
                },
                &Requester::User(fx.owner),
            )
            .await
            .unwrap();
        assert_eq!(entry.snapshot.name, "Ancient Wyrm");
    }

    #[tokio::test]
    async fn roll_outside_die_is_rejected() {
        let (fx, creatures) = fixture(0);
        let header = fx.table.table.clone();
        let mut tables = MockEncounterTableRepo::new();
        tables
            .expect_get_table()
            .returning(move |_| Ok(Some(header.clone())));
        tables.expect_list_entries().never();

        let replace = use_case(Arc::new(creatures), tables, FixedRandom(0));
        for roll in [0, 5] {
            let result = replace
                .execute(fx.table.table.id, roll, ReplaceMode::Random, &Requester::User(fx.owner))
                .await;
            assert!(matches!(
                result,
                Err(EncounterError::RollOutOfRange { roll_number, die_size })
                    if roll_number == roll && die_size.get() == 4
            ));
        }
    }

    #[tokio::test]
    async fn non_owner_is_forbidden() {
        let (fx, creatures) = fixture(1);
        let header = fx.table.table.clone();
        let mut tables = MockEncounterTableRepo::new();
        tables
            .expect_get_table()
            .returning(move |_| Ok(Some(header.clone())));

        let replace = use_case(Arc::new(creatures), tables, FixedRandom(0));
        let result = replace
            .execute(
                fx.table.table.id,
                1,
                ReplaceMode::Random,
                &Requester::User(UserId::new()),
            )
            .await;
        assert!(matches!(result, Err(EncounterError::Forbidden)));
    }

    #[tokio::test]
    async fn vanished_creature_is_excluded_and_redrawn() {
        let (fx, _) = fixture(0);
        let on_table: Vec<_> = fx.table.entries.iter().map(|e| e.creature_ref.id).collect();
        let ghost = CreatureId::new();
        let real = creatures::official("Will-o-Wisp", 3);
        let real_id = real.id;

        let mut creature_repo = MockCreatureRepo::new();
        let pool: Vec<_> = on_table
            .iter()
            .copied()
            .chain([ghost, real_id])
            .map(|id| CreatureSummary {
                id,
                partition: CreaturePartition::Official,
                name: "Any".to_string(),
                challenge_level: 3,
                speed: "near".to_string(),
                movement_types: vec![],
                description: None,
            })
            .collect();
        creature_repo
            .expect_query()
            .times(1)
            .returning(move |_, _| Ok(pool.clone()));
        creature_repo
            .expect_get_full()
            .withf(move |_, id| *id == ghost)
            .times(1)
            .returning(|_, _| Ok(None));
        creature_repo
            .expect_get_full()
            .withf(move |_, id| *id == real_id)
            .times(1)
            .returning(move |_, _| Ok(Some(real.clone())));

        let mut tables = serving(&fx.table);
        tables.expect_update_entry().times(1).returning(|_| Ok(()));

        // First draw from [own, ghost, real] hits the ghost; the redraw
        // from [own, real] hits the real creature
        let replace = use_case(Arc::new(creature_repo), tables, FixedRandom(1));
        let entry = replace
            .execute(fx.table.table.id, 1, ReplaceMode::Random, &Requester::User(fx.owner))
            .await
            .unwrap();
        assert_eq!(entry.creature_ref.id, real_id);
    }

    #[tokio::test]
    async fn concurrent_duplicate_surfaces_as_duplicate_in_table() {
        let (fx, creatures) = fixture(1);
        let spare_id = fx.spare[0].id;

        let mut tables = serving(&fx.table);
        tables
            .expect_update_entry()
            .returning(|_| Err(RepoError::constraint("UNIQUE constraint failed")));

        let replace = use_case(Arc::new(creatures), tables, FixedRandom(0));
        let result = replace
            .execute(
                fx.table.table.id,
                1,
                ReplaceMode::Search {
                    creature_id: spare_id,
                },
                &Requester::User(fx.owner),
            )
            .await;
        assert!(matches!(
            result,
            Err(EncounterError::DuplicateInTable { creature_id }) if creature_id == spare_id
        ));
    }
}
