//! Table operations: read, list, update, share, roll, delete.

use std::sync::Arc;

use tablesmith_domain::{
    generate_table_name, EncounterTable, PublicSlug, TableDescription, TableId, TableName,
    TableWithEntries, UserId,
};

use crate::infrastructure::ports::{
    AccessPolicy, ClockPort, EncounterTableRepo, RandomPort, Requester,
};

use super::error::EncounterError;
use super::types::{Page, Pagination, RollResult, TableUpdate};

pub struct TableOps {
    tables: Arc<dyn EncounterTableRepo>,
    access: Arc<dyn AccessPolicy>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    slug_max_attempts: u32,
}

impl TableOps {
    pub fn new(
        tables: Arc<dyn EncounterTableRepo>,
        access: Arc<dyn AccessPolicy>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        slug_max_attempts: u32,
    ) -> Self {
        Self {
            tables,
            access,
            clock,
            random,
            slug_max_attempts: slug_max_attempts.max(1),
        }
    }

    /// A table with its entries. Private tables are visible to their owner only.
    pub async fn get(
        &self,
        table_id: TableId,
        requester: &Requester,
    ) -> Result<TableWithEntries, EncounterError> {
        let table = self.load(table_id).await?;
        if !table.is_public() && !self.access.can_modify(table.owner_id, requester) {
            return Err(EncounterError::Forbidden);
        }
        self.with_entries(table).await
    }

    pub async fn get_public(&self, slug: &str) -> Result<TableWithEntries, EncounterError> {
        let not_found = || EncounterError::TableNotFound(slug.to_string());
        let slug = PublicSlug::new(slug).map_err(|_| not_found())?;
        let table = self
            .tables
            .get_table_by_slug(&slug)
            .await?
            .filter(|t| t.is_public())
            .ok_or_else(not_found)?;
        self.with_entries(table).await
    }

    /// The owner's tables, newest first.
    pub async fn list_for_owner(
        &self,
        owner: UserId,
        pagination: Pagination,
    ) -> Result<Page<EncounterTable>, EncounterError> {
        let items = self
            .tables
            .list_for_owner(owner, pagination.limit(), pagination.offset())
            .await?;
        let total = self.tables.count_for_owner(owner).await?;
        Ok(Page {
            items,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
        })
    }

    /// Change name, description or stored filter. Entries are not regenerated.
    pub async fn update(
        &self,
        table_id: TableId,
        requester: &Requester,
        changes: TableUpdate,
    ) -> Result<EncounterTable, EncounterError> {
        let mut table = self.load_for_modify(table_id, requester).await?;

        if let Some(name) = changes.name {
            table.name = TableName::new(name)?;
        }
        if let Some(description) = changes.description {
            table.description = TableDescription::parse_optional(Some(description.as_str()))?;
        }
        if let Some(filter) = changes.filter {
            filter
                .validate()
                .map_err(|e| EncounterError::InvalidFilter(e.to_string()))?;
            table.filter = filter;
        }
        table.touch(self.clock.now());

        self.tables.update_table(&table).await?;
        tracing::info!(table_id = %table_id, "Encounter table updated");
        Ok(table)
    }

    /// Delete a table and all of its entries.
    pub async fn delete(
        &self,
        table_id: TableId,
        requester: &Requester,
    ) -> Result<(), EncounterError> {
        self.load_for_modify(table_id, requester).await?;
        if !self.tables.delete_table(table_id).await? {
            return Err(EncounterError::TableNotFound(table_id.to_string()));
        }
        tracing::info!(table_id = %table_id, "Encounter table deleted");
        Ok(())
    }

    /// Share or unshare a table. Idempotent in both directions.
    ///
    /// Sharing draws fresh slugs until one is free; an existing slug is kept.
    pub async fn set_visibility(
        &self,
        table_id: TableId,
        requester: &Requester,
        is_public: bool,
    ) -> Result<EncounterTable, EncounterError> {
        let mut table = self.load_for_modify(table_id, requester).await?;
        if table.is_public() == is_public {
            return Ok(table);
        }

        if !is_public {
            table.make_private(self.clock.now());
            self.tables.update_table(&table).await?;
            tracing::info!(table_id = %table_id, "Encounter table unshared");
            return Ok(table);
        }

        for attempt in 1..=self.slug_max_attempts {
            let slug = PublicSlug::generate(|upper| self.random.gen_index(upper));
            if self.tables.slug_exists(&slug).await? {
                tracing::debug!(attempt, "Public slug already taken");
                continue;
            }
            table.make_public(slug, self.clock.now());
            match self.tables.update_table(&table).await {
                Ok(()) => {
                    tracing::info!(
                        table_id = %table_id,
                        slug = table.public_slug().map(PublicSlug::as_str).unwrap_or_default(),
                        "Encounter table shared"
                    );
                    return Ok(table);
                }
                // Taken between the check and the write
                Err(e) if e.is_constraint_violation() => {
                    tracing::debug!(attempt, "Public slug collided on write");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            table_id = %table_id,
            attempts = self.slug_max_attempts,
            "Could not find a free public slug"
        );
        Err(EncounterError::SlugGenerationFailed {
            attempts: self.slug_max_attempts,
        })
    }

    /// Roll the table's die and return the entry it lands on.
    pub async fn roll(
        &self,
        table_id: TableId,
        requester: &Requester,
    ) -> Result<RollResult, EncounterError> {
        let table = self.load(table_id).await?;
        if !table.is_public() && !self.access.can_modify(table.owner_id, requester) {
            return Err(EncounterError::Forbidden);
        }

        let roll_number = table
            .die_size
            .roll(|min, max| self.random.gen_range(min, max))?;
        let entry = self
            .tables
            .get_entry(table_id, roll_number)
            .await?
            .ok_or(EncounterError::EntryNotFound {
                table_id,
                roll_number: roll_number.get(),
            })?;

        tracing::debug!(table_id = %table_id, roll_number = roll_number.get(), "Table rolled");
        Ok(RollResult { roll_number, entry })
    }

    /// An evocative name for a new table.
    pub fn suggest_name(&self) -> String {
        generate_table_name(|upper| self.random.gen_index(upper))
    }

    async fn load(&self, table_id: TableId) -> Result<EncounterTable, EncounterError> {
        self.tables
            .get_table(table_id)
            .await?
            .ok_or_else(|| EncounterError::TableNotFound(table_id.to_string()))
    }

    async fn load_for_modify(
        &self,
        table_id: TableId,
        requester: &Requester,
    ) -> Result<EncounterTable, EncounterError> {
        let table = self.load(table_id).await?;
        if !self.access.can_modify(table.owner_id, requester) {
            return Err(EncounterError::Forbidden);
        }
        Ok(table)
    }

    async fn with_entries(
        &self,
        table: EncounterTable,
    ) -> Result<TableWithEntries, EncounterError> {
        let entries = self.tables.list_entries(table.id).await?;
        Ok(TableWithEntries::new(table, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        MockEncounterTableRepo, MockRandomPort, OwnerOnly, RepoError,
    };
    use crate::test_fixtures::fixed_now;
    use tablesmith_domain::{CreaturePartition, DieSize, EncounterFilter};

    fn private_table(owner: UserId) -> EncounterTable {
        EncounterTable::new(
            TableId::new(),
            owner,
            TableName::new("Sunken Temple").unwrap(),
            None,
            DieSize::new(6).unwrap(),
            EncounterFilter::new([CreaturePartition::Official]),
            fixed_now(),
        )
    }

    fn ops(tables: MockEncounterTableRepo, random: MockRandomPort) -> TableOps {
        TableOps::new(
            Arc::new(tables),
            Arc::new(OwnerOnly),
            Arc::new(FixedClock(fixed_now())),
            Arc::new(random),
            3,
        )
    }

    fn serving(table: &EncounterTable) -> MockEncounterTableRepo {
        let header = table.clone();
        let mut repo = MockEncounterTableRepo::new();
        repo.expect_get_table()
            .returning(move |_| Ok(Some(header.clone())));
        repo
    }

    #[tokio::test]
    async fn private_table_hidden_from_others() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        tables.expect_list_entries().times(1).returning(|_| Ok(vec![]));

        let ops = ops(tables, MockRandomPort::new());
        let stranger = ops.get(table.id, &Requester::User(UserId::new())).await;
        assert!(matches!(stranger, Err(EncounterError::Forbidden)));
        let anonymous = ops.get(table.id, &Requester::Anonymous).await;
        assert!(matches!(anonymous, Err(EncounterError::Forbidden)));

        let mine = ops.get(table.id, &Requester::User(owner)).await.unwrap();
        assert_eq!(mine.table.id, table.id);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let mut tables = MockEncounterTableRepo::new();
        tables.expect_get_table().returning(|_| Ok(None));
        let ops = ops(tables, MockRandomPort::new());

        let result = ops.delete(TableId::new(), &Requester::User(UserId::new())).await;
        assert!(matches!(result, Err(EncounterError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn update_validates_and_keeps_entries() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        tables
            .expect_update_table()
            .withf(|t| t.name.as_str() == "Drowned Temple" && t.description.is_none())
            .times(1)
            .returning(|_| Ok(()));
        tables.expect_replace_all_entries().never();
        let ops = ops(tables, MockRandomPort::new());

        let updated = ops
            .update(
                table.id,
                &Requester::User(owner),
                TableUpdate {
                    name: Some("Drowned Temple".to_string()),
                    description: Some(String::new()),
                    filter: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_str(), "Drowned Temple");

        let bad_filter = ops
            .update(
                table.id,
                &Requester::User(owner),
                TableUpdate {
                    filter: Some(EncounterFilter::new([])),
                    ..TableUpdate::default()
                },
            )
            .await;
        assert!(matches!(bad_filter, Err(EncounterError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn share_retries_taken_slugs() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        let mut checks = 0;
        tables.expect_slug_exists().times(2).returning(move |_| {
            checks += 1;
            Ok(checks == 1)
        });
        tables
            .expect_update_table()
            .withf(|t| t.is_public())
            .times(1)
            .returning(|_| Ok(()));
        let mut random = MockRandomPort::new();
        random.expect_gen_index().returning(|_| 7);

        let shared = ops(tables, random)
            .set_visibility(table.id, &Requester::User(owner), true)
            .await
            .unwrap();
        assert_eq!(shared.public_slug().map(PublicSlug::as_str), Some("HHHHHHHH"));
    }

    #[tokio::test]
    async fn share_gives_up_after_max_attempts() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        tables.expect_slug_exists().returning(|_| Ok(false));
        tables
            .expect_update_table()
            .times(3)
            .returning(|_| Err(RepoError::constraint("UNIQUE constraint failed: public_slug")));
        let mut random = MockRandomPort::new();
        random.expect_gen_index().returning(|_| 0);

        let result = ops(tables, random)
            .set_visibility(table.id, &Requester::User(owner), true)
            .await;
        assert!(matches!(
            result,
            Err(EncounterError::SlugGenerationFailed { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn visibility_change_is_idempotent() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        tables.expect_update_table().never();

        let unchanged = ops(tables, MockRandomPort::new())
            .set_visibility(table.id, &Requester::User(owner), false)
            .await
            .unwrap();
        assert!(!unchanged.is_public());
    }

    #[tokio::test]
    async fn roll_uses_die_and_returns_entry() {
        let owner = UserId::new();
        let table = private_table(owner);
        let mut tables = serving(&table);
        tables
            .expect_get_entry()
            .withf(|_, roll| roll.get() == 4)
            .times(1)
            .returning(|_, _| Ok(None));
        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .withf(|min, max| *min == 1 && *max == 6)
            .returning(|_, _| 4);

        // Stored table lost its row for roll 4
        let result = ops(tables, random)
            .roll(table.id, &Requester::User(owner))
            .await;
        assert!(matches!(
            result,
            Err(EncounterError::EntryNotFound { roll_number: 4, .. })
        ));
    }

    #[tokio::test]
    async fn list_reports_page_and_total() {
        let owner = UserId::new();
        let mut tables = MockEncounterTableRepo::new();
        tables
            .expect_list_for_owner()
            .withf(|_, limit, offset| *limit == 5 && *offset == 10)
            .returning(move |_, _, _| Ok(vec![private_table(owner)]));
        tables.expect_count_for_owner().returning(|_| Ok(11));

        let page = ops(tables, MockRandomPort::new())
            .list_for_owner(owner, Pagination::new(Some(3), Some(5)).unwrap())
            .await
            .unwrap();
        assert_eq!((page.page, page.limit, page.total), (3, 5, 11));
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn suggested_name_is_a_valid_table_name() {
        let mut random = MockRandomPort::new();
        random.expect_gen_index().returning(|upper| upper - 1);
        let name = ops(MockEncounterTableRepo::new(), random).suggest_name();
        assert!(TableName::new(name).is_ok());
    }
}
