// In memory implementation of the ControlStore port.
//
// Purpose
// - Support command handler tests and local development without a database.
//
// Responsibilities
// - Store each control aggregate with a version number.
// - Enforce optimistic concurrency by checking the expected version on every commit.
// - Apply a batch of mutations entirely or not at all.
// - Optionally hide other users' rows, the way row level security does.

use crate::core::control::mutation::{ApplyError, Mutation, saved_control};
use crate::core::control::state::{ControlAggregate, ControlRecord, EntityRef};
use crate::core::ports::{ControlStore, EntryLocation, LoadedControl, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredControl {
    aggregate: ControlAggregate,
    version: i64,
}

#[derive(Default)]
pub struct InMemoryControlStore {
    inner: RwLock<HashMap<Uuid, StoredControl>>,
    visible_user: Option<String>,
    is_offline: AtomicBool,
    delay_commit_ms: AtomicU64,
}

impl InMemoryControlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only rows assigned to `user_id` stay visible to callers of this store.
    pub fn restricted_to(user_id: impl Into<String>) -> Self {
        Self {
            visible_user: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn set_delay_commit_ms(&self, delay: u64) {
        self.delay_commit_ms.store(delay, Ordering::SeqCst);
    }

    /// Writes an aggregate directly, bypassing row visibility. Used to seed fixtures.
    pub async fn seed(&self, aggregate: ControlAggregate) {
        self.inner.write().await.insert(
            aggregate.record.id,
            StoredControl {
                aggregate,
                version: 1,
            },
        );
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Control store offline".into()));
        }
        Ok(())
    }

    fn is_visible(&self, record: &ControlRecord) -> bool {
        self.visible_user
            .as_deref()
            .is_none_or(|user_id| record.user_id == user_id)
    }

    fn ensure_visible(&self, record: &ControlRecord) -> Result<(), StoreError> {
        if self.is_visible(record) {
            Ok(())
        } else {
            Err(StoreError::Forbidden {
                control_id: record.id,
            })
        }
    }
}

#[async_trait::async_trait]
impl ControlStore for InMemoryControlStore {
    async fn load(&self, control_id: Uuid) -> Result<Option<LoadedControl>, StoreError> {
        self.ensure_online()?;
        let guard = self.inner.read().await;
        let Some(stored) = guard.get(&control_id) else {
            return Ok(None);
        };
        self.ensure_visible(&stored.aggregate.record)?;
        Ok(Some(LoadedControl {
            aggregate: stored.aggregate.clone(),
            version: stored.version,
        }))
    }

    async fn commit(
        &self,
        control_id: Uuid,
        expected_version: i64,
        mutations: &[Mutation],
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let delay = self.delay_commit_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut guard = self.inner.write().await;
        if let Some(stored) = guard.get_mut(&control_id) {
            self.ensure_visible(&stored.aggregate.record)?;
            if stored.version != expected_version {
                return Err(StoreError::VersionMismatch {
                    expected: expected_version,
                    actual: stored.version,
                });
            }
            stored.aggregate.apply_all(mutations)?;
            stored.version += 1;
            return Ok(());
        }

        if expected_version != 0 {
            return Err(StoreError::VersionMismatch {
                expected: expected_version,
                actual: 0,
            });
        }
        let record = saved_control(mutations).ok_or(ApplyError::MissingRow(control_id))?;
        if record.id != control_id {
            return Err(ApplyError::ForeignRow {
                row: record.id,
                owner: record.id,
                control_id,
            }
            .into());
        }
        self.ensure_visible(record)?;
        let taken = guard.values().any(|stored| {
            stored.aggregate.record.entity == record.entity
                && stored.aggregate.record.user_id == record.user_id
        });
        if taken {
            return Err(StoreError::Duplicate {
                entity: record.entity.clone(),
                user_id: record.user_id.clone(),
            });
        }
        let mut aggregate = ControlAggregate::new(record.clone());
        aggregate.apply_all(mutations)?;
        guard.insert(
            control_id,
            StoredControl {
                aggregate,
                version: 1,
            },
        );
        Ok(())
    }

    async fn find_by_assignment(
        &self,
        entity: &EntityRef,
        user_id: &str,
    ) -> Result<Option<ControlRecord>, StoreError> {
        self.ensure_online()?;
        let guard = self.inner.read().await;
        Ok(guard
            .values()
            .map(|stored| &stored.aggregate.record)
            .filter(|record| self.is_visible(record))
            .find(|record| &record.entity == entity && record.user_id == user_id)
            .cloned())
    }

    async fn list_by_user_id(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
        sort_by_assigned_at_desc: bool,
    ) -> Result<Vec<ControlAggregate>, StoreError> {
        self.ensure_online()?;
        let guard = self.inner.read().await;

        let mut items: Vec<ControlAggregate> = guard
            .values()
            .map(|stored| &stored.aggregate)
            .filter(|aggregate| aggregate.record.user_id == user_id)
            .filter(|aggregate| self.is_visible(&aggregate.record))
            .cloned()
            .collect();

        items.sort_by_key(|aggregate| (aggregate.record.assigned_at, aggregate.record.id));
        if sort_by_assigned_at_desc {
            items.reverse();
        }

        let start = offset as usize;
        if start >= items.len() {
            return Ok(Vec::new());
        }
        let end = start.saturating_add(limit as usize).min(items.len());
        Ok(items.drain(start..end).collect())
    }

    async fn list_by_entity(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<ControlAggregate>, StoreError> {
        self.ensure_online()?;
        let guard = self.inner.read().await;
        let mut items: Vec<ControlAggregate> = guard
            .values()
            .map(|stored| &stored.aggregate)
            .filter(|aggregate| &aggregate.record.entity == entity)
            .filter(|aggregate| self.is_visible(&aggregate.record))
            .cloned()
            .collect();
        items.sort_by_key(|aggregate| (aggregate.record.assigned_at, aggregate.record.id));
        Ok(items)
    }

    async fn locate_entry(&self, entry_id: Uuid) -> Result<Option<EntryLocation>, StoreError> {
        self.ensure_online()?;
        let guard = self.inner.read().await;
        Ok(guard
            .values()
            .map(|stored| &stored.aggregate)
            .filter(|aggregate| self.is_visible(&aggregate.record))
            .find_map(|aggregate| {
                let kind = aggregate
                    .time_entry(entry_id)
                    .map(|entry| entry.kind())
                    .or_else(|| aggregate.manual_entry(entry_id).map(|entry| entry.kind()))?;
                Some(EntryLocation {
                    control_id: aggregate.record.id,
                    kind,
                })
            }))
    }
}

#[cfg(test)]
mod in_memory_control_store_tests {
    use super::*;
    use crate::core::control::entries::EntryKind;
    use crate::test_support::fixtures::controls::{ControlAggregateBuilder, FIXED_USER, t0};
    use chrono::Duration as ChronoDuration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> ControlRecord {
        ControlRecord::new(Uuid::now_v7(), EntityRef::case("case-1"), FIXED_USER, t0())
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_create_and_load_a_control(record: ControlRecord) {
        let store = InMemoryControlStore::new();
        store
            .commit(record.id, 0, &[Mutation::SaveControl(record.clone())])
            .await
            .expect("expected to commit the control");
        let loaded = store
            .load(record.id)
            .await
            .expect("expected to load the control")
            .expect("expected the control to exist");
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.aggregate.record, record);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_to_commit_if_the_wrong_version_is_expected(record: ControlRecord) {
        let store = InMemoryControlStore::new();
        store
            .commit(record.id, 0, &[Mutation::SaveControl(record.clone())])
            .await
            .unwrap();
        let result = store
            .commit(record.id, 0, &[Mutation::SaveControl(record.clone())])
            .await;
        match result {
            Err(StoreError::VersionMismatch { expected, actual }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected VersionMismatch, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_second_control_for_the_same_assignment(record: ControlRecord) {
        let store = InMemoryControlStore::new();
        store
            .commit(record.id, 0, &[Mutation::SaveControl(record.clone())])
            .await
            .unwrap();
        let mut twin = record.clone();
        twin.id = Uuid::now_v7();
        let result = store.commit(twin.id, 0, &[Mutation::SaveControl(twin)]).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_apply_a_partially_valid_batch() {
        let store = InMemoryControlStore::new();
        let aggregate = ControlAggregateBuilder::new().with_manual_entry(10).build();
        let control_id = aggregate.record.id;
        store.seed(aggregate.clone()).await;

        let mut saved = aggregate.record.clone();
        saved.total_time_minutes = 0;
        let result = store
            .commit(
                control_id,
                1,
                &[
                    Mutation::SaveControl(saved),
                    Mutation::DeleteManualEntry {
                        entry_id: Uuid::now_v7(),
                    },
                ],
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Rejected(ApplyError::MissingRow(_)))
        ));
        let loaded = store.load(control_id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.aggregate, aggregate);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_locate_entries_of_both_kinds() {
        let store = InMemoryControlStore::new();
        let aggregate = ControlAggregateBuilder::new()
            .with_closed_entry(t0(), 10)
            .with_manual_entry(5)
            .build();
        let automatic = aggregate.time_entries[0].id;
        let manual = aggregate.manual_entries[0].id;
        let control_id = aggregate.record.id;
        store.seed(aggregate).await;

        let located = store.locate_entry(automatic).await.unwrap().unwrap();
        assert_eq!(located.control_id, control_id);
        assert_eq!(located.kind, EntryKind::Automatic);
        let located = store.locate_entry(manual).await.unwrap().unwrap();
        assert_eq!(located.kind, EntryKind::Manual);
        assert_eq!(store.locate_entry(Uuid::now_v7()).await.unwrap(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_hide_rows_of_other_users() {
        let store = InMemoryControlStore::restricted_to("someone-else");
        let aggregate = ControlAggregateBuilder::new().with_manual_entry(5).build();
        let control_id = aggregate.record.id;
        let manual = aggregate.manual_entries[0].id;
        store.seed(aggregate).await;

        assert!(matches!(
            store.load(control_id).await,
            Err(StoreError::Forbidden { .. })
        ));
        assert_eq!(store.locate_entry(manual).await.unwrap(), None);
        assert!(
            store
                .list_by_user_id(FIXED_USER, 0, 10, true)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_page_controls_of_a_user_newest_first() {
        let store = InMemoryControlStore::new();
        let mut ids = Vec::new();
        for hour in 0..3 {
            let mut aggregate = ControlAggregateBuilder::new()
                .entity(EntityRef::todo(format!("todo-{hour}")))
                .build();
            aggregate.record.assigned_at = t0() + ChronoDuration::hours(hour);
            ids.push(aggregate.record.id);
            store.seed(aggregate).await;
        }

        let page = store.list_by_user_id(FIXED_USER, 0, 2, true).await.unwrap();
        let page_ids: Vec<Uuid> = page.iter().map(|a| a.record.id).collect();
        assert_eq!(page_ids, vec![ids[2], ids[1]]);

        let rest = store.list_by_user_id(FIXED_USER, 2, 2, true).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].record.id, ids[0]);

        assert!(
            store
                .list_by_user_id(FIXED_USER, 5, 2, true)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_if_the_store_is_offline(record: ControlRecord) {
        let store = InMemoryControlStore::new();
        store.toggle_offline();
        let result = store.commit(record.id, 0, &[Mutation::SaveControl(record)]).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Control store offline")
        );
    }
}
