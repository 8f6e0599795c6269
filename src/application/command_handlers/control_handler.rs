// Control command handler orchestrates the write flow.
//
// Responsibilities
// - Load the control aggregate and its version from the store.
// - Call the decider with the command and the current time.
// - Commit the resulting mutations as one batch with optimistic concurrency.
// - Own the cross aggregate write on complete and reactivate: the entity flag is written
//   first and realigned with the stored control if the control commit fails.

use crate::application::errors::ApplicationError;
use crate::core::control::decider::add_manual_time::command::AddManualTime;
use crate::core::control::decider::add_manual_time::decide::decide_add_manual_time;
use crate::core::control::decider::complete::command::Complete;
use crate::core::control::decider::complete::decide::decide_complete;
use crate::core::control::decider::create_control::command::CreateControl;
use crate::core::control::decider::create_control::decide::decide_create_control;
use crate::core::control::decider::delete_entry::command::DeleteEntry;
use crate::core::control::decider::delete_entry::decide::decide_delete_entry;
use crate::core::control::decider::pause_timer::command::PauseTimer;
use crate::core::control::decider::pause_timer::decide::decide_pause_timer;
use crate::core::control::decider::reactivate::decide::decide_reactivate;
use crate::core::control::decider::start_timer::command::StartTimer;
use crate::core::control::decider::start_timer::decide::decide_start_timer;
use crate::core::control::entries::{EntryKind, ManualTimeEntry};
use crate::core::control::mutation::{Mutation, saved_control};
use crate::core::control::state::{ControlRecord, EntityRef};
use crate::core::ports::{Clock, ControlStore, LoadedControl, StoreError, TrackedEntities};
use std::sync::Arc;
use uuid::Uuid;

pub struct ControlCommandHandler<TStore, TEntities>
where
    TStore: ControlStore + 'static,
    TEntities: TrackedEntities + 'static,
{
    store: Arc<TStore>,
    entities: Arc<TEntities>,
    clock: Arc<dyn Clock>,
}

impl<TStore, TEntities> ControlCommandHandler<TStore, TEntities>
where
    TStore: ControlStore + 'static,
    TEntities: TrackedEntities + 'static,
{
    pub fn new(store: Arc<TStore>, entities: Arc<TEntities>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            entities,
            clock,
        }
    }

    /// Returns the existing control when the entity is already assigned to the user.
    pub async fn create_control(
        &self,
        command: CreateControl,
    ) -> Result<ControlRecord, ApplicationError> {
        let exists = self
            .entities
            .exists(&command.entity)
            .await
            .map_err(entity_error)?;
        if !exists {
            return Err(ApplicationError::NotFound(command.entity.to_string()));
        }

        let existing = self
            .store
            .find_by_assignment(&command.entity, command.assignee())
            .await?;
        let control_id = command.control_id;
        let entity = command.entity.clone();
        let assignee = command.assignee().to_string();
        let mutations = decide_create_control(existing.as_ref(), command, self.clock.now())?;

        let Some(record) = saved_control(&mutations).cloned() else {
            tracing::debug!(%entity, user_id = %assignee, "control already exists for assignment");
            return existing.ok_or_else(|| ApplicationError::NotFound(entity.to_string()));
        };

        match self.store.commit(control_id, 0, &mutations).await {
            Ok(()) => {
                tracing::info!(%control_id, %entity, user_id = %record.user_id, "control created");
                Ok(record)
            }
            Err(StoreError::Duplicate { entity, user_id }) => self
                .store
                .find_by_assignment(&entity, &user_id)
                .await?
                .ok_or_else(|| ApplicationError::NotFound(entity.to_string())),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn start_timer(&self, control_id: Uuid) -> Result<ControlRecord, ApplicationError> {
        let loaded = self.load(control_id).await?;
        let command = StartTimer {
            entry_id: Uuid::now_v7(),
        };
        let mutations = decide_start_timer(&loaded.aggregate, command, self.clock.now())?;
        let record = self.commit(&loaded, &mutations).await?;
        tracing::info!(%control_id, "timer started");
        Ok(record)
    }

    pub async fn pause_timer(&self, control_id: Uuid) -> Result<ControlRecord, ApplicationError> {
        let loaded = self.load(control_id).await?;
        let command = PauseTimer {
            fallback_entry_id: Uuid::now_v7(),
        };
        let mutations = decide_pause_timer(&loaded.aggregate, command, self.clock.now())?;
        let record = self.commit(&loaded, &mutations).await?;
        tracing::info!(
            %control_id,
            segment_minutes = record.total_time_minutes - loaded.aggregate.record.total_time_minutes,
            total_minutes = record.total_time_minutes,
            "timer paused"
        );
        Ok(record)
    }

    /// Completes the control and flags the owning case or TODO as completed.
    pub async fn complete(&self, control_id: Uuid) -> Result<ControlRecord, ApplicationError> {
        let loaded = self.load(control_id).await?;
        let now = self.clock.now();
        let command = Complete {
            fallback_entry_id: Uuid::now_v7(),
        };
        let mutations = decide_complete(&loaded.aggregate, command, now)?;
        let entity = &loaded.aggregate.record.entity;

        self.entities
            .set_completed(entity, true, Some(now))
            .await
            .map_err(entity_error)?;
        match self.commit(&loaded, &mutations).await {
            Ok(record) => {
                tracing::info!(%control_id, %entity, "control completed");
                Ok(record)
            }
            Err(error) => {
                self.realign_entity(&loaded).await;
                Err(error)
            }
        }
    }

    /// Moves a completed control back to pending and clears the entity completed flag.
    pub async fn reactivate(&self, control_id: Uuid) -> Result<ControlRecord, ApplicationError> {
        let loaded = self.load(control_id).await?;
        let mutations = decide_reactivate(&loaded.aggregate)?;
        let entity = &loaded.aggregate.record.entity;

        self.entities
            .set_completed(entity, false, None)
            .await
            .map_err(entity_error)?;
        match self.commit(&loaded, &mutations).await {
            Ok(record) => {
                tracing::info!(%control_id, %entity, "control reactivated");
                Ok(record)
            }
            Err(error) => {
                self.realign_entity(&loaded).await;
                Err(error)
            }
        }
    }

    pub async fn add_manual_time(
        &self,
        control_id: Uuid,
        command: AddManualTime,
    ) -> Result<ManualTimeEntry, ApplicationError> {
        let loaded = self.load(control_id).await?;
        let mutations = decide_add_manual_time(&loaded.aggregate, command, self.clock.now())?;
        self.commit(&loaded, &mutations).await?;
        let entry = mutations
            .into_iter()
            .find_map(|mutation| match mutation {
                Mutation::AddManualEntry(entry) => Some(entry),
                _ => None,
            })
            .ok_or_else(|| ApplicationError::NotFound(format!("manual entry on {control_id}")))?;
        tracing::info!(
            %control_id,
            entry_id = %entry.id,
            duration_minutes = entry.duration_minutes,
            "manual time added"
        );
        Ok(entry)
    }

    pub async fn delete_time_entry(&self, entry_id: Uuid) -> Result<ControlRecord, ApplicationError> {
        self.delete_entry(entry_id, EntryKind::Automatic).await
    }

    pub async fn delete_manual_time(
        &self,
        entry_id: Uuid,
    ) -> Result<ControlRecord, ApplicationError> {
        self.delete_entry(entry_id, EntryKind::Manual).await
    }

    async fn delete_entry(
        &self,
        entry_id: Uuid,
        kind: EntryKind,
    ) -> Result<ControlRecord, ApplicationError> {
        let location = self
            .store
            .locate_entry(entry_id)
            .await?
            .filter(|location| location.kind == kind)
            .ok_or(ApplicationError::NotFoundOrForbidden(entry_id))?;
        let loaded = self.load(location.control_id).await?;
        let mutations = decide_delete_entry(&loaded.aggregate, DeleteEntry { entry_id, kind })?;
        let record = self.commit(&loaded, &mutations).await?;
        tracing::info!(
            control_id = %location.control_id,
            %entry_id,
            ?kind,
            total_minutes = record.total_time_minutes,
            "entry deleted"
        );
        Ok(record)
    }

    async fn load(&self, control_id: Uuid) -> Result<LoadedControl, ApplicationError> {
        self.store
            .load(control_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("control {control_id}")))
    }

    async fn commit(
        &self,
        loaded: &LoadedControl,
        mutations: &[Mutation],
    ) -> Result<ControlRecord, ApplicationError> {
        let record = &loaded.aggregate.record;
        tracing::debug!(control_id = %record.id, version = loaded.version, ?mutations, "committing");
        self.store
            .commit(record.id, loaded.version, mutations)
            .await?;
        Ok(saved_control(mutations).unwrap_or(record).clone())
    }

    /// Sets the entity flag to whatever the stored control says after a failed commit.
    /// A concurrent writer may have committed the same transition, so the flag only
    /// goes back to its old value when the control is still as it was loaded.
    async fn realign_entity(&self, loaded: &LoadedControl) {
        let before = &loaded.aggregate.record;
        let entity = &before.entity;
        let (completed, completed_at) = match self.store.load(before.id).await {
            Ok(Some(current)) => {
                let record = current.aggregate.record;
                (record.is_completed(), record.completed_at)
            }
            Ok(None) => (before.is_completed(), before.completed_at),
            Err(error) => {
                tracing::warn!(control_id = %before.id, %error, "reload failed, restoring prior entity flag");
                (before.is_completed(), before.completed_at)
            }
        };
        tracing::warn!(%entity, completed, "control commit failed, realigning entity flag");
        if let Err(error) = self
            .entities
            .set_completed(entity, completed, completed_at)
            .await
        {
            tracing::error!(%entity, error = %format!("{error:#}"), "entity flag could not be realigned");
        }
    }
}

fn entity_error(error: anyhow::Error) -> ApplicationError {
    ApplicationError::Entity(format!("{error:#}"))
}

#[cfg(test)]
mod control_command_handler_tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::in_memory::in_memory_control_store::InMemoryControlStore;
    use crate::adapters::in_memory::in_memory_tracked_entities::{
        EntityFlags, InMemoryTrackedEntities,
    };
    use crate::core::control::state::{ControlAggregate, ControlStatus};
    use crate::core::ports::{EntryLocation, LoadedControl};
    use crate::test_support::fixtures::commands::AddManualTimeBuilder;
    use crate::test_support::fixtures::controls::{FIXED_USER, t0};
    use chrono::Duration;
    use rstest::{fixture, rstest};
    use tokio::join;

    type Handler = ControlCommandHandler<InMemoryControlStore, InMemoryTrackedEntities>;

    struct Context {
        handler: Handler,
        store: Arc<InMemoryControlStore>,
        entities: Arc<InMemoryTrackedEntities>,
        clock: Arc<ManualClock>,
        todo: EntityRef,
    }

    #[fixture]
    fn context() -> Context {
        let store = Arc::new(InMemoryControlStore::new());
        let entities = Arc::new(InMemoryTrackedEntities::accepting_unknown());
        let clock = Arc::new(ManualClock::new(t0()));
        let handler = ControlCommandHandler::new(store.clone(), entities.clone(), clock.clone());
        Context {
            handler,
            store,
            entities,
            clock,
            todo: EntityRef::todo("todo-0001"),
        }
    }

    fn create_command(entity: &EntityRef) -> CreateControl {
        CreateControl {
            control_id: Uuid::now_v7(),
            entity: entity.clone(),
            user_id: Some(FIXED_USER.to_string()),
            requested_by: FIXED_USER.to_string(),
        }
    }

    async fn created(context: &Context) -> ControlRecord {
        context
            .handler
            .create_control(create_command(&context.todo))
            .await
            .expect("create failed")
    }

    async fn aggregate(context: &Context, control_id: Uuid) -> ControlAggregate {
        context
            .store
            .load(control_id)
            .await
            .unwrap()
            .expect("control missing")
            .aggregate
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_create_a_pending_control(context: Context) {
        let record = created(&context).await;
        assert_eq!(record.status, ControlStatus::Pending);
        assert_eq!(record.assigned_at, t0());
        assert_eq!(aggregate(&context, record.id).await.record, record);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_the_existing_control_for_the_same_assignment(context: Context) {
        let first = created(&context).await;
        let second = created(&context).await;
        assert_eq!(first.id, second.id);
        let all = context.store.list_by_entity(&context.todo).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_to_create_a_control_for_an_unknown_entity() {
        let handler = ControlCommandHandler::new(
            Arc::new(InMemoryControlStore::new()),
            Arc::new(InMemoryTrackedEntities::new()),
            Arc::new(ManualClock::new(t0())),
        );
        let result = handler
            .create_control(create_command(&EntityRef::case("case-404")))
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_commit_the_segment_when_paused(context: Context) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        context.clock.advance(Duration::minutes(30));
        let paused = context.handler.pause_timer(record.id).await.unwrap();

        assert_eq!(paused.total_time_minutes, 30);
        assert!(!paused.is_timer_active);
        assert_eq!(paused.status, ControlStatus::InProgress);
        let state = aggregate(&context, record.id).await;
        assert_eq!(state.time_entries.len(), 1);
        assert_eq!(state.time_entries[0].duration_minutes, Some(30));
        assert_eq!(state.time_entries[0].end_time, Some(t0() + Duration::minutes(30)));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_open_a_second_segment_on_double_start(context: Context) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        let result = context.handler.start_timer(record.id).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
        let state = aggregate(&context, record.id).await;
        assert_eq!(state.time_entries.iter().filter(|e| e.is_open()).count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_pause_when_no_timer_runs(context: Context) {
        let record = created(&context).await;
        let result = context.handler.pause_timer(record.id).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_for_an_unknown_control(context: Context) {
        let result = context.handler.start_timer(Uuid::now_v7()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_add_manual_time_to_the_total(context: Context) {
        let record = created(&context).await;
        let command = AddManualTimeBuilder::new().duration_minutes(45).build();
        let entry = context
            .handler
            .add_manual_time(record.id, command)
            .await
            .unwrap();
        assert_eq!(entry.duration_minutes, 45);
        let state = aggregate(&context, record.id).await;
        assert_eq!(state.record.total_time_minutes, 45);
        assert_eq!(state.manual_entries, vec![entry]);
    }

    #[rstest]
    #[case(AddManualTimeBuilder::new().duration_minutes(0).build())]
    #[case(AddManualTimeBuilder::new().description("").build())]
    #[tokio::test]
    async fn it_should_reject_invalid_manual_time_without_side_effects(
        context: Context,
        #[case] command: AddManualTime,
    ) {
        let record = created(&context).await;
        let before = context.store.load(record.id).await.unwrap().unwrap();
        let result = context.handler.add_manual_time(record.id, command).await;
        assert!(matches!(result, Err(ApplicationError::Validation(_))));
        let after = context.store.load(record.id).await.unwrap().unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(after.aggregate, before.aggregate);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_complete_a_running_control_and_its_entity(context: Context) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        context.clock.advance(Duration::minutes(12));
        let completed = context.handler.complete(record.id).await.unwrap();

        let now = t0() + Duration::minutes(12);
        assert!(!completed.is_timer_active);
        assert_eq!(completed.status, ControlStatus::Completed);
        assert_eq!(completed.completed_at, Some(now));
        assert_eq!(completed.total_time_minutes, 12);
        let state = aggregate(&context, record.id).await;
        assert_eq!(state.time_entries[0].duration_minutes, Some(12));
        assert_eq!(
            context.entities.flags(&context.todo).await,
            Some(EntityFlags {
                is_completed: true,
                completed_at: Some(now),
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_change_nothing_when_the_entity_cannot_be_flagged(context: Context) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        let before = aggregate(&context, record.id).await;
        context.entities.toggle_offline();
        context.clock.advance(Duration::minutes(5));

        let result = context.handler.complete(record.id).await;
        assert!(matches!(result, Err(ApplicationError::Entity(_))));
        assert_eq!(aggregate(&context, record.id).await, before);
        context.entities.toggle_offline();
        assert!(
            !context
                .entities
                .flags(&context.todo)
                .await
                .unwrap_or_default()
                .is_completed
        );
    }

    struct RejectingCommits(InMemoryControlStore);

    #[async_trait::async_trait]
    impl ControlStore for RejectingCommits {
        async fn load(&self, control_id: Uuid) -> Result<Option<LoadedControl>, StoreError> {
            self.0.load(control_id).await
        }
        async fn commit(&self, _: Uuid, _: i64, _: &[Mutation]) -> Result<(), StoreError> {
            Err(StoreError::Backend("commit rejected".into()))
        }
        async fn find_by_assignment(
            &self,
            entity: &EntityRef,
            user_id: &str,
        ) -> Result<Option<ControlRecord>, StoreError> {
            self.0.find_by_assignment(entity, user_id).await
        }
        async fn list_by_user_id(
            &self,
            user_id: &str,
            offset: u64,
            limit: u64,
            desc: bool,
        ) -> Result<Vec<ControlAggregate>, StoreError> {
            self.0.list_by_user_id(user_id, offset, limit, desc).await
        }
        async fn list_by_entity(
            &self,
            entity: &EntityRef,
        ) -> Result<Vec<ControlAggregate>, StoreError> {
            self.0.list_by_entity(entity).await
        }
        async fn locate_entry(&self, entry_id: Uuid) -> Result<Option<EntryLocation>, StoreError> {
            self.0.locate_entry(entry_id).await
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_realign_the_entity_flag_when_the_control_commit_fails() {
        let inner = InMemoryControlStore::new();
        let todo = EntityRef::todo("todo-revert");
        let running = crate::test_support::fixtures::controls::ControlAggregateBuilder::new()
            .entity(todo.clone())
            .running_since(t0())
            .build();
        let control_id = running.record.id;
        inner.seed(running).await;
        let entities = Arc::new(InMemoryTrackedEntities::new());
        entities.register(todo.clone()).await;
        let handler = ControlCommandHandler::new(
            Arc::new(RejectingCommits(inner)),
            entities.clone(),
            Arc::new(ManualClock::new(t0() + Duration::minutes(3))),
        );

        let result = handler.complete(control_id).await;
        assert!(matches!(result, Err(ApplicationError::Store(_))));
        assert_eq!(entities.flags(&todo).await, Some(EntityFlags::default()));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_restore_the_completed_flag_when_a_reactivate_commit_fails() {
        let inner = InMemoryControlStore::new();
        let todo = EntityRef::todo("todo-restore");
        let at = t0() + Duration::minutes(40);
        let completed = crate::test_support::fixtures::controls::ControlAggregateBuilder::new()
            .entity(todo.clone())
            .with_manual_entry(40)
            .completed_at(at)
            .build();
        let control_id = completed.record.id;
        inner.seed(completed).await;
        let entities = Arc::new(InMemoryTrackedEntities::new());
        entities.register(todo.clone()).await;
        entities.set_completed(&todo, true, Some(at)).await.unwrap();
        let handler = ControlCommandHandler::new(
            Arc::new(RejectingCommits(inner)),
            entities.clone(),
            Arc::new(ManualClock::new(t0() + Duration::hours(2))),
        );

        let result = handler.reactivate(control_id).await;
        assert!(matches!(result, Err(ApplicationError::Store(_))));
        assert_eq!(
            entities.flags(&todo).await,
            Some(EntityFlags {
                is_completed: true,
                completed_at: Some(at),
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_the_entity_completed_when_a_concurrent_complete_loses(
        context: Context,
    ) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        context.clock.advance(Duration::minutes(8));
        context.store.set_delay_commit_ms(10);

        let (first, second) = join!(
            context.handler.complete(record.id),
            context.handler.complete(record.id)
        );
        assert!(first.is_ok() ^ second.is_ok(), "exactly one complete should win");
        let err = first.as_ref().err().or(second.as_ref().err()).unwrap();
        assert!(matches!(err, ApplicationError::Conflict { .. }));

        let state = aggregate(&context, record.id).await;
        assert_eq!(state.record.status, ControlStatus::Completed);
        assert_eq!(
            context.entities.flags(&context.todo).await,
            Some(EntityFlags {
                is_completed: true,
                completed_at: state.record.completed_at,
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_the_entity_open_when_a_concurrent_reactivate_loses(
        context: Context,
    ) {
        let record = created(&context).await;
        context.handler.complete(record.id).await.unwrap();
        context.store.set_delay_commit_ms(10);

        let (first, second) = join!(
            context.handler.reactivate(record.id),
            context.handler.reactivate(record.id)
        );
        assert!(first.is_ok() ^ second.is_ok(), "exactly one reactivate should win");
        let err = first.as_ref().err().or(second.as_ref().err()).unwrap();
        assert!(matches!(err, ApplicationError::Conflict { .. }));

        let state = aggregate(&context, record.id).await;
        assert_eq!(state.record.status, ControlStatus::Pending);
        assert_eq!(
            context.entities.flags(&context.todo).await,
            Some(EntityFlags::default())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reactivate_and_keep_the_logged_time(context: Context) {
        let record = created(&context).await;
        context
            .handler
            .add_manual_time(record.id, AddManualTimeBuilder::new().build())
            .await
            .unwrap();
        context.handler.complete(record.id).await.unwrap();
        let reactivated = context.handler.reactivate(record.id).await.unwrap();

        assert_eq!(reactivated.status, ControlStatus::Pending);
        assert_eq!(reactivated.completed_at, None);
        assert_eq!(reactivated.total_time_minutes, 30);
        assert_eq!(aggregate(&context, record.id).await.manual_entries.len(), 1);
        assert!(!context.entities.flags(&context.todo).await.unwrap().is_completed);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_reactivating_an_open_control(context: Context) {
        let record = created(&context).await;
        let result = context.handler.reactivate(record.id).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_recompute_the_total_after_deleting_manual_time(context: Context) {
        let record = created(&context).await;
        let keep = AddManualTimeBuilder::new().duration_minutes(10).build();
        let drop = AddManualTimeBuilder::new().duration_minutes(25).build();
        context.handler.add_manual_time(record.id, keep).await.unwrap();
        let dropped = context.handler.add_manual_time(record.id, drop).await.unwrap();

        let after = context.handler.delete_manual_time(dropped.id).await.unwrap();
        assert_eq!(after.total_time_minutes, 10);
        assert_eq!(aggregate(&context, record.id).await.manual_entries.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_unknown_entries_as_not_found_or_forbidden(context: Context) {
        let record = created(&context).await;
        context
            .handler
            .add_manual_time(record.id, AddManualTimeBuilder::new().build())
            .await
            .unwrap();
        let missing = Uuid::now_v7();
        let result = context.handler.delete_manual_time(missing).await;
        assert!(matches!(
            result,
            Err(ApplicationError::NotFoundOrForbidden(id)) if id == missing
        ));
        assert_eq!(aggregate(&context, record.id).await.record.total_time_minutes, 30);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_delete_a_manual_entry_through_the_automatic_path(context: Context) {
        let record = created(&context).await;
        let entry = context
            .handler
            .add_manual_time(record.id, AddManualTimeBuilder::new().build())
            .await
            .unwrap();
        let result = context.handler.delete_time_entry(entry.id).await;
        assert!(matches!(result, Err(ApplicationError::NotFoundOrForbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_refuse_to_delete_the_running_segment(context: Context) {
        let record = created(&context).await;
        context.handler.start_timer(record.id).await.unwrap();
        let open = aggregate(&context, record.id).await.time_entries[0].id;
        let result = context.handler.delete_time_entry(open).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_hide_controls_of_other_users() {
        let store = Arc::new(InMemoryControlStore::restricted_to("someone-else"));
        let running = crate::test_support::fixtures::controls::ControlAggregateBuilder::new().build();
        let control_id = running.record.id;
        store.seed(running).await;
        let handler = ControlCommandHandler::new(
            store,
            Arc::new(InMemoryTrackedEntities::accepting_unknown()),
            Arc::new(ManualClock::new(t0())),
        );
        let result = handler.start_timer(control_id).await;
        assert!(matches!(result, Err(ApplicationError::Permission(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_let_only_one_of_two_concurrent_writers_win(context: Context) {
        let record = created(&context).await;
        context.store.set_delay_commit_ms(10);
        let (first, second) = join!(
            context
                .handler
                .add_manual_time(record.id, AddManualTimeBuilder::new().duration_minutes(10).build()),
            context
                .handler
                .add_manual_time(record.id, AddManualTimeBuilder::new().duration_minutes(20).build())
        );
        assert!(
            first.is_ok() ^ second.is_ok(),
            "exactly one should fail with conflict"
        );
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err, ApplicationError::Conflict { .. }));
        let state = aggregate(&context, record.id).await;
        assert_eq!(state.manual_entries.len(), 1);
        assert_eq!(
            state.record.total_time_minutes,
            state.manual_entries[0].duration_minutes
        );
    }
}
