//! The Reactor base: identity, owned reaction handles, and the `on_*`
//! binding entry points that fuse DSL word fragments into a reaction's
//! task factory.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    chrono::{next_chrono_id, ChronoController, ChronoTask, WatchdogRegistry},
    descriptors::Priority,
    dsl::{priority, GroupId, HookSet, HookSetBuilder},
    error::{ConfigResult, ConfigurationError},
    events::EventSink,
    lifecycle::{Shutdown, Startup},
    logger::LogLevel,
    reaction::{Reaction, ReactionHandle, ReactionIdentifiers, ReactionTask, TaskCreation},
    scheduler::Scheduler,
    store::{Shared, TypeStoreRegistry},
};

/// Everything a reactor needs to bind reactions and schedule work, handed
/// down from `PowerPlant::install`: a store registry handle, a scheduler
/// handle, and the collaborators a reactor's hooks can reach. Cheap to
/// clone: every field is itself a handle.
#[derive(Clone)]
pub struct RuntimeEnvironment {
    pub(crate) registry: Arc<TypeStoreRegistry>,
    pub(crate) scheduler: Scheduler,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) chrono: Arc<dyn ChronoController>,
    pub(crate) watchdogs: Arc<WatchdogRegistry>,
}

fn fold_fragments(fragments: Vec<HookSet>, name: &str) -> ConfigResult<HookSet> {
    let mut builder = HookSetBuilder::new();
    for fragment in fragments {
        builder = builder
            .add(fragment)
            .map_err(|_| ConfigurationError::RunInlineConflict { name: name.to_string() })?;
    }
    Ok(builder.build())
}

/// A stateful object hosting reactions. Reactions are
/// unbound, in order, when the reactor is dropped.
pub struct Reactor {
    name: String,
    env: RuntimeEnvironment,
    log_level: LogLevel,
    reactions: Vec<ReactionHandle>,
}

impl Reactor {
    pub fn new(name: impl Into<String>, env: RuntimeEnvironment) -> Self {
        Self { name: name.into(), env, log_level: LogLevel::Info, reactions: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    pub(crate) fn environment(&self) -> &RuntimeEnvironment {
        &self.env
    }

    pub fn reactions(&self) -> &[ReactionHandle] {
        &self.reactions
    }

    /// `Trigger<T>`: binds to `TypeStore(T)`; the callback runs once per
    /// emit of `T`, receiving the fresh snapshot.
    pub fn on_trigger<T, F>(&mut self, fragments: Vec<HookSet>, callback: F) -> ConfigResult<ReactionHandle>
    where
        T: Send + Sync + 'static,
        F: Fn(Shared<T>) + Send + Sync + 'static,
    {
        let hooks = fold_fragments(fragments, &self.name)?;
        let dsl_description = format!("Trigger<{}>", std::any::type_name::<T>());
        let identifiers = ReactionIdentifiers::new(self.name.clone(), dsl_description.clone(), "on_trigger");
        let store = self.env.registry.store_for::<T>();
        let scheduler = self.env.scheduler.clone();
        let callback = Arc::new(callback);

        let reaction = {
            let store = store.clone();
            Reaction::new_cyclic(identifiers, true, move |weak| {
                Box::new(move |_request_inline: bool| -> TaskCreation {
                    let parent = match weak.upgrade() {
                        Some(p) => p,
                        None => return TaskCreation::Blocked,
                    };
                    if let Some(limit) = hooks.buffer_limit {
                        if parent.active_task_count() >= limit {
                            return TaskCreation::Blocked;
                        }
                    }
                    let value = match store.get() {
                        Some(v) => v,
                        None => return TaskCreation::MissingData,
                    };
                    let pool = scheduler.resolve_pool(hooks.pool.clone());
                    let groups = hooks.groups.clone();
                    let run_inline_resolved = hooks.run_inline;
                    let priority_resolved = hooks.resolved_priority();
                    let once = hooks.once;
                    let callback = callback.clone();
                    let weak_for_once = weak.clone();
                    let task_callback: Box<dyn FnOnce() + Send> = Box::new(move || {
                        (callback)(value);
                        if once {
                            if let Some(reaction) = weak_for_once.upgrade() {
                                reaction.unbind();
                            }
                        }
                    });
                    TaskCreation::Created(ReactionTask::new(
                        parent,
                        priority_resolved,
                        pool,
                        groups,
                        run_inline_resolved,
                        vec![dsl_description.clone()],
                        true,
                        task_callback,
                    ))
                })
            })
        };

        store.subscribe(reaction.clone());
        let reaction_id = reaction.id;
        reaction.add_unbinder(Box::new(move || store.unsubscribe(reaction_id)));

        Ok(self.own(reaction))
    }

    /// `Startup`: fires once, after `PowerPlant::start` emits `Startup`
    /// under `Local`. Subscribers must be bound
    /// before `start` is called.
    pub fn on_startup<F>(&mut self, fragments: Vec<HookSet>, callback: F) -> ConfigResult<ReactionHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_trigger::<Startup, _>(fragments, move |_| callback())
    }

    /// `Shutdown`: fires once `PowerPlant::shutdown` emits `Shutdown`
    /// under `Local`; defaults to `IDLE` priority so in-flight normal
    /// work drains first.
    pub fn on_shutdown<F>(&mut self, mut fragments: Vec<HookSet>, callback: F) -> ConfigResult<ReactionHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut all = vec![priority(Priority::IDLE)];
        all.append(&mut fragments);
        self.on_trigger::<Shutdown, _>(all, move |_| callback())
    }

    /// `Every<N, period>`: registers a recurring chrono task; on each fire
    /// the reaction's factory is invoked directly, with no `TypeStore`
    /// involved.
    pub fn on_every<F>(&mut self, period: Duration, fragments: Vec<HookSet>, callback: F) -> ConfigResult<ReactionHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let hooks = fold_fragments(fragments, &self.name)?;
        let dsl_description = format!("Every<{:?}>", period);
        let identifiers = ReactionIdentifiers::new(self.name.clone(), dsl_description.clone(), "on_every");
        let scheduler = self.env.scheduler.clone();
        let callback = Arc::new(callback);

        let reaction = Reaction::new_cyclic(identifiers, true, move |weak| {
            Box::new(move |_request_inline: bool| -> TaskCreation {
                let parent = match weak.upgrade() {
                    Some(p) => p,
                    None => return TaskCreation::Blocked,
                };
                if let Some(limit) = hooks.buffer_limit {
                    if parent.active_task_count() >= limit {
                        return TaskCreation::Blocked;
                    }
                }
                let pool = scheduler.resolve_pool(hooks.pool.clone());
                let groups = hooks.groups.clone();
                let callback = callback.clone();
                let task_callback: Box<dyn FnOnce() + Send> = Box::new(move || (callback)());
                TaskCreation::Created(ReactionTask::new(
                    parent,
                    hooks.resolved_priority(),
                    pool,
                    groups,
                    hooks.run_inline,
                    vec![dsl_description.clone()],
                    true,
                    task_callback,
                ))
            })
        });

        let chrono_id = next_chrono_id();
        let reaction_for_chrono = reaction.clone();
        let scheduler_for_chrono = self.env.scheduler.clone();
        self.env.chrono.schedule(ChronoTask {
            id: chrono_id,
            fire_at: Instant::now() + period,
            period: Some(period),
            callback: Box::new(move |_now| {
                if let TaskCreation::Created(task) = reaction_for_chrono.get_task(false) {
                    scheduler_for_chrono.submit(task);
                }
                reaction_for_chrono.is_enabled()
            }),
        });

        let chrono = self.env.chrono.clone();
        reaction.add_unbinder(Box::new(move || chrono.unbind(chrono_id)));

        Ok(self.own(reaction))
    }

    /// `Watchdog<G, N, period>`: fires when `G`'s last serviced time is
    /// more than `N * period` in the past. `emit::<Watchdog>` refreshes
    /// the service time.
    pub fn on_watchdog<G, F>(
        &mut self,
        n: u32,
        period: Duration,
        fragments: Vec<HookSet>,
        callback: F,
    ) -> ConfigResult<ReactionHandle>
    where
        G: GroupId,
        F: Fn() + Send + Sync + 'static,
    {
        let hooks = fold_fragments(fragments, &self.name)?;
        let dsl_description = format!("Watchdog<{}, {}, {:?}>", G::NAME, n, period);
        let identifiers = ReactionIdentifiers::new(self.name.clone(), dsl_description.clone(), "on_watchdog");
        let scheduler = self.env.scheduler.clone();
        let callback = Arc::new(callback);

        let reaction = Reaction::new_cyclic(identifiers, true, move |weak| {
            Box::new(move |_request_inline: bool| -> TaskCreation {
                let parent = match weak.upgrade() {
                    Some(p) => p,
                    None => return TaskCreation::Blocked,
                };
                if let Some(limit) = hooks.buffer_limit {
                    if parent.active_task_count() >= limit {
                        return TaskCreation::Blocked;
                    }
                }
                let pool = scheduler.resolve_pool(hooks.pool.clone());
                let groups = hooks.groups.clone();
                let callback = callback.clone();
                let task_callback: Box<dyn FnOnce() + Send> = Box::new(move || (callback)());
                TaskCreation::Created(ReactionTask::new(
                    parent,
                    hooks.resolved_priority(),
                    pool,
                    groups,
                    hooks.run_inline,
                    vec![dsl_description.clone()],
                    true,
                    task_callback,
                ))
            })
        });

        let timeout = period * n.max(1);
        self.env.watchdogs.service(G::NAME, Instant::now());

        let chrono_id = next_chrono_id();
        let reaction_for_chrono = reaction.clone();
        let scheduler_for_chrono = self.env.scheduler.clone();
        let watchdogs = self.env.watchdogs.clone();
        let group_name = G::NAME.to_string();
        self.env.chrono.schedule(ChronoTask {
            id: chrono_id,
            fire_at: Instant::now() + period,
            period: Some(period),
            callback: Box::new(move |now| {
                if let Some(last) = watchdogs.last_service(&group_name) {
                    if now.saturating_duration_since(last) > timeout {
                        if let TaskCreation::Created(task) = reaction_for_chrono.get_task(false) {
                            scheduler_for_chrono.submit(task);
                        }
                    }
                }
                reaction_for_chrono.is_enabled()
            }),
        });

        let chrono = self.env.chrono.clone();
        reaction.add_unbinder(Box::new(move || chrono.unbind(chrono_id)));

        Ok(self.own(reaction))
    }

    fn own(&mut self, reaction: Arc<Reaction>) -> ReactionHandle {
        let handle = ReactionHandle::new(reaction);
        self.reactions.push(handle.clone());
        handle
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        for handle in self.reactions.drain(..) {
            handle.unbind();
        }
    }
}
