//! Type-indexed dispatch of a message to all subscribers under a named
//! scope. The per-scope entry points
//! (`emit_local`/`emit_inline`/... ) live on `PowerPlant`, since each
//! needs pieces only it owns (the scheduler, the chrono/network
//! collaborators, the run-state); this module holds the dispatch core
//! shared by `Local` and `Inline`, the only two scopes that iterate
//! `TypeStore` subscribers directly.
use std::sync::Arc;

use crate::{
    events::{EventSink, ReactionEvent, ReactionEventKind},
    reaction::{Reaction, TaskCreation},
    scheduler::Scheduler,
    store::{CurrentValueGuard, Shared, TypeStoreRegistry},
};

/// Task-creation sequence per subscriber:
/// 1. Replace the type store's latest value.
/// 2. Install a current-value override for the duration of the loop.
/// 3. For each subscriber, attempt task creation and either submit the
///    resulting task or emit a `Blocked`/`MissingData` event.
/// 4. Uninstall the override (guard drop) once every subscriber has been
///    visited.
pub fn dispatch<M: Send + Sync + 'static>(
    registry: &TypeStoreRegistry,
    scheduler: &Scheduler,
    sink: &Arc<dyn EventSink>,
    payload: Shared<M>,
    request_inline: bool,
) {
    let store = registry.store_for::<M>();
    store.set(payload.clone());

    let _guard = CurrentValueGuard::install(Some(payload));
    let subscribers = store.subscribers();
    for reaction in subscribers.iter() {
        dispatch_one(reaction, scheduler, sink, request_inline);
    }
}

fn dispatch_one(reaction: &Arc<Reaction>, scheduler: &Scheduler, sink: &Arc<dyn EventSink>, request_inline: bool) {
    match reaction.get_task(request_inline) {
        TaskCreation::Created(task) => {
            if request_inline {
                scheduler.submit_requesting_inline(task, true);
            } else {
                scheduler.submit(task);
            }
        }
        TaskCreation::Blocked => emit_event(reaction, sink, ReactionEventKind::Blocked),
        TaskCreation::MissingData => emit_event(reaction, sink, ReactionEventKind::MissingData),
    }
}

fn emit_event(reaction: &Arc<Reaction>, sink: &Arc<dyn EventSink>, kind: ReactionEventKind) {
    if !reaction.emit_stats {
        return;
    }
    sink.emit_reaction_event(ReactionEvent {
        reaction_id: reaction.id,
        reactor_name: reaction.identifiers.reactor_name.clone(),
        kind,
    });
}
