//! Contact event tracking
//!
//! rapier reports which pairs touch right now. Diffing that set between steps
//! yields begin / persist / end transitions, delivered per entity as a queue.

use std::collections::HashMap;

use rapier3d::prelude::ColliderHandle;

use super::world::{ColliderPair, ContactSummary, TouchingPair};
use crate::ecs::components::{ContactEventMask, PhysicsBody};
use crate::ecs::{Entity, World};

/// Transition of a touching pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// First step the pair touches
    Begin,
    /// A later step the pair still touches
    Persist,
    /// First step after the pair separated
    End,
}

impl ContactKind {
    /// Mask bit an entity must carry to receive this kind
    #[must_use]
    pub const fn mask(self) -> ContactEventMask {
        match self {
            Self::Begin => ContactEventMask::BEGIN,
            Self::Persist => ContactEventMask::PERSIST,
            Self::End => ContactEventMask::END,
        }
    }
}

/// Contact notification addressed to one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// Transition
    pub kind: ContactKind,
    /// Receiving entity
    pub entity: Entity,
    /// Entity on the other side of the contact
    pub other: Entity,
    /// Contact geometry as seen from `entity`
    pub summary: ContactSummary,
}

#[derive(Debug, Clone, Copy)]
struct ActiveContact {
    entities: (Entity, Entity),
    summary: ContactSummary,
}

/// Diffs touching pairs between steps
#[derive(Debug, Default)]
pub struct ContactTracker {
    active: HashMap<ColliderPair, ActiveContact>,
}

impl ContactTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs currently touching
    #[must_use]
    pub fn active_pairs(&self) -> usize {
        self.active.len()
    }

    /// Compare this step's touching pairs against the previous step and
    /// append the transitions to `events`. Pairs whose colliders do not
    /// resolve to entities are ignored.
    pub fn update(
        &mut self,
        touching: &[TouchingPair],
        resolve: impl Fn(ColliderHandle) -> Option<Entity>,
        events: &mut Vec<ContactEvent>,
    ) {
        let mut still_touching = HashMap::with_capacity(touching.len());

        for touch in touching {
            let kind;
            let entities = if let Some(previous) = self.active.remove(&touch.pair) {
                kind = ContactKind::Persist;
                previous.entities
            } else {
                let (Some(first), Some(second)) = (resolve(touch.pair.0), resolve(touch.pair.1))
                else {
                    continue;
                };
                kind = ContactKind::Begin;
                (first, second)
            };
            push_both(events, kind, entities, touch.contact);
            still_touching.insert(
                touch.pair,
                ActiveContact {
                    entities,
                    summary: touch.contact,
                },
            );
        }

        for ended in self.active.values() {
            push_both(events, ContactKind::End, ended.entities, ended.summary);
        }
        self.active = still_touching;
    }
}

fn push_both(
    events: &mut Vec<ContactEvent>,
    kind: ContactKind,
    (first, second): (Entity, Entity),
    summary: ContactSummary,
) {
    events.push(ContactEvent {
        kind,
        entity: first,
        other: second,
        summary,
    });
    events.push(ContactEvent {
        kind,
        entity: second,
        other: first,
        summary: ContactSummary {
            normal: -summary.normal,
            ..summary
        },
    });
}

/// Whether `event` should reach its entity: it must still carry a physics
/// body whose mask accepts the event kind
#[must_use]
pub fn is_deliverable(world: &World, event: &ContactEvent) -> bool {
    world
        .get_component::<PhysicsBody>(event.entity)
        .is_some_and(|body| body.contact_events().contains(event.kind.mask()))
}
