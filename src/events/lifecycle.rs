//! Lifecycle requests and notifications.
//!
//! [`LifecycleRequest`] is the queue between deciding and acting: the
//! pointer, growth, spawn and interaction systems only submit requests, and
//! [`apply_lifecycle_requests`](crate::systems::lifecycle::apply_lifecycle_requests)
//! applies them after every decision of the tick has been made.
//!
//! [`BubbleEvent`] goes the other way, out to renderers, audio and UI.
use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;
use glam::Vec2;

use crate::components::bubble::BubbleId;
use crate::components::lifecycle::PopCause;

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum LifecycleRequest {
    Pop { entity: Entity, cause: PopCause },
    /// Merge `a` and `b`. The lower [`BubbleId`] leads.
    Merge { a: Entity, b: Entity },
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum BubbleEvent {
    PopStarted {
        id: BubbleId,
        variant: usize,
        cause: PopCause,
    },
    PopCompleted {
        id: BubbleId,
        variant: usize,
        position: Vec2,
        size: f32,
    },
    MergeStarted {
        leader: BubbleId,
        follower: BubbleId,
    },
    MergeCompleted {
        merged: BubbleId,
        variant: usize,
        position: Vec2,
        size: f32,
    },
    SplitSpawned {
        parent: BubbleId,
        child: BubbleId,
        variant: usize,
    },
    HoverEntered {
        id: BubbleId,
    },
    HoverExited {
        id: BubbleId,
    },
}
