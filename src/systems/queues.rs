//! Message queue maintenance.
//!
//! Bevy ECS' [`Messages`] API requires calling `update()` once per tick to
//! rotate its double buffer. Anything not read within two ticks is dropped.
use bevy_ecs::prelude::*;

use crate::events::contact::ContactEvent;
use crate::events::lifecycle::{BubbleEvent, LifecycleRequest};
use crate::events::spawn::SpawnRequest;

/// Advance every engine message queue. Runs first in the tick.
pub fn update_message_queues(
    mut contacts: ResMut<Messages<ContactEvent>>,
    mut requests: ResMut<Messages<LifecycleRequest>>,
    mut spawns: ResMut<Messages<SpawnRequest>>,
    mut events: ResMut<Messages<BubbleEvent>>,
) {
    contacts.update();
    requests.update();
    spawns.update();
    events.update();
}

/// Register the message queues the engine systems read and write.
pub fn init_message_queues(world: &mut World) {
    world.init_resource::<Messages<ContactEvent>>();
    world.init_resource::<Messages<LifecycleRequest>>();
    world.init_resource::<Messages<SpawnRequest>>();
    world.init_resource::<Messages<BubbleEvent>>();
}
