//! Registry synchronisation.
//!
//! Refreshes the cached geometry and state in
//! [`BubbleRegistry`](crate::resources::registry::BubbleRegistry) from the
//! bubble components, and drops entries whose entity vanished without going
//! through the lifecycle (despawned by a host, for instance).
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::bubble::Bubble;
use crate::components::lifecycle::Lifecycle;
use crate::components::mapposition::MapPosition;
use crate::components::pointer::PointerState;
use crate::resources::registry::{BubbleRegistry, RegistryUpdate};

pub fn sync_registry_system(
    mut registry: ResMut<BubbleRegistry>,
    bubbles: Query<(Entity, &Bubble, &Lifecycle, &MapPosition, Option<&PointerState>)>,
) {
    let dropped = registry.retain(|entity| bubbles.contains(entity));
    if dropped > 0 {
        debug!("Registry dropped {} bubbles that no longer exist", dropped);
    }

    for (entity, bubble, lifecycle, position, pointer) in bubbles.iter() {
        registry.refresh(
            entity,
            position.pos,
            bubble.size(),
            RegistryUpdate {
                variant: bubble.variant,
                state: lifecycle.state(),
                invulnerable: bubble.invulnerable,
                hover_fraction: pointer.map(|p| p.hover_fraction).unwrap_or(0.0),
            },
        );
    }
}
