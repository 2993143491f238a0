//! The demo world written by `engine_pack demo`.

use std::sync::Arc;

use anyhow::Result;
use engine_component::{ComponentLibrary, Entity, Prefab};
use engine_defaults::{DisplayName, Health, Inventory, Location, NetworkOwner};
use engine_persist::{ComponentIdTable, PackedEntitySerializer};
use engine_world::World;
use tracing::info;

pub const GOBLIN: &str = "prefab:goblin";
pub const CHEST: &str = "prefab:chest";

/// Library with every stock component registered.
pub fn library() -> Result<Arc<ComponentLibrary>> {
    let mut library = ComponentLibrary::new();
    engine_defaults::register_defaults(&mut library)?;
    Ok(Arc::new(library))
}

/// A serializer over an empty world with the demo prefabs registered.
pub fn serializer(library: Arc<ComponentLibrary>) -> PackedEntitySerializer<World> {
    let mut world = World::new();
    world.register_prefab(
        Prefab::new(GOBLIN)
            .with(Location::IDENTITY)
            .with(Health::full(30))
            .with(DisplayName::new("goblin"))
            .with(Inventory::with_capacity(4)),
    );
    world.register_prefab(
        Prefab::new(CHEST)
            .with(Location::IDENTITY)
            .with(Inventory::with_capacity(16)),
    );

    let table = ComponentIdTable::from_library(&library);
    let serializer = PackedEntitySerializer::new(world, library);
    serializer.set_id_mapping(table);
    serializer
}

/// Spawn `count` goblins in a row, plus a chest and a bare marker entity.
pub fn populate(world: &mut World, count: usize) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(count + 2);

    for index in 0..count {
        let Some(goblin) = world.spawn_from_prefab(GOBLIN) else {
            continue;
        };
        if let Some(location) = world.get_mut::<Location>(goblin) {
            *location = location.translated([index as f32 * 2.0, 0.0, 0.0]);
        }
        if index % 2 == 1
            && let Some(health) = world.get_mut::<Health>(goblin)
        {
            health.damage(12);
        }
        if index % 3 == 2 {
            world.remove::<Inventory>(goblin);
        }
        if index == 0 {
            world.insert(goblin, NetworkOwner { client_id: Some(1) });
        }
        entities.push(goblin);
    }

    if let Some(chest) = world.spawn_from_prefab(CHEST) {
        if let Some(inventory) = world.get_mut::<Inventory>(chest) {
            inventory.add("gold");
            inventory.add("map");
        }
        entities.push(chest);
    }

    let marker = world.spawn();
    world.insert(marker, Location::at([0.0, 10.0, 0.0]));
    world.insert(marker, DisplayName::new("spawn point"));
    entities.push(marker);

    info!(entities = entities.len(), "populated demo world");
    entities
}
