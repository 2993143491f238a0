//! Fixtures shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Arc;

use engine_component::{Component, ComponentLibrary, ComponentMetadata, FieldMetadata, Prefab};
use engine_world::World;

use crate::id_table::ComponentIdTable;
use crate::serializer::PackedEntitySerializer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alpha {
    pub f0: i64,
    pub f1: String,
}

impl Component for Alpha {
    fn type_name() -> &'static str {
        "Alpha"
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beta {
    pub f0: bool,
}

impl Component for Beta {
    fn type_name() -> &'static str {
        "Beta"
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counter {
    pub f0: i64,
    pub f1: i64,
}

impl Component for Counter {
    fn type_name() -> &'static str {
        "Counter"
    }
}

/// `None` serialises to null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub text: Option<String>,
    pub pinned: bool,
}

impl Component for Note {
    fn type_name() -> &'static str {
        "Note"
    }
}

/// Not persisted; `shared` is replicated, `local` is not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub shared: u32,
    pub local: u32,
}

impl Component for Session {
    fn type_name() -> &'static str {
        "Session"
    }
}

/// 256 fields, one more than a record can hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Wide(pub Vec<i32>);

pub const WIDE_FIELDS: usize = 256;

impl Default for Wide {
    fn default() -> Self {
        Self(vec![0; WIDE_FIELDS])
    }
}

impl Component for Wide {
    fn type_name() -> &'static str {
        "Wide"
    }
}

/// Registered, but given no id in [`id_table`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unmapped {
    pub value: i32,
}

impl Component for Unmapped {
    fn type_name() -> &'static str {
        "Unmapped"
    }
}

/// Not registered at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stray;

impl Component for Stray {
    fn type_name() -> &'static str {
        "Stray"
    }
}

/// `links` cannot be written once it has entries: JSON keys must be strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Faulty {
    pub links: HashMap<(u8, u8), u8>,
}

impl Component for Faulty {
    fn type_name() -> &'static str {
        "Faulty"
    }
}

pub const ALPHA: u32 = 1;
pub const BETA: u32 = 2;
pub const COUNTER: u32 = 3;
pub const NOTE: u32 = 4;
pub const SESSION: u32 = 5;
pub const WIDE: u32 = 6;
pub const FAULTY: u32 = 7;

pub const PREFAB: &str = "p:example";
pub const EXTRAS: &str = "p:extras";

fn wide_metadata() -> ComponentMetadata {
    let mut builder = ComponentMetadata::builder::<Wide>();
    for index in 0..WIDE_FIELDS {
        let id = u8::try_from(index).unwrap();
        let name: &'static str = Box::leak(format!("f{index}").into_boxed_str());
        builder = builder.with_field(FieldMetadata::with_accessors::<Wide, i32, _, _>(
            id,
            name,
            move |wide: &Wide| &wide.0[index],
            move |wide: &mut Wide| &mut wide.0[index],
        ));
    }
    builder.build().unwrap()
}

pub fn library() -> ComponentLibrary {
    let mut library = ComponentLibrary::new();
    let all = [
        ComponentMetadata::builder::<Alpha>()
            .replicated()
            .replicated_field(0, "f0", |a| &a.f0, |a| &mut a.f0)
            .field(1, "f1", |a| &a.f1, |a| &mut a.f1)
            .build(),
        ComponentMetadata::builder::<Beta>()
            .replicated()
            .replicated_field(0, "f0", |b| &b.f0, |b| &mut b.f0)
            .build(),
        ComponentMetadata::builder::<Counter>()
            .field(0, "f0", |c| &c.f0, |c| &mut c.f0)
            .field(1, "f1", |c| &c.f1, |c| &mut c.f1)
            .build(),
        ComponentMetadata::builder::<Note>()
            .field(0, "text", |n| &n.text, |n| &mut n.text)
            .field(1, "pinned", |n| &n.pinned, |n| &mut n.pinned)
            .build(),
        ComponentMetadata::builder::<Session>()
            .not_persisted()
            .replicated()
            .replicated_field(0, "shared", |s| &s.shared, |s| &mut s.shared)
            .field(1, "local", |s| &s.local, |s| &mut s.local)
            .build(),
        Ok(wide_metadata()),
        ComponentMetadata::builder::<Unmapped>()
            .field(0, "value", |u| &u.value, |u| &mut u.value)
            .build(),
        ComponentMetadata::builder::<Faulty>()
            .field(0, "links", |f| &f.links, |f| &mut f.links)
            .build(),
    ];
    for metadata in all {
        library.register(metadata.unwrap()).unwrap();
    }
    library
}

pub fn id_table() -> ComponentIdTable {
    ComponentIdTable::try_from_pairs([
        (Alpha::component_type_id(), ALPHA),
        (Beta::component_type_id(), BETA),
        (Counter::component_type_id(), COUNTER),
        (Note::component_type_id(), NOTE),
        (Session::component_type_id(), SESSION),
        (Wide::component_type_id(), WIDE),
        (Faulty::component_type_id(), FAULTY),
    ])
    .unwrap()
}

/// A world with [`PREFAB`] = `{Counter{1, 1}, Beta{true}}` and
/// [`EXTRAS`] = `{Note{"memo", false}, Faulty{}, Beta{false}}`.
pub fn world() -> World {
    let mut world = World::new();
    world.register_prefab(
        Prefab::new(PREFAB)
            .with(Counter { f0: 1, f1: 1 })
            .with(Beta { f0: true }),
    );
    world.register_prefab(
        Prefab::new(EXTRAS)
            .with(Note {
                text: Some("memo".into()),
                pinned: false,
            })
            .with(Faulty::default())
            .with(Beta { f0: false }),
    );
    world
}

pub fn serializer() -> PackedEntitySerializer<World> {
    let serializer = PackedEntitySerializer::new(world(), Arc::new(library()));
    serializer.set_id_mapping(id_table());
    serializer
}
