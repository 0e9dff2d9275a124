use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sparse_ecs::prelude::*;
use sparse_ecs::serialization::{load_scene, save_scene};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Inventory {
    items: Vec<String>,
    owner: Entity,
}

fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_builtins();
    registry.register::<Inventory>("Inventory").unwrap();
    registry
}

#[test]
fn test_scene_round_trip_through_file() {
    let registry = registry();
    let mut db = EntityDatabase::new();
    let player = db.create();
    let sword = db.create();
    db.set(player, Name::new("player")).unwrap();
    db.set(
        player,
        LocalTransform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_rotation(Quat::IDENTITY),
    )
    .unwrap();
    db.set(
        sword,
        Inventory {
            items: vec!["sword".into()],
            owner: player,
        },
    )
    .unwrap();
    set_parent(&mut db, sword, player).unwrap();

    let scene = capture_scene(&db, &registry).unwrap();
    let path = std::env::temp_dir().join(format!("scene_roundtrip_{}.json", std::process::id()));
    save_scene(&scene, &path).unwrap();
    let loaded = load_scene(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let mut restored = EntityDatabase::new();
    restore_scene(&mut restored, &registry, &loaded).unwrap();

    assert_eq!(restored.get::<Name>(player), Ok(&Name::new("player")));
    assert_eq!(
        restored.get::<LocalTransform>(player).unwrap().position,
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert_eq!(restored.get::<Inventory>(sword).unwrap().owner, player);
    assert_eq!(descendants(&restored, player), vec![sword]);
    assert_eq!(capture_scene(&restored, &registry).unwrap(), scene);
}

#[test]
fn test_scene_json_shape() {
    let registry = registry();
    let mut db = EntityDatabase::new();
    let e = db.create();
    db.set(e, Name::new("solo")).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&capture_scene(&db, &registry).unwrap().to_json().unwrap()).unwrap();
    assert_eq!(
        json,
        json!({
            "version": 1,
            "entities": [ { "id": 1, "components": { "Name": "solo" } } ]
        })
    );
}

#[test]
fn test_unknown_component_in_scene() {
    let registry = registry();
    let scene = SceneData::from_json(
        r#"{ "version": 1, "entities": [ { "id": 4, "components": { "Ghost": 1 } } ] }"#,
    )
    .unwrap();

    let mut db = EntityDatabase::new();
    assert_eq!(
        restore_scene(&mut db, &registry, &scene),
        Err(EcsError::UnknownComponentType("Ghost".into()))
    );
    assert_eq!(db.entity_count(), 0);
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity(f32);

#[test]
fn test_duplicate_is_independent_of_source() {
    let registry = registry();
    let mut db = EntityDatabase::new();
    let player = db.create();
    let dropped = db.create();
    let sword = db.create();
    db.destroy(dropped).unwrap();
    db.set(player, Name::new("player")).unwrap();
    db.set(player, Velocity(2.0)).unwrap();
    db.set(
        sword,
        Inventory {
            items: vec!["sword".into()],
            owner: player,
        },
    )
    .unwrap();
    set_parent(&mut db, sword, player).unwrap();

    let mut copy = db.duplicate(&registry).unwrap();
    assert_eq!(copy.entities().collect::<Vec<_>>(), vec![player, sword]);
    assert_eq!(copy.get::<Parent>(sword), Ok(&Parent(player)));
    assert_eq!(copy.get::<Inventory>(sword).unwrap().owner, player);
    // Unregistered types stay behind
    assert!(!copy.has::<Velocity>(player));

    // Mutating either side leaves the other alone
    db.set(player, Name::new("renamed")).unwrap();
    destroy_recursive(&mut db, player).unwrap();
    assert_eq!(copy.get::<Name>(player), Ok(&Name::new("player")));
    assert!(copy.exists(sword));
    copy.remove::<Name>(player).unwrap();
    assert_eq!(db.entity_count(), 0);

    // The free-list came along: the destroyed id is reused first
    assert_eq!(copy.create(), dropped);
    assert!(copy.validate());
}

#[test]
fn test_duplicate_into_replaces_target() {
    let registry = registry();
    let mut source = EntityDatabase::new();
    let e = source.create();
    source.set(e, Name::new("source")).unwrap();

    let mut target = EntityDatabase::new();
    for i in 0..3 {
        let stale = target.create();
        target.set(stale, Name::new(format!("stale {i}"))).unwrap();
    }
    let names = target.observe::<Name>().unwrap();

    source.duplicate_into(&registry, &mut target).unwrap();
    assert_eq!(target.entity_count(), 1);
    assert_eq!(target.get::<Name>(e), Ok(&Name::new("source")));
    let events = names.drain();
    assert_eq!(events.len(), 4);
    assert_eq!(events.last(), Some(&ChangeEvent::created(e)));
}

#[test]
fn test_script_entity_round_trip() {
    let registry = registry();
    let mut db = EntityDatabase::new();
    let owner = db.create();

    let mut script = ScriptEntity::spawn(&mut db, &registry).unwrap();
    assert!(script.set(
        "Inventory",
        json!({ "items": ["potion"], "owner": owner.to_raw() })
    ));
    assert!(script.has("Inventory"));
    assert!(!script.set("Inventory", json!({ "items": 3 })));
    assert_eq!(script.get("Inventory").unwrap()["items"], json!(["potion"]));
    assert!(script.remove("Inventory"));
    assert!(!script.remove("Inventory"));
}
