#![cfg(feature = "parallel")]

use sparse_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pos(f32, f32);

#[test]
fn test_par_for_each_mut_touches_every_component() {
    let mut db = EntityDatabase::new();
    for i in 0..10_000 {
        let e = db.create();
        db.set(e, Pos(i as f32, 0.0)).unwrap();
    }
    // Swap-removes scramble dense order; the pairing must survive it
    for raw in (1..10_000).step_by(7) {
        db.destroy(Entity::from_raw(raw)).unwrap();
    }

    db.par_for_each_mut::<Pos, _>(|entity, pos| {
        pos.1 = entity.to_raw() as f32;
    });

    for (entity, pos) in db.iter::<Pos>() {
        assert_eq!(pos.1, entity.to_raw() as f32);
        assert_eq!(pos.0 + 1.0, pos.1);
    }
}

#[test]
fn test_par_for_each_mut_on_missing_pool() {
    let mut db = EntityDatabase::new();
    db.par_for_each_mut::<Pos, _>(|_, _| panic!("no components"));
}
