use sparse_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct A(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct B(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct C(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct D(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct E(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct F(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct G(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct H(u32);

#[test]
fn test_view_intersection() {
    let mut db = EntityDatabase::new();
    let mut both = Vec::new();
    for i in 0..20 {
        let e = db.create();
        if i % 2 == 0 {
            db.set(e, A(i)).unwrap();
        }
        if i % 3 == 0 {
            db.set(e, B(i)).unwrap();
        }
        if i % 6 == 0 {
            both.push(e);
        }
    }

    let mut seen: Vec<Entity> = db
        .view::<(A, B)>()
        .map(|(e, a, b)| {
            assert_eq!(a.0, b.0);
            e
        })
        .collect();
    seen.sort();
    assert_eq!(seen, both);

    // Order of types in the tuple does not change membership
    assert_eq!(db.view::<(B, A)>().count(), both.len());
}

#[test]
fn test_eight_component_view() {
    let mut db = EntityDatabase::new();
    let full = db.create();
    let partial = db.create();
    for e in [full, partial] {
        db.set(e, A(1)).unwrap();
        db.set(e, B(2)).unwrap();
        db.set(e, C(3)).unwrap();
        db.set(e, D(4)).unwrap();
        db.set(e, E(5)).unwrap();
        db.set(e, F(6)).unwrap();
        db.set(e, G(7)).unwrap();
    }
    db.set(full, H(8)).unwrap();

    let rows: Vec<_> = db.view::<(A, B, C, D, E, F, G, H)>().collect();
    assert_eq!(rows.len(), 1);
    let (e, a, _, _, _, _, _, _, h) = rows[0];
    assert_eq!((e, a.0, h.0), (full, 1, 8));

    for (_, a, .., h) in db.view_mut::<(A, B, C, D, E, F, G, H)>() {
        a.0 += h.0;
    }
    assert_eq!(db.get::<A>(full), Ok(&A(9)));
    assert_eq!(db.get::<A>(partial), Ok(&A(1)));
}

#[test]
fn test_view_over_unregistered_type_is_empty() {
    let mut db = EntityDatabase::new();
    let e = db.create();
    db.set(e, A(1)).unwrap();
    assert_eq!(db.view::<(A, C)>().count(), 0);
    assert!(!db.is_registered::<C>());
}

#[test]
fn test_view_after_removals() {
    let mut db = EntityDatabase::new();
    let entities: Vec<Entity> = (0..6).map(|_| db.create()).collect();
    for (i, &e) in entities.iter().enumerate() {
        db.set(e, A(i as u32)).unwrap();
        db.set(e, B(i as u32)).unwrap();
    }
    db.remove::<A>(entities[0]).unwrap();
    db.remove::<B>(entities[3]).unwrap();
    db.destroy(entities[5]).unwrap();

    let mut seen: Vec<u32> = db.view::<(A, B)>().map(|(_, a, _)| a.0).collect();
    seen.sort();
    assert_eq!(seen, vec![1, 2, 4]);
}

#[test]
fn test_iter_single_pool() {
    let mut db = EntityDatabase::new();
    for i in 0..4 {
        let e = db.create();
        db.set(e, C(i)).unwrap();
    }
    let total: u32 = db.iter::<C>().map(|(_, c)| c.0).sum();
    assert_eq!(total, 6);
    assert_eq!(db.iter::<D>().count(), 0);
}

#[test]
#[should_panic(expected = "same component type twice")]
fn test_view_mut_aliasing_panics() {
    let mut db = EntityDatabase::new();
    let e = db.create();
    db.set(e, A(1)).unwrap();
    db.set(e, B(1)).unwrap();
    let _ = db.view_mut::<(A, B, A)>().count();
}
