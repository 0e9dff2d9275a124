#![allow(dead_code, unused_imports)]

use sparse_ecs::{CommandBuffer, EntityDatabase};
use std::time::Instant;

#[derive(Debug, Clone)]
struct Position(f32, f32, f32);

#[derive(Debug, Clone)]
struct Velocity(f32, f32, f32);

#[derive(Debug, Clone)]
struct Health(u32);

#[cfg(feature = "profiling")]
#[tracing::instrument(skip(db))]
fn profile_sets(db: &mut EntityDatabase, count: usize) {
    let _span = tracing::info_span!("set_loop", count = count).entered();
    for i in 0..count {
        if i % 1_000 == 0 {
            tracing::info!("Creating entity {}/{}", i, count);
        }
        let e = db.create();
        let _ = db.set(e, Position(1.0, 2.0, 3.0));
        let _ = db.set(e, Velocity(1.0, 0.0, 0.0));
        if i % 4 == 0 {
            let _ = db.set(e, Health(100));
        }
    }
}

#[cfg(feature = "profiling")]
fn profile_frame(db: &mut EntityDatabase) {
    let _span = tracing::info_span!("frame").entered();
    for (_, pos, vel) in db.view_mut::<(Position, Velocity)>() {
        pos.0 += vel.0;
    }

    let mut commands = CommandBuffer::new();
    for (e, health) in db.view::<(Health,)>() {
        if health.0 < 100 {
            commands.destroy(e);
        }
    }
    if let Err(err) = commands.apply(db) {
        tracing::error!(%err, "deferred commands failed");
    }
}

#[cfg(feature = "profiling")]
fn main() {
    let _guard = match sparse_ecs::profiling::init_json_trace("trace.json".as_ref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("cannot open trace file: {err}");
            return;
        }
    };

    let mut db = EntityDatabase::new();

    println!("Profiling set with 3 components...");
    let start = Instant::now();
    profile_sets(&mut db, 10_000);
    println!("Created 10k entities in: {:?}", start.elapsed());

    let start = Instant::now();
    for _ in 0..100 {
        profile_frame(&mut db);
    }
    println!("100 frames in: {:?}", start.elapsed());
}

#[cfg(not(feature = "profiling"))]
fn main() {
    println!("profile_storage binary requires --features profiling");
}
