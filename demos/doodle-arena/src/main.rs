//! Two participants share a canvas through one in-process store: they
//! join, watch each other arrive, doodle, move, and eat food spawned by
//! the periodic spawner.

use std::sync::Arc;
use std::time::Duration;

use scrawl::prelude::*;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = MemoryStore::new();
    let config = ArenaConfig {
        max_users: 4,
        max_food_dots: 5,
        food_spawn_interval: Duration::from_millis(400),
        ..ArenaConfig::default()
    };

    let alice = RealtimeService::new(Arc::new(store.clone()), config.clone());
    let bob = RealtimeService::new(Arc::new(store.clone()), config);

    // Print everything Bob's instance observes.
    let _sub = bob.on(|event| match event {
        ArenaEvent::UserJoined(p) => println!("[bob] {} joined as {} ({})", p.id, p.name, p.color),
        ArenaEvent::UserLeft(id) => println!("[bob] {id} left"),
        ArenaEvent::DrawingData(d) => println!("[bob] drawing update: {}", d.0),
        ArenaEvent::FoodStateUpdated(dots) => println!("[bob] food pool: {} dots", dots.len()),
    });

    let a = alice.join().await?.expect("arena has room");
    let b = bob.join().await?.expect("arena has room");
    println!("joined: {} and {}", a.name, b.name);

    alice
        .draw(&DrawEvent(json!({
            "from": { "x": 100.0, "y": 100.0 },
            "to": { "x": 220.0, "y": 180.0 },
            "color": a.color,
        })))
        .await?;

    alice
        .update_player_position(&a.id, &PlayerState::at(220.0, 180.0))
        .await?;

    // Let the spawner fill the pool.
    tokio::time::sleep(Duration::from_secs(2)).await;

    if let Some(pool) = store.get("food").await? {
        if let Some(key) = pool.as_object().and_then(|m| m.keys().next()) {
            println!("bob eats {key}");
            bob.eat_food(&FoodKey(key.clone())).await?;
        }
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    alice.leave().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    bob.leave().await?;
    println!("done");
    Ok(())
}
