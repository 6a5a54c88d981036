//! Reticle Arena headless driver
//!
//! Runs the mover engine against a scripted player so motion can be inspected
//! from logs (`RUST_LOG=debug`) and the final JSON snapshot.
//!
//! Usage: `reticle-arena [settings.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use glam::Vec2;
    use reticle_arena::consts::REFERENCE_FRAME_MS;
    use reticle_arena::sim::{Arena, FrameInput, MoverEvent, ScreenTransform, TargetCircle};
    use reticle_arena::{MoverSettings, MoverSystem};

    env_logger::init();
    log::info!("Reticle Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => MoverSettings::load(Path::new(&path)),
        None => MoverSettings::default(),
    };
    let frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1800);
    log::info!("Simulating {} frames with seed {}", frames, settings.seed);

    let mut system = MoverSystem::new(settings);
    let arena = Some(Arena::new(640.0 - 20.0, 360.0 - 20.0));
    // Stationary targets in world space
    let world_targets = [Vec2::new(250.0, 120.0), Vec2::new(-300.0, -60.0), Vec2::new(40.0, 260.0)];

    let mut now = 0.0f64;
    let mut player = Vec2::ZERO;
    let mut next_shot_at = 0.0f64;
    let mut kills = 0u32;

    for frame in 0..frames {
        // Slightly uneven frame pacing, like a real display loop
        let dt = if frame % 7 == 0 { 1.25 } else { 1.0 };
        now += (dt * REFERENCE_FRAME_MS) as f64;

        // Player sweeps a slow circle while the view rotates with it
        let angle = now as f32 * 0.0004;
        let next_player = Vec2::new(angle.cos(), angle.sin()) * 220.0;
        let player_speed = (next_player - player).length() / dt;
        player = next_player;
        let transform = ScreenTransform::from_angle(player, angle * 0.25);

        let targets = world_targets
            .iter()
            .map(|t| TargetCircle {
                pos: transform.to_screen(*t),
                radius: 28.0,
            })
            .collect();

        system.ensure_count(arena, now);
        system.update(&FrameInput {
            dt,
            now_ms: now,
            transform,
            arena,
            targets,
            player_speed,
        });

        if now >= next_shot_at {
            if let Some(idx) = system.hit_test() {
                next_shot_at = now + 250.0;
                let outcome = system.register_hit(idx);
                if outcome.exhausted() {
                    kills += 1;
                } else {
                    log::debug!("Shot mover {idx}: {outcome:?}");
                }
            }
        }

        if system.all_dead() {
            system.respawn_all();
        }

        for event in system.drain_events() {
            match event {
                MoverEvent::Hit { .. } | MoverEvent::Healed { .. } => log::debug!("{event:?}"),
                _ => log::info!("{event:?}"),
            }
        }
    }

    log::info!("Done: {kills} movers exhausted in {:.1} s", now / 1000.0);
    match serde_json::to_string_pretty(&system.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Snapshot serialization failed: {err}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is driven by the host game loop on the web
}
