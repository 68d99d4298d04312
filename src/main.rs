//! Flock Siege headless runner
//!
//! Seeds a session, scripts asteroid launches at the flock and runs a fixed
//! number of frames, then logs how the game went.
//!
//! Usage: `flock-siege [frames] [seed] [settings.json] [save.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use flock_siege::consts::*;
    use flock_siege::persistence::{JsonFileStore, SaveStore};
    use flock_siege::platform::LogHooks;
    use flock_siege::sim::{GamePhase, tick::nearest_agent};
    use flock_siege::{Session, Settings};
    use glam::Vec2;

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let frames: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3600);
    let seed: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0xF10C);
    let settings = args.get(3).map(Settings::load).unwrap_or_default();
    let mut store = args.get(4).map(JsonFileStore::new);

    log::info!("Flock Siege (headless) starting: {frames} frames, seed {seed}");
    let mut session = Session::new(seed, settings, LogHooks);

    if let Some(store) = store.as_ref() {
        match session.load(store) {
            Ok(true) => log::info!("Resumed from {}", store.path().display()),
            Ok(false) => {}
            Err(e) => log::warn!("Could not load {}: {e}", store.path().display()),
        }
    }

    let launch_from = Vec2::new(
        session.state().settings.screen_width / 2.0,
        session.state().settings.screen_height - 20.0,
    );
    let (mut kills, mut launches, mut escapes, mut faults) = (0u32, 0u32, 0u32, 0u32);
    let mut last_phase = session.phase();

    for frame in 0..frames {
        if frame % 30 == 0 {
            if let Some(target) = nearest_agent(session.state(), launch_from) {
                let size = if session.ledger().score() > 2000 {
                    LARGE_ASTEROID_SIZE
                } else {
                    MEDIUM_ASTEROID_SIZE
                };
                if session.launch_asteroid(launch_from, target, size).is_some() {
                    launches += 1;
                }
            }
        }

        let report = session.tick(FRAME_DT);
        kills += report.collisions.kills;
        escapes += report.escapes;
        faults += report.collisions.effect_faults;

        // Auto-save when a wave is cleared
        let phase = session.phase();
        if phase != last_phase {
            if phase == GamePhase::Breather {
                if let Some(store) = store.as_mut() {
                    if let Err(e) = store.save(&session.save_data()) {
                        log::warn!("Auto-save failed: {e}");
                    }
                }
            }
            last_phase = phase;
        }
        if phase == GamePhase::GameOver {
            break;
        }
    }

    let hud = session.hud();
    log::info!(
        "Finished: wave {}, score {}, {} kills, {} launches, {} escapes, {} cells left, {} effect faults",
        hud.wave,
        hud.score,
        kills,
        launches,
        escapes,
        hud.resources_remaining,
        faults
    );
    println!(
        "wave={} score={} phase={:?} kills={} escapes={} resources={}",
        hud.wave, hud.score, hud.phase, kills, escapes, hud.resources_remaining
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded by a host page; there is no runner on wasm
}
