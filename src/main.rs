//! Scroll Quest headless runner
//!
//! Plays the demo pilot through a session and logs what happens.
//!
//! Usage: `scroll-quest [tuning.json] [level.json]`

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use scroll_quest::{LevelLayout, ProgressEvent, Session, SimError, Tuning};

/// One minute of play at 60 fps
#[cfg(not(target_arch = "wasm32"))]
const FRAMES: usize = 3600;
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const PILOT_SEED: u64 = 0x5C20_11;

#[cfg(not(target_arch = "wasm32"))]
fn run(args: &[String]) -> Result<(), SimError> {
    use scroll_quest::sim::{DemoPilot, GameEvent};

    let tuning = match args.first() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let layouts = match args.get(1) {
        Some(path) => vec![LevelLayout::load(path)?],
        None => Vec::new(),
    };

    let mut session = Session::new(tuning, layouts)?;
    let ledger = session.subscribe();
    let mut pilot = DemoPilot::new(PILOT_SEED);

    for _ in 0..FRAMES {
        let input = pilot.next_input(session.world());
        session.set_input(input);
        session.frame(FRAME_DT)?;

        for event in session.drain_events() {
            match event {
                GameEvent::Player(transition) => log::info!("Player: {:?}", transition),
                other => log::trace!("{:?}", other),
            }
        }
        for event in ledger.try_iter() {
            match event {
                ProgressEvent::LivesChanged(lives) => log::info!("Lives: {}", lives),
                ProgressEvent::CoinsChanged(coins) => log::debug!("Coins: {}", coins),
                ProgressEvent::LevelLoaded { world, stage } => {
                    log::info!("Level {}-{} loaded", world, stage)
                }
                ProgressEvent::GameOver => log::info!("Game over"),
            }
        }
        if session.is_game_over() {
            break;
        }
    }

    let world = session.world();
    log::info!(
        "Finished at {}-{} after {} ticks: x = {:.1}, lives {}, coins {}",
        world.world,
        world.stage,
        world.time_ticks,
        world.player.body.position.x,
        session.progress().lives(),
        session.progress().coins()
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Scroll Quest (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the embedding page on the web
}
