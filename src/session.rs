//! Game session
//!
//! Owns the current `World` and the progress ledger, and turns variable
//! frame times into fixed simulation ticks. The world is rebuilt from its
//! layout every time the ledger announces a level load.

use std::sync::mpsc::Receiver;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::level::LevelLayout;
use crate::progress::{GameProgress, ProgressEvent};
use crate::sim::{self, GameEvent, TickInput, World};
use crate::{SimError, Tuning};

pub struct Session {
    world: World,
    progress: GameProgress,
    tuning: Tuning,
    layouts: Vec<LevelLayout>,
    level_events: Receiver<ProgressEvent>,
    accumulator: f32,
    input: TickInput,
    game_over: bool,
}

/// Layout for a level, falling back to the built-in stage
fn layout_for(layouts: &[LevelLayout], world: u32, stage: u32) -> LevelLayout {
    layouts
        .iter()
        .find(|l| l.world == world && l.stage == stage)
        .cloned()
        .unwrap_or_else(|| {
            log::debug!("No layout for {}-{}, using the demo stage", world, stage);
            LevelLayout::demo(world, stage)
        })
}

impl Session {
    /// Start a new game at the first supplied layout (or 1-1)
    pub fn new(tuning: Tuning, layouts: Vec<LevelLayout>) -> Result<Self, SimError> {
        tuning.validate()?;
        let (start_world, start_stage) = layouts
            .first()
            .map(|l| (l.world, l.stage))
            .unwrap_or((1, 1));

        let mut progress = GameProgress::new();
        let level_events = progress.subscribe();
        progress.new_game();
        if (start_world, start_stage) != (1, 1) {
            progress.load_level(start_world, start_stage);
        }
        // The world below already reflects the startup notifications
        level_events.try_iter().for_each(drop);

        let layout = layout_for(&layouts, start_world, start_stage);
        let world = World::new(&layout, tuning.clone())?;

        Ok(Self {
            world,
            progress,
            tuning,
            layouts,
            level_events,
            accumulator: 0.0,
            input: TickInput::default(),
            game_over: false,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn progress(&self) -> &GameProgress {
        &self.progress
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Observe ledger changes
    pub fn subscribe(&mut self) -> Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Latch this frame's input; a jump press stays latched until a tick
    /// consumes it
    pub fn set_input(&mut self, input: TickInput) {
        let pressed = self.input.jump_pressed || input.jump_pressed;
        self.input = input;
        self.input.jump_pressed = pressed;
    }

    /// Take the simulation events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    /// Run fixed ticks for the elapsed time, then the per-frame update
    pub fn frame(&mut self, dt: f32) -> Result<(), SimError> {
        if self.game_over {
            return Ok(());
        }
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            sim::tick(&mut self.world, &mut self.progress, &self.input, SIM_DT);
            self.progress.advance(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump_pressed = false;

            if self.apply_progress_events()? {
                self.accumulator = 0.0;
                break;
            }
        }

        sim::frame(&mut self.world, dt);
        Ok(())
    }

    /// Start over from 1-1 with a fresh ledger
    pub fn restart(&mut self) -> Result<(), SimError> {
        log::info!("Restarting game");
        self.game_over = false;
        self.accumulator = 0.0;
        self.input = TickInput::default();
        self.progress.new_game();
        self.apply_progress_events()?;
        Ok(())
    }

    /// React to ledger notifications; true when the world was rebuilt
    fn apply_progress_events(&mut self) -> Result<bool, SimError> {
        let mut rebuilt = false;
        let events: Vec<_> = self.level_events.try_iter().collect();
        for event in events {
            match event {
                ProgressEvent::LevelLoaded { world, stage } => {
                    let layout = layout_for(&self.layouts, world, stage);
                    let pending = self.world.drain_events();
                    self.world = World::new(&layout, self.tuning.clone())?;
                    self.world.events = pending;
                    rebuilt = true;
                }
                ProgressEvent::GameOver => {
                    log::info!("Game over at {}-{}", self.progress.world(), self.progress.stage());
                    self.game_over = true;
                }
                ProgressEvent::LivesChanged(_) | ProgressEvent::CoinsChanged(_) => {}
            }
        }
        Ok(rebuilt)
    }
}
