//! Letter Leap entry point
//!
//! Native headless runner: loads a level, lets the autopilot play it with the
//! fixed-step accumulator loop and logs the host-facing events.
//!
//! Usage: `letter-leap [seed] [level.json]` (set `RUST_LOG=info` for events)

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use letter_leap::LevelConfig;
    use letter_leap::consts::*;
    use letter_leap::sim::{GameEvent, GamePhase, GameSession, TickInput, tick};

    /// Host frame time; deliberately not a multiple of the sim step
    const FRAME_DT: f32 = 1.0 / 45.0;
    /// Give up after this many simulated seconds
    const MAX_SECONDS: f32 = 600.0;

    struct Runner {
        session: GameSession,
        accumulator: f32,
        input: TickInput,
        collected: u32,
        rejected: u32,
    }

    impl Runner {
        fn new(session: GameSession) -> Self {
            Self {
                session,
                accumulator: 0.0,
                input: TickInput {
                    autopilot: true,
                    ..Default::default()
                },
                collected: 0,
                rejected: 0,
            }
        }

        /// Run simulation ticks for one host frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.session, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            for event in self.session.drain_events() {
                self.handle_event(&event);
            }
        }

        fn handle_event(&mut self, event: &GameEvent) {
            match event {
                GameEvent::Collected { matched: true, .. } => self.collected += 1,
                GameEvent::RejectFlash { .. } => self.rejected += 1,
                GameEvent::GoalSet { segment, goal } => {
                    log::info!("[segment {}] goal: {}", segment, goal.display_value());
                }
                GameEvent::SegmentCleared { segment } => {
                    log::info!("[segment {}] cleared at tick {}", segment, self.session.time_ticks);
                }
                GameEvent::CameraTarget { min_x, max_x } => {
                    log::debug!("camera span {:.0}..{:.0}", min_x, max_x);
                }
                GameEvent::LevelFinished => log::info!("level finished"),
                other => log::trace!("{:?}", other),
            }
        }
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0x5eed);
        let path = args.next().map(PathBuf::from);

        let config = LevelConfig::load(path.as_deref());
        let mut runner = Runner::new(GameSession::new(config, seed));

        let max_frames = (MAX_SECONDS / FRAME_DT) as u32;
        for _ in 0..max_frames {
            runner.update(FRAME_DT);
            if runner.session.phase == GamePhase::Finished {
                break;
            }
        }

        let session = &runner.session;
        println!(
            "seed {}: {:?} after {} ticks, segment {}/{}, {} collected, {} rejected",
            seed,
            session.phase,
            session.time_ticks,
            session.progress.index + 1,
            session.layouts.len(),
            runner.collected,
            runner.rejected
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Letter Leap (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly; there is no wasm binary
}
