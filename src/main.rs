//! Ballpit entry point
//!
//! Headless driver: loads settings, feeds the simulation a synthetic frame
//! clock (with the occasional stall) and scripted input, and logs what the
//! physics core did. Windowing and drawing live outside this crate.
//!
//! Usage: `ballpit [settings.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::{Context, Result};
    use glam::Vec2;

    use ballpit::sim::{FrameReport, GravityDirection, Simulation};
    use ballpit::{BodyInstance, Settings};

    /// Frames between scripted gravity changes
    const GRAVITY_PERIOD: u32 = 180;
    /// Every this many frames the clock stalls
    const STALL_PERIOD: u32 = 240;
    const STALL_MS: f32 = 250.0;

    /// Driver state, one per run
    struct Driver {
        sim: Simulation,
        frame: u32,
        // FPS tracking (of the simulated clock)
        frame_times: [f64; 60],
        frame_index: usize,
        clock_ms: f64,
        fps: u32,
        totals: FrameReport,
    }

    impl Driver {
        fn new(sim: Simulation) -> Self {
            Self {
                sim,
                frame: 0,
                frame_times: [0.0; 60],
                frame_index: 0,
                clock_ms: 0.0,
                fps: 0,
                totals: FrameReport::default(),
            }
        }

        /// Frame duration the fake clock reports for the current frame
        fn frame_ms(&self) -> f32 {
            let target = self.sim.settings().target_frame_ms();
            if self.frame > 0 && self.frame % STALL_PERIOD == 0 {
                STALL_MS
            } else {
                // Jitter around the target like a real vsync'd loop
                target * if self.frame % 2 == 0 { 0.9 } else { 1.1 }
            }
        }

        /// Scripted stand-in for keyboard and mouse
        fn process_input(&mut self) {
            if self.frame % GRAVITY_PERIOD == 0 {
                let direction = match (self.frame / GRAVITY_PERIOD) % 5 {
                    0 => GravityDirection::Down,
                    1 => GravityDirection::Left,
                    2 => GravityDirection::Up,
                    3 => GravityDirection::Right,
                    _ => GravityDirection::None,
                };
                self.sim.set_gravity(direction);
            }

            if self.frame > 0 && self.frame % 300 == 0 {
                self.sim.cycle_visualization();
            }

            // Fling whatever sits in the middle of the world every few seconds
            let bounds = self.sim.bounds();
            let center = Vec2::new(bounds.width / 2.0, bounds.height / 2.0);
            match self.frame % 120 {
                60 => {
                    if let Some(id) = self.sim.grab_at(center) {
                        log::debug!("Picked up body {}", id.index());
                    }
                }
                61..=70 if self.sim.grabbed().is_some() => {
                    let t = (self.frame % 120 - 60) as f32;
                    self.sim.drag_to(center + Vec2::new(t * 6.0, t * 2.0));
                }
                71 => {
                    self.sim.release();
                }
                _ => {}
            }
        }

        fn update(&mut self) {
            let frame_ms = self.frame_ms();
            let report = self.sim.advance_frame(frame_ms);

            self.totals.substeps += report.substeps;
            self.totals.dropped += report.dropped;
            self.totals.contacts += report.contacts;
            self.totals.cell_changes += report.cell_changes;
            if report.dropped > 0.0 {
                log::warn!(
                    "Frame {} took {:.0} ms, dropped {:.1} frame units after {} substeps",
                    self.frame,
                    frame_ms,
                    report.dropped,
                    report.substeps
                );
            }

            // Track frame times for FPS
            self.clock_ms += frame_ms as f64;
            self.frame_times[self.frame_index] = self.clock_ms;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = self.clock_ms - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (59_000.0 / elapsed).round() as u32;
                }
            }
        }

        /// What a renderer would upload this frame
        fn render(&self) -> usize {
            let instances = self.sim.instances();
            BodyInstance::as_bytes(&instances).len()
        }

        fn run(&mut self, frames: u32) {
            while self.frame < frames {
                self.process_input();
                self.update();
                let bytes = self.render();

                if self.frame % 60 == 0 {
                    log::info!(
                        "frame {:>5} | fps {:>3} | contacts/frame {:>6} | {} | {} KiB instances | KE {:.1}",
                        self.frame,
                        self.fps,
                        self.totals.contacts / (self.frame as usize + 1),
                        self.sim.visualization().as_str(),
                        bytes / 1024,
                        self.sim.kinetic_energy()
                    );
                }
                self.frame += 1;
            }
        }
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Ballpit (native) starting...");

        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading settings from {path}"))?;
                Settings::from_json(&json).with_context(|| format!("loading {path}"))?
            }
            None => Settings::classic(),
        };
        let frames: u32 = match args.next() {
            Some(n) => n.parse().with_context(|| format!("invalid frame count {n:?}"))?,
            None => 600,
        };

        let sim = Simulation::new(settings).context("building simulation")?;
        let mut driver = Driver::new(sim);
        driver.run(frames);

        let totals = driver.totals;
        log::info!(
            "Done: {} frames, {} substeps, {} contacts, {} cell changes, {:.1} frame units dropped",
            frames,
            totals.substeps,
            totals.contacts,
            totals.cell_changes,
            totals.dropped
        );
        driver
            .sim
            .grid()
            .audit(driver.sim.bodies())
            .context("grid invariant broken")?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web build embeds the library directly, nothing to drive here
}
