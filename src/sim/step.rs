//! Fixed-timestep accumulator
//!
//! Measured frame time is converted to frame units (1.0 = one target frame)
//! and paid out in sub-steps of at most `max_delta` each. After `max_steps`
//! sub-steps the rest of the frame is dropped so a stalled frame can never
//! snowball into more and more catch-up work.

use crate::consts::MS_PER_SECOND;

/// Outcome of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub substeps: u32,
    /// Frame units actually simulated
    pub simulated: f32,
    /// Frame units thrown away because of the sub-step cap
    pub dropped: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct StepController {
    target_frame_ms: f32,
    max_steps: u32,
    max_delta: f32,
    accumulated: f32,
    steps_this_frame: u32,
}

impl StepController {
    pub fn new(target_fps: f32, max_steps: u32, max_delta: f32) -> Self {
        Self {
            target_frame_ms: MS_PER_SECOND / target_fps,
            max_steps,
            max_delta,
            accumulated: 0.0,
            steps_this_frame: 0,
        }
    }

    pub fn target_frame_ms(&self) -> f32 {
        self.target_frame_ms
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Time still owed to the simulation, in frame units
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    /// Add a measured frame duration. Negative or NaN durations count as zero.
    pub fn begin_frame(&mut self, frame_ms: f32) {
        let units = frame_ms / self.target_frame_ms;
        if units > 0.0 {
            self.accumulated += units;
        }
        self.steps_this_frame = 0;
    }

    /// Size of the next sub-step, or `None` when the frame is paid off or
    /// the cap is reached
    pub fn next_step(&mut self) -> Option<f32> {
        if self.accumulated <= 0.0 || self.steps_this_frame >= self.max_steps {
            return None;
        }
        let dt = self.accumulated.min(self.max_delta);
        self.accumulated -= dt;
        self.steps_this_frame += 1;
        Some(dt)
    }

    /// Close the frame, discarding whatever the cap left over
    pub fn finish_frame(&mut self) -> f32 {
        let dropped = self.accumulated.max(0.0);
        if dropped > 0.0 {
            log::debug!(
                "Dropped {:.2} frame units after {} substeps",
                dropped,
                self.steps_this_frame
            );
        }
        self.accumulated = 0.0;
        dropped
    }

    /// Run a whole frame, calling `step` once per sub-step
    pub fn advance<F>(&mut self, frame_ms: f32, mut step: F) -> StepReport
    where
        F: FnMut(f32),
    {
        self.begin_frame(frame_ms);
        let mut report = StepReport::default();
        while let Some(dt) = self.next_step() {
            step(dt);
            report.substeps += 1;
            report.simulated += dt;
        }
        report.dropped = self.finish_frame();
        report
    }
}
