// ============================================================
// Layer 5 — Learning-rate Schedule
// ============================================================
// The schedule is keyed to the TOTAL number of optimisation
// steps (epochs × training sentences) and advances once per
// step, including steps that were skipped for lack of scored
// tokens.
//
//   lr
//   │    ╱‾‾‾‾╲
//   │   ╱      ╲
//   │  ╱        ╲
//   └──────────────── step
//      warmup   total
//
// With zero warmup this is a plain linear decay from the base
// rate to zero.

/// A learning-rate schedule driven one step at a time.
pub trait LrSchedule {
    /// Learning rate for the current step.
    fn get_lr(&self) -> f64;

    /// Advance by one step.
    fn step(&mut self);
}

#[derive(Debug, Clone)]
pub struct LinearDecayLr {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
    current:      usize,
}

impl LinearDecayLr {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self { base_lr, warmup_steps, total_steps, current: 0 }
    }

    fn factor(&self) -> f64 {
        let step = self.current;
        if step < self.warmup_steps {
            return step as f64 / self.warmup_steps as f64;
        }
        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps);
        if decay_steps == 0 {
            return 0.0;
        }
        let remaining = self.total_steps.saturating_sub(step);
        remaining as f64 / decay_steps as f64
    }
}

impl LrSchedule for LinearDecayLr {
    fn get_lr(&self) -> f64 {
        self.base_lr * self.factor()
    }

    fn step(&mut self) {
        self.current += 1;
    }
}
