use crate::models::{EngineSettings, Window};

/// Linear congruential generator with the historical parameters the
/// ordering contract is pinned to. Reproducibility matters more than
/// statistical quality here: the same window must shuffle the same way
/// on every query until the cache epoch advances.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: i64,
}

impl SeededRng {
    pub fn new(seed: i64) -> Self {
        Self {
            state: seed.rem_euclid(233_280),
        }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * 9_301 + 49_297) % 233_280;
        self.state as f64 / 233_280.0
    }
}

/// Seed derived from the window identity so repeated queries for the same
/// displayed window reproduce the same permutation, even across separate
/// cache misses.
pub fn window_seed(window: Window, settings: &EngineSettings) -> i64 {
    match window.month {
        Some(month) => i64::from(window.year) * 12 + i64::from(month),
        None => settings.year_scope_seed,
    }
}

/// In-place Fisher-Yates driven by the seeded generator.
pub fn fisher_yates<T>(items: &mut [T], rng: &mut SeededRng) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_f64() * (i as f64 + 1.0)) as usize;
        items.swap(i, j);
    }
}

pub fn shuffle_ids(mut ids: Vec<String>, seed: i64) -> Vec<String> {
    let mut rng = SeededRng::new(seed);
    fisher_yates(&mut ids, &mut rng);
    ids
}
