use super::Fortune;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Replays a scripted list of outcomes, then repeats `fallback`.
pub struct FixedFortune {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl FixedFortune {
    pub fn always(win: bool) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: win,
        }
    }

    pub fn sequence(outcomes: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback,
        }
    }
}

impl Fortune for FixedFortune {
    fn wins(&self) -> bool {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
