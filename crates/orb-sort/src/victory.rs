//! Terminal-state detection.

use crate::rack::{Sphere, TubeRack};

/// Every tube is empty or full of one color, and no sphere is left outside the tubes.
pub fn is_solved(rack: &TubeRack, spheres: &[Sphere]) -> bool {
    let color_of = |id: crate::rack::SphereId| spheres.get(id.0 as usize).map(|s| s.color);
    let tubes_sorted = rack.tubes().iter().all(|tube| {
        if tube.is_empty() {
            return true;
        }
        if !tube.is_full() {
            return false;
        }
        let first = color_of(tube.spheres()[0]);
        first.is_some() && tube.spheres().iter().all(|s| color_of(*s) == first)
    });
    tubes_sorted && rack.contained_count() == spheres.len()
}

/// Latches once the puzzle is solved; only a new level clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Victory {
    solved_at: Option<f32>,
}

impl Victory {
    /// Returns true on the evaluation that flips the flag.
    pub fn evaluate(&mut self, solved: bool, now: f32) -> bool {
        if self.solved_at.is_some() || !solved {
            return false;
        }
        self.solved_at = Some(now);
        true
    }

    pub fn is_solved(&self) -> bool {
        self.solved_at.is_some()
    }

    pub fn time_since(&self, now: f32) -> Option<f32> {
        self.solved_at.map(|t| (now - t).max(0.0))
    }

    pub fn reset(&mut self) {
        self.solved_at = None;
    }
}
