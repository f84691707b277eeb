//! Orb Sort: sort colored spheres into tubes, one color per tube.
//!
//! The rules (`session` and the modules under it) run against the
//! [`bodies::SphereBodies`] trait, so they work the same on live Rapier
//! bodies and on the headless [`bodies::StaticBodies`] store.

pub mod bodies;
pub mod level;
pub mod moves;
pub mod palette;
pub mod rack;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod tube_render;
pub mod undo;
pub mod victory;

#[cfg(feature = "physics")]
pub mod game;

#[cfg(feature = "physics")]
mod exports {
    use orb_engine::InputEvent;
    use wasm_bindgen::prelude::*;

    use crate::game::OrbSort;

    orb_web::export_game!(OrbSort, "orb-sort");

    /// Apply settings JSON; takes effect from the next level.
    #[wasm_bindgen]
    pub fn game_load_settings(json: &str) -> bool {
        with_runner(|r| r.game_mut().load_settings(json)).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn get_tubes_ptr() -> *const f32 {
        with_runner(|r| r.game().tubes_ptr()).unwrap_or(std::ptr::null())
    }

    #[wasm_bindgen]
    pub fn get_tube_count() -> u32 {
        with_runner(|r| r.game().tube_count()).unwrap_or(0)
    }

    #[wasm_bindgen]
    pub fn get_dragged_sphere() -> i32 {
        with_runner(|r| r.game().dragged_sphere()).unwrap_or(-1)
    }

    #[wasm_bindgen]
    pub fn get_victory() -> bool {
        with_runner(|r| r.game().is_solved()).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn get_time_since_victory() -> f32 {
        with_runner(|r| r.game().time_since_victory()).unwrap_or(-1.0)
    }

    #[wasm_bindgen]
    pub fn get_level_number() -> u32 {
        with_runner(|r| r.game().level_number()).unwrap_or(0)
    }
}
