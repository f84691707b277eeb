//! Level generation: palette subset, tube layout and a shuffled starting stack.

use glam::Vec2;
use orb_engine::Rng;

use crate::palette::{OrbColor, PALETTE};
use crate::rack::TubeGeometry;
use crate::settings::PuzzleSettings;

pub const WORLD_WIDTH: f32 = 1000.0;
pub const WORLD_HEIGHT: f32 = 600.0;
/// Y of the floor's upper surface.
pub const FLOOR_TOP: f32 = 560.0;
/// Horizontal margin kept free at each side of the tube row.
const SIDE_MARGIN: f32 = 40.0;
/// Vertical gap between spawned spheres so they start out of contact.
const SPAWN_GAP: f32 = 1.0;
const MAX_RESHUFFLES: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSpawn {
    pub color: OrbColor,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub number: u32,
    pub seed: u64,
    pub capacity: usize,
    pub colors: Vec<OrbColor>,
    pub tubes: Vec<TubeGeometry>,
    /// Starting spheres, tube by tube, bottom to top.
    pub spawns: Vec<SphereSpawn>,
}

impl Level {
    /// Build level `number` from `seed`. The same inputs always give the same level.
    /// Out-of-range settings are clamped first.
    pub fn generate(settings: &PuzzleSettings, number: u32, seed: u64) -> Self {
        let settings = &settings.clone().validated();
        let mut rng = Rng::new(seed);
        let capacity = settings.capacity;

        let color_count = rng.range(settings.min_colors as u32, settings.max_colors as u32) as usize;
        let mut palette: Vec<u8> = (0..PALETTE.len() as u8).collect();
        rng.shuffle(&mut palette);
        let colors: Vec<OrbColor> = palette
            .into_iter()
            .take(color_count.min(PALETTE.len()))
            .map(OrbColor)
            .collect();

        let tubes = layout_tubes(settings, colors.len() + settings.slack_tubes);

        let mut pool: Vec<OrbColor> = colors
            .iter()
            .flat_map(|c| std::iter::repeat(*c).take(capacity))
            .collect();
        rng.shuffle(&mut pool);
        let mut attempts = 0;
        while is_presorted(&pool, capacity) && attempts < MAX_RESHUFFLES {
            rng.shuffle(&mut pool);
            attempts += 1;
        }
        if is_presorted(&pool, capacity) && pool.len() > capacity {
            pool.swap(capacity - 1, capacity);
        }

        let r = settings.sphere_radius;
        let spawns = pool
            .chunks(capacity)
            .zip(tubes.iter())
            .flat_map(|(chunk, tube)| {
                chunk.iter().enumerate().map(move |(slot, color)| SphereSpawn {
                    color: *color,
                    pos: Vec2::new(
                        tube.center_x,
                        tube.bottom_y - r - SPAWN_GAP - slot as f32 * (2.0 * r + SPAWN_GAP),
                    ),
                })
            })
            .collect();

        Self {
            number,
            seed,
            capacity,
            colors,
            tubes,
            spawns,
        }
    }

    pub fn sphere_count(&self) -> usize {
        self.spawns.len()
    }
}

/// Tubes centered in the world, standing on the floor. Pitch shrinks when the row would not fit.
fn layout_tubes(settings: &PuzzleSettings, count: usize) -> Vec<TubeGeometry> {
    let r = settings.sphere_radius;
    let inner_width = 2.0 * (r + settings.tube_clearance);
    let height = settings.capacity as f32 * 2.0 * r
        + settings.capacity as f32 * SPAWN_GAP
        + settings.tube_headroom;
    let wall = settings.wall_thickness;
    let outer = inner_width + 2.0 * wall;

    let usable = WORLD_WIDTH - 2.0 * SIDE_MARGIN;
    let fit = if count > 0 { usable / count as f32 } else { usable };
    let pitch = settings.tube_pitch.min(fit).max(outer);
    let row_width = pitch * count.saturating_sub(1) as f32;
    let first_x = WORLD_WIDTH / 2.0 - row_width / 2.0;

    (0..count)
        .map(|i| TubeGeometry {
            center_x: first_x + i as f32 * pitch,
            bottom_y: FLOOR_TOP - wall,
            inner_width,
            height,
            wall_thickness: wall,
        })
        .collect()
}

/// Every chunk of `capacity` holds a single color.
fn is_presorted(pool: &[OrbColor], capacity: usize) -> bool {
    pool.chunks(capacity)
        .all(|chunk| chunk.iter().all(|c| *c == chunk[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn sphere_count_is_colors_times_capacity() {
        let settings = PuzzleSettings::default();
        for seed in 1..50 {
            let level = Level::generate(&settings, 1, seed);
            assert!((settings.min_colors..=settings.max_colors).contains(&level.colors.len()));
            assert_eq!(level.sphere_count(), level.colors.len() * settings.capacity);
            assert_eq!(level.tubes.len(), level.colors.len() + settings.slack_tubes);

            let mut per_color: HashMap<OrbColor, usize> = HashMap::new();
            for spawn in &level.spawns {
                *per_color.entry(spawn.color).or_default() += 1;
            }
            assert!(per_color.values().all(|n| *n == settings.capacity), "seed {}", seed);
        }
    }

    #[test]
    fn generated_levels_are_never_presorted() {
        let settings = PuzzleSettings { capacity: 2, min_colors: 2, max_colors: 2, ..Default::default() };
        for seed in 1..200 {
            let level = Level::generate(&settings, 1, seed);
            let colors: Vec<OrbColor> = level.spawns.iter().map(|s| s.color).collect();
            assert!(!is_presorted(&colors, settings.capacity), "seed {} came out solved", seed);
        }
    }

    #[test]
    fn same_seed_same_level() {
        let settings = PuzzleSettings::default();
        assert_eq!(Level::generate(&settings, 3, 77), Level::generate(&settings, 3, 77));
    }

    #[test]
    fn tubes_fit_the_world_without_overlap() {
        let settings = PuzzleSettings { min_colors: 8, max_colors: 8, slack_tubes: 4, ..Default::default() };
        let level = Level::generate(&settings, 1, 5);
        assert_eq!(level.tubes.len(), 12);
        for pair in level.tubes.windows(2) {
            let gap = pair[1].center_x - pair[0].center_x;
            assert!(gap >= pair[0].half_span() * 2.0, "tubes overlap: gap {}", gap);
        }
        let first = &level.tubes[0];
        let last = &level.tubes[level.tubes.len() - 1];
        assert!(first.center_x - first.half_span() >= 0.0);
        assert!(last.center_x + last.half_span() <= WORLD_WIDTH);
    }

    #[test]
    fn degenerate_settings_are_clamped() {
        let settings = PuzzleSettings { capacity: 0, min_colors: 0, max_colors: 0, ..Default::default() };
        let level = Level::generate(&settings, 1, 9);
        assert_eq!(level.capacity, 2);
        assert_eq!(level.colors.len(), 2);
        assert_eq!(level.sphere_count(), 4);
    }

    #[test]
    fn spawns_start_inside_their_tubes() {
        let settings = PuzzleSettings::default();
        let level = Level::generate(&settings, 1, 11);
        for (i, spawn) in level.spawns.iter().enumerate() {
            let tube = &level.tubes[i / settings.capacity];
            assert!(tube.inner_contains(spawn.pos), "spawn {} at {:?} outside {:?}", i, spawn.pos, tube);
        }
        // Slack tubes start empty.
        let filled = level.colors.len();
        for tube in &level.tubes[filled..] {
            assert!(level.spawns.iter().all(|s| !tube.inner_contains(s.pos)));
        }
    }
}
