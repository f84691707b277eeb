//! Flat tube data for the TypeScript renderer, which draws the glass and
//! drop-target glow itself.

use bytemuck::{Pod, Zeroable};

use crate::session::PuzzleSession;

/// 8 floats per tube.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TubeInstance {
    pub center_x: f32,
    pub top_y: f32,
    /// Outer width, walls included.
    pub width: f32,
    pub height: f32,
    /// Occupancy in [0, 1].
    pub fill: f32,
    pub capacity: f32,
    /// 1 while a held sphere would be placed here.
    pub valid_target: f32,
    /// 1 once the tube is full of one color.
    pub highlight: f32,
}

impl TubeInstance {
    pub const FLOATS: usize = 8;
}

pub fn build_tube_buffer(session: &PuzzleSession, out: &mut Vec<TubeInstance>) {
    out.clear();
    let spheres = session.spheres();
    let targets = session.drop_targets();
    for (i, tube) in session.tubes().iter().enumerate() {
        let g = &tube.geometry;
        let first_color = tube
            .spheres()
            .first()
            .and_then(|id| spheres.get(id.0 as usize))
            .map(|s| s.color);
        let sorted = tube.is_full()
            && tube
                .spheres()
                .iter()
                .all(|id| spheres.get(id.0 as usize).map(|s| s.color) == first_color);
        out.push(TubeInstance {
            center_x: g.center_x,
            top_y: g.top_y(),
            width: g.half_span() * 2.0,
            height: g.height + g.wall_thickness,
            fill: tube.len() as f32 / tube.capacity.max(1) as f32,
            capacity: tube.capacity as f32,
            valid_target: if targets.get(i).copied().unwrap_or(false) { 1.0 } else { 0.0 },
            highlight: if sorted { 1.0 } else { 0.0 },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::StaticBodies;
    use crate::level::Level;
    use crate::settings::PuzzleSettings;
    use orb_engine::EntityId;

    #[test]
    fn tube_instance_is_eight_floats() {
        assert_eq!(std::mem::size_of::<TubeInstance>(), TubeInstance::FLOATS * 4);
    }

    #[test]
    fn buffer_mirrors_the_rack() {
        let settings = PuzzleSettings::default();
        let level = Level::generate(&settings, 1, 42);
        let mut bodies = StaticBodies::new();
        let handles: Vec<EntityId> = (0..level.spawns.len() as u32).map(EntityId).collect();
        for (h, spawn) in handles.iter().zip(&level.spawns) {
            bodies.insert(*h, spawn.pos);
        }
        let filled = level.colors.len();
        let tube_count = level.tubes.len();
        let session = crate::session::PuzzleSession::new(settings, level, &handles, &bodies);

        let mut out = Vec::new();
        build_tube_buffer(&session, &mut out);
        assert_eq!(out.len(), tube_count);
        for tube in &out[..filled] {
            assert_eq!(tube.fill, 1.0);
            assert_eq!(tube.valid_target, 0.0);
        }
        for tube in &out[filled..] {
            assert_eq!(tube.fill, 0.0);
            assert_eq!(tube.highlight, 0.0);
        }
    }
}
