//! Derived facts: which sphere is on top, what may be grabbed, where a drop lands.
//! Nothing here mutates state.

use glam::Vec2;

use crate::bodies::SphereBodies;
use crate::level::{FLOOR_TOP, WORLD_WIDTH};
use crate::rack::{Sphere, SphereId, TubeId, TubeRack};
use crate::settings::PuzzleSettings;

/// Clearance between a rerouted floor sphere and the nearest tube wall.
const COLUMN_GAP: f32 = 1.0;

/// Why a release ended on the floor instead of in a tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorReason {
    NoTube,
    TubeFull,
    ColorMismatch,
}

/// Read-only view over the logical model and live body positions.
pub struct Board<'a, B: SphereBodies + ?Sized> {
    pub rack: &'a TubeRack,
    /// Indexed by `SphereId`.
    pub spheres: &'a [Sphere],
    pub bodies: &'a B,
    pub settings: &'a PuzzleSettings,
}

impl<'a, B: SphereBodies + ?Sized> Board<'a, B> {
    pub fn sphere(&self, id: SphereId) -> Option<&'a Sphere> {
        self.spheres.get(id.0 as usize)
    }

    fn position(&self, id: SphereId) -> Option<Vec2> {
        self.sphere(id).and_then(|s| self.bodies.position(s.body))
    }

    /// Physically highest member of `tube`, ignoring `excluding`.
    /// Equal heights resolve to the later-inserted sphere.
    pub fn top_of(&self, tube: TubeId, excluding: Option<SphereId>) -> Option<SphereId> {
        let tube = self.rack.tube(tube)?;
        let mut best: Option<(SphereId, f32)> = None;
        for &id in tube.spheres() {
            if Some(id) == excluding {
                continue;
            }
            let Some(pos) = self.position(id) else {
                continue;
            };
            if best.map_or(true, |(_, y)| pos.y <= y) {
                best = Some((id, pos.y));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Whether a grab on `sphere` would be accepted right now.
    pub fn is_draggable(&self, sphere: SphereId, excluding: Option<SphereId>) -> bool {
        if Some(sphere) == excluding {
            return false;
        }
        let Some(s) = self.sphere(sphere) else {
            return false;
        };
        if !s.claimed {
            return false;
        }
        match self.rack.find_tube(sphere) {
            Some(tube) => self.top_of(tube, excluding) == Some(sphere),
            None => self.floor_sphere_grabbable(s, excluding),
        }
    }

    /// A floor sphere is grabbable once it has settled, either down on the
    /// floor or with nothing resting on top of it.
    fn floor_sphere_grabbable(&self, s: &Sphere, excluding: Option<SphereId>) -> bool {
        let Some(pos) = self.bodies.position(s.body) else {
            return false;
        };
        if self.bodies.velocity(s.body).length() >= self.settings.settle_speed {
            return false;
        }
        if pos.y >= FLOOR_TOP - s.radius - self.settings.floor_band {
            return true;
        }
        !self.is_covered(s, pos, excluding)
    }

    fn is_covered(&self, s: &Sphere, pos: Vec2, excluding: Option<SphereId>) -> bool {
        self.spheres.iter().any(|other| {
            if other.id == s.id || Some(other.id) == excluding {
                return false;
            }
            let Some(p) = self.bodies.position(other.body) else {
                return false;
            };
            let reach = s.radius + other.radius;
            p.y < pos.y && (p.x - pos.x).abs() < reach && pos.distance(p) <= reach * 1.05
        })
    }

    /// Tube whose span contains `point.x`, from `drop_reach_above` over its mouth down to its floor.
    pub fn tube_under_point(&self, point: Vec2) -> Option<TubeId> {
        self.rack
            .tubes()
            .iter()
            .find(|t| {
                let g = &t.geometry;
                (point.x - g.center_x).abs() <= g.half_span()
                    && point.y >= g.top_y() - self.settings.drop_reach_above
                    && point.y <= g.bottom_y
            })
            .map(|t| t.id)
    }

    /// Drop rule: room left and a matching (or no) top, both ignoring `sphere`
    /// itself. The tube a sphere came from is judged like any other.
    pub fn accepts(&self, tube: TubeId, sphere: SphereId) -> Result<(), FloorReason> {
        let target = self.rack.tube(tube).ok_or(FloorReason::NoTube)?;
        let occupied = target.len() - usize::from(target.contains(sphere));
        if occupied >= target.capacity {
            return Err(FloorReason::TubeFull);
        }
        let color = self.sphere(sphere).map(|s| s.color);
        match self.top_of(tube, Some(sphere)).and_then(|top| self.sphere(top)) {
            Some(top) if Some(top.color) != color => Err(FloorReason::ColorMismatch),
            _ => Ok(()),
        }
    }

    /// Where a floored sphere restarts. Over the tube row it is moved sideways
    /// to the nearest open column, so it cannot fall into a tube it does not
    /// belong to. It always restarts above the tube mouths.
    pub fn floor_rest(&self, sphere: SphereId, held: Vec2) -> Vec2 {
        let radius = self.sphere(sphere).map_or(0.0, |s| s.radius);
        let mut spans: Vec<(f32, f32, f32)> = self
            .rack
            .tubes()
            .iter()
            .map(|t| {
                let g = &t.geometry;
                (g.center_x - g.half_span(), g.center_x + g.half_span(), g.top_y())
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        let blocked = |x: f32| spans.iter().any(|&(l, r, _)| x + radius > l && x - radius < r);
        if !blocked(held.x) {
            return Vec2::new(held.x, held.y.min(FLOOR_TOP - radius));
        }

        let row_top = spans.iter().map(|s| s.2).fold(f32::INFINITY, f32::min);
        let mut columns = Vec::new();
        if let (Some(first), Some(last)) = (spans.first(), spans.last()) {
            columns.push(first.0 - radius - COLUMN_GAP);
            columns.push(last.1 + radius + COLUMN_GAP);
        }
        for pair in spans.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.0 - prev.1 >= 2.0 * (radius + COLUMN_GAP) {
                let x = (prev.1 + next.0) / 2.0;
                if self.column_has_room(x, radius, prev.2.min(next.2), sphere) {
                    columns.push(x);
                }
            }
        }

        let y = held.y.min(row_top - radius);
        columns
            .into_iter()
            .filter(|&x| x - radius >= 0.0 && x + radius <= WORLD_WIDTH && !blocked(x))
            .min_by(|a, b| (a - held.x).abs().total_cmp(&(b - held.x).abs()))
            .map_or(Vec2::new(held.x, y), |x| Vec2::new(x, y))
    }

    /// A gap column is usable while one more sphere would still sit below the mouths.
    fn column_has_room(&self, x: f32, radius: f32, mouth: f32, skip: SphereId) -> bool {
        self.spheres
            .iter()
            .filter(|s| s.id != skip)
            .filter_map(|s| self.bodies.position(s.body).map(|p| (s.radius, p)))
            .filter(|(r, p)| (p.x - x).abs() < radius + r)
            .all(|(r, p)| p.y - r - 2.0 * radius >= mouth)
    }

    /// Nearest sphere whose center lies within `radius × grab_slop` of `point`.
    pub fn sphere_at(&self, point: Vec2) -> Option<SphereId> {
        self.spheres
            .iter()
            .filter_map(|s| {
                let pos = self.bodies.position(s.body)?;
                let dist = pos.distance(point);
                (dist <= s.radius * self.settings.grab_slop).then_some((s.id, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Per tube: would releasing `dragged` there place it?
    pub fn drop_targets(&self, dragged: Option<SphereId>) -> Vec<bool> {
        self.rack
            .tubes()
            .iter()
            .map(|t| dragged.is_some_and(|s| self.accepts(t.id, s).is_ok()))
            .collect()
    }
}
