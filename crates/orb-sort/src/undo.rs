//! Bounded move history.

use std::collections::VecDeque;

use glam::Vec2;

use crate::rack::{RackError, Sphere, SphereId, TubeId, TubeRack};

/// Everything needed to put a sphere back: where it belonged and how it was moving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecord {
    pub sphere: SphereId,
    /// `None` when the sphere was picked up from the floor.
    pub origin: Option<TubeId>,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone)]
pub struct UndoLog {
    records: VecDeque<MoveRecord>,
    limit: usize,
}

impl UndoLog {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Push a record. Returns the oldest record if it had to be evicted.
    pub fn record(&mut self, record: MoveRecord) -> Option<MoveRecord> {
        if self.limit == 0 {
            return Some(record);
        }
        self.records.push_back(record);
        if self.records.len() > self.limit {
            self.records.pop_front()
        } else {
            None
        }
    }

    pub fn pop(&mut self) -> Option<MoveRecord> {
        self.records.pop_back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Move the record's sphere back into its origin tube, or onto the floor when
/// it came from there. On error the sphere is left on the floor.
pub fn restore_membership(
    record: &MoveRecord,
    rack: &mut TubeRack,
    spheres: &mut [Sphere],
) -> Result<(), RackError> {
    if let Some(current) = rack.find_tube(record.sphere) {
        rack.remove_sphere(current, record.sphere);
    }
    if let Some(s) = spheres.get_mut(record.sphere.0 as usize) {
        s.claimed = true;
    }
    match record.origin {
        Some(origin) => rack.add_sphere(origin, record.sphere),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::OrbColor;
    use crate::rack::TubeGeometry;
    use orb_engine::EntityId;

    fn record(n: u32) -> MoveRecord {
        MoveRecord {
            sphere: SphereId(n),
            origin: Some(TubeId(0)),
            position: Vec2::new(n as f32, 0.0),
            velocity: Vec2::ZERO,
        }
    }

    #[test]
    fn oldest_record_is_evicted() {
        let mut log = UndoLog::new(5);
        for n in 0..5 {
            assert_eq!(log.record(record(n)), None);
        }
        assert_eq!(log.record(record(5)), Some(record(0)));
        assert_eq!(log.len(), 5);

        let popped: Vec<u32> = std::iter::from_fn(|| log.pop()).map(|r| r.sphere.0).collect();
        assert_eq!(popped, vec![5, 4, 3, 2, 1]);
        assert!(log.pop().is_none());
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut log = UndoLog::new(0);
        assert_eq!(log.record(record(1)), Some(record(1)));
        assert!(log.is_empty());
    }

    #[test]
    fn restore_moves_sphere_home() {
        let geometry = TubeGeometry {
            center_x: 0.0,
            bottom_y: 100.0,
            inner_width: 40.0,
            height: 100.0,
            wall_thickness: 5.0,
        };
        let mut rack = TubeRack::new([geometry, geometry], 2);
        let mut spheres = vec![Sphere {
            id: SphereId(0),
            body: EntityId(1),
            color: OrbColor(0),
            radius: 10.0,
            claimed: true,
        }];
        rack.add_sphere(TubeId(1), SphereId(0)).unwrap();

        restore_membership(&record(0), &mut rack, &mut spheres).unwrap();
        assert_eq!(rack.find_tube(SphereId(0)), Some(TubeId(0)));

        let floor = MoveRecord { origin: None, ..record(0) };
        restore_membership(&floor, &mut rack, &mut spheres).unwrap();
        assert_eq!(rack.find_tube(SphereId(0)), None);
    }
}
