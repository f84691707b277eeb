//! The slice of the physics engine the puzzle logic needs.

use std::collections::HashMap;

use glam::Vec2;
use orb_engine::EntityId;
#[cfg(feature = "physics")]
use orb_engine::EngineContext;

/// Read and steer sphere bodies. Unknown ids read as absent / at rest and
/// writes to them are ignored.
pub trait SphereBodies {
    fn position(&self, body: EntityId) -> Option<Vec2>;
    fn velocity(&self, body: EntityId) -> Vec2;
    /// Switch to kinematic control: no gravity, no contact response.
    fn pin(&mut self, body: EntityId);
    fn move_pinned(&mut self, body: EntityId, pos: Vec2);
    /// Back to dynamic simulation, at rest.
    fn unpin(&mut self, body: EntityId);
    fn teleport(&mut self, body: EntityId, pos: Vec2, vel: Vec2);
}

#[cfg(feature = "physics")]
impl SphereBodies for EngineContext {
    fn position(&self, body: EntityId) -> Option<Vec2> {
        EngineContext::position(self, body)
    }

    fn velocity(&self, body: EntityId) -> Vec2 {
        EngineContext::velocity(self, body)
    }

    fn pin(&mut self, body: EntityId) {
        EngineContext::pin(self, body);
    }

    fn move_pinned(&mut self, body: EntityId, pos: Vec2) {
        self.move_kinematic(body, pos);
    }

    fn unpin(&mut self, body: EntityId) {
        EngineContext::unpin(self, body);
    }

    fn teleport(&mut self, body: EntityId, pos: Vec2, vel: Vec2) {
        EngineContext::teleport(self, body, pos, vel);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub pinned: bool,
}

/// Bodies that stay exactly where they are put. No gravity, no contacts.
/// Lets the rules run headless, in tests or tools.
#[derive(Debug, Clone, Default)]
pub struct StaticBodies {
    bodies: HashMap<EntityId, StaticBody>,
}

impl StaticBodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: EntityId, pos: Vec2) {
        self.bodies.insert(body, StaticBody { pos, vel: Vec2::ZERO, pinned: false });
    }

    pub fn remove(&mut self, body: EntityId) -> Option<StaticBody> {
        self.bodies.remove(&body)
    }

    pub fn set_velocity(&mut self, body: EntityId, vel: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.vel = vel;
        }
    }

    pub fn get(&self, body: EntityId) -> Option<&StaticBody> {
        self.bodies.get(&body)
    }

    pub fn is_pinned(&self, body: EntityId) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.pinned)
    }
}

impl SphereBodies for StaticBodies {
    fn position(&self, body: EntityId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.pos)
    }

    fn velocity(&self, body: EntityId) -> Vec2 {
        self.bodies.get(&body).map(|b| b.vel).unwrap_or(Vec2::ZERO)
    }

    fn pin(&mut self, body: EntityId) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pinned = true;
            b.vel = Vec2::ZERO;
        }
    }

    fn move_pinned(&mut self, body: EntityId, pos: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if b.pinned {
                b.pos = pos;
            }
        }
    }

    fn unpin(&mut self, body: EntityId) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pinned = false;
            b.vel = Vec2::ZERO;
        }
    }

    fn teleport(&mut self, body: EntityId, pos: Vec2, vel: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pos = pos;
            b.vel = vel;
        }
    }
}
