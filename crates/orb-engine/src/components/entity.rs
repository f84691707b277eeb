use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::mesh::SphereMesh;
#[cfg(feature = "physics")]
use crate::core::physics::PhysicsBody;

/// Fat Entity: a single struct with optional components.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// String tag for finding entities by role ("sphere", "wall", ...).
    pub tag: String,
    /// Inactive entities are skipped by the render pass.
    pub active: bool,
    /// Position in world space (Y down).
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Sphere visual. Entities without one are invisible colliders.
    pub mesh: Option<SphereMesh>,
    #[cfg(feature = "physics")]
    pub body: Option<PhysicsBody>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            rotation: 0.0,
            mesh: None,
            #[cfg(feature = "physics")]
            body: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_mesh(mut self, mesh: SphereMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[cfg(feature = "physics")]
    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }
}
