use crate::core::scene::Scene;
use crate::api::types::{EntityId, SoundEvent, GameEvent};
use crate::input::queue::InputQueue;
#[cfg(feature = "physics")]
use crate::core::physics::{
    PhysicsWorld, BodyDesc, BodyType, ColliderMaterial, CollisionPair,
};
#[cfg(feature = "physics")]
use crate::components::entity::Entity;
use glam::Vec2;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of sphere instances written per frame (default: 256).
    pub max_spheres: usize,
    /// Maximum number of sound events per frame (default: 32).
    pub max_sounds: usize,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    /// Upper bound on fixed steps per rendered frame.
    pub max_steps_per_frame: u32,
    /// Gravity vector for physics simulation. Default: zero (no gravity).
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub gravity: Vec2,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            max_spheres: 256,
            max_sounds: 32,
            max_events: 32,
            max_steps_per_frame: 10,
            gravity: Vec2::ZERO,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The game loop tick. Consume input, move kinematic bodies, check win conditions.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub sounds: Vec<SoundEvent>,
    pub events: Vec<GameEvent>,
    next_id: u32,
    physics_running: bool,
    #[cfg(feature = "physics")]
    pub physics: PhysicsWorld,
    #[cfg(feature = "physics")]
    collision_events: Vec<CollisionPair>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_gravity(Vec2::ZERO)
    }

    /// Create an EngineContext with a custom gravity vector.
    pub fn with_gravity(_gravity: Vec2) -> Self {
        Self {
            scene: Scene::new(),
            sounds: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            physics_running: true,
            #[cfg(feature = "physics")]
            physics: PhysicsWorld::new(_gravity),
            #[cfg(feature = "physics")]
            collision_events: Vec::new(),
        }
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a sound event to be forwarded to TypeScript.
    pub fn emit_sound(&mut self, event: SoundEvent) {
        self.sounds.push(event);
    }

    /// Emit a game event to be forwarded to TypeScript.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Clear per-frame transient data (sounds, events).
    /// Collision events live until the next physics step instead, so the
    /// first update of a frame still sees the last step of the previous one.
    pub fn clear_frame_data(&mut self) {
        self.sounds.clear();
        self.events.clear();
    }

    /// Freeze the simulation. Bodies keep their positions until resumed.
    pub fn pause_physics(&mut self) {
        self.physics_running = false;
    }

    pub fn resume_physics(&mut self) {
        self.physics_running = true;
    }

    pub fn is_physics_running(&self) -> bool {
        self.physics_running
    }

    /// Current world position of an entity, or `None` if it does not exist.
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.scene.get(id).map(|e| e.pos)
    }

    /// Remove every entity carrying `tag`, including its physics body.
    pub fn despawn_tagged(&mut self, tag: &str) -> usize {
        let ids: Vec<EntityId> = self
            .scene
            .iter()
            .filter(|e| e.tag == tag)
            .map(|e| e.id)
            .collect();
        for id in &ids {
            self.despawn(*id);
        }
        ids.len()
    }

    /// Despawn an entity, cleaning up its physics body if present.
    pub fn despawn(&mut self, id: EntityId) {
        if let Some(_entity) = self.scene.despawn(id) {
            #[cfg(feature = "physics")]
            if let Some(body) = &_entity.body {
                self.physics.remove_body(body);
            }
        }
    }

    // -- Physics convenience methods --

    /// Spawn an entity with a physics body. Returns the EntityId.
    /// The entity's position is set from the BodyDesc.
    #[cfg(feature = "physics")]
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let id = entity.id;
        let body = self.physics.create_body(id, &desc, material);
        let entity = entity.with_pos(desc.position).with_body(body);
        self.scene.spawn(entity);
        id
    }

    /// Set the linear velocity of an entity's physics body.
    #[cfg(feature = "physics")]
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_velocity(&body, vel);
        }
    }

    /// Get the linear velocity of an entity's physics body.
    #[cfg(feature = "physics")]
    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Take a body out of the simulation: it stops reacting to gravity and
    /// contacts and follows `move_kinematic` targets instead.
    #[cfg(feature = "physics")]
    pub fn pin(&mut self, id: EntityId) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_body_type(&body, BodyType::KinematicPositionBased);
        }
    }

    /// Return a pinned body to full dynamic simulation, at rest.
    #[cfg(feature = "physics")]
    pub fn unpin(&mut self, id: EntityId) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_body_type(&body, BodyType::Dynamic);
        }
    }

    /// Move a pinned body toward `pos`; it arrives during the next physics step.
    /// The entity position updates immediately so rendering tracks the pointer.
    #[cfg(feature = "physics")]
    pub fn move_kinematic(&mut self, id: EntityId, pos: Vec2) {
        if let Some(entity) = self.scene.get_mut(id) {
            entity.pos = pos;
            if let Some(body) = entity.body {
                self.physics.set_kinematic_target(&body, pos);
            }
        }
    }

    /// Place a body at `pos` with velocity `vel`, without interpolation.
    #[cfg(feature = "physics")]
    pub fn teleport(&mut self, id: EntityId, pos: Vec2, vel: Vec2) {
        if let Some(entity) = self.scene.get_mut(id) {
            entity.pos = pos;
            if let Some(body) = entity.body {
                self.physics.set_position(&body, pos);
                self.physics.set_velocity(&body, vel);
            }
        }
    }

    /// Get collision events from the most recent physics step.
    #[cfg(feature = "physics")]
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collision_events
    }

    /// Step the physics simulation and sync positions back to entities.
    /// Called automatically by the game runner after `Game::update()`.
    /// Does nothing while physics is paused.
    #[cfg(feature = "physics")]
    pub fn step_physics(&mut self) {
        self.collision_events.clear();
        if !self.physics_running {
            return;
        }
        self.physics.step_into(&mut self.collision_events);

        // Sync Rapier body positions back to entity positions
        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
#[cfg(feature = "physics")]
mod physics_tests {
    use super::*;
    use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial};

    fn falling_ball(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }).with_position(pos);
        ctx.spawn_with_body(Entity::new(id).with_tag("ball"), desc, ColliderMaterial::default())
    }

    #[test]
    fn spawn_with_body_creates_entity_and_physics() {
        let mut ctx = EngineContext::new();
        let id = falling_ball(&mut ctx, Vec2::new(100.0, 200.0));

        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
        assert!(ctx.scene.get(id).unwrap().body.is_some());
        assert_eq!(ctx.position(id), Some(Vec2::new(100.0, 200.0)));
    }

    #[test]
    fn despawn_cleans_up_physics() {
        let mut ctx = EngineContext::new();
        let id = falling_ball(&mut ctx, Vec2::ZERO);
        assert_eq!(ctx.physics.body_count(), 1);

        ctx.despawn(id);
        assert_eq!(ctx.scene.len(), 0);
        assert_eq!(ctx.physics.body_count(), 0);
        assert_eq!(ctx.position(id), None);
    }

    #[test]
    fn despawn_tagged_removes_only_matching() {
        let mut ctx = EngineContext::new();
        falling_ball(&mut ctx, Vec2::ZERO);
        falling_ball(&mut ctx, Vec2::new(50.0, 0.0));
        let other = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(other).with_tag("wall"),
            BodyDesc::fixed(ColliderDesc::Cuboid { half_width: 5.0, half_height: 5.0 }),
            ColliderMaterial::default(),
        );

        assert_eq!(ctx.despawn_tagged("ball"), 2);
        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
    }

    #[test]
    fn step_physics_syncs_positions() {
        let mut ctx = EngineContext::with_gravity(Vec2::new(0.0, 100.0));
        ctx.physics.set_dt(1.0 / 60.0);
        let id = falling_ball(&mut ctx, Vec2::new(100.0, 0.0));

        for _ in 0..10 {
            ctx.step_physics();
        }

        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.pos.y > 0.0, "Entity should have moved down: y={}", entity.pos.y);
    }

    #[test]
    fn paused_physics_freezes_bodies() {
        let mut ctx = EngineContext::with_gravity(Vec2::new(0.0, 100.0));
        ctx.physics.set_dt(1.0 / 60.0);
        let id = falling_ball(&mut ctx, Vec2::new(0.0, 0.0));

        ctx.pause_physics();
        for _ in 0..10 {
            ctx.step_physics();
        }
        assert_eq!(ctx.position(id), Some(Vec2::ZERO));
    }

    #[test]
    fn pinned_body_follows_kinematic_target() {
        let mut ctx = EngineContext::with_gravity(Vec2::new(0.0, 500.0));
        ctx.physics.set_dt(1.0 / 60.0);
        let id = falling_ball(&mut ctx, Vec2::new(0.0, 0.0));

        ctx.pin(id);
        ctx.move_kinematic(id, Vec2::new(30.0, -40.0));
        assert_eq!(ctx.position(id), Some(Vec2::new(30.0, -40.0)));
        for _ in 0..5 {
            ctx.step_physics();
        }
        let pos = ctx.position(id).unwrap();
        assert!((pos.x - 30.0).abs() < 0.01 && (pos.y + 40.0).abs() < 0.01, "pos={:?}", pos);

        ctx.unpin(id);
        for _ in 0..10 {
            ctx.step_physics();
        }
        assert!(ctx.position(id).unwrap().y > -40.0, "unpinned body should fall");
    }

    #[test]
    fn teleport_sets_position_and_velocity() {
        let mut ctx = EngineContext::new();
        let id = falling_ball(&mut ctx, Vec2::ZERO);
        ctx.teleport(id, Vec2::new(200.0, 300.0), Vec2::new(5.0, 0.0));

        assert_eq!(ctx.position(id), Some(Vec2::new(200.0, 300.0)));
        let vel = ctx.velocity(id);
        assert!((vel.x - 5.0).abs() < 0.001);
    }
}
