//! Orb Sort: drag spheres between glass tubes until every tube holds one color.
//! Rapier owns the motion; `PuzzleSession` owns the rules.

use glam::Vec2;
use orb_engine::api::game::GameConfig;
use orb_engine::components::entity::Entity;
use orb_engine::components::mesh::SphereMesh;
use orb_engine::input::queue::{InputEvent, InputQueue};
use orb_engine::{BodyDesc, ColliderDesc, ColliderMaterial, EntityId, Rng};
use orb_engine::{EngineContext, Game, GameEvent, SoundEvent};

use crate::level::{Level, FLOOR_TOP, WORLD_HEIGHT, WORLD_WIDTH};
use crate::rack::TubeGeometry;
use crate::session::{InputResponse, PuzzleEvent, PuzzleInput, PuzzleSession};
use crate::settings::PuzzleSettings;
use crate::tube_render::{build_tube_buffer, TubeInstance};

const GRAVITY: f32 = 900.0;
const FLOOR_THICKNESS: f32 = 40.0;
const SIDE_WALL: f32 = 20.0;

// Sphere physics
const SPHERE_RESTITUTION: f32 = 0.2;
const SPHERE_FRICTION: f32 = 0.4;
const SPHERE_DENSITY: f32 = 1.0;
const LINEAR_DAMPING: f32 = 0.6;
const ANGULAR_DAMPING: f32 = 1.5;
const GLASS_RESTITUTION: f32 = 0.1;
const GLASS_FRICTION: f32 = 0.3;

// Highlight glow
const DRAGGED_EMISSIVE: f32 = 0.8;
const DRAGGABLE_EMISSIVE: f32 = 0.25;
const SPHERE_SHININESS: f32 = 48.0;

const MAX_CLACKS_PER_UPDATE: usize = 4;

const TAG_SPHERE: &str = "sphere";
const TAG_TUBE: &str = "tube";
const TAG_WALL: &str = "wall";

/// Custom event kinds from the UI.
mod events {
    /// `a > 0` reseeds level generation with `a`.
    pub const NEW_LEVEL: u32 = 1;
    pub const UNDO: u32 = 2;
}

mod keys {
    pub const N: u32 = 78;
    pub const R: u32 = 82;
    pub const U: u32 = 85;
    pub const Z: u32 = 90;
}

/// Sound ids the TypeScript side synthesizes.
pub mod sounds {
    pub const CLACK: u32 = 1;
    pub const PICK: u32 = 2;
    pub const PLACE: u32 = 3;
    pub const FLOOR: u32 = 4;
    pub const UNDO: u32 = 5;
    pub const VICTORY: u32 = 6;
}

/// Game event kinds sent to the UI.
pub mod game_events {
    /// a = moves made.
    pub const VICTORY: f32 = 1.0;
    /// a = level number, b = colors, c = tubes.
    pub const LEVEL: f32 = 2.0;
    /// a = moves made, b = undo depth, c = spheres on the floor.
    pub const MOVE: f32 = 3.0;
    /// a = relative speed, b = penetration depth.
    pub const CLACK: f32 = 4.0;
}

pub struct OrbSort {
    settings: PuzzleSettings,
    rng: Rng,
    level_number: u32,
    session: Option<PuzzleSession>,
    tube_buffer: Vec<TubeInstance>,
    dt: f32,
}

impl OrbSort {
    pub fn new() -> Self {
        Self::with_settings(PuzzleSettings::default())
    }

    pub fn with_settings(settings: PuzzleSettings) -> Self {
        let settings = settings.validated();
        Self {
            rng: Rng::new(settings.seed),
            settings,
            level_number: 0,
            session: None,
            tube_buffer: Vec::new(),
            dt: GameConfig::default().fixed_dt,
        }
    }

    /// Replace the settings from a JSON blob. They apply from the next level.
    /// Invalid JSON keeps the current settings.
    pub fn load_settings(&mut self, json: &str) -> bool {
        match PuzzleSettings::from_json(json) {
            Ok(settings) => {
                if settings.seed != self.settings.seed {
                    self.rng = Rng::new(settings.seed);
                }
                self.settings = settings;
                true
            }
            Err(err) => {
                log::warn!("ignoring settings: {}", err);
                false
            }
        }
    }

    pub fn settings(&self) -> &PuzzleSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.session.as_ref()
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn tubes_ptr(&self) -> *const f32 {
        self.tube_buffer.as_ptr() as *const f32
    }

    pub fn tube_count(&self) -> u32 {
        self.tube_buffer.len() as u32
    }

    /// Index of the held sphere, or -1.
    pub fn dragged_sphere(&self) -> i32 {
        self.session
            .as_ref()
            .and_then(|s| s.dragged())
            .map(|id| id.0 as i32)
            .unwrap_or(-1)
    }

    pub fn is_solved(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_solved())
    }

    /// Seconds since the level was solved, or -1.
    pub fn time_since_victory(&self) -> f32 {
        self.session
            .as_ref()
            .and_then(|s| s.time_since_victory())
            .unwrap_or(-1.0)
    }

    fn spawn_world(&self, ctx: &mut EngineContext) {
        let glass = ColliderMaterial {
            restitution: GLASS_RESTITUTION,
            friction: GLASS_FRICTION,
            density: 1.0,
        };
        let floor = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: WORLD_WIDTH / 2.0 + SIDE_WALL,
            half_height: FLOOR_THICKNESS / 2.0,
        })
        .with_position(Vec2::new(WORLD_WIDTH / 2.0, FLOOR_TOP + FLOOR_THICKNESS / 2.0));
        let id = ctx.next_id();
        ctx.spawn_with_body(Entity::new(id).with_tag(TAG_WALL), floor, glass);

        for x in [-SIDE_WALL / 2.0, WORLD_WIDTH + SIDE_WALL / 2.0] {
            let wall = BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: SIDE_WALL / 2.0,
                half_height: WORLD_HEIGHT,
            })
            .with_position(Vec2::new(x, 0.0));
            let id = ctx.next_id();
            ctx.spawn_with_body(Entity::new(id).with_tag(TAG_WALL), wall, glass);
        }
    }

    /// Two walls and a base per tube. The base fills the gap between the
    /// inner floor and the world floor.
    fn spawn_tube(ctx: &mut EngineContext, g: &TubeGeometry, material: ColliderMaterial) {
        let wall_half_h = (FLOOR_TOP - g.top_y()) / 2.0;
        let wall_y = g.top_y() + wall_half_h;
        let wall_offset = g.inner_width / 2.0 + g.wall_thickness / 2.0;

        for dx in [-wall_offset, wall_offset] {
            let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: g.wall_thickness / 2.0,
                half_height: wall_half_h,
            })
            .with_position(Vec2::new(g.center_x + dx, wall_y));
            let id = ctx.next_id();
            ctx.spawn_with_body(Entity::new(id).with_tag(TAG_TUBE), desc, material);
        }

        let base = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: g.half_span(),
            half_height: (FLOOR_TOP - g.bottom_y) / 2.0,
        })
        .with_position(Vec2::new(g.center_x, (g.bottom_y + FLOOR_TOP) / 2.0));
        let id = ctx.next_id();
        ctx.spawn_with_body(Entity::new(id).with_tag(TAG_TUBE), base, material);
    }

    /// Tear down the current level (if any) and build the next one.
    fn start_level(&mut self, ctx: &mut EngineContext) {
        let removed = ctx.despawn_tagged(TAG_SPHERE) + ctx.despawn_tagged(TAG_TUBE);
        if removed > 0 {
            log::debug!("cleared {} bodies from level {}", removed, self.level_number);
        }

        self.level_number += 1;
        let seed = self.rng.next_u64();
        let level = Level::generate(&self.settings, self.level_number, seed);

        let glass = ColliderMaterial {
            restitution: GLASS_RESTITUTION,
            friction: GLASS_FRICTION,
            density: 1.0,
        };
        for g in &level.tubes {
            Self::spawn_tube(ctx, g, glass);
        }

        let r = self.settings.sphere_radius;
        let material = ColliderMaterial {
            restitution: SPHERE_RESTITUTION,
            friction: SPHERE_FRICTION,
            density: SPHERE_DENSITY,
        };
        let handles: Vec<EntityId> = level
            .spawns
            .iter()
            .map(|spawn| {
                let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: r })
                    .with_position(spawn.pos)
                    .with_ccd(true)
                    .with_linear_damping(LINEAR_DAMPING)
                    .with_angular_damping(ANGULAR_DAMPING);
                let mesh = SphereMesh::new(r, spawn.color.rgb()).with_shininess(SPHERE_SHININESS);
                let id = ctx.next_id();
                ctx.spawn_with_body(
                    Entity::new(id).with_tag(TAG_SPHERE).with_mesh(mesh),
                    desc,
                    material,
                )
            })
            .collect();

        log::info!(
            "level {}: {} colors, {} tubes, seed {:#x}",
            level.number,
            level.colors.len(),
            level.tubes.len(),
            seed
        );
        ctx.emit_event(GameEvent::new(
            game_events::LEVEL,
            level.number as f32,
            level.colors.len() as f32,
            level.tubes.len() as f32,
        ));

        self.session = Some(PuzzleSession::new(self.settings.clone(), level, &handles, &*ctx));
        ctx.resume_physics();
    }

    fn translate(event: &InputEvent) -> Option<PuzzleInput> {
        match *event {
            InputEvent::PointerDown { x, y } => Some(PuzzleInput::Grab(Vec2::new(x, y))),
            InputEvent::PointerMove { x, y } => Some(PuzzleInput::DragTo(Vec2::new(x, y))),
            InputEvent::PointerUp { x, y } => Some(PuzzleInput::Release(Vec2::new(x, y))),
            InputEvent::KeyDown { key_code } => match key_code {
                keys::Z | keys::U => Some(PuzzleInput::Undo),
                keys::N | keys::R => Some(PuzzleInput::NewLevel),
                _ => None,
            },
            InputEvent::Custom { kind, .. } => match kind {
                events::NEW_LEVEL => Some(PuzzleInput::NewLevel),
                events::UNDO => Some(PuzzleInput::Undo),
                _ => None,
            },
        }
    }

    fn handle_events(&mut self, ctx: &mut EngineContext) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let drained = session.drain_events();
        for event in drained {
            match event {
                PuzzleEvent::Grabbed(_) => ctx.emit_sound(SoundEvent(sounds::PICK)),
                PuzzleEvent::Placed { .. } => ctx.emit_sound(SoundEvent(sounds::PLACE)),
                PuzzleEvent::Floored { .. } => ctx.emit_sound(SoundEvent(sounds::FLOOR)),
                PuzzleEvent::Undone(_) => ctx.emit_sound(SoundEvent(sounds::UNDO)),
                PuzzleEvent::Solved { moves } => {
                    ctx.emit_sound(SoundEvent(sounds::VICTORY));
                    ctx.emit_event(GameEvent::new(game_events::VICTORY, moves as f32, 0.0, 0.0));
                    ctx.pause_physics();
                }
            }
            if matches!(
                event,
                PuzzleEvent::Placed { .. } | PuzzleEvent::Floored { .. } | PuzzleEvent::Undone(_)
            ) {
                ctx.emit_event(GameEvent::new(
                    game_events::MOVE,
                    session.moves_made() as f32,
                    session.undo_depth() as f32,
                    session.floor_count() as f32,
                ));
            }
        }
    }

    /// A clack for each new contact involving a sphere that hit hard enough.
    fn emit_clacks(&self, ctx: &mut EngineContext) {
        let min_speed = self.settings.clack_min_speed;
        let view: &EngineContext = ctx;
        let is_sphere = |id: EntityId| view.scene.get(id).is_some_and(|e| e.tag == TAG_SPHERE);

        let clacks: Vec<(f32, f32)> = view
            .collisions()
            .iter()
            .filter(|pair| pair.started)
            .filter(|pair| is_sphere(pair.entity_a) || is_sphere(pair.entity_b))
            .map(|pair| {
                let speed = (view.velocity(pair.entity_a) - view.velocity(pair.entity_b)).length();
                (speed, pair.depth)
            })
            .filter(|(speed, _)| *speed >= min_speed)
            .take(MAX_CLACKS_PER_UPDATE)
            .collect();

        for (speed, depth) in clacks {
            ctx.emit_sound(SoundEvent(sounds::CLACK));
            ctx.emit_event(GameEvent::new(game_events::CLACK, speed, depth, 0.0));
        }
    }

    fn refresh_visuals(&mut self, ctx: &mut EngineContext) {
        let Some(session) = self.session.as_ref() else {
            self.tube_buffer.clear();
            return;
        };
        let dragged = session.dragged();
        for sphere in session.spheres() {
            let glow = if Some(sphere.id) == dragged {
                DRAGGED_EMISSIVE
            } else if session.is_draggable(sphere.id) {
                DRAGGABLE_EMISSIVE
            } else {
                0.0
            };
            if let Some(mesh) = ctx.scene.get_mut(sphere.body).and_then(|e| e.mesh.as_mut()) {
                mesh.emissive = glow;
            }
        }
        build_tube_buffer(session, &mut self.tube_buffer);
    }
}

impl Default for OrbSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for OrbSort {
    fn config(&self) -> GameConfig {
        GameConfig {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            max_spheres: 128,
            gravity: Vec2::new(0.0, GRAVITY),
            ..GameConfig::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.dt = self.config().fixed_dt;
        self.spawn_world(ctx);
        self.start_level(ctx);
        self.refresh_visuals(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        let mut new_level = false;
        for event in input.iter() {
            let reseed = match *event {
                InputEvent::Custom { kind: events::NEW_LEVEL, a, .. } if a > 0.0 => Some(a as u64),
                _ => None,
            };
            let Some(puzzle_input) = Self::translate(event) else {
                continue;
            };
            let Some(session) = self.session.as_mut() else {
                continue;
            };
            let response = session.handle_input(puzzle_input, &mut *ctx);
            if response == InputResponse::NewLevelRequested {
                if let Some(seed) = reseed {
                    self.rng = Rng::new(seed);
                }
                new_level = true;
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.tick(self.dt, &*ctx);
            if let (Some(after), Some(since)) =
                (self.settings.auto_advance_after, session.time_since_victory())
            {
                if since >= after && !session.is_dragging() {
                    new_level = true;
                }
            }
        }
        self.handle_events(ctx);

        if new_level {
            self.start_level(ctx);
        }

        self.emit_clacks(ctx);
        self.refresh_visuals(ctx);
    }
}
