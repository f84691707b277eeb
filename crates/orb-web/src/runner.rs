use orb_engine::bridge::protocol::{FrameCounts, HEADER_FLOATS};
use orb_engine::{
    build_sphere_buffer, EngineContext, FixedTimestep, Game, GameConfig, InputEvent,
    InputQueue, ProtocolLayout, SphereBuffer,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner through
/// `export_game!`, because wasm-bindgen cannot export generic structs.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    sphere_buffer: SphereBuffer,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    frame: u64,
    header: [f32; HEADER_FLOATS],
    /// Sound ids of the last frame, as floats for the shared buffer.
    sound_buffer: Vec<f32>,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        Self {
            ctx: EngineContext::with_gravity(config.gravity),
            input: InputQueue::new(),
            sphere_buffer: SphereBuffer::with_capacity(config.max_spheres),
            timestep: FixedTimestep::with_max_steps(config.fixed_dt, config.max_steps_per_frame),
            layout: ProtocolLayout::from_config(&config),
            sound_buffer: Vec::with_capacity(config.max_sounds),
            header: [0.0; HEADER_FLOATS],
            frame: 0,
            initialized: false,
            config,
            game,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        #[cfg(feature = "physics")]
        self.ctx.physics.set_dt(self.config.fixed_dt);
        self.game.init(&mut self.ctx);
        self.initialized = true;
        self.publish();
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: fixed steps of update + physics, then rebuild the
    /// buffers TypeScript reads.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            // Input belongs to the first step only.
            self.input.clear();
            #[cfg(feature = "physics")]
            self.ctx.step_physics();
        }

        self.frame += 1;
        self.publish();
    }

    fn publish(&mut self) {
        build_sphere_buffer(self.ctx.scene.iter(), &mut self.sphere_buffer);

        self.sound_buffer.clear();
        self.sound_buffer.extend(
            self.ctx.sounds.iter().take(self.config.max_sounds).map(|s| s.0 as f32),
        );
        if self.ctx.sounds.len() > self.config.max_sounds {
            log::warn!("dropped {} sound events", self.ctx.sounds.len() - self.config.max_sounds);
        }

        let counts = FrameCounts {
            frame: self.frame,
            spheres: self.sphere_buffer.instance_count(),
            sounds: self.sound_buffer.len(),
            events: self.ctx.events.len(),
        };
        self.layout.write_header(&mut self.header, &self.config, counts);
    }

    // ---- Access for game-specific exports ----

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn ctx(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ---- Pointer accessors for shared-buffer reads ----

    pub fn header_ptr(&self) -> *const f32 {
        self.header.as_ptr()
    }

    pub fn spheres_ptr(&self) -> *const f32 {
        self.sphere_buffer.instances_ptr()
    }

    pub fn sphere_count(&self) -> u32 {
        self.sphere_buffer.instance_count() as u32
    }

    pub fn sound_events_ptr(&self) -> *const f32 {
        self.sound_buffer.as_ptr()
    }

    pub fn sound_events_len(&self) -> u32 {
        self.sound_buffer.len() as u32
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len().min(self.config.max_events) as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    // ---- Capacity accessors ----

    pub fn max_spheres(&self) -> u32 {
        self.layout.max_spheres as u32
    }

    pub fn max_sounds(&self) -> u32 {
        self.layout.max_sounds as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }

    /// Layout as JSON for the TypeScript side. Empty on serialization failure.
    pub fn protocol_json(&self) -> String {
        match self.layout.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::warn!("protocol layout serialization failed: {}", err);
                String::new()
            }
        }
    }
}
