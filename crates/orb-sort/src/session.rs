//! One level's worth of puzzle state, driven by discrete inputs and fixed ticks.

use glam::Vec2;
use orb_engine::EntityId;

use crate::bodies::SphereBodies;
use crate::level::Level;
use crate::moves::{commit_release, DragController, GrabOutcome, ReleaseOutcome};
use crate::rack::{Sphere, SphereId, Tube, TubeId, TubeRack};
use crate::resolver::{Board, FloorReason};
use crate::settings::PuzzleSettings;
use crate::undo::{restore_membership, MoveRecord, UndoLog};
use crate::victory::{is_solved, Victory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PuzzleInput {
    Grab(Vec2),
    DragTo(Vec2),
    Release(Vec2),
    Undo,
    NewLevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputResponse {
    Grab(GrabOutcome),
    Dragged,
    Release(ReleaseOutcome),
    Undone(SphereId),
    /// The caller should tear this session down and start a new level.
    NewLevelRequested,
    Ignored,
}

/// Things that happened, for sounds and UI. Drained by the game each update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PuzzleEvent {
    Grabbed(SphereId),
    Placed { sphere: SphereId, tube: TubeId },
    Floored { sphere: SphereId, reason: FloorReason },
    Undone(SphereId),
    Solved { moves: u32 },
}

pub struct PuzzleSession {
    settings: PuzzleSettings,
    level: Level,
    rack: TubeRack,
    spheres: Vec<Sphere>,
    drag: DragController,
    undo: UndoLog,
    victory: Victory,
    clock: f32,
    settled_ticks: u32,
    draggable: Vec<bool>,
    drop_targets: Vec<bool>,
    events: Vec<PuzzleEvent>,
    moves_made: u32,
}

impl PuzzleSession {
    /// Set up a session for a freshly spawned level. `handles[i]` is the body of `level.spawns[i]`.
    pub fn new<B: SphereBodies + ?Sized>(
        settings: PuzzleSettings,
        level: Level,
        handles: &[EntityId],
        bodies: &B,
    ) -> Self {
        if handles.len() != level.spawns.len() {
            log::warn!(
                "level {} has {} spawns but {} bodies",
                level.number,
                level.spawns.len(),
                handles.len()
            );
        }
        let spheres: Vec<Sphere> = level
            .spawns
            .iter()
            .zip(handles)
            .enumerate()
            .map(|(i, (spawn, body))| Sphere {
                id: SphereId(i as u32),
                body: *body,
                color: spawn.color,
                radius: settings.sphere_radius,
                claimed: false,
            })
            .collect();
        let rack = TubeRack::new(level.tubes.iter().copied(), level.capacity);

        let mut session = Self {
            drag: DragController::new(settings.move_cooldown),
            undo: UndoLog::new(settings.undo_depth),
            draggable: vec![false; spheres.len()],
            drop_targets: vec![false; rack.len()],
            victory: Victory::default(),
            clock: 0.0,
            settled_ticks: 0,
            events: Vec::new(),
            moves_made: 0,
            settings,
            level,
            rack,
            spheres,
        };
        session.resync(bodies);
        session.refresh_flags(bodies);
        session
    }

    /// Single entry point for player intent. Never fails; rejected input
    /// comes back as `Ignored` or a rejection outcome.
    pub fn handle_input<B: SphereBodies + ?Sized>(
        &mut self,
        input: PuzzleInput,
        bodies: &mut B,
    ) -> InputResponse {
        let response = match input {
            PuzzleInput::Grab(point) => self.grab(point, bodies),
            PuzzleInput::DragTo(point) => match self.drag.drag_to(point) {
                Some((sphere, target)) => {
                    if let Some(s) = self.spheres.get(sphere.0 as usize) {
                        bodies.move_pinned(s.body, target);
                    }
                    InputResponse::Dragged
                }
                None => InputResponse::Ignored,
            },
            PuzzleInput::Release(point) => self.release(point, bodies),
            PuzzleInput::Undo => self.undo(bodies),
            PuzzleInput::NewLevel => {
                if self.drag.is_dragging() {
                    InputResponse::Ignored
                } else {
                    InputResponse::NewLevelRequested
                }
            }
        };
        if !matches!(response, InputResponse::Ignored | InputResponse::Dragged) {
            self.refresh_flags(&*bodies);
        }
        response
    }

    fn grab<B: SphereBodies + ?Sized>(&mut self, point: Vec2, bodies: &mut B) -> InputResponse {
        let outcome = {
            let board = Board {
                rack: &self.rack,
                spheres: &self.spheres,
                bodies: &*bodies,
                settings: &self.settings,
            };
            self.drag.grab(point, &board, self.victory.is_solved())
        };
        if let GrabOutcome::Grabbed { sphere, origin } = outcome {
            if let Some(s) = self.spheres.get(sphere.0 as usize) {
                let record = MoveRecord {
                    sphere,
                    origin,
                    position: bodies.position(s.body).unwrap_or(point),
                    velocity: bodies.velocity(s.body),
                };
                if let Some(evicted) = self.undo.record(record) {
                    log::debug!("undo history full, dropped move of sphere {}", evicted.sphere.0);
                }
                bodies.pin(s.body);
            }
            self.settled_ticks = 0;
            self.events.push(PuzzleEvent::Grabbed(sphere));
        }
        InputResponse::Grab(outcome)
    }

    fn release<B: SphereBodies + ?Sized>(&mut self, point: Vec2, bodies: &mut B) -> InputResponse {
        let outcome = {
            let board = Board {
                rack: &self.rack,
                spheres: &self.spheres,
                bodies: &*bodies,
                settings: &self.settings,
            };
            self.drag.release(point, &board)
        };
        let (sphere, rest) = match outcome {
            ReleaseOutcome::Placed { sphere, rest, .. }
            | ReleaseOutcome::Floored { sphere, rest, .. } => (sphere, rest),
            ReleaseOutcome::NotDragging => return InputResponse::Release(outcome),
        };

        let event = match commit_release(&outcome, &mut self.rack, &mut self.spheres) {
            Ok(()) => match outcome {
                ReleaseOutcome::Placed { to, .. } => PuzzleEvent::Placed { sphere, tube: to },
                ReleaseOutcome::Floored { reason, .. } => PuzzleEvent::Floored { sphere, reason },
                ReleaseOutcome::NotDragging => return InputResponse::Release(outcome),
            },
            Err(err) => {
                log::warn!("placing sphere {} failed, leaving it on the floor: {}", sphere.0, err);
                PuzzleEvent::Floored { sphere, reason: FloorReason::TubeFull }
            }
        };

        if let Some(s) = self.spheres.get(sphere.0 as usize) {
            bodies.unpin(s.body);
            bodies.teleport(s.body, rest, Vec2::ZERO);
        }
        self.moves_made += 1;
        self.settled_ticks = 0;
        log::debug!("move {}: {:?}", self.moves_made, event);
        self.events.push(event);
        InputResponse::Release(outcome)
    }

    fn undo<B: SphereBodies + ?Sized>(&mut self, bodies: &mut B) -> InputResponse {
        if self.drag.is_dragging() || self.victory.is_solved() {
            return InputResponse::Ignored;
        }
        let Some(record) = self.undo.pop() else {
            return InputResponse::Ignored;
        };
        if let Err(err) = restore_membership(&record, &mut self.rack, &mut self.spheres) {
            log::warn!("undo could not return sphere {} to its tube: {}", record.sphere.0, err);
        }
        if let Some(s) = self.spheres.get(record.sphere.0 as usize) {
            bodies.unpin(s.body);
            bodies.teleport(s.body, record.position, record.velocity);
        }
        self.moves_made = self.moves_made.saturating_sub(1);
        self.drag.start_cooldown();
        self.settled_ticks = 0;
        log::debug!("undo: sphere {} back to {:?}", record.sphere.0, record.origin);
        self.events.push(PuzzleEvent::Undone(record.sphere));
        InputResponse::Undone(record.sphere)
    }

    /// Advance one fixed step: clocks, first-claim resync, flags, settling and the win check.
    pub fn tick<B: SphereBodies + ?Sized>(&mut self, dt: f32, bodies: &B) {
        self.clock += dt;
        self.drag.tick(dt);
        self.resync(bodies);
        self.refresh_flags(bodies);

        if self.drag.is_dragging() || self.drag.is_cooling_down() {
            self.settled_ticks = 0;
            return;
        }
        let settle_speed = self.settings.settle_speed;
        let all_settled = self
            .spheres
            .iter()
            .all(|s| bodies.velocity(s.body).length() < settle_speed);
        if !all_settled {
            self.settled_ticks = 0;
            return;
        }
        self.settled_ticks = self.settled_ticks.saturating_add(1);
        if self.settled_ticks >= self.settings.settle_ticks {
            let solved = is_solved(&self.rack, &self.spheres);
            if self.victory.evaluate(solved, self.clock) {
                log::info!(
                    "level {} solved in {} moves ({:.1}s)",
                    self.level.number,
                    self.moves_made,
                    self.clock
                );
                self.events.push(PuzzleEvent::Solved { moves: self.moves_made });
            }
        }
    }

    /// Claim never-claimed spheres by position: inside a tube's footprint
    /// joins that tube bottom-most first while there is room, else floor.
    fn resync<B: SphereBodies + ?Sized>(&mut self, bodies: &B) {
        if self.spheres.iter().all(|s| s.claimed) {
            return;
        }
        let mut unclaimed: Vec<(SphereId, Vec2)> = self
            .spheres
            .iter()
            .filter(|s| !s.claimed)
            .filter_map(|s| bodies.position(s.body).map(|p| (s.id, p)))
            .collect();
        // Bottom-most (largest y) first.
        unclaimed.sort_by(|a, b| b.1.y.total_cmp(&a.1.y));

        for (id, pos) in unclaimed {
            let home = self
                .rack
                .tubes()
                .iter()
                .find(|t| t.geometry.inner_contains(pos) && !t.is_full())
                .map(|t| t.id);
            if let Some(tube) = home {
                if let Err(err) = self.rack.add_sphere(tube, id) {
                    log::warn!("resync could not rack sphere {}: {}", id.0, err);
                }
            }
            if let Some(s) = self.spheres.get_mut(id.0 as usize) {
                s.claimed = true;
            }
        }
    }

    fn refresh_flags<B: SphereBodies + ?Sized>(&mut self, bodies: &B) {
        let board = Board {
            rack: &self.rack,
            spheres: &self.spheres,
            bodies,
            settings: &self.settings,
        };
        let dragged = self.drag.dragged();
        self.draggable = self
            .spheres
            .iter()
            .map(|s| board.is_draggable(s.id, dragged))
            .collect();
        self.drop_targets = board.drop_targets(dragged);
    }

    // ---- Read-only views ----

    pub fn settings(&self) -> &PuzzleSettings {
        &self.settings
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn tubes(&self) -> &[Tube] {
        self.rack.tubes()
    }

    pub fn rack(&self) -> &TubeRack {
        &self.rack
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn dragged(&self) -> Option<SphereId> {
        self.drag.dragged()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Cached as of the last tick or input.
    pub fn is_draggable(&self, sphere: SphereId) -> bool {
        self.draggable.get(sphere.0 as usize).copied().unwrap_or(false)
    }

    /// Per tube: would the held sphere be placed there? All false when idle.
    pub fn drop_targets(&self) -> &[bool] {
        &self.drop_targets
    }

    pub fn is_solved(&self) -> bool {
        self.victory.is_solved()
    }

    pub fn time_since_victory(&self) -> Option<f32> {
        self.victory.time_since(self.clock)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn floor_count(&self) -> usize {
        self.spheres.len() - self.rack.contained_count()
    }

    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::StaticBodies;
    use crate::level::SphereSpawn;
    use crate::palette::OrbColor;
    use crate::rack::TubeGeometry;

    const RED: OrbColor = OrbColor(0);
    const BLUE: OrbColor = OrbColor(5);
    const TICK: f32 = 1.0 / 60.0;

    fn geometry(x: f32) -> TubeGeometry {
        TubeGeometry {
            center_x: x,
            bottom_y: 554.0,
            inner_width: 44.0,
            height: 100.0,
            wall_thickness: 6.0,
        }
    }

    /// Three capacity-2 tubes at x = 100/200/300 with mouths at y = 454.
    /// `stacks` lists colors per tube, bottom first.
    fn session_with(stacks: &[&[OrbColor]]) -> (PuzzleSession, StaticBodies) {
        let tubes = vec![geometry(100.0), geometry(200.0), geometry(300.0)];
        let mut spawns = Vec::new();
        for (t, stack) in stacks.iter().enumerate() {
            for (slot, color) in stack.iter().enumerate() {
                spawns.push(SphereSpawn {
                    color: *color,
                    pos: Vec2::new(tubes[t].center_x, 536.0 - 37.0 * slot as f32),
                });
            }
        }
        let level = Level {
            number: 1,
            seed: 1,
            capacity: 2,
            colors: vec![RED, BLUE],
            tubes,
            spawns,
        };
        let mut bodies = StaticBodies::new();
        let handles: Vec<EntityId> = (0..level.spawns.len() as u32).map(|i| EntityId(i + 10)).collect();
        for (h, spawn) in handles.iter().zip(&level.spawns) {
            bodies.insert(*h, spawn.pos);
        }
        let settings = PuzzleSettings { capacity: 2, ..Default::default() };
        (PuzzleSession::new(settings, level, &handles, &bodies), bodies)
    }

    fn top_point(session: &PuzzleSession, bodies: &StaticBodies, tube: usize) -> Vec2 {
        let ids = session.tubes()[tube].spheres();
        let id = ids[ids.len() - 1];
        bodies.position(session.spheres()[id.0 as usize].body).unwrap()
    }

    fn drop_point(tube: usize) -> Vec2 {
        Vec2::new(100.0 * (tube + 1) as f32, 430.0)
    }

    fn wait(session: &mut PuzzleSession, bodies: &StaticBodies, seconds: f32) {
        let steps = (seconds / TICK).ceil() as usize;
        for _ in 0..steps {
            session.tick(TICK, bodies);
        }
    }

    /// Grab the top of `from`, release over `to`, then let the cooldown pass.
    fn play(session: &mut PuzzleSession, bodies: &mut StaticBodies, from: usize, to: usize) -> InputResponse {
        let grab = top_point(session, bodies, from);
        session.handle_input(PuzzleInput::Grab(grab), bodies);
        session.handle_input(PuzzleInput::DragTo(drop_point(to)), bodies);
        let response = session.handle_input(PuzzleInput::Release(drop_point(to)), bodies);
        wait(session, bodies, 0.3);
        response
    }

    #[test]
    fn construction_claims_spawned_spheres_in_stack_order() {
        let (session, _) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        assert!(session.spheres().iter().all(|s| s.claimed));
        assert_eq!(session.tubes()[0].spheres(), &[SphereId(0), SphereId(1)]);
        assert_eq!(session.tubes()[1].spheres(), &[SphereId(2), SphereId(3)]);
        assert_eq!(session.floor_count(), 0);
        assert!(session.is_draggable(SphereId(1)));
        assert!(!session.is_draggable(SphereId(0)));
    }

    #[test]
    fn grab_pins_and_release_unpins() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        let grab = top_point(&session, &bodies, 0);
        let response = session.handle_input(PuzzleInput::Grab(grab), &mut bodies);
        assert!(matches!(response, InputResponse::Grab(GrabOutcome::Grabbed { .. })));
        assert!(bodies.is_pinned(EntityId(11)));
        assert_eq!(session.dragged(), Some(SphereId(1)));
        assert_eq!(session.undo_depth(), 1);
        assert_eq!(session.drop_targets(), &[false, false, true]);

        session.handle_input(PuzzleInput::DragTo(Vec2::new(300.0, 420.0)), &mut bodies);
        assert_eq!(bodies.position(EntityId(11)), Some(Vec2::new(300.0, 420.0)));

        let response = session.handle_input(PuzzleInput::Release(Vec2::new(300.0, 420.0)), &mut bodies);
        assert!(matches!(response, InputResponse::Release(ReleaseOutcome::Placed { to: TubeId(2), .. })));
        assert!(!bodies.is_pinned(EntityId(11)));
        assert_eq!(session.rack().find_tube(SphereId(1)), Some(TubeId(2)));
        assert_eq!(session.moves_made(), 1);
        assert_eq!(
            session.drain_events(),
            vec![
                PuzzleEvent::Grabbed(SphereId(1)),
                PuzzleEvent::Placed { sphere: SphereId(1), tube: TubeId(2) },
            ]
        );
    }

    #[test]
    fn move_onto_full_tube_lands_on_floor() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        let response = play(&mut session, &mut bodies, 0, 1);
        assert!(matches!(
            response,
            InputResponse::Release(ReleaseOutcome::Floored { reason: FloorReason::TubeFull, .. })
        ));
        assert_eq!(session.floor_count(), 1);
        assert_eq!(session.rack().contained_count(), 3);
    }

    #[test]
    fn color_mismatch_lands_on_floor() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[RED]]);
        let response = play(&mut session, &mut bodies, 0, 1);
        assert!(matches!(
            response,
            InputResponse::Release(ReleaseOutcome::Floored { reason: FloorReason::ColorMismatch, .. })
        ));
    }

    #[test]
    fn undo_reverses_the_last_move() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        let before = bodies.position(EntityId(11)).unwrap();
        play(&mut session, &mut bodies, 0, 2);
        assert_eq!(session.rack().find_tube(SphereId(1)), Some(TubeId(2)));

        let response = session.handle_input(PuzzleInput::Undo, &mut bodies);
        assert_eq!(response, InputResponse::Undone(SphereId(1)));
        assert_eq!(session.tubes()[0].spheres(), &[SphereId(0), SphereId(1)]);
        assert!(session.tubes()[2].is_empty());
        assert_eq!(bodies.position(EntityId(11)), Some(before));
        assert_eq!(session.undo_depth(), 0);
        assert_eq!(session.moves_made(), 0);

        assert_eq!(session.handle_input(PuzzleInput::Undo, &mut bodies), InputResponse::Ignored);
    }

    #[test]
    fn undo_history_is_bounded() {
        let (mut session, mut bodies) = session_with(&[&[BLUE], &[], &[]]);
        // Shuttle the lone sphere between tube 0 and tube 2 six times.
        for i in 0..6 {
            let (from, to) = if i % 2 == 0 { (0, 2) } else { (2, 0) };
            play(&mut session, &mut bodies, from, to);
        }
        assert_eq!(session.undo_depth(), 5);

        let mut undone = 0;
        for _ in 0..6 {
            if let InputResponse::Undone(_) = session.handle_input(PuzzleInput::Undo, &mut bodies) {
                undone += 1;
            }
            wait(&mut session, &bodies, 0.3);
        }
        assert_eq!(undone, 5);
        // The oldest move (0 to 2) was evicted, so the sphere stays in tube 2.
        assert_eq!(session.rack().find_tube(SphereId(0)), Some(TubeId(2)));
    }

    #[test]
    fn undo_and_new_level_are_refused_mid_drag() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        play(&mut session, &mut bodies, 0, 2);
        let grab = top_point(&session, &bodies, 1);
        session.handle_input(PuzzleInput::Grab(grab), &mut bodies);
        assert!(session.is_dragging());

        assert_eq!(session.handle_input(PuzzleInput::Undo, &mut bodies), InputResponse::Ignored);
        assert_eq!(session.handle_input(PuzzleInput::NewLevel, &mut bodies), InputResponse::Ignored);
        assert_eq!(session.undo_depth(), 2);

        session.handle_input(PuzzleInput::Release(drop_point(1)), &mut bodies);
        assert_eq!(
            session.handle_input(PuzzleInput::NewLevel, &mut bodies),
            InputResponse::NewLevelRequested
        );
    }

    #[test]
    fn cooldown_follows_every_commit() {
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE, RED]]);
        let grab = top_point(&session, &bodies, 0);
        session.handle_input(PuzzleInput::Grab(grab), &mut bodies);
        session.handle_input(PuzzleInput::Release(Vec2::new(700.0, 100.0)), &mut bodies);

        wait(&mut session, &bodies, 0.1);
        let grab = top_point(&session, &bodies, 1);
        assert_eq!(
            session.handle_input(PuzzleInput::Grab(grab), &mut bodies),
            InputResponse::Grab(GrabOutcome::CoolingDown)
        );
        wait(&mut session, &bodies, 0.2);
        assert!(matches!(
            session.handle_input(PuzzleInput::Grab(grab), &mut bodies),
            InputResponse::Grab(GrabOutcome::Grabbed { .. })
        ));
    }

    #[test]
    fn solving_latches_victory_and_freezes_play() {
        // Tube 0: [red, blue], tube 1: [blue], tube 2: [red].
        let (mut session, mut bodies) = session_with(&[&[RED, BLUE], &[BLUE], &[RED]]);
        wait(&mut session, &bodies, 1.0);
        assert!(!session.is_solved());

        play(&mut session, &mut bodies, 0, 1);
        wait(&mut session, &bodies, 0.5);
        assert!(!session.is_solved(), "tube 0 holds a lone red");

        play(&mut session, &mut bodies, 0, 2);
        wait(&mut session, &bodies, 1.0);
        assert!(session.is_solved());
        assert!(session
            .drain_events()
            .contains(&PuzzleEvent::Solved { moves: 2 }));
        assert!(session.time_since_victory().unwrap() > 0.0);

        // Undo and grabs are refused once solved, and the flag stays set.
        assert_eq!(session.handle_input(PuzzleInput::Undo, &mut bodies), InputResponse::Ignored);
        let grab = top_point(&session, &bodies, 1);
        assert_eq!(
            session.handle_input(PuzzleInput::Grab(grab), &mut bodies),
            InputResponse::Grab(GrabOutcome::Solved)
        );
        wait(&mut session, &bodies, 1.0);
        assert!(session.is_solved());
    }

    #[test]
    fn win_check_waits_for_settling() {
        let (mut session, mut bodies) = session_with(&[&[RED, RED], &[BLUE, BLUE]]);
        bodies.set_velocity(EntityId(10), Vec2::new(0.0, 50.0));
        wait(&mut session, &bodies, 1.0);
        assert!(!session.is_solved());

        bodies.set_velocity(EntityId(10), Vec2::ZERO);
        wait(&mut session, &bodies, 1.0);
        assert!(session.is_solved());
    }
}
