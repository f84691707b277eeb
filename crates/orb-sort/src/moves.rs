//! Drag gestures: grab validation, release resolution and the membership commit.
//!
//! The controller decides; the session applies the physical side effects
//! (pinning, teleporting) and records undo history.

use glam::Vec2;

use crate::bodies::SphereBodies;
use crate::rack::{RackError, Sphere, SphereId, TubeId, TubeRack};
use crate::resolver::{Board, FloorReason};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveDrag {
    pub sphere: SphereId,
    pub origin: Option<TubeId>,
    pub pointer: Vec2,
    /// Sphere center minus pointer at grab time.
    pub grab_offset: Vec2,
}

impl ActiveDrag {
    /// Where the held sphere's center should be.
    pub fn held_position(&self) -> Vec2 {
        self.pointer + self.grab_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(ActiveDrag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    Grabbed { sphere: SphereId, origin: Option<TubeId> },
    Busy,
    CoolingDown,
    Solved,
    NothingThere,
    NotDraggable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    Placed {
        sphere: SphereId,
        from: Option<TubeId>,
        to: TubeId,
        /// Where the body restarts, at rest.
        rest: Vec2,
    },
    Floored {
        sphere: SphereId,
        from: Option<TubeId>,
        reason: FloorReason,
        rest: Vec2,
    },
    NotDragging,
}

impl ReleaseOutcome {
    pub fn sphere(&self) -> Option<SphereId> {
        match *self {
            ReleaseOutcome::Placed { sphere, .. } | ReleaseOutcome::Floored { sphere, .. } => {
                Some(sphere)
            }
            ReleaseOutcome::NotDragging => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    cooldown_left: f32,
    cooldown: f32,
}

impl DragController {
    pub fn new(cooldown: f32) -> Self {
        Self {
            state: DragState::Idle,
            cooldown_left: 0.0,
            cooldown,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    pub fn dragged(&self) -> Option<SphereId> {
        self.active().map(|d| d.sphere)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_left > 0.0
    }

    pub fn start_cooldown(&mut self) {
        self.cooldown_left = self.cooldown;
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown_left = (self.cooldown_left - dt).max(0.0);
    }

    /// Try to pick up the sphere under `point`. Rejections leave the state untouched.
    pub fn grab<B: SphereBodies + ?Sized>(
        &mut self,
        point: Vec2,
        board: &Board<'_, B>,
        solved: bool,
    ) -> GrabOutcome {
        if self.is_dragging() {
            return GrabOutcome::Busy;
        }
        if solved {
            return GrabOutcome::Solved;
        }
        if self.is_cooling_down() {
            return GrabOutcome::CoolingDown;
        }
        let Some(sphere) = board.sphere_at(point) else {
            return GrabOutcome::NothingThere;
        };
        if !board.is_draggable(sphere, None) {
            return GrabOutcome::NotDraggable;
        }
        let Some(center) = board.sphere(sphere).and_then(|s| board.bodies.position(s.body)) else {
            return GrabOutcome::NothingThere;
        };

        let origin = board.rack.find_tube(sphere);
        self.state = DragState::Dragging(ActiveDrag {
            sphere,
            origin,
            pointer: point,
            grab_offset: center - point,
        });
        GrabOutcome::Grabbed { sphere, origin }
    }

    /// Follow the pointer. Returns the held sphere and its new center.
    pub fn drag_to(&mut self, point: Vec2) -> Option<(SphereId, Vec2)> {
        match &mut self.state {
            DragState::Dragging(drag) => {
                drag.pointer = point;
                Some((drag.sphere, drag.held_position()))
            }
            DragState::Idle => None,
        }
    }

    /// Finish the gesture at `point`. Every release of a held sphere resolves
    /// to a tube or the floor and starts the cooldown.
    pub fn release<B: SphereBodies + ?Sized>(
        &mut self,
        point: Vec2,
        board: &Board<'_, B>,
    ) -> ReleaseOutcome {
        let DragState::Dragging(mut drag) = self.state else {
            return ReleaseOutcome::NotDragging;
        };
        drag.pointer = point;
        self.state = DragState::Idle;
        self.start_cooldown();

        let held = drag.held_position();
        let radius = board.sphere(drag.sphere).map_or(0.0, |s| s.radius);
        let floored = |reason| ReleaseOutcome::Floored {
            sphere: drag.sphere,
            from: drag.origin,
            reason,
            rest: board.floor_rest(drag.sphere, held),
        };

        let Some(tube) = board.tube_under_point(point) else {
            return floored(FloorReason::NoTube);
        };
        match board.accepts(tube, drag.sphere) {
            Ok(()) => {
                let geometry = board.rack.tube(tube).map(|t| t.geometry);
                let rest = geometry.map_or(held, |g| {
                    Vec2::new(g.center_x, held.y.min(g.top_y() - radius))
                });
                ReleaseOutcome::Placed {
                    sphere: drag.sphere,
                    from: drag.origin,
                    to: tube,
                    rest,
                }
            }
            Err(reason) => floored(reason),
        }
    }
}

/// Write a release into the rack. Only this and undo change tube membership
/// after the first claim. A sphere placed back into its origin tube is
/// re-appended as that tube's newest member. On error the sphere has already left its origin and
/// counts as a floor sphere.
pub fn commit_release(
    outcome: &ReleaseOutcome,
    rack: &mut TubeRack,
    spheres: &mut [Sphere],
) -> Result<(), RackError> {
    let (sphere, from, to) = match *outcome {
        ReleaseOutcome::Placed { sphere, from, to, .. } => (sphere, from, Some(to)),
        ReleaseOutcome::Floored { sphere, from, .. } => (sphere, from, None),
        ReleaseOutcome::NotDragging => return Ok(()),
    };
    if let Some(s) = spheres.get_mut(sphere.0 as usize) {
        s.claimed = true;
    }
    if let Some(origin) = from {
        rack.remove_sphere(origin, sphere);
    }
    match to {
        Some(target) => rack.add_sphere(target, sphere),
        None => Ok(()),
    }
}
