//! Logical tube membership. Physics positions never write here directly;
//! only moves, undo and the first-claim resync do.

use std::fmt;

use glam::Vec2;
use orb_engine::EntityId;

use crate::palette::OrbColor;

/// Sphere identity within a level. Also the sphere's index in the session's sphere list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SphereId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TubeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub id: SphereId,
    /// Physics body handle. The body itself belongs to the engine.
    pub body: EntityId,
    pub color: OrbColor,
    pub radius: f32,
    /// Set once membership has been decided explicitly. Resync only touches unclaimed spheres.
    pub claimed: bool,
}

/// Container shape in world units (Y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeGeometry {
    pub center_x: f32,
    /// Y of the inner floor.
    pub bottom_y: f32,
    pub inner_width: f32,
    pub height: f32,
    pub wall_thickness: f32,
}

impl TubeGeometry {
    /// Y of the open mouth.
    pub fn top_y(&self) -> f32 {
        self.bottom_y - self.height
    }

    /// Half the outer width, walls included.
    pub fn half_span(&self) -> f32 {
        self.inner_width / 2.0 + self.wall_thickness
    }

    /// Whether `point` lies between the inner walls and between mouth and floor.
    pub fn inner_contains(&self, point: Vec2) -> bool {
        (point.x - self.center_x).abs() <= self.inner_width / 2.0
            && point.y >= self.top_y()
            && point.y <= self.bottom_y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    pub id: TubeId,
    pub geometry: TubeGeometry,
    pub capacity: usize,
    spheres: Vec<SphereId>,
}

impl Tube {
    /// Members, bottom to top in insertion order.
    pub fn spheres(&self) -> &[SphereId] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.spheres.len() >= self.capacity
    }

    pub fn contains(&self, sphere: SphereId) -> bool {
        self.spheres.contains(&sphere)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RackError {
    TubeFull { tube: TubeId, capacity: usize },
    UnknownTube(TubeId),
    AlreadyRacked { sphere: SphereId, tube: TubeId },
}

impl fmt::Display for RackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RackError::TubeFull { tube, capacity } => {
                write!(f, "tube {} is full ({} spheres)", tube.0, capacity)
            }
            RackError::UnknownTube(tube) => write!(f, "no tube with id {}", tube.0),
            RackError::AlreadyRacked { sphere, tube } => {
                write!(f, "sphere {} already sits in tube {}", sphere.0, tube.0)
            }
        }
    }
}

impl std::error::Error for RackError {}

/// All tubes of a level, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeRack {
    tubes: Vec<Tube>,
}

impl TubeRack {
    pub fn new(geometry: impl IntoIterator<Item = TubeGeometry>, capacity: usize) -> Self {
        let tubes = geometry
            .into_iter()
            .enumerate()
            .map(|(i, geometry)| Tube {
                id: TubeId(i),
                geometry,
                capacity,
                spheres: Vec::with_capacity(capacity),
            })
            .collect();
        Self { tubes }
    }

    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    pub fn tube(&self, id: TubeId) -> Option<&Tube> {
        self.tubes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.tubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tubes.is_empty()
    }

    /// Append `sphere` on top of `tube`.
    pub fn add_sphere(&mut self, tube: TubeId, sphere: SphereId) -> Result<(), RackError> {
        if let Some(current) = self.find_tube(sphere) {
            return Err(RackError::AlreadyRacked { sphere, tube: current });
        }
        let target = self.tubes.get_mut(tube.0).ok_or(RackError::UnknownTube(tube))?;
        if target.is_full() {
            return Err(RackError::TubeFull { tube, capacity: target.capacity });
        }
        target.spheres.push(sphere);
        Ok(())
    }

    /// Returns false if `sphere` was not in `tube`.
    pub fn remove_sphere(&mut self, tube: TubeId, sphere: SphereId) -> bool {
        let Some(target) = self.tubes.get_mut(tube.0) else {
            return false;
        };
        match target.spheres.iter().position(|s| *s == sphere) {
            Some(idx) => {
                target.spheres.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn find_tube(&self, sphere: SphereId) -> Option<TubeId> {
        self.tubes.iter().find(|t| t.contains(sphere)).map(|t| t.id)
    }

    /// Spheres held by any tube.
    pub fn contained_count(&self) -> usize {
        self.tubes.iter().map(Tube::len).sum()
    }
}
