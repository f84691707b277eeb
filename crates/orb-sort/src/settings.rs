//! Tunable puzzle parameters, loadable from a JSON blob sent by the host page.

use serde::{Deserialize, Serialize};

use crate::palette::PALETTE;

/// Every field has a default, so a partial JSON object only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleSettings {
    /// Spheres per tube.
    pub capacity: usize,
    pub min_colors: usize,
    pub max_colors: usize,
    /// Empty tubes added on top of one tube per color.
    pub slack_tubes: usize,
    pub undo_depth: usize,
    /// Seconds after a commit (or undo) during which grabs are refused.
    pub move_cooldown: f32,
    pub sphere_radius: f32,
    /// Speed below which a body counts as settled (world units / s).
    pub settle_speed: f32,
    /// Consecutive settled ticks before the win check runs.
    pub settle_ticks: u32,
    /// Vertical tolerance above the floor for grabbing floor spheres.
    pub floor_band: f32,
    /// Grab radius as a multiple of the sphere radius.
    pub grab_slop: f32,
    /// Preferred distance between tube centers; shrinks to fit the world.
    pub tube_pitch: f32,
    /// Horizontal play between a sphere and the tube walls.
    pub tube_clearance: f32,
    /// Extra inner height above a full stack.
    pub tube_headroom: f32,
    pub wall_thickness: f32,
    /// How far above a tube's mouth a release still targets that tube.
    pub drop_reach_above: f32,
    /// Minimum relative speed for a collision to make a sound.
    pub clack_min_speed: f32,
    /// Seconds after victory before the next level starts on its own.
    pub auto_advance_after: Option<f32>,
    pub seed: u64,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            capacity: 4,
            min_colors: 4,
            max_colors: 6,
            slack_tubes: 2,
            undo_depth: 5,
            move_cooldown: 0.25,
            sphere_radius: 18.0,
            settle_speed: 12.0,
            settle_ticks: 20,
            floor_band: 18.0,
            grab_slop: 1.25,
            tube_pitch: 100.0,
            tube_clearance: 4.0,
            tube_headroom: 24.0,
            wall_thickness: 6.0,
            drop_reach_above: 200.0,
            clack_min_speed: 80.0,
            auto_advance_after: Some(4.0),
            seed: 0x0b5e_5017,
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

impl PuzzleSettings {
    /// Parse and clamp. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: Self = serde_json::from_str(json)?;
        Ok(parsed.validated())
    }

    /// Clamp values into ranges the level layout and rules can handle.
    pub fn validated(self) -> Self {
        let d = Self::default();
        let max_palette = PALETTE.len();
        let min_colors = self.min_colors.clamp(2, max_palette);
        let max_colors = self.max_colors.clamp(min_colors, max_palette);
        Self {
            capacity: self.capacity.clamp(2, 8),
            min_colors,
            max_colors,
            slack_tubes: self.slack_tubes.min(4),
            undo_depth: self.undo_depth.min(64),
            move_cooldown: finite_or(self.move_cooldown, d.move_cooldown).clamp(0.0, 5.0),
            sphere_radius: finite_or(self.sphere_radius, d.sphere_radius).clamp(6.0, 28.0),
            settle_speed: finite_or(self.settle_speed, d.settle_speed).max(0.1),
            settle_ticks: self.settle_ticks.max(1),
            floor_band: finite_or(self.floor_band, d.floor_band).max(0.0),
            grab_slop: finite_or(self.grab_slop, d.grab_slop).clamp(1.0, 3.0),
            tube_pitch: finite_or(self.tube_pitch, d.tube_pitch).max(1.0),
            tube_clearance: finite_or(self.tube_clearance, d.tube_clearance).clamp(0.0, 20.0),
            tube_headroom: finite_or(self.tube_headroom, d.tube_headroom).clamp(0.0, 100.0),
            wall_thickness: finite_or(self.wall_thickness, d.wall_thickness).clamp(2.0, 20.0),
            drop_reach_above: finite_or(self.drop_reach_above, d.drop_reach_above).max(0.0),
            clack_min_speed: finite_or(self.clack_min_speed, d.clack_min_speed).max(0.0),
            auto_advance_after: self
                .auto_advance_after
                .filter(|secs| secs.is_finite() && *secs >= 0.0),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_validation() {
        assert_eq!(PuzzleSettings::default().validated(), PuzzleSettings::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let s = PuzzleSettings::from_json(r#"{"capacity": 5, "undo_depth": 3}"#).unwrap();
        assert_eq!(s.capacity, 5);
        assert_eq!(s.undo_depth, 3);
        assert_eq!(s.slack_tubes, 2);
        assert_eq!(s.auto_advance_after, Some(4.0));
    }

    #[test]
    fn nonsense_is_clamped() {
        let s = PuzzleSettings::from_json(
            r#"{"capacity": 0, "min_colors": 9, "max_colors": 1, "sphere_radius": -3,
                "auto_advance_after": -1, "grab_slop": 0.1}"#,
        )
        .unwrap();
        assert_eq!(s.capacity, 2);
        assert_eq!(s.min_colors, PALETTE.len());
        assert_eq!(s.max_colors, PALETTE.len());
        assert_eq!(s.sphere_radius, 6.0);
        assert_eq!(s.auto_advance_after, None);
        assert_eq!(s.grab_slop, 1.0);
    }

    #[test]
    fn null_disables_auto_advance() {
        let s = PuzzleSettings::from_json(r#"{"auto_advance_after": null}"#).unwrap();
        assert_eq!(s.auto_advance_after, None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PuzzleSettings::from_json("{capacity: 4").is_err());
        assert!(PuzzleSettings::from_json(r#"{"capacity": "four"}"#).is_err());
    }
}
