//! Shared buffer layout between the WASM module and the TypeScript renderer.
//!
//! Layout (all values f32):
//! ```text
//! [Header: 16 floats]
//! [Spheres: max_spheres × 12 floats]
//! [Sounds: max_sounds × 1 float]
//! [Events: max_events × 4 floats]
//! ```
//!
//! Capacities go into the header once at init; TypeScript reads them back
//! (or fetches the JSON form) to compute offsets.

use serde::Serialize;

use crate::api::game::GameConfig;
use crate::api::types::GameEvent;
use crate::renderer::sphere_instance::SphereInstance;

pub const HEADER_FLOATS: usize = 16;

pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_PROTOCOL_VERSION: usize = 2;
pub const HEADER_WORLD_WIDTH: usize = 3;
pub const HEADER_WORLD_HEIGHT: usize = 4;
pub const HEADER_MAX_SPHERES: usize = 5;
pub const HEADER_SPHERE_COUNT: usize = 6;
pub const HEADER_MAX_SOUNDS: usize = 7;
pub const HEADER_SOUND_COUNT: usize = 8;
pub const HEADER_MAX_EVENTS: usize = 9;
pub const HEADER_EVENT_COUNT: usize = 10;

pub const PROTOCOL_VERSION: f32 = 2.0;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolLayout {
    pub max_spheres: usize,
    pub max_sounds: usize,
    pub max_events: usize,

    pub sphere_data_floats: usize,
    pub sound_data_floats: usize,
    pub event_data_floats: usize,

    pub sphere_data_offset: usize,
    pub sound_data_offset: usize,
    pub event_data_offset: usize,

    pub buffer_total_floats: usize,
    pub buffer_total_bytes: usize,
}

/// Per-frame counts written alongside the static header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameCounts {
    pub frame: u64,
    pub spheres: usize,
    pub sounds: usize,
    pub events: usize,
}

impl ProtocolLayout {
    pub fn new(max_spheres: usize, max_sounds: usize, max_events: usize) -> Self {
        let sphere_data_floats = max_spheres * SphereInstance::FLOATS;
        let sound_data_floats = max_sounds;
        let event_data_floats = max_events * GameEvent::FLOATS;

        let sphere_data_offset = HEADER_FLOATS;
        let sound_data_offset = sphere_data_offset + sphere_data_floats;
        let event_data_offset = sound_data_offset + sound_data_floats;
        let buffer_total_floats = event_data_offset + event_data_floats;

        Self {
            max_spheres,
            max_sounds,
            max_events,
            sphere_data_floats,
            sound_data_floats,
            event_data_floats,
            sphere_data_offset,
            sound_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_spheres, config.max_sounds, config.max_events)
    }

    /// Fill a header block. Counts are clamped to the section capacities.
    pub fn write_header(&self, header: &mut [f32; HEADER_FLOATS], config: &GameConfig, counts: FrameCounts) {
        header[HEADER_LOCK] = 0.0;
        header[HEADER_FRAME_COUNTER] = counts.frame as f32;
        header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        header[HEADER_WORLD_WIDTH] = config.world_width;
        header[HEADER_WORLD_HEIGHT] = config.world_height;
        header[HEADER_MAX_SPHERES] = self.max_spheres as f32;
        header[HEADER_SPHERE_COUNT] = counts.spheres.min(self.max_spheres) as f32;
        header[HEADER_MAX_SOUNDS] = self.max_sounds as f32;
        header[HEADER_SOUND_COUNT] = counts.sounds.min(self.max_sounds) as f32;
        header[HEADER_MAX_EVENTS] = self.max_events as f32;
        header[HEADER_EVENT_COUNT] = counts.events.min(self.max_events) as f32;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_layout() {
        let layout = ProtocolLayout::from_config(&GameConfig::default());
        assert_eq!(layout.max_spheres, 256);
        assert_eq!(layout.sphere_data_offset, HEADER_FLOATS);
        assert_eq!(layout.sphere_data_floats, 256 * 12);
        assert_eq!(layout.sound_data_offset, 16 + 256 * 12);
        assert_eq!(layout.event_data_offset, 16 + 256 * 12 + 32);
        assert_eq!(layout.buffer_total_floats, 16 + 256 * 12 + 32 + 32 * 4);
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn offsets_are_contiguous() {
        let layout = ProtocolLayout::new(10, 3, 7);
        assert_eq!(layout.sound_data_offset, layout.sphere_data_offset + layout.sphere_data_floats);
        assert_eq!(layout.event_data_offset, layout.sound_data_offset + layout.sound_data_floats);
        assert_eq!(layout.buffer_total_floats, layout.event_data_offset + layout.event_data_floats);
    }

    #[test]
    fn header_clamps_counts() {
        let config = GameConfig::default();
        let layout = ProtocolLayout::new(4, 2, 2);
        let mut header = [0.0; HEADER_FLOATS];
        layout.write_header(
            &mut header,
            &config,
            FrameCounts { frame: 9, spheres: 10, sounds: 1, events: 5 },
        );
        assert_eq!(header[HEADER_FRAME_COUNTER], 9.0);
        assert_eq!(header[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
        assert_eq!(header[HEADER_SPHERE_COUNT], 4.0);
        assert_eq!(header[HEADER_SOUND_COUNT], 1.0);
        assert_eq!(header[HEADER_EVENT_COUNT], 2.0);
        assert_eq!(header[HEADER_WORLD_WIDTH], config.world_width);
    }

    #[test]
    fn json_names_every_offset() {
        let json = ProtocolLayout::new(8, 4, 4).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sphere_data_offset"], 16);
        assert_eq!(value["max_spheres"], 8);
        assert!(value.get("buffer_total_bytes").is_some());
    }
}
