use serde::{Deserialize, Serialize};

/// Linear RGB color for the sphere renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SDFColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl SDFColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a 0xRRGGBB literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
        }
    }
}

impl Default for SDFColor {
    fn default() -> Self {
        Self { r: 0.6, g: 0.6, b: 0.8 }
    }
}

/// Raymarched sphere visual attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereMesh {
    pub radius: f32,
    pub color: SDFColor,
    /// Phong specular exponent (default: 32.0).
    pub shininess: f32,
    /// HDR glow multiplier. 0 is unlit; the game raises it to highlight.
    pub emissive: f32,
    pub alpha: f32,
}

impl SphereMesh {
    pub fn new(radius: f32, color: SDFColor) -> Self {
        Self {
            radius,
            color,
            shininess: 32.0,
            emissive: 0.0,
            alpha: 1.0,
        }
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_emissive(mut self, emissive: f32) -> Self {
        self.emissive = emissive;
        self
    }
}
