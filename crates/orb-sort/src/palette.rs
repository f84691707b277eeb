//! Sphere colors. A level uses a shuffled subset of the palette.

use orb_engine::SDFColor;

/// Index into [`PALETTE`]. Equality is what the puzzle rules compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrbColor(pub u8);

impl OrbColor {
    pub fn rgb(self) -> SDFColor {
        PALETTE[self.0 as usize % PALETTE.len()].1
    }

    pub fn name(self) -> &'static str {
        PALETTE[self.0 as usize % PALETTE.len()].0
    }
}

pub const PALETTE: [(&str, SDFColor); 8] = [
    ("red", SDFColor::hex(0xe63946)),
    ("orange", SDFColor::hex(0xf4a261)),
    ("yellow", SDFColor::hex(0xf1d302)),
    ("green", SDFColor::hex(0x2a9d8f)),
    ("cyan", SDFColor::hex(0x48cae4)),
    ("blue", SDFColor::hex(0x3a56d4)),
    ("purple", SDFColor::hex(0x9d4edd)),
    ("pink", SDFColor::hex(0xff70a6)),
];
