//! Gradients the fill indicator cycles through.
//!
//! The engine only tracks indices into [`GRADIENTS`]; turning an index into
//! pixels is up to the display layer.

use serde::Serialize;

/// An HSL colour stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

/// A vertical two-stop gradient, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub name: &'static str,
    pub top: Hsl,
    pub bottom: Hsl,
}

const fn hsl(hue: u16, saturation: u8, lightness: u8) -> Hsl {
    Hsl {
        hue,
        saturation,
        lightness,
    }
}

pub const GRADIENTS: [Gradient; 6] = [
    Gradient {
        name: "Ocean depths",
        top: hsl(200, 60, 55),
        bottom: hsl(220, 50, 35),
    },
    Gradient {
        name: "Teal waters",
        top: hsl(165, 55, 50),
        bottom: hsl(185, 45, 30),
    },
    Gradient {
        name: "Lavender dusk",
        top: hsl(270, 45, 60),
        bottom: hsl(290, 35, 35),
    },
    Gradient {
        name: "Soft rose",
        top: hsl(345, 50, 60),
        bottom: hsl(320, 40, 35),
    },
    Gradient {
        name: "Warm sunset",
        top: hsl(25, 60, 60),
        bottom: hsl(10, 50, 35),
    },
    Gradient {
        name: "Forest depths",
        top: hsl(145, 45, 50),
        bottom: hsl(160, 35, 28),
    },
];

pub const PALETTE_SIZE: usize = GRADIENTS.len();

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

impl Gradient {
    /// CSS `linear-gradient` form of this gradient.
    pub fn css(&self) -> String {
        format!(
            "linear-gradient(180deg, {} 0%, {} 100%)",
            self.top, self.bottom
        )
    }
}

/// Gradient for a palette index, wrapping out-of-range indices.
pub fn gradient(index: usize) -> &'static Gradient {
    &GRADIENTS[index % PALETTE_SIZE]
}
