//! Theme colors a project can carry.
use std::{fmt, str::FromStr};

use rand::RngExt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectColor {
    #[default]
    White,
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
}

impl ProjectColor {
    pub const ALL: [ProjectColor; 6] = [
        ProjectColor::White,
        ProjectColor::Red,
        ProjectColor::Blue,
        ProjectColor::Yellow,
        ProjectColor::Green,
        ProjectColor::Purple,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProjectColor::White => "white",
            ProjectColor::Red => "red",
            ProjectColor::Blue => "blue",
            ProjectColor::Yellow => "yellow",
            ProjectColor::Green => "green",
            ProjectColor::Purple => "purple",
        }
    }

    /// Accent color as #RRGGBB.
    pub fn hex(self) -> &'static str {
        match self {
            ProjectColor::White => "#FFFFFF",
            ProjectColor::Red => "#EF4444",
            ProjectColor::Blue => "#3B82F6",
            ProjectColor::Yellow => "#EAB308",
            ProjectColor::Green => "#10B981",
            ProjectColor::Purple => "#A855F7",
        }
    }
}

impl fmt::Display for ProjectColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for ProjectColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProjectColor::ALL
            .into_iter()
            .find(|color| color.label() == wanted)
            .ok_or_else(|| {
                format!("unknown color '{s}', expected one of white, red, blue, yellow, green, purple")
            })
    }
}

/// Pick a random theme color from the palette.
pub fn random_color() -> ProjectColor {
    let mut rng = rand::rng();
    ProjectColor::ALL[rng.random_range(0..ProjectColor::ALL.len())]
}
