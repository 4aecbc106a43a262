use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

pub const MIN_PETALS: usize = 5;
pub const MAX_PETALS: usize = 16;

const MIN_CENTER_SIZE: f32 = 3.0;
const MAX_CENTER_SIZE: f32 = 6.0;

// How far an interior gradient stop may wander from its even spacing, in percent
const STOP_JITTER: f32 = 10.0;

/// Read-only source of a flower's visual parameters.
///
/// Queried once when the flower's visuals are created. Nothing in here
/// influences dragging or animation.
pub trait TraitDescriptor: Send + Sync {
    fn petal_count(&self) -> usize;

    /// Colors along a petal, from base to tip.
    fn petal_colors(&self) -> Vec<Color>;

    /// Gradient stop offsets in percent, one per petal color.
    fn petal_gradient_stops(&self) -> Vec<f32>;

    fn center_size(&self) -> f32;

    fn center_color(&self) -> Color;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Palette {
    Sunrise,
    Meadow,
    Lagoon,
    Dusk,
    Frost,
}

impl Palette {
    const fn petals(self) -> [Color; 3] {
        match self {
            Self::Sunrise => [
                Color::srgb(0.98, 0.45, 0.25),
                Color::srgb(1.0, 0.72, 0.3),
                Color::srgb(1.0, 0.93, 0.6),
            ],
            Self::Meadow => [
                Color::srgb(0.55, 0.2, 0.6),
                Color::srgb(0.85, 0.45, 0.8),
                Color::srgb(1.0, 0.85, 0.95),
            ],
            Self::Lagoon => [
                Color::srgb(0.1, 0.35, 0.65),
                Color::srgb(0.3, 0.7, 0.85),
                Color::srgb(0.85, 0.97, 1.0),
            ],
            Self::Dusk => [
                Color::srgb(0.45, 0.1, 0.2),
                Color::srgb(0.85, 0.25, 0.35),
                Color::srgb(1.0, 0.7, 0.65),
            ],
            Self::Frost => [
                Color::srgb(0.75, 0.8, 0.9),
                Color::srgb(0.92, 0.94, 1.0),
                Color::srgb(1.0, 1.0, 1.0),
            ],
        }
    }

    const fn center(self) -> Color {
        match self {
            Self::Sunrise | Self::Frost => Color::srgb(0.95, 0.75, 0.1),
            Self::Meadow | Self::Dusk => Color::srgb(0.4, 0.25, 0.1),
            Self::Lagoon => Color::srgb(1.0, 0.85, 0.3),
        }
    }
}

/// The default trait descriptor: a randomly rolled flower.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    petal_count: usize,
    petal_colors: Vec<Color>,
    gradient_stops: Vec<f32>,
    center_size: f32,
    center_color: Color,
}

impl Genome {
    pub fn new(
        petal_count: usize,
        petal_colors: Vec<Color>,
        gradient_stops: Vec<f32>,
        center_size: f32,
        center_color: Color,
    ) -> Self {
        Self {
            petal_count,
            petal_colors,
            gradient_stops,
            center_size,
            center_color,
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let palette = rng.choice(Palette::iter()).unwrap_or(Palette::Meadow);
        let color_count = rng.usize(2..=3);

        Self {
            petal_count: rng.usize(MIN_PETALS..=MAX_PETALS),
            petal_colors: palette.petals().into_iter().take(color_count).collect(),
            gradient_stops: random_gradient_stops(rng, color_count),
            center_size: rng
                .f32()
                .mul_add(MAX_CENTER_SIZE - MIN_CENTER_SIZE, MIN_CENTER_SIZE),
            center_color: palette.center(),
        }
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::random(&mut fastrand::Rng::new())
    }
}

impl TraitDescriptor for Genome {
    fn petal_count(&self) -> usize {
        self.petal_count
    }

    fn petal_colors(&self) -> Vec<Color> {
        self.petal_colors.clone()
    }

    fn petal_gradient_stops(&self) -> Vec<f32> {
        self.gradient_stops.clone()
    }

    fn center_size(&self) -> f32 {
        self.center_size
    }

    fn center_color(&self) -> Color {
        self.center_color
    }
}

/// First stop at 0%, last at 100%, interior stops jittered around even spacing.
fn random_gradient_stops(rng: &mut fastrand::Rng, count: usize) -> Vec<f32> {
    let last = count.saturating_sub(1);
    (0..count)
        .map(|i| {
            if i == 0 {
                0.0
            } else if i == last {
                100.0
            } else {
                let even = i as f32 * 100.0 / last as f32;
                rng.f32().mul_add(2.0 * STOP_JITTER, even - STOP_JITTER)
            }
        })
        .collect()
}
