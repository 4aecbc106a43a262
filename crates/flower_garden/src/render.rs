use bevy::color::Mix;
use bevy::prelude::*;

use crate::genome::TraitDescriptor;

/// Distance from a flower's center to the middle of each petal.
pub const PETAL_OFFSET: f32 = 10.0;
/// Half the length of a petal along its own axis.
pub const PETAL_HALF_LENGTH: f32 = 10.0;
pub const STROKE_COLOR: Color = Color::srgba(0.27, 0.13, 0.0, 0.4);

/// Handles to everything drawn for one flower.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    /// Root of the flower's visual group. Petals and center hang off it.
    pub root: Entity,
    /// Shared petal shape with the petal gradient baked in.
    pub gradient: Handle<Mesh>,
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GrabStyle {
    #[default]
    Grabbable,
    Grabbed,
}

/// Where and how a flower is drawn this frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FlowerTransform {
    pub translation: Vec2,
    pub scale: f32,
    pub rotation_deg: f32,
}

impl Default for FlowerTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl FlowerTransform {
    /// Translate, then scale, then rotate about the flower's own center.
    ///
    /// Bevy composes `T * R * S`; with a uniform scale that equals `T * S * R`.
    /// Positive degrees turn clockwise on screen.
    pub fn to_transform(self, z: f32) -> Transform {
        Transform::from_translation(self.translation.extend(z))
            .with_rotation(Quat::from_rotation_z(-self.rotation_deg.to_radians()))
            .with_scale(Vec3::splat(self.scale))
    }
}

/// The rendering layer a flower draws itself through.
pub trait SceneFacade {
    /// Build the visual group for the flower owned by `owner`.
    fn create_visual(&mut self, owner: Entity, traits: &dyn TraitDescriptor) -> Visual;

    /// Detach the group and release the gradient.
    fn destroy_visual(&mut self, visual: Visual);

    /// Draw this group above every other one.
    fn bring_to_front(&mut self, visual: &Visual);

    fn set_grab_style(&mut self, visual: &Visual, style: GrabStyle);

    fn apply_transform(&mut self, visual: &Visual, transform: FlowerTransform);

    /// Convert a window position from mouse or touch input to scene coordinates.
    fn to_scene_point(&self, screen: Vec2) -> Option<Vec2>;
}

pub fn petal_half_width(petal_count: usize) -> f32 {
    2.5 + 2.5 * (8.0 / petal_count.max(1) as f32)
}

pub fn petal_angle_deg(index: usize, petal_count: usize) -> f32 {
    index as f32 * 360.0 / petal_count.max(1) as f32
}

/// Order in which petals are attached. Skipping neighbours makes the overlaps
/// look woven rather than stacked.
pub fn petal_draw_order(petal_count: usize) -> Vec<usize> {
    let skip = if petal_count < 12 { 2 } else { 3 };
    (0..skip)
        .flat_map(|start| (start..petal_count).step_by(skip))
        .collect()
}

/// Color at `t` (0 at the petal base, 1 at the tip) of a gradient whose stops
/// are given in percent.
pub fn sample_gradient(colors: &[Color], stops: &[f32], t: f32) -> LinearRgba {
    let percent = t.clamp(0.0, 1.0) * 100.0;
    let stops: Vec<(f32, LinearRgba)> = stops
        .iter()
        .copied()
        .zip(colors.iter().map(Color::to_linear))
        .collect();

    let Some(&(first_offset, first_color)) = stops.first() else {
        return LinearRgba::WHITE;
    };
    if percent <= first_offset {
        return first_color;
    }

    for pair in stops.windows(2) {
        if let [(from, start), (to, end)] = pair {
            if percent <= *to {
                let span = to - from;
                let factor = if span > 0.0 {
                    (percent - from) / span
                } else {
                    1.0
                };
                return start.mix(end, factor);
            }
        }
    }

    stops.last().map_or(first_color, |&(_, color)| color)
}
