use bevy::color::ColorToComponents;
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

use crate::genome::TraitDescriptor;
use crate::render::{
    petal_angle_deg, petal_draw_order, petal_half_width, sample_gradient, FlowerTransform,
    GrabStyle, SceneFacade, Visual, PETAL_HALF_LENGTH, PETAL_OFFSET, STROKE_COLOR,
};

// Depth between consecutive petals inside one flower
const PETAL_Z_STEP: f32 = 0.01;
// Depth between flowers. Must exceed everything drawn inside one flower.
const DRAW_LAYER_STEP: f32 = 1.0;
// Camera2d sees z up to 1000, less the depth of one flower
const MAX_DRAW_LAYER: f32 = 900.0;
const COMPACT_DRAW_LAYERS_AT: f32 = 500.0;
const STROKE_WIDTH: f32 = 0.6;
const HALO_RADIUS: f32 = 24.0;
const HALO_COLOR: Color = Color::srgba(1.0, 1.0, 0.85, 0.25);

#[derive(Component)]
pub struct MainCamera;

/// Highlight drawn under a flower while it is held.
#[derive(Component)]
pub struct GrabHalo;

/// Depth of a flower's visual group. Higher is drawn on top.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawLayer(pub f32);

#[derive(Resource, Debug, Default)]
pub struct DrawOrder {
    top: f32,
}

impl DrawOrder {
    /// A layer above every layer handed out so far.
    ///
    /// Layers stop growing at the camera's far plane; [`compact_draw_layers`]
    /// renumbers them long before that.
    pub fn bring_forward(&mut self) -> DrawLayer {
        self.top = (self.top + DRAW_LAYER_STEP).min(MAX_DRAW_LAYER);
        DrawLayer(self.top)
    }

    pub fn needs_compaction(&self) -> bool {
        self.top >= COMPACT_DRAW_LAYERS_AT
    }

    /// Renumber `layers` from the bottom up, keeping their order.
    pub fn compact<'a>(&mut self, layers: impl IntoIterator<Item = &'a mut DrawLayer>) {
        let mut layers: Vec<&mut DrawLayer> = layers.into_iter().collect();
        layers.sort_by(|a, b| a.0.total_cmp(&b.0));

        self.top = 0.0;
        for layer in layers {
            self.top += DRAW_LAYER_STEP;
            layer.0 = self.top;
        }
    }
}

/// The Bevy side of [`SceneFacade`], borrowed for the length of one system.
pub struct GardenScene<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<ColorMaterial>,
    draw_order: &'a mut DrawOrder,
    camera: Option<(&'a Camera, &'a GlobalTransform)>,
}

impl<'a, 'w, 's> GardenScene<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        meshes: &'a mut Assets<Mesh>,
        materials: &'a mut Assets<ColorMaterial>,
        draw_order: &'a mut DrawOrder,
        camera: Option<(&'a Camera, &'a GlobalTransform)>,
    ) -> Self {
        Self {
            commands,
            meshes,
            materials,
            draw_order,
            camera,
        }
    }
}

impl SceneFacade for GardenScene<'_, '_, '_> {
    fn create_visual(&mut self, owner: Entity, traits: &dyn TraitDescriptor) -> Visual {
        let petal_count = traits.petal_count().max(1);
        let half_width = petal_half_width(petal_count);

        let gradient = self.meshes.add(petal_mesh(
            half_width,
            PETAL_HALF_LENGTH,
            &traits.petal_colors(),
            &traits.petal_gradient_stops(),
        ));
        let outline = self.meshes.add(Ellipse::new(
            half_width + STROKE_WIDTH,
            PETAL_HALF_LENGTH + STROKE_WIDTH,
        ));
        let center = self.meshes.add(Circle::new(traits.center_size()));
        let center_outline = self
            .meshes
            .add(Circle::new(traits.center_size() + STROKE_WIDTH));
        let halo = self.meshes.add(Circle::new(HALO_RADIUS));

        // Vertex colors carry the gradient, so the petal material stays white
        let petal_material = self.materials.add(ColorMaterial::from(Color::WHITE));
        let stroke_material = self.materials.add(ColorMaterial::from(STROKE_COLOR));
        let center_material = self
            .materials
            .add(ColorMaterial::from(traits.center_color()));
        let halo_material = self.materials.add(ColorMaterial::from(HALO_COLOR));

        let order = petal_draw_order(petal_count);
        let top = order.len() as f32 * PETAL_Z_STEP;

        self.commands
            .entity(owner)
            .insert((
                Transform::default(),
                Visibility::default(),
                FlowerTransform::default(),
                GrabStyle::default(),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh2d(halo),
                    MeshMaterial2d(halo_material),
                    Transform::from_xyz(0.0, 0.0, -PETAL_Z_STEP),
                    Visibility::Hidden,
                    GrabHalo,
                ));

                for (layer, index) in order.into_iter().enumerate() {
                    let rotation =
                        Quat::from_rotation_z(-petal_angle_deg(index, petal_count).to_radians());
                    let offset = Vec3::new(0.0, PETAL_OFFSET, (layer + 1) as f32 * PETAL_Z_STEP);
                    parent
                        .spawn((
                            Mesh2d(gradient.clone()),
                            MeshMaterial2d(petal_material.clone()),
                            Transform::from_translation(rotation * offset).with_rotation(rotation),
                        ))
                        .with_child((
                            Mesh2d(outline.clone()),
                            MeshMaterial2d(stroke_material.clone()),
                            Transform::from_xyz(0.0, 0.0, -PETAL_Z_STEP / 2.0),
                        ));
                }

                parent.spawn((
                    Mesh2d(center_outline),
                    MeshMaterial2d(stroke_material.clone()),
                    Transform::from_xyz(0.0, 0.0, top + PETAL_Z_STEP),
                ));
                parent.spawn((
                    Mesh2d(center),
                    MeshMaterial2d(center_material),
                    Transform::from_xyz(0.0, 0.0, top + 2.0 * PETAL_Z_STEP),
                ));
            });

        Visual {
            root: owner,
            gradient,
        }
    }

    fn destroy_visual(&mut self, visual: Visual) {
        self.meshes.remove(visual.gradient.id());
        self.commands.entity(visual.root).despawn_recursive();
    }

    fn bring_to_front(&mut self, visual: &Visual) {
        let layer = self.draw_order.bring_forward();
        self.commands.entity(visual.root).insert(layer);
    }

    fn set_grab_style(&mut self, visual: &Visual, style: GrabStyle) {
        self.commands.entity(visual.root).insert(style);
    }

    fn apply_transform(&mut self, visual: &Visual, transform: FlowerTransform) {
        self.commands.entity(visual.root).insert(transform);
    }

    fn to_scene_point(&self, screen: Vec2) -> Option<Vec2> {
        let (camera, camera_transform) = self.camera?;
        camera
            .viewport_to_world(camera_transform, screen)
            .map(|ray| ray.origin.truncate())
            .ok()
    }
}

/// Petal ellipse with the gradient baked into its vertex colors, base at the
/// bottom and tip at the top.
pub fn petal_mesh(half_width: f32, half_length: f32, colors: &[Color], stops: &[f32]) -> Mesh {
    let mut mesh = Mesh::from(Ellipse::new(half_width, half_length));

    let vertex_colors: Option<Vec<[f32; 4]>> = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) => Some(
            positions
                .iter()
                .map(|&[_, y, _]| {
                    let t = (y + half_length) / (2.0 * half_length);
                    sample_gradient(colors, stops, t).to_f32_array()
                })
                .collect(),
        ),
        _ => None,
    };

    match vertex_colors {
        Some(vertex_colors) => mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, vertex_colors),
        None => warn!("Petal mesh has no positions, drawing it without a gradient"),
    }
    mesh
}

/// Show the halo of held flowers only.
pub fn show_grab_halo(
    flowers: Query<(&GrabStyle, &Children), Changed<GrabStyle>>,
    mut halos: Query<&mut Visibility, With<GrabHalo>>,
) {
    for (style, children) in &flowers {
        for &child in children.iter() {
            if let Ok(mut visibility) = halos.get_mut(child) {
                *visibility = match style {
                    GrabStyle::Grabbed => Visibility::Inherited,
                    GrabStyle::Grabbable => Visibility::Hidden,
                };
            }
        }
    }
}

pub fn compact_draw_layers(mut draw_order: ResMut<DrawOrder>, mut query: Query<&mut DrawLayer>) {
    if !draw_order.needs_compaction() {
        return;
    }
    let mut layers: Vec<Mut<DrawLayer>> = query.iter_mut().collect();
    draw_order.compact(layers.iter_mut().map(|layer| &mut **layer));
    debug!("Draw layers compacted to {}", layers.len());
}

pub fn sync_transforms(
    mut flowers: Query<
        (&FlowerTransform, &DrawLayer, &mut Transform),
        Or<(Changed<FlowerTransform>, Changed<DrawLayer>)>,
    >,
) {
    for (pose, layer, mut transform) in &mut flowers {
        *transform = pose.to_transform(layer.0);
    }
}
