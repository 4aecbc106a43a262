use bevy::prelude::*;

mod growth;
mod pointer;
mod scene;

pub use growth::plant_flowers;
use growth::{resolve_moves, restart_garden};
pub use pointer::{dispatch_pointer_input, flower_at, set_hovered, PointerInput};
use pointer::{route_pointer_input, update_hover};
pub use scene::{DrawLayer, DrawOrder, GardenScene, GrabHalo, MainCamera};
use scene::{compact_draw_layers, show_grab_halo, sync_transforms};

use crate::board::Board;
use crate::cell::Cell;
use crate::config::GardenConfig;
use crate::flower::Flower;

const BED_COLOR: Color = Color::srgb(0.25, 0.17, 0.1);
// Gap between neighbouring flower beds
const BED_GAP: f32 = 4.0;
const BED_Z: f32 = -10.0;

/// Random source shared by everything planted in the garden.
#[derive(Resource)]
pub struct GardenRng(pub fastrand::Rng);

impl Default for GardenRng {
    fn default() -> Self {
        Self(fastrand::Rng::new())
    }
}

/// The patch of soil under one cell.
#[derive(Component)]
pub struct FlowerBed;

pub struct GardenPlugin;

impl Plugin for GardenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GardenConfig>()
            .init_resource::<GardenRng>()
            .init_resource::<DrawOrder>()
            .add_systems(Startup, setup_garden)
            .add_systems(
                Update,
                (
                    restart_garden,
                    update_hover,
                    route_pointer_input,
                    resolve_moves,
                    tick_flowers,
                    show_grab_halo,
                    compact_draw_layers,
                    sync_transforms,
                )
                    .chain(),
            );
    }
}

fn setup_garden(
    mut commands: Commands,
    config: Res<GardenConfig>,
    mut rng: ResMut<GardenRng>,
    mut draw_order: ResMut<DrawOrder>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let mut board = match config.board() {
        Ok(board) => board,
        Err(err) => {
            error!("Cannot set up the garden: {err}");
            return;
        }
    };
    if let Some(seed) = config.seed {
        rng.0.seed(seed);
    }

    commands.spawn((Camera2d, MainCamera));

    let bed_side = (board.cell_size() - BED_GAP).max(1.0);
    let bed_mesh = meshes.add(Rectangle::new(bed_side, bed_side));
    let bed_material = materials.add(ColorMaterial::from(BED_COLOR));
    for y in 0..board.rows() as i32 {
        for x in 0..board.columns() as i32 {
            let center = board.center(Cell::new(x, y));
            commands.spawn((
                Mesh2d(bed_mesh.clone()),
                MeshMaterial2d(bed_material.clone()),
                Transform::from_translation(center.extend(BED_Z)),
                FlowerBed,
            ));
        }
    }

    let planted = plant_flowers(
        &mut commands,
        &mut board,
        &mut rng,
        &mut draw_order,
        config.initial_flowers,
    );
    info!(
        "Garden of {}x{} cells planted with {planted} flowers",
        board.columns(),
        board.rows()
    );
    commands.insert_resource(board);
}

/// Advance every flower by this frame's time.
fn tick_flowers(
    mut commands: Commands,
    time: Res<Time>,
    mut draw_order: ResMut<DrawOrder>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut flowers: Query<&mut Flower>,
) {
    let delta_ms = time.delta_secs() * 1000.0;
    let mut scene = GardenScene::new(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut draw_order,
        None,
    );
    for mut flower in &mut flowers {
        flower.render(delta_ms, &mut scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GridBoard;

    fn test_app(config: GardenConfig) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<ColorMaterial>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<Touches>()
            .insert_resource(config)
            .add_plugins(GardenPlugin);
        app
    }

    fn seeded() -> GardenConfig {
        GardenConfig {
            seed: Some(5),
            ..default()
        }
    }

    fn flowers(app: &mut App) -> Vec<(Entity, Option<Cell>, f32)> {
        let mut query = app.world_mut().query::<&Flower>();
        query
            .iter(app.world())
            .map(|flower| (flower.id(), flower.current_cell(), flower.scale()))
            .collect()
    }

    /// Every occupied cell belongs to a live flower that agrees where it is.
    fn assert_board_consistent(app: &mut App) {
        let live = flowers(app);
        let board = app.world().resource::<GridBoard>();
        let taken = (board.columns() * board.rows()) as usize - board.empty_cells().len();
        assert_eq!(taken, live.len(), "one cell per flower");
        for (entity, cell, _) in live {
            let cell = cell.expect("planted flowers have a cell");
            assert_eq!(board.get(cell), Some(entity), "board and flower agree on {cell}");
        }
    }

    #[test]
    fn startup_plants_initial_flowers() {
        let mut app = test_app(seeded());
        app.update();

        assert_eq!(flowers(&mut app).len(), 6, "initial flowers planted");
        assert_board_consistent(&mut app);
    }

    #[test]
    fn first_frame_builds_flower_visuals() {
        let mut app = test_app(seeded());
        app.update();
        app.update();

        let mut query = app.world_mut().query::<(&Flower, &Children)>();
        let drawn = query.iter(app.world()).count();
        assert_eq!(drawn, 6, "every flower got its petals");
    }

    #[test]
    fn resolved_move_pulses_and_sprouts() {
        let mut app = test_app(seeded());
        app.update();

        let (mover, cell, _) = flowers(&mut app)
            .into_iter()
            .next()
            .expect("a flower was planted");
        let cell = cell.expect("planted flowers have a cell");
        app.world_mut()
            .resource_mut::<GridBoard>()
            .resolve_move_at(cell);
        app.update();

        let after = flowers(&mut app);
        assert_eq!(after.len(), 9, "three flowers sprouted");
        let scale = after
            .iter()
            .find(|(entity, ..)| *entity == mover)
            .map(|&(.., scale)| scale)
            .expect("mover still planted");
        assert!(scale > 1.0, "moved flower pulses, got {scale}");
        assert_board_consistent(&mut app);
    }

    #[test]
    fn sprouting_stops_when_the_garden_is_full() {
        let mut app = test_app(GardenConfig {
            columns: 2,
            rows: 2,
            initial_flowers: 3,
            ..seeded()
        });
        app.update();

        let cell = flowers(&mut app)
            .first()
            .and_then(|&(_, cell, _)| cell)
            .expect("a flower was planted");
        app.world_mut()
            .resource_mut::<GridBoard>()
            .resolve_move_at(cell);
        app.update();

        assert_eq!(flowers(&mut app).len(), 4, "only the free cell was filled");
        assert!(app.world().resource::<GridBoard>().is_full(), "garden full");
    }

    #[test]
    fn pushed_flower_moves_to_a_free_cell() {
        let mut app = test_app(seeded());
        app.update();

        let planted = flowers(&mut app);
        let (pusher, ..) = planted.first().copied().expect("a flower was planted");
        let (pushed, taken, _) = planted.get(1).copied().expect("a second flower");
        let taken = taken.expect("planted flowers have a cell");

        // Force one flower onto another's cell, as a cancelled drag does
        app.world_mut()
            .resource_scope(|world, mut board: Mut<GridBoard>| {
                if let Some(mut flower) = world.get_mut::<Flower>(pusher) {
                    flower.place(&mut *board, taken);
                }
            });
        app.update();

        let after = flowers(&mut app);
        assert_eq!(after.len(), planted.len(), "nobody lost or sprouted");
        let moved_to = after
            .iter()
            .find(|(entity, ..)| *entity == pushed)
            .and_then(|&(_, cell, _)| cell)
            .expect("pushed flower still planted");
        assert_ne!(moved_to, taken, "pushed flower found another cell");
        assert_board_consistent(&mut app);
    }

    #[test]
    fn raised_layers_are_compacted() {
        let mut app = test_app(seeded());
        app.update();

        for _ in 0..2_000 {
            app.world_mut().resource_mut::<DrawOrder>().bring_forward();
        }
        app.update();

        let count = flowers(&mut app).len() as f32;
        let mut query = app.world_mut().query::<&DrawLayer>();
        for layer in query.iter(app.world()) {
            assert!(
                layer.0 > 0.0 && layer.0 <= count,
                "layer {} should be renumbered into 1..={count}",
                layer.0
            );
        }
    }

    #[test]
    fn restart_replants_a_consistent_garden() {
        let mut app = test_app(seeded());
        app.update();
        app.update();
        let before: Vec<Entity> = flowers(&mut app).iter().map(|&(e, ..)| e).collect();

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyR);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear();
        app.update();

        let after = flowers(&mut app);
        assert_eq!(after.len(), 6, "fresh garden planted");
        assert!(
            after.iter().all(|(entity, ..)| !before.contains(entity)),
            "old flowers are gone"
        );
        assert_board_consistent(&mut app);
    }

    #[test]
    fn invalid_config_leaves_no_board() {
        let mut app = test_app(GardenConfig {
            columns: 0,
            ..seeded()
        });
        app.update();

        assert!(
            app.world().get_resource::<GridBoard>().is_none(),
            "no board without a valid config"
        );
        assert!(flowers(&mut app).is_empty(), "nothing planted");
    }
}
