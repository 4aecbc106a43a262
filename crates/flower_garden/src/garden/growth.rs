use bevy::prelude::*;

use super::scene::{DrawOrder, GardenScene};
use super::GardenRng;
use crate::board::{BoardEvent, GridBoard};
use crate::cell::Cell;
use crate::config::GardenConfig;
use crate::flower::Flower;
use crate::genome::Genome;

/// Plant up to `count` flowers on random free cells. Returns how many were
/// planted.
pub fn plant_flowers(
    commands: &mut Commands,
    board: &mut GridBoard,
    rng: &mut GardenRng,
    draw_order: &mut DrawOrder,
    count: usize,
) -> usize {
    let mut free = board.empty_cells();
    rng.0.shuffle(&mut free);

    let mut planted = 0;
    for cell in free.into_iter().take(count) {
        let entity = commands.spawn_empty().id();
        if let Err(err) = board.try_set(cell, entity) {
            warn!("Cannot plant at {cell}: {err}");
            commands.entity(entity).despawn();
            continue;
        }
        let genome = Genome::random(&mut rng.0);
        let mut flower = Flower::with_traits(entity, genome, rng.0.fork());
        flower.set_cell(board, cell);
        commands.entity(entity).insert((
            flower,
            draw_order.bring_forward(),
            Name::new(format!("Flower {cell}")),
        ));
        planted += 1;
    }
    planted
}

/// React to the board: after a finished move the moved flower pulses and new
/// ones sprout. Flowers pushed off their cell move to a free one.
pub fn resolve_moves(
    mut commands: Commands,
    config: Res<GardenConfig>,
    board: Option<ResMut<GridBoard>>,
    mut rng: ResMut<GardenRng>,
    mut draw_order: ResMut<DrawOrder>,
    mut flowers: Query<&mut Flower>,
) {
    let Some(mut board) = board else {
        return;
    };

    for event in board.drain_events() {
        match event {
            BoardEvent::MoveResolved { cell, occupant } => {
                info!("Move {} finished at {cell}", board.moves());

                if let Some(mut flower) = occupant.and_then(|entity| flowers.get_mut(entity).ok())
                {
                    flower.pulse();
                }

                let was_full = board.is_full();
                let planted = plant_flowers(
                    &mut commands,
                    &mut board,
                    &mut rng,
                    &mut draw_order,
                    config.flowers_per_move,
                );
                debug!("{planted} flowers sprouted");

                if !was_full && board.is_full() {
                    info!("The garden is full after {} moves", board.moves());
                }
            }
            BoardEvent::Evicted { occupant, cell } => {
                replant_evicted(&mut board, &mut rng, &mut flowers, occupant, cell);
            }
        }
    }
}

fn replant_evicted(
    board: &mut GridBoard,
    rng: &mut GardenRng,
    flowers: &mut Query<&mut Flower>,
    occupant: Entity,
    cell: Cell,
) {
    // Already placed again since
    if board.cell_of(occupant).is_some() {
        return;
    }
    let Ok(mut flower) = flowers.get_mut(occupant) else {
        return;
    };

    match rng.0.choice(board.empty_cells()) {
        Some(target) => {
            info!("{occupant} was pushed off {cell}, moving it to {target}");
            flower.place(board, target);
        }
        None => warn!("No free cell left for {occupant}, pushed off {cell}"),
    }
}

/// Clear the garden and plant a fresh one.
pub fn restart_garden(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    config: Res<GardenConfig>,
    board: Option<ResMut<GridBoard>>,
    mut rng: ResMut<GardenRng>,
    mut draw_order: ResMut<DrawOrder>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut flowers: Query<&mut Flower>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Some(mut board) = board else {
        return;
    };

    info!("Replanting the garden");
    for flower in &flowers {
        board.remove(flower.id());
        // Never drawn, so destroying its visual won't despawn it
        if flower.visual().is_none() {
            commands.entity(flower.id()).despawn_recursive();
        }
    }

    let mut scene = GardenScene::new(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut draw_order,
        None,
    );
    for mut flower in &mut flowers {
        flower.destroy(&mut scene);
    }
    board.drain_events();

    plant_flowers(
        &mut commands,
        &mut board,
        &mut rng,
        &mut draw_order,
        config.initial_flowers,
    );
}
