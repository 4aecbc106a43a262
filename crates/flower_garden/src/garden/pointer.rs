use std::ops::DerefMut;

use bevy::input::touch::Touch;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::scene::{DrawOrder, GardenScene, MainCamera};
use crate::board::{Board, GridBoard};
use crate::config::GardenConfig;
use crate::flower::Flower;
use crate::input::{PointerEvent, TouchPoint};
use crate::render::SceneFacade;

/// The closest live flower within `radius` of a scene point.
pub fn flower_at<'a>(
    flowers: impl IntoIterator<Item = &'a Flower>,
    point: Vec2,
    radius: f32,
) -> Option<Entity> {
    flowers
        .into_iter()
        .filter(|flower| !flower.is_destroyed())
        .map(|flower| (flower.id(), flower.position().distance(point)))
        .filter(|&(_, distance)| distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// Mouse enter and leave for whichever flower is under the cursor.
pub fn update_hover(
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_q: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    config: Res<GardenConfig>,
    mut flowers: Query<&mut Flower>,
) {
    let hovered = windows
        .get_single()
        .ok()
        .and_then(Window::cursor_position)
        .zip(camera_q.get_single().ok())
        .and_then(|(cursor, (camera, camera_transform))| {
            camera
                .viewport_to_world(camera_transform, cursor)
                .map(|ray| ray.origin.truncate())
                .ok()
        })
        .and_then(|point| flower_at(&flowers, point, config.pick_radius));

    set_hovered(&mut flowers, hovered);
}

/// Enter `hovered`, leave every other flower that was hovered.
pub fn set_hovered<F: DerefMut<Target = Flower>>(
    flowers: impl IntoIterator<Item = F>,
    hovered: Option<Entity>,
) {
    for mut flower in flowers {
        let under_cursor = hovered == Some(flower.id());
        if under_cursor && !flower.is_hovered() {
            flower.on_pointer_enter();
        } else if !under_cursor && flower.is_hovered() {
            flower.on_pointer_leave();
        }
    }
}

/// One frame of mouse and touch input, in window coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerInput {
    pub cursor: Option<Vec2>,
    pub mouse_pressed: bool,
    pub mouse_released: bool,
    pub touches_started: Vec<TouchPoint>,
    /// Every touch still down, moved or not.
    pub touches_held: Vec<TouchPoint>,
    pub touches_ended: Vec<TouchPoint>,
    pub touches_cancelled: Vec<TouchPoint>,
}

impl PointerInput {
    pub fn read(
        buttons: &ButtonInput<MouseButton>,
        touches: &Touches,
        cursor: Option<Vec2>,
    ) -> Self {
        Self {
            cursor,
            mouse_pressed: buttons.just_pressed(MouseButton::Left),
            mouse_released: buttons.just_released(MouseButton::Left),
            touches_started: touches.iter_just_pressed().map(touch_point).collect(),
            touches_held: touches.iter().map(touch_point).collect(),
            touches_ended: touches.iter_just_released().map(touch_point).collect(),
            touches_cancelled: touches.iter_just_canceled().map(touch_point).collect(),
        }
    }

    /// Moves, drops and cancels, in that order.
    fn drag_events(&self) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        if let Some(position) = self.cursor {
            events.push(PointerEvent::MouseMove { position });
        }
        if !self.touches_held.is_empty() {
            events.push(PointerEvent::TouchMove {
                changed: self.touches_held.clone(),
            });
        }
        if self.mouse_released {
            events.push(PointerEvent::MouseUp);
        }
        if !self.touches_ended.is_empty() {
            events.push(PointerEvent::TouchEnd {
                changed: self.touches_ended.clone(),
            });
        }
        if !self.touches_cancelled.is_empty() {
            events.push(PointerEvent::TouchCancel {
                changed: self.touches_cancelled.clone(),
            });
        }
        events
    }
}

/// Turn this frame's mouse and touch input into [`PointerEvent`]s.
pub fn route_pointer_input(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    camera_q: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    config: Res<GardenConfig>,
    board: Option<ResMut<GridBoard>>,
    mut draw_order: ResMut<DrawOrder>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut query: Query<&mut Flower>,
) {
    let Some(mut board) = board else {
        return;
    };
    let cursor = windows.get_single().ok().and_then(Window::cursor_position);
    let input = PointerInput::read(&buttons, &touches, cursor);
    let mut scene = GardenScene::new(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut draw_order,
        camera_q.get_single().ok(),
    );

    let mut flowers: Vec<Mut<Flower>> = query.iter_mut().collect();
    dispatch_pointer_input(
        &input,
        flowers.as_mut_slice(),
        &mut *board,
        &mut scene,
        config.pick_radius,
    );
}

/// Presses go to the flower under the pointer. Everything after that goes to
/// flowers with a drag in progress, which pick out the events of their own
/// drag.
pub fn dispatch_pointer_input<F: DerefMut<Target = Flower>>(
    input: &PointerInput,
    flowers: &mut [F],
    board: &mut impl Board,
    scene: &mut impl SceneFacade,
    pick_radius: f32,
) {
    if input.mouse_pressed {
        if let Some(point) = input.cursor.and_then(|cursor| scene.to_scene_point(cursor)) {
            press(flowers, point, &PointerEvent::MouseDown, board, scene, pick_radius);
        }
    }
    for &touch in &input.touches_started {
        if let Some(point) = scene.to_scene_point(touch.position) {
            let start = PointerEvent::TouchStart {
                touches: vec![touch],
            };
            press(flowers, point, &start, board, scene, pick_radius);
        }
    }

    for event in input.drag_events() {
        for flower in flowers.iter_mut() {
            if flower.is_dragging() {
                flower.handle_pointer(&event, board, scene);
            }
        }
    }
}

fn press<F: DerefMut<Target = Flower>>(
    flowers: &mut [F],
    point: Vec2,
    event: &PointerEvent,
    board: &mut impl Board,
    scene: &mut impl SceneFacade,
    pick_radius: f32,
) {
    let candidates = flowers.iter().map(|flower| &**flower);
    let Some(target) = flower_at(candidates, point, pick_radius) else {
        return;
    };
    if let Some(flower) = flowers.iter_mut().find(|flower| flower.id() == target) {
        flower.handle_pointer(event, board, scene);
    }
}

fn touch_point(touch: &Touch) -> TouchPoint {
    TouchPoint {
        id: touch.id(),
        position: touch.position(),
    }
}
