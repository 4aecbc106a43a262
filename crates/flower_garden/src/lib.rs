//! A garden of flowers on a grid.
//!
//! Pick a flower up with the mouse or a finger, drag it over the beds and let
//! go. It snaps to every free bed it passes and stays on the last one it could
//! reach. Each finished move makes new flowers sprout.
//!
//! | Module | Role |
//! |--------|------|
//! | [`flower`] | Placement, drag state machine and spin/scale animation |
//! | [`board`] | The [`board::Board`] seam and the [`board::GridBoard`] resource |
//! | [`genome`] | Visual traits of a flower |
//! | [`input`] | Unified mouse and touch events |
//! | [`render`] | The [`render::SceneFacade`] seam and drawing math |
//! | [`garden`] | Bevy plugin tying it all together |

use bevy::prelude::*;
use bevy::render::settings::{WgpuSettings, WgpuSettingsPriority};
use bevy::render::RenderPlugin;
use bevy::window::{WindowMode, WindowResolution};

pub mod board;
pub mod cell;
pub mod config;
pub mod flower;
pub mod garden;
pub mod genome;
pub mod input;
pub mod render;

use garden::GardenPlugin;

// typical smartphone screen ratio (9:16)
pub const WINDOW_WIDTH: f32 = 360.0;
pub const WINDOW_HEIGHT: f32 = 640.0;

const BACKGROUND: Color = Color::srgb(0.12, 0.2, 0.1);

pub fn run() -> AppExit {
    let window_plugin = WindowPlugin {
        primary_window: Some(Window {
            title: env!("CARGO_PKG_NAME").to_string(),
            present_mode: bevy::window::PresentMode::Fifo,
            resolution: WindowResolution::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            canvas: Some("#garden".into()),
            fit_canvas_to_parent: true,
            mode: WindowMode::Windowed,
            // Keep browser shortcuts like F5 working
            prevent_default_event_handling: false,
            ..default()
        }),
        ..default()
    };

    let render_plugin = RenderPlugin {
        render_creation: bevy::render::settings::RenderCreation::Automatic(WgpuSettings {
            backends: Some(
                bevy::render::settings::Backends::BROWSER_WEBGPU
                    | bevy::render::settings::Backends::GL,
            ),
            power_preference: bevy::render::settings::PowerPreference::HighPerformance,
            priority: WgpuSettingsPriority::Functionality,
            ..default()
        }),
        ..default()
    };

    App::new()
        .add_plugins(DefaultPlugins.set(window_plugin).set(render_plugin))
        // Saves battery on mobile
        .add_plugins(bevy_framepace::FramepacePlugin)
        .insert_resource(ClearColor(BACKGROUND))
        .add_plugins(GardenPlugin)
        .run()
}
