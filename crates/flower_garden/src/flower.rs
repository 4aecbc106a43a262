//! A single flower on the board.
//!
//! The flower owns its placement, its spin and scale animation and the drag
//! state machine that mouse and touch input share:
//!
//! ```text
//! Idle --start--> Dragging --drop--> Idle   (resolves a move if the cell changed)
//!                          --cancel--> Idle (snaps back, no move)
//! ```

use bevy::prelude::*;

use crate::board::Board;
use crate::cell::Cell;
use crate::genome::{Genome, TraitDescriptor};
use crate::input::{DragSession, DragSource, PointerEvent};
use crate::render::{FlowerTransform, GrabStyle, SceneFacade, Visual};

/// Spin speed while hovered or dragged. The sign is rerolled per hover.
pub const MAX_RPM: f32 = 60.0;
/// Scale a flower spawns at before growing in.
pub const SPAWN_SCALE: f32 = 0.1;
/// Scale a pulse jumps to before settling back.
pub const PULSE_SCALE: f32 = 1.2;

// Milliseconds to grow by a scale of 1 when spawning
const GROW_MS: f32 = 200.0;
// Milliseconds to shrink by a scale of 1 after a pulse
const SHRINK_MS: f32 = 1000.0;
// Fraction of the gap to the target spin closed each frame
const SPIN_UP_DIVISOR: f32 = 3.0;
const SPIN_DECAY: f32 = 0.9;
// Below this the spin snaps to a stop
const SPIN_STOP_RPM: f32 = 0.5;
const MS_PER_MINUTE: f32 = 60_000.0;

#[derive(Component)]
pub struct Flower {
    id: Entity,
    traits: Box<dyn TraitDescriptor>,
    rng: fastrand::Rng,
    visual: Option<Visual>,
    destroyed: bool,
    position: Vec2,
    rotation_deg: f32,
    rpm: f32,
    max_rpm: f32,
    scale: f32,
    hovered: bool,
    current_cell: Option<Cell>,
    drag: Option<DragSession>,
    dirty: bool,
}

impl Flower {
    /// A flower with a freshly rolled [`Genome`].
    pub fn new(id: Entity) -> Self {
        Self::with_traits(id, Genome::default(), fastrand::Rng::new())
    }

    /// `rng` decides the spin direction of each hover.
    pub fn with_traits(
        id: Entity,
        traits: impl TraitDescriptor + 'static,
        rng: fastrand::Rng,
    ) -> Self {
        Self {
            id,
            traits: Box::new(traits),
            rng,
            visual: None,
            destroyed: false,
            position: Vec2::ZERO,
            rotation_deg: 0.0,
            rpm: MAX_RPM,
            max_rpm: MAX_RPM,
            scale: SPAWN_SCALE,
            hovered: false,
            current_cell: None,
            drag: None,
            dirty: true,
        }
    }

    /// Override the starting spin.
    #[must_use]
    pub fn with_spin(mut self, rpm: f32, max_rpm: f32) -> Self {
        self.rpm = rpm;
        self.max_rpm = max_rpm;
        self
    }

    /// Override the starting scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub const fn id(&self) -> Entity {
        self.id
    }

    pub fn traits(&self) -> &dyn TraitDescriptor {
        self.traits.as_ref()
    }

    pub const fn position(&self) -> Vec2 {
        self.position
    }

    pub const fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    pub const fn rpm(&self) -> f32 {
        self.rpm
    }

    pub const fn max_rpm(&self) -> f32 {
        self.max_rpm
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }

    pub const fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub const fn visual(&self) -> Option<&Visual> {
        self.visual.as_ref()
    }

    pub const fn current_cell(&self) -> Option<Cell> {
        self.current_cell
    }

    /// Cell the current drag started from.
    pub fn original_cell(&self) -> Option<Cell> {
        self.drag.map(|session| session.original_cell)
    }

    pub fn drag_source(&self) -> Option<DragSource> {
        self.drag.map(|session| session.source)
    }

    /// Sit at `cell`'s center. The board's occupancy is not touched.
    pub fn set_cell(&mut self, board: &impl Board, cell: Cell) {
        self.current_cell = Some(cell);
        self.position = board.center(cell);
        self.dirty = true;
    }

    /// Claim `cell` on the board and move there.
    pub fn place(&mut self, board: &mut impl Board, cell: Cell) {
        board.set(cell, self.id);
        self.set_cell(board, cell);
    }

    pub fn on_pointer_enter(&mut self) {
        self.hovered = true;
        if self.rpm == 0.0 {
            self.max_rpm = if self.rng.bool() { MAX_RPM } else { -MAX_RPM };
        }
        self.dirty = true;
    }

    pub fn on_pointer_leave(&mut self) {
        self.hovered = false;
    }

    /// Feed one input event through the drag state machine.
    ///
    /// Returns whether the flower acted on it.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        board: &mut impl Board,
        scene: &mut impl SceneFacade,
    ) -> bool {
        match event {
            PointerEvent::Enter => {
                self.on_pointer_enter();
                true
            }
            PointerEvent::Leave => {
                self.on_pointer_leave();
                true
            }
            PointerEvent::MouseDown => self.on_drag_start(DragSource::Mouse, scene),
            PointerEvent::MouseMove { position } => {
                if self.drag_source() != Some(DragSource::Mouse) {
                    return false;
                }
                self.on_drag_move(*position, board, scene);
                true
            }
            PointerEvent::MouseUp => {
                if self.drag_source() != Some(DragSource::Mouse) {
                    return false;
                }
                self.on_drag_drop(board, scene);
                true
            }
            PointerEvent::TouchStart { touches } => {
                let Some(first) = touches.first() else {
                    return false;
                };
                self.on_drag_start(DragSource::Touch(first.id), scene)
            }
            PointerEvent::TouchMove { changed } => {
                let Some(touch) = self.drag_source().and_then(|s| s.tracked(changed)) else {
                    return false;
                };
                self.on_drag_move(touch.position, board, scene);
                true
            }
            PointerEvent::TouchEnd { changed } => {
                if self.drag_source().and_then(|s| s.tracked(changed)).is_none() {
                    return false;
                }
                self.on_drag_drop(board, scene);
                true
            }
            PointerEvent::TouchCancel { changed } => {
                if self.drag_source().and_then(|s| s.tracked(changed)).is_none() {
                    return false;
                }
                self.on_drag_cancel(board, scene);
                true
            }
        }
    }

    /// Pick the flower up. Ignored while a drag is already running or before
    /// the flower has a cell.
    pub fn on_drag_start(&mut self, source: DragSource, scene: &mut impl SceneFacade) -> bool {
        if self.destroyed || self.is_dragging() {
            return false;
        }
        let Some(original_cell) = self.current_cell else {
            warn!("{} picked up before it was placed", self.id);
            return false;
        };

        self.drag = Some(DragSession {
            source,
            original_cell,
        });
        if let Some(visual) = &self.visual {
            scene.set_grab_style(visual, GrabStyle::Grabbed);
            scene.bring_to_front(visual);
        }
        self.dirty = true;
        debug!("{} picked up from {original_cell} by {source:?}", self.id);
        true
    }

    /// Snap to the cell under `screen` when it is a different, free cell on
    /// the board. Otherwise stay on the last cell snapped to.
    pub fn on_drag_move(&mut self, screen: Vec2, board: &mut impl Board, scene: &impl SceneFacade) {
        if !self.is_dragging() {
            return;
        }
        let Some(point) = scene.to_scene_point(screen) else {
            return;
        };

        let target = board.cell_from_point(point);
        if self.current_cell == Some(target) {
            return;
        }
        if !board.is_in_bounds(target) {
            trace!("{} stays put: {target} is off the board", self.id);
            return;
        }
        if let Some(occupant) = board.get(target) {
            trace!("{} stays put: {target} is taken by {occupant}", self.id);
            return;
        }

        self.place(board, target);
    }

    /// Let go. A drop on a new cell is reported to the board as a move.
    pub fn on_drag_drop(&mut self, board: &mut impl Board, scene: &mut impl SceneFacade) {
        let Some(session) = self.end_drag(scene) else {
            return;
        };

        match self.current_cell {
            Some(cell) if cell != session.original_cell => {
                debug!("{} dropped on {cell}", self.id);
                board.resolve_move_at(cell);
            }
            _ => debug!("{} dropped where it started", self.id),
        }
    }

    /// Abandon the drag and put the flower back where it started, without
    /// making a move.
    pub fn on_drag_cancel(&mut self, board: &mut impl Board, scene: &mut impl SceneFacade) {
        let Some(session) = self.end_drag(scene) else {
            return;
        };

        debug!("{} drag cancelled, back to {}", self.id, session.original_cell);
        self.place(board, session.original_cell);
    }

    fn end_drag(&mut self, scene: &mut impl SceneFacade) -> Option<DragSession> {
        let session = self.drag.take()?;
        if let Some(visual) = &self.visual {
            scene.set_grab_style(visual, GrabStyle::Grabbable);
        }
        self.dirty = true;
        Some(session)
    }

    /// Swell briefly, then ease back to normal size.
    pub fn pulse(&mut self) {
        self.scale = PULSE_SCALE;
        self.dirty = true;
    }

    /// Step the scale and spin by `delta_ms` milliseconds.
    ///
    /// Returns whether anything visible changed.
    pub fn animate(&mut self, delta_ms: f32) -> bool {
        let delta_ms = delta_ms.max(0.0);
        let mut changed = false;

        if self.scale < 1.0 {
            self.scale = (self.scale + delta_ms / GROW_MS).min(1.0);
            changed = true;
        } else if self.scale > 1.0 {
            self.scale = (self.scale - delta_ms / SHRINK_MS).max(1.0);
            changed = true;
        }

        // Per-frame filter, independent of delta
        if self.hovered || self.is_dragging() {
            self.rpm += (self.max_rpm - self.rpm) / SPIN_UP_DIVISOR;
        } else {
            self.rpm *= SPIN_DECAY;
            if self.rpm.abs() < SPIN_STOP_RPM {
                self.rpm = 0.0;
            }
        }

        if self.rpm != 0.0 {
            let rotations = self.rpm * delta_ms / MS_PER_MINUTE;
            self.rotation_deg = 360.0f32
                .mul_add(rotations, self.rotation_deg)
                .rem_euclid(360.0);
            changed = true;
        }

        self.dirty |= changed;
        changed
    }

    pub const fn transform(&self) -> FlowerTransform {
        FlowerTransform {
            translation: self.position,
            scale: self.scale,
            rotation_deg: self.rotation_deg,
        }
    }

    /// Advance one frame and push the result to the scene.
    ///
    /// The first call builds the flower's visuals.
    pub fn render(&mut self, delta_ms: f32, scene: &mut impl SceneFacade) {
        if self.destroyed {
            return;
        }
        if self.visual.is_none() {
            let visual = scene.create_visual(self.id, self.traits.as_ref());
            let style = if self.is_dragging() {
                GrabStyle::Grabbed
            } else {
                GrabStyle::Grabbable
            };
            scene.set_grab_style(&visual, style);
            self.visual = Some(visual);
            self.dirty = true;
        }

        self.animate(delta_ms);

        if self.dirty {
            if let Some(visual) = &self.visual {
                scene.apply_transform(visual, self.transform());
            }
            self.dirty = false;
        }
    }

    /// Tear down the visuals. The flower does nothing afterwards.
    pub fn destroy(&mut self, scene: &mut impl SceneFacade) {
        if let Some(visual) = self.visual.take() {
            scene.destroy_visual(visual);
        }
        self.drag = None;
        self.destroyed = true;
    }
}
