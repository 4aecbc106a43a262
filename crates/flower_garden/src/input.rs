use bevy::prelude::*;

use crate::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    /// Window coordinates.
    pub position: Vec2,
}

/// Mouse and touch input, as seen by a single flower.
///
/// Positions are in window coordinates; the scene facade turns them into scene
/// points.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Enter,
    Leave,
    MouseDown,
    MouseMove { position: Vec2 },
    MouseUp,
    /// All touches on the flower when the gesture began. The first one is tracked.
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { changed: Vec<TouchPoint> },
    TouchEnd { changed: Vec<TouchPoint> },
    TouchCancel { changed: Vec<TouchPoint> },
}

/// What started the current drag. Only follow-up events from the same source
/// reach the drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Mouse,
    Touch(u64),
}

impl DragSource {
    /// The touch in `changed` this drag is following, if any.
    pub fn tracked(self, changed: &[TouchPoint]) -> Option<&TouchPoint> {
        match self {
            Self::Mouse => None,
            Self::Touch(id) => changed.iter().find(|touch| touch.id == id),
        }
    }
}

/// Lives exactly as long as a drag. Dropping it is the unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub source: DragSource,
    pub original_cell: Cell,
}
