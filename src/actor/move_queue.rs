//! Deferred window geometry updates.
//!
//! The engine never resizes windows directly. Each render sends one
//! [`WindowMove`] per tiled window and the host drains them from its idle
//! handler, once the compositor has settled.

use tracing::{debug, trace};

use crate::actor::{self, Receiver};
use crate::common::collections::HashMap;
use crate::sys::geometry::Rect;
use crate::sys::window_system::{WindowId, WindowSystem};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowMove {
    pub window: WindowId,
    pub rect: Rect,
}

pub type Sender = actor::Sender<WindowMove>;

pub struct MoveQueue {
    rx: Receiver<WindowMove>,
}

impl MoveQueue {
    pub fn new() -> (Sender, MoveQueue) {
        let (tx, rx) = actor::channel();
        (tx, MoveQueue { rx })
    }

    /// Applies every pending move and returns how many reached the host.
    ///
    /// When a window was moved more than once since the last drain only the
    /// latest rect is applied, in the order the window was first queued.
    pub fn run_idle(&mut self, host: &impl WindowSystem) -> usize {
        let mut order = Vec::new();
        let mut latest: HashMap<WindowId, (tracing::Span, Rect)> = HashMap::default();
        while let Ok((span, mv)) = self.rx.try_recv() {
            if latest.insert(mv.window, (span, mv.rect)).is_none() {
                order.push(mv.window);
            } else {
                trace!(window = ?mv.window, "superseded pending move");
            }
        }
        for wid in &order {
            let Some((span, rect)) = latest.remove(wid) else { continue };
            let _guard = span.enter();
            host.move_resize(*wid, rect);
        }
        if !order.is_empty() {
            debug!(count = order.len(), "applied window moves");
        }
        order.len()
    }

    pub fn is_empty(&self) -> bool { self.rx.is_empty() }
}
