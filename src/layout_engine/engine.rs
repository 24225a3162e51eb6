use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::actor::move_queue::{self, MoveQueue};
use crate::common::config::Settings;
use crate::layout_engine::render::RenderOutcome;
use crate::layout_engine::{Direction, LayoutKind, LayoutTree, Orientation};
use crate::sys::geometry::Point;
use crate::sys::window_system::{WindowId, WindowSystem};

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Focus(Direction),
    Move(Direction),
    Swap(Direction),
    Split {
        orientation: Orientation,
        #[serde(default)]
        force: bool,
    },
    ToggleLayout(LayoutKind),
    ToggleOrientation,
    ToggleFloat,
    Resize {
        direction: Direction,
        amount: f64,
    },
}

/// Notifications from the host about windows, workspaces and monitors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    WindowAdded(WindowId),
    WindowRemoved(WindowId),
    WindowFocused(WindowId),
    /// Minimizing or restoring changes which windows are tiled.
    WindowMinimizeChanged(WindowId),
    GrabBegin(WindowId),
    GrabEnd(WindowId),
    PointerMoved { window: WindowId, position: Point },
    WorkspaceAdded { index: u32, monitors: u32 },
    WorkspaceRemoved(u32),
    MonitorsChanged { workspaces: u32, monitors: u32 },
}

#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventResponse {
    pub focus_window: Option<WindowId>,
    /// Whether the tree changed and a render was run.
    pub changed: bool,
}

/// Owns the layout tree and turns host events and user commands into tree
/// mutations followed by a render.
pub struct LayoutEngine {
    tree: LayoutTree,
    focused_window: Option<WindowId>,
    last_render: RenderOutcome,
}

impl LayoutEngine {
    /// Creates an engine whose window moves are drained from the returned
    /// queue.
    pub fn new(settings: Settings) -> (LayoutEngine, MoveQueue) {
        let (tx, queue) = MoveQueue::new();
        (Self::with_sender(settings, tx), queue)
    }

    pub fn with_sender(settings: Settings, moves: move_queue::Sender) -> LayoutEngine {
        LayoutEngine {
            tree: LayoutTree::new(settings, moves),
            focused_window: None,
            last_render: RenderOutcome::default(),
        }
    }

    pub fn tree(&self) -> &LayoutTree { &self.tree }

    pub fn tree_mut(&mut self) -> &mut LayoutTree { &mut self.tree }

    pub fn focused_window(&self) -> Option<WindowId> { self.focused_window }

    pub fn last_render(&self) -> RenderOutcome { self.last_render }

    pub fn reload_settings<H: WindowSystem + ?Sized>(&mut self, settings: Settings, host: &H) {
        let issues = settings.validate();
        if !issues.is_empty() {
            warn!(?issues, "ignoring invalid settings");
            return;
        }
        self.tree.set_settings(settings);
        self.render(host);
    }

    fn render<H: WindowSystem + ?Sized>(&mut self, host: &H) {
        self.last_render = self.tree.render(host);
    }

    #[instrument(level = "debug", skip(self, host))]
    pub fn handle_event<H: WindowSystem + ?Sized>(&mut self, event: HostEvent, host: &H) -> EventResponse {
        let changed = match event {
            HostEvent::WindowAdded(wid) => self.tree.track_window(wid, host).is_some(),
            HostEvent::WindowRemoved(wid) => {
                if self.focused_window == Some(wid) {
                    self.focused_window = None;
                }
                self.tree.untrack_window(wid)
            }
            HostEvent::WindowFocused(wid) => {
                self.focused_window = Some(wid);
                false
            }
            HostEvent::WindowMinimizeChanged(wid) => self.tree.find_node_by_handle(wid).is_some(),
            HostEvent::GrabBegin(wid) => self.with_window(wid, |tree, node| tree.begin_grab(node)),
            HostEvent::GrabEnd(wid) => self.with_window(wid, |tree, node| tree.end_grab(node)),
            HostEvent::PointerMoved { window, position } => {
                self.with_window(window, |tree, node| tree.remember_pointer(node, position));
                false
            }
            HostEvent::WorkspaceAdded { index, monitors } => {
                self.tree.add_workspace(index, monitors).is_some()
            }
            HostEvent::WorkspaceRemoved(index) => self.tree.remove_workspace(index),
            HostEvent::MonitorsChanged { workspaces, monitors } => {
                self.tree.monitors_changed(workspaces, monitors, host);
                true
            }
        };
        if changed {
            self.render(host);
        }
        EventResponse { focus_window: None, changed }
    }

    /// Applies a user command to the node holding `window`.
    #[instrument(level = "debug", skip(self, host))]
    pub fn handle_command<H: WindowSystem + ?Sized>(
        &mut self,
        command: LayoutCommand,
        window: WindowId,
        host: &H,
    ) -> EventResponse {
        let Some(node) = self.tree.find_node_by_handle(window) else {
            debug!(?window, "command for untracked window");
            return EventResponse::default();
        };
        let mut focus_window = None;
        let changed = match command {
            LayoutCommand::Focus(direction) => {
                focus_window =
                    self.tree.focus(node, direction, host).and_then(|n| self.tree.window(n));
                false
            }
            LayoutCommand::Move(direction) => self.tree.move_node(node, direction, host),
            LayoutCommand::Swap(direction) => {
                let swapped = self.tree.swap(node, direction, host);
                if swapped {
                    focus_window = Some(window);
                }
                swapped
            }
            LayoutCommand::Split { orientation, force } => {
                self.tree.split(node, orientation, force).is_some()
            }
            LayoutCommand::ToggleLayout(layout) => self.tree.toggle_layout(node, layout),
            LayoutCommand::ToggleOrientation => self.tree.toggle_orientation(node),
            LayoutCommand::ToggleFloat => self.tree.toggle_float(node),
            LayoutCommand::Resize { direction, amount } => {
                self.tree.resize(node, direction, amount, host)
            }
        };
        if focus_window.is_some() {
            self.focused_window = focus_window;
        }
        if changed {
            self.render(host);
        }
        EventResponse { focus_window, changed }
    }

    fn with_window(
        &mut self,
        window: WindowId,
        f: impl FnOnce(&mut LayoutTree, crate::model::tree::NodeId) -> bool,
    ) -> bool {
        match self.tree.find_node_by_handle(window) {
            Some(node) => f(&mut self.tree, node),
            None => false,
        }
    }
}
