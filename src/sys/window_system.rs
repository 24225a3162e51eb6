//! The boundary between the layout engine and whatever actually owns the
//! windows on screen.

use serde::{Deserialize, Serialize};

use crate::layout_engine::{Direction, NodeRef};
use crate::sys::geometry::{Point, Rect};

/// Host handle for a window. Opaque to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Services the engine consumes from the host.
///
/// Methods take `&self`; hosts that need to mutate state on `move_resize` or
/// `focus` are expected to use interior mutability or forward to their own
/// event loop.
pub trait WindowSystem {
    fn frame_rect(&self, window: WindowId) -> Rect;

    /// Usable area of `monitor` while `workspace` is shown on it.
    fn work_area(&self, workspace: u32, monitor: u32) -> Rect;

    /// `None` for windows that are not bound to a single monitor.
    fn monitor_index_of(&self, window: WindowId) -> Option<u32>;

    /// `None` for windows shown on every workspace.
    fn workspace_index_of(&self, window: WindowId) -> Option<u32>;

    /// Monitor adjacent to `monitor` in `direction`.
    fn monitor_neighbor(&self, monitor: u32, direction: Direction) -> Option<u32>;

    fn is_minimized(&self, window: WindowId) -> bool;

    fn is_floating_policy(&self, window: WindowId) -> bool;

    fn move_resize(&self, window: WindowId, rect: Rect);

    fn raise(&self, window: WindowId);

    fn focus(&self, window: WindowId, timestamp: u32);

    fn current_time(&self) -> u32;

    /// Gap applied around a tiled window.
    fn calculate_gaps(&self, node: NodeRef<'_>) -> i32;

    fn move_pointer_to(&self, window: WindowId, point: Point);

    fn same_monitor(&self, a: WindowId, b: WindowId) -> bool {
        let a = (self.monitor_index_of(a), self.workspace_index_of(a));
        let b = (self.monitor_index_of(b), self.workspace_index_of(b));
        a.0.is_some() && a == b
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::common::collections::HashMap;
    use crate::common::config::GapSettings;

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct FakeWindow {
        pub workspace: Option<u32>,
        pub monitor: Option<u32>,
        pub frame: Rect,
        pub minimized: bool,
        pub floating: bool,
    }

    impl FakeWindow {
        pub fn on(workspace: u32, monitor: u32) -> Self {
            FakeWindow {
                workspace: Some(workspace),
                monitor: Some(monitor),
                frame: Rect::new(0, 0, 100, 100),
                minimized: false,
                floating: false,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum HostCall {
        MoveResize(WindowId, Rect),
        Raise(WindowId),
        Focus(WindowId, u32),
        MovePointer(WindowId, Point),
    }

    /// In-memory host that records every side effect the engine requests.
    ///
    /// Monitors are laid out left to right in index order.
    pub struct RecordingHost {
        pub monitors: Vec<Rect>,
        pub windows: RefCell<HashMap<WindowId, FakeWindow>>,
        pub calls: RefCell<Vec<HostCall>>,
        pub gaps: GapSettings,
        clock: Cell<u32>,
    }

    impl RecordingHost {
        pub fn new(monitors: Vec<Rect>) -> Self {
            RecordingHost {
                monitors,
                windows: RefCell::default(),
                calls: RefCell::default(),
                gaps: GapSettings::default(),
                clock: Cell::new(0),
            }
        }

        pub fn single(width: i32, height: i32) -> Self {
            Self::new(vec![Rect::new(0, 0, width, height)])
        }

        pub fn add_window(&self, id: u64, window: FakeWindow) -> WindowId {
            let wid = WindowId(id);
            self.windows.borrow_mut().insert(wid, window);
            wid
        }

        pub fn set_minimized(&self, wid: WindowId, minimized: bool) {
            if let Some(w) = self.windows.borrow_mut().get_mut(&wid) {
                w.minimized = minimized;
            }
        }

        pub fn take_calls(&self) -> Vec<HostCall> { self.calls.take() }

        pub fn focused(&self) -> Option<WindowId> {
            self.calls.borrow().iter().rev().find_map(|call| match *call {
                HostCall::Focus(wid, _) => Some(wid),
                _ => None,
            })
        }

        fn window(&self, wid: WindowId) -> Option<FakeWindow> {
            self.windows.borrow().get(&wid).copied()
        }
    }

    impl WindowSystem for RecordingHost {
        fn frame_rect(&self, window: WindowId) -> Rect {
            self.window(window).map(|w| w.frame).unwrap_or_default()
        }

        fn work_area(&self, _workspace: u32, monitor: u32) -> Rect {
            self.monitors.get(monitor as usize).copied().unwrap_or_default()
        }

        fn monitor_index_of(&self, window: WindowId) -> Option<u32> {
            self.window(window).and_then(|w| w.monitor)
        }

        fn workspace_index_of(&self, window: WindowId) -> Option<u32> {
            self.window(window).and_then(|w| w.workspace)
        }

        fn monitor_neighbor(&self, monitor: u32, direction: Direction) -> Option<u32> {
            let count = self.monitors.len();
            match direction {
                Direction::Left => monitor.checked_sub(1),
                Direction::Right => Some(monitor + 1).filter(|&m| (m as usize) < count),
                Direction::Up | Direction::Down => None,
            }
        }

        fn is_minimized(&self, window: WindowId) -> bool {
            self.window(window).is_some_and(|w| w.minimized)
        }

        fn is_floating_policy(&self, window: WindowId) -> bool {
            self.window(window).is_some_and(|w| w.floating)
        }

        fn move_resize(&self, window: WindowId, rect: Rect) {
            if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
                w.frame = rect;
            }
            self.calls.borrow_mut().push(HostCall::MoveResize(window, rect));
        }

        fn raise(&self, window: WindowId) { self.calls.borrow_mut().push(HostCall::Raise(window)); }

        fn focus(&self, window: WindowId, timestamp: u32) {
            self.calls.borrow_mut().push(HostCall::Focus(window, timestamp));
        }

        fn current_time(&self) -> u32 {
            let now = self.clock.get() + 1;
            self.clock.set(now);
            now
        }

        fn calculate_gaps(&self, node: NodeRef<'_>) -> i32 {
            self.gaps.gap_for(node.monitor_tiled_window_count(self))
        }

        fn move_pointer_to(&self, window: WindowId, point: Point) {
            self.calls.borrow_mut().push(HostCall::MovePointer(window, point));
        }
    }
}
