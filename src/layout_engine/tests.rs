use crate::actor::move_queue::MoveQueue;
use crate::common::config::Settings;
use crate::layout_engine::compute::{compute_sizes, process_gap, process_split, process_stacked};
use crate::layout_engine::{
    Direction, EventResponse, HostEvent, LayoutCommand, LayoutEngine, LayoutKind, NodeKind,
    NodeValue, Orientation, WindowMode,
};
use crate::model::tree::NodeId;
use crate::sys::geometry::Rect;
use crate::sys::window_system::testing::{FakeWindow, HostCall, RecordingHost};
use crate::sys::window_system::WindowId;

fn w(id: u64) -> WindowId { WindowId(id) }

fn screen() -> Rect { Rect::new(0, 0, 1200, 600) }

struct Session {
    engine: LayoutEngine,
    queue: MoveQueue,
    host: RecordingHost,
}

impl Session {
    fn new(monitors: u32) -> Session {
        let (mut engine, queue) = LayoutEngine::new(Settings::default());
        let host = RecordingHost::new(
            (0..monitors).map(|i| Rect::new(i as i32 * 1200, 0, 1200, 600)).collect(),
        );
        let _ = engine.handle_event(HostEvent::WorkspaceAdded { index: 0, monitors }, &host);
        Session { engine, queue, host }
    }

    fn open(&mut self, id: u64, monitor: u32) -> NodeId {
        let wid = self.host.add_window(id, FakeWindow::on(0, monitor));
        let response = self.engine.handle_event(HostEvent::WindowAdded(wid), &self.host);
        assert!(response.changed);
        self.node(id)
    }

    fn node(&self, id: u64) -> NodeId { self.engine.tree().find_node_by_handle(w(id)).unwrap() }

    fn command(&mut self, id: u64, command: LayoutCommand) -> EventResponse {
        self.engine.handle_command(command, w(id), &self.host)
    }

    fn monitor(&self, monitor: u32) -> NodeId {
        self.engine.tree().find_node(&NodeValue::monitor(monitor, 0)).unwrap()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> { self.engine.tree().children(node).collect() }

    /// Drains the queue and returns the rect each window ended up with.
    fn applied(&mut self) -> Vec<(WindowId, Rect)> {
        self.host.take_calls();
        self.queue.run_idle(&self.host);
        self.host
            .take_calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::MoveResize(wid, rect) => Some((wid, rect)),
                _ => None,
            })
            .collect()
    }

    /// Every node has exactly one parent listing it, and the root none.
    fn assert_single_ownership(&self) {
        let tree = self.engine.tree();
        let map = tree.map();
        let all: Vec<_> = tree.root().traverse_preorder(map).collect();
        assert_eq!(map.len(), all.len(), "unreachable nodes in the arena");
        for &node in &all {
            let owners = all.iter().filter(|&&p| tree.children(p).any(|c| c == node)).count();
            let expected = usize::from(node != tree.root());
            assert_eq!(expected, owners, "{:?} owned {owners} times", tree.value(node));
        }
    }
}

mod computing_sizes {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn two_even_windows() {
        assert_eq!(vec![600, 600], compute_sizes(screen(), LayoutKind::HSplit, &[0.0, 0.0]));
    }

    #[test]
    fn custom_percents_and_offsets() {
        let rect = Rect::new(0, 0, 1000, 600);
        let sizes = compute_sizes(rect, LayoutKind::HSplit, &[0.5, 0.25, 0.25]);
        assert_eq!(vec![500, 250, 250], sizes);
        let xs: Vec<_> = (0..3)
            .map(|i| process_split(rect, Orientation::Horizontal, &sizes, i).x)
            .collect();
        assert_eq!(vec![0, 500, 750], xs);
    }

    #[test]
    fn stacked_children() {
        let rect = Rect::new(0, 0, 1200, 800);
        let rects: Vec<_> = (0..3).map(|i| process_stacked(rect, i, 35)).collect();
        assert_eq!(vec![0, 35, 70], rects.iter().map(|r| r.y).collect::<Vec<_>>());
        assert_eq!(vec![800, 765, 730], rects.iter().map(|r| r.height).collect::<Vec<_>>());
    }

    #[test]
    fn floor_error_is_bounded() {
        for width in [1, 7, 99, 1000, 1366, 1919, 2561] {
            for k in 1..=9usize {
                let rect = Rect::new(0, 0, width, 600);
                let total: i32 = compute_sizes(rect, LayoutKind::HSplit, &vec![0.0; k]).iter().sum();
                assert!(total <= width, "{width}/{k}: {total}");
                assert!(width - total < k as i32, "{width}/{k}: {total}");
            }
        }
    }

    #[test]
    fn gap_boundary() {
        for (w, h) in [(100, 40), (41, 41), (10, 300), (1, 1)] {
            let rect = Rect::new(3, 4, w, h);
            for gap in 0..60 {
                let unchanged = process_gap(rect, gap) == rect;
                let consumed = 2 * gap >= w.min(h);
                assert_eq!(consumed || gap == 0, unchanged, "{rect:?} gap {gap}");
            }
        }
    }
}

mod navigation {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn sole_child_reaches_parents_sibling() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let b = s.open(2, 0);
        let mon = s.monitor(0);
        let tree = s.engine.tree_mut();
        let con = tree.create_container(mon, LayoutKind::HSplit).unwrap();
        tree.insert_before(mon, con, Some(a)).unwrap();
        tree.append_child(con, a).unwrap();
        assert_eq!(Some(b), s.engine.tree().next(a, Direction::Right, &s.host));
    }

    #[test]
    fn focus_command_reports_window() {
        let mut s = Session::new(2);
        s.open(1, 0);
        s.open(2, 0);
        s.open(3, 1);
        let response = s.command(2, LayoutCommand::Focus(Direction::Right));
        assert_eq!(EventResponse { focus_window: Some(w(3)), changed: false }, response);
        assert_eq!(Some(w(3)), s.engine.focused_window());
        assert_eq!(Some(w(3)), s.host.focused());

        let response = s.command(1, LayoutCommand::Focus(Direction::Up));
        assert_eq!(EventResponse::default(), response);
    }

    #[test]
    fn commands_for_unknown_windows_are_ignored() {
        let mut s = Session::new(1);
        s.open(1, 0);
        assert_eq!(EventResponse::default(), s.command(9, LayoutCommand::ToggleFloat));
    }
}

mod splitting {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn forced_split_replaces_slot() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let b = s.open(2, 0);
        let response = s.command(
            1,
            LayoutCommand::Split { orientation: Orientation::Vertical, force: true },
        );
        assert!(response.changed);
        let mon = s.monitor(0);
        let children = s.children(mon);
        assert_eq!(2, children.len());
        let con = children[0];
        assert_eq!(b, children[1]);
        assert_eq!(Some(NodeKind::Container), s.engine.tree().kind(con));
        assert_eq!(LayoutKind::VSplit, s.engine.tree().layout(con));
        assert_eq!(vec![a], s.children(con));
        s.assert_single_ownership();
    }

    #[test]
    fn split_toggle_round_trip_creates_nothing() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let mon = s.monitor(0);
        let before = s.engine.tree().map().len();
        let original = s.engine.tree().layout(mon);
        let tree = s.engine.tree_mut();
        tree.split(a, Orientation::Vertical, false);
        tree.split(a, Orientation::Horizontal, false);
        assert_eq!(original, s.engine.tree().layout(mon));
        assert_eq!(before, s.engine.tree().map().len());
    }

    #[test]
    fn new_windows_join_the_split_container() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        let _ = s.command(1, LayoutCommand::Split { orientation: Orientation::Vertical, force: false });
        s.applied();
        s.open(3, 0);
        assert_eq!(
            vec![
                (w(1), Rect::new(0, 0, 600, 300)),
                (w(3), Rect::new(0, 300, 600, 300)),
                (w(2), Rect::new(600, 0, 600, 600)),
            ],
            s.applied()
        );
    }
}

mod swapping {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn swap_pairs_twice_restores_everything() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let b = s.open(2, 0);
        let c = s.open(3, 0);
        let _ = s.command(3, LayoutCommand::Split { orientation: Orientation::Vertical, force: true });
        let tree = s.engine.tree_mut();
        tree.begin_grab(a);
        tree.resize(b, Direction::Right, 0.1, &s.host);

        let tree = s.engine.tree();
        let snapshot = |n: NodeId| {
            (tree.parent(n), n.index_in_parent(tree.map()), tree.percent(n), tree.mode(n))
        };
        let before = (snapshot(a), snapshot(c));

        let tree = s.engine.tree_mut();
        assert!(tree.swap_pairs(a, c, false, &s.host));
        s.assert_single_ownership();
        let tree = s.engine.tree_mut();
        assert!(tree.swap_pairs(a, c, false, &s.host));

        let tree = s.engine.tree();
        let snapshot = |n: NodeId| {
            (tree.parent(n), n.index_in_parent(tree.map()), tree.percent(n), tree.mode(n))
        };
        assert_eq!(before, (snapshot(a), snapshot(c)));
        s.assert_single_ownership();
    }

    #[test]
    fn swap_command_moves_and_focuses() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        s.applied();
        let response = s.command(1, LayoutCommand::Swap(Direction::Right));
        assert_eq!(EventResponse { focus_window: Some(w(1)), changed: true }, response);
        assert_eq!(
            vec![(w(2), Rect::new(0, 0, 600, 600)), (w(1), Rect::new(600, 0, 600, 600))],
            s.applied()
        );
    }

    #[test]
    fn floating_windows_are_not_swapped() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        let _ = s.command(2, LayoutCommand::ToggleFloat);
        assert!(!s.command(1, LayoutCommand::Swap(Direction::Right)).changed);
    }
}

mod moving {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn move_across_monitors() {
        let mut s = Session::new(2);
        s.open(1, 0);
        s.open(2, 0);
        s.open(3, 1);
        s.applied();
        assert!(s.command(2, LayoutCommand::Move(Direction::Right)).changed);
        assert_eq!(vec![s.node(2), s.node(3)], s.children(s.monitor(1)));
        let applied = s.applied();
        assert!(applied.contains(&(w(1), Rect::new(0, 0, 1200, 600))), "{applied:?}");
        assert!(applied.contains(&(w(2), Rect::new(1200, 0, 600, 600))), "{applied:?}");
        assert!(applied.contains(&(w(3), Rect::new(1800, 0, 600, 600))), "{applied:?}");
        s.assert_single_ownership();
    }

    #[test]
    fn entering_a_container_resets_both_parents() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let b = s.open(2, 0);
        let c = s.open(3, 0);
        let con = s.engine.tree_mut().split(c, Orientation::Vertical, true).unwrap();
        let d = s.open(4, 0);
        assert_eq!(vec![c, d], s.children(con));

        let tree = s.engine.tree_mut();
        for (node, share) in [(a, 0.3), (b, 0.3), (con, 0.4), (c, 0.6), (d, 0.4)] {
            tree.set_percent(node, share);
        }
        assert!(s.command(2, LayoutCommand::Move(Direction::Right)).changed);
        assert_eq!(vec![a, con], s.children(s.monitor(0)));
        assert_eq!(vec![b, c, d], s.children(con));
        let tree = s.engine.tree();
        for node in [a, b, con, c, d] {
            assert_eq!(0.0, tree.percent(node), "{:?}", tree.value(node));
        }
    }

    #[test]
    fn moving_out_leaves_no_empty_container() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        let _ = s.command(1, LayoutCommand::Split { orientation: Orientation::Vertical, force: true });
        assert!(s.command(1, LayoutCommand::Move(Direction::Right)).changed);
        let tree = s.engine.tree();
        assert!(tree.find_all_by_kind(tree.root(), NodeKind::Container).is_empty());
        assert_eq!(1, s.engine.last_render().orphans_removed);
        s.assert_single_ownership();
    }
}

mod removing {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn removal_collapses_nested_containers() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        s.open(2, 0);
        let tree = s.engine.tree_mut();
        let outer = tree.split(a, Orientation::Vertical, true).unwrap();
        let inner = tree.split(a, Orientation::Horizontal, true).unwrap();

        let response = s.engine.handle_event(HostEvent::WindowRemoved(w(1)), &s.host);
        assert!(response.changed);
        let tree = s.engine.tree();
        assert!(!tree.contains_node(outer));
        assert!(!tree.contains_node(inner));
        assert_eq!(vec![s.node(2)], s.children(s.monitor(0)));
    }

    #[test]
    fn container_without_tiled_windows_resets_its_siblings() {
        let mut s = Session::new(1);
        let a = s.open(1, 0);
        let b = s.open(2, 0);
        let con = s.engine.tree_mut().split(a, Orientation::Vertical, true).unwrap();
        let float = s.host.add_window(3, FakeWindow { floating: true, ..FakeWindow::on(0, 0) });
        let _ = s.engine.handle_event(HostEvent::WindowAdded(float), &s.host);
        assert_eq!(vec![a, s.node(3)], s.children(con));

        let tree = s.engine.tree_mut();
        tree.set_percent(con, 0.7);
        tree.set_percent(b, 0.3);
        tree.remove_node(a).unwrap();
        assert!(tree.contains_node(con));
        assert_eq!(0.0, tree.percent(con));
        assert_eq!(0.0, tree.percent(b));
    }

    #[test]
    fn no_empty_container_survives_render() {
        let mut s = Session::new(1);
        let ids: Vec<_> = (1..=6).map(|i| s.open(i, 0)).collect();
        let mon = s.monitor(0);
        let tree = s.engine.tree_mut();
        tree.split(ids[0], Orientation::Vertical, true);
        tree.split(ids[2], Orientation::Horizontal, true);
        let con = tree.create_container(mon, LayoutKind::Stacked).unwrap();
        tree.create_container(con, LayoutKind::HSplit).unwrap();
        for &node in &ids[..4] {
            let _ = s.engine.tree_mut().remove_node(node);
        }
        let _ = s.engine.tree_mut().render(&s.host);

        let tree = s.engine.tree();
        let empty: Vec<_> = tree
            .find_all_by_kind(tree.root(), NodeKind::Container)
            .into_iter()
            .filter(|&c| tree.children(c).next().is_none())
            .collect();
        assert_eq!(Vec::<NodeId>::new(), empty);
        s.assert_single_ownership();
    }
}

mod lifecycle {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn grab_excludes_window_from_tiling() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        s.applied();
        let _ = s.engine.handle_event(HostEvent::GrabBegin(w(2)), &s.host);
        assert_eq!(Some(WindowMode::GrabTile), s.engine.tree().mode(s.node(2)));
        assert_eq!(vec![(w(1), screen())], s.applied());
        let _ = s.engine.handle_event(HostEvent::GrabEnd(w(2)), &s.host);
        assert_eq!(2, s.applied().len());
    }

    #[test]
    fn reloaded_settings_apply_and_invalid_ones_are_ignored() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        assert!(s.command(1, LayoutCommand::ToggleLayout(LayoutKind::Stacked)).changed);
        assert!(s.applied().contains(&(w(2), Rect::new(0, 35, 1200, 565))));

        let mut settings = Settings::default();
        settings.layout.stack_header_height = 900;
        s.engine.reload_settings(settings, &s.host);
        assert_eq!(35, s.engine.tree().settings().layout.stack_header_height);
        assert_eq!(Vec::<(WindowId, Rect)>::new(), s.applied());

        let mut settings = Settings::default();
        settings.layout.stack_header_height = 50;
        s.engine.reload_settings(settings, &s.host);
        assert!(s.applied().contains(&(w(2), Rect::new(0, 50, 1200, 550))));
    }

    #[test]
    fn minimized_windows_give_up_their_space() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        s.applied();
        s.host.set_minimized(w(2), true);
        let response = s.engine.handle_event(HostEvent::WindowMinimizeChanged(w(2)), &s.host);
        assert!(response.changed);
        assert_eq!(vec![(w(1), screen())], s.applied());
    }

    #[test]
    fn monitor_hotplug_rebuilds_skeleton() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        let response = s.engine.handle_event(
            HostEvent::MonitorsChanged { workspaces: 2, monitors: 1 },
            &s.host,
        );
        assert!(response.changed);
        let tree = s.engine.tree();
        assert_eq!(2, tree.all_workspace_nodes().len());
        assert_eq!(2, tree.all_window_nodes().len());
        s.assert_single_ownership();
    }

    #[test]
    fn resize_command_changes_split() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        s.applied();
        let response =
            s.command(1, LayoutCommand::Resize { direction: Direction::Right, amount: 0.25 });
        assert!(response.changed);
        assert_eq!(
            vec![(w(1), Rect::new(0, 0, 900, 600)), (w(2), Rect::new(900, 0, 300, 600))],
            s.applied()
        );
    }

    #[test]
    fn toggle_layout_command() {
        let mut s = Session::new(1);
        s.open(1, 0);
        s.open(2, 0);
        s.applied();
        let _ = s.command(1, LayoutCommand::ToggleLayout(LayoutKind::Tabbed));
        assert_eq!(
            vec![(w(1), Rect::new(0, 35, 1200, 565)), (w(2), Rect::new(0, 35, 1200, 565))],
            s.applied()
        );
        let _ = s.command(1, LayoutCommand::ToggleLayout(LayoutKind::Tabbed));
        let _ = s.command(1, LayoutCommand::ToggleOrientation);
        assert_eq!(LayoutKind::VSplit, s.engine.tree().layout(s.monitor(0)));
    }

    #[test]
    fn commands_deserialize_from_config_syntax() {
        #[derive(serde::Deserialize)]
        struct Binding {
            command: LayoutCommand,
        }
        let b: Binding = toml::from_str(
            r#"command = { split = { orientation = "vertical" } }"#,
        )
        .unwrap();
        assert_eq!(
            LayoutCommand::Split { orientation: Orientation::Vertical, force: false },
            b.command
        );
        let b: Binding = toml::from_str(r#"command = { focus = "left" }"#).unwrap();
        assert_eq!(LayoutCommand::Focus(Direction::Left), b.command);
    }
}
