use tracing::{debug, instrument, trace};

use crate::actor::move_queue::WindowMove;
use crate::layout_engine::compute::{child_rect, compute_sizes, process_gap};
use crate::layout_engine::{LayoutTree, NodeKind, NodeValue};
use crate::model::tree::NodeId;
use crate::sys::window_system::WindowSystem;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Window moves queued, across all passes.
    pub windows: usize,
    /// Empty containers found and removed after the first pass.
    pub orphans_removed: usize,
}

impl LayoutTree {
    /// Recomputes every rect from the monitors' work areas down and queues a
    /// move for each tiled window.
    ///
    /// Containers left empty by earlier mutations are removed afterwards and
    /// the tree is laid out once more.
    #[instrument(level = "debug", skip(self, host))]
    pub fn render<H: WindowSystem + ?Sized>(&mut self, host: &H) -> RenderOutcome {
        let mut outcome = RenderOutcome { windows: self.render_pass(host), ..Default::default() };

        let orphans: Vec<_> = self
            .root()
            .traverse_postorder(self.map())
            .filter(|&n| self.kind(n) == Some(NodeKind::Container) && n.is_empty(self.map()))
            .collect();
        for orphan in orphans {
            if !self.contains_node(orphan) {
                continue;
            }
            trace!(?orphan, "removing empty container");
            if self.remove_node(orphan).is_ok() {
                outcome.orphans_removed += 1;
            }
        }
        if outcome.orphans_removed > 0 {
            outcome.windows += self.render_pass(host);
        }
        debug!(?outcome, "rendered");
        debug!("\n{}", self.draw_tree());
        outcome
    }

    fn render_pass<H: WindowSystem + ?Sized>(&mut self, host: &H) -> usize {
        let mut moved = 0;
        for workspace in self.all_workspace_nodes() {
            let monitors: Vec<_> = self.children(workspace).collect();
            for monitor in monitors {
                let Some(NodeValue::Monitor(key)) = self.value(monitor) else { continue };
                self.set_rect(monitor, host.work_area(key.workspace, key.monitor));
                moved += self.render_children(monitor, host);
            }
        }
        moved
    }

    fn render_children<H: WindowSystem + ?Sized>(&mut self, node: NodeId, host: &H) -> usize {
        let Some(rect) = self.rect(node) else { return 0 };
        let children: Vec<_> = self.children(node).collect();
        if children.is_empty() {
            return 0;
        }
        let tiled = self.tiled_children(&children, host);
        let layout = self.layout(node);
        let percents: Vec<_> = tiled.iter().map(|&c| self.percent(c)).collect();
        let sizes = compute_sizes(rect, layout, &percents);
        let (header, tab_bar) =
            (self.settings.layout.stack_header_height, self.settings.layout.tab_bar_height);

        let mut moved = 0;
        for (index, &child) in tiled.iter().enumerate() {
            let child_rect = child_rect(rect, layout, &sizes, index, header, tab_bar);
            self.set_rect(child, child_rect);
            moved += match self.kind(child) {
                Some(NodeKind::Window) => self.emit_move(child, host),
                _ => self.render_children(child, host),
            };
        }
        moved
    }

    fn emit_move<H: WindowSystem + ?Sized>(&self, node: NodeId, host: &H) -> usize {
        let (Some(window), Some(rect), Some(node_ref)) =
            (self.window(node), self.rect(node), self.node(node))
        else {
            return 0;
        };
        let gap = host.calculate_gaps(node_ref);
        let rect = process_gap(rect, gap);
        trace!(?window, ?rect, gap, "queueing move");
        self.moves.send(WindowMove { window, rect });
        1
    }
}
