//! Pure geometry for turning a container's rect into child rects.

use crate::layout_engine::{LayoutKind, Orientation};
use crate::sys::geometry::Rect;

/// Extent each child gets along the container's axis.
///
/// A child with a stored share (`percent > 0`) keeps it; the rest get an
/// even split. Results are floored to whole pixels.
pub fn compute_sizes(container: Rect, layout: LayoutKind, percents: &[f64]) -> Vec<i32> {
    if percents.is_empty() {
        return Vec::new();
    }
    let extent = match layout.orientation().unwrap_or(Orientation::Horizontal) {
        Orientation::Horizontal => container.width,
        Orientation::Vertical => container.height,
    };
    let extent = f64::from(extent);
    let even = (extent / percents.len() as f64).floor() as i32;
    percents
        .iter()
        .map(|&p| if p > 0.0 { (extent * p.min(1.0)).floor() as i32 } else { even })
        .collect()
}

/// Rect of the `index`th child of a split container.
pub fn process_split(container: Rect, orientation: Orientation, sizes: &[i32], index: usize) -> Rect {
    let offset: i32 = sizes.iter().take(index).sum();
    let size = sizes.get(index).copied().unwrap_or(0);
    match orientation {
        Orientation::Horizontal => {
            Rect::new(container.x + offset, container.y, size, container.height)
        }
        Orientation::Vertical => Rect::new(container.x, container.y + offset, container.width, size),
    }
}

/// Children of a stacked container overlap, each shifted down by one header.
pub fn process_stacked(container: Rect, index: usize, header: i32) -> Rect {
    let shift = header.saturating_mul(index as i32);
    Rect::new(
        container.x,
        container.y + shift,
        container.width,
        (container.height - shift).max(0),
    )
}

/// Children of a tabbed container all share the area below the tab bar.
/// A lone child fills the whole container.
pub fn process_tabbed(container: Rect, child_count: usize, tab_bar: i32) -> Rect {
    if child_count <= 1 {
        return container;
    }
    Rect::new(
        container.x,
        container.y + tab_bar,
        container.width,
        (container.height - tab_bar).max(0),
    )
}

/// Shrinks `rect` by `gap` on every side, unless that would consume it.
pub fn process_gap(rect: Rect, gap: i32) -> Rect {
    let gap = gap.max(0);
    if gap.saturating_mul(2) >= rect.width.min(rect.height) {
        return rect;
    }
    Rect::new(rect.x + gap, rect.y + gap, rect.width - 2 * gap, rect.height - 2 * gap)
}

/// Rect of the `index`th of `sizes.len()` tiled children laid out by `layout`.
pub fn child_rect(
    container: Rect,
    layout: LayoutKind,
    sizes: &[i32],
    index: usize,
    stack_header: i32,
    tab_bar: i32,
) -> Rect {
    match layout {
        LayoutKind::Stacked => process_stacked(container, index, stack_header),
        LayoutKind::Tabbed => process_tabbed(container, sizes.len(), tab_bar),
        LayoutKind::VSplit => process_split(container, Orientation::Vertical, sizes, index),
        LayoutKind::Root | LayoutKind::HSplit | LayoutKind::Preset => {
            process_split(container, Orientation::Horizontal, sizes, index)
        }
    }
}
