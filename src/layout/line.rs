//! Placement of a cue box along the block axis, following its `line` setting, without
//! overlapping boxes that were placed before it.

use crate::cue::{Cue, Line, LineAlign, Vertical};
use super::geometry::{Axis, LayoutBox};

use log::trace;

/// The line position a cue should be displayed at. Snapped cues count in lines (negative values
/// count from the end), other cues in percent.
#[must_use]
pub fn compute_line_pos(cue: &Cue) -> f64 {
    match cue.line {
        Line::Number(line) if cue.snap_to_lines || (0.0..=100.0).contains(&line) => line,
        _ => match cue.track {
            None => -1.0,
            #[allow(
                clippy::cast_precision_loss,
                reason = "there are never anywhere near 2^52 text tracks"
            )]
            Some(track) => -(track.preceding_showing as f64 + 1.0),
        },
    }
}

/// Move `cue_box` to the line position of `cue` within `container`, then step it along the block
/// axis until it no longer overlaps any of `placed`.
///
/// If there is no such position inside the container, the position that keeps most of the box
/// visible is used instead.
#[must_use]
pub fn move_box_to_line_position(
    cue_box: LayoutBox,
    container: &LayoutBox,
    placed: &[LayoutBox],
    cue: &Cue,
) -> LayoutBox {
    let line_pos = compute_line_pos(cue);

    let (specified, axes) = if cue.snap_to_lines {
        snap_to_line(cue_box, container, cue.vertical, line_pos)
    } else {
        (
            place_at_percentage(cue_box, container, cue, line_pos),
            vec![
                Axis::PositiveY,
                Axis::NegativeX,
                Axis::PositiveX,
                Axis::NegativeY,
            ],
        )
    };

    find_best_position(specified, container, placed, &axes)
}

fn snap_to_line(
    cue_box: LayoutBox,
    container: &LayoutBox,
    vertical: Vertical,
    line_pos: f64,
) -> (LayoutBox, Vec<Axis>) {
    // The first axis points away from the edge that line 0 is at
    let (mut axes, extent) = match vertical {
        Vertical::Horizontal => (vec![Axis::PositiveY, Axis::NegativeY], container.height),
        Vertical::RightToLeft => (vec![Axis::NegativeX, Axis::PositiveX], container.width),
        Vertical::LeftToRight => (vec![Axis::PositiveX, Axis::NegativeX], container.width),
    };
    let initial_axis = axes[0];

    let step = cue_box.line_height;
    if step <= 0.0 {
        return (cue_box, axes);
    }

    let mut position = step * line_pos.round();
    let max_position = extent + step;
    if position.abs() > max_position {
        position = position.signum() * (max_position / step).ceil() * step;
    }

    // Negative lines count from the far edge
    if line_pos < 0.0 {
        position += extent;
        axes.reverse();
    }

    (cue_box.moved(initial_axis, Some(position)), axes)
}

fn place_at_percentage(
    cue_box: LayoutBox,
    container: &LayoutBox,
    cue: &Cue,
    line_pos: f64,
) -> LayoutBox {
    let extent = if cue.vertical.is_horizontal() {
        container.height
    } else {
        container.width
    };
    let line_height_percent = if extent > 0.0 {
        cue_box.line_height / extent * 100.0
    } else {
        0.0
    };

    let line_pos = match cue.line_align {
        LineAlign::Start => line_pos,
        LineAlign::Center => line_pos - line_height_percent / 2.0,
        LineAlign::End => line_pos - line_height_percent,
    };
    let offset = extent * line_pos / 100.0;

    match cue.vertical {
        Vertical::Horizontal => cue_box.with_top(container.top + offset),
        Vertical::RightToLeft => cue_box.with_left(container.left + offset),
        Vertical::LeftToRight => cue_box.with_right(container.right - offset),
    }
}

/// Try each axis in turn: step along it while the box sticks out of the container behind it, or
/// overlaps a placed box. The first position fully inside the container wins.
fn find_best_position(
    specified: LayoutBox,
    container: &LayoutBox,
    placed: &[LayoutBox],
    axes: &[Axis],
) -> LayoutBox {
    let mut best: Option<(LayoutBox, f64)> = None;

    for &axis in axes {
        let mut candidate = specified;

        for _ in 0..max_steps(&candidate, container, axis) {
            let must_move = candidate.overlaps_opposite_axis(container, axis)
                || (candidate.within(container) && candidate.overlaps_any(placed));
            if !must_move {
                break;
            }
            candidate = candidate.moved(axis, None);
        }

        if candidate.within(container) && !candidate.overlaps_any(placed) {
            trace!("placed box at ({}, {}) moving {axis:?}", candidate.left, candidate.top);
            return candidate;
        }

        let visible = candidate.intersect_percentage(container);
        if best.is_none_or(|(_, best_visible)| visible > best_visible) {
            best = Some((candidate, visible));
        }
    }

    // A fallback that shows nothing at all is worse than the specified position
    best.filter(|(_, visible)| *visible > 0.0)
        .map_or(specified, |(best, _)| best)
}

/// Upper bound for the number of steps along `axis` it can take to cross the whole container.
fn max_steps(cue_box: &LayoutBox, container: &LayoutBox, axis: Axis) -> usize {
    if cue_box.line_height <= 0.0 {
        return 0;
    }

    let distance = if axis.is_horizontal() {
        container.width + cue_box.width + (cue_box.left - container.left).abs()
    } else {
        container.height + cue_box.height + (cue_box.top - container.top).abs()
    };

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "non-negative and small for any real display"
    )]
    let steps = (distance / cue_box.line_height).ceil() as usize;
    steps + 1
}
