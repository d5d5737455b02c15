use crate::clock::Clock;
use crate::color::Rgb;
use crate::grid::{Cell, CellState, Frame};
use crate::sink::PixelSink;

/// A falling grain that finds nowhere to go while faster than this settles.
pub const SETTLE_VELOCITY: i32 = 2;

#[derive(Clone, Copy, Debug)]
pub struct FallRules {
    pub max_velocity: i32,
    pub gravity: i32,
    pub background: Rgb,
}

/// Scans `frame.current` in row-major order and schedules every grain into
/// `frame.next`. Origins of grains that moved are pushed onto `departures`.
/// Returns the number of grains that moved.
pub fn resolve<S, C>(
    frame: &mut Frame<'_>,
    rules: &FallRules,
    sink: &mut S,
    clock: &mut C,
    departures: &mut Vec<(usize, usize)>,
) -> usize
where
    S: PixelSink + ?Sized,
    C: Clock + ?Sized,
{
    let mut moved = 0;
    for row in 0..frame.rows {
        for col in 0..frame.cols {
            let i = frame.idx(row, col);
            let cell = frame.current[i];
            match cell.state {
                CellState::None => continue,
                CellState::Complete => {
                    frame.next[i] = hold(cell, rules.gravity);
                    continue;
                }
                CellState::New | CellState::Falling => {}
            }

            match find_landing(frame, row, col, cell.velocity.min(rules.max_velocity), clock) {
                Some((y, x)) => {
                    let dest = frame.idx(y, x);
                    frame.next[dest] = Cell {
                        state: CellState::Falling,
                        velocity: cell.velocity.saturating_add(rules.gravity),
                        ..cell
                    };
                    sink.set_color(x, y, cell.color);
                    sink.set_color(col, row, rules.background);
                    departures.push((row, col));
                    moved += 1;
                }
                None => frame.next[i] = hold(cell, rules.gravity),
            }
        }
    }
    moved
}

/// Farthest-first search from `row + reach` back up to `row + 1`. Straight
/// down wins over the sides; the side tried first is re-rolled per row.
fn find_landing<C: Clock + ?Sized>(
    frame: &Frame<'_>,
    row: usize,
    col: usize,
    reach: i32,
    clock: &mut C,
) -> Option<(usize, usize)> {
    let origin = row as i32;
    let mut y = origin + reach;
    while y > origin {
        if frame.within_rows(y) {
            let yr = y as usize;
            if frame.is_free(yr, col) {
                return Some((yr, col));
            }

            let dir = if clock.random_int(0, 2) == 0 { 1 } else { -1 };
            for x in [col as i32 + dir, col as i32 - dir] {
                if frame.within_cols(x) && frame.is_free(yr, x as usize) {
                    return Some((yr, x as usize));
                }
            }
        }
        y -= 1;
    }
    None
}

/// In-place advance for a grain that stays put this frame.
fn hold(cell: Cell, gravity: i32) -> Cell {
    let state = match cell.state {
        CellState::New => CellState::Falling,
        CellState::Falling if cell.velocity > SETTLE_VELOCITY => CellState::Complete,
        other => other,
    };
    Cell {
        state,
        velocity: cell.velocity.saturating_add(gravity),
        ..cell
    }
}
