use crate::grid::{CellState, Frame};

/// Wakes every settled grain around a vacated cell. Only `frame.next` is
/// touched. Returns how many grains were woken.
pub fn reactivate(frame: &mut Frame<'_>, row: usize, col: usize, reset_velocity: i32) -> usize {
    let mut woken = 0;
    for dy in -1i32..=1 {
        let y = row as i32 + dy;
        if !frame.within_rows(y) {
            continue;
        }
        for dx in -1i32..=1 {
            let x = col as i32 + dx;
            if (dx == 0 && dy == 0) || !frame.within_cols(x) {
                continue;
            }
            let i = frame.idx(y as usize, x as usize);
            let cell = &mut frame.next[i];
            if cell.state == CellState::Complete {
                cell.state = CellState::Falling;
                cell.velocity = reset_velocity;
                woken += 1;
            }
        }
    }
    woken
}
