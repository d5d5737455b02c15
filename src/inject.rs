use crate::clock::{Clock, Deadline};
use crate::color::ColorCycle;
use crate::config::Settings;
use crate::grid::{Cell, CellState, GridStore};
use crate::sink::PixelSink;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Injection {
    /// Grains placed this frame.
    pub seeded: usize,
    /// The drop counter overflowed and the grid was cleared.
    pub reset: bool,
}

/// Drops new grains into a square window around the input point.
pub struct Injector {
    input_x: usize,
    input_y: usize,
    width: i32,
    percent: i32,
    drops: u64,
    limit: u64,
    drift: Deadline,
}

impl Injector {
    pub fn new(settings: &Settings, now: u64) -> Self {
        Self {
            input_x: settings.input_x,
            input_y: settings.input_y,
            width: i32::try_from(settings.input_width).unwrap_or(i32::MAX),
            percent: settings.percent_input_fill as i32,
            drops: 0,
            limit: settings.saturation_limit(),
            drift: Deadline::new(settings.input_drift_ms, now),
        }
    }

    pub fn input_x(&self) -> usize {
        self.input_x
    }

    pub fn input_y(&self) -> usize {
        self.input_y
    }

    /// Successful drop trials since the last saturation reset. Counts trials
    /// whose placement was refused too.
    pub fn drops(&self) -> u64 {
        self.drops
    }

    pub fn reset_drops(&mut self) {
        self.drops = 0;
    }

    /// Moves the input column by `delta`, clamped to the grid.
    pub fn nudge_input(&mut self, delta: i32, cols: usize) {
        let x = (self.input_x as i64 + delta as i64).clamp(0, cols as i64 - 1);
        self.input_x = x as usize;
    }

    /// Runs one frame of drops. A saturation reset clears the grid and ends
    /// injection for this frame; the remaining window positions get no trial.
    pub fn inject<S, C>(
        &mut self,
        grid: &mut GridStore,
        colors: &ColorCycle,
        sink: &mut S,
        clock: &mut C,
    ) -> Injection
    where
        S: PixelSink + ?Sized,
        C: Clock + ?Sized,
    {
        let mut out = Injection::default();
        let now = clock.now_millis();

        let blocked = !grid.cell(self.input_y, self.input_x).is_empty();
        if self.drift.fire(now) || blocked {
            self.input_x = clock.random_int(0, grid.cols() as i32) as usize;
            debug!(input_x = self.input_x, blocked, "input column moved");
        }

        let half = self.width / 2;
        let top = self.input_y as i32 - half;
        let left = self.input_x as i32 - half;
        let grain = Cell {
            state: CellState::New,
            velocity: 1,
            hue_index: colors.phase().index(),
            color: colors.color(),
        };

        for dy in 0..self.width {
            for dx in 0..self.width {
                if clock.random_int(0, 100) >= self.percent {
                    continue;
                }

                self.drops += 1;
                if self.drops > self.limit {
                    debug!(drops = self.drops, limit = self.limit, "grid saturated, clearing");
                    self.drops = 0;
                    grid.reset_all();
                    sink.clear(colors.background());
                    out.reset = true;
                    return out;
                }

                let (row, col) = (top + dy, left + dx);
                if !grid.within_rows(row) || !grid.within_cols(col) {
                    continue;
                }
                let i = grid.idx(row as usize, col as usize);
                let target = &mut grid.current_mut()[i];
                if matches!(target.state, CellState::None | CellState::Complete) {
                    *target = grain;
                    sink.set_color(col as usize, row as usize, grain.color);
                    out.seeded += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::color::Rgb;
    use crate::sink::MemorySink;

    fn settings(fill: u8, width: usize) -> Settings {
        Settings {
            rows: 16,
            cols: 16,
            percent_input_fill: fill,
            input_width: width,
            input_x: 8,
            input_y: 0,
            input_drift_ms: 0,
            ..Settings::default()
        }
    }

    #[test]
    fn full_fill_seeds_the_whole_window() {
        let s = settings(100, 3);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(1);
        let mut inj = Injector::new(&s, 0);
        inj.input_y = 5;

        let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        assert_eq!(out, Injection { seeded: 9, reset: false });
        for row in 4..=6 {
            for col in 7..=9 {
                let c = grid.cell(row, col);
                assert_eq!(c.state, CellState::New);
                assert_eq!(c.velocity, 1);
                assert_eq!(c.color, colors.color());
                assert_eq!(sink.get_color(col, row), colors.color());
            }
        }
        assert_eq!(grid.live_count(), 9);
        assert_eq!(inj.drops(), 9);
    }

    #[test]
    fn zero_fill_never_drops() {
        let s = settings(0, 4);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(2);
        let mut inj = Injector::new(&s, 0);
        for _ in 0..50 {
            inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        }
        assert_eq!(grid.live_count(), 0);
        assert_eq!(inj.drops(), 0);
    }

    #[test]
    fn window_clips_at_the_top_edge_but_still_counts() {
        // Width 2 at row 0 reaches row -1, which is off the grid.
        let s = settings(100, 2);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(3);
        let mut inj = Injector::new(&s, 0);

        let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        assert_eq!(out.seeded, 2);
        assert_eq!(inj.drops(), 4);
    }

    #[test]
    fn falling_cells_are_kept_but_complete_ones_reseeded() {
        let s = settings(100, 3);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(4);
        let mut inj = Injector::new(&s, 0);
        inj.input_y = 3;

        let old = Cell {
            state: CellState::Falling,
            velocity: 2,
            hue_index: 0,
            color: Rgb::new(1, 1, 1),
        };
        let falling = grid.idx(3, 9);
        let settled = grid.idx(3, 7);
        grid.current_mut()[falling] = old;
        grid.current_mut()[settled] = Cell {
            state: CellState::Complete,
            ..old
        };

        let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        assert_eq!(inj.input_x(), 8);
        assert_eq!(out.seeded, 8);
        // The refused trial still counts as a drop.
        assert_eq!(inj.drops(), 9);
        assert_eq!(grid.cell(3, 9), old);
        assert_eq!(grid.cell(3, 7).state, CellState::New);
        assert_eq!(grid.cell(3, 7).color, colors.color());
    }

    #[test]
    fn saturation_clears_grid_after_limit() {
        // 16x16 with width 1: 256 drops are fine, the 257th resets.
        let s = settings(100, 1);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(5);
        let mut inj = Injector::new(&s, 0);

        for n in 1..=256u64 {
            let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
            assert!(!out.reset, "reset early at drop {n}");
            assert_eq!(inj.drops(), n);
            // Make room so the window is never blocked.
            grid.reset_all();
        }
        let col = inj.input_x();
        let i = grid.idx(0, col);
        grid.current_mut()[i] = Cell {
            state: CellState::Complete,
            velocity: 3,
            hue_index: 0,
            color: Rgb::new(0, 0, 192),
        };
        let corner = grid.idx(15, 15);
        let settled = grid.current()[i];
        grid.current_mut()[corner] = settled;
        sink.set_color(15, 15, Rgb::new(0, 0, 192));

        let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        assert!(out.reset);
        assert_eq!(out.seeded, 0);
        assert_eq!(inj.drops(), 0);
        assert_eq!(grid.live_count(), 0);
        assert_eq!(sink.get_color(15, 15), Rgb::BLACK);
    }

    #[test]
    fn saturation_ends_the_frame_early() {
        // 2x2 with width 2: limit 8. The first trial of the frame overflows,
        // and the other three positions get no trial at all.
        let s = Settings {
            rows: 2,
            cols: 2,
            input_x: 1,
            input_y: 1,
            ..settings(100, 2)
        };
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(8);
        let mut inj = Injector::new(&s, 0);
        inj.drops = s.saturation_limit();

        let out = inj.inject(&mut grid, &colors, &mut sink, &mut clock);
        assert_eq!(out, Injection { seeded: 0, reset: true });
        assert_eq!(inj.drops(), 0);
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn drift_timer_moves_the_input_column() {
        let s = Settings {
            input_drift_ms: 100,
            ..settings(0, 1)
        };
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(6);
        let mut inj = Injector::new(&s, 0);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            clock.advance(50);
            inj.inject(&mut grid, &colors, &mut sink, &mut clock);
            assert!(inj.input_x() < s.cols);
            seen.insert(inj.input_x());
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn blocked_input_cell_forces_a_jump() {
        let s = settings(0, 1);
        let mut grid = GridStore::new(s.rows, s.cols, s.background);
        let colors = ColorCycle::new(s.background);
        let mut sink = MemorySink::new(s.cols, s.rows);
        let mut clock = ManualClock::new(7);
        let mut inj = Injector::new(&s, 0);

        // Fill the whole top row, so every jump lands on another blocked cell.
        for col in 0..s.cols {
            let i = grid.idx(0, col);
            grid.current_mut()[i].state = CellState::Complete;
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            inj.inject(&mut grid, &colors, &mut sink, &mut clock);
            seen.insert(inj.input_x());
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn nudge_clamps_to_grid() {
        let s = settings(0, 1);
        let mut inj = Injector::new(&s, 0);
        inj.nudge_input(-100, s.cols);
        assert_eq!(inj.input_x(), 0);
        inj.nudge_input(3, s.cols);
        assert_eq!(inj.input_x(), 3);
        inj.nudge_input(100, s.cols);
        assert_eq!(inj.input_x(), 15);
    }
}
