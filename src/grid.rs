use crate::color::Rgb;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    None,
    New,
    Falling,
    Complete,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub state: CellState,
    pub velocity: i32,
    pub hue_index: u8,
    pub color: Rgb,
}

impl Cell {
    pub fn empty(background: Rgb) -> Self {
        Self {
            state: CellState::None,
            velocity: 0,
            hue_index: 0,
            color: background,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == CellState::None
    }
}

/// Read/write view over one frame: `current` is read-only while `next` is
/// being built.
pub struct Frame<'a> {
    pub rows: usize,
    pub cols: usize,
    pub current: &'a [Cell],
    pub next: &'a mut [Cell],
}

impl Frame<'_> {
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn within_rows(&self, row: i32) -> bool {
        row >= 0 && (row as usize) < self.rows
    }

    pub fn within_cols(&self, col: i32) -> bool {
        col >= 0 && (col as usize) < self.cols
    }

    /// A destination is free only if nothing is there now and nothing has
    /// been scheduled there this frame.
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        let i = self.idx(row, col);
        self.current[i].is_empty() && self.next[i].is_empty()
    }
}

/// Three generations of the grid in flat row-major buffers. Roles rotate by
/// index; cell contents are never copied between generations.
pub struct GridStore {
    rows: usize,
    cols: usize,
    background: Rgb,
    buffers: [Vec<Cell>; 3],
    current: usize,
    next: usize,
    scratch: usize,
}

impl GridStore {
    pub fn new(rows: usize, cols: usize, background: Rgb) -> Self {
        let empty = Cell::empty(background);
        let n = rows * cols;
        Self {
            rows,
            cols,
            background,
            buffers: [vec![empty; n], vec![empty; n], vec![empty; n]],
            current: 0,
            next: 1,
            scratch: 2,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn within_rows(&self, row: i32) -> bool {
        row >= 0 && (row as usize) < self.rows
    }

    pub fn within_cols(&self, col: i32) -> bool {
        col >= 0 && (col as usize) < self.cols
    }

    pub fn current(&self) -> &[Cell] {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut [Cell] {
        &mut self.buffers[self.current]
    }

    pub fn next(&self) -> &[Cell] {
        &self.buffers[self.next]
    }

    pub fn next_mut(&mut self) -> &mut [Cell] {
        &mut self.buffers[self.next]
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.current()[self.idx(row, col)]
    }

    pub fn frame(&mut self) -> Frame<'_> {
        let (rows, cols) = (self.rows, self.cols);
        let (current, next) = split_pair(&mut self.buffers, self.current, self.next);
        Frame {
            rows,
            cols,
            current,
            next,
        }
    }

    /// Old next becomes current, the scratch buffer becomes next.
    pub fn swap(&mut self) {
        let old_current = self.current;
        self.current = self.next;
        self.next = self.scratch;
        self.scratch = old_current;
    }

    pub fn clear_next(&mut self) {
        let empty = Cell::empty(self.background);
        self.buffers[self.next].fill(empty);
    }

    pub fn reset_all(&mut self) {
        let empty = Cell::empty(self.background);
        for buffer in &mut self.buffers {
            buffer.fill(empty);
        }
    }

    /// Cells in the current generation that hold a grain.
    pub fn live_count(&self) -> usize {
        self.current().iter().filter(|c| !c.is_empty()).count()
    }
}

fn split_pair(buffers: &mut [Vec<Cell>; 3], read: usize, write: usize) -> (&[Cell], &mut [Cell]) {
    debug_assert_ne!(read, write);
    if read < write {
        let (lo, hi) = buffers.split_at_mut(write);
        (lo[read].as_slice(), hi[0].as_mut_slice())
    } else {
        let (lo, hi) = buffers.split_at_mut(read);
        (hi[0].as_slice(), lo[write].as_mut_slice())
    }
}
