use crate::color::Rgb;

/// Render target addressed by logical `(col, row)`, row 0 at the top.
/// Physical wiring is the implementor's business.
pub trait PixelSink {
    fn set_color(&mut self, col: usize, row: usize, color: Rgb);
    fn get_color(&self, col: usize, row: usize) -> Rgb;
    fn clear(&mut self, color: Rgb);
    fn present(&mut self) -> anyhow::Result<()>;
}

/// Row-major frame buffer. Out-of-range writes are ignored and reads
/// return black.
#[derive(Clone, Debug)]
pub struct MemorySink {
    cols: usize,
    rows: usize,
    px: Vec<Rgb>,
    presented: u64,
}

impl MemorySink {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            px: vec![Rgb::BLACK; cols * rows],
            presented: 0,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.px
    }

    /// Number of frames handed to `present` so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl PixelSink for MemorySink {
    fn set_color(&mut self, col: usize, row: usize, color: Rgb) {
        if col < self.cols && row < self.rows {
            self.px[row * self.cols + col] = color;
        }
    }

    fn get_color(&self, col: usize, row: usize) -> Rgb {
        if col < self.cols && row < self.rows {
            self.px[row * self.cols + col]
        } else {
            Rgb::BLACK
        }
    }

    fn clear(&mut self, color: Rgb) {
        self.px.fill(color);
    }

    fn present(&mut self) -> anyhow::Result<()> {
        self.presented += 1;
        Ok(())
    }
}
