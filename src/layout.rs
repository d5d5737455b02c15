//! Logical `(col, row)` to physical LED index for tiled matrix panels.
//!
//! Panels are tiled left to right, then top to bottom, and each panel is
//! wired as one run of the strip. Within a panel the strip either walks rows
//! or columns, optionally reversing direction on every other run
//! (serpentine).

use crate::color::Rgb;
use crate::sink::PixelSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wiring {
    RowMajor,
    SerpentineRows,
    ColumnMajor,
    SerpentineColumns,
}

#[derive(Clone, Debug)]
pub struct PanelLayout {
    cols: usize,
    rows: usize,
    mapping_by_xy: Vec<u32>,
}

impl PanelLayout {
    pub fn new(
        panel_cols: usize,
        panel_rows: usize,
        panels_across: usize,
        panels_down: usize,
        wiring: Wiring,
    ) -> Self {
        let cols = panel_cols * panels_across;
        let rows = panel_rows * panels_down;
        let per_panel = panel_cols * panel_rows;

        let mut mapping_by_xy = vec![0u32; cols * rows];
        for row in 0..rows {
            for col in 0..cols {
                let panel = (row / panel_rows) * panels_across + col / panel_cols;
                let (lc, lr) = (col % panel_cols, row % panel_rows);
                let local = match wiring {
                    Wiring::RowMajor => lr * panel_cols + lc,
                    Wiring::SerpentineRows if lr % 2 == 1 => lr * panel_cols + (panel_cols - 1 - lc),
                    Wiring::SerpentineRows => lr * panel_cols + lc,
                    Wiring::ColumnMajor => lc * panel_rows + lr,
                    Wiring::SerpentineColumns if lc % 2 == 1 => {
                        lc * panel_rows + (panel_rows - 1 - lr)
                    }
                    Wiring::SerpentineColumns => lc * panel_rows + lr,
                };
                mapping_by_xy[row * cols + col] = (panel * per_panel + local) as u32;
            }
        }

        Self {
            cols,
            rows,
            mapping_by_xy,
        }
    }

    /// A single panel covering the whole grid.
    pub fn single(cols: usize, rows: usize, wiring: Wiring) -> Self {
        Self::new(cols, rows, 1, 1, wiring)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.mapping_by_xy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping_by_xy.is_empty()
    }

    pub fn index(&self, col: usize, row: usize) -> Option<usize> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(self.mapping_by_xy[row * self.cols + col] as usize)
    }
}

/// Pixel sink holding colors in physical strip order. `present` latches the
/// working buffer into the frame the strip would show.
pub struct StripSink {
    layout: PanelLayout,
    leds: Vec<Rgb>,
    shown: Vec<Rgb>,
}

impl StripSink {
    pub fn new(layout: PanelLayout) -> Self {
        let n = layout.len();
        Self {
            layout,
            leds: vec![Rgb::BLACK; n],
            shown: vec![Rgb::BLACK; n],
        }
    }

    /// The last presented frame, indexed by LED position on the strip.
    pub fn shown(&self) -> &[Rgb] {
        &self.shown
    }
}

impl PixelSink for StripSink {
    fn set_color(&mut self, col: usize, row: usize, color: Rgb) {
        if let Some(i) = self.layout.index(col, row) {
            self.leds[i] = color;
        }
    }

    fn get_color(&self, col: usize, row: usize) -> Rgb {
        self.layout
            .index(col, row)
            .map(|i| self.leds[i])
            .unwrap_or(Rgb::BLACK)
    }

    fn clear(&mut self, color: Rgb) {
        self.leds.fill(color);
    }

    fn present(&mut self) -> anyhow::Result<()> {
        self.shown.copy_from_slice(&self.leds);
        Ok(())
    }
}
