use crate::color::Rgb;
use crate::sink::{MemorySink, PixelSink};
use anyhow::Context;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '▀';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

/// Folds a logical frame into half-block cells, two pixel rows per line.
pub(crate) fn frame_to_cells(frame: &MemorySink, background: Rgb, out: &mut CellBuffer) {
    for cy in 0..out.h {
        for cx in 0..out.w {
            let (col, row) = (cx as usize, cy as usize * 2);
            if col >= frame.cols() || row >= frame.rows() {
                continue;
            }
            let top = frame.get_color(col, row);
            let bottom = if row + 1 < frame.rows() {
                frame.get_color(col, row + 1)
            } else {
                background
            };
            out.set(
                cx,
                cy,
                Cell {
                    ch: HALF_BLOCK,
                    fg: top.to_color(),
                    bg: bottom.to_color(),
                },
            );
        }
    }
}

/// Lines of terminal needed to show `rows` pixel rows.
pub fn lines_for_rows(rows: usize) -> usize {
    rows.div_ceil(2)
}

/// The terminal standing in for an LED matrix. Pixels land in a logical
/// frame; `present` redraws only the cells that changed.
pub struct TerminalSink {
    out: io::Stdout,
    frame: MemorySink,
    background: Rgb,
    prev: CellBuffer,
    cur: CellBuffer,
    status: String,
    full_redraw: bool,
}

impl TerminalSink {
    pub fn begin(cols: usize, rows: usize, background: Rgb) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        enter_screen(&mut out, terminal::enable_raw_mode)?;

        let w = u16::try_from(cols).unwrap_or(u16::MAX);
        let h = u16::try_from(lines_for_rows(rows)).unwrap_or(u16::MAX);
        let mut frame = MemorySink::new(cols, rows);
        frame.clear(background);

        Ok(Self {
            out,
            frame,
            background,
            prev: CellBuffer::new(w, h),
            cur: CellBuffer::new(w, h),
            status: String::new(),
            full_redraw: true,
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// One line of text shown under the matrix.
    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Forces the next `present` to repaint everything, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.full_redraw = true;
    }

    fn draw_status(&mut self) -> io::Result<()> {
        let (term_cols, _) = terminal::size()?;
        let line: String = self.status.chars().take(term_cols as usize).collect();
        queue!(
            self.out,
            cursor::MoveTo(0, self.cur.h),
            ResetColor,
            terminal::Clear(ClearType::CurrentLine),
            Print(line)
        )
    }
}

/// Switches to the alternate screen, then runs `raw_mode`. If that fails the
/// screen is restored before the error is returned.
fn enter_screen<W, F>(out: &mut W, raw_mode: F) -> anyhow::Result<()>
where
    W: Write,
    F: FnOnce() -> io::Result<()>,
{
    execute!(
        out,
        EnterAlternateScreen,
        cursor::Hide,
        DisableLineWrap,
        terminal::Clear(ClearType::All)
    )
    .context("failed to enter alternate screen")?;

    if let Err(e) = raw_mode() {
        let _ = execute!(out, cursor::Show, EnableLineWrap, LeaveAlternateScreen);
        return Err(e).context("failed to enable raw mode");
    }
    Ok(())
}

impl PixelSink for TerminalSink {
    fn set_color(&mut self, col: usize, row: usize, color: Rgb) {
        self.frame.set_color(col, row, color);
    }

    fn get_color(&self, col: usize, row: usize) -> Rgb {
        self.frame.get_color(col, row)
    }

    fn clear(&mut self, color: Rgb) {
        self.frame.clear(color);
    }

    fn present(&mut self) -> anyhow::Result<()> {
        frame_to_cells(&self.frame, self.background, &mut self.cur);

        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.cur.h {
            for x in 0..self.cur.w {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !self.full_redraw && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        self.draw_status()?;
        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;

        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}
