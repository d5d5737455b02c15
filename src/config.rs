use crate::color::Rgb;
use anyhow::{ensure, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Grains keep the wheel color they were dropped with.
    Shared,
    /// Every grain walks the wheel on its own.
    PerGrain,
}

/// Everything the simulation needs, fixed for the lifetime of a run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub rows: usize,
    pub cols: usize,
    pub max_velocity: i32,
    pub gravity: i32,
    pub adjacent_velocity_reset: i32,
    pub percent_input_fill: u8,
    pub input_width: usize,
    pub input_x: usize,
    pub input_y: usize,
    pub max_fps: u32,
    pub color_interval_ms: u64,
    pub input_drift_ms: u64,
    pub color_mode: ColorMode,
    pub background: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            max_velocity: 2,
            gravity: 1,
            adjacent_velocity_reset: 1,
            percent_input_fill: 20,
            input_width: 2,
            input_x: 16,
            input_y: 0,
            max_fps: 30,
            color_interval_ms: 50,
            input_drift_ms: 4000,
            color_mode: ColorMode::Shared,
            background: Rgb::BLACK,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.rows > 0 && self.cols > 0, "grid must be at least 1x1");
        ensure!(
            i32::try_from(self.rows).is_ok() && i32::try_from(self.cols).is_ok(),
            "grid dimensions too large: {}x{}",
            self.rows,
            self.cols
        );
        ensure!(self.max_velocity >= 1, "max velocity must be at least 1");
        ensure!(self.gravity >= 0, "gravity must not be negative");
        ensure!(
            self.percent_input_fill <= 100,
            "input fill is a percentage, got {}",
            self.percent_input_fill
        );
        ensure!(
            self.input_width >= 1 && self.input_width <= self.rows.max(self.cols),
            "input width must be between 1 and {}, got {}",
            self.rows.max(self.cols),
            self.input_width
        );
        ensure!(
            self.input_x < self.cols && self.input_y < self.rows,
            "input origin ({}, {}) lies outside a {}x{} grid",
            self.input_x,
            self.input_y,
            self.cols,
            self.rows
        );
        ensure!(self.max_fps >= 1, "max fps must be at least 1");
        Ok(())
    }

    /// Minimum time between two frames.
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / self.max_fps.max(1) as u64
    }

    /// Drop count past which the whole grid is cleared.
    pub fn saturation_limit(&self) -> u64 {
        (self.input_width as u64)
            .saturating_mul(self.rows as u64)
            .saturating_mul(self.cols as u64)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "sandmatrix")]
#[command(about = "Falling-sand LED matrix, shown in the terminal", long_about = None)]
pub struct Args {
    /// grid rows (0 = fit the terminal, two rows per line)
    #[arg(long, default_value_t = 0)]
    pub rows: usize,

    /// grid columns (0 = fit the terminal)
    #[arg(long, default_value_t = 0)]
    pub cols: usize,

    /// cap on rows a grain may fall in one frame
    #[arg(long, default_value_t = 2)]
    pub max_velocity: i32,

    /// velocity added every frame a grain keeps falling
    #[arg(long, default_value_t = 1)]
    pub gravity: i32,

    /// velocity given to a settled grain that lost its support
    #[arg(long, default_value_t = 1)]
    pub adjacent_reset: i32,

    /// chance (percent) that an input cell drops a grain each frame
    #[arg(long, default_value_t = 20)]
    pub fill: u8,

    /// side of the square input window
    #[arg(long, default_value_t = 2)]
    pub input_width: usize,

    /// input column (default: center)
    #[arg(long)]
    pub input_x: Option<usize>,

    /// input row
    #[arg(long, default_value_t = 0)]
    pub input_y: usize,

    /// frame rate cap
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// milliseconds between hue steps
    #[arg(long, default_value_t = 50)]
    pub color_ms: u64,

    /// milliseconds between input column jumps (0 = only when blocked)
    #[arg(long, default_value_t = 4000)]
    pub drift_ms: u64,

    /// let every grain cycle its own hue
    #[arg(long, default_value_t = false)]
    pub per_grain: bool,

    /// empty-cell color as RRGGBB hex
    #[arg(long, default_value = "000000", value_parser = parse_rgb)]
    pub background: Rgb,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// write tracing output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Resolves terminal-relative defaults against the usable grid size and
    /// validates the result.
    pub fn settings(&self, fit_cols: usize, fit_rows: usize) -> Result<Settings> {
        let cols = if self.cols == 0 { fit_cols } else { self.cols };
        let rows = if self.rows == 0 { fit_rows } else { self.rows };
        let settings = Settings {
            rows,
            cols,
            max_velocity: self.max_velocity,
            gravity: self.gravity,
            adjacent_velocity_reset: self.adjacent_reset,
            percent_input_fill: self.fill,
            input_width: self.input_width,
            input_x: self.input_x.unwrap_or(cols / 2),
            input_y: self.input_y,
            max_fps: self.fps,
            color_interval_ms: self.color_ms,
            input_drift_ms: self.drift_ms,
            color_mode: if self.per_grain {
                ColorMode::PerGrain
            } else {
                ColorMode::Shared
            },
            background: self.background,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected RRGGBB, got {s:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad hex in {s:?}: {e}"))
    };
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}
