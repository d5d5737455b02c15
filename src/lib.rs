//! Falling-sand cellular automaton for addressable LED matrices.
//!
//! A [`Simulation`] owns three generations of the grid and advances them one
//! frame per [`Simulation::tick`]. Pixels go out through a [`PixelSink`];
//! time and randomness come in through a [`Clock`]. The binary drives it in a
//! terminal, with [`render::TerminalSink`] standing in for the matrix.

pub mod app;
pub mod clock;
pub mod color;
pub mod config;
pub mod fall;
pub mod grid;
pub mod inject;
mod input;
pub mod layout;
pub mod logging;
pub mod reactivate;
pub mod render;
pub mod sim;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{ColorCycle, Rgb};
pub use config::{ColorMode, Settings};
pub use grid::{Cell, CellState, GridStore};
pub use sim::{FrameReport, Simulation};
pub use sink::{MemorySink, PixelSink};
