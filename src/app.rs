use crate::clock::{Clock, SystemClock};
use crate::config::Args;
use crate::input::{collect_actions, Action};
use crate::logging;
use crate::render::TerminalSink;
use crate::sim::Simulation;
use crate::sink::PixelSink;
use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use std::time::Duration;
use tracing::{info, warn};

/// Terminal lines kept free under the matrix for the status line.
const STATUS_LINES: u16 = 1;

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    let (tw, th) = terminal::size().context("could not read terminal size")?;
    let fit_cols = (tw as usize).max(1);
    let fit_rows = (th.saturating_sub(STATUS_LINES) as usize * 2).max(1);
    let settings = args.settings(fit_cols, fit_rows)?;
    if settings.cols > fit_cols || settings.rows > fit_rows {
        warn!(
            cols = settings.cols,
            rows = settings.rows,
            fit_cols,
            fit_rows,
            "grid is larger than the terminal and will be clipped"
        );
    }
    info!(
        cols = settings.cols,
        rows = settings.rows,
        max_fps = settings.max_fps,
        fill = settings.percent_input_fill,
        mode = ?settings.color_mode,
        "starting"
    );

    let mut clock = SystemClock::new(args.seed);
    let mut sim = Simulation::new(settings.clone(), clock.now_millis());
    let mut sink = TerminalSink::begin(settings.cols, settings.rows, settings.background)?;

    let res = run_loop(&mut sim, &mut sink, &mut clock);
    let ended = sink.end();
    res?;
    ended
}

fn run_loop(
    sim: &mut Simulation,
    sink: &mut TerminalSink,
    clock: &mut SystemClock,
) -> anyhow::Result<()> {
    let frame_dt = Duration::from_millis(sim.settings().frame_interval_ms().max(1));
    let mut paused = false;

    loop {
        let mut dirty = false;
        for action in collect_actions(frame_dt)? {
            match action {
                Action::Quit => {
                    info!(frames = sim.frames(), "quit");
                    return Ok(());
                }
                Action::TogglePause => paused = !paused,
                Action::Reset => sim.reset(sink),
                Action::MoveInput(delta) => sim.nudge_input(delta),
                Action::Redraw => sink.invalidate(),
            }
            dirty = true;
        }

        sink.set_status(status_line(sim, paused));
        if paused {
            if dirty {
                sink.present()?;
            }
            std::thread::sleep(frame_dt);
            continue;
        }

        match sim.tick(sink, clock)? {
            Some(report) if report.injection.reset => {
                info!(frame = sim.frames(), "grid saturated and cleared");
            }
            Some(_) => {}
            None => std::thread::sleep(Duration::from_millis(1)),
        }
    }
}

fn status_line(sim: &Simulation, paused: bool) -> String {
    let s = sim.settings();
    format!(
        " {}x{}  grains {:>5}  drops {:>6}/{}  input {:>3}{}   q quit  space pause  r reset  \u{2190}/\u{2192} input",
        s.cols,
        s.rows,
        sim.grid().live_count(),
        sim.injector().drops(),
        s.saturation_limit(),
        sim.injector().input_x(),
        if paused { "  [paused]" } else { "" },
    )
}
