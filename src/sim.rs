use crate::clock::{Clock, Deadline};
use crate::color::{self, ColorCycle};
use crate::config::{ColorMode, Settings};
use crate::fall::{self, FallRules};
use crate::grid::GridStore;
use crate::inject::{Injection, Injector};
use crate::reactivate::reactivate;
use crate::sink::PixelSink;
use tracing::{debug, trace};

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub injection: Injection,
    pub moved: usize,
    pub woken: usize,
    pub recolored: bool,
}

/// One sand simulation: grid generations, hue wheel, injector and timers.
pub struct Simulation {
    settings: Settings,
    rules: FallRules,
    grid: GridStore,
    colors: ColorCycle,
    injector: Injector,
    recolor: Deadline,
    last_frame_at: Option<u64>,
    departures: Vec<(usize, usize)>,
    frames: u64,
}

impl Simulation {
    /// `settings` must already be validated.
    pub fn new(settings: Settings, now: u64) -> Self {
        let grid = GridStore::new(settings.rows, settings.cols, settings.background);
        let rules = FallRules {
            max_velocity: settings.max_velocity,
            gravity: settings.gravity,
            background: settings.background,
        };
        Self {
            rules,
            colors: ColorCycle::new(settings.background),
            injector: Injector::new(&settings, now),
            recolor: Deadline::new(settings.color_interval_ms, now),
            last_frame_at: None,
            departures: Vec::with_capacity(settings.rows * settings.cols),
            frames: 0,
            grid,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridStore {
        &mut self.grid
    }

    pub fn colors(&self) -> &ColorCycle {
        &self.colors
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn nudge_input(&mut self, delta: i32) {
        self.injector.nudge_input(delta, self.settings.cols);
    }

    /// Clears every generation, the render target and the drop counter.
    pub fn reset<S: PixelSink + ?Sized>(&mut self, sink: &mut S) {
        self.grid.reset_all();
        self.injector.reset_drops();
        sink.clear(self.settings.background);
        debug!("simulation reset");
    }

    /// Runs one frame if the frame interval has elapsed since the last one.
    /// An early call changes nothing and returns `None`.
    pub fn tick<S, C>(&mut self, sink: &mut S, clock: &mut C) -> anyhow::Result<Option<FrameReport>>
    where
        S: PixelSink + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.now_millis();
        if let Some(last) = self.last_frame_at {
            if now.saturating_sub(last) < self.settings.frame_interval_ms() {
                return Ok(None);
            }
        }
        self.last_frame_at = Some(now);

        let recolored = self.recolor.fire(now);
        if recolored {
            self.colors.advance();
        }
        let injection = self.injector.inject(&mut self.grid, &self.colors, sink, clock);

        let mut report = self.step(sink, clock, recolored);
        report.injection = injection;
        sink.present()?;

        trace!(
            frame = self.frames,
            live = self.grid.live_count(),
            seeded = injection.seeded,
            moved = report.moved,
            "frame"
        );
        Ok(Some(report))
    }

    /// Resolves, reactivates and swaps one generation, with no pacing and no
    /// injection. `recolor` advances per-grain hues when that mode is on.
    pub fn step<S, C>(&mut self, sink: &mut S, clock: &mut C, recolor: bool) -> FrameReport
    where
        S: PixelSink + ?Sized,
        C: Clock + ?Sized,
    {
        self.grid.clear_next();
        self.departures.clear();

        let mut frame = self.grid.frame();
        let moved = fall::resolve(&mut frame, &self.rules, sink, clock, &mut self.departures);

        let mut woken = 0;
        for &(row, col) in &self.departures {
            woken += reactivate(&mut frame, row, col, self.settings.adjacent_velocity_reset);
        }

        let recolored = recolor && self.settings.color_mode == ColorMode::PerGrain;
        if recolored {
            let background = self.settings.background;
            for (i, cell) in frame.next.iter_mut().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                color::advance_in_place(&mut cell.color, &mut cell.hue_index, background);
                sink.set_color(i % frame.cols, i / frame.cols, cell.color);
            }
        }

        self.grid.swap();
        self.frames += 1;

        FrameReport {
            injection: Injection::default(),
            moved,
            woken,
            recolored,
        }
    }
}
