use crossterm::style::Color;

/// Brightest level any channel reaches on the hue wheel.
pub const COLOR_LEVEL_MAX: u8 = 192;
/// Per-advance change of the ramping channel.
pub const COLOR_STEP: u8 = 2;
/// Advances spent in each of the six phases.
pub const STEPS_PER_PHASE: usize = (COLOR_LEVEL_MAX / COLOR_STEP) as usize;
/// Advances needed to walk the whole wheel once.
pub const STEPS_PER_CYCLE: usize = STEPS_PER_PHASE * Phase::ALL.len();

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// One linear ramp of the hue wheel. Exactly one channel moves per phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    GreenUp,
    RedDown,
    BlueUp,
    GreenDown,
    RedUp,
    BlueDown,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::GreenUp,
        Phase::RedDown,
        Phase::BlueUp,
        Phase::GreenDown,
        Phase::RedUp,
        Phase::BlueDown,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Out-of-range indices wrap, so a stale hue index can never panic.
    pub fn from_index(i: u8) -> Phase {
        Phase::ALL[(i as usize) % Phase::ALL.len()]
    }

    pub fn next(self) -> Phase {
        Phase::from_index(self.index() + 1)
    }
}

/// One unit step of `phase` applied to `rgb`. Returns the phase to use for
/// the following step.
fn step(rgb: &mut Rgb, phase: Phase) -> Phase {
    let (channel, rising) = match phase {
        Phase::GreenUp => (&mut rgb.g, true),
        Phase::RedDown => (&mut rgb.r, false),
        Phase::BlueUp => (&mut rgb.b, true),
        Phase::GreenDown => (&mut rgb.g, false),
        Phase::RedUp => (&mut rgb.r, true),
        Phase::BlueDown => (&mut rgb.b, false),
    };

    if rising {
        *channel = channel.saturating_add(COLOR_STEP).min(COLOR_LEVEL_MAX);
        if *channel == COLOR_LEVEL_MAX {
            return phase.next();
        }
    } else {
        *channel = channel.saturating_sub(COLOR_STEP);
        if *channel == 0 {
            return phase.next();
        }
    }
    phase
}

/// Nudges `rgb` by one level on the red channel if it collides with the
/// background, so a grain never disappears into an empty cell.
pub fn distinct_from(rgb: Rgb, background: Rgb) -> Rgb {
    if rgb != background {
        return rgb;
    }
    let r = if rgb.r == u8::MAX { rgb.r - 1 } else { rgb.r + 1 };
    Rgb { r, ..rgb }
}

/// Per-grain variant of [`ColorCycle::advance`]: steps a grain's own color
/// buffer and hue index in place.
pub fn advance_in_place(rgb: &mut Rgb, hue_index: &mut u8, background: Rgb) {
    let next = step(rgb, Phase::from_index(*hue_index));
    *hue_index = next.index();
    *rgb = distinct_from(*rgb, background);
}

/// The shared hue wheel. Starts on pure red and walks six linear ramps.
#[derive(Clone, Debug)]
pub struct ColorCycle {
    rgb: Rgb,
    phase: Phase,
    background: Rgb,
}

impl ColorCycle {
    pub fn new(background: Rgb) -> Self {
        Self {
            rgb: Rgb::new(COLOR_LEVEL_MAX, 0, 0),
            phase: Phase::GreenUp,
            background,
        }
    }

    pub fn advance(&mut self) -> Rgb {
        self.phase = step(&mut self.rgb, self.phase);
        self.color()
    }

    /// Current output color, never equal to the background.
    pub fn color(&self) -> Rgb {
        distinct_from(self.rgb, self.background)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn background(&self) -> Rgb {
        self.background
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_closes_after_full_cycle() {
        let mut cycle = ColorCycle::new(Rgb::BLACK);
        let start = cycle.color();
        assert_eq!(STEPS_PER_CYCLE, 6 * (64 + 32));

        for _ in 0..STEPS_PER_CYCLE {
            cycle.advance();
        }
        assert_eq!(cycle.color(), start);
        assert_eq!(cycle.phase(), Phase::GreenUp);
    }

    #[test]
    fn each_phase_lasts_the_same_number_of_steps() {
        let mut cycle = ColorCycle::new(Rgb::BLACK);
        for phase in Phase::ALL {
            assert_eq!(cycle.phase(), phase);
            for _ in 0..STEPS_PER_PHASE {
                cycle.advance();
            }
        }
        assert_eq!(cycle.phase(), Phase::GreenUp);
    }

    #[test]
    fn ramps_hit_the_six_corners() {
        let mut cycle = ColorCycle::new(Rgb::BLACK);
        let corners = [
            Rgb::new(192, 192, 0),
            Rgb::new(0, 192, 0),
            Rgb::new(0, 192, 192),
            Rgb::new(0, 0, 192),
            Rgb::new(192, 0, 192),
            Rgb::new(192, 0, 0),
        ];
        for corner in corners {
            for _ in 0..STEPS_PER_PHASE {
                cycle.advance();
            }
            assert_eq!(cycle.color(), corner);
        }
    }

    #[test]
    fn output_never_equals_background() {
        // A background sitting right on the wheel.
        let background = Rgb::new(192, 96, 0);
        let mut cycle = ColorCycle::new(background);
        let mut collided = false;
        for _ in 0..STEPS_PER_CYCLE * 2 {
            let c = cycle.advance();
            assert_ne!(c, background);
            if c == Rgb::new(193, 96, 0) {
                collided = true;
            }
        }
        assert!(collided, "the bump path was never taken");
    }

    #[test]
    fn bump_goes_down_at_channel_max() {
        let bg = Rgb::new(255, 10, 10);
        assert_eq!(distinct_from(bg, bg), Rgb::new(254, 10, 10));
        assert_eq!(distinct_from(Rgb::BLACK, bg), Rgb::BLACK);
    }

    #[test]
    fn in_place_matches_shared_wheel() {
        let mut cycle = ColorCycle::new(Rgb::BLACK);
        let mut rgb = cycle.color();
        let mut hue = cycle.phase().index();
        for _ in 0..STEPS_PER_CYCLE + 17 {
            let shared = cycle.advance();
            advance_in_place(&mut rgb, &mut hue, Rgb::BLACK);
            assert_eq!(rgb, shared);
            assert_eq!(Phase::from_index(hue), cycle.phase());
        }
    }

    #[test]
    fn in_place_recovers_from_odd_levels() {
        let mut rgb = Rgb::new(192, 191, 0);
        let mut hue = Phase::GreenUp.index();
        advance_in_place(&mut rgb, &mut hue, Rgb::BLACK);
        assert_eq!(rgb, Rgb::new(192, 192, 0));
        assert_eq!(Phase::from_index(hue), Phase::RedDown);
    }
}
