/// Number of latched frames between two banner visibility toggles.
pub const DEFAULT_BLINK_CADENCE: u32 = 5;

/// Phase of the warning banner blink cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlinkPhase {
    /// No detection latched yet; the banner is never shown.
    #[default]
    Dormant,
    Visible,
    Hidden,
}

/// Frame-synchronous blink state machine for a single video.
///
/// The controller stays `Dormant` until the session latch is set. The first latched frame
/// activates it in `Visible`, and from then on every `cadence` processed frames flip the banner
/// between `Visible` and `Hidden`. Blinking is driven by frame count, not wall-clock time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlinkController {
    phase: BlinkPhase,
    counter: u32,
    cadence: u32,
}

impl Default for BlinkController {
    fn default() -> Self {
        BlinkController::new(DEFAULT_BLINK_CADENCE)
    }
}

impl BlinkController {
    /// A cadence of 0 is treated as 1.
    pub fn new(cadence: u32) -> Self {
        BlinkController {
            phase: BlinkPhase::Dormant,
            counter: 0,
            cadence: cadence.max(1),
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn cadence(&self) -> u32 {
        self.cadence
    }

    /// Whether the banner should be drawn on the current frame given the session latch
    /// (including detections on this very frame).
    pub fn banner_visible(&self, latched: bool) -> bool {
        latched && matches!(self.phase, BlinkPhase::Dormant | BlinkPhase::Visible)
    }

    /// Advances the cycle after a frame has been processed. Does nothing until `latched`.
    pub fn advance(&mut self, latched: bool) {
        self.phase = next_phase(self.phase, &mut self.counter, self.cadence, latched);
    }
}

fn next_phase(phase: BlinkPhase, counter: &mut u32, cadence: u32, latched: bool) -> BlinkPhase {
    if !latched {
        return phase;
    }
    let phase = match phase {
        BlinkPhase::Dormant => BlinkPhase::Visible,
        active => active,
    };
    *counter += 1;
    if *counter < cadence {
        return phase;
    }
    *counter = 0;
    match phase {
        BlinkPhase::Visible => BlinkPhase::Hidden,
        _ => BlinkPhase::Visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_dormant_without_latch() {
        let mut blink = BlinkController::default();
        for _ in 0..100 {
            assert!(!blink.banner_visible(false));
            blink.advance(false);
            assert_eq!(blink.phase(), BlinkPhase::Dormant);
            assert_eq!(blink.counter(), 0);
        }
    }

    #[test]
    fn toggles_every_cadence_frames_once_latched() {
        let mut blink = BlinkController::new(5);
        assert!(blink.banner_visible(true));

        let mut visibility = Vec::new();
        for _ in 0..20 {
            visibility.push(blink.banner_visible(true));
            blink.advance(true);
        }
        let expected: Vec<bool> = (0..20).map(|frame| (frame / 5) % 2 == 0).collect();
        assert_eq!(visibility, expected);
    }

    #[test]
    fn first_toggle_after_five_latched_updates() {
        let mut blink = BlinkController::new(5);
        for step in 1..=4 {
            blink.advance(true);
            assert_eq!(blink.phase(), BlinkPhase::Visible, "step {}", step);
        }
        blink.advance(true);
        assert_eq!(blink.phase(), BlinkPhase::Hidden);
        assert_eq!(blink.counter(), 0);
        assert!(!blink.banner_visible(true));
    }

    #[test]
    fn latch_is_what_activates_the_cycle() {
        let mut blink = BlinkController::new(5);
        for _ in 0..7 {
            blink.advance(false);
        }
        blink.advance(true);
        assert_eq!(blink.phase(), BlinkPhase::Visible);
        assert_eq!(blink.counter(), 1);
    }

    #[test]
    fn zero_cadence_toggles_every_frame() {
        let mut blink = BlinkController::new(0);
        assert_eq!(blink.cadence(), 1);
        blink.advance(true);
        assert_eq!(blink.phase(), BlinkPhase::Hidden);
        blink.advance(true);
        assert_eq!(blink.phase(), BlinkPhase::Visible);
    }
}
