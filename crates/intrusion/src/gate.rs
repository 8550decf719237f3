//! Entry state machine with cooldown

use frame_source::effective_fps;
use tracing::{debug, info};

/// Zone occupancy as seen on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneState {
    #[default]
    Outside,
    Inside,
}

impl From<bool> for ZoneState {
    fn from(inside: bool) -> Self {
        if inside {
            ZoneState::Inside
        } else {
            ZoneState::Outside
        }
    }
}

/// Everything the gate remembers between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CooldownState {
    /// Occupancy on the previous frame
    pub previous: ZoneState,
    /// Frame of the last trigger; `None` until the first one
    pub last_event_frame: Option<u64>,
}

/// Outcome of feeding one frame to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Outside → inside edge, outside the cooldown window: record an event
    Trigger,
    /// Outside → inside edge suppressed by the cooldown window
    Cooldown,
    /// No entry edge on this frame
    Hold,
}

/// Cooldown length in frames: `round(fps * seconds)`, with the default
/// frame rate when the source reports none.
pub fn cooldown_frames(fps: Option<f64>, cooldown_seconds: f64) -> u64 {
    (effective_fps(fps) * cooldown_seconds.max(0.0)).round() as u64
}

/// Decides which frames are new zone entries.
///
/// Two states only (outside / inside), no per-person identity. A trigger
/// needs an outside → inside edge and more than `cooldown_frames` frames
/// since the previous trigger.
#[derive(Debug, Clone)]
pub struct EntryGate {
    cooldown_frames: u64,
    state: CooldownState,
}

impl EntryGate {
    pub fn new(cooldown_frames: u64) -> Self {
        Self {
            cooldown_frames,
            state: CooldownState::default(),
        }
    }

    /// Gate for a stream at `fps` with a cooldown given in seconds
    pub fn from_fps(fps: Option<f64>, cooldown_seconds: f64) -> Self {
        let frames = cooldown_frames(fps, cooldown_seconds);
        info!(
            "Entry gate: {:.1}s cooldown = {} frames at {:.2} fps",
            cooldown_seconds,
            frames,
            effective_fps(fps)
        );
        Self::new(frames)
    }

    pub fn cooldown(&self) -> u64 {
        self.cooldown_frames
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    /// Decision for this frame without changing state
    pub fn peek(&self, frame_index: u64, current_inside: bool) -> GateDecision {
        let entering = current_inside && self.state.previous == ZoneState::Outside;
        if !entering {
            return GateDecision::Hold;
        }

        let cooled_down = match self.state.last_event_frame {
            None => true,
            Some(last) => frame_index.saturating_sub(last) > self.cooldown_frames,
        };
        if cooled_down {
            GateDecision::Trigger
        } else {
            GateDecision::Cooldown
        }
    }

    /// Apply a decision made by [`peek`](Self::peek) for the same frame.
    ///
    /// A trigger moves the cooldown anchor; occupancy is always carried forward.
    pub fn commit(&mut self, frame_index: u64, current_inside: bool, decision: GateDecision) {
        match decision {
            GateDecision::Trigger => self.state.last_event_frame = Some(frame_index),
            GateDecision::Cooldown => debug!(
                "Entry at frame {} suppressed: in cooldown period (last event at {:?})",
                frame_index, self.state.last_event_frame
            ),
            GateDecision::Hold => {}
        }
        self.state.previous = ZoneState::from(current_inside);
    }

    /// `peek` then `commit`
    pub fn observe(&mut self, frame_index: u64, current_inside: bool) -> GateDecision {
        let decision = self.peek(frame_index, current_inside);
        self.commit(frame_index, current_inside, decision);
        decision
    }

    /// Back to the start-of-run state
    pub fn reset(&mut self) {
        self.state = CooldownState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cooldown_frames() {
        assert_eq!(cooldown_frames(Some(25.0), 2.0), 50);
        assert_eq!(cooldown_frames(Some(29.97), 2.0), 60);
        assert_eq!(cooldown_frames(None, 2.0), 50);
        assert_eq!(cooldown_frames(Some(30.0), 0.0), 0);
        assert_eq!(cooldown_frames(Some(30.0), -1.0), 0);
    }

    #[test]
    fn test_first_entry_always_triggers() {
        let mut gate = EntryGate::new(u64::MAX);
        assert_eq!(gate.observe(0, true), GateDecision::Trigger);
        assert_eq!(gate.state().last_event_frame, Some(0));
    }

    #[test]
    fn test_stay_inside_triggers_once() {
        let mut gate = EntryGate::new(50);
        assert_eq!(gate.observe(0, true), GateDecision::Trigger);
        for i in 1..500 {
            assert_eq!(gate.observe(i, true), GateDecision::Hold);
        }
    }

    #[test]
    fn test_reentry_after_cooldown() {
        let mut gate = EntryGate::from_fps(Some(25.0), 2.0);
        assert_eq!(gate.observe(0, true), GateDecision::Trigger);
        assert_eq!(gate.observe(10, true), GateDecision::Hold);
        assert_eq!(gate.observe(20, false), GateDecision::Hold);
        assert_eq!(gate.observe(60, true), GateDecision::Trigger);
        assert_eq!(gate.state().last_event_frame, Some(60));
    }

    #[test]
    fn test_reentry_inside_cooldown_is_suppressed() {
        let mut gate = EntryGate::new(50);
        assert_eq!(gate.observe(0, true), GateDecision::Trigger);
        assert_eq!(gate.observe(20, false), GateDecision::Hold);
        assert_eq!(gate.observe(40, true), GateDecision::Cooldown);
        // still inside once the window passes: no edge, no trigger
        assert_eq!(gate.observe(51, true), GateDecision::Hold);
        assert_eq!(gate.observe(52, false), GateDecision::Hold);
        assert_eq!(gate.observe(53, true), GateDecision::Trigger);
    }

    #[test]
    fn test_gap_equal_to_cooldown_is_suppressed() {
        let mut gate = EntryGate::new(50);
        gate.observe(0, true);
        gate.observe(1, false);
        assert_eq!(gate.observe(50, true), GateDecision::Cooldown);
        gate.observe(51, false);
        assert_eq!(gate.observe(52, true), GateDecision::Trigger);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let gate = EntryGate::new(10);
        assert_eq!(gate.peek(0, true), GateDecision::Trigger);
        assert_eq!(gate.state(), CooldownState::default());
    }

    #[test]
    fn test_reset() {
        let mut gate = EntryGate::new(100);
        gate.observe(0, true);
        gate.reset();
        assert_eq!(gate.observe(1, true), GateDecision::Trigger);
    }

    proptest! {
        #[test]
        fn prop_trigger_law(
            inside in proptest::collection::vec(any::<bool>(), 1..300),
            cooldown in 0u64..40,
        ) {
            let mut gate = EntryGate::new(cooldown);
            let mut previous = false;
            let mut last: Option<u64> = None;

            for (i, &now) in inside.iter().enumerate() {
                let i = i as u64;
                let expected = now
                    && !previous
                    && last.map_or(true, |l| i - l > cooldown);
                let decision = gate.observe(i, now);

                prop_assert_eq!(decision == GateDecision::Trigger, expected);
                if expected {
                    last = Some(i);
                }
                prop_assert_eq!(gate.state().last_event_frame, last);
                previous = now;
            }
        }
    }
}
