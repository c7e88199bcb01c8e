//! Frame-level stepping of a concentration field.

use crate::field::ConcentrationField;
use crate::mask::TextMask;
use crate::params::ParamSource;

/// What one call to [`FieldStepper::advance_frame`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Full cycles run.
    pub cycles: u32,
    /// Half-steps run (always `2 * cycles`).
    pub half_steps: u64,
    /// Cells written across all half-steps.
    pub cell_updates: u64,
}

impl FrameStats {
    /// Stats for `cycles` full cycles over a field of `cells` cells.
    pub fn for_cycles(cycles: u32, cells: usize) -> Self {
        let half_steps = cycles as u64 * 2;
        Self {
            cycles,
            half_steps,
            cell_updates: half_steps.saturating_mul(cells as u64),
        }
    }
}

/// Advances a field by whole cycles.
///
/// A cycle is two half-steps: current to other, then other back to current.
/// After any number of cycles the field's current buffer is the one it
/// started with, so readers between frames never see a half-written state.
#[derive(Clone, Debug, Default)]
pub struct FieldStepper {
    frames: u64,
}

impl FieldStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames advanced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one displayed frame worth of cycles.
    ///
    /// The cycle count is read once at the start of the frame; feed, kill
    /// and dt are re-read from `params` at the start of every cycle.
    pub fn advance_frame<P: ParamSource + ?Sized>(
        &mut self,
        field: &mut ConcentrationField,
        mask: &TextMask,
        params: &P,
    ) -> FrameStats {
        let cycles = params.snapshot().iterations_per_frame.max(1);
        let start = field.current_index();

        for _ in 0..cycles {
            let snapshot = params.snapshot();
            field.half_step(mask, &snapshot);
            field.half_step(mask, &snapshot);
        }
        debug_assert_eq!(field.current_index(), start);

        self.frames += 1;
        FrameStats::for_cycles(cycles, field.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimulationParams;

    #[test]
    fn test_frame_runs_configured_cycles() {
        let mut field = ConcentrationField::new(10, 10).unwrap();
        let mask = TextMask::new(10, 10).unwrap();
        let mut stepper = FieldStepper::new();
        let params = SimulationParams::default().with_iterations(3);

        let stats = stepper.advance_frame(&mut field, &mask, &params);
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.half_steps, 6);
        assert_eq!(stats.cell_updates, 600);
        assert_eq!(field.half_steps(), 6);
        assert_eq!(field.current_index(), 0);
        assert_eq!(stepper.frames(), 1);
    }

    #[test]
    fn test_stats_for_huge_cycle_counts_do_not_overflow() {
        let stats = FrameStats::for_cycles(u32::MAX, 300 * 300);
        assert_eq!(stats.half_steps, u32::MAX as u64 * 2);
        assert_eq!(stats.cell_updates, u32::MAX as u64 * 2 * 90_000);

        let stats = FrameStats::for_cycles(u32::MAX / 2 + 1, 1);
        assert_eq!(stats.half_steps, 1u64 << 32);

        let stats = FrameStats::for_cycles(u32::MAX, usize::MAX);
        assert_eq!(stats.cell_updates, u64::MAX);
    }

    #[test]
    fn test_zero_iterations_still_runs_one_cycle() {
        let mut field = ConcentrationField::new(4, 4).unwrap();
        let mask = TextMask::new(4, 4).unwrap();
        let params = SimulationParams {
            iterations_per_frame: 0,
            ..SimulationParams::default()
        };
        let stats = FieldStepper::new().advance_frame(&mut field, &mask, &params);
        assert_eq!(stats.cycles, 1);
    }

    #[test]
    fn test_parameter_change_keeps_state() {
        let mut field = ConcentrationField::new(20, 20).unwrap();
        let mut mask = TextMask::new(20, 20).unwrap();
        mask.set(10, 10, 1.0);
        let mut stepper = FieldStepper::new();

        stepper.advance_frame(&mut field, &mask, &SimulationParams::default());
        let before = field.total_b();
        assert!(before > 0.0);

        let other = SimulationParams::default().with_feed_kill(0.029, 0.057);
        stepper.advance_frame(&mut field, &mask, &other);
        // Switching parameters continues from the existing pattern
        assert!(field.total_b() > 0.0);
        assert_eq!(field.half_steps(), 16);
    }
}
