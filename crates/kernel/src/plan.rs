use std::cmp::Ordering;

/// Arguments handed to [`crate::DynamicsWorld::step_simulation`] for one frame.
///
/// Produced by reconciling a variable frame delta against a fixed internal
/// update rate under an optional substep cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepPlan {
    /// Elapsed wall-clock time to consume.
    pub time_step: f32,
    /// Upper bound on internal updates the backend may perform.
    pub max_sub_steps: i32,
    /// Size of each internal update.
    pub fixed_time_step: f32,
}

impl SubstepPlan {
    /// Plan one frame.
    ///
    /// The estimate is `floor(delta_time * internal_frequency_hz) + 1`. A
    /// negative `max_sub_steps` collapses the frame into a single step of
    /// `delta_time`; zero leaves the estimate uncapped; a positive value caps
    /// it. When the cap is hit the simulation falls behind real time instead
    /// of spending unbounded work.
    pub fn compute(delta_time: f32, internal_frequency_hz: f32, max_sub_steps: i32) -> Self {
        let mut fixed_time_step = 1.0 / internal_frequency_hz;
        let estimate = ((delta_time * internal_frequency_hz).floor() as i32).saturating_add(1);

        let sub_steps = match max_sub_steps.cmp(&0) {
            Ordering::Less => {
                fixed_time_step = delta_time;
                1
            }
            Ordering::Equal => estimate,
            Ordering::Greater => estimate.min(max_sub_steps),
        };

        Self {
            time_step: delta_time,
            max_sub_steps: sub_steps,
            fixed_time_step,
        }
    }

    /// Simulated time covered if every allowed substep runs.
    pub fn budgeted_time(&self) -> f32 {
        self.max_sub_steps as f32 * self.fixed_time_step
    }

    /// True when the cap leaves less simulated time than the frame delta,
    /// i.e. the world will lag behind wall-clock time this frame.
    pub fn falls_behind(&self) -> bool {
        self.time_step > self.budgeted_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_at_positive_max() {
        let plan = SubstepPlan::compute(1.0, 60.0, 10);
        assert_eq!(plan.time_step, 1.0);
        assert_eq!(plan.max_sub_steps, 10);
        assert_eq!(plan.fixed_time_step, 1.0 / 60.0);
        assert!(plan.falls_behind());
    }

    #[test]
    fn negative_max_uses_whole_delta_as_one_step() {
        let plan = SubstepPlan::compute(0.0167, 60.0, -1);
        assert_eq!(plan.time_step, 0.0167);
        assert_eq!(plan.max_sub_steps, 1);
        assert_eq!(plan.fixed_time_step, 0.0167);
    }

    #[test]
    fn negative_max_ignores_frequency() {
        for hz in [1.0_f32, 30.0, 60.0, 240.0, 1000.0] {
            for delta in [0.0_f32, 0.001, 0.016, 0.5, 3.0] {
                let plan = SubstepPlan::compute(delta, hz, -5);
                assert_eq!(plan.max_sub_steps, 1);
                assert_eq!(plan.fixed_time_step, delta);
            }
        }
    }

    #[test]
    fn zero_max_is_uncapped_estimate() {
        for hz in [30.0_f32, 60.0, 144.0] {
            for delta in [0.0_f32, 0.004, 0.0167, 0.1, 2.5, 10.0] {
                let plan = SubstepPlan::compute(delta, hz, 0);
                assert_eq!(plan.max_sub_steps, (delta * hz).floor() as i32 + 1);
                assert_eq!(plan.fixed_time_step, 1.0 / hz);
            }
        }
    }

    #[test]
    fn positive_max_never_exceeded() {
        for max in 1..=16 {
            for i in 0..200 {
                let delta = i as f32 * 0.013;
                let plan = SubstepPlan::compute(delta, 60.0, max);
                assert!(plan.max_sub_steps <= max);
                assert!(plan.max_sub_steps >= 1);
            }
        }
    }

    #[test]
    fn single_substep_cap_keeps_safety_margin_behaviour() {
        // A typical frame needs one step; the +1 margin asks for two, the cap trims to one.
        let plan = SubstepPlan::compute(1.0 / 60.0, 60.0, 1);
        assert_eq!(plan.max_sub_steps, 1);
    }

    #[test]
    fn huge_delta_saturates_instead_of_overflowing() {
        let plan = SubstepPlan::compute(f32::MAX, 60.0, 0);
        assert_eq!(plan.max_sub_steps, i32::MAX);
    }

    #[test]
    fn small_delta_within_budget() {
        let plan = SubstepPlan::compute(0.01, 60.0, 4);
        assert_eq!(plan.max_sub_steps, 1);
        assert!(!plan.falls_behind());
    }
}
