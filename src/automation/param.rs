use std::sync::Arc;

use crate::MIN_GAIN;

/*
Parameter Automation
====================

Gains and frequencies are not written sample by sample. Instead callers
schedule where a parameter should be at some future point on the audio clock
and the timeline fills in the values between.

Vocabulary
----------

  event       One scheduled change: jump to a value, ramp to a value, or play
              back an explicit curve of values.

  base        Value the parameter has before any event. Completed events are
              folded into it when the timeline is pruned.

  cancel      Drop every event scheduled at or after a given time. Events
              aimed earlier than that stay, so a ramp that already finished
              keeps its final value.


The Event Shapes
----------------

  set       value jumps at `time`

              ─────┐
                   └─────────      (step at time)

  linear    straight line from the previous event's value to `value`,
            arriving at `end_time`

              ───╲
                  ╲________

  exponential   value(t) = v0 * (v1 / v0) ^ progress
                sounds even to the ear for gain, but v0 and v1 must share a
                sign and be non-zero. Gains are floored at MIN_GAIN (0.001)
                so a ramp "to silence" still has somewhere to go.

  curve     `values` spread evenly over `duration`, linearly interpolated
            between neighbours; holds the last value afterwards.


Ramps start where the previous event ends. A ramp scheduled with no
earlier event starts from the base value at the last fold point, which is
why callers pin the current value with `set_value_at_time` before ramping.
*/

/// Minimal control surface the gate and duck need from a gain parameter.
pub trait AudioParam {
    /// Value the parameter will have at `time`.
    fn value_at(&self, time: f64) -> f32;

    /// Set immediately: forget all automation and hold `value`.
    fn set_value(&mut self, value: f32);

    fn set_value_at_time(&mut self, value: f32, time: f64);

    fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64);

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64);

    /// Play `curve` over `duration` seconds starting at `start_time`.
    ///
    /// The curve is shared, not copied, so a caller can schedule the same
    /// points every cycle without allocating.
    fn set_value_curve_at_time(&mut self, curve: Arc<[f32]>, start_time: f64, duration: f64);

    /// Drop every event scheduled at or after `from_time`.
    fn cancel_scheduled_values(&mut self, from_time: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RampShape {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Set {
        time: f64,
        value: f32,
    },
    Ramp {
        shape: RampShape,
        start_time: f64,
        start_value: f32,
        end_time: f64,
        end_value: f32,
    },
    Curve {
        start_time: f64,
        duration: f64,
        values: Arc<[f32]>,
    },
}

impl Event {
    fn start_time(&self) -> f64 {
        match self {
            Event::Set { time, .. } => *time,
            Event::Ramp { start_time, .. } | Event::Curve { start_time, .. } => *start_time,
        }
    }

    fn end_time(&self) -> f64 {
        match self {
            Event::Set { time, .. } => *time,
            Event::Ramp { end_time, .. } => *end_time,
            Event::Curve {
                start_time,
                duration,
                ..
            } => start_time + duration,
        }
    }

    /// Time the event was aimed at, which is what cancellation compares.
    fn scheduled_time(&self) -> f64 {
        match self {
            Event::Set { time, .. } => *time,
            Event::Ramp { end_time, .. } => *end_time,
            Event::Curve { start_time, .. } => *start_time,
        }
    }

    fn final_value(&self) -> f32 {
        match self {
            Event::Set { value, .. } => *value,
            Event::Ramp { end_value, .. } => *end_value,
            Event::Curve { values, .. } => values.last().copied().unwrap_or(0.0),
        }
    }

    /// Value at `time`, assuming `start_time <= time < end_time`.
    fn value_within(&self, time: f64) -> f32 {
        match self {
            Event::Set { value, .. } => *value,
            Event::Ramp {
                shape,
                start_time,
                start_value,
                end_time,
                end_value,
            } => {
                let span = end_time - start_time;
                if span <= 0.0 {
                    return *end_value;
                }
                let progress = ((time - start_time) / span) as f32;
                match shape {
                    RampShape::Linear => start_value + (end_value - start_value) * progress,
                    RampShape::Exponential => {
                        if start_value * end_value <= 0.0 {
                            // No exponential path between these; hold until the end.
                            *start_value
                        } else {
                            start_value * (end_value / start_value).powf(progress)
                        }
                    }
                }
            }
            Event::Curve {
                start_time,
                duration,
                values,
            } => {
                let last = values.len() - 1;
                if last == 0 {
                    return values[0];
                }
                let position = ((time - start_time) / duration) * last as f64;
                let k = (position.floor() as usize).min(last);
                if k >= last {
                    return values[last];
                }
                let frac = (position - k as f64) as f32;
                values[k] + (values[k + 1] - values[k]) * frac
            }
        }
    }
}

/// Automation timeline for one parameter.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    base: f32,
    base_time: f64,
    events: Vec<Event>,
}

impl ParamTimeline {
    pub fn new(value: f32) -> Self {
        Self {
            base: value,
            base_time: 0.0,
            events: Vec::new(),
        }
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Fold every event that finished by `time` into the base value.
    pub fn prune_before(&mut self, time: f64) {
        let finished = self
            .events
            .iter()
            .take_while(|event| event.end_time() <= time)
            .count();
        if finished == 0 {
            return;
        }
        let last = &self.events[finished - 1];
        self.base = last.final_value();
        self.base_time = last.end_time();
        self.events.drain(..finished);
    }

    /// Fill `out` with values starting at `start_time`, one per sample.
    pub fn render_block(&mut self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        self.prune_before(start_time);

        if self.events.is_empty() {
            out.fill(self.base);
            return;
        }

        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start_time + i as f64 * dt);
        }
    }

    fn last_point(&self) -> (f64, f32) {
        match self.events.last() {
            Some(event) => (event.end_time(), event.final_value()),
            None => (self.base_time, self.base),
        }
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
        // Stable, so same-time events keep call order.
        self.events
            .sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
    }

    fn push_ramp(&mut self, shape: RampShape, value: f32, end_time: f64) {
        let (start_time, start_value) = self.last_point();
        self.push(Event::Ramp {
            shape,
            start_time: start_time.min(end_time),
            start_value,
            end_time,
            end_value: value,
        });
    }
}

impl Default for ParamTimeline {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioParam for ParamTimeline {
    fn value_at(&self, time: f64) -> f32 {
        let mut value = self.base;
        for event in &self.events {
            if time < event.start_time() {
                break;
            }
            if time >= event.end_time() {
                value = event.final_value();
                continue;
            }
            return event.value_within(time);
        }
        value
    }

    fn set_value(&mut self, value: f32) {
        self.events.clear();
        self.base = value;
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.push(Event::Set { time, value });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.push_ramp(RampShape::Linear, value, end_time);
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.push_ramp(RampShape::Exponential, value, end_time);
    }

    fn set_value_curve_at_time(&mut self, curve: Arc<[f32]>, start_time: f64, duration: f64) {
        if curve.is_empty() || duration.is_nan() || duration <= 0.0 {
            return;
        }
        self.push(Event::Curve {
            start_time,
            duration,
            values: curve,
        });
    }

    fn cancel_scheduled_values(&mut self, from_time: f64) {
        self.events.retain(|event| event.scheduled_time() < from_time);
    }
}

/// Floor a gain so exponential ramps to or from it stay defined.
#[inline]
pub fn exp_safe(gain: f32) -> f32 {
    gain.max(MIN_GAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-4, "expected {expected}, got {actual}");
    }

    #[test]
    fn holds_base_without_events() {
        let param = ParamTimeline::new(0.7);
        assert_eq!(param.value_at(0.0), 0.7);
        assert_eq!(param.value_at(100.0), 0.7);
    }

    #[test]
    fn set_value_at_time_steps() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_at_time(0.25, 2.0);
        assert_eq!(param.value_at(1.999), 1.0);
        assert_eq!(param.value_at(2.0), 0.25);
        assert_eq!(param.value_at(5.0), 0.25);
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut param = ParamTimeline::new(0.0);
        param.set_value_at_time(0.0, 1.0);
        param.linear_ramp_to_value_at_time(1.0, 2.0);
        assert_close(param.value_at(1.5), 0.5);
        assert_close(param.value_at(2.5), 1.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_at_time(1.0, 0.0);
        param.exponential_ramp_to_value_at_time(0.01, 1.0);
        // halfway between 1.0 and 0.01 geometrically is 0.1
        assert_close(param.value_at(0.5), 0.1);
        assert_close(param.value_at(1.0), 0.01);
    }

    #[test]
    fn exponential_ramp_through_zero_holds() {
        let mut param = ParamTimeline::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.exponential_ramp_to_value_at_time(1.0, 1.0);
        assert_eq!(param.value_at(0.5), 0.0);
        assert_eq!(param.value_at(1.0), 1.0);
    }

    #[test]
    fn curve_interpolates_and_holds_last() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_curve_at_time(vec![0.0, 1.0, 0.0].into(), 1.0, 2.0);
        assert_eq!(param.value_at(0.5), 1.0);
        assert_close(param.value_at(1.0), 0.0);
        assert_close(param.value_at(1.5), 0.5);
        assert_close(param.value_at(2.0), 1.0);
        assert_close(param.value_at(2.5), 0.5);
        assert_close(param.value_at(4.0), 0.0);
    }

    #[test]
    fn cancel_drops_future_events_only() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_at_time(0.5, 1.0);
        param.set_value_at_time(0.2, 3.0);
        param.cancel_scheduled_values(2.0);
        assert_eq!(param.event_count(), 1);
        assert_eq!(param.value_at(4.0), 0.5);
    }

    #[test]
    fn curve_is_shared_with_the_caller() {
        let curve: Arc<[f32]> = vec![1.0, 0.5, 1.0].into();
        let mut param = ParamTimeline::new(1.0);
        param.set_value_curve_at_time(curve.clone(), 0.0, 1.0);
        param.set_value_curve_at_time(curve.clone(), 1.0, 1.0);
        assert_eq!(Arc::strong_count(&curve), 3);

        param.cancel_scheduled_values(0.0);
        assert_eq!(Arc::strong_count(&curve), 1);
    }

    #[test]
    fn set_value_overrides_everything() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_curve_at_time(vec![0.1, 0.2].into(), 0.0, 10.0);
        param.set_value(1.0);
        assert!(!param.has_events());
        assert_eq!(param.value_at(5.0), 1.0);
    }

    #[test]
    fn prune_folds_finished_events() {
        let mut param = ParamTimeline::new(1.0);
        param.set_value_at_time(0.5, 0.0);
        param.linear_ramp_to_value_at_time(0.0, 1.0);
        param.set_value_at_time(0.8, 5.0);
        param.prune_before(2.0);
        assert_eq!(param.event_count(), 1);
        assert_eq!(param.value_at(2.0), 0.0);
        assert_eq!(param.value_at(6.0), 0.8);
    }

    #[test]
    fn render_block_samples_the_timeline() {
        let mut param = ParamTimeline::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 4.0);
        let mut out = [0.0; 4];
        param.render_block(&mut out, 0.0, 1.0);
        for (i, &v) in out.iter().enumerate() {
            assert_close(v, i as f32 / 4.0);
        }
    }
}
