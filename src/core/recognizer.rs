//! Gesture Recognizer: pointer stream → discrete gesture steps
//!
//! Classification precedence, per finished pointer stroke:
//! - TAP: short and still (repeated taps inside tap_interval_ms merge)
//! - HOLD: long and still
//! - RADIAL: sweeps at least one notch around the surface center at a roughly
//!   constant radius
//! - FLICK: fast exit over at least drag_min_distance_px
//!
//! Anything else (slow drags, ambiguous presses) is dropped. The recognizer holds
//! no security state.

use tracing::debug;

use crate::core::fingerprint::rhythm_hash;
use crate::error::{DoormanError, Result};
use crate::types::{
    FlickDirection, GestureSequence, GestureStep, PointerEvent, PointerPhase, RecognizerConfig,
    Region,
};

/// Exit velocity is measured over the tail of the stroke
const VELOCITY_WINDOW_MS: u64 = 80;

/// Radius may wander this fraction of its mean and still count as circular
const RADIAL_RADIUS_TOLERANCE: f64 = 0.35;

/// Listener invoked whenever a step is recorded or a tap merges
pub type StepListener = Box<dyn FnMut(&GestureStep) + Send>;

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    y: f64,
    t: u64,
}

/// One pointer from down to up
#[derive(Debug)]
struct Stroke {
    samples: Vec<Sample>,
    /// Furthest distance from the down point
    max_excursion: f64,
    /// Signed angular sweep around the center (degrees)
    sweep_deg: f64,
    last_angle: Option<f64>,
    min_radius: f64,
    max_radius: f64,
}

impl Stroke {
    fn start(&self) -> Sample {
        self.samples[0]
    }

    fn end(&self) -> Sample {
        self.samples[self.samples.len() - 1]
    }
}

/// Pointer-event classifier for one capture surface
pub struct GestureRecognizer {
    config: RecognizerConfig,
    width: f64,
    height: f64,
    capturing: bool,
    stroke: Option<Stroke>,
    steps: Vec<GestureStep>,
    /// Start time of each recorded step
    step_starts: Vec<u64>,
    /// When the last tap lifted (for merging)
    last_tap_up: Option<u64>,
    listener: Option<StepListener>,
}

impl std::fmt::Debug for GestureRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureRecognizer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("capturing", &self.capturing)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl GestureRecognizer {
    /// Create recognizer for a `width` × `height` surface
    pub fn new(config: RecognizerConfig, width: f64, height: f64) -> Result<Self> {
        config.validate()?;
        if !(width > 0.0 && height > 0.0) {
            return Err(DoormanError::InvalidConfig(
                "capture surface must have positive size".to_string(),
            ));
        }
        Ok(Self {
            config,
            width,
            height,
            capturing: false,
            stroke: None,
            steps: Vec::new(),
            step_starts: Vec::new(),
            last_tap_up: None,
            listener: None,
        })
    }

    /// Register the step callback (replaces any previous one)
    pub fn on_step(&mut self, listener: StepListener) {
        self.listener = Some(listener);
    }

    /// Begin tracking. A capture already in flight is discarded.
    pub fn start_capture(&mut self) {
        if self.capturing {
            debug!("capture restarted, discarding in-flight steps");
        }
        self.reset();
        self.capturing = true;
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Steps recorded so far in this capture
    pub fn steps(&self) -> &[GestureStep] {
        &self.steps
    }

    /// Start time of each recorded step, parallel to `steps()`
    pub fn step_starts(&self) -> &[u64] {
        &self.step_starts
    }

    /// Discard any in-flight capture
    pub fn reset(&mut self) {
        self.capturing = false;
        self.stroke = None;
        self.steps.clear();
        self.step_starts.clear();
        self.last_tap_up = None;
    }

    /// Feed one pointer event. Returns the step recorded (or merged) by it.
    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureStep> {
        if !self.capturing {
            return None;
        }
        let sample = Sample { x: event.x, y: event.y, t: event.t };
        match event.phase {
            PointerPhase::Down => {
                let mut stroke = Stroke {
                    samples: Vec::new(),
                    max_excursion: 0.0,
                    sweep_deg: 0.0,
                    last_angle: None,
                    min_radius: f64::MAX,
                    max_radius: 0.0,
                };
                self.track(&mut stroke, sample);
                self.stroke = Some(stroke);
                None
            }
            PointerPhase::Move => {
                if let Some(mut stroke) = self.stroke.take() {
                    self.track(&mut stroke, sample);
                    self.stroke = Some(stroke);
                }
                None
            }
            PointerPhase::Up => {
                let mut stroke = self.stroke.take()?;
                self.track(&mut stroke, sample);
                let step = self.classify(&stroke)?;
                self.record(step, stroke.start().t, stroke.end().t)
            }
            PointerPhase::Cancel => {
                self.stroke = None;
                None
            }
        }
    }

    /// Finalize the buffered steps. `None` if nothing was recorded.
    pub fn end_capture(&mut self, now: u64) -> Option<GestureSequence> {
        let sequence = if self.steps.is_empty() {
            None
        } else {
            let first = self.step_starts[0];
            Some(GestureSequence::new(
                std::mem::take(&mut self.steps),
                now.saturating_sub(first),
                rhythm_hash(&self.step_starts),
                now,
            ))
        };
        self.reset();
        sequence
    }

    fn track(&self, stroke: &mut Stroke, sample: Sample) {
        if let Some(first) = stroke.samples.first() {
            let d = distance(first.x, first.y, sample.x, sample.y);
            stroke.max_excursion = stroke.max_excursion.max(d);
        }

        let (cx, cy) = self.center();
        let radius = distance(cx, cy, sample.x, sample.y);
        stroke.min_radius = stroke.min_radius.min(radius);
        stroke.max_radius = stroke.max_radius.max(radius);

        // Angle is undefined at the center itself
        if radius >= 1.0 {
            let angle = angle_deg(cx, cy, sample.x, sample.y);
            if let Some(prev) = stroke.last_angle {
                stroke.sweep_deg += wrap_delta(angle - prev);
            }
            stroke.last_angle = Some(angle);
        }

        stroke.samples.push(sample);
    }

    fn classify(&self, stroke: &Stroke) -> Option<GestureStep> {
        let cfg = &self.config;
        let start = stroke.start();
        let end = stroke.end();
        let duration = end.t.saturating_sub(start.t);
        let still = stroke.max_excursion <= cfg.tap_max_movement_px;
        let region = self.region_of(start.x, start.y);

        if still && duration <= cfg.tap_max_duration_ms {
            return Some(GestureStep::Tap { count: 1, region });
        }
        if still && duration >= cfg.hold_min_duration_ms {
            return Some(GestureStep::Hold {
                duration_ms: duration.min(u32::MAX as u64) as u32,
                region,
            });
        }
        if still {
            // Too long for a tap, too short for a hold
            return None;
        }

        let sweep = stroke.sweep_deg.abs();
        if sweep >= cfg.radial_notch_degrees && self.is_circular(stroke) {
            let (cx, cy) = self.center();
            let from = angle_deg(cx, cy, start.x, start.y);
            let to = (from + stroke.sweep_deg).rem_euclid(360.0);
            return Some(GestureStep::RadialDrag {
                from_angle_deg: from,
                to_angle_deg: to,
                notches: (sweep / cfg.radial_notch_degrees).floor() as u32,
            });
        }

        let net = distance(start.x, start.y, end.x, end.y);
        if net >= cfg.drag_min_distance_px {
            let (vx, vy) = exit_velocity(&stroke.samples);
            let speed = (vx * vx + vy * vy).sqrt();
            if speed >= cfg.flick_min_velocity {
                return Some(GestureStep::Flick {
                    direction: FlickDirection::from_velocity(vx, vy),
                    velocity_px_per_ms: speed,
                });
            }
        }

        None
    }

    fn is_circular(&self, stroke: &Stroke) -> bool {
        let mean = (stroke.min_radius + stroke.max_radius) / 2.0;
        if mean < self.config.tap_max_movement_px {
            return false;
        }
        stroke.max_radius - stroke.min_radius <= mean * RADIAL_RADIUS_TOLERANCE
    }

    fn record(&mut self, step: GestureStep, started: u64, ended: u64) -> Option<GestureStep> {
        let merged = match (&step, self.steps.last_mut(), self.last_tap_up) {
            (
                GestureStep::Tap { region, .. },
                Some(GestureStep::Tap { count, region: last_region }),
                Some(last_up),
            ) if *region == *last_region
                && started.saturating_sub(last_up) <= self.config.tap_interval_ms =>
            {
                *count += 1;
                true
            }
            _ => false,
        };

        if !merged {
            self.steps.push(step.clone());
            self.step_starts.push(started);
        }

        self.last_tap_up = match step {
            GestureStep::Tap { .. } => Some(ended),
            _ => None,
        };

        let recorded = self.steps.last().cloned();
        if let Some(ref current) = recorded {
            debug!(kind = current.kind(), merged, "gesture step recorded");
            if let Some(listener) = self.listener.as_mut() {
                listener(current);
            }
        }
        recorded
    }

    fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    fn region_of(&self, x: f64, y: f64) -> Region {
        let (cx, cy) = self.center();
        let limit = self.config.center_region_ratio * self.width.min(self.height) / 2.0;
        if distance(cx, cy, x, y) <= limit {
            Region::Center
        } else {
            Region::Edge
        }
    }
}

fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// Angle of (x, y) around (cx, cy) in [0, 360)
fn angle_deg(cx: f64, cy: f64, x: f64, y: f64) -> f64 {
    (y - cy).atan2(x - cx).to_degrees().rem_euclid(360.0)
}

/// Fold an angle difference into (-180, 180]
fn wrap_delta(delta: f64) -> f64 {
    let d = delta.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Velocity (px/ms) over the last VELOCITY_WINDOW_MS of the stroke
fn exit_velocity(samples: &[Sample]) -> (f64, f64) {
    let end = samples[samples.len() - 1];
    let cutoff = end.t.saturating_sub(VELOCITY_WINDOW_MS);
    let from = samples
        .iter()
        .take(samples.len() - 1)
        .find(|s| s.t >= cutoff)
        .or_else(|| samples.iter().rev().nth(1))
        .copied()
        .unwrap_or(end);
    let dt = end.t.saturating_sub(from.t).max(1) as f64;
    ((end.x - from.x) / dt, (end.y - from.y) / dt)
}

// =============================================================================
// TESTS
// =============================================================================
