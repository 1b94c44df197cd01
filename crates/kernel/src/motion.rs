use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Start, target and per-millisecond delta of one interpolated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframes {
    pub start: Vec3,
    pub target: Vec3,
    pub delta: Vec3,
}

impl Keyframes {
    fn new(start: Vec3, target: Vec3, duration_ms: u64) -> Self {
        let delta = if duration_ms == 0 {
            Vec3::ZERO
        } else {
            (target - start) / duration_ms as f32
        };
        Self {
            start,
            target,
            delta,
        }
    }

    fn sample(&self, elapsed_ms: u64) -> Vec3 {
        self.start + self.delta * elapsed_ms as f32
    }
}

/// Move descriptor of an object travelling in a straight line at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: Keyframes,
    pub rotation: Option<Keyframes>,
    /// World units per second.
    pub speed: f32,
    pub duration_ms: u64,
    pub started_at_ms: u64,
}

/// Interpolated state of a [`Motion`] at some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub position: Vec3,
    pub rotation: Option<Vec3>,
    pub finished: bool,
}

impl Motion {
    /// `None` when `speed` is not a positive finite number.
    pub fn new(
        from: Vec3,
        to: Vec3,
        speed: f32,
        rotation: Option<(Vec3, Vec3)>,
        now_ms: u64,
    ) -> Option<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return None;
        }
        let duration_ms = ((from.distance(to) / speed) * 1000.0) as u64;
        Some(Self {
            position: Keyframes::new(from, to, duration_ms),
            rotation: rotation.map(|(start, target)| Keyframes::new(start, target, duration_ms)),
            speed,
            duration_ms,
            started_at_ms: now_ms,
        })
    }

    pub fn sample(&self, now_ms: u64) -> MotionSample {
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        if elapsed >= self.duration_ms {
            return MotionSample {
                position: self.position.target,
                rotation: self.rotation.map(|r| r.target),
                finished: true,
            };
        }
        MotionSample {
            position: self.position.sample(elapsed),
            rotation: self.rotation.map(|r| r.sample(elapsed)),
            finished: false,
        }
    }
}
