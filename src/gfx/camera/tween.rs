use cgmath::{Vector3, VectorSpace};

/// Easing curves for [`CameraTween`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out, `1 - (1 - t)^2`
    #[default]
    Power1Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// One-shot animated move of the camera eye
///
/// Time is measured in seconds from render-loop start, the same clock that
/// drives shape rotation, so the tween is a pure function of elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTween {
    pub from: Vector3<f32>,
    pub to: Vector3<f32>,
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
}

impl CameraTween {
    pub fn new(from: Vector3<f32>, to: Vector3<f32>, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            delay: 0.0,
            ease: Ease::default(),
        }
    }

    /// Progress in `[0, 1]` at `elapsed` seconds
    pub fn progress(&self, elapsed: f32) -> f32 {
        let local = elapsed - self.delay;
        if self.duration <= 0.0 {
            return if local >= 0.0 { 1.0 } else { 0.0 };
        }
        (local / self.duration).clamp(0.0, 1.0)
    }

    /// Eye position at `elapsed` seconds
    pub fn sample(&self, elapsed: f32) -> Vector3<f32> {
        let eased = self.ease.apply(self.progress(elapsed));
        self.from.lerp(self.to, eased)
    }

    pub fn is_finished(&self, elapsed: f32) -> bool {
        self.progress(elapsed) >= 1.0
    }
}
