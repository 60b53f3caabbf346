//! Random pose generation
//!
//! Every call draws a fresh, independent pose. Nothing is integrated over
//! time; the values only have to stay inside the documented bounds.

use crate::core::types::Pose2D;
use parking_lot::Mutex;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Upper bound of the planar coordinates (mm, inclusive)
pub const POSITION_MAX_MM: f64 = 2000.0;
/// Width of the planar coordinate range (mm)
pub const POSITION_SPAN_MM: f64 = 12000.0;
/// Lower bound of the planar coordinates (mm, exclusive)
pub const POSITION_MIN_MM: f64 = POSITION_MAX_MM - POSITION_SPAN_MM;
/// Yaw range is `[0, FULL_TURN_DEG)`
pub const FULL_TURN_DEG: f64 = 360.0;

/// Draws poses uniformly from a fixed region
pub struct PoseGenerator {
    rng: Mutex<SmallRng>,
}

impl PoseGenerator {
    /// Create a generator.
    ///
    /// If seed is 0, uses random entropy. Otherwise the pose sequence is reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draw a pose: `x, y` in `(-10000, 2000]` mm, `theta` in `[0, 360)` degrees
    pub fn current_pose(&self) -> Pose2D {
        let mut rng = self.rng.lock();
        let x = POSITION_MAX_MM - rng.gen_range(0.0..1.0) * POSITION_SPAN_MM;
        let y = POSITION_MAX_MM - rng.gen_range(0.0..1.0) * POSITION_SPAN_MM;
        let theta = rng.gen_range(0.0..FULL_TURN_DEG);
        Pose2D::new(x, y, theta)
    }
}
