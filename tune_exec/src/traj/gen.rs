//! # Trajectory generation
//!
//! Procedural trajectories made from two independent Perlin noise signals,
//! one for each axis. Each signal is sampled at `octaves * 100` evenly spaced
//! points over `octaves` noise periods and then scaled to fill the field.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use noise::{NoiseFn, Perlin, Seedable};
use rand::Rng;
use serde::{Deserialize, Serialize};

// Internal
use super::{TrajError, Trajectory};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of samples taken per noise period.
const SAMPLES_PER_OCTAVE: usize = 100;

/// Fixed second coordinate for sampling the 2D noise along a line. Must not
/// be an integer or the gradient noise is zero along the whole line.
const NOISE_LINE_OFFSET: f64 = 0.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenParams {
    /// Number of noise periods along the trajectory
    pub octaves: usize,

    /// Noise seeds for the X and Y signals
    pub seeds: [u32; 2],

    /// Width of the field the trajectory is scaled into
    pub x_size: f64,

    /// Height of the field the trajectory is scaled into
    pub y_size: f64,

    /// If true the octaves and seeds are drawn at random for each run
    pub random: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GenParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            seeds: [3, 17],
            x_size: 1300.0,
            y_size: 800.0,
            random: true
        }
    }
}

impl GenParams {
    /// Return a copy of these parameters with the octaves and seeds drawn
    /// from the given generator.
    pub fn randomised<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            octaves: rng.gen_range(3..5),
            seeds: [rng.gen_range(0..1000), rng.gen_range(0..1000)],
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate a trajectory from the given parameters.
pub fn generate(params: &GenParams) -> Result<Trajectory, TrajError> {
    let xs = noise_signal(params.octaves, params.seeds[0], params.x_size)?;
    let ys = noise_signal(params.octaves, params.seeds[1], params.y_size)?;

    debug!(
        "Generated {} waypoints (octaves: {}, seeds: {:?})",
        xs.len(), params.octaves, params.seeds
    );

    Trajectory::new(
        xs.into_iter()
            .zip(ys)
            .map(|(x, y)| Vector2::new(x, y))
            .collect()
    )
}

/// Sample a noise signal and scale it into `[0, size]`.
fn noise_signal(octaves: usize, seed: u32, size: f64) -> Result<Vec<f64>, TrajError> {
    let perlin = Perlin::new().set_seed(seed);
    let num_samples = octaves * SAMPLES_PER_OCTAVE;

    let raw: Vec<f64> = (0..num_samples)
        .map(|i| perlin.get([i as f64 / SAMPLES_PER_OCTAVE as f64, NOISE_LINE_OFFSET]))
        .collect();

    let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if !(max - min).is_normal() {
        return Err(TrajError::DegenerateNoise)
    }

    Ok(raw.into_iter().map(|v| lin_map((min, max), (0.0, size), v)).collect())
}
