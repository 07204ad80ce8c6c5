//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix2, Vector2};
use num_traits::Float;

/// Tolerance used when checking a weight matrix for symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Evaluate the quadratic form `x^T Q x`.
pub fn quad_form(x: &Vector2<f64>, q: &Matrix2<f64>) -> f64 {
    x.dot(&(q * x))
}

/// Scalar (z component) cross product of two vectors in the plane.
pub fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Returns true if the matrix is symmetric positive definite.
pub fn is_pos_def(q: &Matrix2<f64>) -> bool {
    if !q.iter().all(|v| v.is_finite()) {
        return false;
    }

    if (q[(0, 1)] - q[(1, 0)]).abs() > SYMMETRY_TOLERANCE {
        return false;
    }

    q.cholesky().is_some()
}

/// Length of the polyline through the given points, i.e. the sum of the
/// distances between consecutive points.
///
/// Fewer than two points gives a length of zero.
pub fn polyline_length(points: &[Vector2<f64>]) -> f64 {
    points
        .windows(2)
        .map(|p| (p[1] - p[0]).norm())
        .sum()
}
