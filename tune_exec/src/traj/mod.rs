//! # Trajectory module
//!
//! A trajectory is the ordered sequence of waypoints the bot must visit. It is
//! built once per run and then shared, read-only, by every episode evaluated
//! during that run.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod gen;

pub use gen::GenParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

// Internal
use crate::kin_model::Pose;
use util::maths::polyline_length;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A reference trajectory of at least two waypoints.
#[derive(Clone, Serialize, Debug)]
pub struct Trajectory {
    points: Vec<Vector2<f64>>
}

/// Row of a trajectory CSV file.
#[derive(Serialize, Deserialize)]
struct CsvPoint {
    x: f64,
    y: f64
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajError {
    #[error("A trajectory needs at least 2 points, found {0}")]
    TooFewPoints(usize),

    #[error("Point {0} of the trajectory is not finite")]
    NonFinitePoint(usize),

    #[error("Generated noise has no range, cannot scale it into a trajectory")]
    DegenerateNoise,

    #[error("Cannot access the trajectory file: {0}")]
    FileError(#[from] io::Error),

    #[error("Cannot read or write trajectory CSV data: {0}")]
    CsvError(#[from] csv::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Create a new trajectory from the given waypoints.
    pub fn new(points: Vec<Vector2<f64>>) -> Result<Self, TrajError> {
        if points.len() < 2 {
            return Err(TrajError::TooFewPoints(points.len()))
        }

        if let Some(i) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(TrajError::NonFinitePoint(i))
        }

        Ok(Self { points })
    }

    /// Produces a straight trajectory of `num_points` evenly spaced points,
    /// with the first at `from` and the last at `to`.
    pub fn direct(
        from: Vector2<f64>,
        to: Vector2<f64>,
        num_points: usize
    ) -> Result<Self, TrajError> {
        if num_points < 2 {
            return Err(TrajError::TooFewPoints(num_points))
        }

        let delta = (to - from) / (num_points - 1) as f64;

        Self::new((0..num_points).map(|i| from + delta * i as f64).collect())
    }

    /// Read a trajectory from CSV data with an `x,y` header.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, TrajError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = Vec::new();
        for row in rdr.deserialize() {
            let p: CsvPoint = row?;
            points.push(Vector2::new(p.x, p.y));
        }

        Self::new(points)
    }

    /// Load a trajectory from a CSV file.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrajError> {
        Self::from_csv_reader(std::fs::File::open(path)?)
    }

    /// Write the trajectory to a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TrajError> {
        write_points_csv(&self.points, path)
    }

    /// The waypoints of the trajectory.
    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    /// Get the number of points in the trajectory
    pub fn get_num_points(&self) -> usize {
        self.points.len()
    }

    /// Return the length of the trajectory, the sum of the distances between
    /// consecutive waypoints.
    pub fn get_length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// The pose the bot starts an episode in: on the first point, facing the
    /// second.
    pub fn start_pose(&self) -> Pose {
        let dir = self.points[1] - self.points[0];

        Pose::new(self.points[0], dir.y.atan2(dir.x))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Write a list of points to a CSV file with an `x,y` header.
pub fn write_points_csv<P: AsRef<Path>>(
    points: &[Vector2<f64>],
    path: P
) -> Result<(), TrajError> {
    let mut wtr = csv::Writer::from_path(path)?;

    for p in points {
        wtr.serialize(CsvPoint { x: p.x, y: p.y })?;
    }
    wtr.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_too_few_points() {
        assert!(matches!(Trajectory::new(vec![]), Err(TrajError::TooFewPoints(0))));
        assert!(matches!(
            Trajectory::new(vec![Vector2::new(1.0, 1.0)]),
            Err(TrajError::TooFewPoints(1))
        ));
        assert!(matches!(
            Trajectory::direct(Vector2::zeros(), Vector2::new(1.0, 0.0), 1),
            Err(TrajError::TooFewPoints(1))
        ));
    }

    #[test]
    fn test_non_finite_point() {
        let res = Trajectory::new(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(std::f64::NAN, 1.0),
        ]);
        assert!(matches!(res, Err(TrajError::NonFinitePoint(1))));
    }

    #[test]
    fn test_direct() {
        let traj = Trajectory::direct(Vector2::zeros(), Vector2::new(1000.0, 0.0), 20).unwrap();

        assert_eq!(traj.get_num_points(), 20);
        assert_eq!(traj.points()[0], Vector2::zeros());
        assert!((traj.points()[19] - Vector2::new(1000.0, 0.0)).norm() < 1e-9);
        assert!((traj.get_length() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_pose() {
        let traj = Trajectory::new(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(100.0, 0.0),
            Vector2::new(100.0, 100.0),
        ]).unwrap();

        let pose = traj.start_pose();
        assert_eq!(pose.position, Vector2::zeros());
        assert_eq!(pose.heading_rad, 0.0);
        assert_eq!(traj.get_length(), 200.0);

        let traj = Trajectory::new(vec![
            Vector2::new(5.0, 5.0),
            Vector2::new(5.0, -5.0),
        ]).unwrap();
        assert_eq!(traj.start_pose().heading_rad, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_csv_io() {
        let csv_data = "x, y\n0.0, 0.0\n10.0, 5.0\n20.0, 0.0\n";
        let traj = Trajectory::from_csv_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(traj.get_num_points(), 3);
        assert_eq!(traj.points()[1], Vector2::new(10.0, 5.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traj.csv");
        traj.write_csv(&path).unwrap();
        let loaded = Trajectory::load_csv(&path).unwrap();
        assert_eq!(loaded.points(), traj.points());

        let short = Trajectory::from_csv_reader("x,y\n1.0,2.0\n".as_bytes());
        assert!(matches!(short, Err(TrajError::TooFewPoints(1))));

        let bad = Trajectory::from_csv_reader("x,y\n1.0,oops\n".as_bytes());
        assert!(matches!(bad, Err(TrajError::CsvError(_))));
    }
}
