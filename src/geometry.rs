//! Points and the metrics used to compare them.

use nalgebra::Vector2;
use std::cmp::Ordering;

pub type Point2D = Vector2<f64>;

/// A metric between two points.
///
/// It drives both the assignment phase of k-means (nearest centroid) and the
/// convergence check (how far a centroid moved).  Any closure with the right
/// signature is a distance too:
///
/// ```rust
/// use kmeans_trail::{Distance, Point2D};
///
/// let squared = |a: &Point2D, b: &Point2D| (a - b).norm_squared();
/// assert_eq!(squared.distance(&Point2D::new(0.0, 0.0), &Point2D::new(1.0, 2.0)), 5.0);
/// ```
pub trait Distance {
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64;
}

impl<F> Distance for F
where
    F: Fn(&Point2D, &Point2D) -> f64,
{
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        self(a, b)
    }
}

/// The usual L2 distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Euclidean;

impl Distance for Euclidean {
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        (a - b).norm()
    }
}

/// L1 distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Manhattan;

impl Distance for Manhattan {
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        (a - b).lp_norm(1)
    }
}

/// L∞ distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Chebyshev;

impl Distance for Chebyshev {
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        (a - b).amax()
    }
}

/// Arithmetic mean of the given points, `None` when there are none.
pub fn center(points: impl IntoIterator<Item = Point2D>) -> Option<Point2D> {
    let (sum, count) = points
        .into_iter()
        .fold((Point2D::zeros(), 0_usize), |(sum, count), p| {
            (sum + p, count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Lexicographic order on coordinates, total on finite values.
pub(crate) fn lexicographic(a: &Point2D, b: &Point2D) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// The distinct locations among `points`, sorted lexicographically.
///
/// `-0.0` and `0.0` are the same location.
pub(crate) fn distinct_locations(points: impl IntoIterator<Item = Point2D>) -> Vec<Point2D> {
    let mut locations: Vec<Point2D> = points
        .into_iter()
        .map(|p| p.map(|coord| coord + 0.0))
        .collect();
    locations.sort_unstable_by(lexicographic);
    locations.dedup();
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, 5.0);
        assert_ulps_eq!(Euclidean.distance(&a, &b), 5.0);
        assert_ulps_eq!(Manhattan.distance(&a, &b), 7.0);
        assert_ulps_eq!(Chebyshev.distance(&a, &b), 4.0);
        assert_ulps_eq!(Euclidean.distance(&b, &a), Euclidean.distance(&a, &b));
    }

    #[test]
    fn test_center() {
        assert_eq!(center(std::iter::empty()), None);

        let points = [
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 2.0),
            Point2D::new(3.0, 1.0),
        ];
        let c = center(points).unwrap();
        assert_ulps_eq!(c.x, 1.0);
        assert_ulps_eq!(c.y, 1.0);
    }

    #[test]
    fn test_distinct_locations() {
        let points = [
            Point2D::new(1.0, 0.0),
            Point2D::new(-0.0, 9.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(-0.0, 1.0),
            Point2D::new(0.0, 9.0),
        ];
        let distinct = distinct_locations(points);
        assert_eq!(
            distinct,
            vec![
                Point2D::new(0.0, 1.0),
                Point2D::new(0.0, 9.0),
                Point2D::new(1.0, 0.0),
            ]
        );
    }
}
