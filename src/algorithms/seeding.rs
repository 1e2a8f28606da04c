//! Strategies that pick the initial centroids of k-means.

use super::Error;
use crate::geometry::distinct_locations;
use crate::geometry::Point2D;
use crate::model::Item;
use rand::distributions::Distribution as _;
use rand::distributions::WeightedIndex;
use rand::seq::SliceRandom as _;
use rand::Rng;

/// Picks the initial centroids of a run.
///
/// Implementations must return exactly `cluster_count` distinct points; the
/// seed at index `i` becomes the centroid of `ClusterId(i)`.  The engine
/// checks this and fails the run otherwise.
pub trait Seeding {
    fn seed(&mut self, items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error>;
}

impl<S> Seeding for &mut S
where
    S: Seeding + ?Sized,
{
    fn seed(&mut self, items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error> {
        S::seed(self, items, cluster_count)
    }
}

impl<S> Seeding for Box<S>
where
    S: Seeding + ?Sized,
{
    fn seed(&mut self, items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error> {
        S::seed(self, items, cluster_count)
    }
}

fn distinct_or_fail(items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error> {
    let distinct = distinct_locations(items.iter().map(Item::position));
    if distinct.len() < cluster_count {
        return Err(Error::DegenerateInput {
            distinct: distinct.len(),
            cluster_count,
        });
    }
    Ok(distinct)
}

/// Uses the locations of randomly chosen items as seeds.
///
/// Every distinct location has the same chance of being picked, however many
/// items share it.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), kmeans_trail::Error> {
/// use kmeans_trail::{Item, Point2D, RandomSeeding, Seeding as _};
///
/// let items = Item::from_points([
///     Point2D::new(0.0, 0.0),
///     Point2D::new(1.0, 0.0),
///     Point2D::new(0.0, 1.0),
/// ]);
/// let seeds = RandomSeeding { rng: rand::thread_rng() }.seed(&items, 2)?;
/// assert_eq!(seeds.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RandomSeeding<R> {
    pub rng: R,
}

impl<R> Seeding for RandomSeeding<R>
where
    R: Rng,
{
    fn seed(&mut self, items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error> {
        let distinct = distinct_or_fail(items, cluster_count)?;
        let picks = rand::seq::index::sample(&mut self.rng, distinct.len(), cluster_count);
        Ok(picks.into_iter().map(|idx| distinct[idx]).collect())
    }
}

/// k-means++ seeding.
///
/// The first seed is an item chosen uniformly.  Each next seed is an item
/// chosen with a probability proportional to its squared distance to the
/// closest seed so far.  Items lying on a seed have a zero weight, which
/// keeps seeds distinct.
///
/// # Reference
///
/// Arthur, David and Vassilvitskii, Sergei, 2007. k-means++: The advantages
/// of careful seeding. *Proceedings of the eighteenth annual ACM-SIAM
/// symposium on Discrete algorithms*, 1027–1035.
#[derive(Debug)]
pub struct KMeansPlusPlus<R> {
    pub rng: R,
}

impl<R> Seeding for KMeansPlusPlus<R>
where
    R: Rng,
{
    fn seed(&mut self, items: &[Item], cluster_count: usize) -> Result<Vec<Point2D>, Error> {
        let distinct = distinct_or_fail(items, cluster_count)?;
        let degenerate = Error::DegenerateInput {
            distinct: distinct.len(),
            cluster_count,
        };
        if cluster_count == 0 {
            return Ok(Vec::new());
        }

        // Weights are computed on coordinates scaled into [-1, 1], so that
        // squared distances stay finite for any finite input.
        let scale = items
            .iter()
            .map(|item| item.position().amax())
            .fold(0.0, f64::max);
        let scaled = |p: Point2D| if 0.0 < scale { p / scale } else { p };

        let first = items[self.rng.gen_range(0..items.len())].position();
        let mut seeds = Vec::with_capacity(cluster_count);
        seeds.push(first);

        let mut weights: Vec<f64> = items
            .iter()
            .map(|item| (scaled(item.position()) - scaled(first)).norm_squared())
            .collect();

        while seeds.len() < cluster_count {
            let seed = match WeightedIndex::new(&weights) {
                Ok(dist) => items[dist.sample(&mut self.rng)].position(),
                // Remaining locations are too close to the seeds for their
                // weights to be told apart from zero.
                Err(_) => items
                    .iter()
                    .map(Item::position)
                    .filter(|p| !seeds.contains(p))
                    .collect::<Vec<_>>()
                    .choose(&mut self.rng)
                    .copied()
                    .ok_or(degenerate)?,
            };
            for (weight, item) in weights.iter_mut().zip(items) {
                let d2 = (scaled(item.position()) - scaled(seed)).norm_squared();
                *weight = f64::min(*weight, d2);
            }
            seeds.push(seed);
        }

        Ok(seeds)
    }
}

/// Caller-chosen seeds, used in order.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), kmeans_trail::Error> {
/// use kmeans_trail::{FixedSeeding, Item, Point2D, Seeding as _};
///
/// let items = Item::from_points([Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)]);
/// let seeds = vec![Point2D::new(1.0, 0.0), Point2D::new(0.0, 0.0)];
/// assert_eq!(FixedSeeding(seeds.clone()).seed(&items, 2)?, seeds);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FixedSeeding(pub Vec<Point2D>);

impl Seeding for FixedSeeding {
    fn seed(&mut self, _items: &[Item], _cluster_count: usize) -> Result<Vec<Point2D>, Error> {
        Ok(self.0.clone())
    }
}
