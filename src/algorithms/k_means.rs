//! Lloyd's k-means algorithm, keeping every iteration.
//!
//! Each step assigns items to their nearest centroid (ties go to the lowest
//! cluster id), then moves each centroid to the mean of its members.  A
//! cluster that lost all its members keeps its centroid.

use super::ConfigError;
use super::Error;
use super::RandomSeeding;
use super::Seeding;
use crate::geometry;
use crate::geometry::Distance;
use crate::geometry::Euclidean;
use crate::geometry::Point2D;
use crate::model::CentroidCluster;
use crate::model::Cluster as _;
use crate::model::ClusterId;
use crate::model::Item;
use crate::model::Iteration;
use crate::run::Run;
use crate::run::Termination;
use itertools::Itertools as _;
use std::cmp::Ordering;

fn validate(
    items: &mut [Item],
    cluster_count: usize,
    tolerance: f64,
    max_iterations: usize,
) -> Result<(), ConfigError> {
    if items.is_empty() {
        return Err(ConfigError::EmptyInput);
    }
    if cluster_count == 0 || items.len() < cluster_count {
        return Err(ConfigError::ClusterCount {
            requested: cluster_count,
            item_count: items.len(),
        });
    }
    if !(tolerance >= 0.0) {
        return Err(ConfigError::Tolerance(tolerance));
    }
    if max_iterations == 0 {
        return Err(ConfigError::IterationCap);
    }
    if let Some(item) = items
        .iter()
        .find(|item| !item.position().iter().all(|c| c.is_finite()))
    {
        return Err(ConfigError::NonFiniteItem(item.id()));
    }

    items.sort_by_key(Item::id);
    if let Some((a, _)) = items
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.id() == b.id())
    {
        return Err(ConfigError::DuplicateItem(a.id()));
    }

    Ok(())
}

fn check_seeds(seeds: &[Point2D], cluster_count: usize) -> Result<(), Error> {
    if seeds.len() != cluster_count {
        return Err(ConfigError::SeedCount {
            expected: cluster_count,
            actual: seeds.len(),
        }
        .into());
    }
    if let Some(idx) = seeds
        .iter()
        .position(|seed| !seed.iter().all(|c| c.is_finite()))
    {
        return Err(ConfigError::NonFiniteSeed(idx).into());
    }
    let distinct = geometry::distinct_locations(seeds.iter().cloned()).len();
    if distinct < cluster_count {
        return Err(Error::DegenerateInput {
            distinct,
            cluster_count,
        });
    }
    Ok(())
}

/// Index of the centroid closest to `point`, the first one on ties.
fn nearest<D>(point: &Point2D, centroids: &[Point2D], distance: &D) -> usize
where
    D: Distance + ?Sized,
{
    centroids
        .iter()
        .map(|centroid| distance.distance(point, centroid))
        .position_min_by(|d1, d2| d1.partial_cmp(d2).unwrap_or(Ordering::Equal))
        .unwrap_or(0)
}

/// Computes the iteration that follows `previous`: assignment, then update.
fn step<D>(items: &[Item], previous: &Iteration, distance: &D) -> Iteration
where
    D: Distance + ?Sized,
{
    let centroids: Vec<Point2D> = previous
        .clusters()
        .iter()
        .map(CentroidCluster::centroid)
        .collect();

    // Items are sorted by id, so member lists come out sorted as well.
    let mut members = vec![Vec::new(); centroids.len()];
    for item in items {
        members[nearest(&item.position(), &centroids, distance)].push(*item);
    }

    let clusters = previous
        .clusters()
        .iter()
        .zip(members)
        .map(|(cluster, members)| {
            let centroid = geometry::center(members.iter().map(Item::position))
                .unwrap_or_else(|| cluster.centroid());
            CentroidCluster::new(cluster.id(), members, centroid)
        })
        .collect();

    Iteration::new(previous.order() + 1, clusters)
}

/// Largest centroid move between two consecutive iterations.
fn max_shift<D>(previous: &Iteration, current: &Iteration, distance: &D) -> f64
where
    D: Distance + ?Sized,
{
    previous
        .centroids()
        .zip(current.centroids())
        .map(|((_, before), (_, after))| distance.distance(&before, &after))
        .fold(0.0, f64::max)
}

/// Runs k-means on `items` and records every iteration.
///
/// Cluster `i` is seeded with the `i`-th point returned by `seeding`.  The
/// run stops once no centroid moves by more than `tolerance` (as measured by
/// `distance`), or after `max_iterations` steps.  A step that reproduces the
/// membership of the previous iteration is a fixed point and is not
/// recorded.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), kmeans_trail::Error> {
/// use kmeans_trail::{Euclidean, FixedSeeding, Item, Point2D};
///
/// let items = Item::from_points([
///     Point2D::new(0.0, 0.0),
///     Point2D::new(0.0, 2.0),
///     Point2D::new(10.0, 0.0),
///     Point2D::new(10.0, 2.0),
/// ]);
/// let mut seeding = FixedSeeding(vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)]);
///
/// let run = kmeans_trail::run(items, 2, &mut seeding, &Euclidean, 1e-6, 100)?;
///
/// assert_eq!(run.iterations().len(), 1);
/// assert!(run.termination().is_converged());
/// # Ok(())
/// # }
/// ```
pub fn run<S, D>(
    items: impl IntoIterator<Item = Item>,
    cluster_count: usize,
    seeding: &mut S,
    distance: &D,
    tolerance: f64,
    max_iterations: usize,
) -> Result<Run, Error>
where
    S: Seeding + ?Sized,
    D: Distance + ?Sized,
{
    let mut items: Vec<Item> = items.into_iter().collect();
    validate(&mut items, cluster_count, tolerance, max_iterations)?;

    let seeds = seeding.seed(&items, cluster_count)?;
    check_seeds(&seeds, cluster_count)?;

    let span = tracing::info_span!("k_means", item_count = items.len(), cluster_count);
    let _enter = span.enter();

    let seeds = Iteration::new(
        0,
        seeds
            .into_iter()
            .enumerate()
            .map(|(idx, seed)| CentroidCluster::seed(ClusterId(idx), seed))
            .collect(),
    );

    let mut iterations: Vec<Iteration> = Vec::new();
    let mut termination = Termination::IterationCap;

    for _ in 0..max_iterations {
        let previous = iterations.last().unwrap_or(&seeds);
        let current = step(&items, previous, distance);
        if current.same_membership(previous) {
            tracing::info!(order = previous.order(), "membership is stable");
            termination = Termination::Converged { shift: 0.0 };
            break;
        }

        let shift = max_shift(previous, &current, distance);
        tracing::debug!(order = current.order(), shift, "iteration");
        iterations.push(current);
        if shift <= tolerance {
            termination = Termination::Converged { shift };
            break;
        }
    }

    match termination {
        Termination::Converged { shift } => {
            tracing::info!(iterations = iterations.len(), shift, "converged");
        }
        Termination::IterationCap => {
            tracing::info!(max_iterations, "reached the iteration cap");
        }
    }

    Ok(Run::new(items, seeds, iterations, termination))
}

/// K-means settings.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), kmeans_trail::Error> {
/// use kmeans_trail::{Item, KMeans, Point2D};
///
/// let items = Item::from_points((0..50).map(|i| Point2D::new(i as f64, (i % 7) as f64)));
///
/// let run = KMeans { cluster_count: 4, ..KMeans::default() }.run(items)?;
///
/// assert_eq!(run.cluster_seeds().clusters().len(), 4);
/// assert!(run.iterations().len() <= 100);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct KMeans<S, D = Euclidean> {
    pub cluster_count: usize,
    pub seeding: S,
    pub distance: D,
    /// Largest centroid move under which the run is considered converged.
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for KMeans<RandomSeeding<rand::rngs::ThreadRng>> {
    fn default() -> Self {
        Self {
            cluster_count: 3,
            seeding: RandomSeeding {
                rng: rand::thread_rng(),
            },
            distance: Euclidean,
            tolerance: 1e-4,
            max_iter: 100,
        }
    }
}

impl<S, D> KMeans<S, D>
where
    S: Seeding,
    D: Distance,
{
    pub fn run(&mut self, items: impl IntoIterator<Item = Item>) -> Result<Run, Error> {
        run(
            items,
            self.cluster_count,
            &mut self.seeding,
            &self.distance,
            self.tolerance,
            self.max_iter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::FixedSeeding;
    use crate::algorithms::KMeansPlusPlus;
    use crate::geometry::Manhattan;
    use crate::model::ItemId;
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    fn points(coords: &[(f64, f64)]) -> Vec<Item> {
        Item::from_points(coords.iter().map(|&(x, y)| Point2D::new(x, y)))
    }

    fn fixed(coords: &[(f64, f64)]) -> FixedSeeding {
        FixedSeeding(coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect())
    }

    #[test]
    fn test_nearest_breaks_ties_on_lowest_index() {
        let centroids = [
            Point2D::new(-1.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
        ];
        assert_eq!(nearest(&Point2D::zeros(), &centroids, &Euclidean), 0);
        assert_eq!(nearest(&Point2D::new(0.5, 0.0), &centroids, &Euclidean), 1);
    }

    #[test]
    fn test_tie_goes_to_lowest_cluster_id() {
        let items = points(&[(0.0, 0.0), (-2.0, 0.0), (2.0, 0.0)]);
        let mut seeding = fixed(&[(1.0, 0.0), (-1.0, 0.0)]);
        let run = run(items, 2, &mut seeding, &Euclidean, 0.0, 1).unwrap();
        let first = &run.iterations()[0];
        assert_eq!(first.assignment_of(ItemId(0)), Some(ClusterId(0)));
        assert_eq!(first.assignment_of(ItemId(1)), Some(ClusterId(1)));
        assert_eq!(first.assignment_of(ItemId(2)), Some(ClusterId(0)));
    }

    #[test]
    fn test_empty_cluster_keeps_its_centroid() {
        let items = points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let mut seeding = fixed(&[(0.0, 0.0), (100.0, 100.0)]);
        let run = run(items, 2, &mut seeding, &Euclidean, 0.0, 10).unwrap();
        for iteration in run.iterations() {
            let far = iteration.cluster(ClusterId(1)).unwrap();
            assert!(far.is_empty());
            assert_eq!(far.centroid(), Point2D::new(100.0, 100.0));
        }
        let near = run.final_iteration().cluster(ClusterId(0)).unwrap();
        assert_eq!(near.len(), 3);
        assert_ulps_eq!(near.centroid().x, 1.0 / 3.0);
        assert_ulps_eq!(near.centroid().y, 1.0 / 3.0);
    }

    #[test]
    fn test_iteration_cap() {
        // Centroids keep moving: (0,0) and (1,0) pull points in one by one.
        let items = points(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (4.0, 0.0),
            (5.0, 0.0),
            (6.0, 0.0),
            (7.0, 0.0),
        ]);
        let mut seeding = fixed(&[(0.0, 0.0), (1.0, 0.0)]);
        let run = run(items, 2, &mut seeding, &Euclidean, 0.0, 2).unwrap();
        assert_eq!(run.termination(), Termination::IterationCap);
        assert_eq!(run.iterations().len(), 2);
    }

    #[test]
    fn test_shift_under_tolerance_converges() {
        let items = points(&[(0.0, 0.0), (0.0, 0.2), (10.0, 0.0), (10.0, 0.2)]);
        let mut seeding = fixed(&[(0.0, 0.0), (10.0, 0.0)]);
        let run = run(items, 2, &mut seeding, &Euclidean, 0.5, 100).unwrap();
        assert_eq!(run.iterations().len(), 1);
        match run.termination() {
            Termination::Converged { shift } => assert_ulps_eq!(shift, 0.1),
            Termination::IterationCap => panic!("expected convergence"),
        }
    }

    #[test]
    fn test_manhattan_distance_drives_assignment() {
        // The origin is closer to (2,2) in L2 and closer to (3.5,0) in L1.
        let items = points(&[(0.0, 0.0), (2.0, 2.0), (3.5, 0.0)]);
        let mut seeding = fixed(&[(2.0, 2.0), (3.5, 0.0)]);
        let euclidean = run(items.clone(), 2, &mut seeding, &Euclidean, 0.0, 1).unwrap();
        let manhattan = run(items, 2, &mut seeding, &Manhattan, 0.0, 1).unwrap();
        assert_eq!(
            euclidean.iterations()[0].assignment_of(ItemId(0)),
            Some(ClusterId(0))
        );
        assert_eq!(
            manhattan.iterations()[0].assignment_of(ItemId(0)),
            Some(ClusterId(1))
        );
    }

    #[test]
    fn test_invalid_configuration() {
        let items = points(&[(0.0, 0.0), (1.0, 1.0)]);
        let mut seeding = fixed(&[(0.0, 0.0)]);

        let err = run(Vec::new(), 1, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
        assert_eq!(err, Error::InvalidConfiguration(ConfigError::EmptyInput));

        for k in [0, 3] {
            let err = run(items.clone(), k, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
            assert_eq!(
                err,
                Error::InvalidConfiguration(ConfigError::ClusterCount {
                    requested: k,
                    item_count: 2
                })
            );
        }

        let err = run(items.clone(), 1, &mut seeding, &Euclidean, -1.0, 10).unwrap_err();
        assert_eq!(err, Error::from(ConfigError::Tolerance(-1.0)));
        let err = run(items.clone(), 1, &mut seeding, &Euclidean, f64::NAN, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration(ConfigError::Tolerance(_))
        ));

        let err = run(items.clone(), 1, &mut seeding, &Euclidean, 0.0, 0).unwrap_err();
        assert_eq!(err, Error::from(ConfigError::IterationCap));

        let err = run(items.clone(), 2, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
        assert_eq!(
            err,
            Error::from(ConfigError::SeedCount {
                expected: 2,
                actual: 1
            })
        );

        let duplicated = vec![
            Item::new(ItemId(4), Point2D::new(0.0, 0.0)),
            Item::new(ItemId(4), Point2D::new(1.0, 0.0)),
        ];
        let err = run(duplicated, 1, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
        assert_eq!(err, Error::from(ConfigError::DuplicateItem(ItemId(4))));

        let infinite = points(&[(0.0, 0.0), (f64::INFINITY, 1.0)]);
        let err = run(infinite, 1, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
        assert_eq!(err, Error::from(ConfigError::NonFiniteItem(ItemId(1))));
    }

    #[test]
    fn test_duplicate_fixed_seeds_are_degenerate() {
        let items = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let mut seeding = fixed(&[(1.0, 1.0), (1.0, 1.0)]);
        let err = run(items, 2, &mut seeding, &Euclidean, 0.0, 10).unwrap_err();
        assert_eq!(
            err,
            Error::DegenerateInput {
                distinct: 1,
                cluster_count: 2
            }
        );
    }

    #[test]
    fn test_items_are_sorted_by_id() {
        let items = vec![
            Item::new(ItemId(2), Point2D::new(2.0, 0.0)),
            Item::new(ItemId(0), Point2D::new(0.0, 0.0)),
            Item::new(ItemId(1), Point2D::new(1.0, 0.0)),
        ];
        let run = KMeans {
            cluster_count: 2,
            seeding: KMeansPlusPlus {
                rng: Pcg64::seed_from_u64(11),
            },
            distance: Euclidean,
            tolerance: 0.0,
            max_iter: 10,
        }
        .run(items)
        .unwrap();
        let ids: Vec<_> = run.items().iter().map(Item::id).collect();
        assert_eq!(ids, vec![ItemId(0), ItemId(1), ItemId(2)]);
    }

    /// Items at distinct locations, so that any cluster count can be seeded.
    fn item_set() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::btree_set((-1000..1000_i32, -1000..1000_i32), 1..80).prop_map(|coords| {
            Item::from_points(
                coords
                    .into_iter()
                    .map(|(x, y)| Point2D::new(f64::from(x) / 10.0, f64::from(y) / 10.0)),
            )
        })
    }

    proptest!(
        #![proptest_config(ProptestConfig { timeout: 5000, ..ProptestConfig::default() })]

        #[test]
        fn every_iteration_is_a_partition(
            (items, cluster_count, rng_seed, max_iter) in item_set().prop_flat_map(|items| {
                let len = items.len();
                (Just(items), 1..=len, any::<u64>(), 1..30_usize)
            })
        ) {
            let run = KMeans {
                cluster_count,
                seeding: RandomSeeding { rng: Pcg64::seed_from_u64(rng_seed) },
                distance: Euclidean,
                tolerance: 1e-9,
                max_iter,
            }
            .run(items.clone())
            .unwrap();

            prop_assert!(run.iterations().len() <= max_iter);
            if run.termination() == Termination::IterationCap {
                prop_assert_eq!(run.iterations().len(), max_iter);
            }

            let seed_ids: Vec<_> = run.cluster_ids().collect();
            prop_assert_eq!(seed_ids.len(), cluster_count);

            for iteration in run.iterations() {
                let ids: Vec<_> = iteration.cluster_ids().collect();
                prop_assert_eq!(&ids, &seed_ids);

                let mut assigned: Vec<ItemId> = iteration
                    .clusters()
                    .iter()
                    .flat_map(|cluster| cluster.members().iter().map(Item::id))
                    .collect();
                assigned.sort();
                let expected: Vec<ItemId> = items.iter().map(Item::id).collect();
                prop_assert_eq!(assigned, expected);
            }
        }

        #[test]
        fn inertia_never_increases(
            (items, cluster_count, rng_seed) in item_set().prop_flat_map(|items| {
                let len = items.len();
                (Just(items), 1..=len, any::<u64>())
            })
        ) {
            let run = KMeans {
                cluster_count,
                seeding: KMeansPlusPlus { rng: Pcg64::seed_from_u64(rng_seed) },
                distance: Euclidean,
                tolerance: 0.0,
                max_iter: 50,
            }
            .run(items)
            .unwrap();

            for (before, after) in run.iterations().iter().tuple_windows() {
                let (before, after) = (before.inertia(), after.inertia());
                prop_assert!(
                    after <= before + 1e-9 * before.max(1.0),
                    "inertia went from {} to {}", before, after,
                );
            }
        }
    );
}
