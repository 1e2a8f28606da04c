//! Items, clusters and the iterations that hold them.
//!
//! Every value here is an immutable snapshot.  A cluster is re-created at each
//! step of an algorithm, keeping its [`ClusterId`], so that a cluster can be
//! followed across iterations without sharing mutable state between them.

use crate::geometry::Point2D;
use std::fmt;

/// Identifier of an input item, unique within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}", self.0)
    }
}

/// Identifier of a cluster, assigned at seeding and kept by the cluster for
/// the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub usize);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster {}", self.0)
    }
}

/// An input point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    id: ItemId,
    position: Point2D,
}

impl Item {
    pub fn new(id: ItemId, position: Point2D) -> Item {
        Item { id, position }
    }

    /// Turns points into items numbered from zero, in iteration order.
    ///
    /// ```rust
    /// use kmeans_trail::{Item, ItemId, Point2D};
    ///
    /// let items = Item::from_points([Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)]);
    /// assert_eq!(items[1].id(), ItemId(1));
    /// ```
    pub fn from_points(points: impl IntoIterator<Item = Point2D>) -> Vec<Item> {
        points
            .into_iter()
            .enumerate()
            .map(|(i, position)| Item::new(ItemId(i), position))
            .collect()
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn position(&self) -> Point2D {
        self.position
    }
}

/// A group of items, as it exists in one iteration.
///
/// Only centroid-based clusters are produced by this crate, but iterations
/// are generic over this trait so that other partitioning schemes can reuse
/// them.
pub trait Cluster {
    fn id(&self) -> ClusterId;

    /// Items assigned to the cluster, sorted by [`ItemId`].
    fn members(&self) -> &[Item];

    fn len(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    fn contains(&self, item: ItemId) -> bool {
        self.members()
            .binary_search_by_key(&item, Item::id)
            .is_ok()
    }
}

/// A cluster with a centroid.
///
/// The centroid is not derived from the members: seed clusters have a
/// centroid and no member, and an emptied cluster keeps the centroid it had.
#[derive(Clone, Debug, PartialEq)]
pub struct CentroidCluster {
    id: ClusterId,
    members: Vec<Item>,
    centroid: Point2D,
}

impl CentroidCluster {
    /// A cluster with no member yet.
    pub fn seed(id: ClusterId, centroid: Point2D) -> CentroidCluster {
        CentroidCluster {
            id,
            members: Vec::new(),
            centroid,
        }
    }

    /// # Panics
    ///
    /// In debug builds, panics if `members` is not sorted by id.
    pub fn new(id: ClusterId, members: Vec<Item>, centroid: Point2D) -> CentroidCluster {
        debug_assert!(
            members.windows(2).all(|w| w[0].id() < w[1].id()),
            "members of {id} are not sorted by id",
        );
        CentroidCluster {
            id,
            members,
            centroid,
        }
    }

    pub fn centroid(&self) -> Point2D {
        self.centroid
    }
}

impl Cluster for CentroidCluster {
    fn id(&self) -> ClusterId {
        self.id
    }

    fn members(&self) -> &[Item] {
        &self.members
    }
}

/// The clusters of one algorithm step.
///
/// Order 0 is the seeding, before any item was assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct Iteration<C = CentroidCluster> {
    order: usize,
    clusters: Vec<C>,
}

impl<C> Iteration<C>
where
    C: Cluster,
{
    /// # Panics
    ///
    /// In debug builds, panics if two clusters share an id.
    pub fn new(order: usize, mut clusters: Vec<C>) -> Iteration<C> {
        clusters.sort_by_key(C::id);
        debug_assert!(
            clusters.windows(2).all(|w| w[0].id() != w[1].id()),
            "iteration {order} has duplicate cluster ids",
        );
        Iteration { order, clusters }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Clusters sorted by id.
    pub fn clusters(&self) -> &[C] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&C> {
        self.clusters
            .binary_search_by_key(&id, C::id)
            .ok()
            .map(|idx| &self.clusters[idx])
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters.iter().map(C::id)
    }

    /// The cluster `item` belongs to in this iteration.
    pub fn assignment_of(&self, item: ItemId) -> Option<ClusterId> {
        self.clusters
            .iter()
            .find(|cluster| cluster.contains(item))
            .map(C::id)
    }

    /// Whether both iterations group the same items under the same ids.
    pub fn same_membership<D>(&self, other: &Iteration<D>) -> bool
    where
        D: Cluster,
    {
        self.clusters.len() == other.clusters.len()
            && self.clusters.iter().zip(&other.clusters).all(|(a, b)| {
                a.id() == b.id()
                    && a.len() == b.len()
                    && a.members()
                        .iter()
                        .zip(b.members())
                        .all(|(x, y)| x.id() == y.id())
            })
    }
}

impl Iteration<CentroidCluster> {
    pub fn centroids(&self) -> impl Iterator<Item = (ClusterId, Point2D)> + '_ {
        self.clusters
            .iter()
            .map(|cluster| (cluster.id(), cluster.centroid()))
    }

    /// Sum of squared distances from each item to its cluster's centroid.
    pub fn inertia(&self) -> f64 {
        self.clusters
            .iter()
            .flat_map(|cluster| {
                cluster
                    .members()
                    .iter()
                    .map(move |item| (item.position() - cluster.centroid()).norm_squared())
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(id: usize, members: &[usize], centroid: (f64, f64)) -> CentroidCluster {
        let members = members
            .iter()
            .map(|&i| Item::new(ItemId(i), Point2D::new(i as f64, 0.0)))
            .collect();
        CentroidCluster::new(ClusterId(id), members, Point2D::new(centroid.0, centroid.1))
    }

    #[test]
    fn test_iteration_sorts_clusters() {
        let iteration = Iteration::new(
            3,
            vec![cluster(2, &[0], (0.0, 0.0)), cluster(0, &[1, 2], (1.5, 0.0))],
        );
        let ids: Vec<_> = iteration.cluster_ids().collect();
        assert_eq!(ids, vec![ClusterId(0), ClusterId(2)]);
        assert_eq!(iteration.order(), 3);
        assert!(iteration.cluster(ClusterId(1)).is_none());
        assert_eq!(iteration.cluster(ClusterId(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_assignment_of() {
        let iteration = Iteration::new(
            1,
            vec![cluster(0, &[0, 3], (1.5, 0.0)), cluster(1, &[1, 2], (1.5, 0.0))],
        );
        assert_eq!(iteration.assignment_of(ItemId(3)), Some(ClusterId(0)));
        assert_eq!(iteration.assignment_of(ItemId(2)), Some(ClusterId(1)));
        assert_eq!(iteration.assignment_of(ItemId(7)), None);
    }

    #[test]
    fn test_same_membership_ignores_centroids() {
        let a = Iteration::new(1, vec![cluster(0, &[0, 1], (0.0, 0.0))]);
        let b = Iteration::new(2, vec![cluster(0, &[0, 1], (5.0, 5.0))]);
        let c = Iteration::new(2, vec![cluster(0, &[0, 2], (0.0, 0.0))]);
        let seed = Iteration::new(0, vec![CentroidCluster::seed(ClusterId(0), Point2D::zeros())]);
        assert!(a.same_membership(&b));
        assert!(!a.same_membership(&c));
        assert!(!a.same_membership(&seed));
    }

    #[test]
    fn test_inertia() {
        let iteration = Iteration::new(
            1,
            vec![cluster(0, &[0, 2], (1.0, 0.0)), cluster(1, &[5], (5.0, 1.0))],
        );
        assert_ulps_eq!(iteration.inertia(), 3.0);
    }
}
