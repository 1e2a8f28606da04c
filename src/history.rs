//! Replay of a finished run as a sequence of display frames.
//!
//! Each iteration of a run is shown in two frames:
//!
//! 1. the *assignment* frame shows items grouped by their new cluster, while
//!    centroids still sit where the previous iteration left them, with a link
//!    from each item to its centroid;
//! 2. the *update* frame shows centroids at their new position.
//!
//! Frames are numbered from 1: frames `2o - 1` and `2o` show the iteration of
//! order `o`.  The seed iteration has no frame of its own; it is the
//! "previous" state of frame 1.

use crate::geometry::Point2D;
use crate::model::Cluster as _;
use crate::model::ClusterId;
use crate::model::Item;
use crate::model::Iteration;
use crate::run::Run;
use std::collections::BTreeMap;
use std::fmt;

/// Centroid trajectories, by cluster.
pub type Paths = BTreeMap<ClusterId, Vec<Point2D>>;

/// Which half of an iteration a frame shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Assignment,
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Assignment => write!(f, "assignment"),
            Phase::Update => write!(f, "update"),
        }
    }
}

/// Maps a frame index to the order of the iteration it shows: `ceil(frame / 2)`.
pub fn iteration_order(frame: usize) -> usize {
    frame / 2 + frame % 2
}

/// Phase of `frame` within the iteration of order `order`.
///
/// Only `frame == 2 * order` is an update frame.
pub fn sub_phase(frame: usize, order: usize) -> Phase {
    if frame == order * 2 {
        Phase::Update
    } else {
        Phase::Assignment
    }
}

/// Where a frame sits in the run.
///
/// Only built by [`FramePosition::locate`], so `order` is at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramePosition {
    order: usize,
    phase: Phase,
}

impl FramePosition {
    /// Position of a 1-based frame index, regardless of any run length.
    ///
    /// ```rust
    /// use kmeans_trail::history::{FramePosition, Phase};
    ///
    /// assert_eq!(FramePosition::locate(0), None);
    ///
    /// let position = FramePosition::locate(3).unwrap();
    /// assert_eq!(position.order(), 2);
    /// assert_eq!(position.phase(), Phase::Assignment);
    /// ```
    pub fn locate(frame: usize) -> Option<FramePosition> {
        if frame == 0 {
            return None;
        }
        let order = iteration_order(frame);
        Some(FramePosition {
            order,
            phase: sub_phase(frame, order),
        })
    }

    /// Order of the iteration shown by the frame.
    pub fn order(self) -> usize {
        self.order
    }

    pub fn phase(self) -> Phase {
        self.phase
    }

    /// Inverse of [`FramePosition::locate`].
    pub fn frame(self) -> usize {
        match self.phase {
            Phase::Assignment => 2 * (self.order - 1) + 1,
            Phase::Update => 2 * self.order,
        }
    }

    /// Order of the iteration whose centroids are drawn.
    pub fn displayed_order(self) -> usize {
        match self.phase {
            Phase::Assignment => self.order - 1,
            Phase::Update => self.order,
        }
    }
}

/// A query fell outside of the recorded run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutOfRange {
    /// Frames go from 1 to `frame_count`.
    Frame { frame: usize, frame_count: usize },

    /// Orders go from 0 to `last`.
    Order { order: usize, last: usize },
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfRange::Frame { frame, frame_count } => {
                write!(f, "frame {frame} is not in [1; {frame_count}]")
            }
            OutOfRange::Order { order, last } => {
                write!(f, "iteration {order} is not in [0; {last}]")
            }
        }
    }
}

impl std::error::Error for OutOfRange {}

/// One cluster as drawn in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCluster<'r> {
    pub id: ClusterId,
    pub members: &'r [Item],
    /// Centroid in the previous iteration.
    pub centroid_prev: Point2D,
    /// Centroid in the iteration shown by the frame.
    pub centroid_curr: Point2D,
    pub phase: Phase,
}

impl<'r> FrameCluster<'r> {
    /// The centroid to draw: still the previous one during assignment.
    pub fn centroid(&self) -> Point2D {
        match self.phase {
            Phase::Assignment => self.centroid_prev,
            Phase::Update => self.centroid_curr,
        }
    }

    /// Segments from the drawn centroid to each member, for assignment frames.
    pub fn links(&self) -> impl Iterator<Item = (Point2D, Point2D)> + 'r {
        let centroid = self.centroid();
        let members: &'r [Item] = match self.phase {
            Phase::Assignment => self.members,
            Phase::Update => &[],
        };
        members
            .iter()
            .map(move |item| (centroid, item.position()))
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<'r> {
    pub index: usize,
    pub order: usize,
    pub phase: Phase,
    /// Clusters sorted by id.
    pub clusters: Vec<FrameCluster<'r>>,
    /// Trajectories of the centroids up to the drawn ones.
    pub paths: Paths,
}

/// Read-only view of a run as an animation.
///
/// All queries are pure; a `History` can be shared between threads.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use kmeans_trail::history::Phase;
/// use kmeans_trail::{Euclidean, FixedSeeding, History, Item, Point2D};
///
/// let items = Item::from_points([
///     Point2D::new(0.0, 0.0),
///     Point2D::new(0.0, 2.0),
///     Point2D::new(10.0, 0.0),
///     Point2D::new(10.0, 2.0),
/// ]);
/// let mut seeding = FixedSeeding(vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)]);
/// let run = kmeans_trail::run(items, 2, &mut seeding, &Euclidean, 1e-6, 100)?;
///
/// let history = History::new(&run);
/// assert_eq!(history.frame_count(), 2);
///
/// let frame = history.render_frame(1)?;
/// assert_eq!(frame.phase, Phase::Assignment);
/// assert_eq!(frame.clusters[0].centroid(), Point2D::new(0.0, 0.0));
///
/// let frame = history.render_frame(2)?;
/// assert_eq!(frame.clusters[0].centroid(), Point2D::new(0.0, 1.0));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct History<'r> {
    run: &'r Run,
}

impl<'r> History<'r> {
    pub fn new(run: &'r Run) -> History<'r> {
        History { run }
    }

    pub fn run(&self) -> &'r Run {
        self.run
    }

    /// Two frames per iteration, seeds excluded.
    pub fn frame_count(&self) -> usize {
        2 * self.run.iterations().len()
    }

    pub fn locate(&self, frame: usize) -> Result<FramePosition, OutOfRange> {
        let frame_count = self.frame_count();
        if frame_count < frame {
            return Err(OutOfRange::Frame { frame, frame_count });
        }
        FramePosition::locate(frame).ok_or(OutOfRange::Frame { frame, frame_count })
    }

    pub fn frame_to_iteration_order(&self, frame: usize) -> Result<usize, OutOfRange> {
        self.locate(frame).map(|position| position.order)
    }

    pub fn frame_sub_phase(&self, frame: usize, order: usize) -> Phase {
        sub_phase(frame, order)
    }

    /// Positions of every frame, in display order.
    pub fn frames(&self) -> impl Iterator<Item = FramePosition> {
        (1..=self.frame_count()).filter_map(FramePosition::locate)
    }

    pub fn iteration(&self, order: usize) -> Result<&'r Iteration, OutOfRange> {
        self.run.iteration(order).ok_or(OutOfRange::Order {
            order,
            last: self.run.last_order(),
        })
    }

    pub fn render_frame(&self, frame: usize) -> Result<Frame<'r>, OutOfRange> {
        let position = self.locate(frame)?;
        let previous = self.iteration(position.order - 1)?;
        let current = self.iteration(position.order)?;

        let clusters = current
            .clusters()
            .iter()
            .map(|cluster| FrameCluster {
                id: cluster.id(),
                members: cluster.members(),
                centroid_prev: previous
                    .cluster(cluster.id())
                    .map_or(cluster.centroid(), |prev| prev.centroid()),
                centroid_curr: cluster.centroid(),
                phase: position.phase,
            })
            .collect();

        Ok(Frame {
            index: frame,
            order: position.order,
            phase: position.phase,
            clusters,
            paths: self.path_history(position.displayed_order())?,
        })
    }

    /// Centroid trajectory of every cluster present at `order`.
    ///
    /// A path lists the cluster's centroid in each iteration up to `order`
    /// (seeds included) in which the cluster appears.
    pub fn path_history(&self, order: usize) -> Result<Paths, OutOfRange> {
        let target = self.iteration(order)?;
        let mut paths: Paths = target
            .cluster_ids()
            .map(|id| (id, Vec::with_capacity(order + 1)))
            .collect();
        for iteration in self.run.all_iterations().take(order + 1) {
            for (id, centroid) in iteration.centroids() {
                if let Some(path) = paths.get_mut(&id) {
                    path.push(centroid);
                }
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_schedule() {
        let expected = [
            (1, 1, Phase::Assignment),
            (2, 1, Phase::Update),
            (3, 2, Phase::Assignment),
            (4, 2, Phase::Update),
            (9, 5, Phase::Assignment),
        ];
        for (frame, order, phase) in expected {
            assert_eq!(iteration_order(frame), order, "frame {frame}");
            assert_eq!(sub_phase(frame, order), phase, "frame {frame}");
        }
    }

    #[test]
    fn test_displayed_order() {
        let assignment = FramePosition::locate(5).unwrap();
        let update = FramePosition::locate(6).unwrap();
        assert_eq!(assignment.displayed_order(), 2);
        assert_eq!(update.displayed_order(), 3);
    }

    #[test]
    fn test_history_is_sync() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<History<'_>>();
        assert_sync::<Frame<'_>>();
    }

    #[test]
    fn test_locate_last_frames() {
        let last = FramePosition::locate(usize::MAX).unwrap();
        assert_eq!(last.order(), usize::MAX / 2 + 1);
        assert_eq!(last.phase(), Phase::Assignment);
        assert_eq!(last.frame(), usize::MAX);
        assert_eq!(last.displayed_order(), usize::MAX / 2);

        let update = FramePosition::locate(usize::MAX - 1).unwrap();
        assert_eq!(update.order(), usize::MAX / 2);
        assert_eq!(update.phase(), Phase::Update);
        assert_eq!(update.frame(), usize::MAX - 1);
    }

    #[test]
    fn test_history_rejects_huge_frames() {
        let run = crate::run(
            Item::from_points([Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)]),
            2,
            &mut crate::FixedSeeding(vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)]),
            &crate::Euclidean,
            0.0,
            10,
        )
        .unwrap();
        let history = History::new(&run);
        assert_eq!(
            history.render_frame(usize::MAX),
            Err(OutOfRange::Frame {
                frame: usize::MAX,
                frame_count: 2
            })
        );
    }

    proptest!(
        #[test]
        fn locate_round_trips(order in 1..100_000_usize) {
            let assignment = FramePosition::locate(2 * order - 1).unwrap();
            let update = FramePosition::locate(2 * order).unwrap();
            prop_assert_eq!(assignment, FramePosition { order, phase: Phase::Assignment });
            prop_assert_eq!(update, FramePosition { order, phase: Phase::Update });
            prop_assert_eq!(assignment.frame(), 2 * order - 1);
            prop_assert_eq!(update.frame(), 2 * order);
        }
    );
}
