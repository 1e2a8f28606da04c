//! K-means over 2D points, recorded iteration by iteration so that its
//! convergence can be replayed.
//!
//! # Crate Layout
//!
//! - [`run`] (or the [`KMeans`] settings struct) computes a [`Run`]: the seed
//!   iteration plus every iteration of Lloyd's algorithm.  Initial centroids
//!   come from a [`Seeding`] strategy and distances from a [`Distance`].
//! - [`History`] turns a [`Run`] into display frames (two per iteration, see
//!   the [`history`] module) and centroid trajectories.
//!
//! Clusters keep their [`ClusterId`] for the whole run, which is what lets a
//! renderer follow them from one frame to the next.
//!
//! # Example
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kmeans_trail::{History, Item, KMeans, Point2D};
//!
//! let points = (0..40).map(|i| {
//!     let offset = if i % 2 == 0 { 0.0 } else { 20.0 };
//!     Point2D::new(offset + (i % 5) as f64, (i % 3) as f64)
//! });
//! let run = KMeans { cluster_count: 2, ..KMeans::default() }.run(Item::from_points(points))?;
//!
//! let history = History::new(&run);
//! for frame in 1..=history.frame_count() {
//!     let frame = history.render_frame(frame)?;
//!     for cluster in &frame.clusters {
//!         let _ = (cluster.id, cluster.centroid(), cluster.links());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    rust_2018_idioms
)]

#[cfg(test)]
#[macro_use]
extern crate approx;

mod algorithms;
mod geometry;
pub mod history;
mod model;
mod run;


pub use crate::algorithms::*;
pub use crate::geometry::center;
pub use crate::geometry::{Chebyshev, Distance, Euclidean, Manhattan, Point2D};
pub use crate::history::History;
pub use crate::model::{CentroidCluster, Cluster, ClusterId, Item, ItemId, Iteration};
pub use crate::run::{Run, Termination};

pub use nalgebra;
