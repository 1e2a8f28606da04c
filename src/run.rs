use crate::model::ClusterId;
use crate::model::Item;
use crate::model::Iteration;

/// Why an algorithm run stopped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Termination {
    /// No centroid moved by more than the tolerance during the last step.
    /// `shift` is the largest move of that step.
    Converged { shift: f64 },

    /// The iteration cap was reached first.
    IterationCap,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(self, Termination::Converged { .. })
    }
}

/// The complete outcome of a k-means run.
///
/// Iterations are stored for orders `0..=last_order()`, the seed iteration
/// being order 0.  A run is never modified once returned.
#[derive(Clone, Debug)]
pub struct Run {
    items: Vec<Item>,
    seeds: Iteration,
    iterations: Vec<Iteration>,
    termination: Termination,
}

impl Run {
    pub(crate) fn new(
        items: Vec<Item>,
        seeds: Iteration,
        iterations: Vec<Iteration>,
        termination: Termination,
    ) -> Run {
        debug_assert_eq!(seeds.order(), 0);
        debug_assert!(iterations
            .iter()
            .enumerate()
            .all(|(idx, iteration)| iteration.order() == idx + 1));
        Run {
            items,
            seeds,
            iterations,
            termination,
        }
    }

    /// Input items, sorted by id.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The seed iteration: every cluster sits on its seed and has no member.
    pub fn cluster_seeds(&self) -> &Iteration {
        &self.seeds
    }

    /// Iterations of orders `1..=last_order()`.
    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    /// The iteration of the given order, seeds included.
    pub fn iteration(&self, order: usize) -> Option<&Iteration> {
        match order {
            0 => Some(&self.seeds),
            _ => self.iterations.get(order - 1),
        }
    }

    /// The seed iteration followed by every computed iteration.
    pub fn all_iterations(&self) -> impl Iterator<Item = &Iteration> + '_ {
        std::iter::once(&self.seeds).chain(&self.iterations)
    }

    pub fn last_order(&self) -> usize {
        self.iterations.len()
    }

    pub fn final_iteration(&self) -> &Iteration {
        self.iterations.last().unwrap_or(&self.seeds)
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.seeds.cluster_ids()
    }

    /// Sum of squared distances from items to their centroid at `order`.
    pub fn inertia(&self, order: usize) -> Option<f64> {
        self.iteration(order).map(Iteration::inertia)
    }
}
