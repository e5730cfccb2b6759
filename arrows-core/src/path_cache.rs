//! Precomputed straight-line rays for every cell.

use std::collections::HashSet;

use crate::geom::{Point, Size};
use crate::puzzle::Puzzle;

/// For every cell, the ordered list of coordinates on its ray, excluding the
/// source cell itself and terminating at the grid edge.
///
/// Rebuilt whenever any cell's direction changes (spec.md §3, §5); purely
/// geometric, so it never borrows the puzzle's candidate state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathCache {
    size: Size,
    rays: Vec<Vec<Point>>,
    // Mirrors `rays` one-for-one; gives `points_at` O(1) membership instead
    // of a linear scan of the ray (spec.md §4.1's performance contract).
    ray_sets: Vec<HashSet<Point>>,
}

impl PathCache {
    /// Rebuilds the path cache from the current direction of every cell.
    pub fn build(puzzle: &Puzzle) -> PathCache {
        let size = puzzle.size();
        let rays: Vec<Vec<Point>> = size
            .points()
            .map(|p| {
                let d = puzzle.cell(p).direction.delta();
                let mut ray = Vec::new();
                let mut cur = p + d;
                while size.contains(cur) {
                    ray.push(cur);
                    cur = cur + d;
                }
                ray
            })
            .collect();
        let ray_sets = rays.iter().map(|ray| ray.iter().copied().collect()).collect();
        PathCache { size, rays, ray_sets }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// The ray leaving `p`, exclusive of `p`, in order away from `p`.
    #[inline]
    pub fn ray(&self, p: Point) -> &[Point] {
        &self.rays[self.size.index_of(p)]
    }

    /// The number of cells ahead of `p` on its ray.
    #[inline]
    pub fn ahead(&self, p: Point) -> usize {
        self.ray(p).len()
    }

    /// True iff `q` lies on `p`'s ray.
    #[inline]
    pub fn points_at(&self, p: Point, q: Point) -> bool {
        self.ray_sets[self.size.index_of(p)].contains(&q)
    }

    /// The number of cells whose ray is empty (they point immediately off
    /// the grid), used by the generator's outward-arrow damping step.
    pub fn outward_count(&self) -> usize {
        self.rays.iter().filter(|r| r.is_empty()).count()
    }
}
