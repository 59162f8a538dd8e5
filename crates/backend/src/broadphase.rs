use crate::shape::Aabb;

/// Sweep-and-prune broadphase on the x axis.
///
/// Produces candidate pairs `(i, j)` with `i < j`, sorted, for every pair of
/// margin-expanded boxes that overlap. Boxes with non-finite bounds are skipped.
#[derive(Debug, Clone)]
pub struct SweepAndPruneBroadphase {
    margin: f32,
    pairs: Vec<(usize, usize)>,
}

#[derive(Clone, Copy)]
struct Endpoint {
    min: f32,
    max: f32,
    index: usize,
}

impl SweepAndPruneBroadphase {
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            pairs: Vec::new(),
        }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Pairs found by the last call to [`Self::calculate_overlapping_pairs`].
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn calculate_overlapping_pairs(&mut self, aabbs: &[Aabb]) -> &[(usize, usize)] {
        let expanded: Vec<Aabb> = aabbs.iter().map(|a| a.expanded(self.margin)).collect();

        let mut endpoints: Vec<Endpoint> = expanded
            .iter()
            .enumerate()
            .filter(|(_, a)| a.min.is_finite() && a.max.is_finite())
            .map(|(index, a)| Endpoint {
                min: a.min.x,
                max: a.max.x,
                index,
            })
            .collect();
        endpoints.sort_by(|a, b| a.min.total_cmp(&b.min).then(a.index.cmp(&b.index)));

        self.pairs.clear();
        let mut active: Vec<Endpoint> = Vec::new();
        for e in endpoints {
            active.retain(|other| other.max >= e.min);
            for other in &active {
                let (i, j) = if other.index < e.index {
                    (other.index, e.index)
                } else {
                    (e.index, other.index)
                };
                if expanded[i].overlaps(&expanded[j]) {
                    self.pairs.push((i, j));
                }
            }
            active.push(e);
        }
        self.pairs.sort_unstable();

        tracing::trace!(boxes = aabbs.len(), pairs = self.pairs.len(), "broadphase pass");
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb {
            min: Vec3::new(x, y, 0.0),
            max: Vec3::new(x + 1.0, y + 1.0, 1.0),
        }
    }

    #[test]
    fn finds_only_overlapping_pairs() {
        let mut bp = SweepAndPruneBroadphase::new(0.0);
        let boxes = [
            unit_box_at(0.0, 0.0),
            unit_box_at(0.5, 0.0),
            unit_box_at(5.0, 0.0),
        ];
        assert_eq!(bp.calculate_overlapping_pairs(&boxes), &[(0, 1)]);
    }

    #[test]
    fn overlapping_on_x_but_not_y_is_rejected() {
        let mut bp = SweepAndPruneBroadphase::new(0.0);
        let boxes = [unit_box_at(0.0, 0.0), unit_box_at(0.2, 3.0)];
        assert!(bp.calculate_overlapping_pairs(&boxes).is_empty());
    }

    #[test]
    fn margin_widens_candidates() {
        let mut bp = SweepAndPruneBroadphase::new(0.3);
        let boxes = [unit_box_at(0.0, 0.0), unit_box_at(1.5, 0.0)];
        assert_eq!(bp.calculate_overlapping_pairs(&boxes), &[(0, 1)]);
    }

    #[test]
    fn pairs_are_sorted_and_ordered() {
        let mut bp = SweepAndPruneBroadphase::new(0.0);
        let boxes = [
            unit_box_at(2.0, 0.0),
            unit_box_at(0.0, 0.0),
            unit_box_at(0.5, 0.0),
            unit_box_at(1.2, 0.0),
        ];
        let pairs = bp.calculate_overlapping_pairs(&boxes).to_vec();
        assert_eq!(pairs, vec![(0, 3), (1, 2), (2, 3)]);
    }

    #[test]
    fn non_finite_boxes_are_skipped() {
        let mut bp = SweepAndPruneBroadphase::new(0.0);
        let mut bad = unit_box_at(0.0, 0.0);
        bad.min.x = f32::NAN;
        let boxes = [bad, unit_box_at(0.0, 0.0)];
        assert!(bp.calculate_overlapping_pairs(&boxes).is_empty());
    }
}
