//! Mass filter, median-centred isotropic crop and per-axis min–max scaling.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::config::CropPercent;

/// Rows of `positions` whose mass is at least `min_mass`
pub fn mass_filter(positions: ArrayView2<'_, f64>, masses: ArrayView1<'_, f64>, min_mass: f64) -> Array2<f64> {
    let keep: Vec<usize> = masses
        .iter()
        .enumerate()
        .filter(|(_, &m)| m >= min_mass)
        .map(|(i, _)| i)
        .collect();
    positions.select(Axis(0), &keep)
}

/// Median of a column; the mean of the two middle values for even counts
pub fn median(values: ArrayView1<'_, f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.to_vec();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Max minus min of a column
pub fn peak_to_peak(values: ArrayView1<'_, f64>) -> Option<f64> {
    let lo = values.iter().copied().reduce(f64::min)?;
    let hi = values.iter().copied().reduce(f64::max)?;
    Some(hi - lo)
}

/// Axis-aligned cube centred on the coordinate-wise median
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    pub center: [f64; 3],
    /// Edge length, shared by all three axes
    pub size: f64,
}

impl CropWindow {
    /// Window of edge `crop · max(peak-to-peak)` around the median; `None` for
    /// an empty point set
    pub fn fit(points: ArrayView2<'_, f64>, crop: CropPercent) -> Option<Self> {
        let mut center = [0.0; 3];
        let mut extent: f64 = 0.0;
        for (d, c) in center.iter_mut().enumerate() {
            let column = points.column(d);
            *c = median(column)?;
            extent = extent.max(peak_to_peak(column)?);
        }
        Some(Self {
            center,
            size: crop.fraction() * extent,
        })
    }

    pub fn contains(&self, point: ArrayView1<'_, f64>) -> bool {
        let half = self.size / 2.0;
        point
            .iter()
            .zip(self.center.iter())
            .all(|(&x, &c)| x >= c - half && x <= c + half)
    }

    /// Rows inside the window, original order preserved
    pub fn apply(&self, points: ArrayView2<'_, f64>) -> Array2<f64> {
        let keep: Vec<usize> = points
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| self.contains(row.view()))
            .map(|(i, _)| i)
            .collect();
        points.select(Axis(0), &keep)
    }
}

/// Rescale each column independently onto `[-1, 1]`.
///
/// A constant column maps to `-1` (its range is treated as 1).
pub fn min_max_scale(points: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut scaled = points.to_owned();
    for mut column in scaled.columns_mut() {
        let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if hi - lo == 0.0 { 1.0 } else { hi - lo };
        column.mapv_inplace(|x| (x - lo) / range * 2.0 - 1.0);
    }
    scaled
}

/// Column-wise `(min, max)`
pub fn column_bounds(points: ArrayView2<'_, f64>) -> Vec<(f64, f64)> {
    points
        .columns()
        .into_iter()
        .map(|c| {
            let lo = c.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_mass_filter_is_inclusive() {
        let pos = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        let masses = array![0.5, 1.0, 2.0];
        let kept = mass_filter(pos.view(), masses.view(), 1.0);
        assert_eq!(kept, array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(array![3.0, 1.0, 2.0].view()), Some(2.0));
        assert_eq!(median(array![4.0, 1.0, 3.0, 2.0].view()), Some(2.5));
        assert_eq!(median(Array1::<f64>::zeros(0).view()), None);
    }

    #[test]
    fn test_window_uses_largest_axis_extent() {
        // x spans 10, y spans 2, z spans 0
        let pts = array![[0.0, 0.0, 5.0], [5.0, 1.0, 5.0], [10.0, 2.0, 5.0]];
        let w = CropWindow::fit(pts.view(), CropPercent::new(50).unwrap()).unwrap();
        assert_eq!(w.center, [5.0, 1.0, 5.0]);
        assert_eq!(w.size, 5.0);

        let kept = w.apply(pts.view());
        assert_eq!(kept, array![[5.0, 1.0, 5.0]]);
    }

    #[test]
    fn test_crop_membership_both_ways() {
        let mut rng = StdRng::seed_from_u64(3);
        let pts = Array2::from_shape_fn((400, 3), |_| rng.random_range(-50.0..50.0));

        for pct in [1, 12, 40, 77, 100] {
            let crop = CropPercent::new(pct).unwrap();
            let w = CropWindow::fit(pts.view(), crop).unwrap();
            let kept = w.apply(pts.view());

            for row in kept.rows() {
                assert!(w.contains(row));
            }
            let excluded = pts.rows().into_iter().filter(|r| !w.contains(*r)).count();
            assert_eq!(kept.nrows() + excluded, pts.nrows());
        }
    }

    #[test]
    fn test_full_crop_keeps_centered_cloud() {
        // Symmetric cloud: median at the middle, 100% window covers everything
        let pts = array![[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let w = CropWindow::fit(pts.view(), CropPercent::new(100).unwrap()).unwrap();
        assert_eq!(w.apply(pts.view()).nrows(), 3);
    }

    #[test]
    fn test_min_max_scale_hits_both_ends() {
        let pts = array![[2.0, 10.0, 7.0], [4.0, 30.0, 7.0], [3.0, 20.0, 7.0]];
        let scaled = min_max_scale(pts.view());

        assert_eq!(scaled.column(0).to_vec(), vec![-1.0, 1.0, 0.0]);
        assert_eq!(scaled.column(1).to_vec(), vec![-1.0, 1.0, 0.0]);
        // constant axis
        assert_eq!(scaled.column(2).to_vec(), vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_column_bounds() {
        let pts = array![[2.0, -3.0], [1.0, 5.0]];
        assert_eq!(column_bounds(pts.view()), vec![(1.0, 2.0), (-3.0, 5.0)]);
    }
}
