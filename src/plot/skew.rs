//! Skew-T log-P coordinate transform
//!
//! The vertical axis is `-ln(p)` so pressure decreases upwards. Isotherms
//! are skewed to the right by `skew` °C per e-fold of pressure, anchored
//! at the bottom pressure so the bottom axis reads true temperatures.

use std::ops::Range;

use crate::models::Level;

/// Minimum temperature span shown on the diagram, °C
const MIN_SPAN: f64 = 60.0;
const PADDING: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct SkewTransform {
    pub skew: f64,
    pub bottom_pressure: f64,
    pub top_pressure: f64,
}

impl SkewTransform {
    #[must_use]
    pub fn new(skew: f64, bottom_pressure: f64, top_pressure: f64) -> Self {
        Self {
            skew,
            bottom_pressure,
            top_pressure,
        }
    }

    /// Diagram x of temperature `t` at pressure `p`
    #[must_use]
    pub fn x(&self, t: f64, p: f64) -> f64 {
        t + self.skew * (self.bottom_pressure / p).ln()
    }

    #[must_use]
    pub fn y(&self, p: f64) -> f64 {
        -p.ln()
    }

    #[must_use]
    pub fn point(&self, t: f64, p: f64) -> (f64, f64) {
        (self.x(t, p), self.y(p))
    }

    /// Bottom-to-top y range
    #[must_use]
    pub fn y_range(&self) -> Range<f64> {
        self.y(self.bottom_pressure)..self.y(self.top_pressure)
    }

    #[must_use]
    pub fn contains_pressure(&self, p: f64) -> bool {
        p <= self.bottom_pressure && p >= self.top_pressure
    }

    /// `n` pressures spaced evenly in `ln(p)` from bottom to top
    #[must_use]
    pub fn pressures(&self, n: usize) -> Vec<f64> {
        let n = n.max(2);
        let (lo, hi) = (self.bottom_pressure.ln(), self.top_pressure.ln());
        (0..n)
            .map(|i| (lo + (hi - lo) * i as f64 / (n - 1) as f64).exp())
            .collect()
    }

    /// x range covering the temperature and dew point traces
    #[must_use]
    pub fn x_range(&self, levels: &[Level]) -> Range<f64> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for level in levels.iter().filter(|l| self.contains_pressure(l.pressure)) {
            for t in [level.temperature, level.dew_point] {
                let x = self.x(t, level.pressure);
                min = min.min(x);
                max = max.max(x);
            }
        }
        if !min.is_finite() || !max.is_finite() {
            return -40.0..40.0;
        }

        let (mut min, mut max) = (min - PADDING, max + PADDING);
        if max - min < MIN_SPAN {
            let grow = (MIN_SPAN - (max - min)) / 2.0;
            min -= grow;
            max += grow;
        }
        min..max
    }
}

/// Split a polyline into the runs that lie inside `x_range`
#[must_use]
pub fn clip_runs(points: &[(f64, f64)], x_range: &Range<f64>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &point in points {
        if x_range.contains(&point.0) {
            current.push(point);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs.retain(|run| run.len() >= 2);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sounding::tests::level;

    fn transform() -> SkewTransform {
        SkewTransform::new(35.0, 1050.0, 100.0)
    }

    #[test]
    fn test_bottom_reads_true_temperature() {
        let t = transform();
        assert_eq!(t.x(12.5, 1050.0), 12.5);
        // isotherms lean right with height
        assert!(t.x(0.0, 500.0) > t.x(0.0, 850.0));
        assert!(t.y(500.0) > t.y(850.0));
    }

    #[test]
    fn test_pressures_span_range() {
        let p = transform().pressures(20);
        assert_eq!(p.len(), 20);
        assert!((p[0] - 1050.0).abs() < 1e-9);
        assert!((p[19] - 100.0).abs() < 1e-9);
        assert!(p.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_x_range_covers_traces() {
        let t = transform();
        let levels = vec![level(950.0, 15.0), level(500.0, -20.0), level(50.0, -60.0)];
        let range = t.x_range(&levels);
        for l in &levels[..2] {
            assert!(range.contains(&t.x(l.temperature, l.pressure)));
            assert!(range.contains(&t.x(l.dew_point, l.pressure)));
        }
        assert!(range.end - range.start >= MIN_SPAN);
    }

    #[test]
    fn test_clip_runs_splits_at_edges() {
        let points = vec![(-50.0, 0.0), (0.0, 1.0), (10.0, 2.0), (99.0, 3.0), (20.0, 4.0)];
        let runs = clip_runs(&points, &(-20.0..50.0));
        assert_eq!(runs, vec![vec![(0.0, 1.0), (10.0, 2.0)]]);
    }
}
