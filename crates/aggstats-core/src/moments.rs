//! Streaming moment accumulators
//!
//! Both accumulators use Welford-style updates: they track the running mean and
//! the sum of squared deviations from it instead of raw power sums, so columns
//! with large magnitudes (incomes in the tens of thousands, populations in the
//! millions) do not lose precision to cancellation. Memory is O(1) regardless of
//! how many observations are pushed.
//!
//! Accumulators from disjoint partitions can be combined with `merge`
//! (Chan et al. pairwise update).
//!
//! Sums of squares are only clamped for finite negative rounding error. An
//! accumulator that overflowed reports a non-finite value; see
//! [`Moments::is_finite`] and [`CoMoments::is_finite`].

/// Univariate running moments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    n: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self::new()
    }
}

impl Moments {
    pub fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn merge(&mut self, other: &Moments) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = *other;
            return;
        }
        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.n += other.n;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of observations
    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean, Σ(x - x̄)²
    pub fn m2(&self) -> f64 {
        clamp_rounding(self.m2)
    }

    /// Whether the mean and sum of squares are representable
    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.m2.is_finite()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Bivariate running moments over index-aligned (x, y) pairs
///
/// Updates use the deviation from the previous means for both variables, so
/// the co-moment is bitwise identical when x and y are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoMoments {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl CoMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        if self.n == 1 {
            self.mean_x = x;
            self.mean_y = y;
            return;
        }
        let n = self.n as f64;
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        let w = (n - 1.0) / n;

        self.mean_x += dx / n;
        self.mean_y += dy / n;
        self.m2_x += dx * dx * w;
        self.m2_y += dy * dy * w;
        self.c_xy += dx * dy * w;
    }

    pub fn merge(&mut self, other: &CoMoments) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = *other;
            return;
        }
        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n = n_a + n_b;
        let dx = other.mean_x - self.mean_x;
        let dy = other.mean_y - self.mean_y;
        let w = n_a * n_b / n;

        self.mean_x += dx * n_b / n;
        self.mean_y += dy * n_b / n;
        self.m2_x += other.m2_x + dx * dx * w;
        self.m2_y += other.m2_y + dy * dy * w;
        self.c_xy += other.c_xy + dx * dy * w;
        self.n += other.n;
    }

    /// Swap the roles of x and y
    pub fn transpose(&self) -> Self {
        Self {
            n: self.n,
            mean_x: self.mean_y,
            mean_y: self.mean_x,
            m2_x: self.m2_y,
            m2_y: self.m2_x,
            c_xy: self.c_xy,
        }
    }

    /// Number of complete pairs
    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    pub fn mean_y(&self) -> f64 {
        self.mean_y
    }

    /// Σ(x - x̄)²
    pub fn sxx(&self) -> f64 {
        clamp_rounding(self.m2_x)
    }

    /// Σ(y - ȳ)²
    pub fn syy(&self) -> f64 {
        clamp_rounding(self.m2_y)
    }

    /// Σ(x - x̄)(y - ȳ)
    pub fn sxy(&self) -> f64 {
        self.c_xy
    }

    /// Whether every mean and co-moment is representable
    pub fn is_finite(&self) -> bool {
        [self.mean_x, self.mean_y, self.m2_x, self.m2_y, self.c_xy]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Zero out negative rounding error; NaN and infinities pass through
fn clamp_rounding(m2: f64) -> f64 {
    if m2 < 0.0 && m2.is_finite() {
        0.0
    } else {
        m2
    }
}
