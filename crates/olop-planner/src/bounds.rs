//! Upper confidence bounds on a node's mean immediate reward.
//!
//! Both bounds assume rewards in `[0, 1]` and are calibrated to hold
//! uniformly over `total_episodes` samples.

use serde::{Deserialize, Serialize};

/// Hoeffding exploration constant.
const HOEFFDING_C: f64 = 4.0;

/// Scale of the KL threshold: `count * kl(mu, q) <= KL_C * ln(total)`.
const KL_C: f64 = 2.0;

/// Bisection steps for the KL bound. 64 halvings exhaust f64 precision on [0, 1].
const KL_BISECTION_STEPS: usize = 64;

/// Probability clamp so the KL divergence stays finite.
const KL_EPS: f64 = 1e-15;

// ---------------------------------------------------------------------------
// ConfidenceBound — the oracle seam
// ---------------------------------------------------------------------------

pub trait ConfidenceBound {
    /// Upper bound on the mean after `count` samples summing to `cumulative_reward`.
    fn compute_bound(&self, cumulative_reward: f64, count: u32, total_episodes: usize) -> f64;

    /// Bound before any sample has been observed.
    fn initial_bound(&self) -> f64;

    /// Whether a leaf's own value is already the tightest over its prefixes,
    /// so sharpening by ancestor minimum is a no-op.
    fn is_sharp(&self) -> bool;
}

// ---------------------------------------------------------------------------
// UpperBound — configured variant
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpperBound {
    #[default]
    Hoeffding,
    KullbackLeibler,
}

impl ConfidenceBound for UpperBound {
    fn compute_bound(&self, cumulative_reward: f64, count: u32, total_episodes: usize) -> f64 {
        match self {
            Self::Hoeffding => hoeffding_upper_bound(cumulative_reward, count, total_episodes),
            Self::KullbackLeibler => kl_upper_bound(cumulative_reward, count, total_episodes),
        }
    }

    fn initial_bound(&self) -> f64 {
        match self {
            Self::Hoeffding => f64::INFINITY,
            Self::KullbackLeibler => 1.0,
        }
    }

    fn is_sharp(&self) -> bool {
        matches!(self, Self::KullbackLeibler)
    }
}

// ---------------------------------------------------------------------------
// Bound primitives
// ---------------------------------------------------------------------------

/// `mean + sqrt(c * ln(total) / (2 * count))`. Unbounded above 1.
pub fn hoeffding_upper_bound(cumulative_reward: f64, count: u32, total_episodes: usize) -> f64 {
    if count == 0 {
        return f64::INFINITY;
    }
    let n = count as f64;
    let log_total = (total_episodes.max(1) as f64).ln();
    cumulative_reward / n + (HOEFFDING_C * log_total / (2.0 * n)).sqrt()
}

/// Largest `q` in `[mean, 1]` with `count * kl(mean, q) <= 2 ln(total)`.
pub fn kl_upper_bound(cumulative_reward: f64, count: u32, total_episodes: usize) -> f64 {
    if count == 0 {
        return 1.0;
    }
    let mu = (cumulative_reward / count as f64).clamp(0.0, 1.0);
    let threshold = KL_C * (total_episodes.max(1) as f64).ln() / count as f64;
    if threshold <= 0.0 {
        return mu;
    }
    if bernoulli_kl(mu, 1.0) <= threshold {
        return 1.0;
    }

    // kl(mu, .) is increasing on [mu, 1]; keep `hi` on the infeasible side
    // so the returned value never undershoots.
    let (mut lo, mut hi) = (mu, 1.0);
    for _ in 0..KL_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if bernoulli_kl(mu, mid) > threshold {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}

/// KL divergence between Bernoulli(p) and Bernoulli(q).
pub fn bernoulli_kl(p: f64, q: f64) -> f64 {
    let q = q.clamp(KL_EPS, 1.0 - KL_EPS);
    xlogy(p, p / q) + xlogy(1.0 - p, (1.0 - p) / (1.0 - q))
}

/// `x * ln(y)` with the `0 * ln(0) = 0` convention.
fn xlogy(x: f64, y: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * y.ln()
    }
}
