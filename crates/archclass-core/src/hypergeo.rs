//! Real-valued binomial coefficients and the hypergeometric tail, used by
//! the ASI bigram trainer to turn average per-deck card counts into
//! co-occurrence probabilities.

use statrs::function::gamma::ln_gamma;

use crate::consts::COMB_OVERFLOW_CAP;

/// Real-valued binomial coefficient `C(n, k)`, computed through the gamma
/// function so that fractional average counts (e.g. "1.6 copies of this
/// card per deck on average") can stand in for `n`/`k`.
///
/// Mirrors the source trainer's guards: negative or out-of-range `k`
/// yields 0, and both the trivial `k == 0`/`k == n` cases short-circuit
/// before reaching the gamma function, which blows up past roughly `170!`.
pub fn comb(n: f64, k: f64) -> f64 {
    if k > n || n < 1.0 {
        return 0.0;
    }
    if k <= 0.0 || (k - n).abs() < f64::EPSILON {
        return 1.0;
    }
    // C(n, k) == C(n, n-k); picking the smaller of the two keeps both gamma
    // arguments under the overflow cap for a wider range of callers.
    let k = k.min(n - k);
    if n > COMB_OVERFLOW_CAP || k > COMB_OVERFLOW_CAP {
        return 0.0;
    }
    let ln_c = ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0);
    ln_c.exp()
}

/// Probability of drawing at least `n` copies of a card in a `n_draws`-card
/// sample from an `nn`-card population containing `k` copies of it.
///
/// `k`, `nn` and the lower bound `n` are real-valued: trainers pass in
/// average per-deck counts, not integer card totals, so every term of the
/// tail sum goes through [`comb`] rather than an integer binomial.
pub fn hypergeo(k: f64, nn: f64, n: f64, n_draws: f64) -> f64 {
    let denom = comb(nn, n_draws);
    if denom <= 0.0 {
        return 0.0;
    }
    let upper = n_draws.floor() as i64;
    let lower = n.ceil().max(0.0) as i64;
    let mut total = 0.0;
    let mut i = lower;
    while i <= upper {
        let fi = i as f64;
        total += comb(k, fi) * comb(nn - k, n_draws - fi);
        i += 1;
    }
    total / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comb_matches_known_values() {
        assert!((comb(5.0, 2.0) - 10.0).abs() < 1e-6);
        assert!((comb(6.0, 0.0) - 1.0).abs() < 1e-6);
        assert!((comb(6.0, 6.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn comb_rejects_out_of_range_k() {
        assert_eq!(comb(3.0, 5.0), 0.0);
        assert_eq!(comb(0.0, 1.0), 0.0);
    }

    #[test]
    fn hypergeo_is_a_probability() {
        let p = hypergeo(4.0, 60.0, 1.0, 7.0);
        assert!(p >= 0.0 && p <= 1.0);
    }

    #[test]
    fn hypergeo_monotonic_in_population_share() {
        let low = hypergeo(1.0, 60.0, 1.0, 7.0);
        let high = hypergeo(20.0, 60.0, 1.0, 7.0);
        assert!(high > low);
    }

    #[test]
    fn hypergeo_zero_copies_is_zero_probability() {
        assert_eq!(hypergeo(0.0, 60.0, 1.0, 7.0), 0.0);
    }

    #[test]
    fn hypergeo_matches_known_four_copy_value() {
        // P(>=1 copy in a 7-card opener, 4 copies in a 60-card deck).
        let p = hypergeo(4.0, 60.0, 1.0, 7.0);
        assert!((p - 0.3993).abs() < 1e-4);
    }
}
