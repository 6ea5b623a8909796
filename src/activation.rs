/// Logistic sigmoid, the activation of both layers.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    1. / (1. + (-z).exp())
}

/// Derivative of the sigmoid at pre-activation `z`.
///
/// Far below zero `e^{-z}` overflows and this yields NaN, which is how a runaway
/// step size surfaces as a diverged network.
#[inline]
pub fn sigmoid_prime(z: f64) -> f64 {
    let e = (-z).exp();
    e / (e + 1.).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_values() {
        assert_eq!(sigmoid(0.), 0.5);
        assert!(sigmoid(10.) > 0.9999);
        assert!(sigmoid(-10.) < 0.0001);
    }

    #[test]
    fn prime_matches_closed_form() {
        for z in [-5., -1., 0., 0.5, 3.] {
            let s = sigmoid(z);
            assert!((sigmoid_prime(z) - s * (1. - s)).abs() < 1e-12);
        }
    }

    #[test]
    fn prime_overflows_far_below_zero() {
        assert!(sigmoid_prime(-800.).is_nan());
        assert_eq!(sigmoid_prime(800.), 0.);
    }
}
