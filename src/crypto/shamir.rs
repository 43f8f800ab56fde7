//! Shamir secret sharing over the secp256k1 curve order.
//!
//! The signer network splits the response scalar of a signature into n
//! shares with threshold k; the coordinator reconstructs it by Lagrange
//! interpolation at zero once k distinct shares arrive.

use crypto_bigint::modular::constant_mod::ResidueParams;
use crypto_bigint::{Encoding, NonZero, RandomMod, U256};

use super::schnorr::{fq, CurveOrder, Fq};

/// Split `secret` into `total` shares with reconstruction threshold
/// `threshold`. Share indices are 1-based.
///
/// Panics if `threshold` is zero or exceeds `total`; callers validate
/// their quorum configuration up front.
pub fn split(secret: &[u8; 32], threshold: usize, total: usize) -> Vec<(u16, [u8; 32])> {
    assert!(threshold >= 1 && threshold <= total, "invalid quorum shape");

    let modulus =
        NonZero::new(CurveOrder::MODULUS).expect("the order of the secp256k1 curve is non-zero");
    let mut rng = rand::thread_rng();

    // P(x) = secret + c1·x + … + c_{k-1}·x^{k-1}
    let mut coeffs: Vec<Fq> = Vec::with_capacity(threshold);
    coeffs.push(fq(&U256::from_be_bytes(*secret)));
    for _ in 1..threshold {
        coeffs.push(fq(&U256::random_mod(&mut rng, &modulus)));
    }

    (1..=total as u16)
        .map(|index| {
            let x = fq(&U256::from(index as u64));
            // Horner evaluation
            let mut acc = Fq::ZERO;
            for coeff in coeffs.iter().rev() {
                acc = acc * x + *coeff;
            }
            (index, acc.retrieve().to_be_bytes())
        })
        .collect()
}

/// Reconstruct the secret from at least the threshold number of distinct
/// shares via Lagrange interpolation at zero
pub fn reconstruct(shares: &[(u16, [u8; 32])]) -> [u8; 32] {
    let mut acc = Fq::ZERO;
    for (i, (xi, yi)) in shares.iter().enumerate() {
        let xi_r = fq(&U256::from(*xi as u64));
        // λ_i = Π_{j≠i} x_j / (x_j − x_i)
        let mut numerator = Fq::ONE;
        let mut denominator = Fq::ONE;
        for (j, (xj, _)) in shares.iter().enumerate() {
            if i == j {
                continue;
            }
            let xj_r = fq(&U256::from(*xj as u64));
            numerator = numerator * xj_r;
            denominator = denominator * (xj_r - xi_r);
        }
        let lambda = numerator * denominator.invert().0;
        acc = acc + fq(&U256::from_be_bytes(*yi)) * lambda;
    }
    acc.retrieve().to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> [u8; 32] {
        let mut s = [0u8; 32];
        s[31] = 0x2a;
        s[1] = 0x80;
        s
    }

    #[test]
    fn test_any_threshold_subset_reconstructs() {
        let shares = split(&secret(), 3, 5);
        assert_eq!(shares.len(), 5);

        assert_eq!(reconstruct(&shares[0..3]), secret());
        assert_eq!(reconstruct(&shares[2..5]), secret());
        let scattered = vec![shares[0], shares[2], shares[4]];
        assert_eq!(reconstruct(&scattered), secret());
        // More than the threshold also works
        assert_eq!(reconstruct(&shares), secret());
    }

    #[test]
    fn test_below_threshold_does_not_reconstruct() {
        let shares = split(&secret(), 3, 5);
        assert_ne!(reconstruct(&shares[0..2]), secret());
    }

    #[test]
    fn test_tampered_share_corrupts_result() {
        let mut shares = split(&secret(), 2, 3);
        shares[1].1[31] ^= 0x01;
        assert_ne!(reconstruct(&shares[0..2]), secret());
    }

    #[test]
    fn test_threshold_one_is_constant_polynomial() {
        let shares = split(&secret(), 1, 3);
        for (_, y) in &shares {
            assert_eq!(*y, secret());
        }
    }
}
