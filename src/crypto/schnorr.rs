//! Schnorr verification over secp256k1 in affine coordinates.
//!
//! Implements the exact scheme the ledger verifier checks: given (r, s, v)
//! and a public point P, recover R from r via a modular square root, compute
//! the challenge e = SHA-256(Rx ‖ Ry ‖ Px ‖ Py ‖ message) mod Q and accept
//! iff s·G + e·P = R (equivalently s·G = R − e·P).
//!
//! The square-root routine relies on the field prime being congruent to
//! 3 mod 4 (true for secp256k1); a different curve needs a different
//! root-finding method.

use crypto_bigint::modular::constant_mod::{Residue, ResidueParams};
use crypto_bigint::{impl_modulus, Encoding, NonZero, RandomMod, U256};
use sha2::{Digest, Sha256};

// secp256k1 base field prime p.
// Ref: <https://www.secg.org/sec2-v2.pdf>.
impl_modulus!(
    FieldP,
    U256,
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F"
);

// secp256k1 group order q.
impl_modulus!(
    CurveOrder,
    U256,
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141"
);

/// (p + 1) / 4, the square-root exponent for p ≡ 3 (mod 4)
const SQRT_EXP: U256 =
    U256::from_be_hex("3FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFBFFFFF0C");

const GEN_X: U256 =
    U256::from_be_hex("79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
const GEN_Y: U256 =
    U256::from_be_hex("483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8");

type Fp = Residue<FieldP, { U256::LIMBS }>;
pub(crate) type Fq = Residue<CurveOrder, { U256::LIMBS }>;

fn fp(x: &U256) -> Fp {
    Fp::new(x)
}

pub(crate) fn fq(x: &U256) -> Fq {
    Fq::new(x)
}

/// An affine point on the curve, or the point at infinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine { x: U256, y: U256 },
}

/// The group generator G
pub fn generator() -> Point {
    Point::Affine { x: GEN_X, y: GEN_Y }
}

/// Short-Weierstrass equation check: y² = x³ + 7 (mod p)
pub fn is_on_curve(x: &U256, y: &U256) -> bool {
    if x >= &FieldP::MODULUS || y >= &FieldP::MODULUS {
        return false;
    }
    let lhs = fp(y) * fp(y);
    let rhs = fp(x) * fp(x) * fp(x) + fp(&U256::from(7u8));
    lhs.retrieve() == rhs.retrieve()
}

/// Point doubling: 2P
pub fn point_double(p: &Point) -> Point {
    match p {
        Point::Infinity => Point::Infinity,
        Point::Affine { x, y } => {
            if *y == U256::ZERO {
                return Point::Infinity;
            }
            // λ = 3x² / 2y
            let lambda =
                fp(&U256::from(3u8)) * fp(x) * fp(x) * (fp(&U256::from(2u8)) * fp(y)).invert().0;
            let x3 = lambda * lambda - fp(x) - fp(x);
            let y3 = lambda * (fp(x) - x3) - fp(y);
            Point::Affine {
                x: x3.retrieve(),
                y: y3.retrieve(),
            }
        }
    }
}

/// Point addition: P + Q
pub fn point_add(p: &Point, q: &Point) -> Point {
    match (p, q) {
        (Point::Infinity, _) => *q,
        (_, Point::Infinity) => *p,
        (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => {
            if x1 == x2 {
                // Same x: either a doubling or P + (−P)
                if (fp(y1) + fp(y2)).retrieve() == U256::ZERO {
                    return Point::Infinity;
                }
                return point_double(p);
            }
            // λ = (y2 − y1) / (x2 − x1)
            let lambda = (fp(y2) - fp(y1)) * (fp(x2) - fp(x1)).invert().0;
            let x3 = lambda * lambda - fp(x1) - fp(x2);
            let y3 = lambda * (fp(x1) - x3) - fp(y1);
            Point::Affine {
                x: x3.retrieve(),
                y: y3.retrieve(),
            }
        }
    }
}

/// Double-and-add scalar multiplication: k·P
pub fn scalar_mul(p: &Point, scalar: &U256) -> Point {
    let mut acc = Point::Infinity;
    for byte in scalar.to_be_bytes() {
        for bit in (0..8).rev() {
            acc = point_double(&acc);
            if (byte >> bit) & 1 == 1 {
                acc = point_add(&acc, p);
            }
        }
    }
    acc
}

/// Modular square root of `a` (mod p), valid only because p ≡ 3 (mod 4)
pub fn mod_sqrt(a: &U256) -> Option<U256> {
    let root = fp(a).pow(&SQRT_EXP);
    if (root * root).retrieve() == fp(a).retrieve() {
        Some(root.retrieve())
    } else {
        None
    }
}

/// Challenge e = SHA-256(Rx ‖ Ry ‖ Px ‖ Py ‖ message) mod q
pub(crate) fn challenge(rx: &U256, ry: &U256, px: &U256, py: &U256, message: &[u8; 32]) -> U256 {
    let mut hasher = Sha256::new();
    hasher.update(rx.to_be_bytes());
    hasher.update(ry.to_be_bytes());
    hasher.update(px.to_be_bytes());
    hasher.update(py.to_be_bytes());
    hasher.update(message);
    let digest: [u8; 32] = hasher.finalize().into();
    fq(&U256::from_be_bytes(digest)).retrieve()
}

/// Verify a Schnorr signature (r, s, v) over `message` against (pub_x, pub_y).
///
/// v is the recovery bit: 2 for even R.y, 3 for odd.
pub fn verify(
    message: &[u8; 32],
    pub_x: &[u8; 32],
    pub_y: &[u8; 32],
    v: u8,
    r: &[u8; 32],
    s: &[u8; 32],
) -> bool {
    let s_int = U256::from_be_bytes(*s);
    if s_int == U256::ZERO || s_int >= CurveOrder::MODULUS {
        return false;
    }
    if v != 2 && v != 3 {
        return false;
    }
    let px = U256::from_be_bytes(*pub_x);
    let py = U256::from_be_bytes(*pub_y);
    if !is_on_curve(&px, &py) {
        return false;
    }

    // Recover R from r: candidate y² = r³ + 7, root parity selected by v
    let r_int = U256::from_be_bytes(*r);
    if r_int == U256::ZERO || r_int >= FieldP::MODULUS {
        return false;
    }
    let candidate = (fp(&r_int) * fp(&r_int) * fp(&r_int) + fp(&U256::from(7u8))).retrieve();
    let mut ry = match mod_sqrt(&candidate) {
        Some(root) => root,
        None => return false,
    };
    let root_is_odd = ry.to_be_bytes()[31] & 1 == 1;
    if root_is_odd != (v == 3) {
        ry = (Fp::ZERO - fp(&ry)).retrieve();
    }
    if !is_on_curve(&r_int, &ry) {
        return false;
    }

    let e = challenge(&r_int, &ry, &px, &py, message);
    let lhs = point_add(
        &scalar_mul(&generator(), &s_int),
        &scalar_mul(&Point::Affine { x: px, y: py }, &e),
    );
    lhs == Point::Affine { x: r_int, y: ry }
}

/// Derive the public point for a secret scalar
pub fn public_key(secret: &[u8; 32]) -> Option<([u8; 32], [u8; 32])> {
    let x_int = U256::from_be_bytes(*secret);
    if x_int == U256::ZERO || x_int >= CurveOrder::MODULUS {
        return None;
    }
    match scalar_mul(&generator(), &x_int) {
        Point::Affine { x, y } => Some((x.to_be_bytes(), y.to_be_bytes())),
        Point::Infinity => None,
    }
}

/// Produce a Schnorr signature over `message` with the given secret scalar.
///
/// Companion of [`verify`]: s = k − e·x (mod q) so that s·G + e·P = R.
pub fn sign(message: &[u8; 32], secret: &[u8; 32]) -> Option<([u8; 32], [u8; 32], u8)> {
    let x_int = U256::from_be_bytes(*secret);
    if x_int == U256::ZERO || x_int >= CurveOrder::MODULUS {
        return None;
    }
    let (px, py) = match scalar_mul(&generator(), &x_int) {
        Point::Affine { x, y } => (x, y),
        Point::Infinity => return None,
    };

    let modulus = NonZero::new(CurveOrder::MODULUS)
        .expect("the order of the secp256k1 curve is non-zero");
    let mut rng = rand::thread_rng();
    // Fresh nonce per attempt; retry on the (negligible) degenerate cases
    for _ in 0..8 {
        let k = U256::random_mod(&mut rng, &modulus);
        if let Some(sig) = sign_with_nonce(message, &x_int, &px, &py, &k) {
            return Some(sig);
        }
    }
    None
}

/// Deterministic half of [`sign`]: produce (r, s, v) for a caller-chosen
/// nonce. Returns None on degenerate nonces.
fn sign_with_nonce(
    message: &[u8; 32],
    secret: &U256,
    px: &U256,
    py: &U256,
    k: &U256,
) -> Option<([u8; 32], [u8; 32], u8)> {
    if *k == U256::ZERO || k >= &CurveOrder::MODULUS {
        return None;
    }
    let (rx, ry) = match scalar_mul(&generator(), k) {
        Point::Affine { x, y } => (x, y),
        Point::Infinity => return None,
    };
    let v = if ry.to_be_bytes()[31] & 1 == 0 { 2 } else { 3 };
    let e = challenge(&rx, &ry, px, py, message);
    let s = (fq(k) - fq(&e) * fq(secret)).retrieve();
    if s == U256::ZERO {
        return None;
    }
    Some((rx.to_be_bytes(), s.to_be_bytes(), v))
}

/// Produce (r, s, v) for an externally supplied nonce scalar.
///
/// The signer network uses this to fix the group nonce point before the
/// response scalar is split into shares.
pub fn sign_with_nonce_bytes(
    message: &[u8; 32],
    secret: &[u8; 32],
    nonce: &[u8; 32],
) -> Option<([u8; 32], [u8; 32], u8)> {
    let x_int = U256::from_be_bytes(*secret);
    if x_int == U256::ZERO || x_int >= CurveOrder::MODULUS {
        return None;
    }
    let (px, py) = match scalar_mul(&generator(), &x_int) {
        Point::Affine { x, y } => (x, y),
        Point::Infinity => return None,
    };
    sign_with_nonce(message, &x_int, &px, &py, &U256::from_be_bytes(*nonce))
}

/// Nonce point coordinates for a nonce scalar, as (Rx, v)
pub fn nonce_point(nonce: &[u8; 32]) -> Option<([u8; 32], u8)> {
    let k = U256::from_be_bytes(*nonce);
    if k == U256::ZERO || k >= CurveOrder::MODULUS {
        return None;
    }
    match scalar_mul(&generator(), &k) {
        Point::Affine { x, y } => {
            let v = if y.to_be_bytes()[31] & 1 == 0 { 2 } else { 3 };
            Some((x.to_be_bytes(), v))
        }
        Point::Infinity => None,
    }
}

/// A uniformly random non-zero scalar below the curve order
pub fn random_scalar() -> [u8; 32] {
    let modulus = NonZero::new(CurveOrder::MODULUS)
        .expect("the order of the secp256k1 curve is non-zero");
    let mut rng = rand::thread_rng();
    loop {
        let k = U256::random_mod(&mut rng, &modulus);
        if k != U256::ZERO {
            return k.to_be_bytes();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> [u8; 32] {
        let mut s = [0u8; 32];
        s[31] = 0x2a;
        s[15] = 0x11;
        s
    }

    #[test]
    fn test_generator_on_curve() {
        assert!(is_on_curve(&GEN_X, &GEN_Y));
    }

    #[test]
    fn test_double_matches_scalar_mul() {
        let g = generator();
        let doubled = point_double(&g);
        let by_scalar = scalar_mul(&g, &U256::from(2u8));
        assert_eq!(doubled, by_scalar);
        // G + G routes through the doubling branch
        assert_eq!(point_add(&g, &g), doubled);
    }

    #[test]
    fn test_point_plus_negation_is_infinity() {
        let g = generator();
        let neg_y = (Fp::ZERO - fp(&GEN_Y)).retrieve();
        let neg_g = Point::Affine { x: GEN_X, y: neg_y };
        assert_eq!(point_add(&g, &neg_g), Point::Infinity);
    }

    #[test]
    fn test_order_times_generator_is_infinity() {
        assert_eq!(
            scalar_mul(&generator(), &CurveOrder::MODULUS),
            Point::Infinity
        );
    }

    #[test]
    fn test_sqrt_of_non_residue_fails() {
        // 5 is a quadratic non-residue mod the secp256k1 prime
        assert!(mod_sqrt(&U256::from(5u8)).is_none());
        assert_eq!(mod_sqrt(&U256::from(4u8)), Some(U256::from(2u8)));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let secret = test_secret();
        let message = [0xabu8; 32];
        let (r, s, v) = sign(&message, &secret).unwrap();
        let (px, py) = public_key(&secret).unwrap();
        assert!(verify(&message, &px, &py, v, &r, &s));
    }

    #[test]
    fn test_bit_flip_rejected() {
        let secret = test_secret();
        let message = [0x55u8; 32];
        let (r, s, v) = sign(&message, &secret).unwrap();
        let (px, py) = public_key(&secret).unwrap();

        let mut bad_r = r;
        bad_r[17] ^= 0x01;
        assert!(!verify(&message, &px, &py, v, &bad_r, &s));

        let mut bad_s = s;
        bad_s[3] ^= 0x80;
        assert!(!verify(&message, &px, &py, v, &r, &bad_s));

        let mut bad_msg = message;
        bad_msg[31] ^= 0x01;
        assert!(!verify(&bad_msg, &px, &py, v, &r, &s));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let secret = test_secret();
        let message = [0x01u8; 32];
        let (r, s, v) = sign(&message, &secret).unwrap();
        let (px, py) = public_key(&secret).unwrap();

        // Bad recovery bit
        assert!(!verify(&message, &px, &py, 1, &r, &s));
        assert!(!verify(&message, &px, &py, 27, &r, &s));
        // Zero s
        assert!(!verify(&message, &px, &py, v, &r, &[0u8; 32]));
        // s >= Q
        assert!(!verify(&message, &px, &py, v, &r, &[0xffu8; 32]));
        // Off-curve public point
        let mut bad_py = py;
        bad_py[0] ^= 0x01;
        assert!(!verify(&message, &px, &bad_py, v, &r, &s));
    }

    #[test]
    fn test_sign_with_nonce_is_deterministic_and_valid() {
        let secret = test_secret();
        let message = [0x09u8; 32];
        let nonce = {
            let mut n = [0u8; 32];
            n[31] = 0x5f;
            n[0] = 0x01;
            n
        };
        let first = sign_with_nonce_bytes(&message, &secret, &nonce).unwrap();
        let second = sign_with_nonce_bytes(&message, &secret, &nonce).unwrap();
        assert_eq!(first, second);

        let (r, s, v) = first;
        let (px, py) = public_key(&secret).unwrap();
        assert!(verify(&message, &px, &py, v, &r, &s));

        let (rx, announced_v) = nonce_point(&nonce).unwrap();
        assert_eq!((rx, announced_v), (r, v));
    }

    #[test]
    fn test_wrong_parity_bit_rejected() {
        let secret = test_secret();
        let message = [0x77u8; 32];
        let (r, s, v) = sign(&message, &secret).unwrap();
        let (px, py) = public_key(&secret).unwrap();
        let flipped = if v == 2 { 3 } else { 2 };
        assert!(!verify(&message, &px, &py, flipped, &r, &s));
    }
}
