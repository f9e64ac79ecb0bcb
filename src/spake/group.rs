use crate::error::KrbError;
use num_enum::{IntoPrimitive, TryFromPrimitive, TryFromPrimitiveError};
use rand::CryptoRng;
use serde::Deserialize;
use std::ops::{Add, Mul, Sub};
use zeroize::{Zeroize, Zeroizing};

/// SPAKE group numbers as carried in the support and challenge messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Deserialize,
)]
#[repr(i32)]
pub enum GroupNumber {
    #[serde(rename = "edwards25519")]
    Edwards25519 = 1,
    #[serde(rename = "P-256")]
    P256 = 2,
    #[serde(rename = "P-384")]
    P384 = 3,
    #[serde(rename = "P-521")]
    P521 = 4,
}

impl GroupNumber {
    /// Length in bytes of the PRF+ output reduced to the blinding factor.
    pub fn multiplier_len(self) -> usize {
        match self {
            GroupNumber::Edwards25519 | GroupNumber::P256 => 32,
            GroupNumber::P384 => 48,
            GroupNumber::P521 => 66,
        }
    }
}

impl From<TryFromPrimitiveError<GroupNumber>> for KrbError {
    fn from(err: TryFromPrimitiveError<GroupNumber>) -> Self {
        tracing::debug!(group = err.number, "unsupported spake group");
        KrbError::UnsupportedSpakeGroup
    }
}

/// A prime order (sub)group with the two fixed SPAKE points M and N.
pub trait SpakeGroup {
    type Scalar: Copy
        + PartialEq
        + Zeroize
        + From<u64>
        + Add<Output = Self::Scalar>
        + Mul<Output = Self::Scalar>;
    type Point: Copy
        + PartialEq
        + Add<Output = Self::Point>
        + Sub<Output = Self::Point>
        + Mul<Self::Scalar, Output = Self::Point>;

    const GROUP: GroupNumber;

    /// Encodings of M and N, in the same format as [SpakeGroup::encode_point].
    const M: &'static [u8];
    const N: &'static [u8];

    /// Scalars (and the multiplier from which w is taken) are little endian
    /// for edwards25519 and big endian for the NIST curves.
    const SCALAR_LITTLE_ENDIAN: bool;

    fn generator() -> Self::Point;

    /// The inverse of the cofactor modulo the group order.
    fn cofactor_inverse() -> Self::Scalar;

    /// Multiply by the cofactor, moving a point into the prime order subgroup.
    fn clear_cofactor(point: Self::Point) -> Self::Point;

    fn encode_scalar(scalar: &Self::Scalar) -> Vec<u8>;

    fn encode_point(point: &Self::Point) -> Vec<u8>;

    /// Decode a peer supplied point. Malformed, non-canonical, identity and
    /// small order encodings are all rejected.
    fn decode_point(bytes: &[u8]) -> Result<Self::Point, KrbError>;

    fn constant_m() -> Result<Self::Point, KrbError> {
        Self::decode_point(Self::M)
    }

    fn constant_n() -> Result<Self::Point, KrbError> {
        Self::decode_point(Self::N)
    }

    /// Interpret `bytes` as an integer in the group's byte order and reduce it
    /// modulo the group order.
    fn reduce_scalar(bytes: &[u8]) -> Self::Scalar {
        let radix = Self::Scalar::from(256);
        let step = |acc: Self::Scalar, b: &u8| acc * radix + Self::Scalar::from(u64::from(*b));

        if Self::SCALAR_LITTLE_ENDIAN {
            bytes.iter().rev().fold(Self::Scalar::from(0), step)
        } else {
            bytes.iter().fold(Self::Scalar::from(0), step)
        }
    }

    /// A uniformly random scalar. Sixteen extra bytes are drawn so the bias from
    /// reduction is negligible.
    fn random_scalar<R: CryptoRng + ?Sized>(rng: &mut R) -> Self::Scalar {
        let mut buf = Zeroizing::new(vec![0u8; Self::GROUP.multiplier_len() + 16]);
        rng.fill_bytes(&mut buf);
        Self::reduce_scalar(&buf)
    }
}
