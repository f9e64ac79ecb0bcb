//! The NIST prime curves. These have a cofactor of one, points travel in SEC1
//! compressed form and scalars are big endian.

use super::group::{GroupNumber, SpakeGroup};
use crate::constants::{P256_M, P256_N, P384_M, P384_N, P521_M, P521_N};
use crate::error::KrbError;

macro_rules! nist_group {
    ($name:ident, $curve:ident, $group:expr, $m:expr, $n:expr, $field_len:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SpakeGroup for $name {
            type Scalar = $curve::Scalar;
            type Point = $curve::ProjectivePoint;

            const GROUP: GroupNumber = $group;
            const M: &'static [u8] = &$m;
            const N: &'static [u8] = &$n;
            const SCALAR_LITTLE_ENDIAN: bool = false;

            fn generator() -> Self::Point {
                $curve::ProjectivePoint::GENERATOR
            }

            fn cofactor_inverse() -> Self::Scalar {
                $curve::Scalar::from(1u64)
            }

            fn clear_cofactor(point: Self::Point) -> Self::Point {
                point
            }

            fn encode_scalar(scalar: &Self::Scalar) -> Vec<u8> {
                use $curve::elliptic_curve::ff::PrimeField;
                scalar.to_repr().to_vec()
            }

            fn encode_point(point: &Self::Point) -> Vec<u8> {
                use $curve::elliptic_curve::sec1::ToEncodedPoint;
                point.to_affine().to_encoded_point(true).as_bytes().to_vec()
            }

            fn decode_point(bytes: &[u8]) -> Result<Self::Point, KrbError> {
                use $curve::elliptic_curve::sec1::FromEncodedPoint;

                // Only the compressed form, a 0x02 or 0x03 tag and the x coordinate.
                if bytes.len() != $field_len + 1 || !matches!(bytes.first(), Some(0x02 | 0x03)) {
                    tracing::error!(
                        group = ?Self::GROUP,
                        len = bytes.len(),
                        "point is not sec1 compressed"
                    );
                    return Err(KrbError::MalformedMessage);
                }

                let encoded = $curve::EncodedPoint::from_bytes(bytes).map_err(|_| {
                    tracing::error!(group = ?Self::GROUP, "invalid sec1 encoding");
                    KrbError::MalformedMessage
                })?;

                // Rejects x >= p as well as x with no matching y.
                Option::<$curve::AffinePoint>::from($curve::AffinePoint::from_encoded_point(
                    &encoded,
                ))
                .map($curve::ProjectivePoint::from)
                .ok_or_else(|| {
                    tracing::error!(group = ?Self::GROUP, "point is not on the curve");
                    KrbError::MalformedMessage
                })
            }
        }
    };
}

nist_group!(P256, p256, GroupNumber::P256, P256_M, P256_N, 32);
nist_group!(P384, p384, GroupNumber::P384, P384_M, P384_N, 48);
nist_group!(P521, p521, GroupNumber::P521, P521_M, P521_N, 66);
