use super::group::{GroupNumber, SpakeGroup};
use crate::constants::{EDWARDS25519_M, EDWARDS25519_N};
use crate::error::KrbError;

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use tracing::error;

const ED25519_COFACTOR: u8 = 8;

/// The edwards25519 curve, with points in their standard 32 byte compressed
/// form and scalars little endian.
#[derive(Debug, Clone, Copy)]
pub struct Edwards25519;

impl SpakeGroup for Edwards25519 {
    type Scalar = Scalar;
    type Point = EdwardsPoint;

    const GROUP: GroupNumber = GroupNumber::Edwards25519;
    const M: &'static [u8] = &EDWARDS25519_M;
    const N: &'static [u8] = &EDWARDS25519_N;
    const SCALAR_LITTLE_ENDIAN: bool = true;

    fn generator() -> EdwardsPoint {
        ED25519_BASEPOINT_POINT
    }

    fn cofactor_inverse() -> Scalar {
        Scalar::from(ED25519_COFACTOR).invert()
    }

    fn clear_cofactor(point: EdwardsPoint) -> EdwardsPoint {
        point.mul_by_cofactor()
    }

    fn encode_scalar(scalar: &Scalar) -> Vec<u8> {
        scalar.to_bytes().to_vec()
    }

    fn encode_point(point: &EdwardsPoint) -> Vec<u8> {
        point.compress().to_bytes().to_vec()
    }

    fn decode_point(bytes: &[u8]) -> Result<EdwardsPoint, KrbError> {
        let compressed = CompressedEdwardsY::from_slice(bytes).map_err(|_| {
            error!(len = bytes.len(), "edwards25519 point has the wrong length");
            KrbError::MalformedMessage
        })?;

        let point = compressed.decompress().ok_or_else(|| {
            error!("edwards25519 point is not on the curve");
            KrbError::MalformedMessage
        })?;

        // Decompression accepts y >= p and a set sign bit on x = 0, which would
        // give two encodings of one point.
        if point.compress() != compressed {
            error!("edwards25519 point is not canonically encoded");
            return Err(KrbError::MalformedMessage);
        }

        // Also covers the identity.
        if point.is_small_order() {
            error!("edwards25519 point has small order");
            return Err(KrbError::MalformedMessage);
        }

        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::Edwards25519;
    use crate::error::KrbError;
    use crate::spake::group::SpakeGroup;

    fn decode(hex_point: &str) -> Result<(), KrbError> {
        Edwards25519::decode_point(&hex::decode(hex_point).unwrap()).map(|_| ())
    }

    #[test]
    fn test_rejects_identity_and_torsion() {
        let _ = tracing_subscriber::fmt::try_init();

        // Identity.
        assert_eq!(
            decode("0100000000000000000000000000000000000000000000000000000000000000"),
            Err(KrbError::MalformedMessage)
        );
        // The point of order two, (0, -1).
        assert_eq!(
            decode("ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
            Err(KrbError::MalformedMessage)
        );
        // Order four, y = 0.
        assert_eq!(
            decode("0000000000000000000000000000000000000000000000000000000000000000"),
            Err(KrbError::MalformedMessage)
        );
    }

    #[test]
    fn test_rejects_non_canonical() {
        // y = p, an alias of y = 0.
        assert_eq!(
            decode("edffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
            Err(KrbError::MalformedMessage)
        );
        // The identity again, with the sign bit set on x = 0.
        assert_eq!(
            decode("0100000000000000000000000000000000000000000000000000000000000080"),
            Err(KrbError::MalformedMessage)
        );
    }

    #[test]
    fn test_accepts_basepoint() {
        assert_eq!(
            decode("5866666666666666666666666666666666666666666666666666666666666666"),
            Ok(())
        );
    }

    #[test]
    fn test_cofactor_inverse() {
        use curve25519_dalek::scalar::Scalar;
        assert_eq!(Edwards25519::cofactor_inverse() * Scalar::from(8u8), Scalar::ONE);
    }
}
