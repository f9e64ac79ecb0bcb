use crate::constants::{AES_128_KEY_LEN, AES_256_KEY_LEN, AES_BLOCK_SIZE, SHA1_HMAC_LEN};
use crate::error::KrbError;
use num_enum::{IntoPrimitive, TryFromPrimitive, TryFromPrimitiveError};

/// The simplified profile encryption types this library implements. Numbers are
/// the IANA Kerberos registry values and are what travels on the wire.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum EncryptionType {
    AES128_CTS_HMAC_SHA1_96 = 17,
    AES256_CTS_HMAC_SHA1_96 = 18,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum ChecksumType {
    HMAC_SHA1_96_AES128 = 15,
    HMAC_SHA1_96_AES256 = 16,
}

impl EncryptionType {
    pub fn block_size(self) -> usize {
        AES_BLOCK_SIZE
    }

    /// CTS needs no padding, so the pad size is a single byte.
    pub fn pad_size(self) -> usize {
        1
    }

    pub fn mac_size(self) -> usize {
        SHA1_HMAC_LEN
    }

    /// Length of both the protocol key and the random-to-key seed.
    pub fn seed_size(self) -> usize {
        match self {
            EncryptionType::AES128_CTS_HMAC_SHA1_96 => AES_128_KEY_LEN,
            EncryptionType::AES256_CTS_HMAC_SHA1_96 => AES_256_KEY_LEN,
        }
    }

    pub fn checksum_type(self) -> ChecksumType {
        match self {
            EncryptionType::AES128_CTS_HMAC_SHA1_96 => ChecksumType::HMAC_SHA1_96_AES128,
            EncryptionType::AES256_CTS_HMAC_SHA1_96 => ChecksumType::HMAC_SHA1_96_AES256,
        }
    }
}

impl ChecksumType {
    pub fn mac_size(self) -> usize {
        SHA1_HMAC_LEN
    }

    /// The enctype whose keys this checksum is computed with.
    pub fn enctype(self) -> EncryptionType {
        match self {
            ChecksumType::HMAC_SHA1_96_AES128 => EncryptionType::AES128_CTS_HMAC_SHA1_96,
            ChecksumType::HMAC_SHA1_96_AES256 => EncryptionType::AES256_CTS_HMAC_SHA1_96,
        }
    }
}

impl From<TryFromPrimitiveError<EncryptionType>> for KrbError {
    fn from(err: TryFromPrimitiveError<EncryptionType>) -> Self {
        tracing::debug!(enctype = err.number, "unsupported encryption type");
        KrbError::UnsupportedEncryption
    }
}

impl From<TryFromPrimitiveError<ChecksumType>> for KrbError {
    fn from(err: TryFromPrimitiveError<ChecksumType>) -> Self {
        tracing::debug!(cksumtype = err.number, "unsupported checksum type");
        KrbError::UnsupportedChecksumType
    }
}
