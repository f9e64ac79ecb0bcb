//! The RFC3961 simplified profile for the aes-cts-hmac-sha1-96 encryption types.

mod cts;
mod enctype;
mod nfold;

pub use self::enctype::{ChecksumType, EncryptionType};
pub use self::nfold::nfold;

use crate::constants::*;
use crate::error::KrbError;

use aes::{Aes128, Aes256};
use hmac::{digest::FixedOutput, Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha1::{Digest, Sha1};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::{error, trace};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha1 = Hmac<Sha1>;

const SHA1_OUTPUT_LEN: usize = 20;

/// A protocol key. The variant fixes both the enctype and the key length, so a
/// key of the wrong size can't be constructed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub enum Key {
    Aes128CtsHmacSha196 { k: [u8; AES_128_KEY_LEN] },
    Aes256CtsHmacSha196 { k: [u8; AES_256_KEY_LEN] },
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("Key");
        match self {
            Key::Aes128CtsHmacSha196 { .. } => builder.field("k", &"Aes128"),
            Key::Aes256CtsHmacSha196 { .. } => builder.field("k", &"Aes256"),
        };
        builder.finish()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.enctype() == other.enctype() && bool::from(self.as_bytes().ct_eq(other.as_bytes()))
    }
}

impl Eq for Key {}

impl Key {
    pub fn enctype(&self) -> EncryptionType {
        match self {
            Key::Aes128CtsHmacSha196 { .. } => EncryptionType::AES128_CTS_HMAC_SHA1_96,
            Key::Aes256CtsHmacSha196 { .. } => EncryptionType::AES256_CTS_HMAC_SHA1_96,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Key::Aes128CtsHmacSha196 { k } => k,
            Key::Aes256CtsHmacSha196 { k } => k,
        }
    }

    /// Build a key from raw key bytes, which must be exactly the enctype's key length.
    pub fn from_bytes(enctype: EncryptionType, bytes: &[u8]) -> Result<Self, KrbError> {
        match enctype {
            EncryptionType::AES128_CTS_HMAC_SHA1_96 => bytes
                .try_into()
                .map(|k| Key::Aes128CtsHmacSha196 { k })
                .map_err(|_| KrbError::WrongKeyLength),
            EncryptionType::AES256_CTS_HMAC_SHA1_96 => bytes
                .try_into()
                .map(|k| Key::Aes256CtsHmacSha196 { k })
                .map_err(|_| KrbError::WrongKeyLength),
        }
    }
}

/// The AES keyspace is dense, so random-to-key is the identity once the seed
/// length is checked.
pub fn random_to_key(enctype: EncryptionType, seed: &[u8]) -> Result<Key, KrbError> {
    if seed.len() != enctype.seed_size() {
        error!(?enctype, len = seed.len(), "wrong crypto seed length");
        return Err(KrbError::WrongSeedLength);
    }
    Key::from_bytes(enctype, seed)
}

fn basic_encrypt(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>, KrbError> {
    match key {
        Key::Aes128CtsHmacSha196 { k } => cts::encrypt::<Aes128>(k, plaintext),
        Key::Aes256CtsHmacSha196 { k } => cts::encrypt::<Aes256>(k, plaintext),
    }
}

fn basic_decrypt(key: &Key, ciphertext: &[u8]) -> Result<Vec<u8>, KrbError> {
    match key {
        Key::Aes128CtsHmacSha196 { k } => cts::decrypt::<Aes128>(k, ciphertext),
        Key::Aes256CtsHmacSha196 { k } => cts::decrypt::<Aes256>(k, ciphertext),
    }
}

/// DK(key, constant) from RFC3961. The constant is n-folded to one block, then
/// encrypted repeatedly, each output feeding the next, until there is enough
/// material for a key of the same enctype.
pub fn derive(key: &Key, constant: &[u8]) -> Result<Key, KrbError> {
    let enctype = key.enctype();
    let seed_size = enctype.seed_size();

    let mut block = Zeroizing::new(nfold(constant, enctype.block_size()));
    let mut seed = Zeroizing::new(Vec::with_capacity(seed_size + enctype.block_size()));

    while seed.len() < seed_size {
        block = Zeroizing::new(basic_encrypt(key, &block)?);
        seed.extend_from_slice(&block);
    }
    seed.truncate(seed_size);

    random_to_key(enctype, &seed)
}

fn usage_constant(key_usage: i32, discriminator: u8) -> [u8; 5] {
    let mut constant = [discriminator; 5];
    constant[..4].copy_from_slice(&key_usage.to_be_bytes());
    constant
}

fn hmac_sha1_96(key: &Key, parts: &[&[u8]]) -> Result<[u8; SHA1_HMAC_LEN], KrbError> {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| KrbError::InvalidHmacSha1Key)?;
    for part in parts {
        mac.update(part);
    }

    let mut buf = [0u8; SHA1_OUTPUT_LEN];
    mac.finalize_into((&mut buf).into());

    // Truncate to 96 bits.
    let mut truncated = [0u8; SHA1_HMAC_LEN];
    truncated.copy_from_slice(&buf[..SHA1_HMAC_LEN]);
    Ok(truncated)
}

/// Given the users passphrase and salt, derive their base key. `params` is the
/// opaque s2kparams value, a big endian iteration count, which defaults to the
/// RFC3962 value of 0x1000 (4096) when absent.
pub fn string_to_key(
    enctype: EncryptionType,
    passphrase: &[u8],
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Key, KrbError> {
    let iter_count = match params {
        None => RFC_PBKDF2_SHA1_ITER,
        Some(params) => {
            let params: [u8; S2K_PARAMS_LEN] = params.try_into().map_err(|_| {
                error!(len = params.len(), "s2kparams must be four bytes");
                KrbError::PreauthInvalidS2KParams
            })?;
            u32::from_be_bytes(params)
        }
    };

    if iter_count == 0 {
        error!("s2kparams iteration count of zero");
        return Err(KrbError::PreauthInvalidS2KParams);
    }

    trace!(?enctype, iter_count, "string to key");

    let mut seed = Zeroizing::new(vec![0u8; enctype.seed_size()]);
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, &mut seed);

    let tkey = random_to_key(enctype, &seed)?;
    derive(&tkey, DK_CONSTANT_KERBEROS)
}

/// Encrypt and authenticate `plaintext` with a fresh random confounder.
pub fn encrypt(key: &Key, key_usage: i32, plaintext: &[u8]) -> Result<Vec<u8>, KrbError> {
    let mut confounder = [0u8; AES_BLOCK_SIZE];
    rand::rng().fill(&mut confounder);
    encrypt_with_confounder(key, key_usage, plaintext, &confounder)
}

/// As [encrypt] but with a caller chosen confounder. Only for reproducing known
/// answer vectors, never for real traffic.
pub fn encrypt_with_confounder(
    key: &Key,
    key_usage: i32,
    plaintext: &[u8],
    confounder: &[u8],
) -> Result<Vec<u8>, KrbError> {
    let enctype = key.enctype();
    if confounder.len() != enctype.block_size() {
        return Err(KrbError::InvalidConfounderLength);
    }

    let ki = derive(key, &usage_constant(key_usage, KEY_USAGE_KI))?;
    let ke = derive(key, &usage_constant(key_usage, KEY_USAGE_KE))?;

    // Zero pad to the profile's padding multiple.
    let pad_size = enctype.pad_size();
    let padded_len = plaintext.len().div_ceil(pad_size) * pad_size;

    let mut basic_plaintext = Zeroizing::new(Vec::with_capacity(confounder.len() + padded_len));
    basic_plaintext.extend_from_slice(confounder);
    basic_plaintext.extend_from_slice(plaintext);
    basic_plaintext.resize(confounder.len() + padded_len, 0);

    let my_hmac = hmac_sha1_96(&ki, &[basic_plaintext.as_slice()])?;

    let mut ciphertext = basic_encrypt(&ke, &basic_plaintext)?;
    ciphertext.extend_from_slice(&my_hmac);

    Ok(ciphertext)
}

/// Decrypt and authenticate. The confounder is removed, but any zero padding
/// added at encryption is not, since the plaintext length is not recorded.
pub fn decrypt(key: &Key, key_usage: i32, ciphertext: &[u8]) -> Result<Vec<u8>, KrbError> {
    let enctype = key.enctype();

    if ciphertext.len() < enctype.block_size() + enctype.mac_size() {
        error!(len = ciphertext.len(), "ciphertext too short");
        return Err(KrbError::CiphertextTooShort);
    }

    let (basic_ctext, msg_hmac) = ciphertext.split_at(ciphertext.len() - enctype.mac_size());

    if basic_ctext.len() % enctype.pad_size() != 0 {
        error!(len = basic_ctext.len(), "ciphertext does not meet padding requirement");
        return Err(KrbError::InvalidPadding);
    }

    let ki = derive(key, &usage_constant(key_usage, KEY_USAGE_KI))?;
    let ke = derive(key, &usage_constant(key_usage, KEY_USAGE_KE))?;

    let mut basic_plaintext = basic_decrypt(&ke, basic_ctext)?;

    let my_hmac = hmac_sha1_96(&ki, &[basic_plaintext.as_slice()])?;

    if bool::from(my_hmac.ct_eq(msg_hmac)) {
        // The first block is the confounder. Discard it.
        Ok(basic_plaintext.split_off(enctype.block_size()))
    } else {
        basic_plaintext.zeroize();
        error!(key_usage, "ciphertext integrity failure");
        Err(KrbError::IntegrityFailure)
    }
}

fn checksum_key(cksumtype: ChecksumType, key: &Key, key_usage: i32) -> Result<Key, KrbError> {
    if cksumtype.enctype() != key.enctype() {
        error!(?cksumtype, enctype = ?key.enctype(), "checksum type does not match key");
        return Err(KrbError::ChecksumKeyMismatch);
    }
    derive(key, &usage_constant(key_usage, KEY_USAGE_KC))
}

pub fn make_checksum(
    cksumtype: ChecksumType,
    key: &Key,
    key_usage: i32,
    text: &[u8],
) -> Result<Vec<u8>, KrbError> {
    let kc = checksum_key(cksumtype, key, key_usage)?;
    hmac_sha1_96(&kc, &[text]).map(|mac| mac[..cksumtype.mac_size()].to_vec())
}

pub fn verify_checksum(
    cksumtype: ChecksumType,
    key: &Key,
    key_usage: i32,
    text: &[u8],
    cksum: &[u8],
) -> Result<(), KrbError> {
    let expected = make_checksum(cksumtype, key, key_usage, text)?;
    if bool::from(expected.ct_eq(cksum)) {
        Ok(())
    } else {
        error!(?cksumtype, key_usage, "checksum verification failure");
        Err(KrbError::ChecksumFailure)
    }
}

/// RFC3962 PRF: the SHA-1 of `input`, cut to a whole block, encrypted under
/// DK(key, "prf").
pub fn prf(key: &Key, input: &[u8]) -> Result<Vec<u8>, KrbError> {
    let block_size = key.enctype().block_size();
    let digest = Sha1::digest(input);
    let truncated = &digest[..(digest.len() / block_size) * block_size];

    let kp = derive(key, DK_CONSTANT_PRF)?;
    basic_encrypt(&kp, truncated)
}

/// RFC6113 PRF+: PRF(key, 1 || input) || PRF(key, 2 || input) || ... cut to
/// `len` bytes. The counter is one octet.
pub fn prf_plus(key: &Key, input: &[u8], len: usize) -> Result<Vec<u8>, KrbError> {
    let prf_len = key.enctype().block_size();
    let count = len.div_ceil(prf_len);
    if count > usize::from(u8::MAX) {
        error!(len, "prf+ output too long");
        return Err(KrbError::PrfOutputTooLong);
    }

    let mut counted_input = Zeroizing::new(Vec::with_capacity(1 + input.len()));
    counted_input.push(0);
    counted_input.extend_from_slice(input);

    let mut output = Vec::with_capacity(count * prf_len);
    for counter in 1..=count {
        counted_input[0] = counter as u8;
        output.extend_from_slice(&prf(key, &counted_input)?);
    }
    output.truncate(len);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    const KEY_AES128: &str = "9062430C8CDA3388922E6D6A509F5B7A";
    const KEY_AES256: &str = "F1C795E9248A09338D82C3F8D5B567040B0110736845041347235B1404231398";

    const AES128: EncryptionType = EncryptionType::AES128_CTS_HMAC_SHA1_96;
    const AES256: EncryptionType = EncryptionType::AES256_CTS_HMAC_SHA1_96;

    fn key(enctype: EncryptionType, hex_key: &str) -> Key {
        random_to_key(enctype, &hex::decode(hex_key).unwrap()).unwrap()
    }

    fn s2k_test_key(enctype: EncryptionType) -> Key {
        string_to_key(enctype, b"password", b"ATHENA.MIT.EDUraeburn", None).unwrap()
    }

    #[test]
    fn test_string_to_key_rfc3962() {
        let vectors: [(EncryptionType, u32, &str); 4] = [
            (AES128, 1, "42263c6e89f4fc28b8df68ee09799f15"),
            (AES128, 2, "c651bf29e2300ac27fa469d693bdda13"),
            (
                AES256,
                1,
                "fe697b52bc0d3ce14432ba036a92e65bbb52280990a2fa27883998d72af30161",
            ),
            (
                AES256,
                1200,
                "55a6ac740ad17b4846941051e1e8b0a7548d93b0ab30a8bc3ff16280382b8c2a",
            ),
        ];

        for (enctype, iter_count, expect) in vectors {
            let params = iter_count.to_be_bytes();
            let k = string_to_key(
                enctype,
                b"password",
                b"ATHENA.MIT.EDUraeburn",
                Some(&params),
            )
            .unwrap();
            assert_eq!(k.enctype(), enctype);
            assert_eq_hex!(k.as_bytes(), hex::decode(expect).unwrap().as_slice());
        }

        let k = string_to_key(
            AES256,
            &[b'X'; 64],
            b"pass phrase equals block size",
            Some(&1200u32.to_be_bytes()),
        )
        .unwrap();
        assert_eq_hex!(
            k.as_bytes(),
            hex::decode("89adee3608db8bc71f1bfbfe459486b05618b70cbae22092534e56c553ba4b34")
                .unwrap()
                .as_slice()
        );
    }

    #[test]
    fn test_string_to_key_default_iterations() {
        assert_eq_hex!(
            s2k_test_key(AES128).as_bytes(),
            hex::decode("fca822951813fb252154c883f5ee1cf4")
                .unwrap()
                .as_slice()
        );
        assert_eq_hex!(
            s2k_test_key(AES256).as_bytes(),
            hex::decode("01b897121d933ab44b47eb5494db15e50eb74530dbdae9b634d65020ff5d88c1")
                .unwrap()
                .as_slice()
        );
        // Explicitly passing the default gives the same key.
        let k = string_to_key(
            AES128,
            b"password",
            b"ATHENA.MIT.EDUraeburn",
            Some(&[0, 0, 0x10, 0]),
        )
        .unwrap();
        assert_eq!(k, s2k_test_key(AES128));
    }

    #[test]
    fn test_string_to_key_bad_params() {
        assert_eq!(
            string_to_key(AES256, b"password", b"salt", Some(&[0, 0x10, 0])),
            Err(KrbError::PreauthInvalidS2KParams)
        );
        assert_eq!(
            string_to_key(AES256, b"password", b"salt", Some(&[0, 0, 0, 0x10, 0])),
            Err(KrbError::PreauthInvalidS2KParams)
        );
        assert_eq!(
            string_to_key(AES256, b"password", b"salt", Some(&[0, 0, 0, 0])),
            Err(KrbError::PreauthInvalidS2KParams)
        );
    }

    #[test]
    fn test_random_to_key() {
        assert_eq!(
            random_to_key(AES128, &[0u8; 32]),
            Err(KrbError::WrongSeedLength)
        );
        assert_eq!(
            random_to_key(AES256, &[0u8; 16]),
            Err(KrbError::WrongSeedLength)
        );
        let k = random_to_key(AES256, &[7u8; 32]).unwrap();
        assert_eq!(k.enctype(), AES256);
        assert_eq!(k.as_bytes(), &[7u8; 32]);

        assert_eq!(
            Key::from_bytes(AES128, &[0u8; 15]),
            Err(KrbError::WrongKeyLength)
        );
    }

    #[test]
    fn test_key_debug_hides_material() {
        let k = key(AES128, KEY_AES128);
        let dbg = format!("{:?}", k);
        assert!(dbg.contains("Aes128"));
        assert!(!dbg.to_lowercase().contains("9062430c"));
    }

    #[test]
    fn test_derive_known_answer() {
        let k = key(AES128, KEY_AES128);
        let ke = derive(&k, &usage_constant(2, KEY_USAGE_KE)).unwrap();
        assert_eq_hex!(
            ke.as_bytes(),
            hex::decode("db7d4b346cd23a8bacf472170cbbc154")
                .unwrap()
                .as_slice()
        );
    }

    #[test]
    fn test_derive_checksum_key_aes256() {
        let base_key = key(
            AES256,
            "3C4EEFA91060DC4000582C17885AA63A58CD5A57C5CD3E7601A0587E7E05F9D0",
        );
        let kc = derive(&base_key, &usage_constant(6, KEY_USAGE_KC)).unwrap();
        assert_eq_hex!(
            kc.as_bytes(),
            hex::decode("14AD9322E8134937815FB995067F8C1859A8237C599E450F2BC1E99330C94232")
                .unwrap()
                .as_slice()
        );
    }

    #[test]
    fn test_derive_independence() {
        let k = key(AES256, KEY_AES256);
        let mut derived: Vec<Key> = Vec::new();

        for usage in 0..16 {
            for discriminator in [KEY_USAGE_KC, KEY_USAGE_KE, KEY_USAGE_KI] {
                derived.push(derive(&k, &usage_constant(usage, discriminator)).unwrap());
            }
        }
        derived.push(derive(&k, DK_CONSTANT_KERBEROS).unwrap());
        derived.push(derive(&k, DK_CONSTANT_PRF).unwrap());

        for (i, a) in derived.iter().enumerate() {
            assert_ne!(a, &k);
            for b in derived.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_encrypt_known_answer_aes128() {
        let k = key(AES128, KEY_AES128);
        let confounder = hex::decode("94B491F481485B9A0678CD3C4EA386AD").unwrap();
        let expect = hex::decode(
            "68fb9679601f45c78857b2bf820fd6e53eca8d42fd4b1d7024a09205abb7cd2ec26c355d2f",
        )
        .unwrap();

        let ciphertext = encrypt_with_confounder(&k, 2, b"9 bytesss", &confounder).unwrap();
        assert_eq_hex!(ciphertext, expect);
        assert_eq!(decrypt(&k, 2, &ciphertext).unwrap(), b"9 bytesss");
    }

    #[test]
    fn test_encrypt_known_answer_aes256() {
        let k = key(AES256, KEY_AES256);
        let confounder = hex::decode("E45CA518B42E266AD98E165E706FFB60").unwrap();
        let expect = hex::decode(
            "d1137a4d634cfece924dbc3bf6790648bd5cff7de0e7b99460211d0daef3d79a295c688858f3b34b9cbd6eebae81daf6b734d4d498b6714f1c1d",
        )
        .unwrap();

        let plaintext = b"30 bytes bytes bytes bytes byt";
        let ciphertext = encrypt_with_confounder(&k, 4, plaintext, &confounder).unwrap();
        assert_eq_hex!(ciphertext, expect);
        assert_eq!(decrypt(&k, 4, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_encrypt_known_answer_empty_and_block() {
        let k = key(AES128, KEY_AES128);
        let confounder = hex::decode("7E5895EAF2672435BAD817F545A37148").unwrap();
        let ciphertext = encrypt_with_confounder(&k, 0, b"", &confounder).unwrap();
        assert_eq_hex!(
            ciphertext,
            hex::decode("2160940a3b90cc6cf84522dd82b34d31c0a4d506feba3df27e704621").unwrap()
        );
        assert!(decrypt(&k, 0, &ciphertext).unwrap().is_empty());

        let k = key(AES256, KEY_AES256);
        let confounder: Vec<u8> = (0..16).collect();
        let ciphertext = encrypt_with_confounder(&k, 1, b"0123456789abcdef", &confounder).unwrap();
        assert_eq_hex!(
            ciphertext,
            hex::decode(
                "b5409940c65b6e7af403469d1494258a7b552ad8ec18bb9ae015addb6d7df00a1c29ebcf921a4ef846834d4d"
            )
            .unwrap()
        );
    }

    #[test]
    fn test_encrypt_bad_confounder() {
        let k = key(AES128, KEY_AES128);
        assert_eq!(
            encrypt_with_confounder(&k, 1, b"data", &[0u8; 15]),
            Err(KrbError::InvalidConfounderLength)
        );
    }

    #[test]
    fn test_encrypt_reflexive() {
        let _ = tracing_subscriber::fmt::try_init();

        for k in [key(AES128, KEY_AES128), key(AES256, KEY_AES256)] {
            for len in 1..=200usize {
                let plaintext: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
                let ciphertext = encrypt(&k, 3, &plaintext).unwrap();
                assert_eq!(ciphertext.len(), 16 + len + 12);
                let decrypted = decrypt(&k, 3, &ciphertext).unwrap();
                assert_eq_hex!(decrypted, plaintext);
            }
        }
    }

    #[test]
    fn test_encrypt_confounder_is_random() {
        let k = key(AES256, KEY_AES256);
        let a = encrypt(&k, 7, b"same plaintext twice").unwrap();
        let b = encrypt(&k, 7, b"same plaintext twice").unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt(&k, 7, &a).unwrap(), b"same plaintext twice");
        assert_eq!(decrypt(&k, 7, &b).unwrap(), b"same plaintext twice");
    }

    #[test]
    fn test_decrypt_tamper_detection() {
        let _ = tracing_subscriber::fmt::try_init();

        for k in [key(AES128, KEY_AES128), key(AES256, KEY_AES256)] {
            let ciphertext = encrypt(&k, 9, b"attack at dawn, bring snacks").unwrap();
            for bit in 0..(ciphertext.len() * 8) {
                let mut tampered = ciphertext.clone();
                tampered[bit / 8] ^= 1 << (bit % 8);
                assert_eq!(decrypt(&k, 9, &tampered), Err(KrbError::IntegrityFailure));
            }
        }
    }

    #[test]
    fn test_decrypt_wrong_usage_or_key() {
        let k = key(AES256, KEY_AES256);
        let ciphertext = encrypt(&k, 1, b"usage bound").unwrap();
        assert_eq!(decrypt(&k, 2, &ciphertext), Err(KrbError::IntegrityFailure));

        let other = key(AES256, &KEY_AES256.to_lowercase().replace('f', "e"));
        assert_eq!(
            decrypt(&other, 1, &ciphertext),
            Err(KrbError::IntegrityFailure)
        );
    }

    #[test]
    fn test_decrypt_too_short() {
        let k = key(AES128, KEY_AES128);
        assert_eq!(decrypt(&k, 1, &[]), Err(KrbError::CiphertextTooShort));
        assert_eq!(
            decrypt(&k, 1, &[0u8; 27]),
            Err(KrbError::CiphertextTooShort)
        );
        // One block plus a mac is structurally valid, so it fails integrity instead.
        assert_eq!(decrypt(&k, 1, &[0u8; 28]), Err(KrbError::IntegrityFailure));
    }

    #[test]
    fn test_checksum_known_answer() {
        let k = key(AES128, KEY_AES128);
        let text = b"eight nine ten eleven twelve thirteen";
        let cksum = make_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, text).unwrap();
        assert_eq_hex!(cksum, hex::decode("01a4b088d45628f6946614e3").unwrap());
        assert!(verify_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, text, &cksum).is_ok());

        let k = key(
            AES256,
            "B1AE4CD8462AFF1677053CC9279AAC30B796FB81CE21474DD3DDBCFEA4EC76D7",
        );
        let cksum = make_checksum(ChecksumType::HMAC_SHA1_96_AES256, &k, 4, b"fourteen").unwrap();
        assert_eq_hex!(cksum, hex::decode("e08739e3279e2903ec8e3836").unwrap());
    }

    #[test]
    fn test_checksum_pa_enc_timestamp() {
        let input = hex::decode("3067a00703050000810000a20d1b0b4558414d504c452e434f4da3253023a003020103a11c301a1b04686f73741b127065707065722e6578616d706c652e636f6da511180f32303234313031303230333832335aa7060204769220c1a80b3009020112020113020114").unwrap();
        let k = key(
            AES256,
            "3C4EEFA91060DC4000582C17885AA63A58CD5A57C5CD3E7601A0587E7E05F9D0",
        );
        let cksum = make_checksum(ChecksumType::HMAC_SHA1_96_AES256, &k, 6, &input).unwrap();
        assert_eq_hex!(cksum, hex::decode("351E56F9FA207CDCA62A0BDC").unwrap());
    }

    #[test]
    fn test_checksum_failures() {
        let _ = tracing_subscriber::fmt::try_init();

        let k = key(AES128, KEY_AES128);
        let cksum = make_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, b"text").unwrap();

        let mut bad = cksum.clone();
        bad[11] ^= 0x80;
        assert_eq!(
            verify_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, b"text", &bad),
            Err(KrbError::ChecksumFailure)
        );
        assert_eq!(
            verify_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, b"texT", &cksum),
            Err(KrbError::ChecksumFailure)
        );
        assert_eq!(
            verify_checksum(ChecksumType::HMAC_SHA1_96_AES128, &k, 3, b"text", &cksum[..11]),
            Err(KrbError::ChecksumFailure)
        );
        assert_eq!(
            make_checksum(ChecksumType::HMAC_SHA1_96_AES256, &k, 3, b"text"),
            Err(KrbError::ChecksumKeyMismatch)
        );
    }

    #[test]
    fn test_prf() {
        let k = key(AES128, KEY_AES128);
        assert_eq_hex!(
            prf(&k, b"test").unwrap(),
            hex::decode("d13593d3c947e6f213f8fb9bc2c44345").unwrap()
        );

        let k = s2k_test_key(AES256);
        assert_eq_hex!(
            prf(&k, b"test").unwrap(),
            hex::decode("b94ca699120ef0fa70f35b3048cfcb19").unwrap()
        );
    }

    #[test]
    fn test_prf_plus() {
        let k = s2k_test_key(AES256);
        assert_eq_hex!(
            prf_plus(&k, b"test", 40).unwrap(),
            hex::decode(
                "5cdb3bf4e09cc9bbef35a54c7719e12315e5e2c5e8027cb38a7dffc4e9b79cd51ecc299a2268e289"
            )
            .unwrap()
        );

        // Shorter outputs are prefixes of longer ones.
        let long = prf_plus(&k, b"test", 40).unwrap();
        assert_eq!(prf_plus(&k, b"test", 7).unwrap(), &long[..7]);
        assert!(prf_plus(&k, b"test", 0).unwrap().is_empty());

        assert_eq!(prf_plus(&k, b"test", 255 * 16).unwrap().len(), 255 * 16);
        assert_eq!(
            prf_plus(&k, b"test", 255 * 16 + 1),
            Err(KrbError::PrfOutputTooLong)
        );
    }
}
