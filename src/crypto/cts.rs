//! AES in CBC mode with ciphertext stealing (CS3) and a zero IV. This is the
//! "basic" cipher of RFC3962: no confounder, no integrity, no length expansion.

use crate::constants::{AES_BLOCK_SIZE, IV_ZERO};
use crate::error::KrbError;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::typenum::U16;
use aes::cipher::{
    Block, BlockCipher, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut,
    BlockSizeUser, KeyInit, KeyIvInit,
};
use tracing::error;

pub(crate) fn encrypt<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KrbError>
where
    C: BlockCipher + BlockEncrypt + KeyInit + BlockSizeUser<BlockSize = U16>,
{
    if plaintext.len() < AES_BLOCK_SIZE {
        error!(len = plaintext.len(), "cts plaintext is shorter than one block");
        return Err(KrbError::PlaintextTooShort);
    }

    let padded_len = plaintext.len().div_ceil(AES_BLOCK_SIZE) * AES_BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..plaintext.len()].copy_from_slice(plaintext);

    let mut cipher = cbc::Encryptor::<C>::new_from_slices(key, &IV_ZERO)
        .map_err(|_| KrbError::WrongKeyLength)?;

    for block in buf.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }

    // A single block is plain CBC. Otherwise the last two blocks swap places
    // and the (now final) Cn-1 is cut to the length of the partial Pn.
    if plaintext.len() > AES_BLOCK_SIZE {
        let (head, c_n) = buf.split_at_mut(padded_len - AES_BLOCK_SIZE);
        let c_n1 = &mut head[padded_len - 2 * AES_BLOCK_SIZE..];
        c_n1.swap_with_slice(c_n);
        buf.truncate(plaintext.len());
    }

    Ok(buf)
}

pub(crate) fn decrypt<C>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, KrbError>
where
    C: BlockCipher + BlockDecrypt + KeyInit + BlockSizeUser<BlockSize = U16>,
{
    let ctxt_len = ciphertext.len();

    if ctxt_len < AES_BLOCK_SIZE {
        error!(len = ctxt_len, "cts ciphertext is shorter than one block");
        return Err(KrbError::CiphertextTooShort);
    }

    let raw_cipher = C::new_from_slice(key).map_err(|_| KrbError::WrongKeyLength)?;

    if ctxt_len == AES_BLOCK_SIZE {
        let mut plaintext = ciphertext.to_vec();
        raw_cipher.decrypt_block(GenericArray::from_mut_slice(&mut plaintext));
        return Ok(plaintext);
    }

    // Ciphertext is laid out as C1 || ... || Cn-2 || Cn || Cn-1*, where Cn-1*
    // is the leading d bytes of Cn-1 and 0 < d <= block size.
    let tail_start = (ctxt_len.div_ceil(AES_BLOCK_SIZE) - 2) * AES_BLOCK_SIZE;
    let (head, tail) = ciphertext.split_at(tail_start);
    let (c_n, c_n1_star) = tail.split_at(AES_BLOCK_SIZE);

    let mut plaintext = vec![0u8; ctxt_len];
    let (p_head, p_tail) = plaintext.split_at_mut(tail_start);
    let (p_n1, p_n) = p_tail.split_at_mut(AES_BLOCK_SIZE);

    // Up to Cn-2 this is ordinary CBC.
    let mut cipher = cbc::Decryptor::<C>::new_from_slices(key, &IV_ZERO)
        .map_err(|_| KrbError::WrongKeyLength)?;

    for (cipher_chunk, plain_chunk) in head
        .chunks_exact(AES_BLOCK_SIZE)
        .zip(p_head.chunks_exact_mut(AES_BLOCK_SIZE))
    {
        cipher.decrypt_block_b2b_mut(
            GenericArray::from_slice(cipher_chunk),
            GenericArray::from_mut_slice(plain_chunk),
        );
    }

    // Cn was encrypted over Pn (zero padded) xor Cn-1. Decrypting it with the raw
    // cipher yields Z, where Z* xor Cn-1* is Pn and Z** is the stolen tail of Cn-1.
    let mut z: Block<C> = GenericArray::clone_from_slice(c_n);
    raw_cipher.decrypt_block(&mut z);

    let d = c_n1_star.len();
    let (z_star, z_star_2) = z.split_at(d);

    for (p, (c, zb)) in p_n.iter_mut().zip(c_n1_star.iter().zip(z_star)) {
        *p = c ^ zb;
    }

    let mut c_n1: Block<C> = Default::default();
    c_n1[..d].copy_from_slice(c_n1_star);
    c_n1[d..].copy_from_slice(z_star_2);

    // The cbc decryptor still holds Cn-2 as its chaining value.
    cipher.decrypt_block_b2b_mut(&c_n1, GenericArray::from_mut_slice(p_n1));

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::{decrypt, encrypt};
    use crate::error::KrbError;
    use aes::{Aes128, Aes256};
    use assert_hex::assert_eq_hex;

    const RFC3962_KEY: &str = "636869636b656e207465726979616b69";
    const RFC3962_PLAINTEXT: &[u8] =
        b"I would like the General Gau's Chicken, please, and wonton soup.";

    fn rfc3962_vector(len: usize, expect: &str) {
        let key = hex::decode(RFC3962_KEY).unwrap();
        let expect = hex::decode(expect).unwrap();
        let plaintext = &RFC3962_PLAINTEXT[..len];

        let ciphertext = encrypt::<Aes128>(&key, plaintext).unwrap();
        assert_eq_hex!(ciphertext, expect);

        let decrypted = decrypt::<Aes128>(&key, &ciphertext).unwrap();
        assert_eq_hex!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_cts_rfc3962_partial_block() {
        rfc3962_vector(17, "c6353568f2bf8cb4d8a580362da7ff7f97");
        rfc3962_vector(
            31,
            "fc00783e0efdb2c1d445d4c8eff7ed2297687268d6ecccc0c07b25e25ecfe5",
        );
        rfc3962_vector(
            47,
            "97687268d6ecccc0c07b25e25ecfe584b3fffd940c16a18c1b5549d2f838029e39312523a78662d5be7fcbcc98ebf5",
        );
    }

    #[test]
    fn test_cts_rfc3962_block_aligned() {
        rfc3962_vector(
            32,
            "39312523a78662d5be7fcbcc98ebf5a897687268d6ecccc0c07b25e25ecfe584",
        );
        rfc3962_vector(
            48,
            "97687268d6ecccc0c07b25e25ecfe5849dad8bbb96c4cdc03bc103e1a194bbd839312523a78662d5be7fcbcc98ebf5a8",
        );
        rfc3962_vector(
            64,
            "97687268d6ecccc0c07b25e25ecfe58439312523a78662d5be7fcbcc98ebf5a84807efe836ee89a526730dbc2f7bc8409dad8bbb96c4cdc03bc103e1a194bbd8",
        );
    }

    #[test]
    fn test_cts_single_block_is_ecb() {
        let key = hex::decode(RFC3962_KEY).unwrap();
        let plaintext = &RFC3962_PLAINTEXT[..16];

        let ciphertext = encrypt::<Aes128>(&key, plaintext).unwrap();
        assert_eq!(ciphertext.len(), 16);
        // The first block of the 32 byte vector, before the swap, is the same
        // ECB output.
        assert_eq_hex!(
            ciphertext,
            hex::decode("97687268d6ecccc0c07b25e25ecfe584").unwrap()
        );
        assert_eq_hex!(
            decrypt::<Aes128>(&key, &ciphertext).unwrap().as_slice(),
            plaintext
        );
    }

    #[test]
    fn test_cts_reflexive_aes256() {
        let key = [0x5au8; 32];
        let data: Vec<u8> = (0..=255u8).collect();

        for len in 16..=data.len() {
            let plaintext = &data[..len];
            let ciphertext = encrypt::<Aes256>(&key, plaintext).unwrap();
            assert_eq!(ciphertext.len(), len);
            let decrypted = decrypt::<Aes256>(&key, &ciphertext).unwrap();
            assert_eq_hex!(decrypted.as_slice(), plaintext);
        }
    }

    #[test]
    fn test_cts_short_input() {
        let key = hex::decode(RFC3962_KEY).unwrap();
        assert_eq!(
            encrypt::<Aes128>(&key, &[0u8; 15]),
            Err(KrbError::PlaintextTooShort)
        );
        assert_eq!(
            decrypt::<Aes128>(&key, &[0u8; 15]),
            Err(KrbError::CiphertextTooShort)
        );
        assert_eq!(
            encrypt::<Aes256>(&key, &[0u8; 32]),
            Err(KrbError::WrongKeyLength)
        );
    }
}
