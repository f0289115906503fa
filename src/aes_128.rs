use openssl::symm::{Cipher, Crypter, Mode};

use crate::{bytes_ext::BytesExt, Error, Result};

pub const BLOCK_SIZE: usize = 16;
pub const KEY_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 8;

pub type Block = [u8; BLOCK_SIZE];
pub type Key = [u8; KEY_SIZE];
pub type Nonce = [u8; NONCE_SIZE];

/// The number of keystream blocks a 16 bit counter can address.
const MAX_CTR_BLOCKS: usize = 1 << 16;

/// A raw AES-128 block transform, one direction only.
struct BlockCipher {
    crypter: Crypter,
}

impl BlockCipher {
    fn new(key: &Key, mode: Mode) -> Result<Self> {
        // always use ECB: chaining, counters and padding are all handled in this module
        let mut crypter = Crypter::new(Cipher::aes_128_ecb(), mode, key, None)?;
        crypter.pad(false);
        Ok(BlockCipher { crypter })
    }

    /// Transform exactly one block. With padding off, openssl emits every full block immediately
    /// in both directions.
    fn apply(&mut self, block: &[u8]) -> Result<Block> {
        debug_assert_eq!(block.len(), BLOCK_SIZE);

        // openssl wants room for an extra block in the output buffer
        let mut buf = [0; BLOCK_SIZE * 2];
        let count = self.crypter.update(block, &mut buf)?;
        debug_assert_eq!(count, BLOCK_SIZE);

        let mut out = [0; BLOCK_SIZE];
        out.copy_from_slice(&buf[..BLOCK_SIZE]);
        Ok(out)
    }
}

fn ensure_aligned(data: &[u8]) -> Result<()> {
    if data.len() % BLOCK_SIZE == 0 {
        Ok(())
    } else {
        Err(Error::Length {
            len: data.len(),
            block_size: BLOCK_SIZE,
        })
    }
}

pub fn encrypt_ecb(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>> {
    ensure_aligned(plaintext)?;
    let mut cipher = BlockCipher::new(key, Mode::Encrypt)?;
    let mut ciphertext = Vec::with_capacity(plaintext.len());

    for block in plaintext.chunks_exact(BLOCK_SIZE) {
        ciphertext.extend_from_slice(&cipher.apply(block)?);
    }

    Ok(ciphertext)
}

pub fn decrypt_ecb(key: &Key, ciphertext: &[u8]) -> Result<Vec<u8>> {
    ensure_aligned(ciphertext)?;
    let mut cipher = BlockCipher::new(key, Mode::Decrypt)?;
    let mut plaintext = Vec::with_capacity(ciphertext.len());

    for block in ciphertext.chunks_exact(BLOCK_SIZE) {
        plaintext.extend_from_slice(&cipher.apply(block)?);
    }

    Ok(plaintext)
}

pub fn encrypt_cbc(key: &Key, iv: &Block, plaintext: &[u8]) -> Result<Vec<u8>> {
    ensure_aligned(plaintext)?;
    let mut cipher = BlockCipher::new(key, Mode::Encrypt)?;
    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut last_ciphertext_block = *iv;

    for block in plaintext.chunks_exact(BLOCK_SIZE) {
        let mut chained = last_ciphertext_block;
        chained.xor_in_place(block);
        last_ciphertext_block = cipher.apply(&chained)?;
        ciphertext.extend_from_slice(&last_ciphertext_block);
    }

    Ok(ciphertext)
}

/// Decrypt CBC without touching the padding, so callers (and oracles) decide what to do with it.
pub fn decrypt_cbc(key: &Key, iv: &Block, ciphertext: &[u8]) -> Result<Vec<u8>> {
    ensure_aligned(ciphertext)?;
    let mut cipher = BlockCipher::new(key, Mode::Decrypt)?;
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev: &[u8] = iv;

    for block in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut decrypted = cipher.apply(block)?;
        decrypted.xor_in_place(prev);
        plaintext.extend_from_slice(&decrypted);
        prev = block;
    }

    Ok(plaintext)
}

fn keystream_block(cipher: &mut BlockCipher, nonce: &Nonce, counter: u16) -> Result<Block> {
    // nonce, then the counter as 16 bit little endian, then zeroes
    let mut input = [0; BLOCK_SIZE];
    input[..NONCE_SIZE].copy_from_slice(nonce);
    input[NONCE_SIZE..NONCE_SIZE + 2].copy_from_slice(&counter.to_le_bytes());
    cipher.apply(&input)
}

/// The keystream block for `counter`: `AES(key, nonce || le16(counter) || 0^6)`.
pub fn ctr_keystream_block(nonce: &Nonce, key: &Key, counter: u16) -> Result<Block> {
    let mut cipher = BlockCipher::new(key, Mode::Encrypt)?;
    keystream_block(&mut cipher, nonce, counter)
}

/// Encrypt or decrypt `data` in CTR mode. Any length is accepted, up to what a 16 bit block
/// counter can cover; the counter is never wrapped.
pub fn ctr_transform(nonce: &Nonce, key: &Key, data: &[u8]) -> Result<Vec<u8>> {
    if data.len().div_ceil(BLOCK_SIZE) > MAX_CTR_BLOCKS {
        return Err(Error::CounterOverflow { len: data.len() });
    }

    let mut cipher = BlockCipher::new(key, Mode::Encrypt)?;
    let mut output = data.to_vec();

    for (i, chunk) in output.chunks_mut(BLOCK_SIZE).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let counter = i as u16;
        chunk.xor_in_place(keystream_block(&mut cipher, nonce, counter)?);
    }

    Ok(output)
}

/// Rewrite the plaintext under `ciphertext[offset..offset + plaintext.len()]`, generating only the
/// keystream blocks that cover the edited range.
pub fn ctr_edit(
    nonce: &Nonce,
    key: &Key,
    ciphertext: &[u8],
    offset: usize,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let end = offset
        .checked_add(plaintext.len())
        .filter(|&end| end <= ciphertext.len())
        .ok_or(Error::EditOutOfRange {
            offset,
            len: plaintext.len(),
            ciphertext_len: ciphertext.len(),
        })?;

    let mut edited = ciphertext.to_vec();
    if plaintext.is_empty() {
        return Ok(edited);
    }

    let first_block = offset / BLOCK_SIZE;
    let last_block = (end - 1) / BLOCK_SIZE;
    if last_block >= MAX_CTR_BLOCKS {
        return Err(Error::CounterOverflow { len: end });
    }

    let mut cipher = BlockCipher::new(key, Mode::Encrypt)?;
    let mut keystream = Vec::with_capacity((last_block - first_block + 1) * BLOCK_SIZE);
    for i in first_block..=last_block {
        #[allow(clippy::cast_possible_truncation)]
        let counter = i as u16;
        keystream.extend_from_slice(&keystream_block(&mut cipher, nonce, counter)?);
    }

    let skip = offset - first_block * BLOCK_SIZE;
    let target = &mut edited[offset..end];
    target.copy_from_slice(plaintext);
    target.xor_in_place(&keystream[skip..]);

    Ok(edited)
}

/// A random block, suitable as a key or an IV.
pub fn random_block() -> Block {
    rand::random()
}
