//! A stream cipher keyed by an MT19937 seed, and the attacks its tiny key space invites.

use log::debug;
use rand::RngCore;

use super::Mt19937;
use crate::{bytes_ext::BytesExt, Error, Result};

fn keystream(seed: u32, len: usize) -> Vec<u8> {
    let mut keystream = vec![0; len];
    Mt19937::new(seed).fill_bytes(&mut keystream);
    keystream
}

/// XOR `data` with the generator's outputs, four little endian bytes per output. Applying it twice
/// with the same seed gives back `data`.
pub fn transform(seed: u32, data: &[u8]) -> Vec<u8> {
    data.xor(keystream(seed, data.len()))
}

/// Find the 16 bit seed that encrypted `ciphertext`, given the plaintext bytes at its end.
pub fn recover_seed(ciphertext: &[u8], known_suffix: &[u8]) -> Result<u16> {
    if known_suffix.is_empty() || known_suffix.len() > ciphertext.len() {
        return Err(Error::SeedNotFound);
    }

    let offset = ciphertext.len() - known_suffix.len();
    let expected = ciphertext[offset..].xor(known_suffix);

    let seed = (0..=u16::MAX)
        .find(|&seed| keystream(seed.into(), ciphertext.len())[offset..] == expected[..])
        .ok_or(Error::SeedNotFound)?;

    debug!("recovered stream seed {seed:#06x}");
    Ok(seed)
}

/// The first seed among `candidates` whose generator starts with `first_output`. Seeding from a
/// clock makes the candidates a short window of timestamps.
pub fn recover_seed_in<I>(first_output: u32, candidates: I) -> Option<u32>
where
    I: IntoIterator<Item = u32>,
{
    candidates
        .into_iter()
        .find(|&seed| Mt19937::new(seed).extract() == first_output)
}

/// Whether `token` is `plaintext` encrypted with [`transform`] under any of `candidates`.
pub fn is_token_for_seed_in<I>(token: &[u8], plaintext: &[u8], candidates: I) -> bool
where
    I: IntoIterator<Item = u32>,
{
    token.len() == plaintext.len()
        && candidates
            .into_iter()
            .any(|seed| transform(seed, token) == plaintext)
}
