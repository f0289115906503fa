//! Recovering CBC plaintext from an oracle that only says whether the padding was valid.
//!
//! For every ciphertext block `C` we recover `D(C)`, its raw block decryption, one byte at a time
//! from the end. XOR-ing `D(C)` with the real preceding block gives the plaintext. To learn
//! `D(C)[16 - p]` we forge an IV whose tail makes the bytes after that position decrypt to `p`,
//! then try every value at the position until the oracle accepts. The accepted value `g` satisfies
//! `D(C)[16 - p] ^ g == p`.

use log::{debug, trace, warn};

use crate::{
    aes_128::{self, Block, Key, BLOCK_SIZE},
    bytes_ext::BytesExt,
    pkcs7, Error, Result,
};

const LAST: usize = BLOCK_SIZE - 1;
#[allow(clippy::cast_possible_truncation)]
const MAX_PADDING: u8 = BLOCK_SIZE as u8;

/// Answers one question about a forged `(iv, ciphertext)` pair: does it CBC-decrypt to plaintext
/// with valid PKCS#7 padding? It must not reveal anything else.
pub trait PaddingOracle {
    fn check(&self, iv: &Block, ciphertext: &Block) -> bool;
}

impl<F> PaddingOracle for F
where
    F: Fn(&Block, &Block) -> bool,
{
    fn check(&self, iv: &Block, ciphertext: &Block) -> bool {
        self(iv, ciphertext)
    }
}

/// A server-side oracle holding a secret AES-128 key.
pub struct CbcPaddingOracle {
    key: Key,
}

impl CbcPaddingOracle {
    pub fn new(key: Key) -> Self {
        CbcPaddingOracle { key }
    }

    pub fn new_random() -> Self {
        Self::new(aes_128::random_block())
    }

    /// Pad and encrypt `plaintext` under a fresh random IV, returning `(iv, ciphertext)`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(Block, Vec<u8>)> {
        let iv = aes_128::random_block();
        let ciphertext = aes_128::encrypt_cbc(&self.key, &iv, &pkcs7::pad(plaintext))?;
        Ok((iv, ciphertext))
    }
}

impl PaddingOracle for CbcPaddingOracle {
    fn check(&self, iv: &Block, ciphertext: &Block) -> bool {
        match aes_128::decrypt_cbc(&self.key, iv, ciphertext) {
            Ok(plaintext) => pkcs7::is_valid(&plaintext),
            Err(err) => {
                warn!("padding oracle failed to decrypt: {err}");
                false
            }
        }
    }
}

/// Recover the plaintext of `ciphertext` (encrypted under `iv`) using only `oracle`'s verdicts.
///
/// Blocks are decoded strictly in order and any block that cannot be decoded aborts the whole
/// recovery. The final padding strip failing means an earlier byte was decoded wrongly or the
/// oracle answered inconsistently, and is reported as [`Error::Padding`].
pub fn recover_plaintext<O>(oracle: &O, iv: &Block, ciphertext: &[u8]) -> Result<Vec<u8>>
where
    O: PaddingOracle + ?Sized,
{
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::Length {
            len: ciphertext.len(),
            block_size: BLOCK_SIZE,
        });
    }

    let block_count = ciphertext.len() / BLOCK_SIZE;
    let mut recovered = Vec::with_capacity(ciphertext.len());
    let mut prev = *iv;

    for (index, chunk) in ciphertext.chunks_exact(BLOCK_SIZE).enumerate() {
        let mut target = [0; BLOCK_SIZE];
        target.copy_from_slice(chunk);

        let intermediate = BlockAttack::new(oracle, &prev, &target)
            .run()
            .map_err(|padding| Error::OracleExhausted {
                block: index,
                padding,
            })?;
        recovered.extend_from_slice(&intermediate.xor(prev));
        debug!("recovered block {} of {block_count}", index + 1);

        prev = target;
    }

    let plaintext = pkcs7::strip(&recovered)?;
    Ok(plaintext.to_vec())
}

/// The state of decoding a single ciphertext block.
struct BlockAttack<'a, O: ?Sized> {
    oracle: &'a O,
    prev: &'a Block,
    target: &'a Block,
    /// The IV handed to the oracle.
    forged: Block,
    /// `D(target)`; only positions already solved are meaningful.
    intermediate: Block,
}

impl<'a, O: PaddingOracle + ?Sized> BlockAttack<'a, O> {
    fn new(oracle: &'a O, prev: &'a Block, target: &'a Block) -> Self {
        BlockAttack {
            oracle,
            prev,
            target,
            forged: *prev,
            intermediate: [0; BLOCK_SIZE],
        }
    }

    /// Returns `D(target)`, or the padding length at which no byte value satisfied the oracle.
    fn run(mut self) -> std::result::Result<Block, u8> {
        // solving the last byte also solves padding length 2
        self.solve_last_byte().ok_or(1u8)?;

        for padding in 3..=MAX_PADDING {
            self.solve(padding).ok_or(padding)?;
        }

        Ok(self.intermediate)
    }

    /// The first value in `start..=255` at `pos` that the oracle accepts. `forged[pos]` is left
    /// holding the last value tried.
    fn scan(&mut self, pos: usize, start: u8) -> Option<u8> {
        let oracle = self.oracle;
        let target = self.target;
        let forged = &mut self.forged;

        (start..=u8::MAX).find(|&guess| {
            forged[pos] = guess;
            oracle.check(forged, target)
        })
    }

    /// Solve the byte at `16 - padding`, assuming every byte after it is already solved.
    fn solve(&mut self, padding: u8) -> Option<u8> {
        let pos = BLOCK_SIZE - usize::from(padding);
        for i in pos + 1..BLOCK_SIZE {
            self.forged[i] = self.intermediate[i] ^ padding;
        }

        let guess = self.scan(pos, 0)?;
        self.intermediate[pos] = guess ^ padding;
        Some(guess)
    }

    /// At padding length 1 a value can be accepted because the plaintext happens to end in
    /// `02 02` (or `03 03 03`, ...) rather than `01`. Each accepted value is taken speculatively
    /// and kept only if padding length 2 then resolves; otherwise the next accepted value is
    /// tried.
    ///
    /// This is a heuristic and fragile: a wrong guess of the last byte makes it decrypt to `01`
    /// during the length 2 step, so every value passes there. A resolution therefore only counts
    /// when it is unique.
    fn solve_last_byte(&mut self) -> Option<()> {
        let mut start = 0;

        loop {
            self.forged = *self.prev;
            let guess = self.scan(LAST, start)?;
            self.intermediate[LAST] = guess ^ 1;

            if self.resolves_padding_2() {
                return Some(());
            }

            trace!("last byte candidate {guess:#04x} rejected, trying the next one");
            start = guess.checked_add(1)?;
        }
    }

    fn resolves_padding_2(&mut self) -> bool {
        let Some(guess) = self.solve(2) else {
            return false;
        };

        self.forged[LAST - 1] = guess ^ 1;
        !self.oracle.check(&self.forged, self.target)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn assert_recovers(oracle: &CbcPaddingOracle, plaintext: &[u8]) {
        let (iv, ciphertext) = oracle.encrypt(plaintext).unwrap();
        let recovered = recover_plaintext(oracle, &iv, &ciphertext).unwrap();

        assert_eq!(
            recovered,
            plaintext,
            r#"plaintext: "{}""#,
            plaintext.escape_ascii()
        );
    }

    #[test]
    fn test_recovers_every_length() {
        let oracle = CbcPaddingOracle::new_random();
        let data = crate::gen_random_bytes(48);

        for len in 0..=data.len() {
            assert_recovers(&oracle, &data[..len]);
        }
    }

    // this test depends on randomness: each round picks a new key, IV and plaintext
    #[test]
    fn test_recovers_random_plaintexts() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let oracle = CbcPaddingOracle::new_random();
            let plaintext = crate::gen_random_bytes(rng.gen_range(0..80));
            assert_recovers(&oracle, &plaintext);
        }
    }

    // `02 02` and `.. 02 01` tails make two values pass at padding length 1; which one is seen
    // first depends on the IV, so run enough rounds to hit both orders.
    #[test]
    fn test_padding_length_1_ambiguity() {
        for _ in 0..64 {
            let oracle = CbcPaddingOracle::new_random();
            assert_recovers(&oracle, b"fourteen bytes");
            assert_recovers(&oracle, b"ends with two\x02\x02");
            assert_recovers(&oracle, b"fifteen bytes\x03\x02");
        }
    }

    #[test]
    fn test_closure_oracle() {
        let key = aes_128::random_block();
        let iv = aes_128::random_block();
        let plaintext = b"Cooking MC's like a pound of bacon";
        let ciphertext = aes_128::encrypt_cbc(&key, &iv, &pkcs7::pad(plaintext)).unwrap();

        let calls = Cell::new(0);
        let oracle = |iv: &Block, block: &Block| {
            calls.set(calls.get() + 1);
            let decrypted = aes_128::decrypt_cbc(&key, iv, block).unwrap();
            pkcs7::is_valid(&decrypted)
        };

        let recovered = recover_plaintext(&oracle, &iv, &ciphertext).unwrap();
        assert_eq!(recovered, plaintext);
        // three blocks, at most 256 tries per byte plus the rejected speculations
        assert!(calls.get() <= 3 * 18 * 256);
    }

    #[test]
    fn test_never_valid_oracle_is_exhausted() {
        let oracle = |_: &Block, _: &Block| false;
        let result = recover_plaintext(&oracle, &[0; BLOCK_SIZE], &[0; 32]);

        assert!(matches!(
            result,
            Err(Error::OracleExhausted {
                block: 0,
                padding: 1
            })
        ));
    }

    #[test]
    fn test_always_valid_oracle_is_exhausted() {
        let oracle = |_: &Block, _: &Block| true;
        let result = recover_plaintext(&oracle, &[0; BLOCK_SIZE], &[0; 16]);

        assert!(matches!(
            result,
            Err(Error::OracleExhausted {
                block: 0,
                padding: 1
            })
        ));
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let oracle = CbcPaddingOracle::new_random();

        assert!(matches!(
            recover_plaintext(&oracle, &[0; BLOCK_SIZE], &[0; 20]),
            Err(Error::Length { len: 20, .. })
        ));
        assert!(matches!(
            recover_plaintext(&oracle, &[0; BLOCK_SIZE], &[]),
            Err(Error::Padding(pkcs7::PaddingError::Empty))
        ));
    }

    #[test]
    fn test_oracle_only_sees_single_blocks() {
        let oracle = CbcPaddingOracle::new_random();
        let (iv, ciphertext) = oracle.encrypt(b"YELLOW SUBMARINE").unwrap();

        let mut first = [0; BLOCK_SIZE];
        first.copy_from_slice(&ciphertext[..BLOCK_SIZE]);
        let mut second = [0; BLOCK_SIZE];
        second.copy_from_slice(&ciphertext[BLOCK_SIZE..]);

        // the first block is all message, the second all padding
        assert!(!oracle.check(&iv, &first));
        assert!(oracle.check(&first, &second));
    }
}
