use crate::pkcs7::PaddingError;

#[derive(thiserror::Error)]
pub enum Error {
    // dependency errors
    #[error("openssl: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    // crate errors
    #[error("input of {len} bytes is not a multiple of the {block_size} byte block size")]
    Length { len: usize, block_size: usize },

    #[error("invalid padding: {0}")]
    Padding(#[from] PaddingError),

    #[error("no byte value satisfies the oracle for block {block} at padding length {padding}")]
    OracleExhausted { block: usize, padding: u8 },

    #[error("{len} bytes needs more keystream blocks than a 16 bit counter can address")]
    CounterOverflow { len: usize },

    #[error("edit of {len} bytes at offset {offset} does not fit in {ciphertext_len} bytes")]
    EditOutOfRange {
        offset: usize,
        len: usize,
        ciphertext_len: usize,
    },

    #[error("generator index {0} is past the end of the state")]
    StateIndex(usize),

    #[error("no seed reproduces the known plaintext")]
    SeedNotFound,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
