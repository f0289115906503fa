//! Block cipher modes and a Mersenne Twister, and the classic attacks that break them: CBC padding
//! oracle plaintext recovery and MT19937 state cloning.
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod aes_128;
mod bytes_ext;
mod error;
pub mod mt19937;
pub mod padding_oracle;
pub mod pkcs7;

pub use error::{Error, Result};

pub fn gen_random_bytes(len: usize) -> Vec<u8> {
    use rand::Rng;
    (0..len).map(|_| rand::thread_rng().gen()).collect()
}
