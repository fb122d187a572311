pub mod data_key;
pub mod error;
pub mod secretbox;
pub mod types;

pub use data_key::{generate_nonce, nonce_from_slice, SymmetricKey};
pub use error::CryptoError;
pub use secretbox::{open, seal};
pub use types::{DataKeySpec, KEY_LENGTH, NONCE_LENGTH, TAG_LENGTH};
