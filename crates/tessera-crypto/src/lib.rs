pub mod error;
pub mod hashing;
pub mod jwk;
pub mod jws;
pub mod keys;
pub mod mnemonic;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{hash, hash_parts, Hash};
pub use jwk::Jwk;
pub use jws::{DecodedJws, JwsAlgorithm, JwsHeader};
pub use keys::{KeyPair, PublicKey, KEY_LENGTH};
pub use mnemonic::Mnemonic;
pub use signing::{Signature, SIGNATURE_LENGTH};
