//! Credential hashing and bearer-token encoding used by the auth gateway.

pub mod password;
pub mod token;
