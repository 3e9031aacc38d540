//! Service layer for user records kept in a key-value store.
//! - `storage` holds the store contract and its Redis / in-memory backends.
//! - `user_record` validates request payloads and maps them to hash fields.
//! - `user_service` ties the two together behind `create` / `get`.

pub mod errors;
pub mod storage;
pub mod user_record;
pub mod user_service;
