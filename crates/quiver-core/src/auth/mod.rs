//! Authentication building blocks: bcrypt password hashing for stored user
//! accounts and HMAC-signed session tokens handed out by the login endpoint.

pub mod password;
pub mod token;
