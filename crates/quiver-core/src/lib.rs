//! Domain engine for quiver: routine composition, assignment scheduling,
//! retention sweeps, and the authentication primitives used by the HTTP API.

pub mod auth;
pub mod composer;
pub mod error;
pub mod retention;
pub mod schedule;

pub use error::CoreError;
