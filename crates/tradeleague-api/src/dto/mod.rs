//! Data Transfer Objects
//!
//! Request and response structures for the API.

pub mod account;
pub mod common;
pub mod jobs;
pub mod league;
pub mod season;
pub mod trade;
pub mod xp;

pub use account::*;
pub use common::*;
pub use jobs::*;
pub use league::*;
pub use season::*;
pub use trade::*;
pub use xp::*;
