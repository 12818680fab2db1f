//! Bearer-token verification.

pub mod jwt;
