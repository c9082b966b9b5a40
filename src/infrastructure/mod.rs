//! Infrastructure implementations

pub mod persistence;
pub mod telephony;
