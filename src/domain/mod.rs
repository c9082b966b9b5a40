//! Domain layer - entities, value logic and ports

pub mod call_record;
pub mod campaign;
pub mod entitlement;
pub mod phone;
pub mod shared;
pub mod telephony;
