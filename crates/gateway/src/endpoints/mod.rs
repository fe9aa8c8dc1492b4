//! # Gatewayエンドポイント

pub mod signature;
pub mod sdk_info;

pub use signature::handle_signature;
pub use sdk_info::{handle_health, handle_sdk_info};
