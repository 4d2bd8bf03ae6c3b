//! Data models for AssetDesk

pub mod asset;
pub mod enums;
pub mod import;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use asset::{Asset, AssetInput, AssetPatch, AssetQuery};
pub use enums::{AssetStatus, Condition, Role};
pub use import::{BatchFailure, EnrichmentResult, ImportCandidate, ImportReport};
pub use stats::InventoryStats;
pub use user::{capabilities, Actor, CapabilitySet, UpdateRole, User, UserClaims};
