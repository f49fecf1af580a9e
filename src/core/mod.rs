//! Shared error and configuration types.

pub mod errors;
pub mod settings;

pub use errors::BrushError;
pub use settings::StoreSettings;
