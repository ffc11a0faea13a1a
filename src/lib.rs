// Shop Track - Library Entry Point
// Vehicle & parts intake tracking core for repair shops.

pub mod auth;
pub mod blob;
pub mod commands;
pub mod constants;
pub mod error;
pub mod form;
pub mod list;
pub mod model;
pub mod repo;
pub mod store;
pub mod upload;

pub use commands::AppState;
pub use error::{Result, ShopTrackError};
pub use model::{ImageRef, PartRecord, VehicleRecord};
