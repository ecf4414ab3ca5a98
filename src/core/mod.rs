pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, EditorConfig};
pub use error::{ForgeError, Result};
pub use types::{AbilityId, CellKey, COLUMNS};
