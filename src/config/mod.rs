//! Configuration system
//!
//! Sections are declared with [`config_struct!`](crate::config_struct) in `schemas`,
//! loaded from TOML by the helpers in `utils`, and passed explicitly to the engine.

mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::{get_config_clone, load_config_from_path, with_config, CONFIG};
