//! Command implementations.

pub mod analyze;
pub mod config;
pub mod inspect;
pub mod laws;

pub use self::analyze::execute_analyze;
pub use self::config::execute_config;
pub use self::inspect::{execute_detect, execute_sections};
pub use self::laws::execute_laws;
