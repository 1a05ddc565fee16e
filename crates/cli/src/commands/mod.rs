//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_scanner;
pub use validate::run_validate;
