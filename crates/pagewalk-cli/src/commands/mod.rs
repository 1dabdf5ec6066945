//! Command implementations.
//!
//! - [`run`] - scrape the configured URLs
//! - [`check`] - validate configuration without launching a browser

pub mod check;
pub mod run;

pub use check::execute as check_execute;
pub use run::execute as run_execute;
