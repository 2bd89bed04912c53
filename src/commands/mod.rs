//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Run the full image build pipeline
//! - `run` - Hand the process over to the boot script
//! - `clean` - Remove built artifacts
//! - `show` - Display information
//! - `preflight` - Run preflight checks

pub mod build;
pub mod clean;
mod preflight;
mod run;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use preflight::cmd_preflight;
pub use run::cmd_run;
pub use show::cmd_show;
