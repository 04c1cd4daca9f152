pub mod branch;
pub mod brew;
pub mod ci;
pub mod ci_config;
pub mod commit;
pub mod config;
pub mod error;
pub mod jenkins;
pub mod jjb;
pub mod jobs;
pub mod notifications;
pub mod paths;
pub mod process;

pub use error::{PciError, Result};
