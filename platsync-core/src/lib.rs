//! platsync core library: domain types, configuration, environment cache, errors.
//!
//! - [`types`]: newtypes and remote/local domain structs
//! - [`config`]: `~/.platsync/config.yaml` loading
//! - [`cache`]: the project environment-list cache service
//! - [`error`]: [`CoreError`]

pub mod cache;
pub mod config;
pub mod error;
pub mod types;

pub use cache::{EnvironmentCache, FileEnvironmentCache, MemoryEnvironmentCache};
pub use config::Config;
pub use error::CoreError;
pub use types::{
    Activity, ActivityId, ActivityState, BranchRequest, Environment, EnvironmentId,
    LocalProjectContext, Project, ProjectId,
};
