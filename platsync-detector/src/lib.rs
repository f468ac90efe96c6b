//! Local project detection for `platsync-detector`.
//!
//! - [`layout`] decides whether a site root was ever materialized and which
//!   on-disk convention (legacy or modern) it follows.
//! - [`apps`] discovers applications and selects those that take part in a
//!   deployment.
//! - [`profile`] extracts the install-profile dependency from a build
//!   manifest parsed by [`make`].

pub mod apps;
pub mod error;
pub mod layout;
pub mod make;
pub mod profile;

pub use apps::{discover_applications, filter_applications, AppConfig, Application, DRUPAL_FLAVOR};
pub use error::DetectError;
pub use layout::{
    candidate_root, ensure_working_dirs, find_project_root, is_first_run, resolve, Layout,
    Resolution,
};
pub use profile::{DownloadType, ProfileReference};
