//! Core domain logic for the sales-territory map: joining the store dataset
//! to the salesperson roster, deriving filter facets, applying salesperson
//! reassignments, and keeping the bounded edit history.
//!
//! Everything in this crate is synchronous; the only I/O is the roster and
//! history file helpers. Persistence of the dataset itself lives in
//! `salesmap-storage`.

pub mod app_config;
pub mod config;
pub mod editor;
pub mod error;
pub mod facets;
pub mod history;
pub mod identity;
pub mod join;
pub mod record;
pub mod roster;
pub mod workspace;

pub use app_config::{AppConfig, Environment, GithubConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use editor::{EditInput, EditOutcome};
pub use error::{ConfigError, CoreError};
pub use facets::{FacetOptions, FilterState};
pub use history::{EditHistoryLog, EditRecord, DEFAULT_HISTORY_CAP};
pub use identity::store_id;
pub use join::JoinStats;
pub use record::{JoinedRecord, SalespersonRecord, StoreRecord};
pub use roster::load_roster;
pub use workspace::Workspace;
