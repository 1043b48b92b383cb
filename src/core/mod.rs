pub mod cdn;
pub mod manifest;
pub mod resources;
pub mod update_flow;
pub mod updater;

pub use crate::domain::model::{ApplyMode, CommitSha, ReleaseInfo, UpdateOutcome, UpdatePlan};
pub use crate::domain::ports::{ConfigProvider, Installer, Prompt, UpdateFlow};
pub use crate::utils::error::Result;
