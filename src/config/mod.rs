pub mod schema;

pub use schema::{
    AutomationConfig, CodeHostConfig, Config, OccupationConfig, SnapshotConfig, VacancyConfig,
};
