#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate log;

pub mod config;
pub mod dedup;
pub mod error;
pub mod groq;
pub mod handle;
pub mod models;
pub mod report;
pub mod risk;
pub mod scheduler;
pub mod schema;
pub mod slack;
pub mod store;
pub mod summary;
pub mod text;

pub use error::{Error, Result};
pub use models::{
    NewStandupEntry, NewTeam, Report, RiskFinding, RiskType, StandupEntry, StandupSubmission,
    Team, TeamSubmission, UpdateRecord,
};
