use crate::schema::standups;
use crate::schema::teams;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = teams)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub lead_name: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct TeamSubmission {
    pub name: String,
    pub lead_name: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub name: String,
    pub lead_name: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewTeam {
    pub fn new(submission: TeamSubmission) -> NewTeam {
        NewTeam {
            name: submission.name,
            lead_name: submission.lead_name,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// One user's stand-up for one day. Entries are never updated; a second
/// submission on the same day simply supersedes the first.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = standups)]
pub struct StandupEntry {
    pub id: i32,
    pub team_id: i32,
    pub user_name: String,
    pub yesterday: String,
    pub today: String,
    pub blockers: Option<String>,
    pub created_at: NaiveDateTime,
}

impl StandupEntry {
    /// Calendar day (UTC) the entry belongs to.
    pub fn day(&self) -> NaiveDate {
        self.created_at.date()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandupSubmission {
    pub team_id: i32,
    pub user_name: String,
    pub yesterday: String,
    pub today: String,
    pub blockers: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = standups)]
pub struct NewStandupEntry {
    pub team_id: i32,
    pub user_name: String,
    pub yesterday: String,
    pub today: String,
    pub blockers: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewStandupEntry {
    pub fn new(submission: StandupSubmission) -> NewStandupEntry {
        NewStandupEntry::at(submission, Utc::now().naive_utc())
    }

    pub fn at(submission: StandupSubmission, created_at: NaiveDateTime) -> NewStandupEntry {
        NewStandupEntry {
            team_id: submission.team_id,
            user_name: submission.user_name,
            yesterday: submission.yesterday,
            today: submission.today,
            blockers: submission.blockers,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskType {
    StaleTask,
    RepeatedBlocker,
    MissingUpdate,
}

impl RiskType {
    pub fn label(&self) -> &'static str {
        match self {
            RiskType::StaleTask => "Stale Task",
            RiskType::RepeatedBlocker => "Repeated Blocker",
            RiskType::MissingUpdate => "Missing Update",
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub user: String,
    #[serde(rename = "type")]
    pub kind: RiskType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub user: String,
    pub yesterday: String,
    pub today: String,
    pub blockers: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<&StandupEntry> for UpdateRecord {
    fn from(entry: &StandupEntry) -> UpdateRecord {
        UpdateRecord {
            user: entry.user_name.clone(),
            yesterday: entry.yesterday.clone(),
            today: entry.today.clone(),
            blockers: entry.blockers.clone(),
            created_at: entry.created_at,
        }
    }
}

/// The dashboard payload. Both the dashboard route and the Slack report are
/// rendered from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub team_id: i32,
    pub date: NaiveDate,
    pub summary: String,
    pub risks: Vec<RiskFinding>,
    pub updates: Vec<UpdateRecord>,
}
