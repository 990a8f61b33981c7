use crate::dedup::latest_per_user;
use crate::error::Result;
use crate::risk::{detect_risks, DEFAULT_MISSING_UPDATE_THRESHOLD_DAYS};
use crate::store::EntryStore;
use crate::summary::{summarize, TextGenerator};
use crate::{Report, RiskFinding, StandupEntry, UpdateRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

const RISK_WINDOW_DAYS: i64 = 7;

pub fn day_start(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// Builds every view of a team's day: the dashboard, the Slack report, the
/// summary and risk routes all go through here.
#[derive(Clone)]
pub struct ReportAggregator {
    generator: Option<Arc<dyn TextGenerator>>,
    missing_update_threshold_days: i64,
}

impl ReportAggregator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> ReportAggregator {
        ReportAggregator {
            generator,
            missing_update_threshold_days: DEFAULT_MISSING_UPDATE_THRESHOLD_DAYS,
        }
    }

    pub fn with_missing_update_threshold(mut self, days: i64) -> ReportAggregator {
        self.missing_update_threshold_days = days;
        self
    }

    /// Latest entry of each user on `as_of`, ordered by user name.
    pub fn todays_updates<S: EntryStore + ?Sized>(
        &self,
        store: &mut S,
        team_id: i32,
        as_of: NaiveDate,
    ) -> Result<Vec<StandupEntry>> {
        let entries = store.entries_in_range(
            team_id,
            day_start(as_of),
            day_start(as_of + Duration::days(1)),
        )?;

        Ok(latest_per_user(&entries).into_values().collect())
    }

    pub fn summarize(&self, entries: &[StandupEntry]) -> String {
        summarize(entries, self.generator.as_deref())
    }

    pub fn summarize_day<S: EntryStore + ?Sized>(
        &self,
        store: &mut S,
        team_id: i32,
        as_of: NaiveDate,
    ) -> Result<String> {
        let todays = self.todays_updates(store, team_id, as_of)?;
        Ok(self.summarize(&todays))
    }

    pub fn risks<S: EntryStore + ?Sized>(
        &self,
        store: &mut S,
        team_id: i32,
        as_of: NaiveDate,
    ) -> Result<Vec<RiskFinding>> {
        let window = store.entries_in_range(
            team_id,
            day_start(as_of - Duration::days(RISK_WINDOW_DAYS)),
            day_start(as_of + Duration::days(1)),
        )?;
        let history = store.entries_for_team(team_id)?;

        Ok(detect_risks(
            team_id,
            as_of,
            &window,
            &history,
            self.missing_update_threshold_days,
        ))
    }

    pub fn build_report<S: EntryStore + ?Sized>(
        &self,
        store: &mut S,
        team_id: i32,
        as_of: NaiveDate,
    ) -> Result<Report> {
        let todays = self.todays_updates(store, team_id, as_of)?;
        let summary = self.summarize(&todays);
        let risks = self.risks(store, team_id, as_of)?;

        Ok(Report {
            team_id,
            date: as_of,
            summary,
            risks,
            updates: todays.iter().map(UpdateRecord::from).collect(),
        })
    }
}
