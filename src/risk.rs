use crate::dedup::latest_by;
use crate::text::{blocker_key, normalize};
use crate::{RiskFinding, RiskType, StandupEntry};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_MISSING_UPDATE_THRESHOLD_DAYS: i64 = 2;

/// Compares every user's `as_of` entry with their entry from the day before
/// and checks how long ago each known user last posted.
///
/// `window` holds the recent entries (the report uses the last 7 days) and
/// `history` all entries of the team. Users are only known through their
/// entries, so someone who never posted is never reported as missing.
/// Thresholds below one day are treated as one day. A threshold reaching
/// past the earliest representable date flags nobody who has ever posted.
pub fn detect_risks(
    team_id: i32,
    as_of: NaiveDate,
    window: &[StandupEntry],
    history: &[StandupEntry],
    missing_update_threshold_days: i64,
) -> Vec<RiskFinding> {
    let mut risks = Vec::new();
    let previous = as_of - Duration::days(1);

    let by_user_day = latest_by(window, |e| (e.user_name.clone(), e.day()));

    let users: BTreeSet<&str> = window
        .iter()
        .chain(history.iter())
        .map(|e| e.user_name.as_str())
        .collect();

    for user in &users {
        let key = |day: NaiveDate| (user.to_string(), day);
        if let (Some(today), Some(yesterday)) =
            (by_user_day.get(&key(as_of)), by_user_day.get(&key(previous)))
        {
            compare_days(user, as_of, today, previous, yesterday, &mut risks);
        }
    }

    let last_seen = last_seen_per_user(history);
    let threshold = missing_update_threshold_days.max(1);
    let cutoff = Duration::try_days(threshold - 1).and_then(|d| as_of.checked_sub_signed(d));

    for user in &users {
        let last = last_seen.get(*user).map(|at| at.date());
        let missing = match (last, cutoff) {
            (Some(day), Some(cutoff)) => day < cutoff,
            (Some(_), None) => false,
            (None, _) => true,
        };

        if missing {
            let last_text = last
                .map(|d| d.to_string())
                .unwrap_or_else(|| "never".to_string());
            risks.push(RiskFinding {
                user: user.to_string(),
                kind: RiskType::MissingUpdate,
                description: format!(
                    "Last update was on {}; no update in last {} days.",
                    last_text, threshold
                ),
            });
        }
    }

    debug!(
        "team {}: {} risk(s) as of {} from {} recent entries",
        team_id,
        risks.len(),
        as_of,
        window.len()
    );

    risks
}

fn compare_days(
    user: &str,
    day: NaiveDate,
    today: &StandupEntry,
    previous_day: NaiveDate,
    yesterday: &StandupEntry,
    risks: &mut Vec<RiskFinding>,
) {
    if normalize(Some(&today.today)) == normalize(Some(&yesterday.today)) {
        risks.push(RiskFinding {
            user: user.to_string(),
            kind: RiskType::StaleTask,
            description: format!(
                "Task unchanged between {} and {}: '{}'",
                previous_day, day, today.today
            ),
        });
    }

    let blocker = blocker_key(today.blockers.as_deref());
    if blocker.is_some() && blocker == blocker_key(yesterday.blockers.as_deref()) {
        risks.push(RiskFinding {
            user: user.to_string(),
            kind: RiskType::RepeatedBlocker,
            description: format!(
                "Same blocker reported on {} and {}: '{}'",
                previous_day,
                day,
                today.blockers.as_deref().unwrap_or_default()
            ),
        });
    }
}

pub fn last_seen_per_user(history: &[StandupEntry]) -> BTreeMap<String, NaiveDateTime> {
    latest_by(history, |e| e.user_name.clone())
        .into_iter()
        .map(|(user, entry)| (user, entry.created_at))
        .collect()
}
