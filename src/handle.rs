use crate::config::Settings;
use crate::error::{Error, Result};
use crate::groq::GroqGenerator;
use crate::report::ReportAggregator;
use crate::slack::{self, ChatDelivery, Delivery, SlackWebhook};
use crate::store::{establish_connection, EntryStore};
use crate::summary::TextGenerator;
use crate::{NewStandupEntry, StandupEntry, StandupSubmission, UpdateRecord};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// Long-lived collaborators shared by routes, the scheduler and the CLI.
#[derive(Clone)]
pub struct Services {
    pub aggregator: ReportAggregator,
    pub delivery: Arc<dyn ChatDelivery>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> Result<Services> {
        let generator: Option<Arc<dyn TextGenerator>> = match &settings.groq_api_key {
            Some(key) => Some(Arc::new(GroqGenerator::new(
                &settings.groq_api_url,
                key,
                &settings.groq_model,
                settings.http_timeout,
            )?)),
            None => {
                info!("GROQ_API_KEY not set; summaries will be rule-based.");
                None
            }
        };

        let aggregator = ReportAggregator::new(generator)
            .with_missing_update_threshold(settings.missing_update_threshold_days);
        let delivery = SlackWebhook::new(settings.slack_webhook_url.clone(), settings.http_timeout)?;

        Ok(Services {
            aggregator,
            delivery: Arc::new(delivery),
        })
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Stores a stand-up after checking its team exists.
pub fn submit_standup<S: EntryStore + ?Sized>(
    store: &mut S,
    submission: StandupSubmission,
) -> Result<StandupEntry> {
    if !store.team_exists(submission.team_id)? {
        return Err(Error::TeamNotFound(submission.team_id));
    }

    store.create_entry(NewStandupEntry::new(submission))
}

pub fn send_team_report<S: EntryStore + ?Sized>(
    store: &mut S,
    services: &Services,
    team_id: i32,
    as_of: NaiveDate,
) -> Result<Delivery> {
    let report = services.aggregator.build_report(store, team_id, as_of)?;
    services
        .delivery
        .deliver(&slack::team_report_payload(&report))
}

pub fn send_user_update<S: EntryStore + ?Sized>(
    store: &mut S,
    services: &Services,
    team_id: i32,
    user_name: &str,
    as_of: NaiveDate,
) -> Result<Delivery> {
    let updates: Vec<UpdateRecord> = services
        .aggregator
        .todays_updates(store, team_id, as_of)?
        .iter()
        .map(UpdateRecord::from)
        .collect();

    match slack::user_update_payload(team_id, user_name, &updates) {
        Some(payload) => services.delivery.deliver(&payload),
        None => {
            info!(
                "No update found today for user {}; skipping Slack post.",
                user_name
            );
            Ok(Delivery::Skipped)
        }
    }
}

/// Full team report to Slack. Failures are logged, never returned.
pub fn notify_team<S: EntryStore + ?Sized>(
    store: &mut S,
    services: &Services,
    team_id: i32,
    as_of: NaiveDate,
) {
    match send_team_report(store, services, team_id, as_of) {
        Ok(Delivery::Posted) => info!("Slack full team report posted for team {}", team_id),
        Ok(Delivery::Skipped) => (),
        Err(e) => error!("Slack report for team {} failed: {}", team_id, e),
    }
}

/// One user's latest update to Slack. Failures are logged, never returned.
pub fn notify_user<S: EntryStore + ?Sized>(
    store: &mut S,
    services: &Services,
    team_id: i32,
    user_name: &str,
    as_of: NaiveDate,
) {
    match send_user_update(store, services, team_id, user_name, as_of) {
        Ok(Delivery::Posted) => info!("Slack updated automatically for {}", user_name),
        Ok(Delivery::Skipped) => (),
        Err(e) => warn!("Slack auto-update failed for {}: {}", user_name, e),
    }
}

/// The daily job: opens its own connection and reports the configured team.
pub fn run_scheduled_report(settings: &Settings, services: &Services) {
    let mut conn = match establish_connection(&settings.database_url) {
        Ok(conn) => conn,
        Err(e) => {
            error!("Scheduled report skipped, database unavailable: {}", e);
            return;
        }
    };

    notify_team(&mut conn, services, settings.report_team_id, today());
}
