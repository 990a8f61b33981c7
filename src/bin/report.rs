use chrono::NaiveDate;
use clap::Parser;
use log::{error, info};
use standup_reporter::config::Settings;
use standup_reporter::handle::{self, Services};
use standup_reporter::slack::Delivery;
use standup_reporter::store::{establish_connection, init_db};
use standup_reporter::Report;
use std::process;

/// Builds a team's daily stand-up report and posts it to Slack. Meant to be
/// run from cron when the built-in scheduler is not used.
#[derive(Parser)]
#[command(name = "report")]
struct Args {
    /// Team to report on (defaults to REPORT_TEAM_ID)
    #[arg(long)]
    team: Option<i32>,

    /// Report date, YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the report as JSON instead of posting it
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> standup_reporter::Result<()> {
    let settings = Settings::from_env()?;
    let services = Services::from_settings(&settings)?;
    let team_id = args.team.unwrap_or(settings.report_team_id);
    let date = args.date.unwrap_or_else(handle::today);

    let mut conn = establish_connection(&settings.database_url)?;
    init_db(&mut conn)?;

    if args.dry_run {
        let report = services.aggregator.build_report(&mut conn, team_id, date)?;
        println!("{}", render(&report)?);
        return Ok(());
    }

    match handle::send_team_report(&mut conn, &services, team_id, date)? {
        Delivery::Posted => info!("Report for team {} on {} posted", team_id, date),
        Delivery::Skipped => info!("Report for team {} on {} not posted", team_id, date),
    }

    Ok(())
}

fn render(report: &Report) -> standup_reporter::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod test {
    use crate::render;
    use chrono::NaiveDate;
    use standup_reporter::Report;

    #[test]
    fn dry_run_prints_report_json() {
        let report = Report {
            team_id: 3,
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            summary: "No updates today.".to_string(),
            updates: vec![],
            risks: vec![],
        };

        let json: serde_json::Value = serde_json::from_str(&render(&report).unwrap()).unwrap();

        assert_eq!(json["team_id"], 3);
        assert_eq!(json["date"], "2024-03-12");
        assert!(json["risks"].as_array().unwrap().is_empty());
    }
}
