#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::figment::util::map;
use rocket::figment::value::{Map, Value};
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::Deserialize;
use rocket::serde::json::{json, Json, Value as JsonValue};
use rocket::{Build, Rocket, State};
use rocket_sync_db_pools::{database, diesel};
use standup_reporter::config::Settings;
use standup_reporter::handle::{self, Services};
use standup_reporter::report::ReportAggregator;
use standup_reporter::scheduler::SchedulerHandle;
use standup_reporter::store;
use standup_reporter::{
    Error, NewTeam, Report, StandupEntry, StandupSubmission, Team, TeamSubmission,
};

#[database("standup")]
pub struct DbConn(diesel::SqliteConnection);

#[derive(Responder)]
enum ApiError {
    #[response(status = 404)]
    NotFound(Json<JsonValue>),
    #[response(status = 500)]
    Internal(Json<JsonValue>),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> ApiError {
        match e {
            Error::TeamNotFound(_) => ApiError::NotFound(Json(json!({ "detail": "Team not found" }))),
            e => {
                log::error!("request failed: {}", e);
                ApiError::Internal(Json(json!({ "detail": e.to_string() })))
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct StartStandupRequest {
    team_id: String,
    scheduled_by: Option<String>,
}

#[get("/health")]
fn health() -> JsonValue {
    json!({ "status": "ok", "date": handle::today().to_string() })
}

#[post("/teams", data = "<team>")]
async fn create_team(team: Json<TeamSubmission>, conn: DbConn) -> ApiResult<Json<Team>> {
    let team = NewTeam::new(team.into_inner());
    let created = conn.run(move |c| store::create_team(c, team)).await?;
    Ok(Json(created))
}

#[get("/teams")]
async fn list_teams(conn: DbConn) -> ApiResult<Json<Vec<Team>>> {
    Ok(Json(conn.run(|c| store::list_teams(c)).await?))
}

#[post("/standup", data = "<standup>")]
async fn submit_standup(
    standup: Json<StandupSubmission>,
    conn: DbConn,
    services: &State<Services>,
) -> ApiResult<Created<JsonValue>> {
    let submission = standup.into_inner();
    let entry = conn
        .run(move |c| handle::submit_standup(c, submission))
        .await?;

    // delivery outcome never reaches the submitter
    let services = services.inner().clone();
    let (team_id, user) = (entry.team_id, entry.user_name.clone());
    rocket::tokio::spawn(async move {
        conn.run(move |c| handle::notify_user(c, &services, team_id, &user, handle::today()))
            .await
    });

    Ok(Created::new("/standup").body(json!({
        "message": "Stand-up submitted successfully",
        "standup": entry
    })))
}

#[get("/standup")]
async fn list_standups(conn: DbConn) -> ApiResult<Json<Vec<StandupEntry>>> {
    Ok(Json(conn.run(|c| store::list_entries(c)).await?))
}

#[get("/report/today/<team_id>")]
async fn today_report(
    team_id: i32,
    conn: DbConn,
    services: &State<Services>,
) -> ApiResult<JsonValue> {
    let aggregator = services.aggregator.clone();
    let date = handle::today();
    let report = conn
        .run(move |c| aggregator.summarize_day(c, team_id, date))
        .await?;
    Ok(json!({ "team_id": team_id, "date": date.to_string(), "report": report }))
}

#[get("/risk/today/<team_id>?<days_missing>")]
async fn risk_report(
    team_id: i32,
    days_missing: Option<i64>,
    conn: DbConn,
    services: &State<Services>,
) -> ApiResult<JsonValue> {
    let aggregator: ReportAggregator = match days_missing {
        Some(days) => services.aggregator.clone().with_missing_update_threshold(days),
        None => services.aggregator.clone(),
    };
    let date = handle::today();
    let risks = conn
        .run(move |c| aggregator.risks(c, team_id, date))
        .await?;
    Ok(json!({ "team_id": team_id, "date": date.to_string(), "risks": risks }))
}

#[get("/dashboard/today/<team_id>")]
async fn dashboard(
    team_id: i32,
    conn: DbConn,
    services: &State<Services>,
) -> ApiResult<Json<Report>> {
    let aggregator = services.aggregator.clone();
    let date = handle::today();
    let report = conn
        .run(move |c| aggregator.build_report(c, team_id, date))
        .await?;
    Ok(Json(report))
}

#[post("/notify/slack/<team_id>")]
fn notify_slack(team_id: i32, conn: DbConn, services: &State<Services>) -> JsonValue {
    let services = services.inner().clone();
    rocket::tokio::spawn(async move {
        conn.run(move |c| handle::notify_team(c, &services, team_id, handle::today()))
            .await
    });
    json!({ "message": "Report successfully queued for Slack." })
}

#[post("/start-standup", data = "<payload>")]
fn start_standup(payload: Json<StartStandupRequest>) -> JsonValue {
    json!({
        "message": "standup trigger received",
        "team_id": payload.team_id,
        "scheduled_by": payload.scheduled_by
    })
}

#[catch(404)]
fn not_found() -> JsonValue {
    json!({ "detail": "Not Found" })
}

#[catch(default)]
fn default_catcher(status: Status, _req: &rocket::Request) -> JsonValue {
    json!({ "detail": status.reason().unwrap_or("error") })
}

fn build(settings: Settings) -> standup_reporter::Result<Rocket<Build>> {
    let services = Services::from_settings(&settings)?;

    log::info!("Initializing database...");
    let mut conn = store::establish_connection(&settings.database_url)?;
    store::init_db(&mut conn)?;

    let database: Map<_, Value> = map! {
        "url" => settings.database_url.clone().into(),
    };
    let figment = rocket::Config::figment()
        .merge(("port", settings.port))
        .merge(("log_level", "off"))
        .merge(("databases", map!["standup" => database]));

    let job_services = services.clone();

    Ok(rocket::custom(figment)
        .attach(DbConn::fairing())
        .manage(services)
        .manage(SchedulerHandle::new())
        .attach(AdHoc::on_liftoff("Report scheduler", move |rocket| {
            Box::pin(async move {
                if let Some(scheduler) = rocket.state::<SchedulerHandle>() {
                    let at = settings.report_time;
                    scheduler.start(at, move || {
                        handle::run_scheduled_report(&settings, &job_services)
                    });
                }
            })
        }))
        .mount(
            "/",
            routes![
                health,
                create_team,
                list_teams,
                submit_standup,
                list_standups,
                today_report,
                risk_report,
                dashboard,
                notify_slack,
                start_standup
            ],
        )
        .register("/", catchers![not_found, default_catcher]))
}

#[launch]
fn rocket() -> _ {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Settings::from_env().and_then(build) {
        Ok(rocket) => rocket,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::build;
    use chrono::{Duration, Utc};
    use rocket::http::{ContentType, Status};
    use rocket::local::blocking::Client;
    use rocket::serde::json::Value;
    use standup_reporter::config::Settings;
    use standup_reporter::store::{self, EntryStore};
    use standup_reporter::{NewStandupEntry, NewTeam, StandupSubmission, TeamSubmission};
    use std::path::{Path, PathBuf};

    fn database(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "standup_reporter_{}_{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn client(path: &Path) -> Client {
        let mut settings = Settings::from_lookup(|_| None).unwrap();
        settings.database_url = path.to_string_lossy().into_owned();
        Client::tracked(build(settings).unwrap()).unwrap()
    }

    #[test]
    fn standup_for_unknown_team_is_404() {
        let path = database("unknown_team");
        let client = client(&path);

        let response = client
            .post("/standup")
            .header(ContentType::JSON)
            .body(r#"{"team_id": 99, "user_name": "alice", "yesterday": "a", "today": "b"}"#)
            .dispatch();

        assert_eq!(response.status(), Status::NotFound);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["detail"], "Team not found");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn days_missing_overrides_threshold() {
        let path = database("days_missing");
        let client = client(&path);

        let mut conn = store::establish_connection(&path.to_string_lossy()).unwrap();
        let team = store::create_team(
            &mut conn,
            NewTeam::new(TeamSubmission {
                name: "Platform".to_string(),
                lead_name: None,
            }),
        )
        .unwrap();
        let submission = StandupSubmission {
            team_id: team.id,
            user_name: "dave".to_string(),
            yesterday: "a".to_string(),
            today: "b".to_string(),
            blockers: None,
        };
        let three_days_ago = (Utc::now() - Duration::days(3)).naive_utc();
        conn.create_entry(NewStandupEntry::at(submission, three_days_ago))
            .unwrap();

        let risks = |uri: String| -> Value {
            let response = client.get(uri).dispatch();
            assert_eq!(response.status(), Status::Ok);
            response.into_json::<Value>().unwrap()["risks"].clone()
        };

        let default = risks(format!("/risk/today/{}", team.id));
        assert_eq!(default.as_array().unwrap().len(), 1);
        assert_eq!(default[0]["type"], "MissingUpdate");

        let relaxed = risks(format!("/risk/today/{}?days_missing=5", team.id));
        assert!(relaxed.as_array().unwrap().is_empty());

        let huge = risks(format!("/risk/today/{}?days_missing=1000000000", team.id));
        assert!(huge.as_array().unwrap().is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
