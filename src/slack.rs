use crate::error::{Error, Result};
use crate::{Report, RiskFinding, UpdateRecord};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

const FOOTER: &str = "_Generated automatically by the daily stand-up reporter :robot_face:_";

/// What gets posted to the team channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SlackPayload {
    pub title: String,
    pub team_id: i32,
    pub summary: String,
    /// `None` for single-user updates, which carry no team risk section.
    pub risks: Option<Vec<RiskFinding>>,
    pub updates: Vec<UpdateRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Posted,
    Skipped,
}

pub trait ChatDelivery: Send + Sync {
    fn deliver(&self, payload: &SlackPayload) -> Result<Delivery>;
}

pub fn team_report_payload(report: &Report) -> SlackPayload {
    SlackPayload {
        title: format!(":calendar: Daily Stand-up Report - {}", report.date),
        team_id: report.team_id,
        summary: report.summary.clone(),
        risks: Some(report.risks.clone()),
        updates: report.updates.clone(),
    }
}

/// Payload for one user's latest update, matched case-insensitively.
pub fn user_update_payload(
    team_id: i32,
    user_name: &str,
    updates: &[UpdateRecord],
) -> Option<SlackPayload> {
    let wanted = user_name.to_lowercase();
    let update = updates.iter().find(|u| u.user.to_lowercase() == wanted)?;

    let summary = format!(
        ":standing_person: *{}*'s latest stand-up:\n- Yesterday: {}\n- Today: {}\n- Blockers: {}",
        update.user,
        update.yesterday,
        update.today,
        update.blockers.as_deref().unwrap_or("None")
    );

    Some(SlackPayload {
        title: format!(":standing_person: Stand-up Update - {}", update.user),
        team_id,
        summary,
        risks: None,
        updates: vec![update.clone()],
    })
}

fn risk_text(risks: &Option<Vec<RiskFinding>>) -> String {
    match risks {
        None => "_(No team risk summary for individual updates)_".to_string(),
        Some(risks) if risks.is_empty() => ":white_check_mark: No major risks detected.".to_string(),
        Some(risks) => risks
            .iter()
            .map(|r| format!("• *{}* - {}: {}", r.user, r.kind, r.description))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn updates_text(updates: &[UpdateRecord]) -> String {
    if updates.is_empty() {
        return "_No stand-up updates found for today._".to_string();
    }

    updates
        .iter()
        .map(|u| {
            format!(
                "• *{}*\n   • Yesterday: {}\n   • Today: {}\n   • Blockers: {}",
                u.user,
                u.yesterday,
                u.today,
                u.blockers.as_deref().unwrap_or("None")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn section(text: String) -> Value {
    json!({ "type": "section", "text": { "type": "mrkdwn", "text": text } })
}

/// Slack block-kit message for a payload.
pub fn message(payload: &SlackPayload) -> Value {
    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": payload.title, "emoji": true } }),
        section(format!("*Team ID:* {}", payload.team_id)),
        json!({ "type": "divider" }),
        section(format!("*:brain: Summary:*\n{}", payload.summary)),
    ];

    if payload.risks.is_some() {
        blocks.push(json!({ "type": "divider" }));
        blocks.push(section(format!("*:warning: Risks:*\n{}", risk_text(&payload.risks))));
    }

    blocks.push(json!({ "type": "divider" }));
    blocks.push(section(format!(
        "*:receipt: Updates:*\n{}",
        updates_text(&payload.updates)
    )));
    blocks.push(json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": FOOTER }]
    }));

    json!({ "blocks": blocks })
}

/// Posts to a Slack incoming webhook.
pub struct SlackWebhook {
    client: Client,
    url: Option<String>,
}

impl SlackWebhook {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<SlackWebhook> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(SlackWebhook { client, url })
    }
}

impl ChatDelivery for SlackWebhook {
    fn deliver(&self, payload: &SlackPayload) -> Result<Delivery> {
        let url = match &self.url {
            Some(url) => url,
            None => {
                warn!("SLACK_WEBHOOK_URL not configured; skipping Slack post.");
                return Ok(Delivery::Skipped);
            }
        };

        let resp = self.client.post(url).json(&message(payload)).send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Delivery {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        Ok(Delivery::Posted)
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::slack::{
        message, team_report_payload, user_update_payload, ChatDelivery, Delivery, SlackWebhook,
    };
    use crate::{Report, RiskFinding, RiskType, UpdateRecord};
    use chrono::NaiveDate;
    use mockito::Matcher;
    use std::time::Duration;

    fn update(user: &str, blockers: Option<&str>) -> UpdateRecord {
        UpdateRecord {
            user: user.to_string(),
            yesterday: "Planning".to_string(),
            today: "Coding".to_string(),
            blockers: blockers.map(String::from),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    fn report(risks: Vec<RiskFinding>) -> Report {
        Report {
            team_id: 7,
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            summary: "Summary text".to_string(),
            risks,
            updates: vec![update("Alice", None), update("Bob", Some("VPN"))],
        }
    }

    fn block_texts(payload: &serde_json::Value) -> Vec<String> {
        payload["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["text"]["text"].as_str().map(String::from))
            .collect()
    }

    #[test]
    fn team_report_message() {
        let payload = team_report_payload(&report(vec![RiskFinding {
            user: "Alice".to_string(),
            kind: RiskType::StaleTask,
            description: "Task unchanged".to_string(),
        }]));

        let texts = block_texts(&message(&payload));

        assert_eq!(texts[0], ":calendar: Daily Stand-up Report - 2024-03-12");
        assert_eq!(texts[1], "*Team ID:* 7");
        assert!(texts.iter().any(|t| t.contains("• *Alice* - Stale Task: Task unchanged")));
        assert!(texts.iter().any(|t| t.contains("• *Bob*\n   • Yesterday: Planning\n   • Today: Coding\n   • Blockers: VPN")));
        assert!(texts.iter().any(|t| t.contains("• *Alice*\n   • Yesterday: Planning\n   • Today: Coding\n   • Blockers: None")));
    }

    #[test]
    fn team_report_without_risks() {
        let texts = block_texts(&message(&team_report_payload(&report(vec![]))));

        assert!(texts.iter().any(|t| t.contains("No major risks detected")));
    }

    #[test]
    fn user_update_is_case_insensitive_and_has_no_risks() {
        let updates = vec![update("Alice", None), update("Bob", Some("VPN"))];

        let payload = user_update_payload(7, "bob", &updates).unwrap();

        assert_eq!(payload.updates.len(), 1);
        assert_eq!(payload.updates[0].user, "Bob");
        assert!(payload.risks.is_none());
        assert!(payload.summary.contains("- Blockers: VPN"));
        let texts = block_texts(&message(&payload));
        assert!(texts.iter().all(|t| !t.contains("Risks")));
    }

    #[test]
    fn unknown_user_has_no_payload() {
        assert!(user_update_payload(7, "carol", &[update("Alice", None)]).is_none());
    }

    #[test]
    fn skipped_without_webhook() {
        let webhook = SlackWebhook::new(None, Duration::from_secs(10)).unwrap();

        let result = webhook.deliver(&team_report_payload(&report(vec![])));

        assert_eq!(result.unwrap(), Delivery::Skipped);
    }

    #[test]
    fn posts_blocks_to_webhook() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/services/T000/B000")
            .match_body(Matcher::Regex(r#""type":"header""#.to_string()))
            .with_status(200)
            .with_body("ok")
            .create();
        let webhook = SlackWebhook::new(
            Some(format!("{}/services/T000/B000", server.url())),
            Duration::from_secs(10),
        )
        .unwrap();

        let result = webhook.deliver(&team_report_payload(&report(vec![])));

        assert_eq!(result.unwrap(), Delivery::Posted);
        mock.assert();
    }

    #[test]
    fn webhook_error_status() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/hook")
            .with_status(404)
            .with_body("no_service")
            .create();
        let webhook =
            SlackWebhook::new(Some(format!("{}/hook", server.url())), Duration::from_secs(10))
                .unwrap();

        let result = webhook.deliver(&team_report_payload(&report(vec![])));

        assert!(matches!(
            result,
            Err(Error::Delivery { status: 404, ref body }) if body == "no_service"
        ));
    }
}
