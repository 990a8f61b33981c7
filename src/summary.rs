use crate::error::Result;
use crate::text::is_no_blocker;
use crate::StandupEntry;

pub const NO_UPDATES: &str = "No stand-up updates found for today.";

const INSTRUCTIONS: &str = "You are an assistant summarizing daily stand-up updates.
For each user, provide concise bullet points summarizing their yesterday/today work.
Include blockers if present.
End with one concise overall team summary.";

/// Something that turns a prompt into prose, usually a language model.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

pub fn build_prompt(entries: &[StandupEntry]) -> String {
    let reports = entries
        .iter()
        .map(|e| {
            format!(
                "User: {}\nYesterday: {}\nToday: {}\nBlockers: {}",
                e.user_name,
                e.yesterday,
                e.today,
                e.blockers.as_deref().unwrap_or("None")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\nReports:\n{}\n", INSTRUCTIONS, reports)
}

/// Summarizes the given entries with `generator` when there is one, and
/// with the plain template when there is none or it fails.
pub fn summarize(entries: &[StandupEntry], generator: Option<&dyn TextGenerator>) -> String {
    if entries.is_empty() {
        return NO_UPDATES.to_string();
    }

    if let Some(generator) = generator {
        match generator.generate(&build_prompt(entries)) {
            Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
            Ok(_) => warn!("AI summarization returned nothing; falling back to rule-based summary."),
            Err(e) => warn!("AI summarization failed; falling back to rule-based summary: {}", e),
        }
    }

    fallback_summary(entries)
}

pub fn fallback_summary(entries: &[StandupEntry]) -> String {
    if entries.is_empty() {
        return NO_UPDATES.to_string();
    }

    let blocks = entries
        .iter()
        .map(|e| {
            let mut block = format!(
                "**{}**\n- Yesterday: {}\n- Today: {}",
                e.user_name, e.yesterday, e.today
            );
            if !is_no_blocker(e.blockers.as_deref()) {
                block.push_str(&format!("\n- Blocker: {}", e.blockers.as_deref().unwrap_or_default()));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "**Daily Stand-up Summary**\n\n{}\n\n**Team Summary:** The team is progressing; check blockers above.",
        blocks
    )
}

#[cfg(test)]
mod test {
    use crate::error::{Error, Result};
    use crate::summary::{build_prompt, fallback_summary, summarize, TextGenerator, NO_UPDATES};
    use crate::StandupEntry;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct Failing;

    impl TextGenerator for Failing {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::Generation("connection refused".to_string()))
        }
    }

    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl TextGenerator for Canned {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn entry(user: &str, today: &str, blockers: Option<&str>) -> StandupEntry {
        StandupEntry {
            id: 1,
            team_id: 1,
            user_name: user.to_string(),
            yesterday: "Reviewed PRs".to_string(),
            today: today.to_string(),
            blockers: blockers.map(String::from),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn empty_entries_give_sentinel() {
        assert_eq!(summarize(&[], None), NO_UPDATES);
        assert_eq!(summarize(&[], Some(&Failing)), NO_UPDATES);
    }

    #[test]
    fn failing_generator_matches_no_generator() {
        let entries = vec![
            entry("alice", "Fix bug", Some("None")),
            entry("bob", "Write docs", Some("Waiting on review")),
        ];

        assert_eq!(summarize(&entries, Some(&Failing)), summarize(&entries, None));
    }

    #[test]
    fn fallback_lists_only_real_blockers() {
        let entries = vec![
            entry("alice", "Fix bug", Some("none")),
            entry("bob", "Write docs", Some("Waiting on review")),
        ];

        let text = fallback_summary(&entries);

        assert!(text.starts_with("**Daily Stand-up Summary**"));
        assert!(text.contains("**alice**\n- Yesterday: Reviewed PRs\n- Today: Fix bug\n\n**bob**"));
        assert!(text.contains("- Blocker: Waiting on review"));
        assert_eq!(text.matches("- Blocker:").count(), 1);
        assert!(text.ends_with("**Team Summary:** The team is progressing; check blockers above."));
    }

    #[test]
    fn generator_output_is_trimmed() {
        let generator = Canned {
            reply: "\n  - alice: fixing bugs\nTeam is fine.  \n".to_string(),
            prompts: Mutex::new(vec![]),
        };

        let text = summarize(&[entry("alice", "Fix bug", None)], Some(&generator));

        assert_eq!(text, "- alice: fixing bugs\nTeam is fine.");
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User: alice\nYesterday: Reviewed PRs\nToday: Fix bug\nBlockers: None"));
    }

    #[test]
    fn blank_generator_output_falls_back() {
        let generator = Canned {
            reply: "   ".to_string(),
            prompts: Mutex::new(vec![]),
        };
        let entries = vec![entry("alice", "Fix bug", None)];

        assert_eq!(summarize(&entries, Some(&generator)), fallback_summary(&entries));
    }

    #[test]
    fn prompt_asks_for_team_summary() {
        let prompt = build_prompt(&[entry("alice", "Fix bug", Some("VPN down"))]);

        assert!(prompt.contains("overall team summary"));
        assert!(prompt.contains("Blockers: VPN down"));
    }
}
