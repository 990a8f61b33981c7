/// Blocker texts that mean "nothing is blocking me".
const NO_BLOCKER: [&str; 5] = ["", "none", "no blockers", "n/a", "na"];

/// Trims and lowercases free text so two answers can be compared.
pub fn normalize(text: Option<&str>) -> String {
    text.map(|t| t.trim().to_lowercase()).unwrap_or_default()
}

pub fn is_no_blocker(blocker: Option<&str>) -> bool {
    NO_BLOCKER.contains(&normalize(blocker).as_str())
}

/// Normalized blocker, or `None` when the answer means there is no blocker.
pub fn blocker_key(blocker: Option<&str>) -> Option<String> {
    let key = normalize(blocker);
    if NO_BLOCKER.contains(&key.as_str()) {
        None
    } else {
        Some(key)
    }
}
