use crate::StandupEntry;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Keeps the latest entry for every key. On equal timestamps the entry seen
/// last wins.
pub fn latest_by<'a, K, F>(
    entries: impl IntoIterator<Item = &'a StandupEntry>,
    key: F,
) -> BTreeMap<K, &'a StandupEntry>
where
    K: Ord,
    F: Fn(&StandupEntry) -> K,
{
    let mut latest: BTreeMap<K, &StandupEntry> = BTreeMap::new();

    for entry in entries {
        match latest.entry(key(entry)) {
            Entry::Occupied(mut slot) => {
                if entry.created_at >= slot.get().created_at {
                    slot.insert(entry);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    latest
}

/// One entry per user: the one with the greatest `created_at`.
pub fn latest_per_user(entries: &[StandupEntry]) -> BTreeMap<String, StandupEntry> {
    latest_by(entries, |e| e.user_name.clone())
        .into_iter()
        .map(|(user, entry)| (user, entry.clone()))
        .collect()
}
