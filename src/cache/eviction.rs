//! Eviction Module
//!
//! Picks the entries to drop when a write would exceed the memory budget.
//!
//! Hit count stands in for recency: entries that were never read go first,
//! ties go to the oldest entry, and insertion order settles entries created
//! in the same millisecond.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Eviction Order ==
/// Returns every key ordered from first to last eviction candidate.
pub fn eviction_order<V>(entries: &HashMap<String, CacheEntry<V>>) -> Vec<String> {
    let mut ranked: Vec<(&String, (u64, u64, u64))> = entries
        .iter()
        .map(|(key, entry)| (key, entry.eviction_priority()))
        .collect();
    ranked.sort_unstable_by_key(|(_, priority)| *priority);
    ranked.into_iter().map(|(key, _)| key.clone()).collect()
}

// == Select Victims ==
/// Returns the shortest prefix of the eviction order that frees at least
/// `bytes_needed` bytes.
///
/// If even evicting everything is not enough, every key is returned; the
/// caller is expected to have rejected values larger than the budget.
pub fn select_victims<V>(entries: &HashMap<String, CacheEntry<V>>, bytes_needed: usize) -> Vec<String> {
    if bytes_needed == 0 {
        return Vec::new();
    }

    let mut freed = 0usize;
    let mut victims = Vec::new();
    for key in eviction_order(entries) {
        if freed >= bytes_needed {
            break;
        }
        if let Some(entry) = entries.get(&key) {
            freed += entry.size_bytes;
        }
        victims.push(key);
    }
    victims
}
