//! Scores waiting-list entries against room capabilities and picks suggestions.

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Bed, Priority, Room, WaitingListEntry};

const EXACT_MATCH_POINTS: i32 = 2;
const RELATED_MATCH_POINTS: i32 = 1;

/// A need that is partly served by a broader room capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityLink {
    pub need: String,
    pub capability: String,
}

/// Explicit table of need → related capability links. Lookups ignore ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RelatedCapabilities {
    links: Vec<CapabilityLink>,
}

impl RelatedCapabilities {
    pub fn new(links: Vec<CapabilityLink>) -> Self {
        Self { links }
    }

    /// A table with no links; only exact matches score.
    pub fn empty() -> Self {
        Self { links: Vec::new() }
    }

    pub fn links(&self) -> &[CapabilityLink] {
        &self.links
    }

    pub fn implies(&self, need: &str, capability: &str) -> bool {
        self.links.iter().any(|link| {
            link.need.eq_ignore_ascii_case(need) && link.capability.eq_ignore_ascii_case(capability)
        })
    }
}

impl Default for RelatedCapabilities {
    fn default() -> Self {
        let pairs = [
            ("Physiotherapy", "Rehab Equipment"),
            ("Physical therapy", "Rehab Equipment"),
            ("Occupational therapy", "Occupational Therapy Access"),
            ("Speech therapy", "Speech Therapy Access"),
            ("Palliative Care", "Palliative Care Support"),
            ("Palliative Care Support", "Palliative Care"),
            ("Fall prevention", "Fall Prevention Mat"),
            ("Mobilization assistance", "Hoist"),
            ("Respiratory care", "Oxygen Supply"),
            ("Cognitive support", "Dementia Care"),
            ("General Care", "Standard Care"),
            ("Short-term Observation", "Standard Care"),
            ("Social Interaction", "Family Area"),
            ("Post-operative Care", "Adjustable Bed"),
        ];
        Self::new(
            pairs
                .into_iter()
                .map(|(need, capability)| CapabilityLink {
                    need: need.to_string(),
                    capability: capability.to_string(),
                })
                .collect(),
        )
    }
}

/// Outcome of scoring one entry against one room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchScore {
    pub score: i32,
    /// Needs the room provides exactly.
    pub matching_needs: BTreeSet<String>,
    /// Needs covered only through the related-capability table.
    pub related_needs: BTreeSet<String>,
}

/// Additive score of `room` for `entry`: +2 per exact capability, +1 per
/// related capability, plus the priority bonus. Repeated need tags count once.
pub fn score_candidate(
    entry: &WaitingListEntry,
    room: &Room,
    related: &RelatedCapabilities,
) -> MatchScore {
    let mut score = entry.priority.bonus();
    let mut matching_needs = BTreeSet::new();
    let mut related_needs = BTreeSet::new();

    for need in &entry.needs {
        if matching_needs.contains(need) || related_needs.contains(need) {
            continue;
        }
        if room.capabilities.iter().any(|capability| capability == need) {
            score += EXACT_MATCH_POINTS;
            matching_needs.insert(need.clone());
        } else if room
            .capabilities
            .iter()
            .any(|capability| related.implies(need, capability))
        {
            score += RELATED_MATCH_POINTS;
            related_needs.insert(need.clone());
        }
    }

    MatchScore {
        score,
        matching_needs,
        related_needs,
    }
}

/// A proposed bed for a waiting-list entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub entry_id: String,
    pub entry_name: String,
    pub priority: Priority,
    pub room_id: String,
    pub room_label: String,
    pub bed_id: String,
    pub bed_label: String,
    pub score: i32,
    pub matching_needs: BTreeSet<String>,
    pub related_needs: BTreeSet<String>,
}

impl Suggestion {
    fn new(entry: &WaitingListEntry, room: &Room, bed: &Bed, matched: MatchScore) -> Self {
        Self {
            entry_id: entry.id.clone(),
            entry_name: entry.name.clone(),
            priority: entry.priority,
            room_id: room.id.clone(),
            room_label: room.label.clone(),
            bed_id: bed.id.clone(),
            bed_label: bed.label.clone(),
            score: matched.score,
            matching_needs: matched.matching_needs,
            related_needs: matched.related_needs,
        }
    }
}

/// Suggests up to `limit` beds, scanning every bed of every room.
pub fn rank_suggestions<R: Borrow<Room>>(
    entries: &[WaitingListEntry],
    rooms: &[R],
    limit: usize,
    related: &RelatedCapabilities,
) -> Vec<Suggestion> {
    rank_suggestions_where(entries, rooms, limit, related, |_, _| true)
}

/// Greedy suggestion scan restricted to beds accepted by `accept_bed`.
///
/// Entries are visited High priority first (stable otherwise), then rooms and
/// beds in the order given. Each (entry, room) pair yields at most one
/// suggestion, taken from the first accepted bed, and only when the score is
/// positive. Scanning stops once `limit` suggestions are collected, so ties are
/// resolved by scan order. The result is finally sorted by score, highest first.
#[instrument(
    level = "debug",
    skip_all,
    fields(entries = entries.len(), rooms = rooms.len(), limit)
)]
pub fn rank_suggestions_where<R, F>(
    entries: &[WaitingListEntry],
    rooms: &[R],
    limit: usize,
    related: &RelatedCapabilities,
    mut accept_bed: F,
) -> Vec<Suggestion>
where
    R: Borrow<Room>,
    F: FnMut(&Room, &Bed) -> bool,
{
    let mut ordered: Vec<&WaitingListEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.priority);

    let mut suggestions = Vec::new();
    let mut suggested: HashSet<(&str, &str)> = HashSet::new();

    'entries: for entry in ordered {
        for room in rooms {
            if suggestions.len() >= limit {
                break 'entries;
            }
            let room: &Room = room.borrow();
            if suggested.contains(&(entry.id.as_str(), room.id.as_str())) {
                continue;
            }

            let matched = score_candidate(entry, room, related);
            if matched.score <= 0 {
                continue;
            }

            if let Some(bed) = room.beds.iter().find(|bed| accept_bed(room, *bed)) {
                suggested.insert((entry.id.as_str(), room.id.as_str()));
                suggestions.push(Suggestion::new(entry, room, bed, matched));
            }
        }
    }

    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    debug!(count = suggestions.len(), "ranked suggestions");
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn entry(id: &str, priority: Priority, needs: &[&str]) -> WaitingListEntry {
        WaitingListEntry {
            id: id.to_string(),
            name: format!("Patient {id}"),
            age: None,
            priority,
            applied_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            needs: needs.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn room(id: &str, capabilities: &[&str], beds: usize) -> Room {
        Room {
            id: id.to_string(),
            label: format!("Rom {id}"),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            beds: (1..=beds)
                .map(|n| Bed {
                    id: format!("bed-{id}-{n}"),
                    label: format!("Seng {n}"),
                })
                .collect(),
        }
    }

    #[test]
    fn exact_and_related_needs_add_up() {
        let liv = entry("p4", Priority::High, &["Rehab Equipment", "Physiotherapy"]);
        let rehab = room("301", &["Rehab Equipment", "Large Room"], 1);

        let matched = score_candidate(&liv, &rehab, &RelatedCapabilities::default());
        assert_eq!(matched.score, 3 + 2 + 1);
        assert_eq!(
            matched.matching_needs.into_iter().collect::<Vec<_>>(),
            vec!["Rehab Equipment"]
        );
        assert_eq!(
            matched.related_needs.into_iter().collect::<Vec<_>>(),
            vec!["Physiotherapy"]
        );
    }

    #[test]
    fn repeated_needs_score_once() {
        let erik = entry("p6", Priority::Low, &["Hoist", "Hoist", "Physiotherapy", "Physiotherapy"]);
        let room = room("304", &["Hoist", "Rehab Equipment"], 1);

        let matched = score_candidate(&erik, &room, &RelatedCapabilities::default());
        assert_eq!(matched.score, 2 + 1);
        assert_eq!(matched.matching_needs.len(), 1);
        assert_eq!(matched.related_needs.len(), 1);
    }

    #[test]
    fn related_table_is_explicit() {
        let liv = entry("p4", Priority::Low, &["Physiotherapy"]);
        let rehab = room("301", &["Rehab Equipment"], 1);
        let matched = score_candidate(&liv, &rehab, &RelatedCapabilities::empty());
        assert_eq!(matched.score, 0);
    }

    #[test]
    fn zero_score_rooms_are_never_suggested() {
        let sven = entry("wl-extra1", Priority::Low, &["Social Interaction"]);
        let rooms = vec![room("102", &["Oxygen Supply"], 1), room("202", &["Family Area"], 1)];

        let suggestions = rank_suggestions(&[sven], &rooms, 5, &RelatedCapabilities::default());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].room_id, "202");
        assert_eq!(suggestions[0].score, 1);
    }

    #[test]
    fn one_suggestion_per_room_and_first_bed_wins() {
        let frida = entry("p7", Priority::High, &["Hoist"]);
        let rooms = vec![room("101", &["Hoist", "Private Bathroom"], 2)];

        let suggestions = rank_suggestions(&[frida], &rooms, 5, &RelatedCapabilities::default());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].bed_id, "bed-101-1");
    }

    #[test]
    fn high_priority_entries_are_scanned_first() {
        let erik = entry("p6", Priority::Medium, &["Hoist"]);
        let frida = entry("p7", Priority::High, &[]);
        let rooms = vec![room("101", &["Hoist"], 1), room("104", &["Hoist"], 1)];

        let suggestions =
            rank_suggestions(&[erik, frida], &rooms, 2, &RelatedCapabilities::default());
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.entry_id == "p7"));
    }

    #[test]
    fn output_is_sorted_by_score_after_the_cap() {
        let low = entry("a", Priority::Low, &["TV"]);
        let medium = entry("b", Priority::Medium, &["Hoist", "TV"]);
        let rooms = vec![room("105", &["TV"], 1), room("104", &["Hoist"], 1)];

        let suggestions =
            rank_suggestions(&[low, medium], &rooms, 3, &RelatedCapabilities::default());
        let scores: Vec<i32> = suggestions.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![3, 3, 2]);
        assert_eq!(suggestions[2].entry_id, "a");
    }

    #[test]
    fn bed_filter_skips_rejected_beds() {
        let frida = entry("p7", Priority::High, &["Hoist"]);
        let rooms = vec![room("101", &["Hoist"], 2), room("104", &["Hoist"], 1)];

        let suggestions = rank_suggestions_where(
            &[frida],
            &rooms,
            5,
            &RelatedCapabilities::default(),
            |_, bed| bed.id != "bed-101-1" && bed.id != "bed-104-1",
        );
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].bed_id, "bed-101-2");
    }

    #[test]
    fn accepts_borrowed_rooms() {
        let frida = entry("p7", Priority::High, &["Hoist"]);
        let owned = vec![room("101", &["Hoist"], 1)];
        let borrowed: Vec<&Room> = owned.iter().collect();
        assert_eq!(
            rank_suggestions(&[frida], &borrowed, 0, &RelatedCapabilities::default()).len(),
            0
        );
    }

    const NEEDS: [&str; 6] = [
        "Hoist",
        "Private Bathroom",
        "Physiotherapy",
        "Palliative Care",
        "Wi-Fi",
        "General Care",
    ];

    fn any_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![Just(Priority::High), Just(Priority::Medium), Just(Priority::Low)]
    }

    fn any_needs() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(NEEDS.to_vec(), 0..=NEEDS.len())
            .prop_map(|needs| needs.into_iter().map(str::to_string).collect())
    }

    proptest! {
        #[test]
        fn score_ignores_need_order(
            needs in any_needs(),
            capabilities in any_needs(),
            priority in any_priority(),
            seed in any::<u64>(),
        ) {
            let mut shuffled = needs.clone();
            let len = shuffled.len();
            if len > 1 {
                shuffled.rotate_left((seed as usize) % len);
                shuffled.reverse();
            }
            let table = RelatedCapabilities::default();
            let room = Room {
                id: "r".into(),
                label: "Rom".into(),
                capabilities: capabilities.into_iter().chain(["Rehab Equipment".to_string()]).collect(),
                beds: Vec::new(),
            };
            let mut a = entry("x", priority, &[]);
            a.needs = needs;
            let mut b = a.clone();
            b.needs = shuffled;

            prop_assert_eq!(score_candidate(&a, &room, &table), score_candidate(&b, &room, &table));
        }

        #[test]
        fn ranking_respects_limit_and_positive_scores(
            specs in prop::collection::vec((any_priority(), any_needs()), 0..8),
            rooms in prop::collection::vec((any_needs(), 1usize..3), 0..6),
            limit in 0usize..8,
        ) {
            let entries: Vec<WaitingListEntry> = specs
                .into_iter()
                .enumerate()
                .map(|(i, (priority, needs))| {
                    let mut e = entry(&format!("e{i}"), priority, &[]);
                    e.needs = needs;
                    e
                })
                .collect();
            let rooms: Vec<Room> = rooms
                .into_iter()
                .enumerate()
                .map(|(i, (capabilities, beds))| {
                    let caps: Vec<&str> = capabilities.iter().map(String::as_str).collect();
                    room(&format!("r{i}"), &caps, beds)
                })
                .collect();

            let suggestions = rank_suggestions(&entries, &rooms, limit, &RelatedCapabilities::default());
            prop_assert!(suggestions.len() <= limit);

            let mut pairs = HashSet::new();
            for s in &suggestions {
                prop_assert!(s.score > 0);
                prop_assert!(pairs.insert((s.entry_id.clone(), s.room_id.clone())));
            }
            for pair in suggestions.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
