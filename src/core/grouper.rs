/// Range grouper — regroups transitions into contiguous per-key runs.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::schema::ids::{KeyId, OptionId};
use crate::schema::layout::{FormatError, MAX_IDS};
use crate::schema::record::{KeyRange, Table, Transition};

/// Order of the per-key runs in the Options section.
///
/// Both orders are stable: within a run, transitions keep input order, so
/// identical input always yields an identical blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OptionOrder {
    /// Runs sorted by ascending key ID.
    #[default]
    Ascending,
    /// Runs sorted by descending key ID (the order of the original tables).
    Descending,
}

impl FromStr for OptionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(format!("unknown option order: {}", other)),
        }
    }
}

impl fmt::Display for OptionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        })
    }
}

/// Transitions in storage order plus each key's inclusive option range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedOptions {
    pub options: Vec<Transition>,
    /// Indexed by key ID. Keys with no outgoing transitions hold `KeyRange::EMPTY`.
    pub ranges: Vec<KeyRange>,
}

impl GroupedOptions {
    pub fn range(&self, key: KeyId) -> Option<KeyRange> {
        self.ranges.get(key.index()).copied()
    }

    /// The transitions leaving `key`, in storage order.
    pub fn options_of(&self, key: KeyId) -> &[Transition] {
        match self.range(key) {
            Some(range) if !range.is_empty() => {
                &self.options[range.first.index()..=range.last.index()]
            }
            _ => &[],
        }
    }
}

/// Group transitions by originating key.
///
/// `key_count` is the number of interned keys; keys that never originate a
/// transition still get a (empty) range so the Keys section stays dense.
pub fn group(
    mut transitions: Vec<Transition>,
    key_count: usize,
    order: OptionOrder,
) -> Result<GroupedOptions, FormatError> {
    if transitions.len() > MAX_IDS {
        return Err(FormatError::TooManyIds {
            table: Table::Options,
            count: transitions.len(),
            limit: MAX_IDS,
        });
    }

    // sort_by_key is stable, which keeps input order inside each run.
    match order {
        OptionOrder::Ascending => transitions.sort_by_key(|t| t.this_key),
        OptionOrder::Descending => transitions.sort_by_key(|t| Reverse(t.this_key)),
    }

    let mut ranges = vec![KeyRange::EMPTY; key_count];
    for (index, transition) in transitions.iter().enumerate() {
        let id = OptionId(index as u16);
        let key = transition.this_key.index();
        if key >= ranges.len() {
            ranges.resize(key + 1, KeyRange::EMPTY);
        }
        let range = &mut ranges[key];
        if range.is_empty() {
            *range = KeyRange::single(id);
        } else {
            range.last = id;
        }
    }

    log::debug!(
        "grouped {} options into {} key ranges ({} order)",
        transitions.len(),
        ranges.len(),
        order
    );

    Ok(GroupedOptions {
        options: transitions,
        ranges,
    })
}
