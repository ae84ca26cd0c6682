//! Record set differ.
//!
//! Compares the live record set with the desired one and produces the
//! changes needed to converge, grouped by `(owner, type)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// What a [`RecordChange`] does to its rrset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Addition,
    Update,
    Deletion,
}

/// One change to converge an rrset.
///
/// `old` lists the live records to remove, `new` the records to create.
/// Records present on both sides are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub kind: ChangeKind,
    pub owner: String,
    pub rtype: String,
    pub old: Vec<Record>,
    pub new: Vec<Record>,
}

impl RecordChange {
    /// Human-readable description, also the input of the correction id.
    pub fn message(&self) -> String {
        match self.kind {
            ChangeKind::Addition => format!("+ CREATE {}", join_records(&self.new)),
            ChangeKind::Deletion => format!("- DELETE {}", join_records(&self.old)),
            ChangeKind::Update => format!(
                "± MODIFY {} {}: {} → {}",
                self.owner,
                self.rtype,
                join_rdata(&self.old),
                join_rdata(&self.new)
            ),
        }
    }
}

fn join_records(records: &[Record]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_rdata(records: &[Record]) -> String {
    let parts: Vec<String> = records
        .iter()
        .map(|r| format!("{} (ttl {})", r.data.to_presentation(), r.ttl))
        .collect();
    format!("[{}]", parts.join(", "))
}

type RrsetKey = (String, String);

/// Remove one element equal to `item` from `pool`, reporting whether it was there.
fn take_one(pool: &mut Vec<Record>, item: &Record) -> bool {
    if let Some(pos) = pool.iter().position(|r| r == item) {
        pool.swap_remove(pos);
        true
    } else {
        false
    }
}

/// Diff two record sets.
///
/// Records are compared as multisets of whole records (TTL included), per
/// `(lowercased owner, type)`. A group losing and gaining records becomes a
/// single `Update`; groups only gaining become one `Addition` per record,
/// groups only losing one `Deletion` per record.
///
/// Output order: deletions, updates, additions, each sorted by owner then type.
pub fn diff_records(existing: &[Record], desired: &[Record]) -> Vec<RecordChange> {
    let mut groups: BTreeMap<RrsetKey, (Vec<Record>, Vec<Record>)> = BTreeMap::new();

    for r in existing {
        groups
            .entry((r.name.to_ascii_lowercase(), r.rtype().to_string()))
            .or_default()
            .0
            .push(r.clone());
    }
    for r in desired {
        groups
            .entry((r.name.to_ascii_lowercase(), r.rtype().to_string()))
            .or_default()
            .1
            .push(r.clone());
    }

    let mut deletions = Vec::new();
    let mut updates = Vec::new();
    let mut additions = Vec::new();

    for ((owner, rtype), (live, wanted)) in groups {
        let mut removed = live;
        let mut added = Vec::new();
        for r in wanted {
            if !take_one(&mut removed, &r) {
                added.push(r);
            }
        }
        // swap_remove shuffles; restore a stable order for messages.
        removed.sort_by_key(ToString::to_string);

        match (removed.is_empty(), added.is_empty()) {
            (true, true) => {}
            (true, false) => additions.extend(added.into_iter().map(|r| RecordChange {
                kind: ChangeKind::Addition,
                owner: owner.clone(),
                rtype: rtype.clone(),
                old: Vec::new(),
                new: vec![r],
            })),
            (false, true) => deletions.extend(removed.into_iter().map(|r| RecordChange {
                kind: ChangeKind::Deletion,
                owner: owner.clone(),
                rtype: rtype.clone(),
                old: vec![r],
                new: Vec::new(),
            })),
            (false, false) => updates.push(RecordChange {
                kind: ChangeKind::Update,
                owner,
                rtype,
                old: removed,
                new: added,
            }),
        }
    }

    deletions.into_iter().chain(updates).chain(additions).collect()
}
