//! Alternate decision-maker assignment
//!
//! Rows that share a mail domain belong to the same organization. Each row in
//! such a group gets `other_dm_name` pointing at a colleague, so outreach can
//! mention a second contact.
//!
//! Selection policy: within a group (rows in their original order), row `k`
//! takes the name of the nearest following row, wrapping around, whose
//! display name is non-empty and differs from row `k`'s own name. A row
//! whose colleagues are all unnamed, or all share its own display name, is
//! left without an alternate.

use std::collections::HashMap;

use crate::record::{KnownField, Record};
use crate::website::email_domain;

/// Rows sharing one mail domain, by index into the row list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGroup {
    pub domain: String,
    pub members: Vec<usize>,
}

/// Group rows with an email by mail domain, in first-seen order
pub fn group_by_domain(rows: &[Record]) -> Vec<DomainGroup> {
    let mut groups: Vec<DomainGroup> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(domain) = row.email().and_then(email_domain) else {
            continue;
        };
        match index_of.get(&domain) {
            Some(&g) => groups[g].members.push(i),
            None => {
                index_of.insert(domain.clone(), groups.len());
                groups.push(DomainGroup {
                    domain,
                    members: vec![i],
                });
            }
        }
    }

    groups
}

/// `fullName`, else `firstName lastName`
pub fn display_name(row: &Record) -> Option<String> {
    if let Some(full) = row.known(KnownField::FullName).map(str::trim).filter(|n| !n.is_empty()) {
        return Some(full.to_string());
    }

    let parts: Vec<&str> = [KnownField::FirstName, KnownField::LastName]
        .into_iter()
        .filter_map(|f| row.known(f).map(str::trim).filter(|n| !n.is_empty()))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Set `other_dm_name` on rows whose domain group has a named colleague.
/// Rows are neither removed nor reordered. Returns the number of rows updated.
pub fn assign_alternate_contacts(rows: &mut [Record]) -> usize {
    let names: Vec<Option<String>> = rows.iter().map(display_name).collect();
    let mut assigned = 0;

    for group in group_by_domain(rows) {
        let size = group.members.len();
        if size < 2 {
            continue;
        }

        for (pos, &row_index) in group.members.iter().enumerate() {
            let own = names[row_index].as_deref();
            let alternate = (1..size)
                .map(|offset| group.members[(pos + offset) % size])
                .find_map(|other| names[other].as_deref().filter(|name| Some(*name) != own));

            if let Some(name) = alternate {
                rows[row_index].set_known(KnownField::OtherDmName, name);
                assigned += 1;
            }
        }
    }

    assigned
}
