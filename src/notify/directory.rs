//! Recipient lookup for the registration form: people and mail-enabled
//! groups with a display name and an address.

use serde::Serialize;

/// Shorter queries return no results.
pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_USERS: usize = 10;
pub const MAX_GROUPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    User,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub display_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn user(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), email: email.into(), kind: EntryKind::User }
    }

    pub fn group(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), email: email.into(), kind: EntryKind::Group }
    }

    /// Case-insensitive substring match on name or address.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.display_name.to_lowercase().contains(&q) || self.email.to_lowercase().contains(&q)
    }
}

/// Users first, then groups, each kind capped.
pub fn cap(entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
    let (users, groups): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.kind == EntryKind::User);
    users.into_iter().take(MAX_USERS).chain(groups.into_iter().take(MAX_GROUPS)).collect()
}

/// `true` when `query` is long enough to search for.
pub fn searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_orders_users_before_groups() {
        let mut entries: Vec<_> = (0..3).map(|i| DirectoryEntry::group(format!("G{i}"), format!("g{i}@x.cl"))).collect();
        entries.extend((0..12).map(|i| DirectoryEntry::user(format!("U{i}"), format!("u{i}@x.cl"))));
        let capped = cap(entries);
        assert_eq!(capped.len(), MAX_USERS + 3);
        assert_eq!(capped[0].display_name, "U0");
        assert_eq!(capped[MAX_USERS].kind, EntryKind::Group);
    }

    #[test]
    fn match_ignores_case_on_name_and_address() {
        let e = DirectoryEntry::user("María Pérez", "mperez@empresa.cl");
        assert!(e.matches("MARÍA"));
        assert!(e.matches("perez@"));
        assert!(!e.matches("juan"));
    }

    #[test]
    fn serialises_like_the_form_expects() {
        let json = serde_json::to_value(DirectoryEntry::group("Cobranzas", "cobranzas@empresa.cl")).unwrap();
        assert_eq!(json["displayName"], "Cobranzas");
        assert_eq!(json["type"], "group");
    }

    #[test]
    fn one_letter_is_not_searchable() {
        assert!(!searchable(" a "));
        assert!(searchable("an"));
        assert!(searchable("ñu"));
    }
}
