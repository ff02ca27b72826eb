// 🏷️ Category Gate - Every aligned client needs a category before release
//
// The gate is a precondition check, not a core algorithm: reconciliation
// output may only reach reporting surfaces once every client in the aligned
// client set carries a non-empty category. Checking is idempotent - supply
// the missing assignments and re-check.
//
// Assignments are the only persistent state around the engine: an
// append/update-only SQLite table keyed by client name. The engine itself
// never writes it.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// CLIENT CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCategory {
    /// Ongoing retainer work
    Recurring,

    /// One-off project work
    Project,

    /// Internal, non-billable
    Internal,

    /// Anything that fits nowhere else
    Other,
}

impl ClientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCategory::Recurring => "Recurring",
            ClientCategory::Project => "Project",
            ClientCategory::Internal => "Internal",
            ClientCategory::Other => "Other",
        }
    }

    /// Parse a raw category cell. Italian names from the original budget
    /// sheets are accepted alongside the English ones; any other non-empty
    /// value lands in Other rather than leaving the client uncategorized.
    pub fn parse(raw: &str) -> Option<ClientCategory> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_lowercase();
        let category = match lower.as_str() {
            "recurring" | "ricorrente" => ClientCategory::Recurring,
            "project" | "progetto" => ClientCategory::Project,
            "internal" | "interno" => ClientCategory::Internal,
            _ => ClientCategory::Other,
        };
        Some(category)
    }
}

// ============================================================================
// CATEGORY STORE (SQLite)
// ============================================================================

/// Persistent client → category assignments. Append/update-only.
pub struct CategoryStore {
    conn: Connection,
}

impl CategoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open category store: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // WAL for crash recovery, same as the transaction stores before it
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS client_categories (
                client TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                assigned_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(CategoryStore { conn })
    }

    /// Assign (or re-assign) a category to a client
    pub fn assign(&self, client: &str, category: ClientCategory) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO client_categories (client, category, assigned_at)
                 VALUES (?1, ?2, ?3)",
                params![client, category.as_str(), Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to assign category for client: {}", client))?;
        Ok(())
    }

    pub fn get(&self, client: &str) -> Result<Option<ClientCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category FROM client_categories WHERE client = ?1")?;
        let mut rows = stmt.query(params![client])?;

        match rows.next()? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(ClientCategory::parse(&raw))
            }
            None => Ok(None),
        }
    }

    /// All current assignments, sorted by client
    pub fn get_all(&self) -> Result<BTreeMap<String, ClientCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT client, category FROM client_categories ORDER BY client")?;

        let mut assignments = BTreeMap::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let client: String = row.get(0)?;
            let raw: String = row.get(1)?;
            if let Some(category) = ClientCategory::parse(&raw) {
                assignments.insert(client, category);
            }
        }
        Ok(assignments)
    }

    /// Seed assignments from a budget table's categoria column. Existing
    /// assignments win: the column is a convenience, not an override.
    pub fn seed_from_budget(&self, categories: &BTreeMap<String, String>) -> Result<usize> {
        let mut seeded = 0;
        for (client, raw) in categories {
            if self.get(client)?.is_some() {
                continue;
            }
            if let Some(category) = ClientCategory::parse(raw) {
                self.assign(client, category)?;
                seeded += 1;
            }
        }
        Ok(seeded)
    }
}

// ============================================================================
// GATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    /// Every aligned client is categorized; output may flow downstream
    Ready,

    /// At least one client lacks a category; downstream consumption is
    /// blocked until the listed clients are assigned
    Blocked { missing: Vec<String> },
}

impl GateStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, GateStatus::Ready)
    }
}

/// Check the gate for a set of aligned clients against the current
/// assignments. Pure and idempotent: re-check after supplying the missing
/// categories and it opens.
pub fn check_gate(
    clients: &[String],
    assignments: &BTreeMap<String, ClientCategory>,
) -> GateStatus {
    let missing: Vec<String> = clients
        .iter()
        .filter(|c| !assignments.contains_key(*c))
        .cloned()
        .collect();

    if missing.is_empty() {
        GateStatus::Ready
    } else {
        GateStatus::Blocked { missing }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_aliases() {
        assert_eq!(ClientCategory::parse("ricorrente"), Some(ClientCategory::Recurring));
        assert_eq!(ClientCategory::parse("Recurring"), Some(ClientCategory::Recurring));
        assert_eq!(ClientCategory::parse("progetto"), Some(ClientCategory::Project));
        assert_eq!(ClientCategory::parse("INTERNAL"), Some(ClientCategory::Internal));
        assert_eq!(ClientCategory::parse("varie"), Some(ClientCategory::Other));
        assert_eq!(ClientCategory::parse(""), None);
        assert_eq!(ClientCategory::parse("   "), None);
    }

    #[test]
    fn test_store_assign_and_get() {
        let store = CategoryStore::open_in_memory().unwrap();

        store.assign("Acme", ClientCategory::Recurring).unwrap();
        assert_eq!(store.get("Acme").unwrap(), Some(ClientCategory::Recurring));
        assert_eq!(store.get("Beta").unwrap(), None);

        // Update-only, keyed by client: re-assign wins
        store.assign("Acme", ClientCategory::Project).unwrap();
        assert_eq!(store.get("Acme").unwrap(), Some(ClientCategory::Project));
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_seed_from_budget_does_not_override() {
        let store = CategoryStore::open_in_memory().unwrap();
        store.assign("Acme", ClientCategory::Internal).unwrap();

        let mut from_budget = BTreeMap::new();
        from_budget.insert("Acme".to_string(), "ricorrente".to_string());
        from_budget.insert("Beta".to_string(), "progetto".to_string());

        let seeded = store.seed_from_budget(&from_budget).unwrap();
        assert_eq!(seeded, 1);
        assert_eq!(store.get("Acme").unwrap(), Some(ClientCategory::Internal));
        assert_eq!(store.get("Beta").unwrap(), Some(ClientCategory::Project));
    }

    #[test]
    fn test_gate_blocks_then_opens() {
        let clients = vec!["Acme".to_string(), "Beta".to_string()];
        let mut assignments = BTreeMap::new();
        assignments.insert("Acme".to_string(), ClientCategory::Recurring);

        let status = check_gate(&clients, &assignments);
        assert_eq!(
            status,
            GateStatus::Blocked { missing: vec!["Beta".to_string()] }
        );
        assert!(!status.is_ready());

        // Idempotent re-check after supplying the missing assignment
        assignments.insert("Beta".to_string(), ClientCategory::Other);
        assert_eq!(check_gate(&clients, &assignments), GateStatus::Ready);
        assert_eq!(check_gate(&clients, &assignments), GateStatus::Ready);
    }

    #[test]
    fn test_gate_with_no_clients_is_ready() {
        assert!(check_gate(&[], &BTreeMap::new()).is_ready());
    }
}
