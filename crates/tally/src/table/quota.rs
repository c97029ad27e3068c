use serde::{Deserialize, Serialize};

use crate::common::Map;
use crate::table::{parse_key_value_lines, report_malformed};

/// Maps account names to their quota, in weighted CPU-seconds.
///
/// An account without an entry has quota 0, so any usage at all puts it over quota.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTable {
    quotas: Map<String, u64>,
}

impl QuotaTable {
    /// Parses `account,quota` lines. Malformed lines are logged and skipped.
    /// If an account is listed more than once, the first entry wins.
    pub fn load(text: &str) -> Self {
        let (records, malformed) = parse_key_value_lines(text, parse_quota);
        report_malformed("account quota", &malformed);
        Self::from_entries(records)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut quotas = Map::default();
        for (account, quota) in entries {
            quotas.entry(account.into()).or_insert(quota);
        }
        Self { quotas }
    }

    pub fn quota_of(&self, account: &str) -> u64 {
        self.quotas.get(account).copied().unwrap_or(0)
    }

    pub fn contains(&self, account: &str) -> bool {
        self.quotas.contains_key(account)
    }

    /// All `(account, quota)` entries, sorted by account name.
    pub fn entries(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self
            .quotas
            .iter()
            .map(|(account, quota)| (account.as_str(), *quota))
            .collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.quotas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }
}

fn parse_quota(value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("quota `{value}` is not a non-negative integer"))
}
