use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A sales opportunity. The record store assigns `id` and owns the
/// durable copy; everything here is a working-set snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: i64,
    pub title: String,
    /// Monetary value in cents.
    pub value_cents: i64,
    pub stage: Stage,
    /// 0-100, maintained by hand; not derived from the stage.
    pub probability: i16,
    pub contact_id: Option<i64>,
    pub company_id: Option<i64>,
    pub expected_close: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation, stage changes included.
    pub updated_at: DateTime<Utc>,
}

/// Pipeline stage. The declaration order is the pipeline order and is
/// what adjacency validation measures distance against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Stage::Lead,
        Stage::Qualified,
        Stage::Proposal,
        Stage::Negotiation,
        Stage::Won,
        Stage::Lost,
    ];

    /// Index in the pipeline order.
    pub fn position(self) -> usize {
        match self {
            Stage::Lead => 0,
            Stage::Qualified => 1,
            Stage::Proposal => 2,
            Stage::Negotiation => 3,
            Stage::Won => 4,
            Stage::Lost => 5,
        }
    }

    /// Won and lost close a deal; both are reachable from any stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }

    /// Wire key, as the record store serializes it.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Lead => "lead",
            Stage::Qualified => "qualified",
            Stage::Proposal => "proposal",
            Stage::Negotiation => "negotiation",
            Stage::Won => "won",
            Stage::Lost => "lost",
        }
    }

    /// Column header label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Lead => "Lead",
            Stage::Qualified => "Qualified",
            Stage::Proposal => "Proposal",
            Stage::Negotiation => "Negotiation",
            Stage::Won => "Won",
            Stage::Lost => "Lost",
        }
    }

    pub fn from_key(key: &str) -> Option<Stage> {
        Stage::ORDER.iter().copied().find(|s| s.as_str() == key)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
