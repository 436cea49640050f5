//! Customer and lead directory
//!
//! The lookup and mutation service the lead tools run against. The
//! production deployment sits on a graph database; the dialog core only
//! depends on the [`LeadDirectory`] contract defined here.

pub mod matching;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use matching::{similar_names, NameMatch};
pub use memory::InMemoryLeadDirectory;

/// A stored lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub civil_id: String,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a lead about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub civil_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Identifying fields a lead can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierField {
    Phone,
    CivilId,
    Email,
}

impl IdentifierField {
    /// Lookup order used when reporting which identifier is already taken
    pub const PRIORITY: [IdentifierField; 3] = [
        IdentifierField::Phone,
        IdentifierField::CivilId,
        IdentifierField::Email,
    ];

    pub fn value_of<'a>(&self, lead: &'a LeadRecord) -> &'a str {
        match self {
            IdentifierField::Phone => &lead.phone_number,
            IdentifierField::CivilId => &lead.civil_id,
            IdentifierField::Email => &lead.email,
        }
    }

    /// Whether `lead` carries `value` in this field; emails ignore case
    pub fn holds(&self, lead: &LeadRecord, value: &str) -> bool {
        let current = self.value_of(lead);
        match self {
            IdentifierField::Email => current.eq_ignore_ascii_case(value),
            _ => current == value,
        }
    }
}

impl std::fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierField::Phone => write!(f, "phone number"),
            IdentifierField::CivilId => write!(f, "civil ID"),
            IdentifierField::Email => write!(f, "email"),
        }
    }
}

/// Exact-match query; absent fields are not constrained
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub civil_id: Option<String>,
    pub email: Option<String>,
}

impl LeadQuery {
    /// Supplied identifiers in lookup priority order
    pub fn identifiers(&self) -> Vec<(IdentifierField, &str)> {
        let mut out = Vec::new();
        if let Some(phone) = self.phone.as_deref() {
            out.push((IdentifierField::Phone, phone));
        }
        if let Some(civil_id) = self.civil_id.as_deref() {
            out.push((IdentifierField::CivilId, civil_id));
        }
        if let Some(email) = self.email.as_deref() {
            out.push((IdentifierField::Email, email));
        }
        out
    }

    /// Whether `lead` satisfies every supplied constraint
    pub fn matches(&self, lead: &LeadRecord) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map(|n| n.to_lowercase() == lead.name.to_lowercase())
            .unwrap_or(true);
        name_ok
            && self
                .identifiers()
                .into_iter()
                .all(|(field, value)| field.holds(lead, value))
    }
}

/// Directory failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrmError {
    /// An identifier is already attached to another lead
    #[error("This {value} already associated with {owner}. Kindly provide your {field}")]
    Conflict {
        field: IdentifierField,
        value: String,
        owner: String,
    },

    /// Input rejected by the directory
    #[error("{0}")]
    Validation(String),

    /// Backend could not be reached or failed
    #[error("Lead directory unavailable: {0}")]
    Unavailable(String),
}

/// Contract of the customer/lead lookup and mutation service
#[async_trait]
pub trait LeadDirectory: Send + Sync {
    /// Names of every stored lead
    async fn lead_names(&self) -> Result<Vec<String>, CrmError>;

    /// First lead satisfying every constraint of `query`
    async fn find_exact(&self, query: &LeadQuery) -> Result<Option<LeadRecord>, CrmError>;

    /// Lead currently holding `value` in `field`
    async fn find_by_identifier(
        &self,
        field: IdentifierField,
        value: &str,
    ) -> Result<Option<LeadRecord>, CrmError>;

    /// Create a lead. Identifiers already held by another lead produce
    /// [`CrmError::Conflict`]; re-creating an identical lead returns the
    /// existing record.
    async fn create_lead(&self, lead: NewLead) -> Result<LeadRecord, CrmError>;
}
