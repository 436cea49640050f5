//! In-memory lead directory
//!
//! Reference implementation of [`LeadDirectory`]. Creation checks and
//! inserts under one write lock, so concurrent threads cannot both claim
//! the same identifier.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{CrmError, IdentifierField, LeadDirectory, LeadQuery, LeadRecord, NewLead};

#[derive(Debug, Default)]
pub struct InMemoryLeadDirectory {
    leads: RwLock<Vec<LeadRecord>>,
}

impl InMemoryLeadDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory with existing leads
    pub fn with_leads(leads: Vec<LeadRecord>) -> Self {
        Self {
            leads: RwLock::new(leads),
        }
    }

    /// Snapshot of every stored lead
    pub async fn all(&self) -> Vec<LeadRecord> {
        self.leads.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.leads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.leads.read().await.is_empty()
    }
}

fn same_lead(existing: &LeadRecord, lead: &NewLead) -> bool {
    existing.name == lead.name
        && existing.phone_number == lead.phone_number
        && existing.email.eq_ignore_ascii_case(&lead.email)
        && existing.civil_id == lead.civil_id
}

#[async_trait]
impl LeadDirectory for InMemoryLeadDirectory {
    async fn lead_names(&self) -> Result<Vec<String>, CrmError> {
        Ok(self.leads.read().await.iter().map(|l| l.name.clone()).collect())
    }

    async fn find_exact(&self, query: &LeadQuery) -> Result<Option<LeadRecord>, CrmError> {
        Ok(self
            .leads
            .read()
            .await
            .iter()
            .find(|lead| query.matches(lead))
            .cloned())
    }

    async fn find_by_identifier(
        &self,
        field: IdentifierField,
        value: &str,
    ) -> Result<Option<LeadRecord>, CrmError> {
        Ok(self
            .leads
            .read()
            .await
            .iter()
            .find(|lead| field.holds(lead, value))
            .cloned())
    }

    async fn create_lead(&self, lead: NewLead) -> Result<LeadRecord, CrmError> {
        let mut leads = self.leads.write().await;

        if let Some(existing) = leads.iter().find(|l| same_lead(l, &lead)) {
            return Ok(existing.clone());
        }

        for field in IdentifierField::PRIORITY {
            let value = match field {
                IdentifierField::Phone => &lead.phone_number,
                IdentifierField::CivilId => &lead.civil_id,
                IdentifierField::Email => &lead.email,
            };
            if let Some(owner) = leads.iter().find(|l| field.holds(l, value)) {
                return Err(CrmError::Conflict {
                    field,
                    value: value.clone(),
                    owner: owner.name.clone(),
                });
            }
        }

        let record = LeadRecord {
            id: Uuid::new_v4().to_string(),
            name: lead.name,
            phone_number: lead.phone_number,
            email: lead.email,
            civil_id: lead.civil_id,
            location: lead.location,
            created_at: Utc::now(),
        };
        info!(lead_id = %record.id, "lead created");
        leads.push(record.clone());
        Ok(record)
    }
}
