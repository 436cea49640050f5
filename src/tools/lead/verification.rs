//! Customer existence verification (safe)
//!
//! Read-only lookup the lead agent runs before proposing a lead creation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::{Result, ToolDefinition, ToolSafety};
use crate::crm::{similar_names, LeadDirectory, LeadQuery};
use crate::tools::lead::{crm_failure, non_blank, parse_arguments};
use crate::tools::registry::{Tool, ToolOutput};
use crate::tools::validation::{normalize_phone, validate_customer_info};

pub const NAME: &str = "customer_existence_verification";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerificationArgs {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    civil_id: Option<String>,
}

/// Checks whether a customer is already known
pub struct CustomerVerificationTool {
    directory: Arc<dyn LeadDirectory>,
    name_threshold: f64,
}

impl CustomerVerificationTool {
    pub fn new(directory: Arc<dyn LeadDirectory>, name_threshold: f64) -> Self {
        Self {
            directory,
            name_threshold,
        }
    }

    async fn verify_by_name(&self, name: &str) -> Result<String> {
        let names = self.directory.lead_names().await.map_err(crm_failure)?;
        let matches = similar_names(name, &names, self.name_threshold);

        if matches.is_empty() {
            return Ok(format!(
                "No matching results were found for the name '{}'. Please review or confirm the provided details. Would you like to create a new lead instead?",
                name
            ));
        }

        let listed: Vec<String> = matches.into_iter().map(|m| format!("'{}'", m.name)).collect();
        Ok(format!(
            "The provided Name is associated with the following customer(s): [{}]. Would you like to proceed with one of these customers, or would you prefer to create a new lead?",
            listed.join(", ")
        ))
    }

    async fn verify_by_identifiers(&self, query: LeadQuery) -> Result<String> {
        let display_name = query.name.clone().unwrap_or_else(|| "the customer".to_string());

        if let Some(lead) = self.directory.find_exact(&query).await.map_err(crm_failure)? {
            return Ok(format!(
                "A customer named '{}' already exists in our system with matching details (Phone: {}, Email: {}, Civil ID: {}). Would you like to proceed with this customer, or create a new lead?",
                lead.name, lead.phone_number, lead.email, lead.civil_id
            ));
        }

        // Only the highest-priority identifier is reported on a miss.
        let Some((field, value)) = query.identifiers().into_iter().next() else {
            return Ok(format!(
                "No customer named '{}' was found. Would you like to create a new lead?",
                display_name
            ));
        };

        match self
            .directory
            .find_by_identifier(field, value)
            .await
            .map_err(crm_failure)?
        {
            Some(owner) => Ok(format!(
                "I have identified that the {} you provided is associated with {}. Could you please confirm or provide the correct {} for {}?",
                field, owner.name, field, display_name
            )),
            None => Ok(format!(
                "I was unable to locate the {} ({}) in our system. Would you like to proceed with creating a new lead?",
                field, value
            )),
        }
    }
}

#[async_trait]
impl Tool for CustomerVerificationTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            NAME,
            "Verify the existence of the customer in our database before lead creation. \
             Every parameter is optional; supply whatever the user provided.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Customer's name" },
                    "email": { "type": "string", "description": "Customer's email" },
                    "phone": { "type": "string", "description": "Customer's phone with country code" },
                    "civil_id": { "type": "string", "description": "Customer's 12-digit civil ID" }
                }
            }),
        )
    }

    fn safety(&self) -> ToolSafety {
        ToolSafety::Safe
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let args: VerificationArgs = parse_arguments(arguments)?;
        let name = non_blank(args.name);
        let email = non_blank(args.email);
        let phone = non_blank(args.phone);
        let civil_id = non_blank(args.civil_id);

        if let Err(problem) =
            validate_customer_info(phone.as_deref(), civil_id.as_deref(), email.as_deref())
        {
            return Ok(ToolOutput::Text(problem.to_string()));
        }

        let has_identifiers = phone.is_some() || civil_id.is_some() || email.is_some();
        let message = if has_identifiers {
            self.verify_by_identifiers(LeadQuery {
                name,
                phone: phone.as_deref().map(normalize_phone),
                civil_id,
                email,
            })
            .await?
        } else if let Some(name) = name.as_deref() {
            self.verify_by_name(name).await?
        } else {
            "Please provide at least the customer's name, phone number, email or civil ID to verify."
                .to_string()
        };

        Ok(ToolOutput::Text(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{InMemoryLeadDirectory, LeadRecord};
    use chrono::Utc;

    fn tool() -> CustomerVerificationTool {
        let directory = InMemoryLeadDirectory::with_leads(vec![LeadRecord {
            id: "lead-1".into(),
            name: "jane roe".into(),
            phone_number: "+12025550199".into(),
            email: "jane@x.com".into(),
            civil_id: "999999999999".into(),
            location: None,
            created_at: Utc::now(),
        }]);
        CustomerVerificationTool::new(Arc::new(directory), 0.86)
    }

    async fn run(args: serde_json::Value) -> String {
        tool().invoke(&args).await.unwrap().render()
    }

    #[tokio::test]
    async fn test_name_only_uses_fuzzy_match() {
        let found = run(serde_json::json!({"name": "Jane"})).await;
        assert!(found.contains("'jane roe'"));

        let missing = run(serde_json::json!({"name": "Bartholomew"})).await;
        assert!(missing.starts_with("No matching results were found for the name 'Bartholomew'"));
    }

    #[tokio::test]
    async fn test_exact_match_reports_details() {
        let out = run(serde_json::json!({
            "name": "Jane Roe",
            "phone": "+1-202-555-0199",
            "email": "jane@x.com"
        }))
        .await;
        assert!(out.starts_with("A customer named 'jane roe' already exists"));
    }

    #[tokio::test]
    async fn test_identifier_owned_by_someone_else() {
        let out = run(serde_json::json!({
            "name": "John Doe",
            "phone": "+1 202 555 0199",
            "civil_id": "123456789012"
        }))
        .await;
        assert_eq!(
            out,
            "I have identified that the phone number you provided is associated with jane roe. Could you please confirm or provide the correct phone number for John Doe?"
        );
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let out = run(serde_json::json!({"name": "John Doe", "email": "john@x.com", "phone": ""})).await;
        assert_eq!(
            out,
            "I was unable to locate the email (john@x.com) in our system. Would you like to proceed with creating a new lead?"
        );
    }

    #[tokio::test]
    async fn test_validation_failure_is_text() {
        let out = run(serde_json::json!({"name": "John", "civil_id": "12"})).await;
        assert!(out.contains("exactly 12 digits"));
    }
}
