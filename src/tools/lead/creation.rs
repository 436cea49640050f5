//! Customer lead creation (sensitive)

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::core::{Result, ToolDefinition, ToolSafety};
use crate::crm::{CrmError, LeadDirectory, NewLead};
use crate::tools::lead::{crm_failure, non_blank, parse_arguments};
use crate::tools::registry::{Tool, ToolOutput};
use crate::tools::validation::{normalize_phone, validate_customer_info};

pub const NAME: &str = "customer_lead_creation";

#[derive(Debug, Deserialize)]
struct CreationArgs {
    customer_name: String,
    customer_phone: String,
    customer_civil: String,
    customer_email: String,
    #[serde(default)]
    location: Option<String>,
}

/// Creates a lead after validating the customer's details
pub struct LeadCreationTool {
    directory: Arc<dyn LeadDirectory>,
}

impl LeadCreationTool {
    pub fn new(directory: Arc<dyn LeadDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for LeadCreationTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            NAME,
            "Create a new customer lead after validating the customer information and checking \
             that no identifier is already associated with another customer.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "customer_name": { "type": "string", "description": "Customer name" },
                    "customer_phone": { "type": "string", "description": "Customer phone number with country code" },
                    "customer_civil": { "type": "string", "description": "Customer 12-digit civil ID" },
                    "customer_email": { "type": "string", "description": "Customer email address" },
                    "location": { "type": "string", "description": "Showroom or city the lead belongs to" }
                },
                "required": ["customer_name", "customer_phone", "customer_civil", "customer_email"]
            }),
        )
    }

    fn safety(&self) -> ToolSafety {
        ToolSafety::Sensitive
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let args: CreationArgs = parse_arguments(arguments)?;

        if let Err(problem) = validate_customer_info(
            Some(&args.customer_phone),
            Some(&args.customer_civil),
            Some(&args.customer_email),
        ) {
            return Ok(ToolOutput::Text(problem.to_string()));
        }

        let lead = NewLead {
            name: args.customer_name.trim().to_lowercase(),
            phone_number: normalize_phone(&args.customer_phone),
            email: args.customer_email.trim().to_lowercase(),
            civil_id: args.customer_civil,
            location: non_blank(args.location),
        };

        match self.directory.create_lead(lead).await {
            Ok(record) => {
                info!(lead_id = %record.id, "lead creation tool succeeded");
                Ok(ToolOutput::Json(serde_json::json!({
                    "status": "Lead creation successful.",
                    "lead_id": record.id,
                })))
            }
            Err(conflict @ CrmError::Conflict { .. }) => Ok(ToolOutput::Text(conflict.to_string())),
            Err(CrmError::Validation(problem)) => Ok(ToolOutput::Text(problem)),
            Err(other) => Err(crm_failure(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::InMemoryLeadDirectory;

    fn args(name: &str, phone: &str, civil: &str, email: &str) -> serde_json::Value {
        serde_json::json!({
            "customer_name": name,
            "customer_phone": phone,
            "customer_civil": civil,
            "customer_email": email
        })
    }

    #[tokio::test]
    async fn test_creates_lead() {
        let directory = Arc::new(InMemoryLeadDirectory::new());
        let tool = LeadCreationTool::new(directory.clone());

        let out = tool
            .invoke(&args("John Doe", "+1-202-555-0134", "123456789012", "john@x.com"))
            .await
            .unwrap();

        let ToolOutput::Json(value) = out else {
            panic!("expected JSON output");
        };
        assert_eq!(value["status"], "Lead creation successful.");
        let stored = directory.all().await;
        assert_eq!(stored[0].name, "john doe");
        assert_eq!(stored[0].phone_number, "+12025550134");
    }

    #[tokio::test]
    async fn test_conflict_is_reported_as_text() {
        let directory = Arc::new(InMemoryLeadDirectory::new());
        let tool = LeadCreationTool::new(directory.clone());
        tool.invoke(&args("John Doe", "+12025550134", "123456789012", "john@x.com"))
            .await
            .unwrap();

        let out = tool
            .invoke(&args("Jane Roe", "+1 202 555 0134", "999999999999", "jane@x.com"))
            .await
            .unwrap();
        assert_eq!(
            out.render(),
            "This +12025550134 already associated with john doe. Kindly provide your phone number"
        );
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_email_is_stored_lowercase_and_deduplicated() {
        let directory = Arc::new(InMemoryLeadDirectory::new());
        let tool = LeadCreationTool::new(directory.clone());
        tool.invoke(&args("John Doe", "+12025550134", "123456789012", "John@X.com"))
            .await
            .unwrap();
        assert_eq!(directory.all().await[0].email, "john@x.com");

        let out = tool
            .invoke(&args("Jane Roe", "+12025550199", "999999999999", "john@x.com"))
            .await
            .unwrap();
        assert_eq!(
            out.render(),
            "This john@x.com already associated with john doe. Kindly provide your email"
        );
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_field_is_reported_as_text() {
        let tool = LeadCreationTool::new(Arc::new(InMemoryLeadDirectory::new()));
        let out = tool
            .invoke(&args("John Doe", "+12025550134", "123", "john@x.com"))
            .await
            .unwrap();
        assert!(out.render().contains("Civil ID '123' is invalid"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_error() {
        let tool = LeadCreationTool::new(Arc::new(InMemoryLeadDirectory::new()));
        let result = tool
            .invoke(&serde_json::json!({"customer_name": "John Doe"}))
            .await;
        assert!(result.is_err());
    }
}
