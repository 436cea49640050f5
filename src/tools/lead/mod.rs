//! Lead tools
//!
//! The toolbelt of the lead specialist: a safe existence check and a
//! sensitive creation.

pub mod creation;
pub mod verification;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::core::{LeadflowError, Result};
use crate::crm::{CrmError, LeadDirectory};
use crate::tools::registry::ToolRegistry;

pub use creation::LeadCreationTool;
pub use verification::CustomerVerificationTool;

/// Register both lead tools against `directory`
pub fn register_lead_tools(
    registry: &mut ToolRegistry,
    directory: Arc<dyn LeadDirectory>,
    name_threshold: f64,
) -> Result<()> {
    registry.register(Arc::new(CustomerVerificationTool::new(
        directory.clone(),
        name_threshold,
    )))?;
    registry.register(Arc::new(LeadCreationTool::new(directory)))?;
    Ok(())
}

pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: &serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| LeadflowError::tool(format!("invalid arguments: {}", e)))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn crm_failure(error: CrmError) -> LeadflowError {
    LeadflowError::tool(error.to_string())
}
