//! Assistant action layer.
//!
//! Named operations exposed to an external conversational runtime. Each
//! action declares its parameter schema for the runtime's planner and
//! returns a plain JSON value. Actions never propagate errors: every
//! failure degrades to a tolerant result shape so the assistant's
//! conversation loop is never blocked by backend trouble.

pub mod actions;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::db::Database;

pub use actions::{
    CheckPendingMeetings, ListFailedCandidates, ListPassedCandidates, ScheduleMeeting,
};

/// Declared parameter of an action, surfaced to the assistant runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

/// Descriptor advertised for one action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

#[async_trait]
pub trait AssistantAction: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Invoke with a JSON parameter object. Always returns a result value,
    /// never an error.
    async fn invoke(&self, params: Value) -> Value;
}

/// Registry of the actions the assistant runtime may call.
pub struct ActionRegistry {
    actions: Vec<Box<dyn AssistantAction>>,
}

impl ActionRegistry {
    pub fn new(db: Database) -> Self {
        Self {
            actions: vec![
                Box::new(ScheduleMeeting::new(db.clone())),
                Box::new(CheckPendingMeetings::new(db.clone())),
                Box::new(ListPassedCandidates::new(db.clone())),
                Box::new(ListFailedCandidates::new(db)),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn AssistantAction> {
        self.actions
            .iter()
            .find(|action| action.name() == name)
            .map(|action| action.as_ref())
    }

    pub fn descriptors(&self) -> Vec<ActionDescriptor> {
        self.actions
            .iter()
            .map(|action| ActionDescriptor {
                name: action.name(),
                description: action.description(),
                parameters: action.parameters(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_lists_all_actions() {
        let registry = ActionRegistry::new(Database::in_memory().unwrap());
        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "scheduleMeeting",
                "checkPendingMeetings",
                "listPassedCandidates",
                "listFailedCandidates"
            ]
        );
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = ActionRegistry::new(Database::in_memory().unwrap());
        assert!(registry.get("scheduleMeeting").is_some());
        assert!(registry.get("unknownAction").is_none());
    }
}
