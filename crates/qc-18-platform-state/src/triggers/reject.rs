//! Trigger refusing every transition it is bound to.

use super::{DataTrigger, DataTriggerContext, DataTriggerError, DataTriggerExecutionResult};
use crate::domain::DocumentTransition;
use async_trait::async_trait;
use shared_types::Identifier;

/// Refuses the action outright.
pub struct RejectTrigger;

#[async_trait]
impl DataTrigger for RejectTrigger {
    fn name(&self) -> &'static str {
        "reject"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerContext<'_>,
        _top_level_identity: Option<&Identifier>,
    ) -> Result<DataTriggerExecutionResult, DataTriggerError> {
        let mut result = DataTriggerExecutionResult::new();
        result.fail(
            context,
            transition,
            format!("Action {} is not allowed", transition.action().name()),
        );
        Ok(result)
    }
}
