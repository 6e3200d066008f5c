//! Feature flag activation rules.
//!
//! Only the system identity may schedule a flag, and never for a height
//! the platform has already passed.

use super::{DataTrigger, DataTriggerContext, DataTriggerError, DataTriggerExecutionResult};
use crate::domain::DocumentTransition;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::Identifier;
use tracing::debug;

pub const UPDATE_CONSENSUS_PARAMS: &str = "updateConsensusParams";

/// Validates newly created feature flag documents.
pub struct FeatureFlagCreateTrigger;

#[async_trait]
impl DataTrigger for FeatureFlagCreateTrigger {
    fn name(&self) -> &'static str {
        "feature_flag_create"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerContext<'_>,
        top_level_identity: Option<&Identifier>,
    ) -> Result<DataTriggerExecutionResult, DataTriggerError> {
        let enable_at_height = transition
            .data()
            .and_then(|data| data.get("enableAtHeight"))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                DataTriggerError::InvalidDocument("enableAtHeight must be an integer".into())
            })?;
        let block_height = context
            .repository
            .fetch_latest_platform_block_height()
            .await?;
        debug!(enable_at_height, block_height, "Checking feature flag");

        let mut result = DataTriggerExecutionResult::new();
        if enable_at_height < block_height {
            result.fail(
                context,
                transition,
                "This identity can't activate selected feature flag in the past",
            );
        }
        if top_level_identity != Some(context.owner_id) {
            result.fail(
                context,
                transition,
                "This identity can't activate selected feature flag",
            );
        }
        Ok(result)
    }
}
