//! # Basic (Structural) Validation
//!
//! Stateless checks over raw wire input. Binary fields are first brought
//! to their canonical byte-array form, then each kind runs its own
//! [`ValidationPipeline`]: schema and protocol version halt immediately,
//! semantic checks accumulate. A transition that passes is decoded into
//! its typed form and attached as result data.

use super::pipeline::{PipelineOutcome, ValidationPipeline};
use super::{data_contract, documents, identity};
use crate::config::PlatformConfig;
use crate::domain::transitions::wire::decode_text_fields;
use crate::domain::{ConsensusError, StateTransition, StateTransitionType, ValidationResult};
use crate::ports::outbound::SchemaValidator;
use crate::schema::PatternEngine;
use serde_json::Value;
use tracing::debug;

/// Everything a basic check may read.
pub struct BasicContext<'a> {
    /// Wire object with canonical binaries.
    pub raw: &'a Value,
    pub config: &'a PlatformConfig,
    pub schemas: &'a dyn SchemaValidator,
    pub patterns: &'a PatternEngine,
}

/// Pipeline of basic checks for one transition kind.
pub fn basic_pipeline<'a>(kind: StateTransitionType) -> ValidationPipeline<BasicContext<'a>> {
    match kind {
        StateTransitionType::DataContractCreate => data_contract::basic_pipeline(),
        StateTransitionType::DocumentsBatch => documents::basic_pipeline(),
        StateTransitionType::IdentityCreate => identity::create_basic_pipeline(),
        StateTransitionType::IdentityTopUp => identity::top_up_basic_pipeline(),
    }
}

/// Structurally validate raw input.
///
/// A missing or unknown `type` is a consensus error here, since raw input
/// is untrusted. On success the decoded transition is the result data.
pub fn validate_basic(
    raw: &Value,
    config: &PlatformConfig,
    schemas: &dyn SchemaValidator,
    patterns: &PatternEngine,
) -> ValidationResult<StateTransition> {
    let raw_type = raw.get("type").and_then(Value::as_u64);
    let kind = match raw_type.map(StateTransitionType::try_from) {
        Some(Ok(kind)) => kind,
        Some(Err(unknown)) => {
            return ValidationResult::with_error(ConsensusError::InvalidStateTransitionType(Some(
                unknown,
            )))
        }
        None => return ValidationResult::with_error(ConsensusError::InvalidStateTransitionType(None)),
    };

    let mut normalized = raw.clone();
    decode_text_fields(&mut normalized, kind.binary_fields());

    let context = BasicContext {
        raw: &normalized,
        config,
        schemas,
        patterns,
    };
    let PipelineOutcome {
        result,
        executed,
        halted_at,
    } = basic_pipeline(kind).run(&context);

    debug!(
        transition_type = %kind,
        steps = executed.len(),
        halted_at = halted_at.unwrap_or("-"),
        errors = result.errors().len(),
        "Basic validation finished"
    );

    if !result.is_valid() {
        return ValidationResult::with_errors(result.into_errors());
    }

    match StateTransition::from_object(normalized) {
        Ok(transition) => ValidationResult::with_data(transition),
        Err(e) => ValidationResult::with_error(ConsensusError::JsonSchema {
            message: e.to_string(),
        }),
    }
}

/// Protocol version within `[minimum, latest]`.
pub(crate) fn check_protocol_version(context: &BasicContext<'_>) -> ValidationResult {
    let Some(version) = context
        .raw
        .get("protocolVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
    else {
        return ValidationResult::with_error(ConsensusError::JsonSchema {
            message: "protocolVersion must be an unsigned 32-bit integer".into(),
        });
    };
    let config = context.config;
    if version > config.latest_protocol_version {
        ValidationResult::with_error(ConsensusError::UnsupportedProtocolVersion {
            version,
            latest: config.latest_protocol_version,
        })
    } else if version < config.minimum_protocol_version {
        ValidationResult::with_error(ConsensusError::IncompatibleProtocolVersion {
            version,
            minimum: config.minimum_protocol_version,
        })
    } else {
        ValidationResult::new()
    }
}
