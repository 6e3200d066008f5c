//! Name service rules for registering domains.
//!
//! A domain `label.parent` may be created only if:
//!
//! - the full name is at most 253 characters;
//! - `normalizedLabel` is the lowercase form of `label`;
//! - identity records, if present, point at the submitter;
//! - top-level domains are registered by the system identity;
//! - subdomains do not themselves open registration, their parent exists,
//!   and a closed parent only admits its own owner;
//! - a preorder with `sha256d(preorderSalt ‖ full name)` exists.

use super::{DataTrigger, DataTriggerContext, DataTriggerError, DataTriggerExecutionResult};
use crate::domain::transitions::wire::{bytes_to_value, value_to_bytes};
use crate::domain::DocumentTransition;
use crate::ports::outbound::DocumentQuery;
use async_trait::async_trait;
use serde_json::{Map, Value};
use shared_types::{sha256d, Hash, Identifier};

pub const DOMAIN: &str = "domain";
pub const PREORDER: &str = "preorder";

/// Longest registrable full domain name.
pub const MAX_FULL_DOMAIN_NAME_LENGTH: usize = 253;

/// `sha256d(salt ‖ full domain name)`, the preorder commitment.
pub fn salted_domain_hash(salt: &[u8], full_domain_name: &str) -> Hash {
    let mut preimage = salt.to_vec();
    preimage.extend_from_slice(full_domain_name.as_bytes());
    sha256d(&preimage)
}

fn text<'a>(data: &'a Map<String, Value>, field: &str) -> Result<&'a str, DataTriggerError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| DataTriggerError::InvalidDocument(format!("{field} must be a string")))
}

/// Domain creation rules.
pub struct DomainCreateTrigger;

#[async_trait]
impl DataTrigger for DomainCreateTrigger {
    fn name(&self) -> &'static str {
        "dpns_domain_create"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerContext<'_>,
        top_level_identity: Option<&Identifier>,
    ) -> Result<DataTriggerExecutionResult, DataTriggerError> {
        let DocumentTransition::Create(create) = transition else {
            return Err(DataTriggerError::MalformedResult(format!(
                "domain create trigger bound to {} transition",
                transition.action().name()
            )));
        };
        let data = &create.data;
        let label = text(data, "label")?;
        let normalized_label = text(data, "normalizedLabel")?;
        let parent = text(data, "normalizedParentDomainName")?;
        let salt = data
            .get("preorderSalt")
            .and_then(value_to_bytes)
            .ok_or_else(|| DataTriggerError::InvalidDocument("preorderSalt must be bytes".into()))?;

        let full_domain_name = if parent.is_empty() {
            normalized_label.to_string()
        } else {
            format!("{normalized_label}.{parent}")
        };

        let mut result = DataTriggerExecutionResult::new();

        if full_domain_name.chars().count() > MAX_FULL_DOMAIN_NAME_LENGTH {
            result.fail(
                context,
                transition,
                format!(
                    "Full domain name length can not be more than {MAX_FULL_DOMAIN_NAME_LENGTH} characters long"
                ),
            );
        }

        if normalized_label != label.to_lowercase() {
            result.fail(context, transition, "Normalized label doesn't match label");
        }

        for record in ["dashUniqueIdentityId", "dashAliasIdentityId"] {
            let Some(value) = data.get("records").and_then(|records| records.get(record)) else {
                continue;
            };
            if Identifier::from_value(value).ok().as_ref() != Some(context.owner_id) {
                result.fail(
                    context,
                    transition,
                    format!("ownerId doesn't match {record}"),
                );
            }
        }

        let allows_subdomains = data
            .get("subdomainRules")
            .and_then(|rules| rules.get("allowSubdomains"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if parent.is_empty() {
            if top_level_identity != Some(context.owner_id) {
                result.fail(
                    context,
                    transition,
                    "Can't create top level domain for this identity",
                );
            }
        } else {
            if allows_subdomains {
                result.fail(
                    context,
                    transition,
                    "Allowing subdomains registration is forbidden for non top level domains",
                );
            }

            let (parent_label, grandparent) = parent.split_once('.').unwrap_or((parent, ""));
            let query = DocumentQuery::all()
                .where_eq("normalizedParentDomainName", Value::from(grandparent))
                .where_eq("normalizedLabel", Value::from(parent_label));
            let parents = context
                .repository
                .fetch_documents(&context.contract.id, DOMAIN, &query)
                .await?;
            match parents.first() {
                None => result.fail(context, transition, "Parent domain is not present"),
                Some(parent_domain) => {
                    let open = parent_domain
                        .get("subdomainRules.allowSubdomains")
                        .and_then(|value| value.as_bool())
                        .unwrap_or(false);
                    if !open && parent_domain.owner_id != *context.owner_id {
                        result.fail(
                            context,
                            transition,
                            "The subdomain can be created only by the parent domain owner",
                        );
                    }
                }
            }
        }

        let salted = salted_domain_hash(&salt, &full_domain_name);
        let query = DocumentQuery::all().where_eq("saltedDomainHash", bytes_to_value(&salted));
        let preorders = context
            .repository
            .fetch_documents(&context.contract.id, PREORDER, &query)
            .await?;
        if preorders.is_empty() {
            result.fail(context, transition, "preorderDocument was not found");
        }

        Ok(result)
    }
}
