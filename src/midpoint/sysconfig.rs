//! System configuration changes
//!
//! Everything here patches the single well-known system configuration
//! object. Upserts read the current configuration first and then write; there
//! is no concurrency check between the two, the last writer wins.

use super::client::{MidpointClient, ObjectRef};
use super::delta::{json_modification, json_to_xml, scalar_text, ItemDelta, ModificationType};
use super::document;
use super::endpoints::resolve_endpoint;
use crate::error::{MidpointError, Result};
use serde_json::{json, Value};

pub const SYSTEM_CONFIGURATION_OID: &str = "00000000-0000-0000-0000-000000000001";

const CLASS_LOGGER_PATH: &str = "c:logging/c:classLogger";
const COLLECTION_VIEWS_PATH: &str = "c:adminGuiConfiguration/c:objectCollectionViews";
const HOMEPAGE_PATH: &str = "c:adminGuiConfiguration/c:homePage";

/// Import task that has to finish before roles can be made requestable
pub const GROUP_IMPORT_TASK: &str = "AD_GROUP_import";

/// Result of an upsert against the system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Added,
    Replaced,
    /// An entry with the same key already existed and was left as is
    Skipped,
}

impl MidpointClient {
    pub async fn get_system_configuration(&self) -> Result<Vec<u8>> {
        tracing::debug!("get_system_configuration()");
        self.get_object("SystemConfigurationType", SYSTEM_CONFIGURATION_OID)
            .await
    }

    /// Apply one delta to the system configuration.
    ///
    /// JSON objects are converted with [`json_to_xml`]; strings are used
    /// verbatim and may carry a prepared fragment.
    pub async fn set_system_configuration(
        &self,
        modification_type: ModificationType,
        path: &str,
        value: &Value,
    ) -> Result<Vec<u8>> {
        tracing::debug!(
            "set_system_configuration(modification_type={}, path={}, value={})",
            modification_type,
            path,
            value
        );
        let delta = ItemDelta::new(modification_type, path, scalar_text(value));
        tracing::trace!("Object modification: {}", delta.to_xml());
        let endpoint = resolve_endpoint("SystemConfigurationType")?;
        self.patch_object(&delta.to_xml(), endpoint, SYSTEM_CONFIGURATION_OID)
            .await
    }

    /// Set the level of a class logger, adding the logger when missing
    pub async fn set_class_logger(&self, package: &str, level: &str) -> Result<ConfigChange> {
        let configuration = self.get_system_configuration().await?;
        let existing = document::class_loggers(&configuration)?
            .into_iter()
            .find(|logger| logger.package == package);

        match existing {
            Some(logger) => {
                let id = logger.id.ok_or_else(|| {
                    MidpointError::MalformedDocument(format!(
                        "classLogger for {package} has no id"
                    ))
                })?;
                tracing::debug!(
                    "Logger already exists for package: {}, updating log-level",
                    package
                );
                let path = format!("{CLASS_LOGGER_PATH}[{id}]/level");
                self.set_system_configuration(ModificationType::Replace, &path, &json!(level))
                    .await?;
                Ok(ConfigChange::Replaced)
            }
            None => {
                let value = format!("<c:level>{level}</c:level><c:package>{package}</c:package>");
                self.set_system_configuration(
                    ModificationType::Add,
                    CLASS_LOGGER_PATH,
                    &json!(value),
                )
                .await?;
                Ok(ConfigChange::Added)
            }
        }
    }

    /// Point the system configuration at a global security policy
    pub async fn set_security_policy(&self, policy: &ObjectRef) -> Result<Vec<u8>> {
        let oid = self.resolve_oid("SecurityPolicyType", policy).await?;
        self.set_system_configuration(
            ModificationType::Replace,
            "globalSecurityPolicyRef",
            &json!({ "oid": oid }),
        )
        .await
    }

    /// Add a notification handler unless one with the same name exists.
    ///
    /// Existing handlers are never updated.
    pub async fn set_notification_configuration(
        &self,
        modification_type: ModificationType,
        path: &str,
        handler: &Value,
    ) -> Result<ConfigChange> {
        let name = handler
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MidpointError::InvalidParameters("notification handler needs a name".to_string())
            })?;
        tracing::debug!("notifier_name in user configuration file: {}", name);

        let configuration = self.get_system_configuration().await?;
        let handlers = document::notification_handlers(&configuration)?;
        if let Some(existing) = handlers.iter().find(|h| h.name == name) {
            tracing::debug!(
                "Handler with name {} already exists (id {:?}). Skipping configuration.",
                name,
                existing.id
            );
            return Ok(ConfigChange::Skipped);
        }

        let value = Value::String(json_to_xml(handler));
        self.set_system_configuration(modification_type, path, &value)
            .await?;
        Ok(ConfigChange::Added)
    }

    pub async fn set_message_configuration(
        &self,
        modification_type: ModificationType,
        path: &str,
        message: &Value,
    ) -> Result<Vec<u8>> {
        let value = Value::String(json_to_xml(message));
        self.set_system_configuration(modification_type, path, &value)
            .await
    }

    /// Remove the child of `parent_path` whose `key_path` equals `value` by
    /// replacing the parent's whole child list with the remaining entries
    async fn delete_configuration_entry(
        &self,
        parent_path: &str,
        child_path: &str,
        key_path: &str,
        value: &str,
    ) -> Result<()> {
        tracing::debug!(
            "Deleting '{}' from '{}' where '{}' is '{}'",
            child_path,
            parent_path,
            key_path,
            value
        );
        let configuration = self.get_system_configuration().await?;
        let lists = document::remaining_children(
            &configuration,
            parent_path,
            child_path,
            key_path,
            value,
        )?;
        for remaining in lists {
            let joined = remaining.join("\n");
            tracing::trace!("New list of children: {}", joined);
            self.set_system_configuration(
                ModificationType::Replace,
                parent_path,
                &Value::String(joined),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn delete_object_collection_view(&self, identifier: &str) -> Result<()> {
        tracing::info!("Deleting object collection view '{}'", identifier);
        self.delete_configuration_entry(
            COLLECTION_VIEWS_PATH,
            "c:objectCollectionView",
            "c:identifier",
            identifier,
        )
        .await
    }

    pub async fn delete_homepage_widget(&self, identifier: &str) -> Result<()> {
        tracing::info!("Deleting homePage widget '{}'", identifier);
        self.delete_configuration_entry(HOMEPAGE_PATH, "c:widget", "c:identifier", identifier)
            .await
    }

    /// Mark a role requestable once the group import task completed
    pub async fn set_role_requestable(
        &self,
        role_name: &str,
        requestable: &Value,
    ) -> Result<Vec<u8>> {
        let poller = self.polling.task_completion;
        self.wait_for_completed_task(&poller, &ObjectRef::name(GROUP_IMPORT_TASK))
            .await?;

        tracing::debug!("role_name in user configuration file: {}", role_name);
        let oid = self.get_object_oid("RoleType", role_name).await?;
        tracing::debug!("role oid: {}", oid);

        let modification = json_modification(ModificationType::Add, "requestable", requestable);
        let endpoint = resolve_endpoint("RoleType")?;
        self.patch_object_json(endpoint, &oid, &modification).await
    }
}
