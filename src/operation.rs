//! Declarative operations
//!
//! `.json` files describe configuration actions as
//! `{"operation_type": "<name>", ...parameters}`. Each record maps to exactly
//! one client call. Unknown keys are ignored and missing parameters surface
//! as errors from the call they feed.

use crate::error::MidpointError;
use crate::midpoint::{MidpointClient, ModificationType, ObjectRef};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Operation names understood by [`Operation::from_value`]
pub const OPERATION_TYPES: &[&str] = &[
    "add_resource_inducement_to_role",
    "add_role_inducement_to_role",
    "add_role_inducement_to_archetype",
    "set_system_configuration",
    "set_class_logger",
    "set_notification_configuration",
    "set_message_configuration",
    "set_role_requestable",
];

/// One declarative operation record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation_type", rename_all = "snake_case")]
pub enum Operation {
    AddResourceInducementToRole {
        resource_oid: Option<String>,
        resource_name: Option<String>,
        role_oid: Option<String>,
        role_name: Option<String>,
    },
    AddRoleInducementToRole {
        child_oid: Option<String>,
        child_name: Option<String>,
        parent_oid: Option<String>,
        parent_name: Option<String>,
    },
    AddRoleInducementToArchetype {
        role_oid: Option<String>,
        role_name: Option<String>,
        archetype_oid: Option<String>,
        archetype_name: Option<String>,
    },
    SetSystemConfiguration {
        modification_type: Option<String>,
        path: Option<String>,
        #[serde(default)]
        value: Value,
    },
    SetClassLogger {
        package: Option<String>,
        level: Option<String>,
    },
    SetNotificationConfiguration {
        modification_type: Option<String>,
        path: Option<String>,
        #[serde(default)]
        value: Value,
    },
    SetMessageConfiguration {
        modification_type: Option<String>,
        path: Option<String>,
        #[serde(default)]
        value: Value,
    },
    SetRoleRequestable {
        role_name: Option<String>,
        #[serde(default)]
        requestable: Value,
    },
    /// Any `operation_type` not listed in [`OPERATION_TYPES`]
    #[serde(skip)]
    Unrecognized(String),
}

impl Operation {
    /// Parse one record; unknown operation names become [`Operation::Unrecognized`]
    pub fn from_value(value: Value) -> Result<Self> {
        let operation_type = value
            .get("operation_type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Operation record without operation_type: {}", value))?;

        if !OPERATION_TYPES.contains(&operation_type.as_str()) {
            return Ok(Self::Unrecognized(operation_type));
        }

        serde_json::from_value(value)
            .with_context(|| format!("Invalid parameters for operation {}", operation_type))
    }

    /// Parse a file body holding one record or a list of records
    pub fn parse_all(content: &str) -> Result<Vec<Self>> {
        let json: Value = serde_json::from_str(content).context("Failed to parse operation JSON")?;
        match json {
            Value::Array(records) => records.into_iter().map(Self::from_value).collect(),
            record @ Value::Object(_) => Ok(vec![Self::from_value(record)?]),
            other => Err(anyhow::anyhow!(
                "Operation file must hold an object or a list, found: {}",
                other
            )),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::AddResourceInducementToRole { .. } => "add_resource_inducement_to_role",
            Self::AddRoleInducementToRole { .. } => "add_role_inducement_to_role",
            Self::AddRoleInducementToArchetype { .. } => "add_role_inducement_to_archetype",
            Self::SetSystemConfiguration { .. } => "set_system_configuration",
            Self::SetClassLogger { .. } => "set_class_logger",
            Self::SetNotificationConfiguration { .. } => "set_notification_configuration",
            Self::SetMessageConfiguration { .. } => "set_message_configuration",
            Self::SetRoleRequestable { .. } => "set_role_requestable",
            Self::Unrecognized(name) => name,
        }
    }
}

fn object_ref(oid: &Option<String>, name: &Option<String>) -> Result<ObjectRef, MidpointError> {
    ObjectRef::from_parts(oid.clone(), name.clone())
}

fn required<'a>(value: &'a Option<String>, param: &str) -> Result<&'a str, MidpointError> {
    value
        .as_deref()
        .ok_or_else(|| MidpointError::InvalidParameters(format!("missing parameter '{param}'")))
}

fn modification(value: &Option<String>) -> Result<ModificationType, MidpointError> {
    required(value, "modification_type")?.parse()
}

/// Run one operation against Midpoint.
///
/// Unrecognized operations are logged and skipped.
pub async fn execute(client: &MidpointClient, operation: &Operation) -> Result<()> {
    tracing::trace!("Processing operation based on operation_type: {}", operation.name());

    match operation {
        Operation::AddResourceInducementToRole {
            resource_oid,
            resource_name,
            role_oid,
            role_name,
        } => {
            client
                .add_resource_inducement_to_role(
                    &object_ref(resource_oid, resource_name)?,
                    &object_ref(role_oid, role_name)?,
                )
                .await?;
        }
        Operation::AddRoleInducementToRole {
            child_oid,
            child_name,
            parent_oid,
            parent_name,
        } => {
            client
                .add_role_inducement_to_role(
                    &object_ref(child_oid, child_name)?,
                    &object_ref(parent_oid, parent_name)?,
                )
                .await?;
        }
        Operation::AddRoleInducementToArchetype {
            role_oid,
            role_name,
            archetype_oid,
            archetype_name,
        } => {
            client
                .add_role_inducement_to_archetype(
                    &object_ref(role_oid, role_name)?,
                    &object_ref(archetype_oid, archetype_name)?,
                )
                .await?;
        }
        Operation::SetSystemConfiguration {
            modification_type,
            path,
            value,
        } => {
            client
                .set_system_configuration(
                    modification(modification_type)?,
                    required(path, "path")?,
                    value,
                )
                .await?;
        }
        Operation::SetClassLogger { package, level } => {
            client
                .set_class_logger(required(package, "package")?, required(level, "level")?)
                .await?;
        }
        Operation::SetNotificationConfiguration {
            modification_type,
            path,
            value,
        } => {
            client
                .set_notification_configuration(
                    modification(modification_type)?,
                    required(path, "path")?,
                    value,
                )
                .await?;
        }
        Operation::SetMessageConfiguration {
            modification_type,
            path,
            value,
        } => {
            client
                .set_message_configuration(
                    modification(modification_type)?,
                    required(path, "path")?,
                    value,
                )
                .await?;
        }
        Operation::SetRoleRequestable {
            role_name,
            requestable,
        } => {
            client
                .set_role_requestable(required(role_name, "role_name")?, requestable)
                .await?;
        }
        Operation::Unrecognized(name) => {
            tracing::error!("OperationType is unknown: {}", name);
        }
    }
    Ok(())
}
