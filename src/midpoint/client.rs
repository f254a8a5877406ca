//! Midpoint Client
//!
//! Main client for the Midpoint REST API: object lookup by oid or name,
//! full and partial updates, task control and the waits that guard them.

use super::document;
use super::endpoints::resolve_endpoint;
use super::http::{MidpointHttpClient, JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
use super::poll::{PollOutcome, PollSettings, Poller};
use crate::error::{MidpointError, Result};
use quick_xml::escape::escape;
use reqwest::Method;
use std::fmt;
use std::path::Path;

/// Built-in administrator user, used as the readiness probe
pub const ADMINISTRATOR_OID: &str = "00000000-0000-0000-0000-000000000002";

/// Task status reported once a task finished successfully
pub const TASK_SUCCESS: &str = "success";
/// Task status reported while a task is running
pub const TASK_IN_PROGRESS: &str = "in_progress";

/// An object addressed either by oid or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    Oid(String),
    Name(String),
}

impl ObjectRef {
    /// Build a reference from optional parts; the oid wins when both are given
    pub fn from_parts(oid: Option<String>, name: Option<String>) -> Result<Self> {
        match (oid, name) {
            (Some(oid), _) => Ok(Self::Oid(oid)),
            (None, Some(name)) => Ok(Self::Name(name)),
            (None, None) => Err(MidpointError::MissingIdentifier),
        }
    }

    pub fn oid(oid: &str) -> Self {
        Self::Oid(oid.to_string())
    }

    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oid(oid) => write!(f, "oid: {}", oid),
            Self::Name(name) => write!(f, "name: {}", name),
        }
    }
}

/// Main Midpoint client
#[derive(Clone)]
pub struct MidpointClient {
    pub http: MidpointHttpClient,
    pub polling: PollSettings,
}

impl MidpointClient {
    /// Create a client and wait until Midpoint answers for the administrator
    ///
    /// A client that was returned is backed by a reachable instance that
    /// accepted the credentials.
    pub async fn new(
        base_url: &str,
        username: &str,
        password: &str,
        polling: PollSettings,
    ) -> Result<Self> {
        let http = MidpointHttpClient::new(base_url, username, password)?;
        let client = Self { http, polling };

        tracing::debug!("Waiting for Midpoint at {}", client.http.base_url());
        client
            .wait_for_object(
                &client.polling.readiness,
                "UserType",
                &ObjectRef::oid(ADMINISTRATOR_OID),
            )
            .await?;
        tracing::info!("Midpoint is ready at {}", client.http.base_url());

        Ok(client)
    }

    // =========================================================================
    // Raw calls
    // =========================================================================

    pub async fn call_xml(
        &self,
        method: Method,
        endpoint: &str,
        oid: Option<&str>,
        payload: Option<String>,
    ) -> Result<Vec<u8>> {
        self.http
            .call(method, endpoint, oid, payload.map(String::into_bytes), XML_CONTENT_TYPE)
            .await
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Fetch an object by oid
    pub async fn get_object(&self, object_type: &str, oid: &str) -> Result<Vec<u8>> {
        let endpoint = resolve_endpoint(object_type)?;
        self.call_xml(Method::GET, endpoint, Some(oid), None).await
    }

    /// Search an object by name; the first match wins
    pub async fn get_object_by_name(&self, object_type: &str, name: &str) -> Result<Vec<u8>> {
        let endpoint = format!("{}/search", resolve_endpoint(object_type)?);
        let query = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <query><filter><equal><path>name</path><value>{}</value></equal></filter></query>",
            escape(name)
        );
        let response = self.call_xml(Method::POST, &endpoint, None, Some(query)).await?;

        match document::first_search_result(&response)? {
            Some(object) => Ok(object.into_bytes()),
            None => Err(MidpointError::ObjectNotFound {
                object_type: object_type.to_string(),
                name: name.to_string(),
            }),
        }
    }

    pub async fn get_object_by_ref(
        &self,
        object_type: &str,
        object: &ObjectRef,
    ) -> Result<Vec<u8>> {
        match object {
            ObjectRef::Oid(oid) => self.get_object(object_type, oid).await,
            ObjectRef::Name(name) => self.get_object_by_name(object_type, name).await,
        }
    }

    /// Fetch by oid when given, otherwise by name
    pub async fn get_object_by_oid_or_name(
        &self,
        object_type: &str,
        oid: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<u8>> {
        let object = ObjectRef::from_parts(oid.map(str::to_string), name.map(str::to_string))?;
        self.get_object_by_ref(object_type, &object).await
    }

    /// Oid of the object called `name`
    pub async fn get_object_oid(&self, object_type: &str, name: &str) -> Result<String> {
        let object = self.get_object_by_name(object_type, name).await?;
        document::oid_of(&object)
    }

    /// Resolve a reference to its oid, fetching the object only for names
    pub async fn resolve_oid(&self, object_type: &str, object: &ObjectRef) -> Result<String> {
        match object {
            ObjectRef::Oid(oid) => Ok(oid.clone()),
            ObjectRef::Name(name) => self.get_object_oid(object_type, name).await,
        }
    }

    /// Whether an object with this oid exists; 404 answers `false`
    pub async fn check_object_exists(&self, object_type: &str, oid: &str) -> Result<bool> {
        match self.get_object(object_type, oid).await {
            Ok(_) => Ok(true),
            Err(MidpointError::Status { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Replace an object; endpoint and oid come from the document itself
    pub async fn put_object(&self, xml_data: &str) -> Result<Vec<u8>> {
        let endpoint = document::endpoint_of(xml_data.as_bytes())?;
        let oid = document::oid_of(xml_data.as_bytes())?;
        self.call_xml(Method::PUT, endpoint, Some(&oid), Some(xml_data.to_string()))
            .await
    }

    pub async fn put_object_from_file(&self, path: &Path) -> Result<Vec<u8>> {
        tracing::debug!("PUT object from {}", path.display());
        let xml_data = std::fs::read_to_string(path)?;
        self.put_object(&xml_data).await
    }

    pub async fn patch_object(&self, xml_data: &str, endpoint: &str, oid: &str) -> Result<Vec<u8>> {
        self.call_xml(Method::PATCH, endpoint, Some(oid), Some(xml_data.to_string()))
            .await
    }

    pub async fn patch_object_from_file(
        &self,
        path: &Path,
        endpoint: &str,
        oid: &str,
    ) -> Result<Vec<u8>> {
        tracing::debug!("PATCH {}/{} from {}", endpoint, oid, path.display());
        let xml_data = std::fs::read_to_string(path)?;
        self.patch_object(&xml_data, endpoint, oid).await
    }

    /// PATCH with a JSON `objectModification` body
    pub async fn patch_object_json(
        &self,
        endpoint: &str,
        oid: &str,
        modification: &serde_json::Value,
    ) -> Result<Vec<u8>> {
        let body = modification.to_string().into_bytes();
        self.http
            .call(Method::PATCH, endpoint, Some(oid), Some(body), JSON_CONTENT_TYPE)
            .await
    }

    // =========================================================================
    // Waits
    // =========================================================================

    /// Wait until the referenced object can be fetched
    pub async fn wait_for_object(
        &self,
        poller: &Poller,
        object_type: &str,
        object: &ObjectRef,
    ) -> Result<()> {
        let target = format!("object_type: {}, {}", object_type, object);
        poller
            .run(&target, |_| async move {
                tracing::debug!("Checking if object exists. Type: {}, {}", object_type, object);
                self.get_object_by_ref(object_type, object).await?;
                Ok::<_, MidpointError>(PollOutcome::Ready(()))
            })
            .await
    }

    /// Wait until a task reports `success`.
    ///
    /// The task must first exist (see [`PollSettings::task_existence`]).
    /// `in_progress` keeps waiting; any other status is logged and the wait
    /// goes on until the budget runs out.
    pub async fn wait_for_completed_task(&self, poller: &Poller, task: &ObjectRef) -> Result<()> {
        tracing::debug!("Waiting task: {}", task);
        self.wait_for_object(&self.polling.task_existence, "TaskType", task)
            .await?;

        let target = format!("completed task {}", task);
        poller
            .run(&target, |_| async move {
                let object = self.get_object_by_ref("TaskType", task).await?;
                let status = document::result_status_of(&object)?;
                tracing::debug!("result_element: {:?}", status);
                match status.as_deref() {
                    Some(TASK_SUCCESS) => {
                        tracing::debug!("Task is '{}'", TASK_SUCCESS);
                        Ok::<_, MidpointError>(PollOutcome::Ready(()))
                    }
                    Some(TASK_IN_PROGRESS) => {
                        tracing::debug!("Task is '{}'", TASK_IN_PROGRESS);
                        Ok(PollOutcome::Pending)
                    }
                    other => {
                        tracing::error!("Unable to recognize task status: {:?}", other);
                        Ok(PollOutcome::Pending)
                    }
                }
            })
            .await
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    async fn task_action(&self, task: &ObjectRef, action: &str) -> Result<()> {
        let oid = self.resolve_oid("TaskType", task).await?;
        let endpoint = format!("{}/{}/{}", resolve_endpoint("TaskType")?, oid, action);
        let response = self.call_xml(Method::POST, &endpoint, None, None).await?;
        tracing::trace!("response: {}", String::from_utf8_lossy(&response));
        Ok(())
    }

    pub async fn run_task(&self, task: &ObjectRef) -> Result<()> {
        tracing::info!("Running task {}", task);
        self.task_action(task, "run").await
    }

    pub async fn resume_task(&self, task: &ObjectRef) -> Result<()> {
        tracing::info!("Resuming task {}", task);
        self.task_action(task, "resume").await
    }
}
