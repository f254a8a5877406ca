//! Shared fixtures for the integration tests

#![allow(dead_code)]

use mpconf::midpoint::client::ADMINISTRATOR_OID;
use mpconf::midpoint::{MidpointClient, PollSettings, Poller};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const USERNAME: &str = "administrator";
pub const PASSWORD: &str = "Test5ecr3t";
pub const COMMON_NS: &str = "http://midpoint.evolveum.com/xml/ns/public/common/common-3";
pub const API_TYPES_NS: &str = "http://midpoint.evolveum.com/xml/ns/public/common/api-types-3";
pub const SYSTEM_CONFIGURATION_OID: &str = "00000000-0000-0000-0000-000000000001";

/// Short budget so waits finish quickly in tests
pub const FAST: Poller = Poller::new(3, Duration::from_millis(10));

pub fn object(tag: &str, oid: &str, body: &str) -> String {
    format!(r#"<{tag} xmlns="{COMMON_NS}" oid="{oid}">{body}</{tag}>"#)
}

pub fn search_result(oid: &str, name: &str) -> String {
    format!(
        r#"<apti:objectListType xmlns:apti="{API_TYPES_NS}" xmlns:c="{COMMON_NS}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><apti:object oid="{oid}" xsi:type="c:RoleType"><c:name>{name}</c:name></apti:object></apti:objectListType>"#
    )
}

pub fn empty_search_result() -> String {
    format!(r#"<apti:objectListType xmlns:apti="{API_TYPES_NS}"/>"#)
}

pub fn task(oid: &str, status: &str) -> String {
    object("task", oid, &format!("<name>{oid}</name><resultStatus>{status}</resultStatus>"))
}

pub fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(body)
}

/// Mock server answering the readiness probe
pub async fn ready_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{ADMINISTRATOR_OID}")))
        .respond_with(xml(object("user", ADMINISTRATOR_OID, "<name>administrator</name>")))
        .mount(&server)
        .await;
    server
}

pub async fn client(server: &MockServer) -> MidpointClient {
    MidpointClient::new(&server.uri(), USERNAME, PASSWORD, PollSettings::uniform(FAST))
        .await
        .expect("client should start against a ready server")
}

/// Requests received so far, without the readiness probe
pub async fn calls(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !r.url.path().ends_with(ADMINISTRATOR_OID))
        .collect()
}

pub fn describe(request: &Request) -> String {
    format!("{} {}", request.method.as_str(), request.url.path())
}

pub fn body(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}
