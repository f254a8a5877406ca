//! Integration tests for folder processing
//!
//! A temporary configuration tree is pushed to a wiremock server and the
//! sequence of received calls is checked.

mod common;

use common::*;
use mpconf::processor::Processor;
use mpconf::properties::Properties;
use std::path::Path;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

async fn accept_everything(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/systemConfigurations/{SYSTEM_CONFIGURATION_OID}")))
        .respond_with(xml(object(
            "systemConfiguration",
            SYSTEM_CONFIGURATION_OID,
            "<logging/>",
        )))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Files run in name order, each one dispatched by its extension
#[tokio::test]
async fn test_folder_files_in_order() {
    let server = ready_server().await;
    accept_everything(&server).await;
    let client = client(&server).await;

    let tree = tempfile::tempdir().unwrap();
    let roles = tree.path().join("03_roles");
    std::fs::create_dir(&roles).unwrap();
    write(
        &roles,
        "c.json",
        r#"{"operation_type": "set_class_logger", "package": "org.example", "level": "DEBUG"}"#,
    );
    write(
        &roles,
        "a.xml",
        &object("role", "role-a", "<name>$(role.name)</name>"),
    );
    write(&roles, "b.patch", "<objectModification/>");
    write(&roles, "notes.txt", "not sent");

    let properties = Properties::parse("role.name=Accountants\n");
    Processor::new(&client, &properties)
        .process_subfolders(tree.path())
        .await
        .unwrap();

    let received = calls(&server).await;
    let sequence: Vec<_> = received.iter().map(describe).collect();
    assert_eq!(
        sequence,
        vec![
            "PUT /roles/role-a".to_string(),
            "PATCH /roles/b".to_string(),
            format!("GET /systemConfigurations/{SYSTEM_CONFIGURATION_OID}"),
            format!("PATCH /systemConfigurations/{SYSTEM_CONFIGURATION_OID}"),
        ]
    );
    assert!(body(&received[0]).contains("<name>Accountants</name>"));
}

/// Substitution happens on a scratch copy; the source file is untouched
#[tokio::test]
async fn test_source_file_is_not_rewritten() {
    let server = ready_server().await;
    accept_everything(&server).await;
    let client = client(&server).await;

    let tree = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let source = object("role", "role-a", "<name>$(role.name)</name>");
    write(tree.path(), "a.xml", &source);

    let properties = Properties::parse("role.name=Accountants");
    Processor::new(&client, &properties)
        .with_scratch_dir(Some(scratch.path().to_path_buf()))
        .process_folder(tree.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(tree.path().join("a.xml")).unwrap(), source);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

/// An unknown operation is logged and the next one still runs
#[tokio::test]
async fn test_unknown_operation_is_skipped() {
    let server = ready_server().await;
    accept_everything(&server).await;
    let client = client(&server).await;

    let tree = tempfile::tempdir().unwrap();
    write(
        tree.path(),
        "ops.json",
        r#"[
            {"operation_type": "drop_everything"},
            {"operation_type": "set_system_configuration", "modification_type": "REPLACE", "path": "c:deploymentInformation/c:name", "value": "test"}
        ]"#,
    );

    let properties = Properties::default();
    Processor::new(&client, &properties)
        .process_folder(tree.path())
        .await
        .unwrap();

    let received = calls(&server).await;
    assert_eq!(received.len(), 1);
    assert!(body(&received[0]).contains("<t:value>test</t:value>"));
}

/// The first failing file stops the run
#[tokio::test]
async fn test_failure_stops_processing() {
    let server = ready_server().await;
    Mock::given(method("PUT"))
        .and(path("/roles/broken"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_string_contains("role-ok"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let client = client(&server).await;

    let tree = tempfile::tempdir().unwrap();
    write(tree.path(), "1.xml", &object("role", "broken", ""));
    write(tree.path(), "2.xml", &object("role", "role-ok", ""));

    let properties = Properties::default();
    let result = Processor::new(&client, &properties)
        .process_folder(tree.path())
        .await;

    assert!(result.is_err());
    server.verify().await;
}

/// A missing folder is reported, not raised
#[tokio::test]
async fn test_missing_folder_is_not_an_error() {
    let server = ready_server().await;
    let client = client(&server).await;

    let properties = Properties::default();
    Processor::new(&client, &properties)
        .process_subfolders(Path::new("/nonexistent/mpconf/tree"))
        .await
        .unwrap();
    assert!(calls(&server).await.is_empty());
}
