// SPDX-FileCopyrightText: 2026 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

mod common;

use std::sync::Arc;

use serde_json::json;
use test_proxy_admin::catalog::Catalog;
use test_proxy_admin::server::AdminState;
use test_proxy_admin::service::{ComponentSpec, Defaults, RegistrationService};
use test_proxy_admin::sessions::{AnySession, KnownSessions};

use common::{send, start_admin_and_wait};

fn any_session_state() -> Arc<AdminState> {
    Arc::new(AdminState::new(
        RegistrationService::with_builtins(),
        Arc::new(AnySession),
    ))
}

#[tokio::test]
async fn sanitizer_lifecycle_over_http() -> anyhow::Result<()> {
    let (handle, addr) = start_admin_and_wait(any_session_state()).await?;

    let resp = send(addr, "GET", "/Admin/IsAlive", &[], "").await?;
    assert_eq!(resp.status, 200);

    let resp = send(
        addr,
        "POST",
        "/Admin/AddSanitizer",
        &[("x-abstraction-identifier", "HeaderRegex")],
        r#"{"key": "Authorization", "regex": "Bearer .*", "value": "Bearer ****"}"#,
    )
    .await?;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    let id = resp.json()?["Sanitizer"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no id"))?
        .to_string();

    let listed = send(addr, "GET", "/Admin/GetSanitizers", &[], "").await?.json()?;
    assert_eq!(listed["Sanitizers"][0]["Id"], id.as_str());
    assert_eq!(listed["Sanitizers"][0]["Arguments"]["key"], "Authorization");

    let body = json!({"Sanitizers": [id, "id-does-not-exist"]}).to_string();
    let removed = send(addr, "POST", "/Admin/RemoveSanitizers", &[], &body)
        .await?
        .json()?;
    assert_eq!(removed["Removed"], json!([id]));

    let listed = send(addr, "GET", "/Admin/GetSanitizers", &[], "").await?.json()?;
    assert_eq!(listed["Sanitizers"], json!([]));

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn bulk_failure_leaves_session_empty() -> anyhow::Result<()> {
    let (handle, addr) = start_admin_and_wait(any_session_state()).await?;

    let resp = send(
        addr,
        "POST",
        "/Admin/AddSanitizers",
        &[("x-recording-id", "s1")],
        r#"[{"Name": "HeaderRegex", "Body": {"regex": "a", "value": "b"}},
            {"Name": "Unknown", "Body": {}}]"#,
    )
    .await?;
    assert_eq!(resp.status, 400);
    let err = resp.json()?;
    assert_eq!(err["Status"], 400);
    assert!(err["Message"]
        .as_str()
        .unwrap_or_default()
        .contains("Sanitizers.Unknown"));

    let listed = send(
        addr,
        "GET",
        "/Admin/GetSanitizers",
        &[("x-recording-id", "s1")],
        "",
    )
    .await?
    .json()?;
    assert_eq!(listed["Sanitizers"], json!([]));

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn global_reset_reinstalls_configured_defaults() -> anyhow::Result<()> {
    let defaults = Defaults {
        sanitizers: vec![ComponentSpec::new(
            "HeaderRegex",
            json!({"key": "Authorization", "regex": ".+", "value": "Sanitized"}),
        )],
        ..Defaults::default()
    };
    let service = RegistrationService::new(Catalog::builtin(), defaults)?;
    let state = Arc::new(AdminState::new(service, Arc::new(AnySession)));
    let (handle, addr) = start_admin_and_wait(state).await?;

    send(
        addr,
        "POST",
        "/Admin/AddSanitizer",
        &[("x-abstraction-identifier", "BodyRegex")],
        r#"{"regex": "secret", "value": "REDACTED"}"#,
    )
    .await?;
    let listed = send(addr, "GET", "/Admin/GetSanitizers", &[], "").await?.json()?;
    assert_eq!(listed["Sanitizers"].as_array().map(Vec::len), Some(2));

    let resp = send(addr, "POST", "/Admin/Reset", &[], "").await?;
    assert_eq!(resp.status, 200);

    let listed = send(addr, "GET", "/Admin/GetSanitizers", &[], "").await?.json()?;
    let names: Vec<_> = listed["Sanitizers"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|s| s["Name"].clone())
        .collect();
    assert_eq!(names, vec![json!("HeaderRegex")]);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn closed_session_is_not_found() -> anyhow::Result<()> {
    let sessions = Arc::new(KnownSessions::new());
    sessions.open("rec-1");
    let state = Arc::new(AdminState::new(
        RegistrationService::with_builtins(),
        sessions.clone(),
    ));
    let (handle, addr) = start_admin_and_wait(state).await?;

    let headers = [
        ("x-abstraction-identifier", "CustomDefaultMatcher"),
        ("x-recording-id", "rec-1"),
    ];
    let resp = send(
        addr,
        "POST",
        "/Admin/SetMatcher",
        &headers,
        r#"{"compareBodies": false, "excludedHeaders": "Date"}"#,
    )
    .await?;
    assert_eq!(resp.status, 200);

    sessions.close("rec-1");
    let resp = send(addr, "POST", "/Admin/SetMatcher", &headers, "").await?;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.json()?["Status"], 404);

    handle.abort();
    Ok(())
}
