// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Admin HTTP surface over the registration service.

use crate::error::{AdminError, BuildError};
use crate::scope::Scope;
use crate::service::{ComponentSpec, RegistrationService};
use crate::sessions::SessionDirectory;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{service::service_fn, Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const ABSTRACTION_IDENTIFIER: &str = "x-abstraction-identifier";
pub const RECORDING_ID: &str = "x-recording-id";

type AdminResponse = Response<BoxBody<Bytes, Infallible>>;
type ServiceFuture = Pin<Box<dyn Future<Output = Result<AdminResponse, Infallible>> + Send>>;

/// Shared state handed to every admin request.
pub struct AdminState {
    pub service: RegistrationService,
    pub sessions: Arc<dyn SessionDirectory>,
}

impl AdminState {
    pub fn new(service: RegistrationService, sessions: Arc<dyn SessionDirectory>) -> Self {
        Self { service, sessions }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Reset,
    IsAlive,
    AddTransform,
    AddSanitizer,
    AddSanitizers,
    RemoveSanitizers,
    GetSanitizers,
    SetMatcher,
    SetRecordingOptions,
}

impl Action {
    /// Route matching is case-insensitive on the action segment.
    fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/').to_ascii_lowercase();
        let action = path.strip_prefix("/admin/")?;
        let action = match action {
            "reset" => Action::Reset,
            "isalive" => Action::IsAlive,
            "addtransform" => Action::AddTransform,
            "addsanitizer" => Action::AddSanitizer,
            "addsanitizers" => Action::AddSanitizers,
            "removesanitizers" => Action::RemoveSanitizers,
            "getsanitizers" => Action::GetSanitizers,
            "setmatcher" => Action::SetMatcher,
            "setrecordingoptions" => Action::SetRecordingOptions,
            _ => return None,
        };
        Some(action)
    }

    fn method(self) -> Method {
        match self {
            Action::IsAlive | Action::GetSanitizers => Method::GET,
            _ => Method::POST,
        }
    }
}

pub async fn run_admin(listen: SocketAddr, state: Arc<AdminState>) -> anyhow::Result<()> {
    run_admin_with_limit(listen, state, None).await
}

/// Testable variant of `run_admin`. With `Some(n)` the loop returns after
/// accepting `n` connections; handlers already spawned keep running.
pub async fn run_admin_with_limit(
    listen: SocketAddr,
    state: Arc<AdminState>,
    accept_limit: Option<usize>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(%listen, "admin listening");

    let server_builder = AutoConnBuilder::new(TokioExecutor::new());

    let mut remaining = accept_limit;
    loop {
        if let Some(0) = remaining {
            break;
        }

        let (stream, remote_addr) = listener.accept().await?;

        if let Some(ref mut n) = remaining {
            *n -= 1;
        }

        let state = state.clone();
        let builder_clone = server_builder.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                let fut: ServiceFuture = Box::pin(async move { handle_request(req, state).await });
                fut
            });

            if let Err(e) = builder_clone
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                error!(%e, %remote_addr, "connection error");
            }
        });
    }

    Ok(())
}

pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AdminState>,
) -> Result<AdminResponse, Infallible>
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let recording_id = req
        .headers()
        .get(RECORDING_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    debug!(%method, %path, recording_id = %recording_id, "admin request");

    let result = match Action::from_path(&path) {
        None => Err(AdminError::UnknownRoute(path.clone())),
        Some(action) if action.method() != method => {
            Err(AdminError::MethodNotAllowed(method.to_string()))
        }
        Some(action) => {
            let (parts, body) = req.into_parts();
            match body.collect().await {
                Ok(collected) => dispatch(action, &parts.headers, collected.to_bytes(), &state),
                Err(e) => {
                    let e: Box<dyn std::error::Error + Send + Sync> = e.into();
                    Err(AdminError::BadRequest(format!(
                        "failed to read request body: {}",
                        e
                    )))
                }
            }
        }
    };

    Ok(result.unwrap_or_else(|e| {
        if e.status().is_server_error() {
            error!(%method, %path, error = %e, "admin request failed");
        } else {
            debug!(%method, %path, status = %e.status(), error = %e, "admin request rejected");
        }
        error_response(&e)
    }))
}

fn dispatch(
    action: Action,
    headers: &HeaderMap,
    body: Bytes,
    state: &AdminState,
) -> Result<AdminResponse, AdminError> {
    if action == Action::IsAlive {
        return Ok(empty_response());
    }

    let scope = resolve_scope(headers, state)?;
    let service = &state.service;

    match action {
        Action::IsAlive => Ok(empty_response()),
        Action::Reset => {
            service.reset_to_defaults(&scope)?;
            Ok(empty_response())
        }
        Action::AddTransform => {
            let name = abstraction_identifier(headers)?;
            service.add_transform(&scope, name, parse_optional_body(&body)?.as_ref())?;
            Ok(empty_response())
        }
        Action::SetMatcher => {
            let name = abstraction_identifier(headers)?;
            service.set_matcher(&scope, name, parse_optional_body(&body)?.as_ref())?;
            Ok(empty_response())
        }
        Action::AddSanitizer => {
            let name = abstraction_identifier(headers)?;
            let id = service.register_one(&scope, name, parse_optional_body(&body)?.as_ref())?;
            Ok(json_response(StatusCode::OK, &json!({ "Sanitizer": id })))
        }
        Action::AddSanitizers => {
            let items: Vec<ComponentSpec> = serde_json::from_slice(&body).map_err(|e| {
                AdminError::BadRequest(format!(
                    "expected a JSON array of {{\"Name\", \"Body\"}} objects: {}",
                    e
                ))
            })?;
            let ids = service.register_bulk(&scope, &items)?;
            let mut resp = json_response(StatusCode::OK, &json!({ "Sanitizers": ids }));
            if let Some(v) = headers.get(RECORDING_ID) {
                resp.headers_mut().insert(RECORDING_ID, v.clone());
            }
            Ok(resp)
        }
        Action::RemoveSanitizers => {
            let ids = sanitizer_ids(parse_optional_body(&body)?)?;
            let removed = service.unregister_many(&scope, &ids);
            Ok(json_response(StatusCode::OK, &json!({ "Removed": removed })))
        }
        Action::GetSanitizers => {
            let listed = service.list(Some(&scope));
            Ok(json_response(StatusCode::OK, &json!({ "Sanitizers": listed })))
        }
        Action::SetRecordingOptions => {
            let options = match parse_optional_body(&body)? {
                Some(Value::Object(map)) => map,
                None => Map::new(),
                Some(_) => {
                    return Err(AdminError::BadRequest(
                        "recording options must be a JSON object".to_string(),
                    ))
                }
            };
            service.set_options(&scope, options);
            Ok(empty_response())
        }
    }
}

fn resolve_scope(headers: &HeaderMap, state: &AdminState) -> Result<Scope, AdminError> {
    let raw = headers
        .get(RECORDING_ID)
        .map(|v| {
            v.to_str()
                .map_err(|_| AdminError::BadRequest(format!("{} is not valid text", RECORDING_ID)))
        })
        .transpose()?;
    let scope = Scope::resolve(raw);
    if let Some(id) = scope.session_id() {
        if !state.sessions.is_active(id) {
            return Err(AdminError::SessionNotFound(id.to_string()));
        }
    }
    Ok(scope)
}

fn abstraction_identifier(headers: &HeaderMap) -> Result<&str, AdminError> {
    headers
        .get(ABSTRACTION_IDENTIFIER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AdminError::MissingHeader(ABSTRACTION_IDENTIFIER))
}

/// Empty or whitespace-only bodies read as absent.
fn parse_optional_body(body: &Bytes) -> Result<Option<Value>, AdminError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AdminError::BadRequest(format!("request body is not valid JSON: {}", e)))
}

/// Pull the id list out of a `{"Sanitizers": [...]}` body, matching the key
/// case-insensitively.
fn sanitizer_ids(body: Option<Value>) -> Result<Vec<String>, AdminError> {
    let list = match body {
        Some(Value::Object(map)) => map
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("sanitizers"))
            .map(|(_, v)| v),
        _ => None,
    };
    let ids: Vec<String> = match list {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(AdminError::BadRequest(format!(
                    "sanitizer ids must be strings, got {}",
                    other
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(AdminError::BadRequest(format!(
                "\"Sanitizers\" must be an array of ids, got {}",
                other
            )))
        }
    };
    if ids.is_empty() {
        return Err(BuildError::EmptyBatch(
            "At least one sanitizer id must be provided in \"Sanitizers\".".to_string(),
        )
        .into());
    }
    Ok(ids)
}

fn empty_response() -> AdminResponse {
    Response::new(Full::new(Bytes::new()).boxed())
}

fn json_response(status: StatusCode, body: &Value) -> AdminResponse {
    let bytes = Bytes::from(body.to_string());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(Full::new(bytes.clone()).boxed())
        .unwrap_or_else(|e| {
            warn!(%e, "failed to build json response");
            Response::new(Full::new(bytes).boxed())
        })
}

fn error_response(err: &AdminError) -> AdminResponse {
    let body = serde_json::to_value(err.to_body()).unwrap_or_else(|_| json!({}));
    json_response(err.status(), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::{AnySession, KnownSessions};
    use rstest::rstest;

    fn state() -> Arc<AdminState> {
        Arc::new(AdminState::new(
            RegistrationService::with_builtins(),
            Arc::new(AnySession),
        ))
    }

    fn request(method: Method, path: &str, headers: &[(&str, &str)], body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(path);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("request")
    }

    async fn call(
        state: &Arc<AdminState>,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, HeaderMap, Value) {
        let resp = handle_request(req, state.clone()).await.expect("infallible");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, headers, value)
    }

    #[rstest]
    #[case("/Admin/AddSanitizer", Some(Action::AddSanitizer))]
    #[case("/admin/addsanitizer", Some(Action::AddSanitizer))]
    #[case("/ADMIN/GetSanitizers/", Some(Action::GetSanitizers))]
    #[case("/Admin/SetRecordingOptions", Some(Action::SetRecordingOptions))]
    #[case("/Admin/Nope", None)]
    #[case("/Playback/Start", None)]
    fn route_matching(#[case] path: &str, #[case] expected: Option<Action>) {
        assert_eq!(Action::from_path(path), expected);
    }

    #[tokio::test]
    async fn is_alive_returns_empty_ok() {
        let st = state();
        let (status, _, body) = call(&st, request(Method::GET, "/Admin/IsAlive", &[], "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn add_then_get_sanitizer() {
        let st = state();
        let (status, headers, body) = call(
            &st,
            request(
                Method::POST,
                "/Admin/AddSanitizer",
                &[(ABSTRACTION_IDENTIFIER, "HeaderRegex")],
                r#"{"regex": "Bearer .*", "value": "Bearer ****"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        let id = body["Sanitizer"].as_str().expect("id").to_string();

        let (status, _, body) =
            call(&st, request(Method::GET, "/Admin/GetSanitizers", &[], "")).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body["Sanitizers"].as_array().expect("array");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["Id"], id.as_str());
        assert_eq!(listed[0]["Name"], "HeaderRegex");
        assert_eq!(listed[0]["Arguments"]["value"], "Bearer ****");
    }

    #[tokio::test]
    async fn add_sanitizer_without_identifier_is_400() {
        let st = state();
        let (status, _, body) = call(
            &st,
            request(Method::POST, "/Admin/AddSanitizer", &[], r#"{"regex": "a"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["Status"], 400);
        assert!(body["Message"]
            .as_str()
            .unwrap()
            .contains(ABSTRACTION_IDENTIFIER));
    }

    #[tokio::test]
    async fn build_errors_map_to_json_error_body() {
        let st = state();
        let (status, _, body) = call(
            &st,
            request(
                Method::POST,
                "/Admin/AddSanitizer",
                &[(ABSTRACTION_IDENTIFIER, "HeaderRegex")],
                r#"{"regex": "Bearer .*"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["Message"].as_str().unwrap().contains("\"value\""));
        assert!(st.service.list(None).is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let st = state();
        let (status, _, _) = call(
            &st,
            request(
                Method::POST,
                "/Admin/AddSanitizer",
                &[(ABSTRACTION_IDENTIFIER, "HeaderRegex")],
                "{not json",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_sanitizers_bulk_echoes_recording_id() {
        let st = state();
        let (status, headers, body) = call(
            &st,
            request(
                Method::POST,
                "/Admin/AddSanitizers",
                &[(RECORDING_ID, "rec-1")],
                r#"[{"Name": "HeaderRegex", "Body": {"regex": "a", "value": "b"}},
                    {"Name": "BodyRegex", "Body": {"regex": "c", "value": "d"}}]"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[RECORDING_ID], "rec-1");
        assert_eq!(body["Sanitizers"].as_array().unwrap().len(), 2);

        let session = Scope::Session("rec-1".into());
        assert_eq!(st.service.list(Some(&session)).len(), 2);
        assert!(st.service.list(None).is_empty());
    }

    #[tokio::test]
    async fn add_sanitizers_empty_batch_is_400() {
        let st = state();
        let (status, _, body) =
            call(&st, request(Method::POST, "/Admin/AddSanitizers", &[], "[]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["Message"].as_str().unwrap().contains("Received 0"));
    }

    #[tokio::test]
    async fn remove_sanitizers_reports_only_removed() {
        let st = state();
        let id = st
            .service
            .register_one(
                &Scope::Global,
                "HeaderRegex",
                Some(&json!({"regex": "a", "value": "b"})),
            )
            .unwrap();
        let payload = json!({"sanitizers": [id, "id-does-not-exist"]}).to_string();
        let (status, _, body) = call(
            &st,
            request(Method::POST, "/Admin/RemoveSanitizers", &[], &payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Removed"], json!([id]));

        let (_, _, body) = call(
            &st,
            request(Method::POST, "/Admin/RemoveSanitizers", &[], &payload),
        )
        .await;
        assert_eq!(body["Removed"], json!([]));
    }

    #[rstest]
    #[case("")]
    #[case("{}")]
    #[case(r#"{"Sanitizers": []}"#)]
    #[tokio::test]
    async fn remove_sanitizers_rejects_empty_list(#[case] payload: &str) {
        let st = state();
        let (status, _, _) = call(
            &st,
            request(Method::POST, "/Admin/RemoveSanitizers", &[], payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_matcher_and_transform_in_session() {
        let st = state();
        let headers = [(ABSTRACTION_IDENTIFIER, "BodilessMatcher"), (RECORDING_ID, "s1")];
        let (status, _, _) =
            call(&st, request(Method::POST, "/Admin/SetMatcher", &headers, "")).await;
        assert_eq!(status, StatusCode::OK);

        let headers = [
            (ABSTRACTION_IDENTIFIER, "HeaderTransform"),
            (RECORDING_ID, "s1"),
        ];
        let (status, _, _) = call(
            &st,
            request(
                Method::POST,
                "/Admin/AddTransform",
                &headers,
                r#"{"key": "Location", "value": "https://fake/"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let session = Scope::Session("s1".into());
        assert!(st.service.matcher(&session).is_some());
        assert!(st.service.matcher(&Scope::Global).is_none());
        assert_eq!(st.service.transforms(&session).len(), 1);
    }

    #[tokio::test]
    async fn recording_options_must_be_object() {
        let st = state();
        let (status, _, _) = call(
            &st,
            request(Method::POST, "/Admin/SetRecordingOptions", &[], "[1, 2]"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = call(
            &st,
            request(
                Method::POST,
                "/Admin/SetRecordingOptions",
                &[],
                r#"{"HandleRedirects": false}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(st.service.options(&Scope::Global)["HandleRedirects"], false);
    }

    #[tokio::test]
    async fn reset_session_keeps_global() {
        let st = state();
        let body = json!({"regex": "a", "value": "b"});
        st.service
            .register_one(&Scope::Global, "HeaderRegex", Some(&body))
            .unwrap();
        let session = Scope::Session("s1".into());
        st.service
            .register_one(&session, "HeaderRegex", Some(&body))
            .unwrap();

        let (status, _, _) = call(
            &st,
            request(Method::POST, "/Admin/Reset", &[(RECORDING_ID, "s1")], ""),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(st.service.list(Some(&session)).is_empty());
        assert_eq!(st.service.list(None).len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let sessions = Arc::new(KnownSessions::new());
        sessions.open("live");
        let st = Arc::new(AdminState::new(
            RegistrationService::with_builtins(),
            sessions,
        ));

        let (status, _, body) = call(
            &st,
            request(Method::GET, "/Admin/GetSanitizers", &[(RECORDING_ID, "gone")], ""),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["Status"], 404);

        let (status, _, _) = call(
            &st,
            request(Method::GET, "/Admin/GetSanitizers", &[(RECORDING_ID, "live")], ""),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_and_wrong_method() {
        let st = state();
        let (status, _, _) = call(&st, request(Method::POST, "/Admin/Explode", &[], "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = call(&st, request(Method::GET, "/Admin/AddSanitizer", &[], "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn run_admin_with_limit_accepts_zero_and_returns_immediately() -> anyhow::Result<()> {
        let l = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = l.local_addr()?;
        drop(l);

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            run_admin_with_limit(addr, state(), Some(0)),
        )
        .await
        .expect("run_admin_with_limit did not return within timeout")?;
        Ok(())
    }
}
