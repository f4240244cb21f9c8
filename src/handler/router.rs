//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation, body decoding and the single error boundary that turns every
//! handler outcome into exactly one logged response.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::fmt::Display;
use std::sync::Arc;

use super::{files, products, system};
use crate::config::{AppState, RoutesConfig};
use crate::error::ApiError;
use crate::http::{self, BodyError, Family, Reply, ResponseWriter};
use crate::logger;

/// What a handler gets to see of the request
pub struct HandlerRequest {
    pub method: Method,
    pub query: Option<String>,
    /// Already bounded by `http.max_body_size`; empty for routes without a body
    pub body: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Home,
    ReadFile,
    CreateFile,
    AppendFile,
    DeleteFile,
    Info,
    Time,
    Products,
}

impl RouteKind {
    /// Exact routes are checked before prefix routes
    pub fn resolve(routes: &RoutesConfig, path: &str) -> Option<Self> {
        let exact = [
            (&routes.home, Self::Home),
            (&routes.read_file, Self::ReadFile),
            (&routes.info, Self::Info),
            (&routes.time, Self::Time),
        ];
        if let Some((_, kind)) = exact.iter().find(|(route, _)| route.as_str() == path) {
            return Some(*kind);
        }

        let prefixed = [
            (&routes.create_file, Self::CreateFile),
            (&routes.append_file, Self::AppendFile),
            (&routes.delete_file, Self::DeleteFile),
            (&routes.products, Self::Products),
        ];
        prefixed
            .iter()
            .find(|(route, _)| matches_prefix(route, path))
            .map(|(_, kind)| *kind)
    }

    pub fn allows(self, method: &Method) -> bool {
        match self {
            Self::Home | Self::ReadFile | Self::Info | Self::Time => method == Method::GET,
            Self::CreateFile => method == Method::POST,
            Self::AppendFile => method == Method::PUT || method == Method::POST,
            Self::DeleteFile => method == Method::DELETE,
            Self::Products => {
                method == Method::GET
                    || method == Method::POST
                    || method == Method::PUT
                    || method == Method::DELETE
            }
        }
    }

    /// Value of the `Allow` header on a 405
    pub const fn allow_header(self) -> &'static str {
        match self {
            Self::Home | Self::ReadFile | Self::Info | Self::Time => "GET",
            Self::CreateFile => "POST",
            Self::AppendFile => "PUT, POST",
            Self::DeleteFile => "DELETE",
            Self::Products => "GET, POST, PUT, DELETE",
        }
    }

    pub const fn family(self) -> Family {
        match self {
            Self::Info | Self::Products => Family::Json,
            _ => Family::Text,
        }
    }

    /// Config key of the route, for diagnostics
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::ReadFile => "read_file",
            Self::CreateFile => "create_file",
            Self::AppendFile => "append_file",
            Self::DeleteFile => "delete_file",
            Self::Info => "info",
            Self::Time => "time",
            Self::Products => "products",
        }
    }

    pub const fn reads_body(self) -> bool {
        matches!(self, Self::CreateFile | Self::AppendFile | Self::Products)
    }
}

/// `/crear` matches `/crear` and `/crear/...` but not `/crearx`
fn matches_prefix(route: &str, path: &str) -> bool {
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || route.ends_with('/'),
        None => false,
    }
}

/// Main entry point for HTTP request handling.
///
/// An oversized body is the only `Err`: hyper then drops the connection
/// without a response, and the request is still logged as a 413.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, BodyError>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let writer = ResponseWriter::new(
        state.request_log.clone(),
        &state.config.http.server_name,
        req.method(),
        req.uri(),
    );

    let Some(kind) = RouteKind::resolve(&state.config.routes, req.uri().path()) else {
        return Ok(writer.finish(Reply::not_found(Family::Text)));
    };
    if !kind.allows(req.method()) {
        return Ok(writer.finish(Reply::method_not_allowed(
            kind.family(),
            kind.allow_header(),
        )));
    }

    let (parts, body) = req.into_parts();
    let body = if kind.reads_body() {
        let limit = state.config.http.max_body_size;
        let read = match http::check_content_length(&parts.headers, limit) {
            Ok(()) => http::read_limited(body, limit).await,
            Err(e) => Err(e),
        };
        match read {
            Ok(bytes) => bytes,
            Err(BodyError::PayloadTooLarge { limit }) => {
                writer.abort(StatusCode::PAYLOAD_TOO_LARGE, "connection reset");
                return Err(BodyError::PayloadTooLarge { limit });
            }
            Err(e) => {
                writer.abort(StatusCode::BAD_REQUEST, &e.to_string());
                return Err(e);
            }
        }
    } else {
        Bytes::new()
    };

    let request = HandlerRequest {
        method: parts.method,
        query: parts.uri.query().map(ToString::to_string),
        body,
    };

    // Handlers run in their own task so a panic surfaces as a JoinError
    let reply = match tokio::spawn(dispatch(kind, request, Arc::clone(&state))).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => {
            if err.status().is_server_error() {
                logger::log_error(&format!("{} route failed: {err}", kind.label()));
            }
            Reply::from_error(kind.family(), &err)
        }
        Err(join_err) => {
            logger::log_error(&format!("{} handler panicked: {join_err}", kind.label()));
            Reply::from_error(
                kind.family(),
                &ApiError::Internal(format!("handler failed: {join_err}")),
            )
        }
    };

    Ok(writer.finish(reply))
}

async fn dispatch(
    kind: RouteKind,
    req: HandlerRequest,
    state: Arc<AppState>,
) -> Result<Reply, ApiError> {
    match kind {
        RouteKind::Home => Ok(system::banner(&state.config.routes)),
        RouteKind::ReadFile => files::read(&state.messages).await,
        RouteKind::CreateFile => files::create(&req, &state.messages).await,
        RouteKind::AppendFile => files::append(&req, &state.messages).await,
        RouteKind::DeleteFile => files::delete(&state.messages).await,
        RouteKind::Info => Ok(system::info().await),
        RouteKind::Time => Ok(system::time()),
        RouteKind::Products => products::handle(&req, state.records.as_ref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LoggingConfig};
    use crate::logger::request_log::RequestLog;
    use crate::store::{
        MemoryRecordStore, Product, ProductInput, RecordStore, Result as StoreResult, StoreError,
    };
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
    use serde_json::Value;
    use tempfile::TempDir;

    struct Fixture {
        state: Arc<AppState>,
        _dir: TempDir,
    }

    fn fixture_with(records: Arc<dyn RecordStore>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.messages_file = dir.path().join("messages.txt").display().to_string();
        config.http.max_body_size = 64;
        let state = Arc::new(AppState::new(config, records, RequestLog::disabled()));
        Fixture { state, _dir: dir }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryRecordStore::new()))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, String) {
        let response = handle_request(req, Arc::clone(state)).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn json(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_resolve_routes() {
        let routes = RoutesConfig::default();
        assert_eq!(RouteKind::resolve(&routes, "/"), Some(RouteKind::Home));
        assert_eq!(RouteKind::resolve(&routes, "/leer"), Some(RouteKind::ReadFile));
        assert_eq!(RouteKind::resolve(&routes, "/leer/x"), None);
        assert_eq!(RouteKind::resolve(&routes, "/crear"), Some(RouteKind::CreateFile));
        assert_eq!(RouteKind::resolve(&routes, "/crear/a"), Some(RouteKind::CreateFile));
        assert_eq!(RouteKind::resolve(&routes, "/crearx"), None);
        assert_eq!(RouteKind::resolve(&routes, "/productos"), Some(RouteKind::Products));
        assert_eq!(RouteKind::resolve(&routes, "/otro"), None);
    }

    #[test]
    fn test_allow_header_matches_allows() {
        assert!(RouteKind::AppendFile.allows(&Method::PUT));
        assert!(RouteKind::AppendFile.allows(&Method::POST));
        assert!(!RouteKind::AppendFile.allows(&Method::GET));
        assert!(!RouteKind::Home.allows(&Method::HEAD));
        assert_eq!(RouteKind::Products.allow_header(), "GET, POST, PUT, DELETE");
    }

    #[tokio::test]
    async fn test_create_and_get_product() {
        let fx = fixture();
        let (status, body) = send(
            &fx.state,
            request(Method::POST, "/productos", r#"{"nombre":" Mouse ","precio":25.5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.contains(r#""precio":"25.50""#), "{body}");
        let created = json(&body);
        assert_eq!(created["nombre"], "Mouse");
        assert_eq!(created["descripcion"], Value::Null);

        let id = created["id"].as_u64().unwrap();
        let (status, body) = send(
            &fx.state,
            request(Method::GET, &format!("/productos?id={id}"), ""),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["nombre"], "Mouse");

        let (status, body) = send(&fx.state, request(Method::GET, "/productos", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let fx = fixture();
        let (status, body) = send(&fx.state, request(Method::GET, "/productos?id=999", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json(&body)["error"].is_string());
    }

    #[tokio::test]
    async fn test_update_validation() {
        let fx = fixture();
        send(
            &fx.state,
            request(Method::POST, "/productos", r#"{"nombre":"Teclado","precio":10}"#),
        )
        .await;

        let (status, body) = send(
            &fx.state,
            request(Method::PUT, "/productos?id=1", r#"{"nombre":"  ","precio":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].is_string());

        let (status, _) = send(
            &fx.state,
            request(Method::PUT, "/productos", r#"{"nombre":"X","precio":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &fx.state,
            request(Method::PUT, "/productos", r#"{"id":1,"nombre":"X","precio":"7.125"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["nombre"], "X");

        let (status, _) = send(
            &fx.state,
            request(Method::PUT, "/productos?id=42", r#"{"nombre":"X","precio":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let fx = fixture();
        send(
            &fx.state,
            request(Method::POST, "/productos", r#"{"nombre":"Monitor","precio":150}"#),
        )
        .await;

        let (status, body) = send(&fx.state, request(Method::DELETE, "/productos?id=1", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["mensaje"], "Producto eliminado");
        assert_eq!(json(&body)["id"], 1);

        let (status, _) = send(&fx.state, request(Method::DELETE, "/productos?id=1", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_ids_and_bad_json() {
        let fx = fixture();
        for uri in ["/productos?id=abc", "/productos?id=0", "/productos?id=-3"] {
            let (status, _) = send(&fx.state, request(Method::GET, uri, "")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }

        let (status, body) = send(&fx.state, request(Method::POST, "/productos", "{nombre")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].as_str().unwrap().starts_with("JSON"));
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let fx = fixture();
        let response = handle_request(request(Method::GET, "/nada", ""), Arc::clone(&fx.state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let response = handle_request(
            request(Method::PATCH, "/productos", ""),
            Arc::clone(&fx.state),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST, PUT, DELETE");

        let response = handle_request(request(Method::GET, "/crear", ""), Arc::clone(&fx.state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_oversized_body_resets_connection() {
        let fx = fixture();
        let big = format!(r#"{{"nombre":"{}","precio":1}}"#, "x".repeat(200));
        let result =
            handle_request(request(Method::POST, "/productos", &big), Arc::clone(&fx.state)).await;
        assert!(matches!(result, Err(BodyError::PayloadTooLarge { limit: 64 })));

        let mut declared = request(Method::POST, "/crear", "");
        declared
            .headers_mut()
            .insert(CONTENT_LENGTH, "100000".parse().unwrap());
        assert!(handle_request(declared, Arc::clone(&fx.state)).await.is_err());

        assert!(fx.state.records.list().await.unwrap().is_empty());
        assert!(!fx.state.messages.path().exists());
    }

    #[tokio::test]
    async fn test_message_file_flow() {
        let fx = fixture();
        let (status, body) = send(&fx.state, request(Method::GET, "/leer", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Archivo no encontrado");

        let (status, _) = send(&fx.state, request(Method::POST, "/crear", "hola")).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&fx.state, request(Method::PUT, "/actualizar", " mundo")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&fx.state, request(Method::POST, "/actualizar", "!")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&fx.state, request(Method::GET, "/leer", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hola mundo!");

        let (status, _) = send(&fx.state, request(Method::DELETE, "/eliminar", "")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&fx.state, request(Method::DELETE, "/eliminar", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_system_routes() {
        let fx = fixture();
        let (status, body) = send(&fx.state, request(Method::GET, "/", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Bienvenido"));

        let (status, body) = send(&fx.state, request(Method::GET, "/info", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["platform"], std::env::consts::OS);

        let (status, body) = send(&fx.state, request(Method::GET, "/time", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Current Server Time"));
    }

    #[tokio::test]
    async fn test_requests_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.txt");
        let logging = LoggingConfig {
            request_log_file: log_path.display().to_string(),
            ..LoggingConfig::default()
        };
        let (log, task) = RequestLog::spawn(&logging);

        let mut config = Config::default();
        config.storage.messages_file = dir.path().join("messages.txt").display().to_string();
        let state = Arc::new(AppState::new(
            config,
            Arc::new(MemoryRecordStore::new()),
            log,
        ));

        send(&state, request(Method::GET, "/productos?id=5", "")).await;
        send(&state, request(Method::GET, "/nada", "")).await;
        drop(state);
        task.unwrap().await.unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("GET /productos?id=5 404"));
        assert!(lines[1].contains("GET /nada 404"));
    }

    struct BrokenStore {
        panic: bool,
    }

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn init(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn create(&self, _input: ProductInput) -> StoreResult<Product> {
            Err(StoreError::InvalidConfig("connection refused at db:3306".to_string()))
        }

        async fn get(&self, id: u64) -> StoreResult<Product> {
            Err(StoreError::NotFound(id))
        }

        async fn list(&self) -> StoreResult<Vec<Product>> {
            if self.panic {
                panic!("store exploded");
            }
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }

        async fn update(&self, id: u64, _input: ProductInput) -> StoreResult<Product> {
            Err(StoreError::NotFound(id))
        }

        async fn delete(&self, id: u64) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let fx = fixture_with(Arc::new(BrokenStore { panic: false }));
        let (status, body) = send(
            &fx.state,
            request(Method::POST, "/productos", r#"{"nombre":"A","precio":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(&body)["error"], "Error interno del servidor");
        assert!(!body.contains("3306"));
    }

    #[tokio::test]
    async fn test_reset_and_panicked_requests_are_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.txt");
        let (log, task) = RequestLog::spawn(&LoggingConfig {
            request_log_file: log_path.display().to_string(),
            ..LoggingConfig::default()
        });

        let mut config = Config::default();
        config.storage.messages_file = dir.path().join("messages.txt").display().to_string();
        config.http.max_body_size = 64;
        let state = Arc::new(AppState::new(
            config,
            Arc::new(BrokenStore { panic: true }),
            log,
        ));

        let big = "x".repeat(200);
        let result =
            handle_request(request(Method::POST, "/productos", &big), Arc::clone(&state)).await;
        assert!(result.is_err());

        let (status, _) = send(&state, request(Method::GET, "/productos", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        drop(state);
        task.unwrap().await.unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "{contents}");
        assert!(lines[0].ends_with("POST /productos 413 - connection reset"), "{contents}");
        assert!(lines[1].contains("GET /productos 500"), "{contents}");
        assert_eq!(contents.matches(" 413 ").count(), 1);
        assert_eq!(contents.matches(" 500 ").count(), 1);
    }

    #[tokio::test]
    async fn test_handler_panic_is_500() {
        let fx = fixture_with(Arc::new(BrokenStore { panic: true }));
        let (status, body) = send(&fx.state, request(Method::GET, "/productos", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(&body)["error"], "Error interno del servidor");

        // The server keeps answering afterwards
        let (status, _) = send(&fx.state, request(Method::GET, "/time", "")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
