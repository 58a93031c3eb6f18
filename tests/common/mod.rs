#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use maritime_crm::config::AppConfig;
use maritime_crm::CrmClient;

pub const VALID_EMAIL: &str = "patron@cofradia.es";
pub const VALID_PASSWORD: &str = "mar-de-fondo";
pub const EXPIRED_EMAIL: &str = "caducado@cofradia.es";
pub const NO_TOKEN_EMAIL: &str = "sintoken@cofradia.es";
pub const GARBAGE_TOKEN_EMAIL: &str = "basura@cofradia.es";

const SIGNING_SECRET: &[u8] = b"fake-backend-secret";

const CLAIM_NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
const CLAIM_EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
const CLAIM_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
const CLAIM_ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Sign a token the way the backend does, expiring `expires_in` from now
pub fn mint_token(email: &str, expires_in: Duration) -> String {
    let claims = json!({
        CLAIM_NAME_IDENTIFIER: "31",
        CLAIM_EMAIL: email,
        CLAIM_NAME: "patron",
        CLAIM_ROLE: "Armador",
        "exp": (Utc::now() + expires_in).timestamp(),
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SIGNING_SECRET))
        .expect("token signing")
}

/// One request as seen by the fake backend
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: String,
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<Recorded>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

#[derive(Clone, Default)]
pub struct Backend {
    inner: Arc<Inner>,
}

impl Backend {
    fn record(&self, method: Method, path: &str, query: Option<String>, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.inner.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            query,
            authorization,
            body,
        });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.inner.uploads.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

fn boat(id: i64) -> Value {
    // Mixed casing and numbers as strings, like the real backend
    json!({
        "CodigoBarco": id.to_string(),
        "censo": 27000 + id,
        "NombreB": format!("Ronsel {}", id),
        "Eslora": "18,40",
        "GT": 45,
        "Activo": true,
        "FechaAlta": "2019-04-02T00:00:00"
    })
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.record(Method::POST, "/api/Auth/login", None, &headers, Some(body.clone()));
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let token = match (email, password) {
        (VALID_EMAIL, VALID_PASSWORD) => mint_token(VALID_EMAIL, Duration::hours(1)),
        (EXPIRED_EMAIL, VALID_PASSWORD) => mint_token(EXPIRED_EMAIL, -Duration::hours(1)),
        (NO_TOKEN_EMAIL, VALID_PASSWORD) => String::new(),
        (GARBAGE_TOKEN_EMAIL, VALID_PASSWORD) => "not-a-jwt".to_string(),
        _ => return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Credenciales incorrectas" }))).into_response(),
    };

    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": "5d1c1f0e-6b1a-4c36-9d0e-2f6c7c1f0a11",
            "nombreUsuario": "patron",
            "eMail": email,
            "rol": "Armador",
            "tipoUsuario": 1
        }
    }))
    .into_response()
}

async fn profile(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Usuarios/perfil", None, &headers, None);
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "IdUsuario": "31",
        "EMail": VALID_EMAIL,
        "Nombre": "Xosé",
        "Apellidos": "Lema",
        "Rol": "Usuario",
        "TipoUsuario": 2
    }))
    .into_response()
}

async fn list_boats(State(backend): State<Backend>, headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    backend.record(Method::GET, "/api/Barcos", query, &headers, None);
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    Json(json!([boat(1), boat(2)])).into_response()
}

async fn create_boat(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.record(Method::POST, "/api/Barcos", None, &headers, Some(body.clone()));
    Json(json!({
        "Success": true,
        "Message": "Barco creado",
        "Data": body
    }))
    .into_response()
}

async fn get_boat(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let path = format!("/api/Barcos/{}", id);
    backend.record(Method::GET, &path, None, &headers, None);
    match id.parse::<i64>() {
        Ok(id) if id <= 2 => Json(boat(id)).into_response(),
        _ => (StatusCode::NOT_FOUND, "Barco no encontrado").into_response(),
    }
}

async fn update_boat(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/api/Barcos/{}", id);
    backend.record(Method::PUT, &path, None, &headers, Some(body));
    if id == "99" {
        return Json(json!({ "success": false, "message": "Censo duplicado", "data": null })).into_response();
    }
    Json(json!({ "success": true, "message": "Barco actualizado", "data": null })).into_response()
}

async fn delete_boat(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let path = format!("/api/Barcos/{}", id);
    backend.record(Method::DELETE, &path, None, &headers, None);
    Json(json!({ "success": true, "message": null, "data": id.parse::<i64>().unwrap_or(0) })).into_response()
}

async fn no_content(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Empresa", None, &headers, None);
    StatusCode::NO_CONTENT.into_response()
}

async fn company_users(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let path = format!("/api/Empresa/{}/usuarios", id);
    backend.record(Method::GET, &path, None, &headers, None);
    if id != "E1" {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(json!([
        { "IdUsuario": "31", "EMail": VALID_EMAIL, "NOMBRE": "Xosé", "Rol": "Armador" },
        { "idusuario": 32, "email": "patroa@cofradia.es", "nombre": "Uxía" }
    ]))
    .into_response()
}

async fn empty_ok(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Personas", None, &headers, None);
    (StatusCode::OK, Bytes::new()).into_response()
}

async fn null_body(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Avisos", None, &headers, None);
    (StatusCode::OK, [("content-type", "application/json")], "null").into_response()
}

async fn server_error(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Cofradias", None, &headers, None);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn revoked(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record(Method::GET, "/api/Revocado", None, &headers, None);
    unauthorized()
}

async fn upload(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let path = format!("/api/BarcosTramite/{}/documento", id);
    backend.record(Method::POST, &path, None, &headers, None);

    let mut stored = None;
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("multipart bytes").to_vec();
        stored = file_name.clone();
        backend.inner.uploads.lock().unwrap().push(RecordedUpload {
            path: path.clone(),
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    Json(json!({
        "success": true,
        "message": "Documento guardado",
        "data": format!("docs/{}/{}", id, stored.unwrap_or_default())
    }))
    .into_response()
}

async fn upload_silent(State(backend): State<Backend>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    backend.record(Method::POST, "/api/Documentos", None, &headers, None);
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let _ = field.bytes().await;
    }
    StatusCode::OK.into_response()
}

fn app(backend: Backend) -> Router {
    Router::new()
        .route("/api/Auth/login", post(login))
        .route("/api/Usuarios/perfil", get(profile))
        .route("/api/Barcos", get(list_boats).post(create_boat))
        .route("/api/Barcos/:id", get(get_boat).put(update_boat).delete(delete_boat))
        .route("/api/Empresa", get(no_content))
        .route("/api/Empresa/:id/usuarios", get(company_users))
        .route("/api/Personas", get(empty_ok))
        .route("/api/Avisos", get(null_body))
        .route("/api/Cofradias", get(server_error))
        .route("/api/Revocado", get(revoked))
        .route("/api/BarcosTramite/:id/documento", post(upload))
        .route("/api/Documentos", post(upload_silent))
        .with_state(backend)
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
    pub backend: Backend,
}

impl TestServer {
    pub fn config(&self) -> AppConfig {
        AppConfig::for_base_url(self.base_url.clone())
    }

    pub fn client(&self) -> Result<CrmClient> {
        Ok(CrmClient::new(self.config())?)
    }
}

/// Start a fake backend on an ephemeral port inside the current runtime
pub async fn spawn_backend() -> Result<TestServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind fake backend")?;
    let addr = listener.local_addr()?;
    let backend = Backend::default();

    let router = app(backend.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("fake backend stopped: {}", e);
        }
    });

    Ok(TestServer {
        addr,
        base_url: format!("http://{}/", addr),
        backend,
    })
}

/// An address nothing listens on
pub async fn closed_base_url() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}
