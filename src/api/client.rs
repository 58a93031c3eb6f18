use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::marker::PhantomData;
use tower::{Service, ServiceExt};
use url::Url;

use super::envelope::{MutationResponse, Operation, ResponseEnvelope};
use super::query::Query;
use super::upload::{StoredDocument, UploadFile, UploadOptions};
use crate::auth::interceptor::Authorized;
use crate::codec;
use crate::dto::Entity;
use crate::error::{ClientError, ClientResult};

/// Typed CRUD over one backend record type.
///
/// Every request goes through the authorization interceptor, which attaches
/// the stored bearer token. Nothing is retried.
pub struct ApiClient<T> {
    base_url: Url,
    http: Authorized<reqwest::Client>,
    log_requests: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            log_requests: self.log_requests,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("record", &std::any::type_name::<T>())
            .finish()
    }
}

/// A relative endpoint must resolve under the base URL, so the base needs a
/// trailing slash and the endpoint must not start with one
fn normalize_base(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

impl<T> ApiClient<T> {
    pub fn new(base_url: Url, http: Authorized<reqwest::Client>) -> Self {
        Self {
            base_url: normalize_base(base_url),
            http,
            log_requests: false,
            _marker: PhantomData,
        }
    }

    /// Log every request at info level instead of debug
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Same transport and base URL for another record type
    pub fn retarget<U>(&self) -> ApiClient<U> {
        ApiClient {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            log_requests: self.log_requests,
            _marker: PhantomData,
        }
    }

    pub fn url(&self, endpoint: &str) -> ClientResult<Url> {
        let relative = endpoint.trim().trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|source| ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    /// `endpoint/{id}` with the id encoded as one path segment
    pub fn item_url(&self, endpoint: &str, id: impl Display) -> ClientResult<Url> {
        let mut url = self.url(endpoint)?;
        let id = id.to_string();
        if id.trim().is_empty() {
            return Err(ClientError::invalid_argument(format!(
                "empty id for '{}'",
                endpoint
            )));
        }
        url.path_segments_mut()
            .map_err(|_| ClientError::invalid_argument(format!("'{}' cannot take a path", endpoint)))?
            .pop_if_empty()
            .push(&id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http.get_ref().request(method, url)
    }

    /// Dispatch through the interceptor and read the whole body
    async fn execute(&self, builder: reqwest::RequestBuilder) -> ClientResult<Reply> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().to_string();

        let mut http = self.http.clone();
        let response = match http.ready().await?.call(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("{} {} failed: {}", method, url, e);
                return Err(ClientError::Network(e));
            }
        };

        let status = response.status();
        if self.log_requests {
            tracing::info!("{} {} -> {}", method, url, status);
        } else {
            tracing::debug!("{} {} -> {}", method, url, status);
        }

        let body = response.bytes().await?.to_vec();
        Ok(Reply { status, url, body })
    }
}

/// Status, URL and body of a finished exchange
struct Reply {
    status: StatusCode,
    url: String,
    body: Vec<u8>,
}

impl Reply {
    fn has_content(&self) -> bool {
        self.status != StatusCode::NO_CONTENT && !is_blank(&self.body)
    }

    fn ensure_success(self) -> ClientResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        let body = String::from_utf8_lossy(&self.body).trim().to_string();
        tracing::warn!("{} answered {}", self.url, self.status);
        Err(ClientError::Status {
            status: self.status,
            url: self.url,
            body: if body.is_empty() { None } else { Some(body) },
        })
    }

    fn json(&self) -> ClientResult<Value> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            url: self.url.clone(),
            source,
        })
    }

    fn decode<D: DeserializeOwned>(&self, value: Value) -> ClientResult<D> {
        codec::decode_value(value).map_err(|source| ClientError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// A list body is either the bare array or an envelope around it
fn unwrap_list(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let data = map
                .into_iter()
                .find(|(key, _)| codec::to_snake_case(key) == "data")
                .map(|(_, data)| data);
            data.unwrap_or(Value::Null)
        }
        other => other,
    }
}

impl<T> ApiClient<T>
where
    T: Serialize + DeserializeOwned,
{
    /// GET a collection. No content, an empty body or `null` give an empty list.
    pub async fn get_all(&self, endpoint: &str, query: &Query) -> ClientResult<Vec<T>> {
        let url = self.url(endpoint)?;
        self.fetch_list(url, query).await
    }

    /// GET a collection nested under one record: `endpoint/{id}/{relation}`
    pub async fn get_nested(
        &self,
        endpoint: &str,
        id: impl Display,
        relation: &str,
        query: &Query,
    ) -> ClientResult<Vec<T>> {
        let mut url = self.item_url(endpoint, id)?;
        let relation = relation.trim().trim_matches('/');
        if relation.is_empty() {
            return Err(ClientError::invalid_argument(format!(
                "empty relation under '{}'",
                endpoint
            )));
        }
        url.path_segments_mut()
            .map_err(|_| ClientError::invalid_argument(format!("'{}' cannot take a path", endpoint)))?
            .extend(relation.split('/'));
        self.fetch_list(url, query).await
    }

    async fn fetch_list(&self, mut url: Url, query: &Query) -> ClientResult<Vec<T>> {
        query.apply_to(&mut url);

        let reply = self.execute(self.request(Method::GET, url)).await?;
        if reply.status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let reply = reply.ensure_success()?;
        if !reply.has_content() {
            return Ok(Vec::new());
        }

        match unwrap_list(reply.json()?) {
            Value::Null => Ok(Vec::new()),
            list => reply.decode(list),
        }
    }

    pub async fn get_by_id(&self, endpoint: &str, id: impl Display) -> ClientResult<Option<T>> {
        let url = self.item_url(endpoint, id)?;
        self.fetch_one(url).await
    }

    /// GET a single record at `endpoint`, such as the current user's profile
    pub async fn get_one(&self, endpoint: &str) -> ClientResult<Option<T>> {
        let url = self.url(endpoint)?;
        self.fetch_one(url).await
    }

    async fn fetch_one(&self, url: Url) -> ClientResult<Option<T>> {
        let reply = self
            .execute(self.request(Method::GET, url))
            .await?
            .ensure_success()?;
        if !reply.has_content() {
            return Ok(None);
        }
        match reply.json()? {
            Value::Null => Ok(None),
            value => reply.decode(value).map(Some),
        }
    }

    pub async fn create(&self, endpoint: &str, record: &T) -> ClientResult<MutationResponse<T>> {
        let url = self.url(endpoint)?;
        self.mutate(Operation::Create, Method::POST, url, Some(record)).await
    }

    /// PUT to `endpoint` itself, the record carries its own key
    pub async fn update(&self, endpoint: &str, record: &T) -> ClientResult<MutationResponse<T>> {
        let url = self.url(endpoint)?;
        self.mutate(Operation::Update, Method::PUT, url, Some(record)).await
    }

    pub async fn update_by_id(
        &self,
        endpoint: &str,
        id: impl Display,
        record: &T,
    ) -> ClientResult<MutationResponse<T>> {
        let url = self.item_url(endpoint, id)?;
        self.mutate(Operation::Update, Method::PUT, url, Some(record)).await
    }

    pub async fn delete(&self, endpoint: &str, id: impl Display) -> ClientResult<MutationResponse<T>> {
        let url = self.item_url(endpoint, id)?;
        self.mutate(Operation::Delete, Method::DELETE, url, None).await
    }

    async fn mutate(
        &self,
        operation: Operation,
        method: Method,
        url: Url,
        record: Option<&T>,
    ) -> ClientResult<MutationResponse<T>> {
        let mut builder = self.request(method, url);
        if let Some(record) = record {
            let body = codec::encode(record).map_err(ClientError::Encode)?;
            builder = builder.json(&body);
        }

        let reply = self.execute(builder).await?.ensure_success()?;
        envelope_of(operation, &reply)
    }

    /// POST one file as `multipart/form-data`.
    ///
    /// Size, name and field name are checked before anything is sent.
    pub async fn upload(
        &self,
        endpoint: &str,
        file: &UploadFile,
        options: &UploadOptions,
    ) -> ClientResult<MutationResponse<StoredDocument>> {
        options.check(file)?;
        let url = self.url(endpoint)?;

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.content_type())
            .map_err(|e| {
                ClientError::invalid_argument(format!(
                    "invalid content type '{}': {}",
                    file.content_type(),
                    e
                ))
            })?;
        let form = reqwest::multipart::Form::new().part(options.field_name.clone(), part);

        tracing::debug!(
            "Uploading '{}' ({} bytes) as '{}'",
            file.name,
            file.size(),
            options.field_name
        );
        let reply = self
            .execute(self.request(Method::POST, url).multipart(form))
            .await?
            .ensure_success()?;
        envelope_of(Operation::Upload, &reply)
    }
}

fn envelope_of<D: DeserializeOwned>(
    operation: Operation,
    reply: &Reply,
) -> ClientResult<MutationResponse<D>> {
    if !reply.has_content() {
        return Ok(MutationResponse::empty_success(operation));
    }
    let envelope = ResponseEnvelope::from_body(reply.json()?).map_err(|source| {
        ClientError::Decode {
            url: reply.url.clone(),
            source,
        }
    })?;
    if !envelope.success {
        tracing::warn!(
            "{} on {} reported failure: {}",
            operation,
            reply.url,
            envelope.message.as_deref().unwrap_or("no message")
        );
    }
    Ok(MutationResponse::from_envelope(operation, envelope))
}

/// Endpoint resolution through [`Entity`]
impl<T: Entity> ApiClient<T> {
    pub async fn list(&self, query: &Query) -> ClientResult<Vec<T>> {
        self.get_all(T::COLLECTION, query).await
    }

    pub async fn find(&self, id: impl Display) -> ClientResult<Option<T>> {
        self.get_by_id(T::ITEM, id).await
    }

    pub async fn insert(&self, record: &T) -> ClientResult<MutationResponse<T>> {
        self.create(T::COLLECTION, record).await
    }

    pub async fn save(&self, record: &T) -> ClientResult<MutationResponse<T>> {
        self.update_by_id(T::ITEM, record.key(), record).await
    }

    pub async fn remove(&self, id: impl Display) -> ClientResult<MutationResponse<T>> {
        self.delete(T::ITEM, id).await
    }
}
