//! Typed data layer for the single-page UI.
//!
//! The bearer token lives in an explicit [`AuthContext`] handed to the
//! [`ApiClient`]; any 401 clears it and fires the single `on_unauthorized`
//! hook. Mutations announce themselves through a [`RefreshHub`] so panels
//! re-fetch on demand instead of listening for ambient events.

use std::sync::{Arc, RwLock};

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::ErrorBody;
use crate::models::{
    AuthResponse, LoginInput, MessageResponse, NewProduct, NewTask, Product, ProductFilter, ProductPatch,
    RegisterInput, StoredImage, Task, TaskPatch,
};

mod filter;
mod gallery;
mod refresh;

pub use filter::DebouncedFilter;
pub use gallery::ImageGallery;
pub use refresh::{RefreshHub, Resource, SubscriptionId};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("{message} (status {status})")]
    Api { status: StatusCode, message: String },

    #[error("{0}")]
    Invalid(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad url: {0}")]
    Url(#[from] url::ParseError),
}

/// Holds the bearer token for the current session.
#[derive(Debug, Default)]
pub struct AuthContext {
    token: RwLock<Option<String>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        AuthContext {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    auth: Arc<AuthContext>,
    hub: RefreshHub,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient {
    /// `base` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base: &str, auth: Arc<AuthContext>) -> Result<Self, ClientError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(ApiClient {
            http: reqwest::Client::new(),
            base,
            auth,
            hub: RefreshHub::new(),
            on_unauthorized: None,
        })
    }

    /// Called once per 401, after the token has been cleared. This is where
    /// the UI sends the user back to the login screen.
    pub fn on_unauthorized(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    pub fn refresh_hub(&self) -> &RefreshHub {
        &self.hub
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::Invalid("base url cannot carry a path".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/'));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.auth.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let response = self.check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.auth.clear();
            if let Some(hook) = &self.on_unauthorized {
                hook();
            }
            return Err(ClientError::Unauthorized);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
        Err(ClientError::Api { status, message })
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        self.send(self.request(method, url).json(body)).await
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.send_json(Method::POST, &["auth", "register"], input).await?;
        self.auth.set_token(response.token.clone());
        Ok(response)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let input = LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.send_json(Method::POST, &["auth", "login"], &input).await?;
        self.auth.set_token(response.token.clone());
        Ok(response)
    }

    pub fn logout(&self) {
        self.auth.clear();
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let url = self.url(&["tasks"])?;
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn create_task(&self, input: &NewTask) -> Result<Task, ClientError> {
        let task = self.send_json(Method::POST, &["tasks"], input).await?;
        self.hub.notify(Resource::Tasks);
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError> {
        let task = self.send_json(Method::PUT, &["tasks", id], patch).await?;
        self.hub.notify(Resource::Tasks);
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&["tasks", id])?;
        let _: MessageResponse = self.send(self.request(Method::DELETE, url)).await?;
        self.hub.notify(Resource::Tasks);
        Ok(())
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ClientError> {
        let url = self.url(&["products"])?;
        self.send(self.request(Method::GET, url).query(&filter.query_pairs()))
            .await
    }

    pub async fn create_product(&self, input: &NewProduct) -> Result<Product, ClientError> {
        if !self.auth.is_authenticated() {
            return Err(ClientError::Invalid(
                "You must be logged in to create products".to_string(),
            ));
        }
        let product = self.send_json(Method::POST, &["products"], input).await?;
        self.hub.notify(Resource::Products);
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<Product, ClientError> {
        let product = self.send_json(Method::PUT, &["products", id], patch).await?;
        self.hub.notify(Resource::Products);
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&["products", id])?;
        let _: MessageResponse = self.send(self.request(Method::DELETE, url)).await?;
        self.hub.notify(Resource::Products);
        Ok(())
    }

    pub async fn list_images(&self) -> Result<Vec<StoredImage>, ClientError> {
        let url = self.url(&["images"])?;
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, ClientError> {
        check_upload(content_type, bytes.len())?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part);

        let url = self.url(&["images", "upload"])?;
        let stored = self.send(self.request(Method::POST, url).multipart(form)).await?;
        self.hub.notify(Resource::Images);
        Ok(stored)
    }

    pub async fn delete_image(&self, filename: &str) -> Result<(), ClientError> {
        let url = self.url(&["images", filename])?;
        let _: MessageResponse = self.send(self.request(Method::DELETE, url)).await?;
        self.hub.notify(Resource::Images);
        Ok(())
    }
}

/// The pre-flight check the UI runs before sending a file.
pub fn check_upload(content_type: &str, len: usize) -> Result<(), ClientError> {
    if len > DEFAULT_MAX_UPLOAD_BYTES {
        return Err(ClientError::Invalid("File size exceeds 5MB limit".to_string()));
    }
    if !content_type.starts_with("image/") {
        return Err(ClientError::Invalid("Only image files are allowed".to_string()));
    }
    Ok(())
}
