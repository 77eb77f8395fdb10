//! REST collaborators: auth, conversation/group lists and message history.

use std::sync::Arc;

use reqwest::{
    cookie::{CookieStore, Jar},
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Conversation, ConversationId, Group, GroupId, GroupMessage, Message, User},
    error::{ApiError, ApiErrorBody},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub gender: String,
}

/// HTTP client for the chat REST API. Session cookies set by the auth
/// endpoints live in memory for the lifetime of this value.
#[derive(Debug, Clone)]
pub struct ChatApi {
    http: Client,
    cookies: Arc<Jar>,
    base_url: Url,
}

impl ChatApi {
    pub fn new(api_url: &str) -> ClientResult<Self> {
        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .build()?;
        Ok(Self {
            http,
            cookies,
            base_url: Url::parse(api_url)?,
        })
    }

    /// Appends `path` to the base URL, keeping any path prefix it has.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base = url.path().trim_end_matches('/');
        let path = format!("{base}/{}", path.trim_start_matches('/'));
        url.set_path(&path);
        url
    }

    /// `Cookie` header value the session holds for `url`, if any.
    pub fn session_cookie(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.cookies.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/api/auth/login", &request).await?;
        Ok(())
    }

    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<User> {
        let response = self.post_json("/api/auth/signup", request).await?;
        Ok(response.json().await?)
    }

    pub async fn refresh_token(&self) -> ClientResult<()> {
        self.post_empty("/api/auth/refresh").await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.post_empty("/api/auth/logout").await
    }

    pub async fn profile(&self) -> ClientResult<User> {
        self.get_json("/api/auth/profile").await
    }

    pub async fn conversations(&self) -> ClientResult<Vec<Conversation>> {
        self.get_json("/api/conversations").await
    }

    pub async fn groups(&self) -> ClientResult<Vec<Group>> {
        self.get_json("/api/groups").await
    }

    pub async fn conversation_messages(&self, id: &ConversationId) -> ClientResult<Vec<Message>> {
        self.get_json(&format!("/api/conversations/{id}/messages"))
            .await
    }

    pub async fn group_messages(&self, id: &GroupId) -> ClientResult<Vec<GroupMessage>> {
        self.get_json(&format!("/api/groups/{id}/messages")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path);
        debug!(%url, "api: GET");
        let response = self.http.get(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Response> {
        let url = self.endpoint(path);
        debug!(%url, "api: POST");
        let response = self.http.post(url).json(body).send().await?;
        check_status(response).await
    }

    async fn post_empty(&self, path: &str) -> ClientResult<()> {
        let url = self.endpoint(path);
        debug!(%url, "api: POST");
        let response = self.http.post(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Turns a non-2xx response into `ClientError::Api`, decoding the error
/// body when it has the API's shape.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let err = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => ApiError::from(body),
        Err(_) => {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            };
            ApiError::new(status.as_u16(), message)
        }
    };
    warn!(status = status.as_u16(), "api: request rejected: {}", err.message);
    Err(ClientError::Api(err))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
