//! HTTP client with bearer auth and forced logout on 401.

use std::time::Duration;

use tracing::debug;

use courier_common::models::{Conversation, Message, UserProfile};
use courier_common::SessionHandle;

use crate::dto::{
    CreatedConversation, LoginRequest, LoginResponse, MessageHistory, NewConversation,
};
use crate::error::ApiError;

/// REST client for the chat server.
///
/// Cloneable; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: SessionHandle,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach the bearer token when the session holds one.
    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Check the status, funnelling 401 into session invalidation.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(ApiError::Status { status: status.as_u16(), message: text });
        }
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// Exchange credentials for a token and store both on the session.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<UserProfile, ApiError> {
        debug!(identifier, "logging in");
        let body = LoginRequest { identifier: identifier.into(), password: password.into() };
        let response = self.http.post(self.url("/auth/login")).json(&body).send().await?;
        let login: LoginResponse = self.check(response).await?.json().await?;
        self.session.authenticate(login.user.clone(), login.token);
        Ok(login.user)
    }

    /// All conversations the user participates in.
    pub async fn conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ApiError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/conversations/user/{user_id}"))))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub async fn conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/conversation/{conversation_id}"))))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// Create a conversation, optionally seeding it with a first message.
    pub async fn create_conversation(
        &self,
        body: &NewConversation,
    ) -> Result<CreatedConversation, ApiError> {
        let response =
            self.authed(self.http.post(self.url("/conversation")).json(body)).send().await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// Message history in chronological order (the server sends
    /// newest-first; this reverses it).
    pub async fn message_history(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/messages/conversation/{conversation_id}"))))
            .send()
            .await?;
        let history: MessageHistory = self.check(response).await?.json().await?;
        let mut messages = history.data;
        messages.reverse();
        Ok(messages)
    }

    pub async fn user(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        let response =
            self.authed(self.http.get(self.url(&format!("/users/{user_id}")))).send().await?;
        Ok(self.check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/", SessionHandle::new());
        assert_eq!(client.url("/users/u1"), "http://localhost:3000/users/u1");
    }
}
