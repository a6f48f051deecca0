use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::StoreError;
use super::types::{
    ActionRecord, AuthRequest, AuthResponse, CounterValue, NewUser, OrderUpdate, SessionFields,
};
use crate::orders::Order;

/// Persistence and auth backend the session writes to.
///
/// Implemented by [`HttpStore`] for the real backend and [`OfflineStore`]
/// when no backend is configured; tests provide in-memory recorders.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    async fn create_user(&self, user: &NewUser) -> Result<(), StoreError>;

    async fn authenticate_user(&self, id: &str, password: &str) -> Result<bool, StoreError>;

    async fn add_action(
        &self,
        user_id: &str,
        record: &ActionRecord,
        key: &str,
    ) -> Result<(), StoreError>;

    async fn add_order(
        &self,
        user_id: &str,
        order: &Order,
        order_id: &str,
    ) -> Result<(), StoreError>;

    async fn update_order(
        &self,
        user_id: &str,
        update: &OrderUpdate,
        order_id: &str,
    ) -> Result<(), StoreError>;

    async fn update_fields(&self, user_id: &str, fields: &SessionFields) -> Result<(), StoreError>;

    /// Current value of the shared condition counter.
    async fn get_counter(&self) -> Result<u64, StoreError>;

    async fn increment_counter(&self) -> Result<(), StoreError>;
}

/// JSON-over-HTTP client for the session backend.
pub struct HttpStore {
    base_url: Url,
    token: Option<String>,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!(%method, %url, "store request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let body = self.send(builder).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl RemoteStore for HttpStore {
    async fn create_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let req = self.request(Method::PUT, &["users", user.id.as_str()]).json(user);
        self.send(req).await.map(drop)
    }

    async fn authenticate_user(&self, id: &str, password: &str) -> Result<bool, StoreError> {
        let body = AuthRequest {
            id: id.to_string(),
            password: password.to_string(),
        };
        let req = self.request(Method::POST, &["auth"]).json(&body);
        let resp: AuthResponse = self.send_json(req).await?;
        Ok(resp.authenticated)
    }

    async fn add_action(
        &self,
        user_id: &str,
        record: &ActionRecord,
        key: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .request(Method::PUT, &["users", user_id, "actions", key])
            .json(record);
        self.send(req).await.map(drop)
    }

    async fn add_order(
        &self,
        user_id: &str,
        order: &Order,
        order_id: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .request(Method::PUT, &["users", user_id, "orders", order_id])
            .json(order);
        self.send(req).await.map(drop)
    }

    async fn update_order(
        &self,
        user_id: &str,
        update: &OrderUpdate,
        order_id: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .request(Method::PATCH, &["users", user_id, "orders", order_id])
            .json(update);
        self.send(req).await.map(drop)
    }

    async fn update_fields(&self, user_id: &str, fields: &SessionFields) -> Result<(), StoreError> {
        let req = self.request(Method::PATCH, &["users", user_id]).json(fields);
        self.send(req).await.map(drop)
    }

    async fn get_counter(&self) -> Result<u64, StoreError> {
        let req = self.request(Method::GET, &["counter"]);
        let counter: CounterValue = self.send_json(req).await?;
        Ok(counter.value)
    }

    async fn increment_counter(&self) -> Result<(), StoreError> {
        let req = self.request(Method::POST, &["counter", "increment"]);
        self.send(req).await.map(drop)
    }
}

/// Store used when no backend is configured: accepts every write and always
/// hands out condition 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

impl RemoteStore for OfflineStore {
    async fn create_user(&self, _user: &NewUser) -> Result<(), StoreError> {
        Ok(())
    }

    async fn authenticate_user(&self, _id: &str, _password: &str) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn add_action(
        &self,
        _user_id: &str,
        _record: &ActionRecord,
        _key: &str,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn add_order(
        &self,
        _user_id: &str,
        _order: &Order,
        _order_id: &str,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn update_order(
        &self,
        _user_id: &str,
        _update: &OrderUpdate,
        _order_id: &str,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn update_fields(&self, _user_id: &str, _fields: &SessionFields) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_counter(&self) -> Result<u64, StoreError> {
        Ok(0)
    }

    async fn increment_counter(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
