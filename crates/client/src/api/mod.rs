//! REST client for the external shop backend.
//!
//! The backend owns all business rules; this client is transport only.
//! `reqwest` for HTTP, JSON bodies throughout, and a `moka` cache in
//! front of the product reads (5-minute TTL). Authenticated calls take
//! the bearer token per call: token storage belongs to the session
//! manager, not here.

mod types;

pub use types::{
    Account, ChangePasswordInput, Credentials, EditAccountInput, Order, OrderedProduct, Product,
    RegisterInput, TokenPair,
};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use shopfront_core::{Email, Locale, OrderId, OrderedProductId, ProductId, Rating};

use crate::config::ClientConfig;
use types::ApiMessage;

/// Message key rendered when the backend gave no usable one.
pub const GENERIC_MESSAGE_KEY: &str = "error.unexpected";

/// Errors that can occur when calling the shop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was missing, expired, or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success response. `message_key` is the localization
    /// key from the error body, when the backend provided one.
    #[error("API returned {status}: {}", .message_key.as_deref().unwrap_or(GENERIC_MESSAGE_KEY))]
    Status {
        status: u16,
        message_key: Option<String>,
    },
}

impl ApiError {
    /// The localization key a consumer should render for this error.
    ///
    /// Server-provided keys win; everything else falls back to the
    /// generic key.
    #[must_use]
    pub fn message_key(&self) -> &str {
        match self {
            Self::Status {
                message_key: Some(key),
                ..
            } => key,
            _ => GENERIC_MESSAGE_KEY,
        }
    }
}

/// Cached value wrapper so one cache serves both product reads.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

// =============================================================================
// ShopApiClient
// =============================================================================

/// Client for the external shop REST API.
///
/// Cheaply cloneable via `Arc`. Product list and detail reads are cached
/// for 5 minutes; mutations are never cached and archiving invalidates
/// the affected entries.
#[derive(Clone)]
pub struct ShopApiClient {
    inner: Arc<ShopApiClientInner>,
}

struct ShopApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl ShopApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ShopApiClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange login credentials for a token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, credentials), fields(login = %credentials.login()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
        let body = serde_json::json!({
            "login": credentials.login(),
            "password": credentials.password().expose_secret(),
        });

        let response = self
            .inner
            .client
            .post(self.url("auth"))
            .json(&body)
            .send()
            .await?;

        parse_response(response, "credentials").await
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// The current (possibly near-expiry) bearer token authorizes the
    /// call; the refresh token rides in the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected or the request fails.
    #[instrument(skip(self, refresh_token, token))]
    pub async fn extend_session(
        &self,
        refresh_token: &str,
        token: &str,
    ) -> Result<TokenPair, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("auth/extend/{refresh_token}")))
            .bearer_auth(token)
            .send()
            .await?;

        parse_response(response, "session").await
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Fetch the signed-in user's account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn account(&self, token: &str) -> Result<Account, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url("account/self"))
            .bearer_auth(token)
            .send()
            .await?;

        parse_response(response, "account").await
    }

    /// Update the signed-in user's names.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation is rejected.
    #[instrument(skip(self, token, input))]
    pub async fn edit_account(
        &self,
        token: &str,
        input: &EditAccountInput,
    ) -> Result<Account, ApiError> {
        let response = self
            .inner
            .client
            .put(self.url("account/self/edit"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        parse_response(response, "account").await
    }

    /// Change the signed-in user's email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation is rejected.
    #[instrument(skip(self, token, new_email))]
    pub async fn change_email(&self, token: &str, new_email: &Email) -> Result<(), ApiError> {
        let body = serde_json::json!({ "newEmail": new_email });

        let response = self
            .inner
            .client
            .put(self.url("account/self/change-email"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        expect_success(response, "account").await
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the current password is rejected or the
    /// request fails.
    #[instrument(skip(self, token, input))]
    pub async fn change_password(
        &self,
        token: &str,
        input: &ChangePasswordInput,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "currentPassword": input.current_password.expose_secret(),
            "newPassword": input.new_password.expose_secret(),
        });

        let response = self
            .inner
            .client
            .put(self.url("account/self/change-password"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        expect_success(response, "account").await
    }

    /// Change the signed-in user's display locale.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn change_locale(&self, token: &str, locale: Locale) -> Result<(), ApiError> {
        let body = serde_json::json!({ "locale": locale });

        let response = self
            .inner
            .client
            .put(self.url("account/self/change-locale"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        expect_success(response, "account").await
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a new account. The backend mails a confirmation token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login or email is taken or validation fails.
    #[instrument(skip(self, input), fields(login = %input.login))]
    pub async fn register(&self, input: &RegisterInput) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "login": input.login,
            "email": input.email,
            "password": input.password.expose_secret(),
            "locale": input.locale,
        });

        let response = self
            .inner
            .client
            .post(self.url("accounts/self/register"))
            .json(&body)
            .send()
            .await?;

        expect_success(response, "registration").await
    }

    /// Redeem a mailed confirmation token, activating the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is unknown or already used.
    #[instrument(skip(self, confirmation_token))]
    pub async fn confirm_registration(&self, confirmation_token: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .put(self.url("account/self/register/confirm"))
            .query(&[("token", confirmation_token)])
            .send()
            .await?;

        expect_success(response, "registration").await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch all product listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "products:all".to_string();

        // Check cache
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response = self.inner.client.get(self.url("products")).send().await?;
        let products: Vec<Product> = parse_response(response, "products").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_by_id(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response = self
            .inner
            .client
            .get(self.url(&format!("products/id/{id}")))
            .send()
            .await?;
        let product: Product = parse_response(response, &format!("product {id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Withdraw a product from sale. Staff only.
    ///
    /// Invalidates the cached listing and detail on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks the role or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn archive_product(&self, token: &str, id: ProductId) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .put(self.url(&format!("products/id/{id}/archive")))
            .bearer_auth(token)
            .send()
            .await?;

        expect_success(response, &format!("product {id}")).await?;

        self.inner.cache.invalidate(&format!("product:{id}")).await;
        self.inner.cache.invalidate("products:all").await;

        Ok(())
    }

    // =========================================================================
    // Order Methods (not cached - mutable state)
    // =========================================================================

    /// Fetch the orders visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url("orders"))
            .bearer_auth(token)
            .send()
            .await?;

        parse_response(response, "orders").await
    }

    /// Fetch a single order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order_by_id(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("orders/id/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        parse_response(response, &format!("order {id}")).await
    }

    /// Leave a rating on an ordered product.
    ///
    /// # Errors
    ///
    /// Returns an error if a rating already exists or the request fails.
    #[instrument(skip(self, token), fields(ordered_product_id = %id))]
    pub async fn rate_ordered_product(
        &self,
        token: &str,
        id: OrderedProductId,
        rating: Rating,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "rate": rating.stars() });

        let response = self
            .inner
            .client
            .post(self.url(&format!("orders/orderedProducts/{id}/rate")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        expect_success(response, &format!("ordered product {id}")).await
    }

    /// Replace an existing rating on an ordered product.
    ///
    /// # Errors
    ///
    /// Returns an error if no rating exists yet or the request fails.
    #[instrument(skip(self, token), fields(ordered_product_id = %id))]
    pub async fn update_rating(
        &self,
        token: &str,
        id: OrderedProductId,
        rating: Rating,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "rate": rating.stars() });

        let response = self
            .inner
            .client
            .put(self.url(&format!("orders/orderedProducts/{id}/rate")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        expect_success(response, &format!("ordered product {id}")).await
    }

    /// Remove the caller's rating from an ordered product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(ordered_product_id = %id))]
    pub async fn delete_rating(&self, token: &str, id: OrderedProductId) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("orders/orderedProducts/{id}/rate")))
            .bearer_auth(token)
            .send()
            .await?;

        expect_success(response, &format!("ordered product {id}")).await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Consume a response into `T`, mapping non-success statuses to errors.
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, ApiError> {
    let response = check_status(response, what).await?;
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse API response"
        );
        ApiError::Parse(e)
    })
}

/// Consume a response where only the status matters.
async fn expect_success(response: reqwest::Response, what: &str) -> Result<(), ApiError> {
    check_status(response, what).await.map(|_| ())
}

/// Map non-success statuses to the error taxonomy, extracting the
/// localization key from the error body when one is present.
async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_owned()));
    }

    let message_key = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ApiMessage>(&body).ok())
        .and_then(|m| m.message);

    Err(ApiError::Status {
        status: status.as_u16(),
        message_key,
    })
}
