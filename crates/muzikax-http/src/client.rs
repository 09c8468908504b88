//! Authenticated request execution.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use muzikax_core::error::InvalidInputError;
use muzikax_core::{AccessToken, ApiUrl, AuthKind, RefreshFailure, Result, TokenStore};

use crate::config::ClientConfig;
use crate::refresh::{RefreshOutcome, Refresher};
use crate::request::PendingRequest;
use crate::transport::{self, HttpTransport};

/// Which dispatch of a logical request is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Retry,
}

/// Lifecycle of one logical request.
///
/// `Idle -> Attempting(Primary) -> {Succeeded, AuthFailed}`, then
/// `AuthFailed -> RefreshPending -> {RefreshSucceeded -> Attempting(Retry)
/// -> {Succeeded, Failed}, RefreshFailed -> Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Attempting(Attempt),
    AuthFailed,
    RefreshPending,
    RefreshSucceeded,
    RefreshFailed,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }

    fn settled(status: StatusCode) -> Self {
        if status.is_success() {
            RequestState::Succeeded
        } else {
            RequestState::Failed
        }
    }
}

/// The result of [`AuthenticatedClient::execute`]: the response handed back
/// to the caller plus how it was reached.
#[derive(Debug)]
pub struct Exchange {
    /// The response to return to the caller, unmodified.
    pub response: reqwest::Response,
    /// Terminal state of the request.
    pub state: RequestState,
    /// Whether a retry was dispatched after refreshing credentials.
    pub retried: bool,
    /// Why the refresh failed, when the original 401 is being returned.
    pub refresh_failure: Option<RefreshFailure>,
}

/// HTTP client that attaches the stored access token to every request and
/// recovers from an expired token with one refresh and one retry.
///
/// Cheap to clone; clones share the token store and the in-flight refresh.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use muzikax_core::{ApiUrl, MemoryTokenStore, Credentials};
/// use muzikax_http::{AuthenticatedClient, ClientConfig};
///
/// # async fn example() -> Result<(), muzikax_core::Error> {
/// let config = ClientConfig::new(ApiUrl::new("https://api.muzikax.com")?);
/// let store = Arc::new(MemoryTokenStore::with_credentials(&Credentials::new("a", "r")));
/// let client = AuthenticatedClient::new(config, store)?;
///
/// let response = client.request(client.pending_get("/api/creator/analytics")).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: HttpTransport,
    store: Arc<dyn TokenStore>,
    refresher: Refresher,
}

impl AuthenticatedClient {
    /// Create a client reading and persisting tokens through `store`.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let refresher = Refresher::new(transport.clone(), config.refresh_url(), Arc::clone(&store));

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                refresher,
            }),
        })
    }

    pub fn api_url(&self) -> &ApiUrl {
        &self.inner.config.api_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The token store this client reads and writes.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.inner.transport
    }

    /// Number of refresh exchanges this client has started.
    pub fn refresh_cycles(&self) -> u64 {
        self.inner.refresher.cycles()
    }

    /// A request against an API path.
    ///
    /// An absolute URL is kept as given, but [`execute`](Self::execute)
    /// refuses it unless it shares the API origin.
    pub fn pending(&self, method: Method, path: &str) -> PendingRequest {
        PendingRequest::new(method, self.api_url().endpoint(path))
    }

    pub fn pending_get(&self, path: &str) -> PendingRequest {
        self.pending(Method::GET, path)
    }

    /// Send `request` with the current access token.
    ///
    /// On 401 the credentials are refreshed once and the request retried
    /// once; the retry's response is returned whatever its status. If the
    /// refresh fails the original 401 response is returned. Any other
    /// response is returned as-is.
    ///
    /// # Errors
    ///
    /// - [`AuthKind::NoCredentials`] when the store holds no access token;
    ///   nothing is sent.
    /// - [`InvalidInputError::ForeignOrigin`] when the request URL is not on
    ///   the API origin; the token never leaves for another host.
    /// - Transport errors from either dispatch.
    pub async fn request(&self, request: PendingRequest) -> Result<reqwest::Response> {
        Ok(self.execute(request).await?.response)
    }

    /// Like [`request`](Self::request), also reporting how the response
    /// was reached.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: PendingRequest) -> Result<Exchange> {
        let mut state = RequestState::Idle;

        if !self.api_url().is_same_origin(request.url()) {
            return Err(InvalidInputError::ForeignOrigin {
                url: request.url().to_string(),
            }
            .into());
        }

        let token = self
            .inner
            .store
            .access_token()
            .await?
            .ok_or(AuthKind::NoCredentials)?;

        advance(&mut state, RequestState::Attempting(Attempt::Primary));
        let response = self.inner.transport.dispatch(&request, &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            advance(&mut state, RequestState::settled(response.status()));
            return Ok(Exchange {
                response,
                state,
                retried: false,
                refresh_failure: None,
            });
        }

        advance(&mut state, RequestState::AuthFailed);
        advance(&mut state, RequestState::RefreshPending);

        let fresh = match self.fresh_token(&token).await {
            Ok(fresh) => fresh,
            Err(reason) => {
                warn!(%reason, "Token refresh failed, returning original response");
                advance(&mut state, RequestState::RefreshFailed);
                advance(&mut state, RequestState::Failed);
                return Ok(Exchange {
                    response,
                    state,
                    retried: false,
                    refresh_failure: Some(reason),
                });
            }
        };

        advance(&mut state, RequestState::RefreshSucceeded);
        advance(&mut state, RequestState::Attempting(Attempt::Retry));
        let retried = self.inner.transport.dispatch(&request, &fresh).await?;

        advance(&mut state, RequestState::settled(retried.status()));
        Ok(Exchange {
            response: retried,
            state,
            retried: true,
            refresh_failure: None,
        })
    }

    /// Force a refresh exchange, joining one already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.inner.refresher.refresh(None).await
    }

    /// Send `request` and map failures onto the error taxonomy.
    ///
    /// 2xx responses pass through. A 401 becomes [`AuthKind::AuthFailed`]
    /// when the refresh failed, or [`AuthKind::Unauthorized`] when the
    /// retry itself was rejected. Other statuses become
    /// [`muzikax_core::error::UpstreamError`].
    pub async fn send(&self, request: PendingRequest) -> Result<reqwest::Response> {
        let exchange = self.execute(request).await?;
        let status = exchange.response.status();

        if status.is_success() {
            return Ok(exchange.response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(match exchange.refresh_failure {
                Some(reason) => AuthKind::AuthFailed { reason }.into(),
                None => AuthKind::Unauthorized {
                    message: transport::error_message(exchange.response).await,
                }
                .into(),
            });
        }

        Err(transport::upstream_error(exchange.response).await)
    }

    /// GET an API path and deserialize the JSON response.
    pub async fn get_json<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.send(self.pending_get(path)).await?;
        transport::read_json(response).await
    }

    /// Send a JSON body to an API path and deserialize the JSON response.
    pub async fn send_json<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.pending(method, path).json(body)?;
        let response = self.send(request).await?;
        transport::read_json(response).await
    }

    /// The access token for a retry after `stale` was rejected.
    ///
    /// If another request already replaced `stale` in the store, that token
    /// is used without a new exchange.
    async fn fresh_token(&self, stale: &AccessToken) -> RefreshOutcome {
        let current = self
            .inner
            .store
            .access_token()
            .await
            .map_err(|e| RefreshFailure::Store {
                message: e.to_string(),
            })?;

        if let Some(current) = current
            && &current != stale
        {
            debug!("Access token already refreshed by another request");
            return Ok(current);
        }

        self.inner.refresher.refresh(Some(stale)).await
    }
}

fn advance(state: &mut RequestState, next: RequestState) {
    debug!(from = ?state, to = ?next, "Request state");
    *state = next;
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("api_url", &self.inner.config.api_url)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
