//! Single-flight token refresh.
//!
//! At most one refresh exchange runs per client. The first caller to need
//! new credentials starts the exchange on a spawned task and parks a shared
//! handle to its outcome; every caller arriving while it runs awaits that
//! same handle. The slot is cleared once the exchange resolves, whether
//! the task finished or aborted, so the next 401 starts a fresh cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{Instrument, debug, info, info_span, warn};

use muzikax_core::{AccessToken, RefreshFailure, TokenStore};

use crate::endpoints::{RefreshRequest, RefreshResponse};
use crate::transport::HttpTransport;

/// Outcome shared by every waiter of one refresh exchange.
pub type RefreshOutcome = Result<AccessToken, RefreshFailure>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// The refresh currently in flight, tagged with its cycle number.
struct InFlight {
    cycle: u64,
    outcome: SharedRefresh,
}

/// The access token the last successful exchange replaced, and the one it
/// issued.
struct Rotation {
    replaced: AccessToken,
    issued: AccessToken,
}

#[derive(Default)]
struct Slot {
    in_flight: Option<InFlight>,
    last_rotation: Option<Rotation>,
}

pub(crate) struct Refresher {
    transport: HttpTransport,
    refresh_url: String,
    store: Arc<dyn TokenStore>,
    slot: Arc<Mutex<Slot>>,
    cycles: AtomicU64,
}

impl Refresher {
    pub fn new(transport: HttpTransport, refresh_url: String, store: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            refresh_url,
            store,
            slot: Arc::new(Mutex::new(Slot::default())),
            cycles: AtomicU64::new(0),
        }
    }

    /// Obtain new credentials, joining the exchange already in flight if
    /// there is one.
    ///
    /// `stale` is the access token the caller saw rejected. If the last
    /// completed exchange already replaced exactly that token, its result
    /// is reused instead of starting another cycle.
    pub async fn refresh(&self, stale: Option<&AccessToken>) -> RefreshOutcome {
        let outcome = {
            let mut slot = lock(&self.slot);

            if let Some(pending) = slot.in_flight.as_ref() {
                debug!(cycle = pending.cycle, "Joining in-flight refresh");
                pending.outcome.clone()
            } else if let Some(rotation) = slot
                .last_rotation
                .as_ref()
                .filter(|rotation| stale == Some(&rotation.replaced))
            {
                debug!("Token already rotated by the previous refresh");
                return Ok(rotation.issued.clone());
            } else {
                let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
                let outcome = self.start(cycle);
                slot.in_flight = Some(InFlight {
                    cycle,
                    outcome: outcome.clone(),
                });
                outcome
            }
        };

        outcome.await
    }

    /// Number of refresh cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    fn start(&self, cycle: u64) -> SharedRefresh {
        let transport = self.transport.clone();
        let refresh_url = self.refresh_url.clone();
        let store = Arc::clone(&self.store);
        let shared_slot = Arc::clone(&self.slot);

        // The exchange runs detached so a cancelled caller cannot abort a
        // refresh other requests are waiting on.
        let task = tokio::spawn(
            async move {
                let replaced = store.access_token().await.ok().flatten();
                let outcome = exchange(&transport, &refresh_url, store.as_ref()).await;

                let mut slot = lock(&shared_slot);
                clear_in_flight(&mut slot, cycle);
                if let (Ok(issued), Some(replaced)) = (&outcome, replaced) {
                    slot.last_rotation = Some(Rotation {
                        replaced,
                        issued: issued.clone(),
                    });
                }

                outcome
            }
            .instrument(info_span!("refresh", cycle)),
        );

        // A panicked or cancelled task never reaches its own cleanup.
        let abort_slot = Arc::clone(&self.slot);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, cycle, "Refresh task did not complete");
                    clear_in_flight(&mut lock(&abort_slot), cycle);
                    Err(RefreshFailure::Aborted)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Empty the slot if it still holds `cycle`.
fn clear_in_flight(slot: &mut Slot, cycle: u64) {
    if slot
        .in_flight
        .as_ref()
        .is_some_and(|pending| pending.cycle == cycle)
    {
        slot.in_flight = None;
    }
}

/// One refresh exchange against the refresh endpoint.
///
/// Stored credentials are only touched on success.
async fn exchange(
    transport: &HttpTransport,
    refresh_url: &str,
    store: &dyn TokenStore,
) -> RefreshOutcome {
    let refresh_token = match store.refresh_token().await {
        Ok(Some(token)) => token,
        Ok(None) => {
            debug!("No refresh token stored, skipping exchange");
            return Err(RefreshFailure::MissingRefreshToken);
        }
        Err(e) => {
            return Err(RefreshFailure::Store {
                message: e.to_string(),
            });
        }
    };

    info!("Refreshing access token");

    let request = RefreshRequest {
        refresh_token: refresh_token.as_str(),
    };

    let response = transport
        .post_json(refresh_url, &request)
        .await
        .map_err(|e| RefreshFailure::Transport {
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "Refresh endpoint rejected the refresh token");
        return Err(RefreshFailure::Rejected {
            status: status.as_u16(),
        });
    }

    let body = response
        .json::<RefreshResponse>()
        .await
        .map_err(|e| RefreshFailure::Malformed {
            message: e.to_string(),
        })?;

    let credentials = body
        .into_credentials()
        .ok_or_else(|| RefreshFailure::Malformed {
            message: "empty token in refresh response".to_string(),
        })?;

    store
        .set_credentials(&credentials)
        .await
        .map_err(|e| RefreshFailure::Store {
            message: e.to_string(),
        })?;

    debug!("Refreshed tokens persisted");
    Ok(credentials.access_token)
}
