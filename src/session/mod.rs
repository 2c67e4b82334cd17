//! Session - wallet connection → profile lookup → registration
//!
//! # State machine
//!
//! ```text
//!                 wallet connects (K)
//! Disconnected ───────────────────────► Connecting{K} ── find_by_wallet(K)
//!      ▲                                     │
//!      │ disconnect (any state)              ├── Some(user) ─► ProfileFound{user}
//!      │                                     ├── None ───────► ProfileMissing{K} ── register ─► ProfileFound
//!      └─────────────────────────────────────└── Err ────────► Error{K, e}       (retry)
//! ```
//!
//! # Stale results
//!
//! Every connect or disconnect bumps an epoch. Each store call carries a
//! [`LookupTicket`] `(epoch, address)` and its result is applied only if
//! the ticket still matches. The network call itself is never aborted.
//! The state mutex is never held across an `.await`.

mod state;

pub use state::{SessionError, SessionState, SessionView};

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::address::WalletAddress;
use crate::core::validation::validate_form_username;
use crate::runtime::Shutdown;
use crate::store::{StoreError, UserStore};
use crate::user::{NewUser, User, UserPatch};
use crate::wallet::WalletStatus;

/// Identifies the session a store call was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    epoch: u64,
    address: WalletAddress,
}

impl LookupTicket {
    pub fn address(&self) -> &WalletAddress { &self.address }
}

#[derive(Default)]
struct Inner {
    epoch: u64,
    wallet: Option<WalletAddress>,
    state: SessionState,
    registration_error: Option<StoreError>,
}

impl Inner {
    fn holds(&self, ticket: &LookupTicket) -> bool {
        self.epoch == ticket.epoch && self.wallet.as_ref() == Some(&ticket.address)
    }

    fn ticket(&self) -> Option<LookupTicket> {
        self.wallet.clone().map(|address| LookupTicket { epoch: self.epoch, address })
    }

    fn view(&self) -> SessionView {
        SessionView { state: self.state.clone(), registration_error: self.registration_error.clone() }
    }
}

/// Owns the session for one wallet adapter. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionCoordinator {
    store: Arc<dyn UserStore>,
    inner: Arc<Mutex<Inner>>,
    views: Arc<watch::Sender<SessionView>>,
}

impl SessionCoordinator {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        let (views, _) = watch::channel(SessionView::default());
        Self { store, inner: Arc::new(Mutex::new(Inner::default())), views: Arc::new(views) }
    }

    pub fn view(&self) -> SessionView { self.views.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> { self.views.subscribe() }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the state and publish. Called with the lock held so views go out in order.
    fn transition(&self, inner: &mut Inner, state: SessionState) {
        tracing::debug!(epoch = inner.epoch, from = inner.state.phase(), to = state.phase(), "session transition");
        inner.state = state;
        self.views.send_replace(inner.view());
    }

    fn begin(&self, inner: &mut Inner, address: WalletAddress) -> LookupTicket {
        inner.epoch += 1;
        inner.wallet = Some(address.clone());
        inner.registration_error = None;
        self.transition(inner, SessionState::Connecting { address: address.clone() });
        LookupTicket { epoch: inner.epoch, address }
    }

    /// Feed a wallet adapter report. Returns a ticket when a lookup must run;
    /// pass it to [`lookup`](Self::lookup). A repeated report for the current
    /// key returns `None`.
    pub fn wallet_changed(&self, status: &WalletStatus) -> Option<LookupTicket> {
        let Some(key) = status.active_key() else {
            self.disconnect();
            return None;
        };

        let mut inner = self.lock();
        match WalletAddress::parse(key) {
            Ok(address) if inner.wallet.as_ref() == Some(&address) => None,
            Ok(address) => Some(self.begin(&mut inner, address)),
            Err(e) => {
                tracing::warn!(error = %e, "wallet reported an invalid public key");
                inner.epoch += 1;
                inner.wallet = None;
                inner.registration_error = None;
                let error = StoreError::Validation(e.to_string());
                self.transition(&mut inner, SessionState::Error { address: None, error });
                None
            }
        }
    }

    /// Run the profile lookup for `ticket` and apply it if still current.
    pub async fn lookup(&self, ticket: LookupTicket) -> Result<SessionView, SessionError> {
        let result = match self.store.find_by_wallet(&ticket.address).await {
            Ok(Some(user)) if user.wallet_address != ticket.address => Err(StoreError::Transport(format!(
                "lookup for {} returned a profile for {}",
                ticket.address.short(),
                user.wallet_address.short()
            ))),
            other => other,
        };

        let mut inner = self.lock();
        if !inner.holds(&ticket) {
            tracing::debug!(epoch = ticket.epoch, current = inner.epoch, "discarding stale lookup result");
            return Err(SessionError::Superseded);
        }
        let next = match result {
            Ok(Some(user)) => SessionState::ProfileFound { user },
            Ok(None) => SessionState::ProfileMissing { address: ticket.address },
            Err(error) => {
                tracing::warn!(wallet = %ticket.address.short(), error = %error, "profile lookup failed");
                SessionState::Error { address: Some(ticket.address), error }
            }
        };
        self.transition(&mut inner, next);
        Ok(inner.view())
    }

    /// Start a session for `address` and wait for the lookup.
    pub async fn connect(&self, address: WalletAddress) -> Result<SessionView, SessionError> {
        let ticket = {
            let mut inner = self.lock();
            self.begin(&mut inner, address)
        };
        self.lookup(ticket).await
    }

    /// Drop the session. In-flight results are discarded when they arrive.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        let was_idle = inner.wallet.is_none() && inner.state == SessionState::Disconnected;
        inner.wallet = None;
        inner.registration_error = None;
        if !was_idle {
            self.transition(&mut inner, SessionState::Disconnected);
        }
    }

    /// Re-run a failed lookup. Only acts from `Error`.
    pub async fn retry(&self) -> Result<SessionView, SessionError> {
        let ticket = {
            let mut inner = self.lock();
            if inner.state == SessionState::Disconnected {
                return Err(SessionError::NotConnected);
            }
            if !matches!(inner.state, SessionState::Error { .. }) {
                return Ok(inner.view());
            }
            let address = inner.wallet.clone().ok_or(SessionError::NotConnected)?;
            self.begin(&mut inner, address)
        };
        self.lookup(ticket).await
    }

    /// Re-run the lookup for the current wallet from any connected state.
    pub async fn reconnect(&self) -> Result<SessionView, SessionError> {
        let ticket = {
            let mut inner = self.lock();
            let address = inner.wallet.clone().ok_or(SessionError::NotConnected)?;
            self.begin(&mut inner, address)
        };
        self.lookup(ticket).await
    }

    /// Register `username` for the connected wallet. Only from `ProfileMissing`.
    /// On failure the state stays `ProfileMissing` with the error attached.
    pub async fn register(&self, username: &str) -> Result<User, SessionError> {
        let username = username.trim();
        let ticket = {
            let mut inner = self.lock();
            let ticket = match (&inner.state, inner.ticket()) {
                (SessionState::ProfileMissing { .. }, Some(ticket)) => ticket,
                (SessionState::Disconnected, _) => return Err(SessionError::NotConnected),
                _ => return Err(SessionError::NotAwaitingRegistration),
            };
            if let Err(msg) = validate_form_username(username) {
                let error = StoreError::Validation(msg);
                inner.registration_error = Some(error.clone());
                let state = inner.state.clone();
                self.transition(&mut inner, state);
                return Err(error.into());
            }
            ticket
        };

        let result = self.store.create(NewUser::new(username, ticket.address.clone())).await;

        let mut inner = self.lock();
        if !inner.holds(&ticket) || !matches!(inner.state, SessionState::ProfileMissing { .. }) {
            tracing::debug!(epoch = ticket.epoch, "discarding stale registration result");
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(user) => {
                tracing::info!(wallet = %user.wallet_address.short(), username = %user.username, "profile registered");
                inner.registration_error = None;
                self.transition(&mut inner, SessionState::ProfileFound { user: user.clone() });
                Ok(user)
            }
            Err(error) => {
                tracing::warn!(wallet = %ticket.address.short(), error = %error, "registration failed");
                inner.registration_error = Some(error.clone());
                let state = inner.state.clone();
                self.transition(&mut inner, state);
                Err(error.into())
            }
        }
    }

    /// Update the loaded profile. The wallet address is fixed for the session.
    pub async fn update_profile(&self, patch: UserPatch) -> Result<User, SessionError> {
        if patch.wallet_address.is_some() {
            return Err(StoreError::Validation("Wallet address cannot be changed".into()).into());
        }
        let (ticket, id) = {
            let inner = self.lock();
            match (&inner.state, inner.ticket()) {
                (SessionState::ProfileFound { user }, Some(ticket)) => (ticket, user.id),
                (SessionState::Disconnected, _) => return Err(SessionError::NotConnected),
                _ => return Err(SessionError::NoProfile),
            }
        };

        let result = self.store.update(&id, patch).await;

        let mut inner = self.lock();
        let current = matches!(&inner.state, SessionState::ProfileFound { user } if user.id == id);
        if !inner.holds(&ticket) || !current {
            tracing::debug!(epoch = ticket.epoch, "discarding stale profile update");
            return Err(SessionError::Superseded);
        }
        let user = result?;
        self.transition(&mut inner, SessionState::ProfileFound { user: user.clone() });
        Ok(user)
    }

    fn on_wallet(&self, status: &WalletStatus) {
        if let Some(ticket) = self.wallet_changed(status) {
            let this = self.clone();
            tokio::spawn(async move {
                let _ = this.lookup(ticket).await;
            });
        }
    }

    /// Follow a wallet adapter's change feed until shutdown or until the
    /// adapter goes away. Lookups are spawned so a disconnect is handled
    /// while one is in flight.
    pub fn run(&self, mut wallet_rx: watch::Receiver<WalletStatus>, shutdown: Shutdown) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let initial = wallet_rx.borrow_and_update().clone();
            this.on_wallet(&initial);
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    changed = wallet_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = wallet_rx.borrow_and_update().clone();
                        this.on_wallet(&status);
                    }
                }
            }
            tracing::debug!("session driver stopped");
        })
    }
}
