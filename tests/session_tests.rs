//! Integration Tests: session flow driven by a local wallet
//!
//! These tests verify:
//! 1. Unknown wallet → ProfileMissing → register → ProfileFound
//! 2. Disconnect during an in-flight lookup discards the late result
//! 3. Account switch (mid-lookup or after ProfileFound) shows only the new account
//! 4. Username conflicts between two wallets
//! 5. Wallet and profile addresses agree

use async_trait::async_trait;
use eventdao::{
    LocalWallet, MemoryUserStore, NewUser, SessionCoordinator, SessionState, SessionView, Shutdown, StoreError,
    StoreResult, User, UserId, UserPatch, UserStore, WalletAdapter, WalletAddress,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Holds lookups for one wallet until `release()`.
struct GatedStore {
    inner: MemoryUserStore,
    gated: WalletAddress,
    gate: Semaphore,
    started: Notify,
    finished: Notify,
}

impl GatedStore {
    fn new(gated: WalletAddress) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryUserStore::new(),
            gated,
            gate: Semaphore::new(0),
            started: Notify::new(),
            finished: Notify::new(),
        })
    }

    fn release(&self) { self.gate.add_permits(1); }
}

#[async_trait]
impl UserStore for GatedStore {
    async fn find_by_wallet(&self, address: &WalletAddress) -> StoreResult<Option<User>> {
        if address == &self.gated {
            self.started.notify_one();
            let _permit = self.gate.acquire().await.map_err(|_| StoreError::Transport("gate closed".into()))?;
            let result = self.inner.find_by_wallet(address).await;
            self.finished.notify_one();
            return result;
        }
        self.inner.find_by_wallet(address).await
    }
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> { self.inner.find_by_id(id).await }
    async fn list(&self) -> StoreResult<Vec<User>> { self.inner.list().await }
    async fn create(&self, new_user: NewUser) -> StoreResult<User> { self.inner.create(new_user).await }
    async fn update(&self, id: &UserId, patch: UserPatch) -> StoreResult<User> { self.inner.update(id, patch).await }
    async fn delete(&self, id: &UserId) -> StoreResult<()> { self.inner.delete(id).await }
}

fn settled(view: &SessionView) -> bool {
    matches!(
        view.state,
        SessionState::ProfileFound { .. } | SessionState::ProfileMissing { .. } | SessionState::Error { .. }
    )
}

/// Test: W1 has no profile, registers "bob", ends up ProfileFound with W1
#[tokio::test]
async fn new_wallet_registers_and_finds_profile() {
    let store = Arc::new(MemoryUserStore::new());
    let session = SessionCoordinator::new(store.clone());
    let wallet = LocalWallet::from_seed([1; 32]);
    let shutdown = Shutdown::new();
    let mut views = session.subscribe();
    let driver = session.run(wallet.subscribe(), shutdown.clone());

    wallet.connect();
    views.wait_for(settled).await.expect("view");
    let view = session.view();
    assert_eq!(view.state, SessionState::ProfileMissing { address: wallet.address() });
    assert_eq!(view.redirect(), Some("/setup-username"));

    let user = session.register("bob").await.expect("register");
    assert_eq!(user.username, "bob");
    assert_eq!(user.wallet_address, wallet.address());
    assert_eq!(session.view().user(), Some(&user));

    // Store agrees, and repeated lookups are identical
    let first = store.find_by_wallet(&wallet.address()).await.expect("find");
    let second = store.find_by_wallet(&wallet.address()).await.expect("find");
    assert_eq!(first, Some(user));
    assert_eq!(first, second);

    shutdown.trigger();
    driver.await.expect("driver");
}

/// Test: Reconnecting a wallet that already has a profile goes straight to ProfileFound
#[tokio::test]
async fn returning_wallet_finds_profile() {
    let store = Arc::new(MemoryUserStore::new());
    let wallet = LocalWallet::from_seed([2; 32]);
    let alice = store.create(NewUser::new("alice", wallet.address())).await.expect("create");

    let session = SessionCoordinator::new(store);
    let mut views = session.subscribe();
    let _driver = session.run(wallet.subscribe(), Shutdown::new());
    wallet.connect();
    views.wait_for(settled).await.expect("view");

    let view = session.view();
    assert_eq!(view.user(), Some(&alice));
    assert_eq!(view.user().map(|u| &u.wallet_address), Some(&wallet.address()));
    assert!(view.redirect().is_none());
}

/// Test: Disconnect while the lookup is in flight; the late result is dropped
#[tokio::test]
async fn disconnect_discards_in_flight_lookup() {
    let wallet = LocalWallet::from_seed([3; 32]);
    let store = GatedStore::new(wallet.address());
    store.inner.create(NewUser::new("carol", wallet.address())).await.expect("create");

    let session = SessionCoordinator::new(store.clone());
    let mut views = session.subscribe();
    let _driver = session.run(wallet.subscribe(), Shutdown::new());

    wallet.connect();
    store.started.notified().await;
    assert!(matches!(session.view().state, SessionState::Connecting { .. }));

    wallet.disconnect();
    views.wait_for(|v| v.state == SessionState::Disconnected).await.expect("view");
    views.borrow_and_update();

    store.release();
    store.finished.notified().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(session.view().state, SessionState::Disconnected);
    assert!(!views.has_changed().expect("sender alive"));
}

/// Test: Switching accounts mid-lookup shows only the second account
#[tokio::test]
async fn account_switch_shows_only_new_account() {
    let first = LocalWallet::from_seed([4; 32]).address();
    let second = LocalWallet::from_seed([5; 32]).address();
    let store = GatedStore::new(first.clone());
    store.inner.create(NewUser::new("dana", first.clone())).await.expect("create");
    let erin = store.inner.create(NewUser::new("erin", second.clone())).await.expect("create");

    let session = SessionCoordinator::new(store.clone());
    let mut views = session.subscribe();
    let wallet = LocalWallet::from_seed([4; 32]);
    let _driver = session.run(wallet.subscribe(), Shutdown::new());

    wallet.connect();
    store.started.notified().await;
    wallet.switch_account([5; 32]);
    views.wait_for(settled).await.expect("view");
    assert_eq!(session.view().user(), Some(&erin));

    store.release();
    store.finished.notified().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let view = session.view();
    assert_eq!(view.user(), Some(&erin));
    assert_eq!(view.state.address(), Some(&second));
}

/// Test: Switching away from a found profile drops it before the new lookup runs
#[tokio::test]
async fn account_switch_after_profile_found_clears_old_user() {
    let wallet = LocalWallet::from_seed([6; 32]);
    let second = LocalWallet::from_seed([7; 32]).address();
    let store = Arc::new(MemoryUserStore::new());
    let frank = store.create(NewUser::new("frank", wallet.address())).await.expect("create");
    let session = SessionCoordinator::new(store);

    wallet.connect();
    let ticket = session.wallet_changed(&wallet.status()).expect("connect starts a lookup");
    let view = session.lookup(ticket).await.expect("lookup");
    assert_eq!(view.user(), Some(&frank));

    wallet.switch_account([7; 32]);
    let ticket = session.wallet_changed(&wallet.status()).expect("switch starts a lookup");
    assert_eq!(ticket.address(), &second);
    let view = session.view();
    assert_eq!(view.state, SessionState::Connecting { address: second.clone() });
    assert!(view.user().is_none());

    let view = session.lookup(ticket).await.expect("lookup");
    assert_eq!(view.state, SessionState::ProfileMissing { address: second });
    assert!(view.user().is_none());
}

/// Test: Second wallet cannot take an existing username; it may pick another
#[tokio::test]
async fn username_conflict_between_wallets() {
    let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let w1 = LocalWallet::from_seed([6; 32]).address();
    let w2 = LocalWallet::from_seed([7; 32]).address();

    let s1 = SessionCoordinator::new(store.clone());
    s1.connect(w1.clone()).await.expect("connect");
    let alice = s1.register("alice").await.expect("register");

    let s2 = SessionCoordinator::new(store.clone());
    s2.connect(w2.clone()).await.expect("connect");
    let err = s2.register("alice").await.unwrap_err();
    assert!(matches!(err, eventdao::SessionError::Store(StoreError::Conflict(_))));
    assert_eq!(store.find_by_wallet(&w1).await.expect("find"), Some(alice));
    assert_eq!(store.find_by_wallet(&w2).await.expect("find"), None);
    assert!(matches!(s2.view().state, SessionState::ProfileMissing { .. }));

    s2.register("alice_2").await.expect("register");
}

/// Test: Empty username is rejected before the store sees it
#[tokio::test]
async fn empty_username_rejected_locally() {
    let store = Arc::new(MemoryUserStore::new());
    let session = SessionCoordinator::new(store.clone());
    session.connect(WalletAddress::from_public_key(&[8; 32])).await.expect("connect");

    let err = session.register("   ").await.unwrap_err();
    assert!(matches!(err, eventdao::SessionError::Store(StoreError::Validation(_))));
    assert!(store.is_empty());
}
