// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unlocked-session state and the inactivity monitor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use strongbox_config::model::SessionConfig;
use strongbox_core::{MasterCredential, StorageHandle, StrongboxError, timestamp};
use strongbox_crypto::{EncryptionService, kdf};

use crate::run_blocking;

#[derive(Default)]
struct SessionState {
    authenticated: bool,
    /// Monotonic time of the last activity, drives the monitor.
    last_seen: Option<Instant>,
    /// Wall-clock time of the last activity, for display.
    last_activity: Option<DateTime<Utc>>,
    /// Present while the inactivity monitor runs.
    monitor: Option<CancellationToken>,
}

struct SessionInner {
    storage: StorageHandle,
    crypto: EncryptionService,
    inactivity_timeout: Duration,
    check_interval: Duration,
    state: Mutex<SessionState>,
}

impl SessionInner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn logout(&self) {
        self.crypto.clear_session_key();
        let mut state = self.state();
        state.authenticated = false;
        state.last_seen = None;
        state.last_activity = None;
        if let Some(monitor) = state.monitor.take() {
            monitor.cancel();
        }
    }

    /// Whether the session has been idle for at least the timeout.
    fn idle_expired(&self) -> bool {
        let state = self.state();
        match (state.authenticated, state.last_seen) {
            (true, Some(seen)) => seen.elapsed() >= self.inactivity_timeout,
            _ => false,
        }
    }
}

/// The Locked/Unlocked state machine of one vault.
///
/// Cheap to clone; clones share state. Unlocking installs the session key
/// into the [`EncryptionService`] and starts the inactivity monitor, which
/// locks the vault again once no activity has been recorded for the
/// configured timeout.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .field("inactivity_timeout", &self.inner.inactivity_timeout)
            .finish()
    }
}

impl AuthSession {
    pub fn new(storage: StorageHandle, crypto: EncryptionService, config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                storage,
                crypto,
                inactivity_timeout: config.inactivity_timeout(),
                check_interval: config.check_interval(),
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// The encryption service this session unlocks.
    pub fn crypto(&self) -> &EncryptionService {
        &self.inner.crypto
    }

    pub async fn has_master_credential(&self) -> Result<bool, StrongboxError> {
        let guard = self.inner.storage.lock().await;
        Ok(guard.master_credential().await?.is_some())
    }

    /// Set up the vault's master password and unlock it.
    ///
    /// Fails with `Conflict` when a master credential already exists.
    pub async fn create_master_credential(
        &self,
        password: &SecretString,
    ) -> Result<(), StrongboxError> {
        let guard = self.inner.storage.lock().await;
        if guard.master_credential().await?.is_some() {
            return Err(StrongboxError::Conflict(
                "a master password is already configured".to_string(),
            ));
        }

        let (credential, key) = new_credential(password).await?;
        guard
            .execute(strongbox_core::Command::PutMasterCredential(credential))
            .await?;
        drop(guard);

        self.unlock(key);
        info!("master password created");
        Ok(())
    }

    /// Check `password` against the stored credential and unlock on success.
    ///
    /// A wrong password returns `Ok(false)` and leaves the vault locked.
    pub async fn login(&self, password: &SecretString) -> Result<bool, StrongboxError> {
        let credential = {
            let guard = self.inner.storage.lock().await;
            guard
                .master_credential()
                .await?
                .ok_or_else(|| StrongboxError::NotConfigured("master password".to_string()))?
        };

        let secret = Zeroizing::new(password.expose_secret().to_owned());
        let key = run_blocking(move || {
            if !kdf::verify_key(&secret, &credential.salt, &credential.password_hash)? {
                return Ok(None);
            }
            kdf::derive_session_key(&secret, &credential.salt).map(Some)
        })
        .await?;

        match key {
            Some(key) => {
                self.unlock(key);
                info!("vault unlocked");
                Ok(true)
            }
            None => {
                warn!("login rejected: wrong master password");
                Ok(false)
            }
        }
    }

    /// Clear the session key and stop the monitor. Safe to call when locked.
    pub fn logout(&self) {
        let was_authenticated = self.is_authenticated();
        self.inner.logout();
        if was_authenticated {
            info!("vault locked");
        }
    }

    /// Record user activity, postponing the inactivity logout.
    pub fn update_activity(&self) {
        let mut state = self.inner.state();
        if state.authenticated {
            state.last_seen = Some(Instant::now());
            state.last_activity = Some(timestamp::now());
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state().authenticated
    }

    /// Wall-clock time of the last recorded activity while unlocked.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.inner.state().last_activity
    }

    /// Whether the inactivity monitor task is running.
    pub fn monitor_running(&self) -> bool {
        self.inner.state().monitor.is_some()
    }

    fn unlock(&self, key: Zeroizing<[u8; kdf::KEY_LEN]>) {
        self.inner.crypto.install_session_key(key);
        {
            let mut state = self.inner.state();
            state.authenticated = true;
            state.last_seen = Some(Instant::now());
            state.last_activity = Some(timestamp::now());
        }
        self.start_monitor();
    }

    /// Spawn the inactivity monitor unless it is already running.
    fn start_monitor(&self) {
        let cancel = {
            let mut state = self.inner.state();
            if state.monitor.is_some() {
                return;
            }
            let cancel = CancellationToken::new();
            state.monitor = Some(cancel.clone());
            cancel
        };

        let session = Arc::downgrade(&self.inner);
        let period = self.inner.check_interval;
        tokio::spawn(inactivity_monitor(session, period, cancel));
        debug!(
            timeout_secs = self.inner.inactivity_timeout.as_secs(),
            "inactivity monitor started"
        );
    }
}

async fn inactivity_monitor(
    session: Weak<SessionInner>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    // Skip the first immediate tick.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let Some(inner) = session.upgrade() else {
                    break;
                };
                if inner.idle_expired() {
                    inner.logout();
                    info!(
                        timeout_secs = inner.inactivity_timeout.as_secs(),
                        "vault locked after inactivity"
                    );
                    break;
                }
            }
            _ = cancel.cancelled() => {
                debug!("inactivity monitor stopped");
                break;
            }
        }
    }
}

/// Derive a fresh credential and the matching session key for `password`.
pub(crate) async fn new_credential(
    password: &SecretString,
) -> Result<(MasterCredential, Zeroizing<[u8; kdf::KEY_LEN]>), StrongboxError> {
    let secret = Zeroizing::new(password.expose_secret().to_owned());
    run_blocking(move || {
        let salt = kdf::generate_salt()?;
        let password_hash = kdf::derive_key(&secret, &salt)?;
        let key = kdf::derive_session_key(&secret, &salt)?;
        Ok((
            MasterCredential {
                password_hash,
                salt,
                created_at: timestamp::now(),
            },
            key,
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::VaultStorage;
    use strongbox_crypto::KeySlot;
    use strongbox_storage::DocumentStorage;

    async fn session() -> AuthSession {
        let storage = Arc::new(DocumentStorage::in_memory());
        storage.initialize().await.unwrap();
        AuthSession::new(
            StorageHandle::new(storage),
            EncryptionService::new(KeySlot::new()),
            &SessionConfig::default(),
        )
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn create_then_login() {
        let auth = session().await;
        assert!(!auth.has_master_credential().await.unwrap());

        auth.create_master_credential(&secret("correct horse")).await.unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.crypto().is_unlocked());
        assert!(auth.has_master_credential().await.unwrap());

        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(!auth.crypto().is_unlocked());

        assert!(!auth.login(&secret("wrong")).await.unwrap());
        assert!(!auth.is_authenticated());
        assert!(auth.login(&secret("correct horse")).await.unwrap());
        assert!(auth.is_authenticated());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn wrong_password_is_logged_without_the_password() {
        let auth = session().await;
        auth.create_master_credential(&secret("correct horse")).await.unwrap();
        auth.logout();

        assert!(!auth.login(&secret("battery staple")).await.unwrap());
        assert!(logs_contain("login rejected"));
        assert!(!logs_contain("battery staple"));
    }

    #[tokio::test]
    async fn second_master_credential_is_conflict() {
        let auth = session().await;
        auth.create_master_credential(&secret("one")).await.unwrap();
        assert!(matches!(
            auth.create_master_credential(&secret("two")).await,
            Err(StrongboxError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn login_without_credential_is_not_configured() {
        let auth = session().await;
        assert!(matches!(
            auth.login(&secret("anything")).await,
            Err(StrongboxError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn logout_when_locked_is_safe() {
        let auth = session().await;
        auth.logout();
        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(!auth.monitor_running());
    }

    #[tokio::test]
    async fn same_password_yields_same_session_key() {
        let auth = session().await;
        auth.create_master_credential(&secret("pw")).await.unwrap();
        let ciphertext = auth.crypto().encrypt("example.com").unwrap();
        auth.logout();

        assert!(auth.login(&secret("pw")).await.unwrap());
        assert_eq!(auth.crypto().decrypt(&ciphertext).unwrap(), "example.com");
    }

    #[tokio::test]
    async fn activity_is_ignored_while_locked() {
        let auth = session().await;
        auth.update_activity();
        assert!(auth.last_activity().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_locks_after_timeout() {
        let auth = session().await;
        auth.create_master_credential(&secret("pw")).await.unwrap();
        assert!(auth.monitor_running());

        tokio::time::sleep(Duration::from_secs(179)).await;
        assert!(auth.is_authenticated());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!auth.is_authenticated());
        assert!(!auth.crypto().is_unlocked());
        assert!(!auth.monitor_running());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_postpones_logout() {
        let auth = session().await;
        auth.create_master_credential(&secret("pw")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        auth.update_activity();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(auth.is_authenticated());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!auth.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn relogin_restarts_a_single_monitor() {
        let auth = session().await;
        auth.create_master_credential(&secret("pw")).await.unwrap();
        auth.logout();
        assert!(!auth.monitor_running());

        assert!(auth.login(&secret("pw")).await.unwrap());
        assert!(auth.login(&secret("pw")).await.unwrap());
        assert!(auth.monitor_running());

        tokio::time::sleep(Duration::from_secs(181)).await;
        assert!(!auth.is_authenticated());
    }
}
