//! The Desk: the front-of-house collaborator around the registry.
//!
//! A user logs in with the configured credentials and gets a [`Session`].
//! Every desk operation takes the session explicitly; there is no ambient
//! "logged in" state. The desk also owns the list of document types
//! offered for issuance, which the registry itself does not police.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use numerador_core::{validate_known_type, DocumentRecord, Snapshot};
use numerador_store::{Store, StoreStatus};

use crate::config::DeskConfig;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// A logged-in user, valid until `expires_at` or logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    username: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Registry access gated by login and the configured type list.
pub struct Desk<S: Store> {
    registry: Registry<S>,
    config: DeskConfig,
    /// Live sessions by token.
    sessions: Mutex<HashMap<String, Session>>,
}

impl<S: Store> Desk<S> {
    pub fn new(registry: Registry<S>, config: DeskConfig) -> Self {
        Self {
            registry,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Types offered for issuance, in configured order.
    pub fn document_types(&self) -> &[String] {
        &self.config.document_types
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Check credentials and open a session.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let accepted = self
            .config
            .credentials
            .as_ref()
            .is_some_and(|c| c.verify(username, password));

        if !accepted {
            tracing::warn!("rejected login for {}", username);
            return Err(RegistryError::Unauthorized("wrong username or password".into()));
        }

        let mut token = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut token);
        let ttl = i64::try_from(self.config.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        let session = Session {
            token: hex::encode(token),
            username: username.to_string(),
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut sessions = self.session_table()?;
        sessions.retain(|_, s| s.expires_at > Utc::now());
        sessions.insert(session.token.clone(), session.clone());

        tracing::info!("{} logged in", username);
        Ok(session)
    }

    /// End a session. Unknown sessions are ignored.
    pub fn logout(&self, session: &Session) -> Result<()> {
        if self.session_table()?.remove(&session.token).is_some() {
            tracing::info!("{} logged out", session.username);
        }
        Ok(())
    }

    fn session_table(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| RegistryError::Unavailable(format!("session table poisoned: {}", e)))
    }

    fn authorize(&self, session: &Session) -> Result<()> {
        let mut sessions = self.session_table()?;

        let live = sessions
            .get(&session.token)
            .filter(|live| *live == session)
            .map(|live| live.expires_at > Utc::now());

        match live {
            Some(true) => Ok(()),
            Some(false) => {
                sessions.remove(&session.token);
                Err(RegistryError::Unauthorized("session expired".into()))
            }
            None => Err(RegistryError::Unauthorized("unknown session".into())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a number for one of the configured types, dated today.
    pub async fn issue(
        &self,
        session: &Session,
        doc_type: &str,
        destination: &str,
    ) -> Result<DocumentRecord> {
        self.authorize(session)?;
        validate_known_type(doc_type, &self.config.document_types)?;
        self.registry.issue(doc_type, destination, None).await
    }

    /// History, newest first. `None` shows every type.
    pub async fn history(
        &self,
        session: &Session,
        filter_type: Option<&str>,
    ) -> Result<Vec<DocumentRecord>> {
        self.authorize(session)?;
        self.registry.query(filter_type).await
    }

    /// Types present in the history, for the filter selector.
    pub async fn history_filters(&self, session: &Session) -> Result<Vec<String>> {
        self.authorize(session)?;
        self.registry.document_types_in_use().await
    }

    pub async fn backup(&self, session: &Session) -> Result<Snapshot> {
        self.authorize(session)?;
        self.registry.backup_all().await
    }

    pub async fn restore(&self, session: &Session, snapshot: &Snapshot) -> Result<()> {
        self.authorize(session)?;
        tracing::info!("restore requested by {}", session.username);
        self.registry.restore(snapshot).await
    }

    pub async fn status(&self, session: &Session) -> Result<StoreStatus> {
        self.authorize(session)?;
        self.registry.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numerador_core::ValidationError;
    use numerador_store::MemoryStore;

    use crate::config::{Credentials, RegistryConfig};

    fn desk_with_ttl(ttl: u64) -> Desk<MemoryStore> {
        let registry = Registry::new(MemoryStore::new(), RegistryConfig::default());
        let config = DeskConfig {
            credentials: Some(Credentials::from_password("plantao", "segredo")),
            session_ttl_secs: ttl,
            ..DeskConfig::default()
        };
        Desk::new(registry, config)
    }

    fn desk() -> Desk<MemoryStore> {
        desk_with_ttl(3600)
    }

    #[tokio::test]
    async fn test_login_and_issue() {
        let desk = desk();
        let session = desk.login("plantao", "segredo").unwrap();
        assert_eq!(session.username(), "plantao");

        let record = desk.issue(&session, "Oficio", "Delegacia X").await.unwrap();
        assert!(record.number.starts_with("001/"));

        let history = desk.history(&session, Some("Oficio")).await.unwrap();
        assert_eq!(history, vec![record]);
        assert_eq!(desk.history_filters(&session).await.unwrap(), vec!["Oficio"]);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let desk = desk();
        assert!(matches!(
            desk.login("plantao", "errado"),
            Err(RegistryError::Unauthorized(_))
        ));

        let open = Desk::new(
            Registry::new(MemoryStore::new(), RegistryConfig::default()),
            DeskConfig::default(),
        );
        assert!(open.login("", "").is_err());
    }

    #[tokio::test]
    async fn test_unknown_type_rejected() {
        let desk = desk();
        let session = desk.login("plantao", "segredo").unwrap();

        let err = desk.issue(&session, "Memorando", "Fórum").await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::UnknownDocumentType(_))
        ));
        assert_eq!(desk.registry().last_value("Memorando").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let desk = desk();
        let session = desk.login("plantao", "segredo").unwrap();
        desk.logout(&session).unwrap();

        assert!(matches!(
            desk.status(&session).await,
            Err(RegistryError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let desk = desk_with_ttl(0);
        let session = desk.login("plantao", "segredo").unwrap();

        assert!(matches!(
            desk.issue(&session, "Oficio", "Fórum").await,
            Err(RegistryError::Unauthorized(_))
        ));
        assert_eq!(desk.registry().last_value("Oficio").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_from_other_desk_rejected() {
        let a = desk();
        let b = desk();
        let session = a.login("plantao", "segredo").unwrap();

        assert!(b.backup(&session).await.is_err());
        assert!(a.backup(&session).await.is_ok());
    }

    #[test]
    fn test_poisoned_session_table_is_unavailable() {
        let desk = std::sync::Arc::new(desk());
        let holder = std::sync::Arc::clone(&desk);
        let _ = std::thread::spawn(move || {
            let _guard = holder.sessions.lock().unwrap();
            panic!("poison the session table");
        })
        .join();

        let err = desk.login("plantao", "segredo").unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable(_)), "got {:?}", err);
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_backup_restore_through_desk() {
        let desk = desk();
        let session = desk.login("plantao", "segredo").unwrap();
        desk.issue(&session, "Despacho", "Fórum").await.unwrap();

        let backup = desk.backup(&session).await.unwrap();
        desk.restore(&session, &Snapshot::default()).await.unwrap();
        assert_eq!(desk.status(&session).await.unwrap(), StoreStatus::default());

        desk.restore(&session, &backup).await.unwrap();
        assert_eq!(desk.status(&session).await.unwrap().documents, 1);
    }
}
