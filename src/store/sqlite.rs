//! SQLite-backed response store and profile directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use super::{CollaboratorError, ResponseStore};
use crate::identity::{Identity, IdentityProvider, ProfileDetails, Role};
use crate::quadrant::ScoreSet;
use crate::response::{Response, UserId};

#[derive(Clone)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CollaboratorError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; \
             PRAGMA synchronous=NORMAL; \
             CREATE TABLE IF NOT EXISTS profiles ( \
               id TEXT PRIMARY KEY, \
               email TEXT NOT NULL UNIQUE, \
               role TEXT NOT NULL DEFAULT 'USER', \
               full_name TEXT, \
               position TEXT, \
               created_at INTEGER NOT NULL \
             ); \
             CREATE TABLE IF NOT EXISTS responses ( \
               user_id TEXT PRIMARY KEY, \
               username TEXT NOT NULL, \
               full_name TEXT NOT NULL, \
               position TEXT NOT NULL, \
               cvf_scores TEXT NOT NULL, \
               cvcq_scores TEXT NOT NULL, \
               submitted_at TEXT, \
               created_at INTEGER NOT NULL, \
               updated_at INTEGER NOT NULL \
             );",
        )?;
        ensure_column(&conn, "responses", "submitted_at", "TEXT")?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity provider bound to one signed-in user.
    pub fn session(&self, user_id: impl Into<UserId>) -> SqliteIdentity {
        SqliteIdentity {
            store: self.clone(),
            user_id: user_id.into(),
        }
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, CollaboratorError>
    where
        F: FnOnce(&Connection) -> Result<R, CollaboratorError>,
    {
        let guard = self.conn.lock().map_err(|_| CollaboratorError::Poisoned)?;
        f(&guard)
    }

    async fn blocking<F, R>(&self, f: F) -> Result<R, CollaboratorError>
    where
        F: FnOnce(&Connection) -> Result<R, CollaboratorError> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| CollaboratorError::Join(e.to_string()))?
    }

    /// Provision a profile with a fresh id. Name and position are left for
    /// the user to fill in on first sign-in.
    pub async fn create_profile(
        &self,
        email: &str,
        role: Role,
    ) -> Result<Identity, CollaboratorError> {
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(CollaboratorError::Invalid("email is required".to_string()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let identity = Identity::new(id.clone(), email.clone(), role);
        self.blocking(move |conn| {
            let exists: Option<String> = conn
                .query_row(
                    "SELECT id FROM profiles WHERE email = ?1",
                    params![email],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Err(CollaboratorError::Invalid(format!(
                    "a profile for {email} already exists"
                )));
            }
            conn.execute(
                "INSERT INTO profiles (id, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, email, role.as_str(), now_epoch()],
            )?;
            Ok(())
        })
        .await?;
        info!(user = %identity.id, role = role.as_str(), "profile created");
        Ok(identity)
    }

    pub async fn profile(&self, id: &UserId) -> Result<Option<Identity>, CollaboratorError> {
        let id = id.as_str().to_string();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, email, role, full_name, position FROM profiles WHERE id = ?1",
                params![id],
                identity_from_row,
            )
            .optional()?
            .transpose()
        })
        .await
    }

    pub async fn profile_by_email(&self, email: &str) -> Result<Option<Identity>, CollaboratorError> {
        let email = email.trim().to_string();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, email, role, full_name, position FROM profiles WHERE email = ?1",
                params![email],
                identity_from_row,
            )
            .optional()?
            .transpose()
        })
        .await
    }

    pub async fn get_response(&self, id: &UserId) -> Result<Option<Response>, CollaboratorError> {
        let id = id.as_str().to_string();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, username, full_name, position, cvf_scores, cvcq_scores, submitted_at \
                 FROM responses WHERE user_id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(response_from_row(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Upsert on behalf of `actor`. Only administrators may write a
    /// response owned by someone else.
    pub async fn upsert_response_as(
        &self,
        actor: &Identity,
        response: &Response,
    ) -> Result<(), CollaboratorError> {
        if !actor.is_admin() && actor.id != response.user_id {
            warn!(actor = %actor.id, owner = %response.user_id, "refused foreign response write");
            return Err(CollaboratorError::permission_denied(format!(
                "{} cannot write the response of {}",
                actor.id, response.user_id
            )));
        }
        self.upsert_response(response).await
    }

    /// Delete on behalf of `actor`; administrators only.
    pub async fn delete_response_as(
        &self,
        actor: &Identity,
        id: &UserId,
    ) -> Result<(), CollaboratorError> {
        if !actor.is_admin() {
            return Err(CollaboratorError::permission_denied(format!(
                "{} cannot delete responses",
                actor.id
            )));
        }
        self.delete_response(id).await
    }
}

fn ensure_column(
    conn: &Connection,
    table: &str,
    name: &str,
    spec: &str,
) -> Result<(), CollaboratorError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let col_name: String = row.get(1)?;
        if col_name == name {
            return Ok(());
        }
    }
    let sql = format!("ALTER TABLE {table} ADD COLUMN {name} {spec}");
    conn.execute(&sql, [])?;
    Ok(())
}

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Identity, CollaboratorError>> {
    let id: String = row.get(0)?;
    let email: String = row.get(1)?;
    let role: String = row.get(2)?;
    let full_name: Option<String> = row.get(3)?;
    let position: Option<String> = row.get(4)?;
    let Some(role) = Role::parse(&role) else {
        return Ok(Err(CollaboratorError::Invalid(format!(
            "profile {id} has unknown role {role:?}"
        ))));
    };
    let mut identity = Identity::new(id, email, role);
    identity.full_name = full_name;
    identity.position = position;
    Ok(Ok(identity))
}

fn response_from_row(row: &Row<'_>) -> Result<Response, CollaboratorError> {
    let cvf: String = row.get(4)?;
    let cvcq: String = row.get(5)?;
    let submitted_at: Option<String> = row.get(6)?;
    let submitted_at = submitted_at
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| CollaboratorError::Serde(format!("submitted_at: {e}")))
        })
        .transpose()?;
    Ok(Response {
        user_id: UserId(row.get(0)?),
        username: row.get(1)?,
        full_name: row.get(2)?,
        position: row.get(3)?,
        cvf_scores: parse_scores(&cvf)?,
        cvcq_scores: parse_scores(&cvcq)?,
        submitted_at,
    })
}

fn parse_scores(raw: &str) -> Result<ScoreSet, CollaboratorError> {
    serde_json::from_str(raw).map_err(|e| CollaboratorError::Serde(e.to_string()))
}

fn encode_scores(scores: &ScoreSet) -> Result<String, CollaboratorError> {
    serde_json::to_string(scores).map_err(|e| CollaboratorError::Serde(e.to_string()))
}

#[async_trait]
impl ResponseStore for SqliteStore {
    async fn upsert_response(&self, response: &Response) -> Result<(), CollaboratorError> {
        response
            .validate()
            .map_err(|e| CollaboratorError::Invalid(e.to_string()))?;
        let response = response.clone();
        let cvf = encode_scores(&response.cvf_scores)?;
        let cvcq = encode_scores(&response.cvcq_scores)?;
        let owner = response.user_id.clone();
        self.blocking(move |conn| {
            let now = now_epoch();
            conn.execute(
                "INSERT INTO responses ( \
                    user_id, username, full_name, position, cvf_scores, cvcq_scores, \
                    submitted_at, created_at, updated_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(user_id) DO UPDATE SET \
                    username = excluded.username, \
                    full_name = excluded.full_name, \
                    position = excluded.position, \
                    cvf_scores = excluded.cvf_scores, \
                    cvcq_scores = excluded.cvcq_scores, \
                    submitted_at = excluded.submitted_at, \
                    updated_at = excluded.updated_at",
                params![
                    response.user_id.as_str(),
                    response.username,
                    response.full_name,
                    response.position,
                    cvf,
                    cvcq,
                    response.submitted_at.map(|t| t.to_rfc3339()),
                    now,
                    now,
                ],
            )?;
            Ok(())
        })
        .await?;
        debug!(owner = %owner, "response upserted");
        Ok(())
    }

    async fn list_responses(&self) -> Result<Vec<Response>, CollaboratorError> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, username, full_name, position, cvf_scores, cvcq_scores, submitted_at \
                 FROM responses ORDER BY created_at ASC, rowid ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(response_from_row(row)?);
            }
            Ok(out)
        })
        .await
    }

    async fn delete_response(&self, id: &UserId) -> Result<(), CollaboratorError> {
        let owner = id.clone();
        let removed = self
            .blocking(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM responses WHERE user_id = ?1",
                    params![owner.as_str()],
                )?)
            })
            .await?;
        if removed == 0 {
            return Err(CollaboratorError::not_found(format!("no response for {id}")));
        }
        info!(owner = %id, "response deleted");
        Ok(())
    }
}

/// [`IdentityProvider`] view of the profile table for one user.
#[derive(Clone)]
pub struct SqliteIdentity {
    store: SqliteStore,
    user_id: UserId,
}

impl SqliteIdentity {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        match self.store.profile(&self.user_id).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(user = %self.user_id, error = %e, "identity lookup failed");
                None
            }
        }
    }

    async fn save_profile_details(
        &self,
        id: &UserId,
        details: &ProfileDetails,
    ) -> Result<Identity, CollaboratorError> {
        if *id != self.user_id {
            return Err(CollaboratorError::permission_denied(format!(
                "{} cannot edit the profile of {id}",
                self.user_id
            )));
        }
        let details = details
            .validated()
            .map_err(|e| CollaboratorError::Invalid(e.to_string()))?;
        let key = id.as_str().to_string();
        let (full_name, position) = (details.full_name.clone(), details.position.clone());
        let updated = self
            .store
            .blocking(move |conn| {
                Ok(conn.execute(
                    "UPDATE profiles SET full_name = ?1, position = ?2 WHERE id = ?3",
                    params![full_name, position, key],
                )?)
            })
            .await?;
        if updated == 0 {
            return Err(CollaboratorError::not_found(format!("no profile for {id}")));
        }
        info!(user = %id, "profile details saved");
        self.store
            .profile(id)
            .await?
            .ok_or_else(|| CollaboratorError::not_found(format!("no profile for {id}")))
    }
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
