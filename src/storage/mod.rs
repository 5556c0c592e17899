//! Durable key-value store backing the engine. A dedicated worker thread
//! owns the SQLite connection and executes closures sent over a channel;
//! async callers get their results back through oneshot replies. Writes are
//! last-write-wins per key, with no transactional guarantee across keys.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::oneshot;

use crate::models::{FeedItem, Session, Settings};

const KEY_SETTINGS: &str = "settings";
const KEY_CURRENT_SESSION: &str = "currentSession";
const KEY_SUMMARY_SESSION: &str = "summarySession";
const KEY_SESSIONS: &str = "sessions";
const KEY_LIVE_COACHING_FEED: &str = "liveCoachingFeed";

type StoreTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreCommand {
    Execute(StoreTask),
    Shutdown,
}

struct StorageInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StoreCommand::Shutdown) {
                error!("Failed to send shutdown to storage thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join storage thread: {join_err:?}");
            }
        }
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .context("failed to create kv_store table")
}

#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
    db_path: Arc<PathBuf>,
}

impl Storage {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create storage directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("meetcoach-store".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result = init_schema(&conn);
                if ready_tx.send(init_result).is_err() {
                    error!("Storage initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("Storage thread shutting down");
            })
            .with_context(|| "failed to spawn storage worker thread")?;

        ready_rx
            .recv()
            .context("storage worker exited before signaling readiness")??;

        info!("Storage initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(StorageInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = StoreCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Storage caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to storage thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("storage thread terminated unexpectedly"))?
    }

    async fn read_key<T>(&self, key: &'static str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("failed to read key '{key}'"))?;

            match raw {
                Some(text) => Ok(Some(
                    serde_json::from_str(&text)
                        .with_context(|| format!("failed to decode value for key '{key}'"))?,
                )),
                None => Ok(None),
            }
        })
        .await
    }

    async fn write_key<T: Serialize>(&self, key: &'static str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)
            .with_context(|| format!("failed to encode value for key '{key}'"))?;

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, encoded],
            )
            .with_context(|| format!("failed to write key '{key}'"))?;
            Ok(())
        })
        .await
    }

    async fn remove_key(&self, key: &'static str) -> Result<()> {
        self.execute(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("failed to remove key '{key}'"))?;
            Ok(())
        })
        .await
    }

    /// Stored settings merged over defaults, so keys written by an older
    /// build still load.
    pub async fn get_settings(&self) -> Result<Settings> {
        Ok(self.read_key(KEY_SETTINGS).await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write_key(KEY_SETTINGS, settings).await
    }

    pub async fn get_current_session(&self) -> Result<Option<Session>> {
        self.read_key(KEY_CURRENT_SESSION).await
    }

    pub async fn save_current_session(&self, session: &Session) -> Result<()> {
        self.write_key(KEY_CURRENT_SESSION, session).await
    }

    pub async fn clear_current_session(&self) -> Result<()> {
        self.remove_key(KEY_CURRENT_SESSION).await
    }

    pub async fn get_summary_session(&self) -> Result<Option<Session>> {
        self.read_key(KEY_SUMMARY_SESSION).await
    }

    pub async fn save_summary_session(&self, session: &Session) -> Result<()> {
        self.write_key(KEY_SUMMARY_SESSION, session).await
    }

    pub async fn clear_summary_session(&self) -> Result<()> {
        self.remove_key(KEY_SUMMARY_SESSION).await
    }

    pub async fn get_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.read_key(KEY_SESSIONS).await?.unwrap_or_default())
    }

    pub async fn save_sessions(&self, sessions: &[Session]) -> Result<()> {
        self.write_key(KEY_SESSIONS, &sessions).await
    }

    pub async fn add_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.get_sessions().await?;
        sessions.push(session.clone());
        self.save_sessions(&sessions).await
    }

    pub async fn get_live_coaching_feed(&self) -> Result<Vec<FeedItem>> {
        Ok(self.read_key(KEY_LIVE_COACHING_FEED).await?.unwrap_or_default())
    }

    pub async fn save_live_coaching_feed(&self, feed: &[FeedItem]) -> Result<()> {
        self.write_key(KEY_LIVE_COACHING_FEED, &feed).await
    }

    pub async fn clear_live_coaching_feed(&self) -> Result<()> {
        self.remove_key(KEY_LIVE_COACHING_FEED).await
    }

    pub async fn clear_all_data(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM kv_store", [])
                .context("failed to clear storage")?;
            Ok(())
        })
        .await
    }
}
