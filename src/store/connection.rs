//! Connection to the external key-value store.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo};
use std::fmt;
use tracing::{debug, info};

use crate::error::Result;

/// Lowest database index the demos accept.
pub const MIN_DB: u8 = 1;
/// Highest database index the demos accept.
pub const MAX_DB: u8 = 7;

/// A handle to one database of the key-value store.
///
/// The database index is baked into the connection info, so connections
/// re-established by the manager land in the same database. Cloning is cheap
/// and clones share the underlying connection.
#[derive(Clone)]
pub struct Store {
    connection: ConnectionManager,
    db: u8,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Connect to the store at `url` and select database `db`.
    pub async fn open(url: &str, db: u8) -> Result<Self> {
        let mut info = url.into_connection_info()?;
        info.redis.db = i64::from(db);

        let client = Client::open(info)?;
        let connection = ConnectionManager::new(client).await?;
        info!(url = %url, db = db, "Connected to key-value store");

        Ok(Self { connection, db })
    }

    /// The selected database index.
    pub fn db(&self) -> u8 {
        self.db
    }

    /// A connection handle for issuing commands.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Remove every key in the selected database.
    pub async fn flush_db(&self) -> Result<()> {
        let mut conn = self.connection();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        debug!(db = self.db, "Database flushed");
        Ok(())
    }

    /// Common demo preamble: report the database and flush it unless told not to.
    pub async fn prepare(&self, flush: bool) -> Result<()> {
        println!("Database {}", self.db);
        if flush {
            self.flush_db().await?;
            println!("Flushed");
        }
        Ok(())
    }

    /// Every member of a sorted set with its score, lowest score first.
    ///
    /// Uses an explicit index range because some servers reject negative
    /// `ZRANGE` indexes.
    pub async fn zrange_all(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let mut conn = self.connection();
        let len: isize = conn.zcard(key).await?;
        if len == 0 {
            return Ok(Vec::new());
        }
        Ok(conn.zrange_withscores(key, 0, len - 1).await?)
    }

    /// Members of a sorted set with `min <= score <= max`, lowest first.
    pub async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<(String, f64)>> {
        let mut conn = self.connection();
        let members: Vec<(String, f64)> = redis::cmd("ZRANGE")
            .arg(key)
            .arg(min)
            .arg(max)
            .arg("BYSCORE")
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }
}
