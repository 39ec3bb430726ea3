//! `CacheStore` over SQLite.
//!
//! Partitions are rows in `partitions`; entries reference them by name and
//! are removed by `ON DELETE CASCADE` when their partition is dropped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::RequestKey;
use super::store::CacheStore;
use crate::Error;
use crate::http::Response;

const ENSURE_PARTITION: &str = "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)";

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_PARTITION, params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let name = name.to_string();
        let hash = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let row = stmt.query_row(params![name, hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                });

                match row {
                    Ok((url, status, headers_json, body)) => {
                        let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::Serialization(e.to_string()))?;
                        Ok(Some(Response { url, status, headers, body: body.into() }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
        let name = name.to_string();
        let key = key.clone();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::Serialization(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_PARTITION, params![name, now])?;
                conn.execute(
                    "INSERT INTO entries (partition, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        name,
                        key.digest(),
                        key.method,
                        key.url,
                        response.status,
                        headers_json,
                        response.body.as_ref(),
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE partition = ?1 ORDER BY url")?;
                let keys = stmt
                    .query_map(params![name], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
