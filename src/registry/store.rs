use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sled::Db;
use tracing::warn;

use crate::utils::error::BrokerError;

/// One registry row: a live connection and the topics it subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: String,
    pub subscriptions: BTreeSet<String>,
}

impl ConnectionRecord {
    pub fn new(id: &str, subscriptions: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: id.to_string(),
            subscriptions: subscriptions.into_iter().collect(),
        }
    }
}

/// Durable connection registry keyed by connection id.
///
/// Cheap to clone; the underlying `sled::Db` handle is shared. Constructed
/// once at process start and reused across invocations.
#[derive(Clone)]
pub struct ConnectionStore {
    db: Db,
}

impl ConnectionStore {
    pub fn open(path: &str) -> Result<Self, BrokerError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Insert a record for a newly opened connection.
    ///
    /// A reconnect reusing an id overwrites the previous record; the
    /// transport layer only hands out ids it considers open.
    pub fn create_connection(
        &self,
        id: &str,
        default_subscriptions: &[String],
    ) -> Result<(), BrokerError> {
        let record = ConnectionRecord::new(id, default_subscriptions.iter().cloned());
        let bytes = encode(&record)?;
        self.db.insert(id, bytes)?;
        Ok(())
    }

    /// Delete a connection's record. Removing an absent record is a no-op.
    pub fn remove_connection(&self, id: &str) -> Result<(), BrokerError> {
        self.db.remove(id)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<ConnectionRecord>, BrokerError> {
        match self.db.get(id)? {
            Some(bytes) => Ok(Some(decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Add `topic` to the connection's subscription set. Idempotent; applied
    /// as an atomic single-record update, not a read-modify-write round trip.
    pub fn add_subscription(&self, id: &str, topic: &str) -> Result<(), BrokerError> {
        self.update_subscriptions(id, |subscriptions| {
            subscriptions.insert(topic.to_string());
        })
    }

    /// Remove `topic` from the connection's subscription set. Removing an
    /// absent topic is a no-op.
    pub fn remove_subscription(&self, id: &str, topic: &str) -> Result<(), BrokerError> {
        self.update_subscriptions(id, |subscriptions| {
            subscriptions.remove(topic);
        })
    }

    /// Subscription index: every connection whose set contains `topic`.
    ///
    /// Exact-match membership, no ordering guarantee. The filter runs inside
    /// the store iteration; records that fail to decode are skipped with a
    /// warning rather than failing the whole resolution.
    pub fn subscribers_of(&self, topic: &str) -> Result<Vec<ConnectionRecord>, BrokerError> {
        let mut matches = Vec::new();
        for entry in self.db.iter() {
            let (key, value) = entry?;
            let id = String::from_utf8_lossy(&key);
            match decode(&id, &value) {
                Ok(record) if record.subscriptions.contains(topic) => matches.push(record),
                Ok(_) => {}
                Err(e) => warn!(connection_id = %id, error = %e, "skipping undecodable record"),
            }
        }
        Ok(matches)
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.db.len()
    }

    /// Apply `mutate` to the record's subscription set via sled's
    /// compare-and-swap loop. A missing record is a success no-op: the id
    /// raced with a disconnect and the absence is already the converged
    /// state.
    fn update_subscriptions<F>(&self, id: &str, mutate: F) -> Result<(), BrokerError>
    where
        F: Fn(&mut BTreeSet<String>),
    {
        let mut codec_err = None;
        self.db.update_and_fetch(id, |existing| {
            codec_err = None;
            let bytes = existing?;
            match serde_json::from_slice::<ConnectionRecord>(bytes) {
                Ok(mut record) => {
                    mutate(&mut record.subscriptions);
                    match serde_json::to_vec(&record) {
                        Ok(updated) => Some(updated),
                        Err(e) => {
                            codec_err = Some(e);
                            Some(bytes.to_vec())
                        }
                    }
                }
                Err(e) => {
                    codec_err = Some(e);
                    Some(bytes.to_vec())
                }
            }
        })?;
        match codec_err {
            Some(source) => Err(BrokerError::CorruptRecord {
                id: id.to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionStore")
            .field("db", &"sled::Db")
            .field("connections", &self.db.len())
            .finish()
    }
}

fn encode(record: &ConnectionRecord) -> Result<Vec<u8>, BrokerError> {
    serde_json::to_vec(record).map_err(|source| BrokerError::CorruptRecord {
        id: record.id.clone(),
        source,
    })
}

fn decode(id: &str, bytes: &[u8]) -> Result<ConnectionRecord, BrokerError> {
    serde_json::from_slice(bytes).map_err(|source| BrokerError::CorruptRecord {
        id: id.to_string(),
        source,
    })
}
