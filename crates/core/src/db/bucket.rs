//! Bucketed key/value access inside a transaction
//!
//! A [`Bucket`] borrows an open transaction and exposes ordered byte-key
//! storage plus a per-bucket sequence counter. It never commits on its own;
//! whatever it writes becomes visible when the enclosing [`Db::update`]
//! closure returns `Ok`.
//!
//! [`Db::update`]: super::Db::update

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;

/// Encode an ID as the 8-byte big-endian key used in every bucket
pub fn encode_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian key; `None` if the key has the wrong width
#[cfg(test)]
pub fn decode_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// A named namespace within the store
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'a> {
    conn: &'a Connection,
    name: &'a str,
}

impl<'a> Bucket<'a> {
    /// Open an existing bucket, or `None` if it has never been created
    pub fn open(conn: &'a Connection, name: &'a str) -> Result<Option<Self>> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM buckets WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        Ok(exists.then_some(Self { conn, name }))
    }

    /// Open a bucket, creating it with a zero sequence if needed
    pub fn create_if_not_exists(conn: &'a Connection, name: &'a str) -> Result<Self> {
        conn.execute(
            "INSERT INTO buckets (name, sequence) VALUES (?1, 0) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        Ok(Self { conn, name })
    }

    /// Increment and return the bucket's sequence
    ///
    /// The counter is persisted with the bucket row, so it only moves forward
    /// once the surrounding transaction commits and never rolls back on
    /// delete. The first call on a fresh bucket returns 1.
    pub fn next_sequence(&self) -> Result<u64> {
        let seq: i64 = self.conn.query_row(
            "UPDATE buckets SET sequence = sequence + 1 WHERE name = ?1 RETURNING sequence",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(seq as u64)
    }

    /// Current sequence value without advancing it
    pub fn sequence(&self) -> Result<u64> {
        let seq: i64 = self.conn.query_row(
            "SELECT sequence FROM buckets WHERE name = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(seq as u64)
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE bucket = ?1 AND key = ?2",
                params![self.name, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite `key`
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO entries (bucket, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(bucket, key) DO UPDATE SET value = excluded.value",
            params![self.name, key, value],
        )?;
        Ok(())
    }

    /// Remove `key`; removing a missing key is a no-op
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM entries WHERE bucket = ?1 AND key = ?2",
            params![self.name, key],
        )?;
        Ok(())
    }

    /// Visit every entry in ascending key order
    ///
    /// Stops at the first error returned by `f` and propagates it.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM entries WHERE bucket = ?1 ORDER BY key ASC")?;
        let mut rows = stmt.query(params![self.name])?;

        while let Some(row) = rows.next()? {
            let key: Vec<u8> = row.get(0)?;
            let value: Vec<u8> = row.get(1)?;
            f(&key, &value)?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::errors::VaultError;

    #[test]
    fn test_key_encoding_is_big_endian() {
        assert_eq!(encode_key(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_key(256), [0, 0, 0, 0, 0, 0, 1, 0]);
        assert_eq!(decode_key(&encode_key(u64::MAX - 3)), Some(u64::MAX - 3));
        assert_eq!(decode_key(&[1, 2, 3]), None);
    }

    #[test]
    fn test_open_missing_bucket() {
        let db = Db::open_in_memory().unwrap();
        let found = db.view(|tx| Ok(Bucket::open(tx, "prompts")?.is_some())).unwrap();
        assert!(!found);
    }

    #[test]
    fn test_create_if_not_exists_is_idempotent() {
        let db = Db::open_in_memory().unwrap();
        db.update(|tx| {
            let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
            bucket.next_sequence()?;
            Ok(())
        })
        .unwrap();

        // Re-creating must not reset the sequence
        let seq = db
            .update(|tx| Bucket::create_if_not_exists(tx, "prompts")?.sequence())
            .unwrap();
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_next_sequence_is_monotonic() {
        let db = Db::open_in_memory().unwrap();
        let seqs = db
            .update(|tx| {
                let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
                (0..5).map(|_| bucket.next_sequence()).collect::<Result<Vec<_>>>()
            })
            .unwrap();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sequences_are_per_bucket() {
        let db = Db::open_in_memory().unwrap();
        let (a, b) = db
            .update(|tx| {
                let a = Bucket::create_if_not_exists(tx, "a")?;
                let b = Bucket::create_if_not_exists(tx, "b")?;
                a.next_sequence()?;
                Ok((a.next_sequence()?, b.next_sequence()?))
            })
            .unwrap();
        assert_eq!((a, b), (2, 1));
    }

    #[test]
    fn test_put_get_overwrite_delete() {
        let db = Db::open_in_memory().unwrap();
        db.update(|tx| {
            let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
            bucket.put(&encode_key(1), b"first")?;
            bucket.put(&encode_key(1), b"second")?;
            assert_eq!(bucket.get(&encode_key(1))?, Some(b"second".to_vec()));
            assert_eq!(bucket.len()?, 1);

            bucket.delete(&encode_key(1))?;
            bucket.delete(&encode_key(1))?;
            assert_eq!(bucket.get(&encode_key(1))?, None);
            assert!(bucket.is_empty()?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_for_each_scans_in_key_order() {
        let db = Db::open_in_memory().unwrap();
        let keys = db
            .update(|tx| {
                let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
                // 256 would sort before 2 with little-endian keys
                for id in [300u64, 2, 256, 1] {
                    bucket.put(&encode_key(id), b"{}")?;
                }

                let mut keys = Vec::new();
                bucket.for_each(|key, _| {
                    keys.push(decode_key(key).unwrap());
                    Ok(())
                })?;
                Ok(keys)
            })
            .unwrap();
        assert_eq!(keys, vec![1, 2, 256, 300]);
    }

    #[test]
    fn test_for_each_stops_on_first_error() {
        let db = Db::open_in_memory().unwrap();
        let mut visited = 0;
        let result = db.update(|tx| {
            let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
            for id in 1..=3u64 {
                bucket.put(&encode_key(id), b"{}")?;
            }
            bucket.for_each(|_, _| {
                visited += 1;
                Err(VaultError::Other("stop".into()))
            })
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_buckets_are_isolated() {
        let db = Db::open_in_memory().unwrap();
        db.update(|tx| {
            let a = Bucket::create_if_not_exists(tx, "a")?;
            let b = Bucket::create_if_not_exists(tx, "b")?;
            a.put(&encode_key(1), b"in a")?;
            assert_eq!(b.get(&encode_key(1))?, None);
            assert_eq!(a.get(&encode_key(1))?.as_deref(), Some(&b"in a"[..]));
            Ok(())
        })
        .unwrap();
    }
}
