use failure::{Error, ResultExt};
use redis::{Client, Commands, Connection};
use std::fmt::{self, Debug, Formatter};

use super::Store;

/// A [`Store`] backed by a Redis database.
pub struct RedisStore {
    conn: Connection,
}

impl RedisStore {
    pub fn connect(url: &str) -> Result<RedisStore, Error> {
        debug!("Connecting to {}", url);

        let client = Client::open(url).context("Invalid Redis URL")?;
        let conn = client
            .get_connection()
            .context("Unable to connect to Redis")?;

        Ok(RedisStore { conn })
    }
}

impl Store for RedisStore {
    fn incr_score(&mut self, key: &str, member: &str, by: i64) -> Result<(), Error> {
        let _: f64 = self.conn.zincr(key, member, by)?;
        Ok(())
    }

    fn ranking(&mut self, key: &str) -> Result<Vec<(String, i64)>, Error> {
        let got: Vec<(String, f64)> = self.conn.zrevrange_withscores(key, 0, -1)?;
        Ok(got
            .into_iter()
            .map(|(member, score)| (member, score as i64))
            .collect())
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), Error> {
        let _: i64 = self.conn.sadd(key, member)?;
        Ok(())
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<(), Error> {
        let _: i64 = self.conn.srem(key, member)?;
        Ok(())
    }

    fn set_members(&mut self, key: &str) -> Result<Vec<String>, Error> {
        let members: Vec<String> = self.conn.smembers(key)?;
        Ok(members)
    }

    fn hash_set(&mut self, key: &str, field: &str, value: &str) -> Result<(), Error> {
        let _: i64 = self.conn.hset(key, field, value)?;
        Ok(())
    }

    fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<String>, Error> {
        let value: Option<String> = self.conn.hget(key, field)?;
        Ok(value)
    }

    fn hash_delete(&mut self, key: &str, field: &str) -> Result<(), Error> {
        let _: i64 = self.conn.hdel(key, field)?;
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let _: () = self.conn.set(key, value)?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, Error> {
        let value: Option<String> = self.conn.get(key)?;
        Ok(value)
    }

    fn flush(&mut self) -> Result<(), Error> {
        info!("Flushing the store");
        redis::cmd("FLUSHDB").query::<()>(&mut self.conn)?;
        Ok(())
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("RedisStore").finish()
    }
}
