use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

/// Redis connection wrapper
pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    pub async fn init(redis_url: &str) -> Result<Self, String> {
        let client =
            Client::open(redis_url).map_err(|e| format!("Failed to create Redis client: {}", e))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("Failed to connect to Redis: {}", e))?;

        log::info!("Connected successfully to Redis");

        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Login sessions: `session:<user id>` holds the current token and
/// `token:<token>` maps back to the user id. One session per user.
#[derive(Clone)]
pub struct RedisService {
    connection: MultiplexedConnection,
}

impl RedisService {
    pub fn new(client: &RedisClient) -> Self {
        Self {
            connection: client.get_connection(),
        }
    }

    pub async fn store_session(
        &self,
        user_id: i64,
        token: &str,
        expiry_seconds: u64,
    ) -> Result<(), String> {
        // A new login replaces whatever session the user had
        self.invalidate_session(user_id).await?;

        let mut conn = self.connection.clone();
        let key = format!("session:{}", user_id);
        conn.set_ex::<_, _, ()>(&key, token, expiry_seconds)
            .await
            .map_err(|e| format!("Failed to store session: {}", e))?;

        let token_key = format!("token:{}", token);
        conn.set_ex::<_, _, ()>(&token_key, user_id, expiry_seconds)
            .await
            .map_err(|e| format!("Failed to store token mapping: {}", e))?;

        Ok(())
    }

    /// User id the token belongs to, if the session is still live.
    pub async fn validate_session(&self, token: &str) -> Result<Option<i64>, String> {
        let mut conn = self.connection.clone();
        let token_key = format!("token:{}", token);

        conn.get(&token_key)
            .await
            .map_err(|e| format!("Failed to validate session: {}", e))
    }

    pub async fn get_session(&self, user_id: i64) -> Result<Option<String>, String> {
        let mut conn = self.connection.clone();
        let key = format!("session:{}", user_id);

        conn.get(&key)
            .await
            .map_err(|e| format!("Failed to get session: {}", e))
    }

    pub async fn invalidate_session(&self, user_id: i64) -> Result<(), String> {
        let mut conn = self.connection.clone();
        let session_key = format!("session:{}", user_id);

        if let Some(token) = self.get_session(user_id).await? {
            let token_key = format!("token:{}", token);
            conn.del::<_, ()>(&token_key)
                .await
                .map_err(|e| format!("Failed to delete token: {}", e))?;
        }

        conn.del::<_, ()>(&session_key)
            .await
            .map_err(|e| format!("Failed to delete session: {}", e))?;

        Ok(())
    }
}

pub async fn connect_to_redis(redis_url: &str) -> Result<RedisService, String> {
    let client = RedisClient::init(redis_url).await?;
    Ok(RedisService::new(&client))
}
