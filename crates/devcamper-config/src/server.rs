use std::env;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
}

impl ServerConfig {
    /// `STORE=memory` selects the in-memory store; otherwise `DATABASE_URL`
    /// must name a PostgreSQL database.
    pub fn from_env() -> Result<Self, String> {
        let store = match env::var("STORE") {
            Ok(v) if v.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
            _ => StoreBackend::Postgres {
                database_url: env::var("DATABASE_URL")
                    .map_err(|_| "DATABASE_URL must be set (or STORE=memory)".to_string())?,
            },
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 5000),
            store,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
