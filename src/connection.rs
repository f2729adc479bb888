use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use crate::db::DatabaseType;

/// File name of the SQLite database used when no config file exists.
pub const DEFAULT_SQLITE_PATH: &str = "db.sqlite3";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Connection {
    pub r#type: DatabaseType,
    pub name: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u64>,
    pub path: Option<PathBuf>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl Connection {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            r#type: DatabaseType::Sqlite,
            name: None,
            user: None,
            host: None,
            port: None,
            path: Some(path.into()),
            password: None,
            database: None,
        }
    }

    /// Name shown in logs and errors: the configured name, else the backend type.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.r#type.to_string())
    }

    /// `<type>://user:password@host:port[/database]`, for the server backends.
    pub fn server_url(&self) -> Result<String> {
        let missing = |field: &str| anyhow::anyhow!("type {} needs the {} field", self.r#type, field);
        let user = self.user.as_deref().ok_or_else(|| missing("user"))?;
        let host = self.host.as_deref().ok_or_else(|| missing("host"))?;
        let port = self.port.ok_or_else(|| missing("port"))?;
        let password = self.password.as_deref().unwrap_or_default();

        let mut url = format!("{}://{user}:{password}@{host}:{port}", self.r#type);
        if let Some(database) = &self.database {
            url.push('/');
            url.push_str(database);
        }
        Ok(url)
    }
}

impl Default for Connection {
    fn default() -> Self {
        Connection::sqlite(DEFAULT_SQLITE_PATH)
    }
}
