mod mysql;
mod postgres;
mod sqlite;

use std::fmt;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::connection::Connection;
use crate::model::{Car, Driver, NewCar, NewDriver};

pub use self::mysql::Mysql;
pub use self::postgres::Postgres;
pub use self::sqlite::Sqlite;

pub const DRIVER_TABLE: &str = "cars_driver";
pub const CAR_TABLE: &str = "cars_car";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::MySql => write!(f, "mysql"),
            DatabaseType::Postgres => write!(f, "postgres"),
            DatabaseType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Row-level access to the driver and car tables.
///
/// `insert_*` return `Ok(None)` when the natural key is already taken, so a
/// lost insert race is distinguishable from a real failure.
pub trait Store {
    fn backend(&self) -> DatabaseType;

    /// Create both tables if they are missing. Never alters existing ones.
    fn ensure_schema(&mut self) -> Result<()>;

    fn find_driver(&mut self, license: &str) -> Result<Option<Driver>>;
    fn insert_driver(&mut self, new: &NewDriver) -> Result<Option<Driver>>;
    fn find_car(&mut self, vin: &str) -> Result<Option<Car>>;
    fn insert_car(&mut self, new: &NewCar) -> Result<Option<Car>>;

    /// All drivers ordered by id.
    fn drivers(&mut self) -> Result<Vec<Driver>>;
    /// All cars ordered by id.
    fn cars(&mut self) -> Result<Vec<Car>>;
}

/// Open a store for the given connection.
pub fn open(conn: &Connection) -> Result<Box<dyn Store>> {
    info!("opening {} store '{}'", conn.r#type, conn.label());
    let store: Result<Box<dyn Store>> = match conn.r#type {
        DatabaseType::MySql => Mysql::open(conn).map(|s| Box::new(s) as Box<dyn Store>),
        DatabaseType::Postgres => Postgres::open(conn).map(|s| Box::new(s) as Box<dyn Store>),
        DatabaseType::Sqlite => Sqlite::open(conn).map(|s| Box::new(s) as Box<dyn Store>),
    };
    store.with_context(|| format!("failed to open connection '{}'", conn.label()))
}

/// An entity kind with a single-column natural key.
pub trait Record: Sized {
    type New;
    const KIND: &'static str;

    fn key(new: &Self::New) -> &str;
    fn find(store: &mut dyn Store, key: &str) -> Result<Option<Self>>;
    fn insert(store: &mut dyn Store, new: &Self::New) -> Result<Option<Self>>;
}

impl Record for Driver {
    type New = NewDriver;
    const KIND: &'static str = "driver";

    fn key(new: &NewDriver) -> &str {
        &new.license
    }
    fn find(store: &mut dyn Store, key: &str) -> Result<Option<Self>> {
        store.find_driver(key)
    }
    fn insert(store: &mut dyn Store, new: &NewDriver) -> Result<Option<Self>> {
        store.insert_driver(new)
    }
}

impl Record for Car {
    type New = NewCar;
    const KIND: &'static str = "car";

    fn key(new: &NewCar) -> &str {
        &new.vin
    }
    fn find(store: &mut dyn Store, key: &str) -> Result<Option<Self>> {
        store.find_car(key)
    }
    fn insert(store: &mut dyn Store, new: &NewCar) -> Result<Option<Self>> {
        store.insert_car(new)
    }
}

/// Return the record whose natural key matches `new`, creating it from `new`
/// if absent. The bool is true when a row was inserted. An existing row is
/// returned as stored, even if its other fields differ from `new`.
pub fn find_or_create<R: Record>(store: &mut dyn Store, new: &R::New) -> Result<(R, bool)> {
    let key = R::key(new);
    let found = R::find(store, key)
        .with_context(|| format!("failed to look up {} {}", R::KIND, key))?;
    if let Some(existing) = found {
        debug!("{} {} already present", R::KIND, key);
        return Ok((existing, false));
    }

    let inserted = R::insert(store, new)
        .with_context(|| format!("failed to create {} {}", R::KIND, key))?;
    if let Some(created) = inserted {
        debug!("{} {} created", R::KIND, key);
        return Ok((created, true));
    }

    // someone else inserted the key between our lookup and insert
    warn!("{} {} was created concurrently, using existing row", R::KIND, key);
    let existing = R::find(store, key)
        .with_context(|| format!("failed to look up {} {}", R::KIND, key))?
        .ok_or_else(|| {
            anyhow::anyhow!("{} {} conflicted on insert but is not visible", R::KIND, key)
        })?;
    Ok((existing, false))
}
