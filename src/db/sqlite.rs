use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use crate::connection::Connection;
use crate::db::{DatabaseType, Store, CAR_TABLE, DRIVER_TABLE};
use crate::model::{Car, Driver, NewCar, NewDriver};

pub struct Sqlite {
    conn: rusqlite::Connection,
}

impl Sqlite {
    pub fn open(conn: &Connection) -> Result<Self> {
        let path = sqlite_path(conn)?;
        debug!("sqlite: opening {}", path.display());
        let sc = rusqlite::Connection::open(&path)
            .with_context(|| format!("failed to open sqlite database {}", path.display()))?;
        Self::from_connection(sc)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(rusqlite::Connection::open_in_memory()?)
    }

    fn from_connection(conn: rusqlite::Connection) -> Result<Self> {
        // off by default in sqlite; owner_id must reference a real driver
        conn.pragma_update(None, "foreign_keys", "ON")?;
        debug!("sqlite: opened");
        Ok(Self { conn })
    }

    /// Underlying connection, for statements outside the `Store` surface.
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Store for Sqlite {
    fn backend(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {DRIVER_TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                license VARCHAR(50) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS {CAR_TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                make VARCHAR(50) NOT NULL,
                model VARCHAR(50) NOT NULL,
                year INTEGER NOT NULL,
                vin VARCHAR(64) NOT NULL UNIQUE,
                owner_id BIGINT NOT NULL REFERENCES {DRIVER_TABLE} (id)
            );
            "#
        ))?;
        Ok(())
    }

    fn find_driver(&mut self, license: &str) -> Result<Option<Driver>> {
        let driver = self
            .conn
            .query_row(
                &format!("SELECT id, name, license FROM {DRIVER_TABLE} WHERE license = ?1"),
                params![license],
                driver_from_row,
            )
            .optional()?;
        Ok(driver)
    }

    fn insert_driver(&mut self, new: &NewDriver) -> Result<Option<Driver>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "INSERT INTO {DRIVER_TABLE} (name, license) VALUES (?1, ?2)
                     ON CONFLICT(license) DO NOTHING RETURNING id"
                ),
                params![new.name, new.license],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| Driver {
            id,
            name: new.name.clone(),
            license: new.license.clone(),
        }))
    }

    fn find_car(&mut self, vin: &str) -> Result<Option<Car>> {
        let car = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, make, model, year, vin, owner_id FROM {CAR_TABLE} WHERE vin = ?1"
                ),
                params![vin],
                car_from_row,
            )
            .optional()?;
        Ok(car)
    }

    fn insert_car(&mut self, new: &NewCar) -> Result<Option<Car>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "INSERT INTO {CAR_TABLE} (make, model, year, vin, owner_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(vin) DO NOTHING RETURNING id"
                ),
                params![new.make, new.model, new.year, new.vin, new.owner_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| Car {
            id,
            make: new.make.clone(),
            model: new.model.clone(),
            year: new.year,
            vin: new.vin.clone(),
            owner_id: new.owner_id,
        }))
    }

    fn drivers(&mut self) -> Result<Vec<Driver>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, name, license FROM {DRIVER_TABLE} ORDER BY id"))?;
        let rows = stmt.query_map([], driver_from_row)?;
        let mut drivers = Vec::new();
        for r in rows {
            drivers.push(r?);
        }
        Ok(drivers)
    }

    fn cars(&mut self) -> Result<Vec<Car>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, make, model, year, vin, owner_id FROM {CAR_TABLE} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], car_from_row)?;
        let mut cars = Vec::new();
        for r in rows {
            cars.push(r?);
        }
        Ok(cars)
    }
}

fn driver_from_row(row: &Row) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get(0)?,
        name: row.get(1)?,
        license: row.get(2)?,
    })
}

fn car_from_row(row: &Row) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        year: row.get(3)?,
        vin: row.get(4)?,
        owner_id: row.get(5)?,
    })
}

fn sqlite_path(conn: &Connection) -> Result<PathBuf> {
    let path = conn
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("type sqlite needs the path field"))?;
    expand_path(path).ok_or_else(|| anyhow::anyhow!("cannot expand file path {}", path.display()))
}

/// Expand a leading `~` and whole-component environment variables
/// (`$VAR`, or `%VAR%` on Windows). Unset variables expand to nothing.
fn expand_path(path: &Path) -> Option<PathBuf> {
    let mut expanded = PathBuf::new();
    for (i, part) in path.iter().enumerate() {
        let part = part.to_str()?;
        if i == 0 && part == "~" {
            expanded.push(dirs_next::home_dir()?);
        } else if let Some(var) = env_var_name(part) {
            expanded.push(std::env::var(var).unwrap_or_default());
        } else {
            expanded.push(part);
        }
    }
    Some(expanded)
}

fn env_var_name(part: &str) -> Option<&str> {
    if cfg!(windows) {
        part.strip_prefix('%')?.strip_suffix('%')
    } else {
        part.strip_prefix('$')
    }
}
