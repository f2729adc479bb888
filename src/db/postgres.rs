use anyhow::Result;
use log::debug;
use postgres::Row;

use crate::connection::Connection;
use crate::db::{DatabaseType, Store, CAR_TABLE, DRIVER_TABLE};
use crate::model::{Car, Driver, NewCar, NewDriver};

// Key columns may be int4 (serial) or int8 (bigserial) depending on who made
// the tables, so every id crosses the wire as bigint and year as int4.
const DRIVER_COLUMNS: &str = "id::bigint, name, license";
const CAR_COLUMNS: &str = "id::bigint, make, model, year::integer, vin, owner_id::bigint";

pub struct Postgres {
    client: postgres::Client,
}

impl Postgres {
    pub fn open(conn: &Connection) -> Result<Self> {
        Self::connect(&conn.server_url()?)
    }

    pub fn connect(url: &str) -> Result<Self> {
        debug!("postgres: connecting");
        let client = postgres::Client::connect(url, postgres::NoTls)?;
        debug!("postgres: connected");
        Ok(Self { client })
    }
}

impl Store for Postgres {
    fn backend(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.client.batch_execute(&format!(
            "CREATE TABLE IF NOT EXISTS {DRIVER_TABLE} (
                 id BIGSERIAL PRIMARY KEY,
                 name VARCHAR(100) NOT NULL,
                 license VARCHAR(50) NOT NULL UNIQUE
             );
             CREATE TABLE IF NOT EXISTS {CAR_TABLE} (
                 id BIGSERIAL PRIMARY KEY,
                 make VARCHAR(50) NOT NULL,
                 model VARCHAR(50) NOT NULL,
                 year INTEGER NOT NULL,
                 vin VARCHAR(64) NOT NULL UNIQUE,
                 owner_id BIGINT NOT NULL REFERENCES {DRIVER_TABLE} (id)
             );"
        ))?;
        Ok(())
    }

    fn find_driver(&mut self, license: &str) -> Result<Option<Driver>> {
        let row = self.client.query_opt(
            &format!("SELECT {DRIVER_COLUMNS} FROM {DRIVER_TABLE} WHERE license = $1"),
            &[&license],
        )?;
        row.as_ref().map(driver_from_row).transpose()
    }

    fn insert_driver(&mut self, new: &NewDriver) -> Result<Option<Driver>> {
        let row = self.client.query_opt(
            &format!(
                "INSERT INTO {DRIVER_TABLE} (name, license) VALUES ($1, $2)
                 ON CONFLICT (license) DO NOTHING RETURNING {DRIVER_COLUMNS}"
            ),
            &[&new.name, &new.license],
        )?;
        row.as_ref().map(driver_from_row).transpose()
    }

    fn find_car(&mut self, vin: &str) -> Result<Option<Car>> {
        let row = self.client.query_opt(
            &format!("SELECT {CAR_COLUMNS} FROM {CAR_TABLE} WHERE vin = $1"),
            &[&vin],
        )?;
        row.as_ref().map(car_from_row).transpose()
    }

    fn insert_car(&mut self, new: &NewCar) -> Result<Option<Car>> {
        // explicit parameter types; the server casts them to the column types
        let row = self.client.query_opt(
            &format!(
                "INSERT INTO {CAR_TABLE} (make, model, year, vin, owner_id)
                 VALUES ($1, $2, $3::integer, $4, $5::bigint)
                 ON CONFLICT (vin) DO NOTHING RETURNING {CAR_COLUMNS}"
            ),
            &[&new.make, &new.model, &new.year, &new.vin, &new.owner_id],
        )?;
        row.as_ref().map(car_from_row).transpose()
    }

    fn drivers(&mut self) -> Result<Vec<Driver>> {
        let rows = self.client.query(
            &format!("SELECT {DRIVER_COLUMNS} FROM {DRIVER_TABLE} ORDER BY id"),
            &[],
        )?;
        rows.iter().map(driver_from_row).collect()
    }

    fn cars(&mut self) -> Result<Vec<Car>> {
        let rows = self.client.query(
            &format!("SELECT {CAR_COLUMNS} FROM {CAR_TABLE} ORDER BY id"),
            &[],
        )?;
        rows.iter().map(car_from_row).collect()
    }
}

fn driver_from_row(r: &Row) -> Result<Driver> {
    Ok(Driver {
        id: r.try_get(0)?,
        name: r.try_get(1)?,
        license: r.try_get(2)?,
    })
}

fn car_from_row(r: &Row) -> Result<Car> {
    Ok(Car {
        id: r.try_get(0)?,
        make: r.try_get(1)?,
        model: r.try_get(2)?,
        year: r.try_get(3)?,
        vin: r.try_get(4)?,
        owner_id: r.try_get(5)?,
    })
}
