use anyhow::Result;
use log::debug;
use mysql::prelude::Queryable;

use crate::connection::Connection;
use crate::db::{DatabaseType, Store, CAR_TABLE, DRIVER_TABLE};
use crate::model::{Car, Driver, NewCar, NewDriver};

/// ER_DUP_ENTRY
const DUPLICATE_ENTRY: u16 = 1062;

type DriverRow = (i64, String, String);
type CarRow = (i64, String, String, i32, String, i64);

pub struct Mysql {
    conn: mysql::Conn,
}

impl Mysql {
    pub fn open(conn: &Connection) -> Result<Self> {
        debug!("mysql: connecting");
        let url = conn.server_url()?;
        let conn = mysql::Conn::new(url.as_str())?;
        debug!("mysql: connected");
        Ok(Self { conn })
    }
}

fn is_duplicate_entry(err: &mysql::Error) -> bool {
    matches!(err, mysql::Error::MySqlError(e) if e.code == DUPLICATE_ENTRY)
}

impl Store for Mysql {
    fn backend(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.query_drop(format!(
            "CREATE TABLE IF NOT EXISTS {DRIVER_TABLE} (
                 id BIGINT AUTO_INCREMENT PRIMARY KEY,
                 name VARCHAR(100) NOT NULL,
                 license VARCHAR(50) NOT NULL UNIQUE
             )"
        ))?;
        self.conn.query_drop(format!(
            "CREATE TABLE IF NOT EXISTS {CAR_TABLE} (
                 id BIGINT AUTO_INCREMENT PRIMARY KEY,
                 make VARCHAR(50) NOT NULL,
                 model VARCHAR(50) NOT NULL,
                 year INTEGER NOT NULL,
                 vin VARCHAR(64) NOT NULL UNIQUE,
                 owner_id BIGINT NOT NULL,
                 FOREIGN KEY (owner_id) REFERENCES {DRIVER_TABLE} (id)
             )"
        ))?;
        Ok(())
    }

    fn find_driver(&mut self, license: &str) -> Result<Option<Driver>> {
        let row: Option<DriverRow> = self.conn.exec_first(
            format!("SELECT id, name, license FROM {DRIVER_TABLE} WHERE license = ?"),
            (license,),
        )?;
        Ok(row.map(driver_from_row))
    }

    fn insert_driver(&mut self, new: &NewDriver) -> Result<Option<Driver>> {
        let res = self.conn.exec_drop(
            format!("INSERT INTO {DRIVER_TABLE} (name, license) VALUES (?, ?)"),
            (&new.name, &new.license),
        );
        match res {
            Ok(()) => Ok(Some(Driver {
                id: self.conn.last_insert_id() as i64,
                name: new.name.clone(),
                license: new.license.clone(),
            })),
            Err(e) if is_duplicate_entry(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_car(&mut self, vin: &str) -> Result<Option<Car>> {
        let row: Option<CarRow> = self.conn.exec_first(
            format!("SELECT id, make, model, year, vin, owner_id FROM {CAR_TABLE} WHERE vin = ?"),
            (vin,),
        )?;
        Ok(row.map(car_from_row))
    }

    fn insert_car(&mut self, new: &NewCar) -> Result<Option<Car>> {
        let res = self.conn.exec_drop(
            format!(
                "INSERT INTO {CAR_TABLE} (make, model, year, vin, owner_id) VALUES (?, ?, ?, ?, ?)"
            ),
            (&new.make, &new.model, new.year, &new.vin, new.owner_id),
        );
        match res {
            Ok(()) => Ok(Some(Car {
                id: self.conn.last_insert_id() as i64,
                make: new.make.clone(),
                model: new.model.clone(),
                year: new.year,
                vin: new.vin.clone(),
                owner_id: new.owner_id,
            })),
            Err(e) if is_duplicate_entry(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn drivers(&mut self) -> Result<Vec<Driver>> {
        let rows: Vec<DriverRow> = self
            .conn
            .query(format!("SELECT id, name, license FROM {DRIVER_TABLE} ORDER BY id"))?;
        Ok(rows.into_iter().map(driver_from_row).collect())
    }

    fn cars(&mut self) -> Result<Vec<Car>> {
        let rows: Vec<CarRow> = self.conn.query(format!(
            "SELECT id, make, model, year, vin, owner_id FROM {CAR_TABLE} ORDER BY id"
        ))?;
        Ok(rows.into_iter().map(car_from_row).collect())
    }
}

fn driver_from_row((id, name, license): DriverRow) -> Driver {
    Driver { id, name, license }
}

fn car_from_row((id, make, model, year, vin, owner_id): CarRow) -> Car {
    Car {
        id,
        make,
        model,
        year,
        vin,
        owner_id,
    }
}
