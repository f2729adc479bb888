//! Demonstration drivers and cars, and the loader that makes sure they exist.
//!
//! Cars name their owner by driver license. The owner's id is taken from the
//! driver row actually stored, so the loader does not depend on the store
//! handing out ids 1 and 2.

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use log::info;

use crate::db::{find_or_create, Store};
use crate::model::{Car, Driver, NewCar, NewDriver};

pub struct DriverSeed {
    pub name: &'static str,
    pub license: &'static str,
}

pub struct CarSeed {
    pub make: &'static str,
    pub model: &'static str,
    pub year: i32,
    pub vin: &'static str,
    pub owner_license: &'static str,
}

/// Seeded before any car, in this order.
pub const DRIVERS: &[DriverSeed] = &[
    DriverSeed {
        name: "John Doe",
        license: "Z1234567",
    },
    DriverSeed {
        name: "Jane Doe",
        license: "Z9876543",
    },
];

pub const CARS: &[CarSeed] = &[
    CarSeed {
        make: "Ford",
        model: "F-150",
        year: 2004,
        vin: "01083da2df15d6ebfe62186418a76863",
        owner_license: "Z1234567",
    },
    CarSeed {
        make: "Toyota",
        model: "Sienna",
        year: 2014,
        vin: "53092a17afa460689ca931f0d459e399",
        owner_license: "Z1234567",
    },
    CarSeed {
        make: "Honda",
        model: "Civic",
        year: 2018,
        vin: "844c56840b5fc26d414cf238381a5f1a",
        owner_license: "Z9876543",
    },
    CarSeed {
        make: "GMC",
        model: "Sierra",
        year: 2012,
        vin: "29aeffa4d5aa21d25d7196db3728f72c",
        owner_license: "Z9876543",
    },
];

/// Created/existing counts of one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub drivers_created: usize,
    pub drivers_existing: usize,
    pub cars_created: usize,
    pub cars_existing: usize,
}

impl SeedReport {
    pub fn created(&self) -> usize {
        self.drivers_created + self.cars_created
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "drivers: {} created, {} already present",
            self.drivers_created, self.drivers_existing
        )?;
        write!(
            f,
            "cars: {} created, {} already present",
            self.cars_created, self.cars_existing
        )
    }
}

/// Make sure every seed driver and car exists. Safe to run repeatedly;
/// existing rows are never modified. Store errors propagate as-is, leaving
/// whatever was created so far in place.
pub fn ensure_seeded(store: &mut dyn Store) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut owners: HashMap<&str, i64> = HashMap::new();

    for seed in DRIVERS {
        let new = NewDriver::new(seed.name, seed.license);
        let (driver, created) = find_or_create::<Driver>(store, &new)?;
        if created {
            report.drivers_created += 1;
        } else {
            report.drivers_existing += 1;
        }
        owners.insert(seed.license, driver.id);
    }

    for seed in CARS {
        let owner_id = *owners
            .get(seed.owner_license)
            .with_context(|| format!("car {} names unknown owner {}", seed.vin, seed.owner_license))?;
        let new = NewCar::new(seed.make, seed.model, seed.year, seed.vin, owner_id);
        let (_, created) = find_or_create::<Car>(store, &new)?;
        if created {
            report.cars_created += 1;
        } else {
            report.cars_existing += 1;
        }
    }

    info!(
        "seeded {} store: drivers {}/{} created, cars {}/{} created",
        store.backend(),
        report.drivers_created,
        DRIVERS.len(),
        report.cars_created,
        CARS.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Sqlite;
    use std::collections::HashSet;

    fn empty_store() -> Sqlite {
        let mut store = Sqlite::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn owner_name(store: &mut Sqlite, car: &Car) -> String {
        store
            .drivers()
            .unwrap()
            .into_iter()
            .find(|d| d.id == car.owner_id)
            .map(|d| d.name)
            .unwrap_or_default()
    }

    #[test]
    fn first_run_creates_everything() {
        let mut store = empty_store();
        let report = ensure_seeded(&mut store).unwrap();
        assert_eq!(
            report,
            SeedReport {
                drivers_created: 2,
                drivers_existing: 0,
                cars_created: 4,
                cars_existing: 0,
            }
        );

        let drivers = store.drivers().unwrap();
        let got: Vec<(&str, &str)> = drivers
            .iter()
            .map(|d| (d.name.as_str(), d.license.as_str()))
            .collect();
        assert_eq!(got, vec![("John Doe", "Z1234567"), ("Jane Doe", "Z9876543")]);
        // an empty store hands out ids 1 and 2
        assert_eq!(drivers[0].id, 1);
        assert_eq!(drivers[1].id, 2);

        let cars = store.cars().unwrap();
        assert_eq!(cars.len(), 4);
        for (car, seed) in cars.iter().zip(CARS) {
            assert_eq!(car.make, seed.make);
            assert_eq!(car.model, seed.model);
            assert_eq!(car.year, seed.year);
            assert_eq!(car.vin, seed.vin);
        }
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut store = empty_store();
        ensure_seeded(&mut store).unwrap();
        let drivers = store.drivers().unwrap();
        let cars = store.cars().unwrap();

        let report = ensure_seeded(&mut store).unwrap();
        assert_eq!(report.created(), 0);
        assert_eq!(report.drivers_existing, 2);
        assert_eq!(report.cars_existing, 4);
        assert_eq!(store.drivers().unwrap(), drivers);
        assert_eq!(store.cars().unwrap(), cars);
    }

    #[test]
    fn natural_keys_stay_unique() {
        let mut store = empty_store();
        for _ in 0..3 {
            ensure_seeded(&mut store).unwrap();
        }
        let drivers = store.drivers().unwrap();
        let licenses: HashSet<_> = drivers.iter().map(|d| d.license.clone()).collect();
        assert_eq!(licenses.len(), drivers.len());

        let cars = store.cars().unwrap();
        let vins: HashSet<_> = cars.iter().map(|c| c.vin.clone()).collect();
        assert_eq!(vins.len(), cars.len());
    }

    #[test]
    fn cars_belong_to_their_drivers() {
        let mut store = empty_store();
        ensure_seeded(&mut store).unwrap();
        let cars = store.cars().unwrap();
        let owners: Vec<(String, String)> = cars
            .iter()
            .map(|c| (c.make.clone(), owner_name(&mut store, c)))
            .collect();
        assert_eq!(
            owners,
            vec![
                ("Ford".to_string(), "John Doe".to_string()),
                ("Toyota".to_string(), "John Doe".to_string()),
                ("Honda".to_string(), "Jane Doe".to_string()),
                ("GMC".to_string(), "Jane Doe".to_string()),
            ]
        );
    }

    #[test]
    fn owners_follow_stored_ids_not_positions() {
        let mut store = empty_store();
        // occupy ids 1 and 2 with unrelated drivers
        store
            .insert_driver(&NewDriver::new("Someone Else", "A0000001"))
            .unwrap();
        store
            .insert_driver(&NewDriver::new("Another One", "A0000002"))
            .unwrap();

        ensure_seeded(&mut store).unwrap();
        let john = store.find_driver("Z1234567").unwrap().unwrap();
        let jane = store.find_driver("Z9876543").unwrap().unwrap();
        assert_eq!((john.id, jane.id), (3, 4));

        let ford = store.find_car("01083da2df15d6ebfe62186418a76863").unwrap().unwrap();
        let gmc = store.find_car("29aeffa4d5aa21d25d7196db3728f72c").unwrap().unwrap();
        assert_eq!(ford.owner_id, john.id);
        assert_eq!(gmc.owner_id, jane.id);
    }

    #[test]
    fn rerun_keeps_external_changes() {
        let mut store = empty_store();
        ensure_seeded(&mut store).unwrap();
        store
            .connection()
            .execute(
                "UPDATE cars_driver SET name = 'Johnathan Doe' WHERE license = 'Z1234567'",
                [],
            )
            .unwrap();

        let report = ensure_seeded(&mut store).unwrap();
        assert_eq!(report.created(), 0);
        let john = store.find_driver("Z1234567").unwrap().unwrap();
        assert_eq!(john.name, "Johnathan Doe");
    }

    #[test]
    fn partial_seed_is_completed() {
        let mut store = empty_store();
        let jane = store
            .insert_driver(&NewDriver::new("Jane Doe", "Z9876543"))
            .unwrap()
            .unwrap();
        store
            .insert_car(&NewCar::new("Honda", "Civic", 2018, "844c56840b5fc26d414cf238381a5f1a", jane.id))
            .unwrap();

        let report = ensure_seeded(&mut store).unwrap();
        assert_eq!(
            report,
            SeedReport {
                drivers_created: 1,
                drivers_existing: 1,
                cars_created: 3,
                cars_existing: 1,
            }
        );
        assert_eq!(store.drivers().unwrap().len(), 2);
        assert_eq!(store.cars().unwrap().len(), 4);
    }

    #[test]
    fn honda_lookup_after_first_run() {
        let mut store = empty_store();
        ensure_seeded(&mut store).unwrap();

        let car = store.find_car("844c56840b5fc26d414cf238381a5f1a").unwrap().unwrap();
        assert_eq!(car.make, "Honda");
        assert_eq!(car.model, "Civic");
        assert_eq!(car.year, 2018);
        assert_eq!(owner_name(&mut store, &car), "Jane Doe");
    }

    #[test]
    fn missing_schema_is_an_error() {
        let mut store = Sqlite::open_in_memory().unwrap();
        let err = ensure_seeded(&mut store).unwrap_err();
        assert!(format!("{err:#}").contains("failed to look up driver Z1234567"));
    }

    #[test]
    fn report_display() {
        let report = SeedReport {
            drivers_created: 2,
            drivers_existing: 0,
            cars_created: 1,
            cars_existing: 3,
        };
        assert_eq!(
            report.to_string(),
            "drivers: 2 created, 0 already present\ncars: 1 created, 3 already present"
        );
    }

    #[test]
    fn every_car_owner_is_a_seeded_driver() {
        let licenses: HashSet<&str> = DRIVERS.iter().map(|d| d.license).collect();
        assert!(CARS.iter().all(|c| licenses.contains(c.owner_license)));
    }
}
