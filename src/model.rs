/// A driver row. `license` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub license: String,
}

/// A car row. `vin` is the natural key, `owner_id` points at `Driver::id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub owner_id: i64,
}

/// Insert payload for a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub name: String,
    pub license: String,
}

/// Insert payload for a car.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub owner_id: i64,
}

impl NewDriver {
    pub fn new(name: impl Into<String>, license: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            license: license.into(),
        }
    }
}

impl NewCar {
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        vin: impl Into<String>,
        owner_id: i64,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
            vin: vin.into(),
            owner_id,
        }
    }
}
