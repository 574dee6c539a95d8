use serde::Serialize;

use crate::error::RideError;

/// Physical constants of one vehicle model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSpec {
    pub id: String,
    pub name: String,
    /// Liters
    pub tank_capacity: f64,
    /// Kilometers per liter
    pub mileage: f64,
}

impl VehicleSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tank_capacity: f64, mileage: f64) -> Self {
        debug_assert!(tank_capacity > 0. && mileage > 0.);

        Self {
            id: id.into(),
            name: name.into(),
            tank_capacity,
            mileage,
        }
    }

    /// A vehicle is addressed either by its slug or by its display name.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }

    pub fn range(&self, liters: f64) -> f64 {
        liters * self.mileage
    }

    pub fn fuel_for(&self, kilometers: f64) -> f64 {
        kilometers / self.mileage
    }

    pub fn fuel_percent(&self, liters: f64) -> f64 {
        liters / self.tank_capacity * 100.
    }
}

const BUILTIN_VEHICLES: [(&str, &str, f64, f64); 2] = [
    ("splendor2018", "2018 Splendor", 8., 60.),
    ("activa2020", "2020 Activa", 5.3, 45.),
];

/// Read-only table of the vehicles rides can be started with.
#[derive(Debug, Clone)]
pub struct VehicleCatalog {
    vehicles: Vec<VehicleSpec>,
}

impl VehicleCatalog {
    pub fn new(vehicles: Vec<VehicleSpec>) -> Self {
        Self { vehicles }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_VEHICLES
                .iter()
                .map(|&(id, name, tank_capacity, mileage)| VehicleSpec::new(id, name, tank_capacity, mileage))
                .collect(),
        )
    }

    pub fn lookup(&self, key: &str) -> Result<&VehicleSpec, RideError> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.matches(key))
            .ok_or_else(|| RideError::VehicleNotFound(key.to_string()))
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleSpec> {
        self.vehicles.iter()
    }
}

impl Default for VehicleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[test]
fn test_lookup_by_id_and_name() {
    let catalog = VehicleCatalog::builtin();

    let by_name = catalog.lookup("2018 Splendor").unwrap();
    assert_eq!(by_name.tank_capacity, 8.);
    assert_eq!(by_name.mileage, 60.);

    let by_id = catalog.lookup("splendor2018").unwrap();
    assert_eq!(by_id, by_name);

    assert_eq!(catalog.lookup("activa2020").unwrap().mileage, 45.);
}

#[test]
fn test_lookup_unknown_vehicle() {
    let catalog = VehicleCatalog::builtin();

    // No default tank is substituted for unknown vehicles.
    assert_eq!(
        catalog.lookup("unknown-bike"),
        Err(RideError::VehicleNotFound("unknown-bike".to_string()))
    );
    assert!(catalog.lookup("").is_err());
}

#[test]
fn test_fuel_arithmetic() {
    let splendor = VehicleSpec::new("splendor2018", "2018 Splendor", 8., 60.);

    assert_eq!(splendor.range(2.), 120.);
    assert_eq!(splendor.fuel_for(30.), 0.5);
    assert_eq!(splendor.fuel_percent(2.), 25.);
}
