//! Booking scenarios and passenger form data

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::config::AgeRange;
use crate::{Error, Result};

/// One booking scenario from the scenarios file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingScenario {
    pub name: String,
    pub adults: u32,
    pub children: u32,
    #[serde(default)]
    pub child_age_range: Option<AgeRange>,
    #[serde(default)]
    pub description: String,
}

/// Top-level shape of the scenarios file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingScenariosData {
    pub scenarios: Vec<BookingScenario>,
}

/// What the home page search ended up selecting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSelection {
    pub departure_airport: String,
    pub destination: String,
    pub departure_date: String,
    pub adults: u32,
    pub children: u32,
    pub child_ages: Vec<u32>,
    pub hotel_name: Option<String>,
}

/// Sections of the passenger form that carry their own validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerSection {
    #[serde(rename = "adult_mainBooker")]
    AdultMainBooker,
    ChildPassenger,
    InfantPassenger,
}

impl PassengerSection {
    /// Field id prefixes expected to show an error when the section is empty
    pub fn field_ids(&self) -> &'static [&'static str] {
        match self {
            PassengerSection::AdultMainBooker => &[
                "FIRSTNAMEADULT",
                "SURNAMEADULT",
                "ADDRESS1ADULT",
                "HOUSENUMBERADULT",
                "POSTALCODEADULT",
                "TOWNADULT",
                "MOBILENUMBERADULT",
                "EMAILADDRESSADULT",
            ],
            PassengerSection::ChildPassenger => &["FIRSTNAMECHILD", "SURNAMECHILD"],
            PassengerSection::InfantPassenger => &["FIRSTNAMEINFANT", "SURNAMEINFANT"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerSection::AdultMainBooker => "adult_mainBooker",
            PassengerSection::ChildPassenger => "child_passenger",
            PassengerSection::InfantPassenger => "infant_passenger",
        }
    }
}

impl std::fmt::Display for PassengerSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load booking scenarios from a JSON file
pub fn load_booking_scenarios(path: &Path) -> Result<BookingScenariosData> {
    debug!("Loading booking scenarios from {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::TestData(format!(
            "Failed to load booking scenarios from {}: {}",
            path.display(),
            e
        ))
    })?;
    let data: BookingScenariosData = serde_json::from_str(&raw)?;

    if let Some(bad) = data.scenarios.iter().find(|s| !validate_scenario(s)) {
        return Err(Error::TestData(format!("invalid scenario '{}'", bad.name)));
    }

    Ok(data)
}

/// Find a scenario by name
pub fn scenario_by_name(path: &Path, name: &str) -> Result<BookingScenario> {
    load_booking_scenarios(path)?
        .scenarios
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| Error::NotFound {
            kind: "scenario".to_string(),
            name: name.to_string(),
        })
}

/// First scenario in the file
pub fn default_scenario(path: &Path) -> Result<BookingScenario> {
    load_booking_scenarios(path)?
        .scenarios
        .into_iter()
        .next()
        .ok_or_else(|| Error::TestData("No booking scenarios found in test data".to_string()))
}

pub fn all_scenarios(path: &Path) -> Result<Vec<BookingScenario>> {
    Ok(load_booking_scenarios(path)?.scenarios)
}

/// A scenario needs a name, at least one adult and a sane age range
pub fn validate_scenario(scenario: &BookingScenario) -> bool {
    let ages_ok = scenario
        .child_age_range
        .map(|range| range.min <= range.max)
        .unwrap_or(true);
    !scenario.name.trim().is_empty() && scenario.adults > 0 && ages_ok
}
