// ── Appliance identity ──

use std::borrow::Borrow;
use std::fmt;

use hcbridge_api::models::HomeAppliance;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;

// ── HaId ────────────────────────────────────────────────────────────

/// Vendor-issued stable appliance identifier, e.g. `BOSCH-SMV68TX06E-70C62F17C8E4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HaId(String);

impl HaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HaId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for HaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for HaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ── ApplianceType ───────────────────────────────────────────────────

/// Appliance families with a known attribute table.
///
/// Parsed from the vendor `type` string, which uses the variant names verbatim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ApplianceType {
    CoffeeMaker,
    Dishwasher,
    Dryer,
    FridgeFreezer,
    Hob,
    Hood,
    Oven,
    Washer,
    WasherDryer,
    CleaningRobot,
    CookProcessor,
    WineCooler,
}

// ── Appliance ───────────────────────────────────────────────────────

/// A discovered appliance. Identity never changes after discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub ha_id: HaId,
    pub kind: ApplianceType,
    pub display_name: String,
    pub brand: Option<String>,
    /// Cloud connectivity as reported at discovery time.
    pub connected: bool,
}

impl TryFrom<&HomeAppliance> for Appliance {
    type Error = CoreError;

    fn try_from(ha: &HomeAppliance) -> Result<Self, Self::Error> {
        let kind = ha
            .appliance_type
            .parse::<ApplianceType>()
            .map_err(|_| CoreError::UnknownApplianceType {
                type_name: ha.appliance_type.clone(),
            })?;
        Ok(Self {
            ha_id: HaId::from(ha.ha_id.as_str()),
            kind,
            display_name: ha.name.clone(),
            brand: ha.brand.clone(),
            connected: ha.connected,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn home_appliance(kind: &str) -> HomeAppliance {
        HomeAppliance {
            ha_id: "SIEMENS-WM14T6H9NL-000000000000".into(),
            name: "Washer".into(),
            appliance_type: kind.into(),
            brand: Some("Siemens".into()),
            vib: None,
            enumber: None,
            connected: true,
        }
    }

    #[test]
    fn every_type_round_trips_through_its_vendor_name() {
        for kind in ApplianceType::iter() {
            assert_eq!(kind.to_string().parse::<ApplianceType>().unwrap(), kind);
        }
        assert_eq!(ApplianceType::iter().count(), 12);
    }

    #[test]
    fn discovery_record_converts() {
        let appliance = Appliance::try_from(&home_appliance("WasherDryer")).unwrap();
        assert_eq!(appliance.kind, ApplianceType::WasherDryer);
        assert_eq!(appliance.ha_id.as_str(), "SIEMENS-WM14T6H9NL-000000000000");
        assert_eq!(appliance.display_name, "Washer");
    }

    #[test]
    fn unknown_vendor_type_is_rejected() {
        let err = Appliance::try_from(&home_appliance("Toaster")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnknownApplianceType { ref type_name } if type_name == "Toaster"
        ));
    }
}
