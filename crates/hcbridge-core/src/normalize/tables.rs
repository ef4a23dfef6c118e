// Vendor key → attribute name tables, one per appliance family.
//
// Every appliance gets COMMON plus the rows for its type. WasherDryer
// takes both the washer and the dryer rows; Hob and CookProcessor expose
// only the common set.

use super::transform::ValueTransform;
use crate::model::ApplianceType;

/// One row of an attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub transform: ValueTransform,
}

const fn plain(key: &'static str, name: &'static str) -> AttributeSpec {
    AttributeSpec {
        key,
        name,
        transform: ValueTransform::Identity,
    }
}

const fn enumerated(key: &'static str, name: &'static str) -> AttributeSpec {
    AttributeSpec {
        key,
        name,
        transform: ValueTransform::EnumSuffix,
    }
}

const fn duration(key: &'static str, name: &'static str) -> AttributeSpec {
    AttributeSpec {
        key,
        name,
        transform: ValueTransform::Duration,
    }
}

// ── Shared keys ─────────────────────────────────────────────────────

pub const OPERATION_STATE: &str = "BSH.Common.Status.OperationState";
pub const POWER_STATE: &str = "BSH.Common.Setting.PowerState";
pub const PROGRAM_PROGRESS: &str = "BSH.Common.Option.ProgramProgress";
pub const REMAINING_PROGRAM_TIME: &str = "BSH.Common.Option.RemainingProgramTime";
pub const ACTIVE_PROGRAM: &str = "BSH.Common.Root.ActiveProgram";
pub const SELECTED_PROGRAM: &str = "BSH.Common.Root.SelectedProgram";

pub const COMMON: &[AttributeSpec] = &[
    enumerated(OPERATION_STATE, "operationState"),
    enumerated(POWER_STATE, "powerState"),
    enumerated("BSH.Common.Status.DoorState", "doorState"),
    plain("BSH.Common.Status.RemoteControlActive", "remoteControlActive"),
    plain(
        "BSH.Common.Status.RemoteControlStartAllowed",
        "remoteControlStartAllowed",
    ),
    plain("BSH.Common.Status.LocalControlActive", "localControlActive"),
    enumerated(ACTIVE_PROGRAM, "activeProgram"),
    enumerated(SELECTED_PROGRAM, "selectedProgram"),
    duration(REMAINING_PROGRAM_TIME, "remainingProgramTime"),
    duration("BSH.Common.Option.ElapsedProgramTime", "elapsedProgramTime"),
    plain(PROGRAM_PROGRESS, "programProgress"),
    duration("BSH.Common.Option.StartInRelative", "startInRelative"),
    duration("BSH.Common.Option.Duration", "programDuration"),
    enumerated("BSH.Common.Event.ProgramFinished", "programFinished"),
    enumerated("BSH.Common.Event.ProgramAborted", "programAborted"),
    plain("BSH.Common.Setting.ChildLock", "childLock"),
];

// ── Per-type rows ───────────────────────────────────────────────────

const DISHWASHER: &[AttributeSpec] = &[
    enumerated("Dishcare.Dishwasher.Event.SaltNearlyEmpty", "saltNearlyEmpty"),
    enumerated(
        "Dishcare.Dishwasher.Event.RinseAidNearlyEmpty",
        "rinseAidNearlyEmpty",
    ),
    plain("Dishcare.Dishwasher.Option.IntensivZone", "intensiveZone"),
    plain("Dishcare.Dishwasher.Option.VarioSpeedPlus", "varioSpeedPlus"),
    plain("Dishcare.Dishwasher.Option.HalfLoad", "halfLoad"),
    plain("Dishcare.Dishwasher.Option.ExtraDry", "extraDry"),
    plain("Dishcare.Dishwasher.Option.HygienePlus", "hygienePlus"),
];

const WASHER: &[AttributeSpec] = &[
    enumerated("LaundryCare.Washer.Option.Temperature", "washerTemperature"),
    enumerated("LaundryCare.Washer.Option.SpinSpeed", "spinSpeed"),
    plain("LaundryCare.Washer.Option.IDos1Active", "iDos1Active"),
    plain("LaundryCare.Washer.Option.IDos2Active", "iDos2Active"),
    enumerated(
        "LaundryCare.Washer.Event.IDos1FillLevelPoor",
        "iDos1FillLevelPoor",
    ),
    enumerated(
        "LaundryCare.Washer.Event.IDos2FillLevelPoor",
        "iDos2FillLevelPoor",
    ),
];

const DRYER: &[AttributeSpec] = &[
    enumerated("LaundryCare.Dryer.Option.DryingTarget", "dryingTarget"),
    enumerated("LaundryCare.Dryer.Option.WrinkleGuard", "wrinkleGuard"),
    enumerated(
        "LaundryCare.Dryer.Event.DryingProcessFinished",
        "dryingProcessFinished",
    ),
];

const OVEN: &[AttributeSpec] = &[
    plain(
        "Cooking.Oven.Status.CurrentCavityTemperature",
        "cavityTemperature",
    ),
    plain("Cooking.Oven.Option.SetpointTemperature", "setpointTemperature"),
    plain("Cooking.Oven.Option.FastPreHeat", "fastPreHeat"),
    enumerated("Cooking.Oven.Event.PreheatFinished", "preheatFinished"),
    plain("Cooking.Oven.Setting.SabbathMode", "sabbathMode"),
    duration("BSH.Common.Setting.AlarmClock", "alarmClock"),
    enumerated("BSH.Common.Event.AlarmClockElapsed", "alarmClockElapsed"),
];

const COFFEE_MAKER: &[AttributeSpec] = &[
    enumerated(
        "ConsumerProducts.CoffeeMaker.Event.BeanContainerEmpty",
        "beanContainerEmpty",
    ),
    enumerated(
        "ConsumerProducts.CoffeeMaker.Event.WaterTankEmpty",
        "waterTankEmpty",
    ),
    enumerated(
        "ConsumerProducts.CoffeeMaker.Event.DripTrayFull",
        "dripTrayFull",
    ),
    enumerated("ConsumerProducts.CoffeeMaker.Option.BeanAmount", "beanAmount"),
    plain(
        "ConsumerProducts.CoffeeMaker.Option.FillQuantity",
        "fillQuantity",
    ),
    enumerated(
        "ConsumerProducts.CoffeeMaker.Option.CoffeeTemperature",
        "coffeeTemperature",
    ),
    plain("ConsumerProducts.CoffeeMaker.Setting.CupWarmer", "cupWarmer"),
];

const FRIDGE_FREEZER: &[AttributeSpec] = &[
    plain(
        "Refrigeration.FridgeFreezer.Setting.SetpointTemperatureRefrigerator",
        "refrigeratorSetpoint",
    ),
    plain(
        "Refrigeration.FridgeFreezer.Setting.SetpointTemperatureFreezer",
        "freezerSetpoint",
    ),
    plain(
        "Refrigeration.FridgeFreezer.Setting.SuperModeRefrigerator",
        "refrigeratorSuperMode",
    ),
    plain(
        "Refrigeration.FridgeFreezer.Setting.SuperModeFreezer",
        "freezerSuperMode",
    ),
    enumerated(
        "Refrigeration.Common.Status.Door.Refrigerator",
        "refrigeratorDoorState",
    ),
    enumerated("Refrigeration.Common.Status.Door.Freezer", "freezerDoorState"),
    enumerated(
        "Refrigeration.FridgeFreezer.Event.DoorAlarmRefrigerator",
        "refrigeratorDoorAlarm",
    ),
    enumerated(
        "Refrigeration.FridgeFreezer.Event.DoorAlarmFreezer",
        "freezerDoorAlarm",
    ),
    enumerated(
        "Refrigeration.FridgeFreezer.Event.TemperatureAlarmFreezer",
        "freezerTemperatureAlarm",
    ),
    plain("Refrigeration.Common.Setting.EcoMode", "ecoMode"),
    plain("Refrigeration.Common.Setting.VacationMode", "vacationMode"),
];

const HOOD: &[AttributeSpec] = &[
    enumerated("Cooking.Common.Option.Hood.VentingLevel", "ventingLevel"),
    enumerated("Cooking.Common.Option.Hood.IntensiveLevel", "intensiveLevel"),
    plain("Cooking.Common.Setting.Lighting", "lighting"),
    plain("Cooking.Common.Setting.LightingBrightness", "lightingBrightness"),
    plain("BSH.Common.Setting.AmbientLightEnabled", "ambientLightEnabled"),
    plain(
        "BSH.Common.Setting.AmbientLightBrightness",
        "ambientLightBrightness",
    ),
    enumerated(
        "Cooking.Hood.Event.GreaseFilterMaxSaturationNearlyReached",
        "greaseFilterSaturationNearlyReached",
    ),
];

const CLEANING_ROBOT: &[AttributeSpec] = &[
    plain("BSH.Common.Status.BatteryLevel", "batteryLevel"),
    enumerated(
        "BSH.Common.Status.BatteryChargingState",
        "batteryChargingState",
    ),
    enumerated("BSH.Common.Status.ChargingConnection", "chargingConnection"),
    enumerated(
        "ConsumerProducts.CleaningRobot.Status.LastSelectedMap",
        "lastSelectedMap",
    ),
    enumerated(
        "ConsumerProducts.CleaningRobot.Option.CleaningMode",
        "cleaningMode",
    ),
    enumerated(
        "ConsumerProducts.CleaningRobot.Event.EmptyDustBoxAndCleanFilter",
        "emptyDustBox",
    ),
    enumerated(
        "ConsumerProducts.CleaningRobot.Event.RobotIsStuck",
        "robotIsStuck",
    ),
    enumerated(
        "ConsumerProducts.CleaningRobot.Event.DockingStationNotFound",
        "dockingStationNotFound",
    ),
];

const WINE_COOLER: &[AttributeSpec] = &[
    plain(
        "Refrigeration.Common.Setting.WineCompartment.SetpointTemperature",
        "wineCompartmentSetpoint",
    ),
    plain(
        "Refrigeration.Common.Setting.WineCompartment2.SetpointTemperature",
        "wineCompartment2Setpoint",
    ),
    enumerated(
        "Refrigeration.Common.Status.Door.WineCompartment",
        "wineCompartmentDoorState",
    ),
];

/// Type-specific rows, in addition to [`COMMON`].
pub fn rows_for(kind: ApplianceType) -> Vec<&'static [AttributeSpec]> {
    match kind {
        ApplianceType::Dishwasher => vec![DISHWASHER],
        ApplianceType::Washer => vec![WASHER],
        ApplianceType::Dryer => vec![DRYER],
        ApplianceType::WasherDryer => vec![WASHER, DRYER],
        ApplianceType::Oven => vec![OVEN],
        ApplianceType::CoffeeMaker => vec![COFFEE_MAKER],
        ApplianceType::FridgeFreezer => vec![FRIDGE_FREEZER],
        ApplianceType::Hood => vec![HOOD],
        ApplianceType::CleaningRobot => vec![CLEANING_ROBOT],
        ApplianceType::WineCooler => vec![WINE_COOLER],
        ApplianceType::Hob | ApplianceType::CookProcessor => Vec::new(),
    }
}
