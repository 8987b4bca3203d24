//! Scale factors for the raw codes returned by the driver.
//!
//! The driver never applies these. They are integer-only so that callers on targets without an
//! FPU can convert without pulling in float support.

use crate::descriptors::Prescaler;

/// Accumulated charge per LSB in µAh, for M = 128 and a 50 mΩ sense resistor.
pub const CHARGE_UAH_PER_LSB: u32 = 85;
/// Sense resistor the charge LSB is specified for, in mΩ.
pub const CHARGE_LSB_R_SENSE_MOHM: u32 = 50;

/// Voltage ADC full scale in mV.
pub const VOLTAGE_FULL_SCALE_MV: u32 = 6_000;
/// One step of the 14 bit voltage ADC in nV (366.2 µV). The result is left aligned in the 16
/// bit register pair.
pub const VOLTAGE_STEP_NV: u32 = 366_200;

/// Temperature ADC full scale in K.
pub const TEMPERATURE_FULL_SCALE_K: u32 = 600;
/// One step of the 10 bit temperature ADC in mK (0.586 K).
pub const TEMPERATURE_STEP_MK: u32 = 586;

/// Converts an accumulated charge code to µAh.
///
/// `r_sense_mohm` must not be zero.
///
/// ```rust
/// # use ltc2942::{units::raw_charge_to_uah, Prescaler};
/// assert_eq!(raw_charge_to_uah(1, Prescaler::M128, 50), 85);
/// assert_eq!(raw_charge_to_uah(1000, Prescaler::M128, 50), 85_000);
/// assert_eq!(raw_charge_to_uah(1000, Prescaler::M4, 50), 2_656);
/// assert_eq!(raw_charge_to_uah(1000, Prescaler::M128, 100), 42_500);
/// ```
#[inline]
pub fn raw_charge_to_uah(raw: u16, prescaler: Prescaler, r_sense_mohm: u32) -> u32 {
    let numerator = raw as u64
        * CHARGE_UAH_PER_LSB as u64
        * CHARGE_LSB_R_SENSE_MOHM as u64
        * prescaler.factor() as u64;

    (numerator / (128 * r_sense_mohm as u64)) as u32
}

/// Converts a voltage code to mV.
///
/// Divides by 65536 instead of 65535, the error stays far below one ADC step.
///
/// ```rust
/// # use ltc2942::units::raw_voltage_to_mv;
/// assert_eq!(raw_voltage_to_mv(0), 0);
/// assert_eq!(raw_voltage_to_mv(0x8000), 3_000);
/// assert_eq!(raw_voltage_to_mv(0xFFFF), 5_999);
/// ```
#[inline]
pub fn raw_voltage_to_mv(raw: u16) -> u16 {
    ((raw as u32 * VOLTAGE_FULL_SCALE_MV) >> 16) as u16
}

/// Converts a temperature code to hundredths of a degree Celsius.
///
/// ```rust
/// # use ltc2942::units::raw_temperature_to_centi_celsius;
/// assert_eq!(raw_temperature_to_centi_celsius(0), -27_315);
/// assert_eq!(raw_temperature_to_centi_celsius(0x8000), 2_685);
/// assert_eq!(raw_temperature_to_centi_celsius(0xFFFF), 32_684);
/// ```
#[inline]
pub fn raw_temperature_to_centi_celsius(raw: u16) -> i32 {
    let centi_kelvin = (raw as u32 * TEMPERATURE_FULL_SCALE_K * 100) >> 16;

    centi_kelvin as i32 - 27_315
}
