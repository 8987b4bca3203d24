#![cfg_attr(not(test), no_std)]

//! # LTC2942 battery gas gauge driver
//!
//! Register-level access to the LTC2942 coulomb counter over I2C: accumulated charge, battery
//! voltage and die temperature as raw 16 bit codes, control register configuration and a
//! shutdown-guarded reset of the charge accumulator.
//!
//! The driver returns raw codes only. The [`units`] module documents the scale factors and has
//! integer helpers for callers that want engineering units.
//!
//! ```no_run
//! use ltc2942::{units, Config, Error, Ltc2942};
//! # use embedded_hal::{delay::DelayNs, i2c::I2c};
//! # fn example<I: I2c, D: DelayNs>(i2c: I, delay: D) -> Result<(), Error<I::Error>> {
//! let mut gauge = Ltc2942::new(i2c, delay, Config::default());
//!
//! if gauge.identify() {
//!     gauge.init()?;
//!     gauge.reset_accumulated_charge()?;
//!
//!     let voltage_mv = units::raw_voltage_to_mv(gauge.read_voltage()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every register access is followed by a settling delay, and multi-access operations follow the
//! [`SequenceMode`] selected in [`Config`]. The driver does no locking: share the bus through
//! something like `embedded-hal-bus` if other devices live on it.

#[macro_use]
extern crate logger;

use device_descriptor::{Proxy, ReadOnlyRegister, Register};
use embedded_hal::{delay::DelayNs, i2c::I2c};
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, i2c::I2c as AsyncI2c};
use register_access::{AsyncRegisterAccess, RegisterAccess};

mod descriptors;
#[cfg(test)]
mod fake;
pub mod ll;
mod sequence;
pub mod units;

pub use descriptors::*;
pub use sequence::{ChargeWriteStep, SequenceMode};

use sequence::{ChargeWrite, PairedRead};

/// Default pause after each register access, in µs.
pub const SETTLING_TIME_US: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A bus transaction failed.
    Transfer(E),

    /// One half of a register pair could not be read. `raw` holds the half that was read, the
    /// other byte is zero. Only reported in [`SequenceMode::Legacy`].
    PartialMeasurement { raw: u16, error: E },

    /// A charge accumulator write did not complete. `control` is the control value read at the
    /// start, if that read succeeded. When `shutdown_pending` is set the shutdown bit was written
    /// but the saved control value was not written back.
    ChargeWrite {
        step: ChargeWriteStep,
        control: Option<u8>,
        shutdown_pending: bool,
        error: E,
    },
}

impl<E> Error<E> {
    /// The bus error that caused this failure.
    pub fn bus_error(&self) -> &E {
        match self {
            Error::Transfer(error)
            | Error::PartialMeasurement { error, .. }
            | Error::ChargeWrite { error, .. } => error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Control value written by [`Ltc2942::init`].
    pub control: Control,
    pub sequence: SequenceMode,
    pub settling_time_us: u32,
}

impl Default for Config {
    /// Automatic conversions, prescaler M = 4, ALCC pin disabled, legacy sequencing.
    fn default() -> Self {
        Self {
            control: Control::new(|w| {
                w.adc_mode()
                    .write(AdcMode::Automatic)
                    .prescaler()
                    .write(Prescaler::M4)
                    .alcc()
                    .write(AlccConfig::Disabled)
            }),
            sequence: SequenceMode::Legacy,
            settling_time_us: SETTLING_TIME_US,
        }
    }
}

pub struct Ltc2942<I, D> {
    iface: ll::Ltc2942I2cInterface<I>,
    delay: D,
    config: Config,
}

impl<I, D> Ltc2942<I, D> {
    pub const fn new(i2c: I, delay: D, config: Config) -> Self {
        Self {
            iface: ll::Ltc2942I2cInterface { i2c },
            delay,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.iface.i2c
    }

    pub fn release(self) -> (I, D) {
        (self.iface.i2c, self.delay)
    }
}

impl<I, D> Ltc2942<I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn settle(&mut self) {
        self.delay.delay_us(self.config.settling_time_us);
    }

    fn read_settled<R>(&mut self) -> Result<R, I::Error>
    where
        R: ReadOnlyRegister<u8>,
    {
        let result = self.iface.read_register::<R>();
        self.settle();

        if let Ok(reg) = &result {
            trace!("Read {}: {:#x}", R::NAME, reg.bits());
        }
        result
    }

    fn write_settled<R>(&mut self, reg: R) -> Result<(), I::Error>
    where
        R: Register<u8>,
    {
        trace!("Write {}: {:#x}", R::NAME, reg.bits());
        let result = self.iface.write_register(reg);
        self.settle();
        result
    }

    fn read_pair<H, L>(&mut self) -> Result<u16, Error<I::Error>>
    where
        H: ReadOnlyRegister<u8>,
        L: ReadOnlyRegister<u8>,
    {
        let mut pair = PairedRead::new(self.config.sequence);

        pair.msb(self.read_settled::<H>().map(|reg| reg.bits()))?;
        pair.lsb(self.read_settled::<L>().map(|reg| reg.bits()))?;

        pair.finish()
    }

    /// Reads any register by address.
    pub fn read_register(&mut self, address: Address) -> Result<u8, Error<I::Error>> {
        let result = self.iface.read_raw(address.addr());
        self.settle();
        result.map_err(Error::Transfer)
    }

    /// Writes any register by address. Thresholds are configured this way.
    ///
    /// Writes to the charge accumulator bypass the shutdown guard, use
    /// [`Self::write_accumulated_charge`] for those.
    pub fn write_register(&mut self, address: Address, value: u8) -> Result<(), Error<I::Error>> {
        let result = self.iface.write_raw(address.addr(), value);
        self.settle();
        result.map_err(Error::Transfer)
    }

    pub fn read_status(&mut self) -> Result<Status, Error<I::Error>> {
        self.read_settled().map_err(Error::Transfer)
    }

    pub fn read_control(&mut self) -> Result<Control, Error<I::Error>> {
        self.read_settled().map_err(Error::Transfer)
    }

    /// Returns `true` if the status register carries the LTC2942 identification bits.
    ///
    /// A failed read reports `false`.
    pub fn identify(&mut self) -> bool {
        match self.read_status() {
            Ok(status) if status.is_ltc2942() => {
                info!("LTC2942 found");
                true
            }
            Ok(status) => {
                warn!("Unexpected identification bits: {:#x}", status.bits() & DEVICE_ID_MASK);
                false
            }
            Err(_) => {
                warn!("Failed to read status register");
                false
            }
        }
    }

    /// Writes the configured control value. The write is not read back.
    pub fn init(&mut self) -> Result<(), Error<I::Error>> {
        self.configure(self.config.control)?;
        info!("LTC2942 initialized");
        Ok(())
    }

    pub fn configure(&mut self, control: Control) -> Result<(), Error<I::Error>> {
        debug!("Configuring control register: {:#x}", control.bits());
        self.write_settled(control).map_err(Error::Transfer)
    }

    /// Clears the charge accumulator. See [`Self::write_accumulated_charge`].
    pub fn reset_accumulated_charge(&mut self) -> Result<(), Error<I::Error>> {
        self.write_accumulated_charge(0)
    }

    /// Loads the charge accumulator with `raw`.
    ///
    /// The analog section is shut down around the two accumulator writes, then the control
    /// register is restored to the value read at the start.
    pub fn write_accumulated_charge(&mut self, raw: u16) -> Result<(), Error<I::Error>> {
        debug!("Writing accumulated charge: {:#x}", raw);

        let [msb, lsb] = raw.to_be_bytes();
        let mut sequence = ChargeWrite::new(self.config.sequence);

        let saved = sequence.saved_control(self.read_settled::<Control>())?;

        sequence.step(
            ChargeWriteStep::EnterShutdown,
            self.write_settled(saved.with_shutdown()),
        )?;
        sequence.step(
            ChargeWriteStep::WriteMsb,
            self.write_settled(AccumulatedChargeMsb::from_bits(msb)),
        )?;
        sequence.step(
            ChargeWriteStep::WriteLsb,
            self.write_settled(AccumulatedChargeLsb::from_bits(lsb)),
        )?;
        sequence.step(ChargeWriteStep::RestoreControl, self.write_settled(saved))?;

        sequence.finish()
    }

    /// Raw battery voltage code, 6 V full scale.
    pub fn read_voltage(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair::<VoltageMsb, VoltageLsb>()
    }

    /// Raw temperature code, 600 K full scale.
    pub fn read_temperature(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair::<TemperatureMsb, TemperatureLsb>()
    }

    /// Raw accumulated charge code.
    pub fn read_accumulated_charge(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair::<AccumulatedChargeMsb, AccumulatedChargeLsb>()
    }

    /// Runs the SMBus alert response protocol.
    ///
    /// Returns `true` if the LTC2942 was the device that answered. When no device is alerting
    /// the read is not acknowledged and surfaces as [`Error::Transfer`].
    pub fn acknowledge_alert(&mut self) -> Result<bool, Error<I::Error>> {
        let response = self.iface.read_alert_response();
        self.settle();
        response
            .map(|address| address == ll::DEVICE_ADDR << 1)
            .map_err(Error::Transfer)
    }
}

impl<I, D> Ltc2942<I, D>
where
    I: AsyncI2c,
    D: AsyncDelayNs,
{
    async fn settle_async(&mut self) {
        self.delay.delay_us(self.config.settling_time_us).await;
    }

    async fn read_settled_async<R>(&mut self) -> Result<R, I::Error>
    where
        R: ReadOnlyRegister<u8>,
    {
        let result = self.iface.read_register_async::<R>().await;
        self.settle_async().await;

        if let Ok(reg) = &result {
            trace!("Read {}: {:#x}", R::NAME, reg.bits());
        }
        result
    }

    async fn write_settled_async<R>(&mut self, reg: R) -> Result<(), I::Error>
    where
        R: Register<u8>,
    {
        trace!("Write {}: {:#x}", R::NAME, reg.bits());
        let result = self.iface.write_register_async(reg).await;
        self.settle_async().await;
        result
    }

    async fn read_pair_async<H, L>(&mut self) -> Result<u16, Error<I::Error>>
    where
        H: ReadOnlyRegister<u8>,
        L: ReadOnlyRegister<u8>,
    {
        let mut pair = PairedRead::new(self.config.sequence);

        let msb = self.read_settled_async::<H>().await;
        pair.msb(msb.map(|reg| reg.bits()))?;
        let lsb = self.read_settled_async::<L>().await;
        pair.lsb(lsb.map(|reg| reg.bits()))?;

        pair.finish()
    }

    pub async fn read_register_async(&mut self, address: Address) -> Result<u8, Error<I::Error>> {
        let result = self.iface.read_raw_async(address.addr()).await;
        self.settle_async().await;
        result.map_err(Error::Transfer)
    }

    pub async fn write_register_async(
        &mut self,
        address: Address,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        let result = self.iface.write_raw_async(address.addr(), value).await;
        self.settle_async().await;
        result.map_err(Error::Transfer)
    }

    pub async fn read_status_async(&mut self) -> Result<Status, Error<I::Error>> {
        self.read_settled_async().await.map_err(Error::Transfer)
    }

    pub async fn read_control_async(&mut self) -> Result<Control, Error<I::Error>> {
        self.read_settled_async().await.map_err(Error::Transfer)
    }

    pub async fn identify_async(&mut self) -> bool {
        match self.read_status_async().await {
            Ok(status) if status.is_ltc2942() => {
                info!("LTC2942 found");
                true
            }
            Ok(status) => {
                warn!("Unexpected identification bits: {:#x}", status.bits() & DEVICE_ID_MASK);
                false
            }
            Err(_) => {
                warn!("Failed to read status register");
                false
            }
        }
    }

    pub async fn init_async(&mut self) -> Result<(), Error<I::Error>> {
        self.configure_async(self.config.control).await?;
        info!("LTC2942 initialized");
        Ok(())
    }

    pub async fn configure_async(&mut self, control: Control) -> Result<(), Error<I::Error>> {
        debug!("Configuring control register: {:#x}", control.bits());
        self.write_settled_async(control)
            .await
            .map_err(Error::Transfer)
    }

    pub async fn reset_accumulated_charge_async(&mut self) -> Result<(), Error<I::Error>> {
        self.write_accumulated_charge_async(0).await
    }

    pub async fn write_accumulated_charge_async(
        &mut self,
        raw: u16,
    ) -> Result<(), Error<I::Error>> {
        debug!("Writing accumulated charge: {:#x}", raw);

        let [msb, lsb] = raw.to_be_bytes();
        let mut sequence = ChargeWrite::new(self.config.sequence);

        let control = self.read_settled_async::<Control>().await;
        let saved = sequence.saved_control(control)?;

        let result = self.write_settled_async(saved.with_shutdown()).await;
        sequence.step(ChargeWriteStep::EnterShutdown, result)?;

        let result = self
            .write_settled_async(AccumulatedChargeMsb::from_bits(msb))
            .await;
        sequence.step(ChargeWriteStep::WriteMsb, result)?;

        let result = self
            .write_settled_async(AccumulatedChargeLsb::from_bits(lsb))
            .await;
        sequence.step(ChargeWriteStep::WriteLsb, result)?;

        let result = self.write_settled_async(saved).await;
        sequence.step(ChargeWriteStep::RestoreControl, result)?;

        sequence.finish()
    }

    pub async fn read_voltage_async(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair_async::<VoltageMsb, VoltageLsb>().await
    }

    pub async fn read_temperature_async(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair_async::<TemperatureMsb, TemperatureLsb>()
            .await
    }

    pub async fn read_accumulated_charge_async(&mut self) -> Result<u16, Error<I::Error>> {
        self.read_pair_async::<AccumulatedChargeMsb, AccumulatedChargeLsb>()
            .await
    }

    pub async fn acknowledge_alert_async(&mut self) -> Result<bool, Error<I::Error>> {
        let response = self.iface.read_alert_response_async().await;
        self.settle_async().await;
        response
            .map(|address| address == ll::DEVICE_ADDR << 1)
            .map_err(Error::Transfer)
    }
}
