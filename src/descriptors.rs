use device_descriptor::*;

/// Top two bits of the status register, the chip identification field.
pub const DEVICE_ID_MASK: u8 = 0xC0;
/// Identification bits reported by an LTC2942.
pub const DEVICE_ID: u8 = 0x00;

device! {
    Status(u8, addr = 0x00) {
        chip_id(pos = 6, width = 2): ChipId {
            Ltc2942 = 0,
            Ltc2941 = 2
        },
        accumulated_charge_overflow(pos = 5, width = 1): Alert {
            Active = 1,
            Inactive = 0
        },
        temperature_alert(pos = 4, width = 1): Alert,
        charge_alert_high(pos = 3, width = 1): Alert,
        charge_alert_low(pos = 2, width = 1): Alert,
        voltage_alert(pos = 1, width = 1): Alert,
        undervoltage_lockout(pos = 0, width = 1): Alert
    }

    Control(u8, addr = 0x01, default = 0x3C) {
        adc_mode(pos = 6, width = 2): AdcMode {
            Automatic = 3,
            ManualVoltage = 2,
            ManualTemperature = 1,
            Sleep = 0
        },
        prescaler(pos = 3, width = 3): Prescaler {
            M1 = 0,
            M2 = 1,
            M4 = 2,
            M8 = 3,
            M16 = 4,
            M32 = 5,
            M64 = 6,
            M128 = 7
        },
        alcc(pos = 1, width = 2): AlccConfig {
            Alert = 2,
            ChargeComplete = 1,
            Disabled = 0
        },
        shutdown(pos = 0, width = 1): Shutdown {
            Active = 1,
            Inactive = 0
        }
    }

    // Writable only while Control.shutdown is active.
    AccumulatedChargeMsb(u8, addr = 0x02, default = 0x7F) {}
    AccumulatedChargeLsb(u8, addr = 0x03, default = 0xFF) {}

    ChargeThresholdHighMsb(u8, addr = 0x04, default = 0xFF) {}
    ChargeThresholdHighLsb(u8, addr = 0x05, default = 0xFF) {}
    ChargeThresholdLowMsb(u8, addr = 0x06, default = 0x00) {}
    ChargeThresholdLowLsb(u8, addr = 0x07, default = 0x00) {}

    VoltageMsb(u8, addr = 0x08) {}
    VoltageLsb(u8, addr = 0x09) {}
    VoltageThresholdHigh(u8, addr = 0x0A, default = 0xFF) {}
    VoltageThresholdLow(u8, addr = 0x0B, default = 0x00) {}

    TemperatureMsb(u8, addr = 0x0C) {}
    TemperatureLsb(u8, addr = 0x0D) {}
    TemperatureThresholdHigh(u8, addr = 0x0E, default = 0xFF) {}
    TemperatureThresholdLow(u8, addr = 0x0F, default = 0x00) {}
}

impl Status {
    /// Compares the identification bits only, the alert flags are ignored.
    #[inline]
    pub fn is_ltc2942(&self) -> bool {
        self.bits() & DEVICE_ID_MASK == DEVICE_ID
    }

    #[inline]
    pub fn any_alert(&self) -> bool {
        self.bits() & !DEVICE_ID_MASK != 0
    }
}

impl Control {
    /// The control value with the analog section shut down, every other field unchanged.
    #[inline]
    pub fn with_shutdown(self) -> Self {
        self.modify(|w| w.shutdown().write(Shutdown::Active))
    }
}

impl Prescaler {
    /// The charge accumulator divider M.
    #[inline]
    pub fn factor(self) -> u8 {
        1 << self as u8
    }
}

/// Address of every byte register in the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    Status = 0x00,
    Control = 0x01,
    AccumulatedChargeMsb = 0x02,
    AccumulatedChargeLsb = 0x03,
    ChargeThresholdHighMsb = 0x04,
    ChargeThresholdHighLsb = 0x05,
    ChargeThresholdLowMsb = 0x06,
    ChargeThresholdLowLsb = 0x07,
    VoltageMsb = 0x08,
    VoltageLsb = 0x09,
    VoltageThresholdHigh = 0x0A,
    VoltageThresholdLow = 0x0B,
    TemperatureMsb = 0x0C,
    TemperatureLsb = 0x0D,
    TemperatureThresholdHigh = 0x0E,
    TemperatureThresholdLow = 0x0F,
}

impl Address {
    pub const ALL: [Address; 16] = [
        Address::Status,
        Address::Control,
        Address::AccumulatedChargeMsb,
        Address::AccumulatedChargeLsb,
        Address::ChargeThresholdHighMsb,
        Address::ChargeThresholdHighLsb,
        Address::ChargeThresholdLowMsb,
        Address::ChargeThresholdLowLsb,
        Address::VoltageMsb,
        Address::VoltageLsb,
        Address::VoltageThresholdHigh,
        Address::VoltageThresholdLow,
        Address::TemperatureMsb,
        Address::TemperatureLsb,
        Address::TemperatureThresholdHigh,
        Address::TemperatureThresholdLow,
    ];

    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Registers the chip updates itself and ignores writes to.
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Address::Status
                | Address::VoltageMsb
                | Address::VoltageLsb
                | Address::TemperatureMsb
                | Address::TemperatureLsb
        )
    }
}

impl TryFrom<u8> for Address {
    type Error = u8;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(addr as usize).copied().ok_or(addr)
    }
}
