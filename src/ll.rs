use embedded_hal::i2c::I2c;
use embedded_hal_async::i2c::I2c as AsyncI2c;
use register_access::{AsyncRegisterAccess, RegisterAccess};

/// Fixed 7-bit bus address of the LTC2942.
pub const DEVICE_ADDR: u8 = 0x64;

/// SMBus alert response address. An alerting LTC2942 answers a read here with its own address.
pub const ALERT_RESPONSE_ADDR: u8 = 0x0C;

pub struct Ltc2942I2cInterface<I> {
    pub i2c: I,
}

impl<I> Ltc2942I2cInterface<I>
where
    I: I2c,
{
    pub fn read_alert_response(&mut self) -> Result<u8, I::Error> {
        let mut buffer = [0];
        self.i2c.read(ALERT_RESPONSE_ADDR, &mut buffer)?;
        Ok(buffer[0])
    }
}

impl<I> Ltc2942I2cInterface<I>
where
    I: AsyncI2c,
{
    pub async fn read_alert_response_async(&mut self) -> Result<u8, I::Error> {
        let mut buffer = [0];
        self.i2c.read(ALERT_RESPONSE_ADDR, &mut buffer).await?;
        Ok(buffer[0])
    }
}

impl<I> RegisterAccess<u8> for Ltc2942I2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_raw(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0];
        self.i2c.write_read(DEVICE_ADDR, &[address], &mut buffer)?;
        Ok(buffer[0])
    }

    fn write_raw(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(DEVICE_ADDR, &[address, value])
    }
}

impl<I> AsyncRegisterAccess<u8> for Ltc2942I2cInterface<I>
where
    I: AsyncI2c,
{
    type Error = I::Error;

    async fn read_raw_async(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0];
        self.i2c
            .write_read(DEVICE_ADDR, &[address], &mut buffer)
            .await?;
        Ok(buffer[0])
    }

    async fn write_raw_async(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(DEVICE_ADDR, &[address, value]).await
    }
}
