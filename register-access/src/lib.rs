#![no_std]

//! Transport traits for byte-addressed register maps.
//!
//! An interface only has to provide a single-register read and write. The typed accessors are
//! built on top of them, so each typed access is still exactly one bus transaction.

use device_descriptor::{Proxy, ReadOnlyRegister, Register, RegisterWidthType};

pub trait RegisterAccess<RWT>
where
    RWT: RegisterWidthType,
{
    type Error;

    fn read_raw(&mut self, address: u8) -> Result<RWT, Self::Error>;
    fn write_raw(&mut self, address: u8, value: RWT) -> Result<(), Self::Error>;

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RWT>,
    {
        self.read_raw(R::ADDRESS).map(R::from_bits)
    }

    fn write_register<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RWT>,
    {
        self.write_raw(R::ADDRESS, reg.bits())
    }
}

#[allow(async_fn_in_trait)]
pub trait AsyncRegisterAccess<RWT>
where
    RWT: RegisterWidthType,
{
    type Error;

    async fn read_raw_async(&mut self, address: u8) -> Result<RWT, Self::Error>;
    async fn write_raw_async(&mut self, address: u8, value: RWT) -> Result<(), Self::Error>;

    async fn read_register_async<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RWT>,
    {
        self.read_raw_async(R::ADDRESS).await.map(R::from_bits)
    }

    async fn write_register_async<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RWT>,
    {
        self.write_raw_async(R::ADDRESS, reg.bits()).await
    }
}
