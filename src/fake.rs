//! A register-array model of the chip for driver tests.

use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation},
};

use crate::ll::{ALERT_RESPONSE_ADDR, DEVICE_ADDR};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Read(u8),
    Write(u8, u8),
    AlertResponse,
    Delay,
}

#[derive(Default)]
struct State {
    registers: [u8; 16],
    events: Vec<Event>,
    failing_reads: [bool; 16],
    failing_writes: [bool; 16],
    bus_down: bool,
    alert_pending: bool,
    unguarded_charge_writes: usize,
}

/// Shared handle, clones observe the same chip.
#[derive(Clone, Default)]
pub struct FakeChip {
    state: Rc<RefCell<State>>,
}

impl FakeChip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay {
            state: self.state.clone(),
        }
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.state.borrow_mut().registers[reg as usize] = value;
    }

    pub fn get(&self, reg: u8) -> u8 {
        self.state.borrow().registers[reg as usize]
    }

    pub fn fail_read(&self, reg: u8) {
        self.state.borrow_mut().failing_reads[reg as usize] = true;
    }

    pub fn fail_write(&self, reg: u8) {
        self.state.borrow_mut().failing_writes[reg as usize] = true;
    }

    pub fn disconnect(&self) {
        self.state.borrow_mut().bus_down = true;
    }

    pub fn raise_alert(&self) {
        self.state.borrow_mut().alert_pending = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Register accesses only, delays filtered out.
    pub fn accesses(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| *event != Event::Delay)
            .collect()
    }

    /// Accumulator writes that arrived while the shutdown bit was clear.
    pub fn unguarded_charge_writes(&self) -> usize {
        self.state.borrow().unguarded_charge_writes
    }

    fn access(&mut self, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut state = self.state.borrow_mut();
        let mut pointer = 0usize;

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = reg as usize & 0x0F;

                    if data.is_empty() {
                        state.events.push(Event::Read(reg));
                        if state.failing_reads[pointer] {
                            return Err(ErrorKind::Other);
                        }
                        continue;
                    }

                    for &value in data {
                        state.events.push(Event::Write(pointer as u8, value));
                        if state.failing_writes[pointer] {
                            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                        }
                        if matches!(pointer, 0x02 | 0x03) && state.registers[0x01] & 0x01 == 0 {
                            state.unguarded_charge_writes += 1;
                        }
                        state.registers[pointer] = value;
                        pointer = (pointer + 1) & 0x0F;
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = state.registers[pointer];
                        pointer = (pointer + 1) & 0x0F;
                    }
                }
            }
        }

        Ok(())
    }

    fn alert_response(&mut self, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::AlertResponse);

        if !state.alert_pending {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        state.alert_pending = false;

        for operation in operations {
            if let Operation::Read(buffer) = operation {
                buffer.fill(DEVICE_ADDR << 1);
            }
        }
        Ok(())
    }
}

impl ErrorType for FakeChip {
    type Error = ErrorKind;
}

impl I2c for FakeChip {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.state.borrow().bus_down {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        match address {
            DEVICE_ADDR => self.access(operations),
            ALERT_RESPONSE_ADDR => self.alert_response(operations),
            _ => Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
        }
    }
}

impl embedded_hal_async::i2c::I2c for FakeChip {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        I2c::transaction(self, address, operations)
    }
}

/// Records every delay into the chip's event log.
pub struct FakeDelay {
    state: Rc<RefCell<State>>,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.state.borrow_mut().events.push(Event::Delay);
    }
}

impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        self.state.borrow_mut().events.push(Event::Delay);
    }
}
