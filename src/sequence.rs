//! Bookkeeping for the operations that need more than one bus access.
//!
//! The blocking and async drivers issue the same transactions in the same order. Both feed each
//! access result through these types, which decide whether the sequence may continue.

use device_descriptor::Proxy;

use crate::{descriptors::Control, Error};

/// How a multi-access operation reacts to a failed bus access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceMode {
    /// Every access is issued even after an earlier one failed, and the first failure is reported
    /// once the sequence is over. A charge write whose control readback failed restores `0x00`.
    #[default]
    Legacy,

    /// The sequence stops at the first failed access. Nothing after it reaches the bus.
    Strict,
}

/// The accesses of a charge accumulator write, in bus order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeWriteStep {
    ReadControl,
    EnterShutdown,
    WriteMsb,
    WriteLsb,
    RestoreControl,
}

/// Collects the two halves of a big-endian register pair.
pub(crate) struct PairedRead<E> {
    mode: SequenceMode,
    bytes: [u8; 2],
    error: Option<E>,
}

impl<E> PairedRead<E> {
    pub(crate) fn new(mode: SequenceMode) -> Self {
        Self {
            mode,
            bytes: [0; 2],
            error: None,
        }
    }

    pub(crate) fn msb(&mut self, result: Result<u8, E>) -> Result<(), Error<E>> {
        self.record(0, result)
    }

    pub(crate) fn lsb(&mut self, result: Result<u8, E>) -> Result<(), Error<E>> {
        self.record(1, result)
    }

    fn record(&mut self, index: usize, result: Result<u8, E>) -> Result<(), Error<E>> {
        match result {
            Ok(byte) => {
                self.bytes[index] = byte;
                Ok(())
            }
            Err(error) if self.mode == SequenceMode::Strict => Err(Error::Transfer(error)),
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(error);
                }
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self) -> Result<u16, Error<E>> {
        let raw = u16::from_be_bytes(self.bytes);

        match self.error {
            None => Ok(raw),
            Some(error) => {
                warn!("Paired register read incomplete, partial value {:#x}", raw);
                Err(Error::PartialMeasurement { raw, error })
            }
        }
    }
}

/// Tracks a charge accumulator write and whether the chip may be left shut down.
pub(crate) struct ChargeWrite<E> {
    mode: SequenceMode,
    control: Option<u8>,
    shutdown_pending: bool,
    failure: Option<(ChargeWriteStep, E)>,
}

impl<E> ChargeWrite<E> {
    pub(crate) fn new(mode: SequenceMode) -> Self {
        Self {
            mode,
            control: None,
            shutdown_pending: false,
            failure: None,
        }
    }

    /// Returns the control value to restore at the end of the sequence.
    pub(crate) fn saved_control(
        &mut self,
        result: Result<Control, E>,
    ) -> Result<Control, Error<E>> {
        match result {
            Ok(control) => {
                self.control = Some(control.bits());
                Ok(control)
            }
            Err(error) => {
                self.fail(ChargeWriteStep::ReadControl, error)?;
                Ok(Control::from_bits(0))
            }
        }
    }

    pub(crate) fn step(
        &mut self,
        step: ChargeWriteStep,
        result: Result<(), E>,
    ) -> Result<(), Error<E>> {
        match result {
            Ok(()) => {
                match step {
                    ChargeWriteStep::EnterShutdown => self.shutdown_pending = true,
                    ChargeWriteStep::RestoreControl => self.shutdown_pending = false,
                    _ => {}
                }
                Ok(())
            }
            Err(error) => self.fail(step, error),
        }
    }

    fn fail(&mut self, step: ChargeWriteStep, error: E) -> Result<(), Error<E>> {
        warn!(
            "Charge write step {:?} failed, shutdown pending: {}",
            step,
            self.shutdown_pending
        );

        if self.mode == SequenceMode::Strict {
            return Err(Error::ChargeWrite {
                step,
                control: self.control,
                shutdown_pending: self.shutdown_pending,
                error,
            });
        }

        if self.failure.is_none() {
            self.failure = Some((step, error));
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<(), Error<E>> {
        match self.failure {
            None => Ok(()),
            Some((step, error)) => Err(Error::ChargeWrite {
                step,
                control: self.control,
                shutdown_pending: self.shutdown_pending,
                error,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pair_is_assembled_big_endian() {
        let mut read = PairedRead::<()>::new(SequenceMode::Legacy);
        read.msb(Ok(0x12)).unwrap();
        read.lsb(Ok(0x34)).unwrap();

        assert_eq!(read.finish(), Ok(0x1234));
    }

    #[test]
    fn legacy_pair_keeps_the_half_that_was_read() {
        let mut read = PairedRead::new(SequenceMode::Legacy);
        read.msb(Ok(0x12)).unwrap();
        read.lsb(Err("lsb")).unwrap();

        assert_eq!(
            read.finish(),
            Err(Error::PartialMeasurement {
                raw: 0x1200,
                error: "lsb"
            })
        );

        let mut read = PairedRead::new(SequenceMode::Legacy);
        read.msb(Err("msb")).unwrap();
        read.lsb(Err("lsb")).unwrap();

        assert_eq!(
            read.finish(),
            Err(Error::PartialMeasurement {
                raw: 0x0000,
                error: "msb"
            })
        );
    }

    #[test]
    fn strict_pair_stops_at_first_failure() {
        let mut read = PairedRead::<&str>::new(SequenceMode::Strict);

        assert_eq!(read.msb(Err("msb")), Err(Error::Transfer("msb")));
    }

    #[test]
    fn legacy_charge_write_reports_first_failure_after_all_steps() {
        let mut write = ChargeWrite::new(SequenceMode::Legacy);

        let control = write.saved_control(Ok(Control::from_bits(0xD0))).unwrap();
        assert_eq!(control.bits(), 0xD0);
        write.step(ChargeWriteStep::EnterShutdown, Ok(())).unwrap();
        write.step(ChargeWriteStep::WriteMsb, Err(1)).unwrap();
        write.step(ChargeWriteStep::WriteLsb, Err(2)).unwrap();
        write.step(ChargeWriteStep::RestoreControl, Ok(())).unwrap();

        assert_eq!(
            write.finish(),
            Err(Error::ChargeWrite {
                step: ChargeWriteStep::WriteMsb,
                control: Some(0xD0),
                shutdown_pending: false,
                error: 1
            })
        );
    }

    #[test]
    fn legacy_charge_write_falls_back_to_zero_control() {
        let mut write = ChargeWrite::new(SequenceMode::Legacy);

        let control = write.saved_control(Err(())).unwrap();
        assert_eq!(control.bits(), 0x00);
    }

    #[test]
    fn failed_restore_leaves_shutdown_pending() {
        let mut write = ChargeWrite::new(SequenceMode::Legacy);

        write.saved_control(Ok(Control::from_bits(0xC0))).unwrap();
        write.step(ChargeWriteStep::EnterShutdown, Ok(())).unwrap();
        write.step(ChargeWriteStep::WriteMsb, Ok(())).unwrap();
        write.step(ChargeWriteStep::WriteLsb, Ok(())).unwrap();
        write.step(ChargeWriteStep::RestoreControl, Err(())).unwrap();

        assert_eq!(
            write.finish(),
            Err(Error::ChargeWrite {
                step: ChargeWriteStep::RestoreControl,
                control: Some(0xC0),
                shutdown_pending: true,
                error: ()
            })
        );
    }

    #[test]
    fn strict_charge_write_aborts_with_shutdown_state() {
        let mut write = ChargeWrite::new(SequenceMode::Strict);

        write.saved_control(Ok(Control::from_bits(0xC0))).unwrap();
        write.step(ChargeWriteStep::EnterShutdown, Ok(())).unwrap();

        assert_eq!(
            write.step(ChargeWriteStep::WriteMsb, Err(())),
            Err(Error::ChargeWrite {
                step: ChargeWriteStep::WriteMsb,
                control: Some(0xC0),
                shutdown_pending: true,
                error: ()
            })
        );
    }

    #[test]
    fn strict_charge_write_aborts_when_control_is_unreadable() {
        let mut write = ChargeWrite::new(SequenceMode::Strict);

        assert_eq!(
            write.saved_control(Err(())).map(|control| control.bits()),
            Err(Error::ChargeWrite {
                step: ChargeWriteStep::ReadControl,
                control: None,
                shutdown_pending: false,
                error: ()
            })
        );
    }
}
