//! Panel hardware interface
//!
//! [`PanelInterface`] is the seam between the driving logic and the pins.
//! [`DisplayInterface`] implements it with `embedded-hal` pins: a
//! configuration shift register (data, clock, strobe), the CKV gate clock
//! and a parallel source data bus.
use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};
use embedded_hal::{
    delay::DelayNs,
    digital::{OutputPin, PinState},
};

use crate::ed047tc1::{flag::Flag, LINE_BYTES};

/// Supply enable to negative rail
const POWER_ENABLE_DELAY_US: u32 = 100;
/// Negative rail to positive rail
const NEG_RAIL_DELAY_US: u32 = 500;
/// Positive rail settle
const POS_RAIL_DELAY_US: u32 = 100;
/// Positive rail off to negative rail off
const POS_RAIL_OFF_DELAY_US: u32 = 10;
/// Negative rail off to supply off
const NEG_RAIL_OFF_DELAY_US: u32 = 100;
/// Low phase of the CKV clock after a row
const CKV_LOW_US: u32 = 1;
/// Drive time used to flush no-op data after a driven row
const FLUSH_ROW_US: u32 = 10;

/// Row-level access to the panel.
///
/// A frame is `start_frame`, one `write_row` or `skip_row` per gate line
/// top to bottom, then `end_frame`.
pub trait PanelInterface {
    /// Put the panel into its idle, unpowered configuration
    fn init(&mut self) -> Result<(), DisplayError>;
    /// Bring up the high voltage rails
    fn power_on(&mut self) -> Result<(), DisplayError>;
    /// Take down the high voltage rails
    fn power_off(&mut self) -> Result<(), DisplayError>;
    /// Release every control line, including those kept by `power_off`
    fn power_off_all(&mut self) -> Result<(), DisplayError>;
    /// Select the first gate line
    fn start_frame(&mut self) -> Result<(), DisplayError>;
    /// Drive the current line with `row` for `time_us` and move to the next.
    ///
    /// `row` holds [`LINE_BYTES`] bytes of drive codes.
    fn write_row(&mut self, row: &[u8], time_us: u32) -> Result<(), DisplayError>;
    /// Move to the next line without driving it
    fn skip_row(&mut self) -> Result<(), DisplayError>;
    /// Release the gate after the last line
    fn end_frame(&mut self) -> Result<(), DisplayError>;
}

/// `embedded-hal` implementation of [`PanelInterface`]
pub struct DisplayInterface<BUS, DATA, CLK, STR, CKV, DELAY> {
    /// Parallel source data bus, one byte per four pixels
    bus: BUS,
    /// Config shift register serial data
    cfg_data: DATA,
    /// Config shift register clock
    cfg_clk: CLK,
    /// Config shift register strobe
    cfg_str: STR,
    /// Gate clock, one pulse per line
    ckv: CKV,
    delay: DELAY,
    /// Last value pushed to the config register
    config: u8,
    /// Source latches still hold driven data
    dirty: bool,
}

impl<BUS, DATA, CLK, STR, CKV, DELAY> DisplayInterface<BUS, DATA, CLK, STR, CKV, DELAY> {
    /// Create the interface. Nothing is sent before [`PanelInterface::init`].
    pub fn new(bus: BUS, cfg_data: DATA, cfg_clk: CLK, cfg_str: STR, ckv: CKV, delay: DELAY) -> Self {
        DisplayInterface {
            bus,
            cfg_data,
            cfg_clk,
            cfg_str,
            ckv,
            delay,
            config: 0,
            dirty: false,
        }
    }

    /// Give the pins back
    pub fn release(self) -> (BUS, DATA, CLK, STR, CKV, DELAY) {
        (self.bus, self.cfg_data, self.cfg_clk, self.cfg_str, self.ckv, self.delay)
    }
}

impl<BUS, DATA, CLK, STR, CKV, DELAY> DisplayInterface<BUS, DATA, CLK, STR, CKV, DELAY>
where
    BUS: WriteOnlyDataCommand,
    DATA: OutputPin,
    CLK: OutputPin,
    STR: OutputPin,
    CKV: OutputPin,
    DELAY: DelayNs,
{
    /// Shift `config` into the register and strobe it.
    fn push_config(&mut self, config: u8) -> Result<(), DisplayError> {
        self.cfg_str.set_low().map_err(|_| DisplayError::BusWriteError)?;
        for bit in (0..8).rev() {
            self.cfg_clk.set_low().map_err(|_| DisplayError::BusWriteError)?;
            self.cfg_data
                .set_state(PinState::from(config & (1 << bit) != 0))
                .map_err(|_| DisplayError::BusWriteError)?;
            self.cfg_clk.set_high().map_err(|_| DisplayError::BusWriteError)?;
        }
        self.cfg_str.set_high().map_err(|_| DisplayError::BusWriteError)?;
        self.config = config;
        Ok(())
    }

    fn set_flags(&mut self, flags: u8) -> Result<(), DisplayError> {
        self.push_config(self.config | flags)
    }

    fn clear_flags(&mut self, flags: u8) -> Result<(), DisplayError> {
        self.push_config(self.config & !flags)
    }

    /// One gate clock pulse
    fn pulse_ckv(&mut self, high_us: u32, low_us: u32) -> Result<(), DisplayError> {
        self.ckv.set_high().map_err(|_| DisplayError::BusWriteError)?;
        if high_us > 0 {
            self.delay.delay_us(high_us);
        }
        self.ckv.set_low().map_err(|_| DisplayError::BusWriteError)?;
        if low_us > 0 {
            self.delay.delay_us(low_us);
        }
        Ok(())
    }

    /// Move shifted source data to the outputs
    fn latch_row(&mut self) -> Result<(), DisplayError> {
        self.set_flags(Flag::LATCH_ENABLE)?;
        self.clear_flags(Flag::LATCH_ENABLE)
    }

    fn output_row(&mut self, row: &[u8], time_us: u32) -> Result<(), DisplayError> {
        self.bus.send_data(DataFormat::U8(row))?;
        self.latch_row()?;
        self.pulse_ckv(time_us, CKV_LOW_US)
    }
}

impl<BUS, DATA, CLK, STR, CKV, DELAY> PanelInterface for DisplayInterface<BUS, DATA, CLK, STR, CKV, DELAY>
where
    BUS: WriteOnlyDataCommand,
    DATA: OutputPin,
    CLK: OutputPin,
    STR: OutputPin,
    CKV: OutputPin,
    DELAY: DelayNs,
{
    fn init(&mut self) -> Result<(), DisplayError> {
        log::info!("Initializing ED047TC1 panel interface");
        self.ckv.set_low().map_err(|_| DisplayError::BusWriteError)?;
        self.dirty = false;
        self.push_config(Flag::INIT)
    }

    fn power_on(&mut self) -> Result<(), DisplayError> {
        let config = (self.config | Flag::SCAN_DIRECTION) & !Flag::POWER_DISABLE;
        self.push_config(config)?;
        self.delay.delay_us(POWER_ENABLE_DELAY_US);
        self.set_flags(Flag::NEG_POWER_ENABLE)?;
        self.delay.delay_us(NEG_RAIL_DELAY_US);
        self.set_flags(Flag::POS_POWER_ENABLE)?;
        self.delay.delay_us(POS_RAIL_DELAY_US);
        self.set_flags(Flag::STV)
    }

    fn power_off(&mut self) -> Result<(), DisplayError> {
        self.clear_flags(Flag::POS_POWER_ENABLE)?;
        self.delay.delay_us(POS_RAIL_OFF_DELAY_US);
        self.clear_flags(Flag::NEG_POWER_ENABLE)?;
        self.delay.delay_us(NEG_RAIL_OFF_DELAY_US);
        self.set_flags(Flag::POWER_DISABLE)?;
        self.clear_flags(Flag::STV)
    }

    fn power_off_all(&mut self) -> Result<(), DisplayError> {
        self.push_config(0)?;
        self.ckv.set_low().map_err(|_| DisplayError::BusWriteError)
    }

    fn start_frame(&mut self) -> Result<(), DisplayError> {
        self.set_flags(Flag::MODE)?;
        self.pulse_ckv(1, 1)?;

        // Start pulse: STV low across one CKV clock
        self.clear_flags(Flag::STV)?;
        self.delay.delay_us(1);
        self.pulse_ckv(10, 10)?;
        self.set_flags(Flag::STV)?;
        self.pulse_ckv(0, 10)?;

        self.set_flags(Flag::OUTPUT_ENABLE)?;
        self.pulse_ckv(1, 1)
    }

    fn write_row(&mut self, row: &[u8], time_us: u32) -> Result<(), DisplayError> {
        if row.len() != LINE_BYTES {
            return Err(DisplayError::OutOfBoundsError);
        }
        self.output_row(row, time_us)?;
        self.dirty = true;
        Ok(())
    }

    fn skip_row(&mut self) -> Result<(), DisplayError> {
        if self.dirty {
            // The latches still hold the last driven row
            self.output_row(&[0; LINE_BYTES], FLUSH_ROW_US)?;
            self.dirty = false;
            return Ok(());
        }
        self.pulse_ckv(0, CKV_LOW_US)
    }

    fn end_frame(&mut self) -> Result<(), DisplayError> {
        self.clear_flags(Flag::OUTPUT_ENABLE)?;
        self.clear_flags(Flag::MODE)?;
        self.pulse_ckv(1, 1)?;
        self.pulse_ckv(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{rc::Rc, vec::Vec};
    use core::{cell::RefCell, convert::Infallible};
    use embedded_hal::digital::ErrorType;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Line {
        Data,
        Clk,
        Str,
        Ckv,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Pin(Line, bool),
        DelayNs(u32),
        Bus(Vec<u8>),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct MockPin {
        line: Line,
        log: Log,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Event::Pin(self.line, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Event::Pin(self.line, true));
            Ok(())
        }
    }

    struct MockDelay(Log);

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(Event::DelayNs(ns));
        }
    }

    struct MockBus(Log);

    impl WriteOnlyDataCommand for MockBus {
        fn send_commands(&mut self, _cmd: DataFormat<'_>) -> Result<(), DisplayError> {
            Err(DisplayError::DataFormatNotImplemented)
        }

        fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
            match buf {
                DataFormat::U8(data) => {
                    self.0.borrow_mut().push(Event::Bus(data.to_vec()));
                    Ok(())
                }
                _ => Err(DisplayError::DataFormatNotImplemented),
            }
        }
    }

    fn mock_interface(
    ) -> (DisplayInterface<MockBus, MockPin, MockPin, MockPin, MockPin, MockDelay>, Log) {
        let log: Log = Rc::default();
        let pin = |line| MockPin {
            line,
            log: log.clone(),
        };
        let interface = DisplayInterface::new(
            MockBus(log.clone()),
            pin(Line::Data),
            pin(Line::Clk),
            pin(Line::Str),
            pin(Line::Ckv),
            MockDelay(log.clone()),
        );
        (interface, log)
    }

    /// Replay the log through a model of the shift register, returning
    /// every value latched by the strobe.
    fn latched_configs(log: &Log) -> Vec<u8> {
        let mut data = false;
        let mut shift = 0u8;
        let mut latched = Vec::new();
        for event in log.borrow().iter() {
            match event {
                Event::Pin(Line::Data, level) => data = *level,
                Event::Pin(Line::Clk, true) => shift = shift << 1 | u8::from(data),
                Event::Pin(Line::Str, true) => latched.push(shift),
                _ => {}
            }
        }
        latched
    }

    #[test]
    fn test_init_and_power_sequence() {
        let (mut interface, log) = mock_interface();
        interface.init().unwrap();
        assert_eq!(latched_configs(&log), vec![Flag::INIT]);

        log.borrow_mut().clear();
        interface.power_on().unwrap();
        let on = Flag::STV | Flag::SCAN_DIRECTION;
        assert_eq!(
            latched_configs(&log),
            vec![
                on,
                on | Flag::NEG_POWER_ENABLE,
                on | Flag::NEG_POWER_ENABLE | Flag::POS_POWER_ENABLE,
                on | Flag::NEG_POWER_ENABLE | Flag::POS_POWER_ENABLE,
            ]
        );
        let delays: Vec<u32> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::DelayNs(ns) => Some(*ns),
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![100_000, 500_000, 100_000]);

        log.borrow_mut().clear();
        interface.power_off().unwrap();
        assert_eq!(
            latched_configs(&log),
            vec![
                on | Flag::NEG_POWER_ENABLE,
                on,
                on | Flag::POWER_DISABLE,
                Flag::SCAN_DIRECTION | Flag::POWER_DISABLE,
            ]
        );

        log.borrow_mut().clear();
        interface.power_off_all().unwrap();
        assert_eq!(latched_configs(&log), vec![0]);
    }

    #[test]
    fn test_write_row_sends_latches_and_clocks() {
        let (mut interface, log) = mock_interface();
        interface.init().unwrap();
        log.borrow_mut().clear();

        let row = [0x55; LINE_BYTES];
        interface.write_row(&row, 40).unwrap();
        let events = log.borrow();
        assert_eq!(events[0], Event::Bus(row.to_vec()));
        let latch_on = Flag::INIT | Flag::LATCH_ENABLE;
        assert_eq!(latched_configs(&log), vec![latch_on, Flag::INIT]);
        let tail = &events[events.len() - 4..];
        assert_eq!(
            tail,
            &[
                Event::Pin(Line::Ckv, true),
                Event::DelayNs(40_000),
                Event::Pin(Line::Ckv, false),
                Event::DelayNs(1_000),
            ]
        );
    }

    #[test]
    fn test_skip_after_write_flushes_latches() {
        let (mut interface, log) = mock_interface();
        interface.init().unwrap();
        interface.write_row(&[0xAA; LINE_BYTES], 10).unwrap();
        log.borrow_mut().clear();

        interface.skip_row().unwrap();
        assert_eq!(log.borrow()[0], Event::Bus(vec![0; LINE_BYTES]));

        log.borrow_mut().clear();
        interface.skip_row().unwrap();
        assert!(!log.borrow().iter().any(|e| matches!(e, Event::Bus(_))));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let (mut interface, _log) = mock_interface();
        assert!(matches!(
            interface.write_row(&[0; 3], 10),
            Err(DisplayError::OutOfBoundsError)
        ));
    }

    #[test]
    fn test_frame_enables_and_releases_output() {
        let (mut interface, log) = mock_interface();
        interface.init().unwrap();
        log.borrow_mut().clear();
        interface.start_frame().unwrap();
        let started = *latched_configs(&log).last().unwrap();
        let driving = Flag::OUTPUT_ENABLE | Flag::MODE | Flag::STV;
        assert_eq!(started & driving, driving);

        log.borrow_mut().clear();
        interface.end_frame().unwrap();
        assert_eq!(*latched_configs(&log).last().unwrap(), Flag::INIT);
    }
}
