//! Full poll cycle: INA219 registers on a fake bus, through the gauge, to
//! the icon the tray shows.

use std::cell::Cell;
use std::rc::Rc;

use batterytray_sensor::{
    BatterySensor, Calibration, ChargeCurve, Gauge, Ina219, Reading, SensorError, Thresholds,
    register,
};
use batterytray_tray::{IconState, PollState, Presenter};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// Shared view of the fake chip so tests can change readings between ticks.
#[derive(Default)]
struct Chip {
    bus_voltage: Cell<u16>,
    current: Cell<i16>,
    unplugged: Cell<bool>,
    closed: Cell<bool>,
}

impl Chip {
    fn set(&self, volts: f64, amps_counts: i16) {
        self.bus_voltage.set(((volts / 0.004).round() as u16) << 3);
        self.current.set(amps_counts);
    }
}

struct FakeBus {
    chip: Rc<Chip>,
    pointer: u8,
}

impl Drop for FakeBus {
    fn drop(&mut self) {
        self.chip.closed.set(true);
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(&mut self, _address: u8, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if self.chip.unplugged.get() {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in ops {
            match op {
                Operation::Write(bytes) => self.pointer = bytes[0],
                Operation::Read(buf) => {
                    let value = match self.pointer {
                        register::BUS_VOLTAGE => self.chip.bus_voltage.get(),
                        register::CURRENT => self.chip.current.get() as u16,
                        _ => 0,
                    };
                    buf.copy_from_slice(&value.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}

fn presenter(chip: &Rc<Chip>) -> Presenter<Gauge<FakeBus>> {
    let bus = FakeBus {
        chip: Rc::clone(chip),
        pointer: 0,
    };
    let mut ina = Ina219::new(bus, 0x41, Calibration::default());
    ina.init().unwrap();
    Presenter::new(Gauge::new(ina, ChargeCurve::default(), Thresholds::default()))
}

#[test]
fn icon_follows_discharge() {
    let chip = Rc::new(Chip::default());
    let mut presenter = presenter(&chip);

    let mut last_index = usize::MAX;
    for volts in [12.6, 12.0, 11.4, 10.8, 10.2, 9.6] {
        chip.set(volts, -2000);
        let update = presenter.tick().expect("reading");
        let index = update.icon.index();
        assert!(index <= last_index, "icon went up while discharging");
        last_index = index;
    }
    assert_eq!(presenter.displayed(), IconState::Level(1));

    chip.set(9.1, -2000);
    assert_eq!(presenter.tick().unwrap().icon, IconState::Alert);
}

#[test]
fn charging_overrides_level() {
    let chip = Rc::new(Chip::default());
    let mut presenter = presenter(&chip);

    chip.set(9.05, 3000);
    let update = presenter.tick().unwrap();
    assert!(update.reading.critical);
    assert_eq!(update.icon, IconState::Charging);
}

#[test]
fn unplugged_bus_keeps_previous_icon() {
    let chip = Rc::new(Chip::default());
    let mut presenter = presenter(&chip);

    chip.set(11.7, -1000);
    let shown = presenter.tick().unwrap();

    chip.unplugged.set(true);
    assert!(presenter.tick().is_none());
    assert_eq!(presenter.displayed(), shown.icon);
    assert_eq!(presenter.tooltip(), shown.tooltip);
    assert_eq!(presenter.state(), PollState::ErrorSuppressed);

    chip.unplugged.set(false);
    assert!(presenter.tick().is_some());
    assert_eq!(presenter.state(), PollState::Idle);
}

#[test]
fn shutdown_closes_bus() {
    let chip = Rc::new(Chip::default());
    let presenter = presenter(&chip);

    assert!(!chip.closed.get());
    presenter.shutdown();
    assert!(chip.closed.get());
}

struct Flaky {
    reads: u32,
}

impl BatterySensor for Flaky {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.reads += 1;
        if self.reads % 2 == 0 {
            return Err(SensorError::Bus(ErrorKind::Bus));
        }
        Ok(Reading {
            voltage: 12.0,
            current: 0.0,
            percent: 83,
            charging: false,
            critical: false,
        })
    }
}

#[test]
fn boxed_sensor_alternating_failures() {
    let sensor: Box<dyn BatterySensor> = Box::new(Flaky { reads: 0 });
    let mut presenter = Presenter::new(sensor);

    for _ in 0..5 {
        presenter.tick();
        assert_eq!(presenter.displayed(), IconState::Level(5));
    }
}
