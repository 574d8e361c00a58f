// demos/simulate.rs

use quad_stabilization::{
    AnalogInput, AttitudeProvider, AttitudeSample, FlightMode, MotorDriver, PidGains,
    ReceiverInput, SensorBus, StabilizationConfig, StabilizationController, Watchdog,
    YawGainCalibration,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

const IDLE_POWER: f32 = 1000.0;
const MAX_POWER: f32 = 1860.0;

struct ConsoleDiagnostics;

impl log::Log for ConsoleDiagnostics {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static DIAGNOSTICS: ConsoleDiagnostics = ConsoleDiagnostics;

/// Vehicle state shared between the simulated devices and the main loop.
#[derive(Default)]
struct SharedState {
    angles: [f32; 3],
    rates: [f32; 3],
    commands: [f32; 4],
}

struct SimMotors {
    state: Rc<RefCell<SharedState>>,
}

impl MotorDriver<f32> for SimMotors {
    fn init(&mut self) {
        self.idle();
    }

    fn idle(&mut self) {
        self.state.borrow_mut().commands = [IDLE_POWER; 4];
    }

    fn write(&mut self, motor: usize, value: f32) {
        // Saturation to the actuation range happens here, not in the mixer.
        self.state.borrow_mut().commands[motor] = value.clamp(IDLE_POWER, MAX_POWER);
    }

    fn max_power(&self) -> f32 {
        MAX_POWER
    }

    fn max_throttle(&self) -> f32 {
        1500.0
    }
}

struct SimAttitude {
    state: Rc<RefCell<SharedState>>,
}

impl AttitudeProvider<f32> for SimAttitude {
    fn init(&mut self) {}

    fn sample(&mut self, _dt: f32) -> AttitudeSample<f32> {
        let state = self.state.borrow();
        AttitudeSample {
            angles: state.angles,
            rates: state.rates,
        }
    }

    fn filter_coefficient(&self) -> f32 {
        0.98
    }

    fn filter_time_constant(&self, sample_interval: f32) -> f32 {
        self.filter_coefficient() * sample_interval / (1.0 - self.filter_coefficient())
    }
}

struct SimReceiver {
    polls: Cell<usize>,
}

impl ReceiverInput<f32> for SimReceiver {
    fn is_ready(&self) -> bool {
        // Link comes up on the second poll to exercise the retry path.
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        polls > 1
    }

    fn aileron_angle(&self) -> f32 {
        10.0
    }

    fn aileron_rate(&self) -> f32 {
        0.0
    }

    fn elevator_angle(&self) -> f32 {
        -4.0
    }

    fn elevator_rate(&self) -> f32 {
        0.0
    }

    fn rudder_rate(&self) -> f32 {
        0.0
    }
}

struct SimBus;

impl SensorBus for SimBus {
    fn init(&mut self, clock_hz: u32) {
        println!("sensor bus up at {} Hz", clock_hz);
    }
}

struct SimWatchdog;

impl Watchdog for SimWatchdog {
    fn reset(&mut self) {}
}

struct SimDelay;

impl embedded_hal::delay::DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

struct SimAnalog;

impl AnalogInput<f32> for SimAnalog {
    fn read(&mut self, _channel: u8) -> f32 {
        511.0
    }
}

fn main() {
    log::set_logger(&DIAGNOSTICS).expect("no other logger is installed");
    log::set_max_level(log::LevelFilter::Info);

    let mut config = StabilizationConfig::<f32>::new();
    config.angle_position_gains = PidGains::new(2.0, 0.75, 0.0);
    config.angle_rate_gains = PidGains::new(0.18, 0.25, 0.0002);
    config.accro_rate_gains = PidGains::new(0.15, 0.2, 0.0002);
    config.yaw_rate_gains = PidGains::new(0.3, 0.05, 0.00015);
    config.yaw_gain_calibration = Some(YawGainCalibration {
        channel: 0,
        raw_full_scale: 1023.0,
        kp_full_scale: 500.0,
    });
    config.mixing = 0.9;
    config.integral_limit = 25.0;
    config.idle_throttle = IDLE_POWER;
    config.flight_power = MAX_POWER;
    config.flight_throttle_ratio = 0.8;
    config.debug_power_ceiling = 1300.0;

    let state = Rc::new(RefCell::new(SharedState::default()));
    let motors = SimMotors {
        state: state.clone(),
    };
    let attitude = SimAttitude {
        state: state.clone(),
    };
    let receiver = SimReceiver {
        polls: Cell::new(0),
    };

    let mut controller = StabilizationController::new(config, motors, attitude, receiver)
        .expect("simulation configuration should be valid");

    let mut bus = SimBus;
    let mut watchdog = SimWatchdog;
    let mut delay = SimDelay;
    let mut analog = SimAnalog;
    controller.init(&mut bus, &mut watchdog, &mut delay, &mut analog);

    let dt = 0.0025_f32;
    controller.report_angle_parameters(dt);

    println!();
    println!("self-leveling toward roll=10.0, pitch=-4.0 at throttle 1500");
    println!("   t      roll    pitch      ESC0    ESC1    ESC2    ESC3");
    let mut t = 0.0_f32;
    for step in 0..60 {
        controller.tick(FlightMode::Angle, dt, 1500.0);

        // Crude first-order vehicle response to the corrections.
        let (roll, pitch, yaw) = controller.corrections();
        {
            let mut s = state.borrow_mut();
            s.rates = [roll * 3.0, pitch * 3.0, yaw * 3.0];
            s.angles[0] += s.rates[0] * dt;
            s.angles[1] += s.rates[1] * dt;
        }

        if step % 5 == 0 {
            let s = state.borrow();
            println!(
                "{:6.3}  {:7.3}  {:7.3}   {:7.1} {:7.1} {:7.1} {:7.1}",
                t,
                s.angles[0],
                s.angles[1],
                s.commands[0],
                s.commands[1],
                s.commands[2],
                s.commands[3]
            );
        }
        t += dt;
    }

    // Throttle to minimum: the reset discipline idles all four motors.
    controller.tick(FlightMode::Angle, dt, IDLE_POWER);
    println!();
    println!("throttle at idle, motors: {:?}", state.borrow().commands);
}
