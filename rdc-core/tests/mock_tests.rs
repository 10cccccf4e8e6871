use core::cell::RefCell;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_bus::i2c::RefCellDevice;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use pwm_pca9685::{Address as PwmAddress, Pca9685};
use rdc_core::utils::config::ConfigError;
use rdc_core::utils::controllers::drivetrain::{DeviceError, Drivetrain, DrivetrainConfig};
use rdc_core::utils::controllers::DriveActuator;
use rdc_core::utils::math::kinematics::DriveTuning;

/// Default I2C address for the PWM motor controller.
pub const PWM_ADDRESS: u8 = 0x55;

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

/// Config with conditioning disabled so outputs map one to one onto duty.
fn linear_config() -> DrivetrainConfig {
    DrivetrainConfig {
        tuning: DriveTuning {
            deadband: 0.0,
            square_inputs: false,
        },
        ..DrivetrainConfig::default()
    }
}

#[test]
fn test_configure_pwm() {
    // Expected transactions for enabling PWM and setting prescale (includes sleep handling)
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0xFE, 100]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
    ];

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let mut devs = Drivetrain::new(&i2c_bus, &DrivetrainConfig::default()).unwrap();
    devs.init_devices().unwrap();
    devs.configure().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_configure_failure_is_reported() {
    let expectations = [write(PWM_ADDRESS, vec![0x00, 0x01]).with_error(ErrorKind::Other)];

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let mut devs = Drivetrain::new(&i2c_bus, &DrivetrainConfig::default()).unwrap();
    devs.init_devices().unwrap();
    let result = devs.configure();
    assert!(matches!(result, Err(DeviceError::PwmError(_))));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_configure_without_init_fails() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let mut devs = Drivetrain::new(&i2c_bus, &DrivetrainConfig::default()).unwrap();
    assert!(matches!(
        devs.configure(),
        Err(DeviceError::PwmNotInitialized)
    ));
    assert!(matches!(devs.stop(), Err(DeviceError::PwmNotInitialized)));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_invalid_channel_config_is_rejected() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let mut config = DrivetrainConfig::default();
    config.right.enable = 16;
    assert!(matches!(
        Drivetrain::new(&i2c_bus, &config),
        Err(DeviceError::Config(ConfigError::InvalidChannel(16)))
    ));

    let mut config = DrivetrainConfig::default();
    config.right.phase = config.left.enable;
    assert!(matches!(
        Drivetrain::new(&i2c_bus, &config),
        Err(DeviceError::Config(ConfigError::SharedChannel(3)))
    ));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_stop_writes_zero_to_both_sides() {
    // One auto-increment write, then phase and enable for left and right
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x16, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x1A, 0x00, 0x00, 0x00, 0x00]),
    ];

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let mut devs = Drivetrain::new(&i2c_bus, &DrivetrainConfig::default()).unwrap();
    let pwm = Pca9685::new(RefCellDevice::new(&i2c_bus), PwmAddress::from(PWM_ADDRESS)).unwrap();
    devs.pwm = Some(pwm);
    devs.stop().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_tank_drive_half_forward_inverts_right_side() {
    // 0.5 * 4095 = 2047 (0x07FF); the inverted right side reverses its phase
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0xFF, 0x07]),
        write(PWM_ADDRESS, vec![0x16, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x1A, 0x00, 0x00, 0xFF, 0x07]),
    ];

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let mut devs = Drivetrain::new(&i2c_bus, &linear_config()).unwrap();
    let pwm = Pca9685::new(RefCellDevice::new(&i2c_bus), PwmAddress::from(PWM_ADDRESS)).unwrap();
    devs.pwm = Some(pwm);
    devs.tank_drive(0.5, 0.5).unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_arcade_drive_out_of_range_is_bounded() {
    // speed 3.0 clamps to full forward: full duty on both sides
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x16, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x1A, 0x00, 0x00, 0xFF, 0x0F]),
    ];

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let mut devs = Drivetrain::new(&i2c_bus, &linear_config()).unwrap();
    let pwm = Pca9685::new(RefCellDevice::new(&i2c_bus), PwmAddress::from(PWM_ADDRESS)).unwrap();
    devs.pwm = Some(pwm);
    devs.arcade_drive(3.0, 0.0).unwrap();
    i2c_bus.borrow_mut().done();
}
