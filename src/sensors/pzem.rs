//! PZEM-004T v3.0 energy meter (Modbus-RTU over UART, 9600 8N1).
//!
//! One poll reads the ten input registers starting at 0x0000:
//!
//! | Reg     | Quantity     | Resolution           |
//! |---------|--------------|----------------------|
//! | 0       | voltage      | 0.1 V                |
//! | 1–2     | current      | 0.001 A (low word 1st)|
//! | 3–4     | power        | 0.1 W (low word 1st) |
//! | 5–6     | energy       | 1 Wh (low word 1st)  |
//! | 7       | frequency    | 0.1 Hz               |
//! | 8       | power factor | 0.01                 |
//! | 9       | alarm        | 0xFFFF = alarm       |
//!
//! The energy counter lives in the meter's own flash, so it survives a
//! controller restart.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: request/response over a UART driver.
//! On host/test: a response frame is synthesised from injectable values
//! and decoded through the same parser.

use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Factory-default "general" slave address answered by any PZEM.
pub const PZEM_DEFAULT_ADDRESS: u8 = 0xF8;
/// UART baud rate fixed by the meter.
pub const PZEM_BAUD_RATE: u32 = 9_600;

const FUNC_READ_INPUT_REGISTERS: u8 = 0x04;
const EXCEPTION_FLAG: u8 = 0x80;
const REGISTER_COUNT: u16 = 10;
const DATA_BYTES: usize = REGISTER_COUNT as usize * 2;
/// addr + func + byte count + data + CRC.
pub const RESPONSE_LEN: usize = 3 + DATA_BYTES + 2;
const EXCEPTION_LEN: usize = 5;

/// One decoded meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PzemReading {
    pub voltage: f32,
    pub current: f32,
    pub power: f32,
    pub energy_kwh: f32,
    pub frequency: f32,
    pub power_factor: f32,
    pub alarm: bool,
}

// ── Codec ─────────────────────────────────────────────────────

/// CRC-16/Modbus (poly 0xA001 reflected, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
    }
    crc
}

/// Build the "read all input registers" request.
pub fn read_request(address: u8) -> [u8; 8] {
    let mut frame = [
        address,
        FUNC_READ_INPUT_REGISTERS,
        0x00,
        0x00,
        (REGISTER_COUNT >> 8) as u8,
        REGISTER_COUNT as u8,
        0,
        0,
    ];
    let crc = crc16(&frame[..6]);
    frame[6..].copy_from_slice(&crc.to_le_bytes());
    frame
}

/// Validate and decode a response frame.
pub fn parse_response(address: u8, frame: &[u8]) -> Result<PzemReading, SensorError> {
    if frame.len() < EXCEPTION_LEN {
        return Err(SensorError::ShortFrame);
    }
    if frame[1] == FUNC_READ_INPUT_REGISTERS | EXCEPTION_FLAG {
        check_crc(&frame[..EXCEPTION_LEN])?;
        return Err(SensorError::ExceptionResponse(frame[2]));
    }
    if frame.len() < RESPONSE_LEN {
        return Err(SensorError::ShortFrame);
    }
    let frame = &frame[..RESPONSE_LEN];
    check_crc(frame)?;
    if frame[0] != address {
        return Err(SensorError::UnexpectedAddress);
    }
    if frame[1] != FUNC_READ_INPUT_REGISTERS || usize::from(frame[2]) != DATA_BYTES {
        return Err(SensorError::UnexpectedFunction);
    }

    let reg = |i: usize| u16::from_be_bytes([frame[3 + 2 * i], frame[4 + 2 * i]]);
    let reg32 = |lo: usize| u32::from(reg(lo)) | (u32::from(reg(lo + 1)) << 16);

    Ok(PzemReading {
        voltage: f32::from(reg(0)) / 10.0,
        current: reg32(1) as f32 / 1000.0,
        power: reg32(3) as f32 / 10.0,
        energy_kwh: reg32(5) as f32 / 1000.0,
        frequency: f32::from(reg(7)) / 10.0,
        power_factor: f32::from(reg(8)) / 100.0,
        alarm: reg(9) != 0,
    })
}

/// Encode a reading as the meter would send it.
pub fn encode_response(address: u8, reading: &PzemReading) -> [u8; RESPONSE_LEN] {
    let current = (reading.current * 1000.0).round() as u32;
    let power = (reading.power * 10.0).round() as u32;
    let energy = (reading.energy_kwh * 1000.0).round() as u32;
    let regs: [u16; REGISTER_COUNT as usize] = [
        (reading.voltage * 10.0).round() as u16,
        current as u16,
        (current >> 16) as u16,
        power as u16,
        (power >> 16) as u16,
        energy as u16,
        (energy >> 16) as u16,
        (reading.frequency * 10.0).round() as u16,
        (reading.power_factor * 100.0).round() as u16,
        if reading.alarm { 0xFFFF } else { 0 },
    ];

    let mut frame = [0u8; RESPONSE_LEN];
    frame[0] = address;
    frame[1] = FUNC_READ_INPUT_REGISTERS;
    frame[2] = DATA_BYTES as u8;
    for (i, r) in regs.iter().enumerate() {
        frame[3 + 2 * i..5 + 2 * i].copy_from_slice(&r.to_be_bytes());
    }
    let crc = crc16(&frame[..RESPONSE_LEN - 2]);
    frame[RESPONSE_LEN - 2..].copy_from_slice(&crc.to_le_bytes());
    frame
}

fn check_crc(frame: &[u8]) -> Result<(), SensorError> {
    let (body, trailer) = frame.split_at(frame.len() - 2);
    if crc16(body).to_le_bytes() != [trailer[0], trailer[1]] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(())
}

// ── Simulation backing ────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_VOLTAGE: AtomicU32 = AtomicU32::new(0x4366_0000); // 230.0
#[cfg(not(target_os = "espidf"))]
static SIM_CURRENT: AtomicU32 = AtomicU32::new(0x3F80_0000); // 1.0
#[cfg(not(target_os = "espidf"))]
static SIM_ENERGY_KWH: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_OFFLINE: AtomicBool = AtomicBool::new(false);

/// Inject the values the simulated meter reports.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_reading(voltage: f32, current: f32, energy_kwh: f32) {
    SIM_VOLTAGE.store(voltage.to_bits(), Ordering::Relaxed);
    SIM_CURRENT.store(current.to_bits(), Ordering::Relaxed);
    SIM_ENERGY_KWH.store(energy_kwh.to_bits(), Ordering::Relaxed);
}

/// Make the simulated meter stop answering.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_offline(offline: bool) {
    SIM_OFFLINE.store(offline, Ordering::Relaxed);
}

// ── Driver ────────────────────────────────────────────────────

pub struct PzemSensor {
    address: u8,
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
}

impl PzemSensor {
    #[cfg(target_os = "espidf")]
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>, address: u8) -> Self {
        Self { address, uart }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read(&mut self) -> Result<PzemReading, SensorError> {
        let frame = self.transact()?;
        parse_response(self.address, &frame)
    }

    #[cfg(target_os = "espidf")]
    fn transact(&mut self) -> Result<[u8; RESPONSE_LEN], SensorError> {
        use esp_idf_hal::delay::TickType;

        let _ = self.uart.clear_rx();
        self.uart
            .write(&read_request(self.address))
            .map_err(|_| SensorError::NoResponse)?;

        let mut frame = [0u8; RESPONSE_LEN];
        let mut filled = 0;
        let timeout = TickType::new_millis(200).ticks();
        while filled < RESPONSE_LEN {
            match self.uart.read(&mut frame[filled..], timeout) {
                Ok(0) | Err(_) => break,
                Ok(n) => filled += n,
            }
        }
        // Exception replies are 5 bytes; let the parser classify them.
        if filled < EXCEPTION_LEN {
            return Err(SensorError::NoResponse);
        }
        Ok(frame)
    }

    #[cfg(not(target_os = "espidf"))]
    fn transact(&mut self) -> Result<[u8; RESPONSE_LEN], SensorError> {
        if SIM_OFFLINE.load(Ordering::Relaxed) {
            return Err(SensorError::NoResponse);
        }
        let voltage = f32::from_bits(SIM_VOLTAGE.load(Ordering::Relaxed));
        let current = f32::from_bits(SIM_CURRENT.load(Ordering::Relaxed));
        let power_factor = 0.95;
        let reading = PzemReading {
            voltage,
            current,
            power: voltage * current * power_factor,
            energy_kwh: f32::from_bits(SIM_ENERGY_KWH.load(Ordering::Relaxed)),
            frequency: 50.0,
            power_factor,
            alarm: false,
        };
        Ok(encode_response(self.address, &reading))
    }
}
