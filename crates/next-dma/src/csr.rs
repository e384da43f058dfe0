//! Control/status register layout and the command decoder.
//!
//! Internally the CSR is a handful of flags plus a [`Direction`]. The bit
//! layout only exists at the bus boundary, where [`CsrEncoding`] packs it
//! for the 68030 (one byte) or 68040 (full long word) machines.

use serde::{Deserialize, Serialize};

// Read/write
pub const DEV2M: u32 = 0x0004_0000;
// Read
pub const ENABLE: u32 = 0x0100_0000;
pub const SUPDATE: u32 = 0x0200_0000;
pub const COMPLETE: u32 = 0x0800_0000;
pub const BUSEXC: u32 = 0x1000_0000;
// Write
pub const SETENABLE: u32 = 0x0001_0000;
pub const SETSUPDATE: u32 = 0x0002_0000;
pub const CLRCOMPLETE: u32 = 0x0008_0000;
pub const RESET: u32 = 0x0010_0000;
pub const INITBUF: u32 = 0x0020_0000;

pub const CMD_MASK: u32 = SETENABLE | SETSUPDATE | CLRCOMPLETE | RESET | INITBUF;
pub const STAT_MASK: u32 = ENABLE | SUPDATE | COMPLETE | BUSEXC;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Memory to device (bit clear).
    #[default]
    MemToDevice,
    /// Device to memory (`DEV2M` set).
    DeviceToMem,
}

impl Direction {
    /// Direction carried by a normalised CSR write.
    #[must_use]
    pub fn from_wide(value: u32) -> Self {
        if value & DEV2M != 0 {
            Direction::DeviceToMem
        } else {
            Direction::MemToDevice
        }
    }
}

/// Channel status as seen through the CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Csr {
    pub direction: Direction,
    pub enable: bool,
    /// Chaining armed: the next limit hit reloads from start/stop.
    pub single_update: bool,
    pub complete: bool,
    pub bus_exception: bool,
}

impl Csr {
    /// Pack into the 68040 layout. Command bits are never stored, so they
    /// always read back as zero.
    #[must_use]
    pub fn to_wide(self) -> u32 {
        let mut value = 0;
        if self.direction == Direction::DeviceToMem {
            value |= DEV2M;
        }
        if self.enable {
            value |= ENABLE;
        }
        if self.single_update {
            value |= SUPDATE;
        }
        if self.complete {
            value |= COMPLETE;
        }
        if self.bus_exception {
            value |= BUSEXC;
        }
        value
    }

    /// Pack into the 68030 byte: status bits shifted down to the low byte,
    /// direction at `0x04`.
    #[must_use]
    pub fn to_narrow(self) -> u8 {
        let wide = self.to_wide();
        (((wide & STAT_MASK) >> 24) | ((wide & DEV2M) >> 16)) as u8
    }

    /// The RESET command: clears complete, single update, enable and
    /// direction. Bus exception survives.
    pub fn reset(&mut self) {
        self.complete = false;
        self.single_update = false;
        self.enable = false;
        self.direction = Direction::MemToDevice;
    }

    /// Bus error during a transfer: the channel stops and reports.
    pub fn fault(&mut self) {
        self.enable = false;
        self.complete = true;
        self.bus_exception = true;
    }
}

/// CSR command decoded from the write-only bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    InitBuffers,
    ResetAndInitBuffers,
    /// Clear complete ("end chaining").
    ClearComplete,
    /// Set single update + clear complete ("continue chaining").
    ContinueChaining,
    /// Set enable ("start single transfer").
    SetEnable,
    /// Set enable + set single update ("start chaining").
    StartChaining,
    /// No command bits set.
    Nop,
    /// A bit combination the hardware doesn't define.
    Unknown(u32),
}

impl Command {
    /// Decode the command field of a normalised (wide) CSR write.
    #[must_use]
    pub fn decode(value: u32) -> Self {
        match value & CMD_MASK {
            RESET => Command::Reset,
            INITBUF => Command::InitBuffers,
            bits if bits == RESET | INITBUF => Command::ResetAndInitBuffers,
            CLRCOMPLETE => Command::ClearComplete,
            bits if bits == SETSUPDATE | CLRCOMPLETE => Command::ContinueChaining,
            SETENABLE => Command::SetEnable,
            bits if bits == SETENABLE | SETSUPDATE => Command::StartChaining,
            0 => Command::Nop,
            bits => Command::Unknown(bits),
        }
    }
}

/// Bus encoding of the CSR, fixed by machine generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrEncoding {
    /// 68030 Cube: byte-wide CSR.
    Narrow,
    /// 68040 machines: long-word CSR.
    Wide,
}

impl CsrEncoding {
    /// Value the CPU sees when reading the CSR.
    #[must_use]
    pub fn encode(self, csr: Csr) -> u32 {
        match self {
            CsrEncoding::Narrow => u32::from(csr.to_narrow()),
            CsrEncoding::Wide => csr.to_wide(),
        }
    }

    /// Convert a CPU write into the wide layout the decoder works on.
    #[must_use]
    pub fn normalize(self, value: u32) -> u32 {
        match self {
            CsrEncoding::Narrow => (value & 0xFF) << 16,
            CsrEncoding::Wide => value,
        }
    }
}
