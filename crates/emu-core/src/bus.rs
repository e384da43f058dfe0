//! Memory bus interface.

use thiserror::Error;

/// A failed bus cycle.
///
/// On the 68k machines this is what the CPU would see as a bus error; DMA
/// engines record it in their status registers instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bus error at ${address:08X}")]
pub struct BusError {
    /// Address of the cycle that faulted.
    pub address: u32,
}

/// Memory bus interface.
///
/// Components access main memory through this trait. Addresses are full
/// 32-bit physical addresses; the bus decides what is mapped and reports
/// unmapped or protected cycles as [`BusError`].
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u32) -> Result<u8, BusError>;

    /// Write a byte to the given address.
    fn write(&mut self, address: u32, value: u8) -> Result<(), BusError>;

    /// Read a big-endian long word.
    fn read_long(&mut self, address: u32) -> Result<u32, BusError> {
        let mut value = 0u32;
        for i in 0..4 {
            value = (value << 8) | u32::from(self.read(address.wrapping_add(i))?);
        }
        Ok(value)
    }

    /// Write a big-endian long word.
    ///
    /// Bytes are written most significant first. A fault part-way through
    /// leaves the earlier bytes in place.
    fn write_long(&mut self, address: u32, value: u32) -> Result<(), BusError> {
        for (i, byte) in value.to_be_bytes().into_iter().enumerate() {
            self.write(address.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }
}

/// Flat RAM mapped at a base address.
///
/// Anything outside `[base, base + len)` faults. Handy for tests and for
/// machines that only need one contiguous bank.
#[derive(Debug, Clone)]
pub struct SimpleBus {
    base: u32,
    ram: Vec<u8>,
}

impl SimpleBus {
    /// Create `len` bytes of zeroed RAM starting at `base`.
    #[must_use]
    pub fn new(base: u32, len: usize) -> Self {
        Self {
            base,
            ram: vec![0; len],
        }
    }

    /// Copy `data` into RAM at `address`, ignoring anything that falls
    /// outside the mapped range.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            if let Some(slot) = self.slot(address.wrapping_add(i as u32)) {
                self.ram[slot] = byte;
            }
        }
    }

    /// Read a byte without going through the fault path. Unmapped reads
    /// return 0.
    #[must_use]
    pub fn peek(&self, address: u32) -> u8 {
        self.slot(address).map_or(0, |slot| self.ram[slot])
    }

    /// Copy `len` bytes starting at `address` (unmapped bytes read as 0).
    #[must_use]
    pub fn peek_range(&self, address: u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.peek(address.wrapping_add(i as u32)))
            .collect()
    }

    fn slot(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.base)? as usize;
        (offset < self.ram.len()).then_some(offset)
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u32) -> Result<u8, BusError> {
        self.slot(address)
            .map(|slot| self.ram[slot])
            .ok_or(BusError { address })
    }

    fn write(&mut self, address: u32, value: u8) -> Result<(), BusError> {
        let slot = self.slot(address).ok_or(BusError { address })?;
        self.ram[slot] = value;
        Ok(())
    }
}
