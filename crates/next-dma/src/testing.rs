//! Scripted host for exercising the controller without a machine.
//!
//! Only available with the `test-utils` feature.

use std::collections::{HashSet, VecDeque};

use emu_core::{Bus, BusError, SimpleBus};

use crate::irq::{InterruptController, InterruptLine};
use crate::storage::StorageDevice;

/// Interrupt controller traffic, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqEvent {
    Set(InterruptLine),
    Release(InterruptLine),
}

/// A SCSI controller stand-in that sends queued bytes while in data-in.
#[derive(Debug, Default)]
pub struct ScriptedDisk {
    pending: VecDeque<u8>,
    /// Cleared to model the controller leaving its data-in phase.
    pub data_in: bool,
    /// Bytes handed to the DMA channel since the last INITBUF.
    pub transferred: u32,
    /// Stand-in for the controller's DMA status register.
    pub status: u8,
    pub status_refreshes: usize,
    pub dma_done_calls: usize,
}

impl ScriptedDisk {
    /// Queue bytes and enter data-in.
    pub fn feed(&mut self, bytes: impl IntoIterator<Item = u8>) {
        self.pending.extend(bytes);
        self.data_in = true;
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl StorageDevice for ScriptedDisk {
    fn has_data(&self) -> bool {
        self.data_in && !self.pending.is_empty()
    }

    fn pull_byte(&mut self) -> u8 {
        self.transferred += 1;
        self.pending.pop_front().unwrap_or(0)
    }

    fn refresh_dma_status(&mut self) {
        self.status_refreshes += 1;
        self.status = u8::from(!self.pending.is_empty());
    }

    fn reset_dma_status(&mut self) {
        self.status = 0;
        self.transferred = 0;
    }

    fn dma_done(&mut self) {
        self.dma_done_calls += 1;
    }
}

/// Memory, interrupt controller and SCSI device in one value.
#[derive(Debug)]
pub struct TestHost {
    pub memory: SimpleBus,
    /// Accesses to these addresses fault.
    pub faulting: HashSet<u32>,
    pub irq_events: Vec<IrqEvent>,
    /// Currently asserted interrupt bits.
    pub irq_status: u32,
    pub disk: ScriptedDisk,
}

impl TestHost {
    /// 64 KiB of RAM at `base`.
    #[must_use]
    pub fn new(base: u32) -> Self {
        Self::with_memory(SimpleBus::new(base, 0x1_0000))
    }

    #[must_use]
    pub fn with_memory(memory: SimpleBus) -> Self {
        Self {
            memory,
            faulting: HashSet::new(),
            irq_events: Vec::new(),
            irq_status: 0,
            disk: ScriptedDisk::default(),
        }
    }

    #[must_use]
    pub fn asserted(&self, line: InterruptLine) -> bool {
        self.irq_status & line.mask() != 0
    }

    /// How many times `line` was raised.
    #[must_use]
    pub fn raised(&self, line: InterruptLine) -> usize {
        self.irq_events
            .iter()
            .filter(|&&event| event == IrqEvent::Set(line))
            .count()
    }
}

impl Bus for TestHost {
    fn read(&mut self, address: u32) -> Result<u8, BusError> {
        if self.faulting.contains(&address) {
            return Err(BusError { address });
        }
        self.memory.read(address)
    }

    fn write(&mut self, address: u32, value: u8) -> Result<(), BusError> {
        if self.faulting.contains(&address) {
            return Err(BusError { address });
        }
        self.memory.write(address, value)
    }
}

impl InterruptController for TestHost {
    fn set_interrupt(&mut self, line: InterruptLine) {
        self.irq_status |= line.mask();
        self.irq_events.push(IrqEvent::Set(line));
    }

    fn release_interrupt(&mut self, line: InterruptLine) {
        self.irq_status &= !line.mask();
        self.irq_events.push(IrqEvent::Release(line));
    }
}

impl StorageDevice for TestHost {
    fn has_data(&self) -> bool {
        self.disk.has_data()
    }

    fn pull_byte(&mut self) -> u8 {
        self.disk.pull_byte()
    }

    fn refresh_dma_status(&mut self) {
        self.disk.refresh_dma_status();
    }

    fn reset_dma_status(&mut self) {
        self.disk.reset_dma_status();
    }

    fn dma_done(&mut self) {
        self.disk.dma_done();
    }
}
