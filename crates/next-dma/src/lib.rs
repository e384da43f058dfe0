//! NeXT integrated channel DMA controller.
//!
//! Twelve channel processors move data between main memory and the
//! on-board peripherals: SCSI, sound out/in, magneto-optical disk, printer,
//! SCC, DSP, Ethernet transmit/receive, video, and the memory↔register
//! pair. Standalone chip emulation following the project's chip-level
//! library pattern: memory, interrupts and the SCSI controller are reached
//! through traits, never owned.
//!
//! # Register interface
//!
//! Each channel has a bank of registers repeated at a fixed distance from
//! its base offset (see [`Register::group_offset`]):
//! - **CSR**: status bits on read, command bits on write. One byte wide on
//!   the 68030 Cube, a long word on 68040 machines.
//! - **next/limit/start/stop**: the live ring-buffer pointers.
//! - **saved next/limit/start/stop**: a snapshot store for the OS.
//! - **init/size**: base and length for device-initiated transfers.
//!
//! # Transfers
//!
//! The SCSI channel buffers bytes in 16-byte bursts
//! ([`DmaController::storage_commit`], [`DmaController::storage_flush`]).
//! Every other channel copies whole blocks
//! ([`DmaController::memory_read`], [`DmaController::memory_write`]).
//!
//! Bus errors never escape: they set complete + bus exception and stop the
//! channel, and software finds out by reading the CSR.

mod block;
pub mod channel;
pub mod config;
pub mod csr;
pub mod irq;
pub mod registers;
pub mod storage;
#[cfg(feature = "test-utils")]
pub mod testing;

use emu_core::{Bus, Observable, Value};
use tracing::{debug, trace, warn};

pub use channel::{Channel, ChannelId};
pub use config::{ConfigError, DmaConfig, MachineType};
pub use csr::{Command, Csr, CsrEncoding, Direction};
pub use irq::{InterruptController, InterruptLine};
pub use registers::Register;
pub use storage::{BURST_SIZE, StorageDevice};

use storage::BurstBuffer;

/// Everything the controller talks to: memory, the interrupt controller,
/// and the SCSI controller on the other side of the burst buffer.
pub trait DmaHost: Bus + InterruptController + StorageDevice {}

impl<T: Bus + InterruptController + StorageDevice> DmaHost for T {}

/// The DMA controller: twelve channels and the SCSI burst buffer.
#[derive(Debug, Clone)]
pub struct DmaController {
    channels: [Channel; ChannelId::COUNT],
    staging: BurstBuffer,
    config: DmaConfig,
    encoding: CsrEncoding,
}

impl DmaController {
    /// Create a controller in its power-on state.
    #[must_use]
    pub fn new(config: DmaConfig) -> Self {
        Self {
            channels: [Channel::default(); ChannelId::COUNT],
            staging: BurstBuffer::default(),
            config,
            encoding: config.machine.csr_encoding(),
        }
    }

    /// Return every channel to its power-on state. Configuration is kept.
    pub fn reset(&mut self) {
        self.channels = [Channel::default(); ChannelId::COUNT];
        self.staging.clear();
    }

    /// Switch machine type or turbo mode. Channel state is untouched.
    pub fn set_config(&mut self, config: DmaConfig) {
        self.config = config;
        self.encoding = config.machine.csr_encoding();
    }

    #[must_use]
    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    /// Copy of a channel's registers, for save states.
    #[must_use]
    pub fn channel_state(&self, id: ChannelId) -> Channel {
        self.channels[id.index()]
    }

    /// Restore a channel from a save state.
    pub fn restore_channel(&mut self, id: ChannelId, state: Channel) {
        self.channels[id.index()] = state;
    }

    /// Bytes sitting in the SCSI burst buffer.
    #[must_use]
    pub fn staged_bytes(&self) -> usize {
        self.staging.len()
    }

    /// Read the register the bus routed to.
    ///
    /// `address` is the bus address of the access; the channel comes from
    /// its offset within the I/O segment. Accesses that map to no channel
    /// read as zero.
    #[must_use]
    pub fn read_register(&self, register: Register, address: u32) -> u32 {
        let Some(id) = register.channel_at(address) else {
            return 0;
        };
        let channel = &self.channels[id.index()];
        let value = channel
            .pointer(register)
            .unwrap_or_else(|| self.encoding.encode(channel.csr));
        trace!(
            target: "dma",
            channel = id.name(),
            register = register.name(),
            address = format_args!("{address:08x}"),
            value = format_args!("{value:08x}"),
            "register read"
        );
        value
    }

    /// Write the register the bus routed to.
    ///
    /// Pointer registers are plain stores, except that writing `init` also
    /// seeds `next`. CSR writes are decoded into commands. Accesses that
    /// map to no channel are dropped.
    pub fn write_register<H: DmaHost>(
        &mut self,
        host: &mut H,
        register: Register,
        address: u32,
        value: u32,
    ) {
        let Some(id) = register.channel_at(address) else {
            return;
        };
        trace!(
            target: "dma",
            channel = id.name(),
            register = register.name(),
            address = format_args!("{address:08x}"),
            value = format_args!("{value:08x}"),
            "register write"
        );

        match register {
            Register::Csr => self.write_csr(host, id, value),
            pointer => self.channels[id.index()].set_pointer(pointer, value),
        }
    }

    fn write_csr<H: DmaHost>(&mut self, host: &mut H, id: ChannelId, value: u32) {
        let value = self.encoding.normalize(value);
        let command = Command::decode(value);
        let csr = &mut self.channels[id.index()].csr;

        csr.direction = Direction::from_wide(value);
        debug!(target: "dma", channel = id.name(), ?command, direction = ?csr.direction, "csr command");

        match command {
            Command::Reset => csr.reset(),
            Command::InitBuffers => self.init_buffers(host),
            Command::ResetAndInitBuffers => {
                csr.reset();
                self.init_buffers(host);
            }
            Command::ClearComplete => {
                csr.complete = false;
                if id == ChannelId::Scsi {
                    self.storage_commit(host);
                }
            }
            Command::ContinueChaining => {
                csr.single_update = true;
                csr.complete = false;
                if id == ChannelId::Scsi {
                    self.storage_commit(host);
                }
            }
            Command::SetEnable => csr.enable = true,
            Command::StartChaining => {
                csr.enable = true;
                csr.single_update = true;
            }
            Command::Nop => warn!(target: "dma", channel = id.name(), "csr write with no command"),
            Command::Unknown(bits) => warn!(
                target: "dma",
                channel = id.name(),
                bits = format_args!("{bits:08x}"),
                "unknown csr command"
            ),
        }

        if let Some(line) = id.interrupt() {
            host.release_interrupt(line);
        }
    }

    fn init_buffers<S: StorageDevice + ?Sized>(&mut self, device: &mut S) {
        self.staging.clear();
        device.reset_dma_status();
    }
}

impl Default for DmaController {
    fn default() -> Self {
        Self::new(DmaConfig::default())
    }
}

macro_rules! channel_paths {
    ($($ch:literal),* $(,)?) => {
        &[
            $(
                concat!($ch, ".csr"),
                concat!($ch, ".csr.direction"),
                concat!($ch, ".csr.enable"),
                concat!($ch, ".csr.single_update"),
                concat!($ch, ".csr.complete"),
                concat!($ch, ".csr.bus_exception"),
                concat!($ch, ".saved_next"),
                concat!($ch, ".saved_limit"),
                concat!($ch, ".saved_start"),
                concat!($ch, ".saved_stop"),
                concat!($ch, ".next"),
                concat!($ch, ".limit"),
                concat!($ch, ".start"),
                concat!($ch, ".stop"),
                concat!($ch, ".init"),
                concat!($ch, ".size"),
            )*
            "staged",
        ]
    };
}

const QUERY_PATHS: &[&str] = channel_paths!(
    "scsi",
    "sound_out",
    "disk",
    "sound_in",
    "printer",
    "scc",
    "dsp",
    "en_tx",
    "en_rx",
    "video",
    "m2r",
    "r2m",
);

impl Observable for DmaController {
    fn query(&self, path: &str) -> Option<Value> {
        if path == "staged" {
            return Some((self.staging.len() as u8).into());
        }

        let (name, field) = path.split_once('.')?;
        let channel = self.channels[ChannelId::from_name(name)?.index()];
        let csr = channel.csr;

        match field {
            // CSR reads back in the wide layout regardless of machine.
            "csr" => Some(csr.to_wide().into()),
            "csr.direction" => Some((csr.direction == Direction::DeviceToMem).into()),
            "csr.enable" => Some(csr.enable.into()),
            "csr.single_update" => Some(csr.single_update.into()),
            "csr.complete" => Some(csr.complete.into()),
            "csr.bus_exception" => Some(csr.bus_exception.into()),
            other => channel.pointer(Register::from_name(other)?).map(Value::from),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
