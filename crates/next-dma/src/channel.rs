//! Channel identities, their bus offsets, and per-channel register state.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::csr::Csr;
use crate::irq::InterruptLine;
use crate::registers::Register;

/// Mask applied to bus addresses to get the offset inside the I/O segment.
pub const IO_SEG_MASK: u32 = 0x1FFFF;

/// One of the twelve channel processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// SCSI controller. The only channel with a burst buffer.
    Scsi,
    SoundOut,
    /// Magneto-optical disk.
    Disk,
    SoundIn,
    Printer,
    /// Serial communications controller.
    Scc,
    Dsp,
    EnTx,
    EnRx,
    Video,
    /// Memory to register.
    M2r,
    /// Register to memory.
    R2m,
}

impl ChannelId {
    pub const COUNT: usize = 12;

    pub const ALL: [ChannelId; Self::COUNT] = [
        ChannelId::Scsi,
        ChannelId::SoundOut,
        ChannelId::Disk,
        ChannelId::SoundIn,
        ChannelId::Printer,
        ChannelId::Scc,
        ChannelId::Dsp,
        ChannelId::EnTx,
        ChannelId::EnRx,
        ChannelId::Video,
        ChannelId::M2r,
        ChannelId::R2m,
    ];

    /// Offset of the channel's CSR within the I/O segment.
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            ChannelId::Scsi => 0x010,
            ChannelId::SoundOut => 0x040,
            ChannelId::Disk => 0x050,
            ChannelId::SoundIn => 0x080,
            ChannelId::Printer => 0x090,
            ChannelId::Scc => 0x0C0,
            ChannelId::Dsp => 0x0D0,
            ChannelId::EnTx => 0x110,
            ChannelId::EnRx => 0x150,
            ChannelId::Video => 0x180,
            ChannelId::M2r => 0x1D0,
            ChannelId::R2m => 0x1C0,
        }
    }

    /// Resolve a channel base offset. Bits above the I/O segment are
    /// ignored. Unknown offsets are logged and yield `None`.
    #[must_use]
    pub fn from_offset(offset: u32) -> Option<Self> {
        let channel = match offset & IO_SEG_MASK {
            0x010 => ChannelId::Scsi,
            0x040 => ChannelId::SoundOut,
            0x050 => ChannelId::Disk,
            0x080 => ChannelId::SoundIn,
            0x090 => ChannelId::Printer,
            0x0C0 => ChannelId::Scc,
            0x0D0 => ChannelId::Dsp,
            0x110 => ChannelId::EnTx,
            0x150 => ChannelId::EnRx,
            0x180 => ChannelId::Video,
            0x1D0 => ChannelId::M2r,
            0x1C0 => ChannelId::R2m,
            other => {
                warn!(target: "dma", offset = format_args!("{other:05x}"), "unknown DMA channel");
                return None;
            }
        };
        Some(channel)
    }

    /// Dedicated interrupt line. Video has none.
    #[must_use]
    pub const fn interrupt(self) -> Option<InterruptLine> {
        match self {
            ChannelId::Scsi => Some(InterruptLine::ScsiDma),
            ChannelId::SoundOut => Some(InterruptLine::SoundOutDma),
            ChannelId::Disk => Some(InterruptLine::DiskDma),
            ChannelId::SoundIn => Some(InterruptLine::SoundInDma),
            ChannelId::Printer => Some(InterruptLine::PrinterDma),
            ChannelId::Scc => Some(InterruptLine::SccDma),
            ChannelId::Dsp => Some(InterruptLine::DspDma),
            ChannelId::EnTx => Some(InterruptLine::EnTxDma),
            ChannelId::EnRx => Some(InterruptLine::EnRxDma),
            // TODO: confirm on hardware whether video DMA interrupts at all.
            ChannelId::Video => None,
            ChannelId::M2r => Some(InterruptLine::M2rDma),
            ChannelId::R2m => Some(InterruptLine::R2mDma),
        }
    }

    /// Transfer alignment unit. Only used for diagnostics.
    #[must_use]
    pub const fn alignment(self) -> usize {
        match self {
            ChannelId::EnTx | ChannelId::EnRx => 32,
            _ => 16,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used in logs and observability paths.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ChannelId::Scsi => "scsi",
            ChannelId::SoundOut => "sound_out",
            ChannelId::Disk => "disk",
            ChannelId::SoundIn => "sound_in",
            ChannelId::Printer => "printer",
            ChannelId::Scc => "scc",
            ChannelId::Dsp => "dsp",
            ChannelId::EnTx => "en_tx",
            ChannelId::EnRx => "en_rx",
            ChannelId::Video => "video",
            ChannelId::M2r => "m2r",
            ChannelId::R2m => "r2m",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

/// Register state of one channel.
///
/// The saved registers are a separate store that software uses to
/// recover ring-buffer state; they only change when software writes them
/// or a block write finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Channel {
    pub csr: Csr,
    pub next: u32,
    pub limit: u32,
    pub start: u32,
    pub stop: u32,
    pub saved_next: u32,
    pub saved_limit: u32,
    pub saved_start: u32,
    pub saved_stop: u32,
    pub init: u32,
    pub size: u32,
}

impl Channel {
    /// Value of a pointer register. The CSR needs an encoding and isn't
    /// handled here.
    #[must_use]
    pub fn pointer(&self, register: Register) -> Option<u32> {
        let value = match register {
            Register::Csr => return None,
            Register::SavedNext => self.saved_next,
            Register::SavedLimit => self.saved_limit,
            Register::SavedStart => self.saved_start,
            Register::SavedStop => self.saved_stop,
            Register::Next => self.next,
            Register::Limit => self.limit,
            Register::Start => self.start,
            Register::Stop => self.stop,
            Register::Init => self.init,
            Register::Size => self.size,
        };
        Some(value)
    }

    /// Store a pointer register. Writing `init` also seeds `next`.
    pub fn set_pointer(&mut self, register: Register, value: u32) {
        match register {
            Register::Csr => {}
            Register::SavedNext => self.saved_next = value,
            Register::SavedLimit => self.saved_limit = value,
            Register::SavedStart => self.saved_start = value,
            Register::SavedStop => self.saved_stop = value,
            Register::Next => self.next = value,
            Register::Limit => self.limit = value,
            Register::Start => self.start = value,
            Register::Stop => self.stop = value,
            Register::Init => {
                self.init = value;
                self.next = value;
            }
            Register::Size => self.size = value,
        }
    }

    /// Load the chaining pair into the active pointers.
    pub fn reload(&mut self) {
        self.next = self.start;
        self.limit = self.stop;
    }

    /// `next` has met `limit`: chain once if armed, otherwise stop.
    ///
    /// Returns `true` if the pointers were reloaded.
    pub fn finish_segment(&mut self) -> bool {
        self.csr.complete = true;
        if self.csr.single_update {
            self.reload();
            self.csr.single_update = false;
            true
        } else {
            self.csr.enable = false;
            false
        }
    }
}
