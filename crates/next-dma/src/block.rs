//! Whole-block transfers for every channel except SCSI.
//!
//! Devices hand the controller a complete packet (or ask for one) and the
//! controller copies it in one go. Ring-buffer bookkeeping happens once at
//! the end of the block rather than per burst.

use emu_core::Bus;
use tracing::{debug, warn};

use crate::DmaController;
use crate::channel::ChannelId;
use crate::irq::InterruptController;

/// Address bits that take part in transfer size arithmetic.
const ADDRESS_MASK: u32 = 0x0FFF_FFFF;

impl DmaController {
    /// Device wants data: copy the channel's current block from memory into
    /// `buf` (cleared first). Returns the number of bytes copied.
    ///
    /// The block runs from `init` (or `next` when `init` is zero) up to
    /// `limit`. Ethernet transmit on non-turbo machines measures its size
    /// from `init`.
    pub fn memory_read<H>(&mut self, host: &mut H, id: ChannelId, buf: &mut Vec<u8>) -> usize
    where
        H: Bus + InterruptController,
    {
        let turbo = self.config.turbo;
        let channel = &mut self.channels[id.index()];

        let from = if id == ChannelId::EnTx && !turbo {
            if channel.init == 0 {
                warn!(
                    target: "dma",
                    next = format_args!("{:08x}", channel.next),
                    limit = format_args!("{:08x}", channel.limit),
                    "ethernet transmit without init, sizing read from address zero"
                );
            }
            channel.init
        } else {
            channel.next
        };
        let Some(size) = (channel.limit & ADDRESS_MASK).checked_sub(from & ADDRESS_MASK) else {
            warn!(
                target: "dma",
                channel = id.name(),
                limit = format_args!("{:08x}", channel.limit),
                from = format_args!("{from:08x}"),
                "block read with limit below base"
            );
            buf.clear();
            return 0;
        };
        let size = size as usize;
        let base = if channel.init == 0 {
            channel.next
        } else {
            channel.init
        };

        if size % id.alignment() != 0 {
            debug!(
                target: "dma",
                channel = id.name(),
                size,
                align = id.alignment(),
                "read size not a multiple of the alignment unit"
            );
        }
        debug!(
            target: "dma",
            channel = id.name(),
            base = format_args!("{base:08x}"),
            size,
            "block read from memory"
        );

        buf.clear();
        for i in 0..size {
            match host.read(base.wrapping_add(i as u32)) {
                Ok(byte) => buf.push(byte),
                Err(err) => {
                    warn!(target: "dma", channel = id.name(), %err, "bus error during block read");
                    channel.csr.fault();
                    return buf.len();
                }
            }
        }

        channel.csr.complete = true;
        channel.csr.single_update = true;
        if let Some(line) = id.interrupt() {
            host.set_interrupt(line);
        }
        size
    }

    /// Device has data: copy `data` into the channel's buffer.
    ///
    /// When `init` is set and the block doesn't fit in `[init, limit)`, the
    /// remainder wraps to `start`. Afterwards the saved pointers describe
    /// the block just written, and the live pointers reload from
    /// `start`/`stop` unless chaining is armed. Ethernet receive always
    /// reloads.
    pub fn memory_write<H>(&mut self, host: &mut H, id: ChannelId, data: &[u8])
    where
        H: Bus + InterruptController,
    {
        let channel = &mut self.channels[id.index()];

        if data.len() % id.alignment() != 0 {
            debug!(
                target: "dma",
                channel = id.name(),
                size = data.len(),
                align = id.alignment(),
                "write size not a multiple of the alignment unit"
            );
        }

        let base;
        let mut head = data;
        let mut tail: &[u8] = &[];
        if channel.init == 0 {
            base = channel.next;
        } else {
            base = channel.init;
            let room = channel.limit.wrapping_sub(channel.init) as usize;
            if data.len() > room {
                (head, tail) = data.split_at(room);
                warn!(target: "dma", channel = id.name(), residual = tail.len(), "residual bytes");
            }
        }

        debug!(
            target: "dma",
            channel = id.name(),
            base = format_args!("{base:08x}"),
            size = head.len(),
            "block write to memory"
        );
        let mut written = Ok(());
        for (i, &byte) in head.iter().enumerate() {
            written = host.write(base.wrapping_add(i as u32), byte);
            if written.is_err() {
                break;
            }
        }
        if written.is_ok() && !tail.is_empty() {
            let start = channel.start;
            debug!(
                target: "dma",
                channel = id.name(),
                start = format_args!("{start:08x}"),
                size = tail.len(),
                "write residual bytes"
            );
            for (i, &byte) in tail.iter().enumerate() {
                written = host.write(start.wrapping_add(i as u32), byte);
                if written.is_err() {
                    break;
                }
            }
        }
        if let Err(err) = written {
            warn!(target: "dma", channel = id.name(), %err, "bus error during block write");
            channel.csr.fault();
            return;
        }
        debug!(target: "dma", channel = id.name(), head = ?&data[..data.len().min(4)], "written");

        channel.init = 0;
        // ROM and NetBSD both derive the received packet length from these.
        channel.saved_next = channel.next;
        channel.saved_limit = channel.next.wrapping_add(data.len() as u32);

        // TODO: check Ethernet receive reload against hardware; it ignores
        // chaining here.
        if !channel.csr.single_update || id == ChannelId::EnRx {
            channel.reload();
        }

        channel.csr.complete = true;
        if let Some(line) = id.interrupt() {
            host.set_interrupt(line);
        }
    }
}
