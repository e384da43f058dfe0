//! SCSI channel burst engine.
//!
//! The SCSI channel collects bytes from the controller into a 16-byte
//! buffer and writes them to memory a whole burst at a time. Bytes that
//! don't make a full burst (or that don't fit before `limit`) stay in the
//! buffer until the next pass or a flush.

use emu_core::Bus;
use tracing::{debug, warn};

use crate::DmaController;
use crate::DmaHost;
use crate::channel::ChannelId;

/// Bytes per burst.
pub const BURST_SIZE: usize = 16;

/// The storage controller's side of the SCSI DMA handshake.
pub trait StorageDevice {
    /// Whether the device is in its data-in phase with bytes left.
    fn has_data(&self) -> bool;

    /// Produce the next byte. Only called while [`has_data`] is true.
    ///
    /// [`has_data`]: StorageDevice::has_data
    fn pull_byte(&mut self) -> u8;

    /// Recompute the device's DMA status after the buffer was topped up.
    fn refresh_dma_status(&mut self) {}

    /// INITBUF: clear the device's DMA status and transfer counter.
    fn reset_dma_status(&mut self);

    /// A commit pass ended; the device may continue or end its phase.
    fn dma_done(&mut self) {}
}

/// The channel's internal burst buffer.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BurstBuffer {
    bytes: [u8; BURST_SIZE],
    len: usize,
}

impl BurstBuffer {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    fn is_full(&self) -> bool {
        self.len == BURST_SIZE
    }

    fn fill_from<S: StorageDevice + ?Sized>(&mut self, device: &mut S) {
        while self.len < BURST_SIZE && device.has_data() {
            self.bytes[self.len] = device.pull_byte();
            self.len += 1;
        }
    }

    /// Long word at offset `i`, zero-padded past the staged bytes.
    fn long_at(&self, i: usize) -> u32 {
        let mut word = [0u8; 4];
        for (k, byte) in word.iter_mut().enumerate() {
            if i + k < self.len {
                *byte = self.bytes[i + k];
            }
        }
        u32::from_be_bytes(word)
    }

    fn drop_front(&mut self, n: usize) {
        let n = n.min(self.len);
        self.bytes.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

impl DmaController {
    /// Move staged and pending SCSI bytes into memory a burst at a time.
    ///
    /// Called by the SCSI controller when it has data ready, and by the CSR
    /// clear-complete commands on the SCSI channel.
    pub fn storage_commit<H: DmaHost>(&mut self, host: &mut H) {
        let id = ChannelId::Scsi;
        let channel = &mut self.channels[id.index()];
        let staging = &mut self.staging;

        debug!(
            target: "dma",
            next = format_args!("{:08x}", channel.next),
            limit = format_args!("{:08x}", channel.limit),
            staged = staging.len(),
            "scsi burst commit"
        );

        if channel.limit.wrapping_sub(channel.next) % BURST_SIZE as u32 != 0 {
            warn!(
                target: "dma",
                next = format_args!("{:08x}", channel.next),
                limit = format_args!("{:08x}", channel.limit),
                "scsi DMA not aligned to burst size"
            );
        }

        loop {
            staging.fill_from(host);
            host.refresh_dma_status();

            // A burst only goes out whole, so next never passes limit. A
            // misaligned tail is left for storage_flush.
            let room = channel.limit.checked_sub(channel.next).unwrap_or(0);
            if !(staging.is_full() && room >= BURST_SIZE as u32) {
                if !staging.is_empty() {
                    warn!(target: "dma", staged = staging.len(), "residual bytes in DMA buffer");
                }
                break;
            }

            let mut fault = None;
            for i in (0..BURST_SIZE).step_by(4) {
                let address = channel.next.wrapping_add(i as u32);
                if let Err(err) = host.write_long(address, staging.long_at(i)) {
                    fault = Some(err);
                    break;
                }
            }
            if let Some(err) = fault {
                warn!(target: "dma", %err, "bus error during scsi burst");
                channel.csr.fault();
                break;
            }

            channel.next = channel.next.wrapping_add(BURST_SIZE as u32);
            staging.clear();

            if channel.limit.wrapping_sub(channel.next) < BURST_SIZE as u32 {
                break;
            }
        }

        if channel.next == channel.limit {
            if let Some(line) = id.interrupt() {
                host.set_interrupt(line);
            }
            if channel.finish_segment() {
                debug!(target: "dma", "scsi chaining reload");
            }
        }

        host.dma_done();
    }

    /// Write one trailing long word from the burst buffer when a transfer
    /// ends mid-burst.
    pub fn storage_flush<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let channel = &mut self.channels[ChannelId::Scsi.index()];
        let staging = &mut self.staging;

        if channel.next >= channel.limit {
            return;
        }

        debug!(
            target: "dma",
            next = format_args!("{:08x}", channel.next),
            staged = staging.len(),
            "scsi flush"
        );

        match bus.write_long(channel.next, staging.long_at(0)) {
            Ok(()) => {
                channel.next = channel.next.wrapping_add(4);
                staging.drop_front(4);
            }
            Err(err) => {
                warn!(target: "dma", %err, "bus error during scsi flush");
                channel.csr.fault();
            }
        }
    }
}
