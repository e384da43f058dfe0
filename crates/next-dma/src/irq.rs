//! DMA interrupt lines.

/// Interrupt status register bits owned by the DMA channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptLine {
    R2mDma,
    M2rDma,
    DspDma,
    SccDma,
    SoundInDma,
    SoundOutDma,
    PrinterDma,
    DiskDma,
    ScsiDma,
    EnRxDma,
    EnTxDma,
}

impl InterruptLine {
    /// Bit in the system interrupt status register.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            InterruptLine::R2mDma => 0x0004_0000,
            InterruptLine::M2rDma => 0x0008_0000,
            InterruptLine::DspDma => 0x0010_0000,
            InterruptLine::SccDma => 0x0020_0000,
            InterruptLine::SoundInDma => 0x0040_0000,
            InterruptLine::SoundOutDma => 0x0080_0000,
            InterruptLine::PrinterDma => 0x0100_0000,
            InterruptLine::DiskDma => 0x0200_0000,
            InterruptLine::ScsiDma => 0x0400_0000,
            InterruptLine::EnRxDma => 0x0800_0000,
            InterruptLine::EnTxDma => 0x1000_0000,
        }
    }
}

/// The system interrupt controller, as far as the DMA engine needs it.
pub trait InterruptController {
    /// Assert `line`.
    fn set_interrupt(&mut self, line: InterruptLine);

    /// Deassert `line`.
    fn release_interrupt(&mut self, line: InterruptLine);
}
