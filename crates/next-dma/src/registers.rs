//! Register groups and their offsets from the channel base.
//!
//! The bus routes each access to one of the register handlers; the
//! handler subtracts its group offset from the address to find the
//! channel, the same way the hardware banks repeat per channel.

use crate::channel::ChannelId;

/// A per-channel register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Csr,
    SavedNext,
    SavedLimit,
    SavedStart,
    SavedStop,
    Next,
    Limit,
    Start,
    Stop,
    Init,
    Size,
}

impl Register {
    pub const ALL: [Register; 11] = [
        Register::Csr,
        Register::SavedNext,
        Register::SavedLimit,
        Register::SavedStart,
        Register::SavedStop,
        Register::Next,
        Register::Limit,
        Register::Start,
        Register::Stop,
        Register::Init,
        Register::Size,
    ];

    /// Distance from the channel base (the CSR offset) to this register.
    #[must_use]
    pub const fn group_offset(self) -> u32 {
        match self {
            Register::Csr => 0x0000,
            Register::SavedNext => 0x3FF0,
            Register::SavedLimit => 0x3FF4,
            Register::SavedStart => 0x3FF8,
            Register::SavedStop => 0x3FFC,
            Register::Next => 0x4000,
            Register::Limit => 0x4004,
            Register::Start => 0x4008,
            Register::Stop => 0x400C,
            Register::Init => 0x4200,
            Register::Size => 0x4204,
        }
    }

    /// I/O segment offset of this register for `channel`.
    #[must_use]
    pub const fn offset(self, channel: ChannelId) -> u32 {
        channel.base() + self.group_offset()
    }

    /// Channel owning the access at `address`, if any.
    #[must_use]
    pub fn channel_at(self, address: u32) -> Option<ChannelId> {
        ChannelId::from_offset(address.wrapping_sub(self.group_offset()))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Register::Csr => "csr",
            Register::SavedNext => "saved_next",
            Register::SavedLimit => "saved_limit",
            Register::SavedStart => "saved_start",
            Register::SavedStop => "saved_stop",
            Register::Next => "next",
            Register::Limit => "limit",
            Register::Start => "start",
            Register::Stop => "stop",
            Register::Init => "init",
            Register::Size => "size",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}
