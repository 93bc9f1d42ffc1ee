//! Per-revision register layout.
//!
//! The two controller revisions disagree on where the opcode goes, how a
//! command is started and where BUSY is reported. Everything that differs
//! is confined to this module; the engine only calls the methods below.
//!
//!   v1: opcode in CTRL0[7:0], start with CTRL0.EXEC, BUSY in CTRL0[31]
//!   v2: opcode in OPCODE, start with CMD_TRIGGER.EXECUTE, BUSY in STATUS[31]
//!   v2 also needs chip select dropped by hand after each message

use crate::error::Error;
use crate::regs::{self, Registers};

/// Raw tag for the first revision.
pub const TAG_V1: u32 = 1;
/// Raw tag for the second revision.
pub const TAG_V2: u32 = 2;

/// Where to look for the busy flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BusyStatus {
    pub offset: usize,
    pub mask: u32,
}

/// Register layout of one controller revision, fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VersionPolicy {
    V1,
    V2,
    /// A tag this driver does not know. Every operation fails.
    Unknown(u32),
}

impl VersionPolicy {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            TAG_V1 => VersionPolicy::V1,
            TAG_V2 => VersionPolicy::V2,
            other => VersionPolicy::Unknown(other),
        }
    }

    /// Map a firmware hardware ID to a revision.
    pub fn from_acpi_hid(hid: &str) -> Self {
        match hid {
            "AMDI0061" => VersionPolicy::V1,
            "AMDI0062" => VersionPolicy::V2,
            _ => VersionPolicy::Unknown(0),
        }
    }

    pub fn tag(&self) -> u32 {
        match *self {
            VersionPolicy::V1 => TAG_V1,
            VersionPolicy::V2 => TAG_V2,
            VersionPolicy::Unknown(tag) => tag,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, VersionPolicy::Unknown(_))
    }

    pub fn set_opcode<R: Registers>(&self, win: &mut R, opcode: u8) -> Result<(), Error> {
        match self {
            VersionPolicy::V1 => {
                win.set_clear32(regs::CTRL0, u32::from(opcode), regs::CTRL0_OPCODE_MASK);
                Ok(())
            }
            VersionPolicy::V2 => {
                win.write8(regs::OPCODE, opcode);
                Ok(())
            }
            VersionPolicy::Unknown(_) => Err(Error::UnsupportedVersion),
        }
    }

    pub fn trigger_execute<R: Registers>(&self, win: &mut R) -> Result<(), Error> {
        match self {
            VersionPolicy::V1 => {
                win.set_clear32(regs::CTRL0, regs::CTRL0_EXEC, regs::CTRL0_EXEC);
                Ok(())
            }
            VersionPolicy::V2 => {
                win.set_clear8(
                    regs::CMD_TRIGGER,
                    regs::CMD_TRIGGER_EXECUTE,
                    regs::CMD_TRIGGER_EXECUTE,
                );
                Ok(())
            }
            VersionPolicy::Unknown(_) => Err(Error::UnsupportedVersion),
        }
    }

    pub fn busy_status(&self) -> Result<BusyStatus, Error> {
        match self {
            VersionPolicy::V1 => Ok(BusyStatus {
                offset: regs::CTRL0,
                mask: regs::CTRL0_BUSY,
            }),
            VersionPolicy::V2 => Ok(BusyStatus {
                offset: regs::STATUS,
                mask: regs::STATUS_BUSY,
            }),
            VersionPolicy::Unknown(_) => Err(Error::UnsupportedVersion),
        }
    }

    /// Whether chip select has to be dropped explicitly once a message ends.
    pub fn deasserts_chip_select(&self) -> bool {
        matches!(self, VersionPolicy::V2)
    }
}
