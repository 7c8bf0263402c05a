//! Shared scalar aliases and sentinels

/// Document number as stored in the posting lists.
pub type DocNo = u32;

/// Zero-based word index within a field value.
pub type Position = u32;

/// Zero-based slot index within one of the slotted files.
pub type SlotNo = u32;

/// Link sentinel meaning "no slot".
pub const NIL: u32 = 0xFFFF_FFFF;
