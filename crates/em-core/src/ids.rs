use core::fmt;
use core::num::NonZeroU32;

/// Handle to a property inside one `Structure`.
///
/// Carries the issuing structure's owner token next to the 0-based insertion
/// index, so a handle from another structure is recognised as foreign even
/// when its index is in range. The index is stored as `index + 1`, which keeps
/// `Option<PropertyId>` the same size, and doubles as the `ID` attribute in
/// geometry files.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId {
    owner: u32,
    slot: NonZeroU32,
}

impl PropertyId {
    /// `None` once the index no longer fits.
    pub fn new(owner: u32, index: u32) -> Option<Self> {
        let slot = index.checked_add(1).and_then(NonZeroU32::new)?;
        Some(Self { owner, slot })
    }

    pub fn owner(self) -> u32 {
        self.owner
    }

    pub fn index(self) -> u32 {
        self.slot.get() - 1
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({}@{})", self.index(), self.owner)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
