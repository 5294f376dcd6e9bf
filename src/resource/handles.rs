//! Opaque handles exchanged with render devices.

use std::fmt;

/// A shader program registered on a render device.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ShaderHandle(pub u32);

/// A texture asset registered on a render device.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TextureHandle(pub u32);

/// A temporary color buffer handed out by a scratch allocator.
///
/// The handle is only valid between the `acquire_scratch` call that returned it and the
/// matching `release_scratch`.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScratchHandle(pub(crate) u32);

impl ScratchHandle {
    /// The render target backed by this scratch buffer.
    #[inline]
    pub fn target(self) -> TargetId {
        TargetId::Scratch(self)
    }

    /// The raw slot index of this handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Identity of a color render target.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetId {
    /// A color target owned by the host (typically a camera color buffer).
    Color(u32),
    /// A scratch buffer.
    Scratch(ScratchHandle),
}

impl From<ScratchHandle> for TargetId {
    #[inline]
    fn from(handle: ScratchHandle) -> Self {
        TargetId::Scratch(handle)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Color(id) => write!(f, "color#{}", id),
            TargetId::Scratch(h) => write!(f, "scratch#{}", h.0),
        }
    }
}
