//! Handles, target descriptors and scratch buffer bookkeeping.

pub use crate::resource::handles::{ScratchHandle, ShaderHandle, TargetId, TextureHandle};
pub use crate::resource::scratch_pool::{Acquired, ScratchKey, ScratchPool, ScratchStats};
pub use crate::resource::target_descriptor::{ColorFormat, FilterMode, TargetDescriptor};

mod handles;
mod scratch_pool;
mod target_descriptor;
