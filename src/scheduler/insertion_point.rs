use std::cmp::Ordering;
use std::fmt;

/// A position in the ordered list of rendering operations of a frame.
///
/// Points are ordered by [`InsertionPoint::order`]; the numeric values leave room between
/// consecutive points so hosts can interleave their own passes.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InsertionPoint {
    /// Before anything is drawn.
    BeforeRendering,
    /// Before shadow maps are drawn.
    BeforeRenderingShadows,
    /// After shadow maps are drawn.
    AfterRenderingShadows,
    /// Before depth/normal pre-passes.
    BeforeRenderingPrePasses,
    /// After depth/normal pre-passes.
    AfterRenderingPrePasses,
    /// Before opaque geometry.
    BeforeRenderingOpaques,
    /// After opaque geometry.
    AfterRenderingOpaques,
    /// Before the sky box.
    BeforeRenderingSkybox,
    /// After the sky box.
    AfterRenderingSkybox,
    /// Before transparent geometry.
    BeforeRenderingTransparents,
    /// After transparent geometry.
    AfterRenderingTransparents,
    /// Before the host's own post-processing stack.
    BeforeRenderingPostProcessing,
    /// After the host's own post-processing stack.
    AfterRenderingPostProcessing,
    /// After everything else.
    AfterRendering,
}

impl InsertionPoint {
    /// Every insertion point, in frame order.
    pub const ALL: [InsertionPoint; 14] = [
        InsertionPoint::BeforeRendering,
        InsertionPoint::BeforeRenderingShadows,
        InsertionPoint::AfterRenderingShadows,
        InsertionPoint::BeforeRenderingPrePasses,
        InsertionPoint::AfterRenderingPrePasses,
        InsertionPoint::BeforeRenderingOpaques,
        InsertionPoint::AfterRenderingOpaques,
        InsertionPoint::BeforeRenderingSkybox,
        InsertionPoint::AfterRenderingSkybox,
        InsertionPoint::BeforeRenderingTransparents,
        InsertionPoint::AfterRenderingTransparents,
        InsertionPoint::BeforeRenderingPostProcessing,
        InsertionPoint::AfterRenderingPostProcessing,
        InsertionPoint::AfterRendering,
    ];

    /// Numeric position of this point in the frame.
    pub fn order(self) -> u32 {
        match self {
            InsertionPoint::BeforeRendering => 0,
            InsertionPoint::BeforeRenderingShadows => 50,
            InsertionPoint::AfterRenderingShadows => 100,
            InsertionPoint::BeforeRenderingPrePasses => 150,
            InsertionPoint::AfterRenderingPrePasses => 200,
            InsertionPoint::BeforeRenderingOpaques => 250,
            InsertionPoint::AfterRenderingOpaques => 300,
            InsertionPoint::BeforeRenderingSkybox => 350,
            InsertionPoint::AfterRenderingSkybox => 400,
            InsertionPoint::BeforeRenderingTransparents => 450,
            InsertionPoint::AfterRenderingTransparents => 500,
            InsertionPoint::BeforeRenderingPostProcessing => 550,
            InsertionPoint::AfterRenderingPostProcessing => 600,
            InsertionPoint::AfterRendering => 1000,
        }
    }
}

impl PartialOrd for InsertionPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InsertionPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order().cmp(&other.order())
    }
}

impl fmt::Display for InsertionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
