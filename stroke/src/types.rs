//! Identity and attribute types for strokes.

/// A stroke identifier, unique per author session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeId(u32);

impl StrokeId {
    /// Creates a new stroke ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw stroke ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for StrokeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<StrokeId> for u32 {
    fn from(id: StrokeId) -> Self {
        id.0
    }
}

/// The participant that drew a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuthorId(u16);

impl AuthorId {
    /// Creates a new author ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw author ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for AuthorId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Session-wide stroke identity.
///
/// Stroke ids are only unique per author, so the pair is what the spatial
/// index and active-ink set key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeKey {
    pub author: AuthorId,
    pub stroke: StrokeId,
}

impl StrokeKey {
    #[must_use]
    pub const fn new(author: AuthorId, stroke: StrokeId) -> Self {
        Self { author, stroke }
    }
}

/// A brush identifier. Two values are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrushId(u16);

impl BrushId {
    /// The eraser brush. Strokes drawn with it remove ink instead of adding it.
    pub const ERASER: Self = Self(0xFFFF);
    /// Fallback for brushes a renderer does not recognize.
    pub const UNKNOWN: Self = Self(0xFFFE);

    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_eraser(self) -> bool {
        self.0 == Self::ERASER.0
    }

    /// Maps brushes rejected by `known` to [`BrushId::UNKNOWN`].
    ///
    /// The eraser is always kept.
    #[must_use]
    pub fn resolve(self, known: impl Fn(Self) -> bool) -> Self {
        if self.is_eraser() || known(self) {
            self
        } else {
            Self::UNKNOWN
        }
    }
}

/// Packed `0xRRGGBBAA` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba(u32);

impl Rgba {
    pub const BLACK: Self = Self::from_channels(0, 0, 0, 255);

    #[must_use]
    pub const fn from_packed(packed: u32) -> Self {
        Self(packed)
    }

    #[must_use]
    pub const fn from_channels(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    #[must_use]
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Returns `[r, g, b, a]`.
    #[must_use]
    pub const fn channels(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}
