//! Capability flags declared by every filter and checked by the runner.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Serialize, Serializer};

use crate::image::PixelKind;

/// Set of capability tags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u16);

impl Capabilities {
    /// Accepts 8-bit integer images.
    pub const EIGHT_BIT: Capabilities = Capabilities(1 << 0);
    /// Accepts 16-bit and 32-bit integer images.
    pub const SIXTEEN_BIT: Capabilities = Capabilities(1 << 1);
    /// Accepts floating point images.
    pub const FLOAT: Capabilities = Capabilities(1 << 2);
    /// Accepts every pixel kind.
    pub const ALL_KINDS: Capabilities = Capabilities(0b111);
    /// Unmasked pixels are restored after apply.
    pub const AUTO_MASK: Capabilities = Capabilities(1 << 3);
    /// The pre-filter snapshot is returned for undo.
    pub const AUTO_SNAPSHOT: Capabilities = Capabilities(1 << 4);
    /// May be re-applied live against one snapshot.
    pub const PREVIEW: Capabilities = Capabilities(1 << 5);
    /// Results need signed, wider-than-storage arithmetic and an explicit cast.
    pub const WIDE_INTERMEDIATE: Capabilities = Capabilities(1 << 6);
    /// Operates on a whole 3D stack via `apply_volume`.
    pub const STACK_3D: Capabilities = Capabilities(1 << 7);

    const NAMES: [(Capabilities, &'static str); 8] = [
        (Capabilities::EIGHT_BIT, "8bit"),
        (Capabilities::SIXTEEN_BIT, "16bit"),
        (Capabilities::FLOAT, "float"),
        (Capabilities::AUTO_MASK, "auto_mask"),
        (Capabilities::AUTO_SNAPSHOT, "auto_snapshot"),
        (Capabilities::PREVIEW, "preview"),
        (Capabilities::WIDE_INTERMEDIATE, "wide_intermediate"),
        (Capabilities::STACK_3D, "stack3d"),
    ];

    pub const fn empty() -> Self {
        Capabilities(0)
    }

    pub const fn union(self, other: Capabilities) -> Self {
        Capabilities(self.0 | other.0)
    }

    /// True when every flag of `other` is set.
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether images of `kind` may be filtered.
    pub fn accepts(self, kind: PixelKind) -> bool {
        let needed = match kind {
            PixelKind::U8 => Capabilities::EIGHT_BIT,
            PixelKind::U16 | PixelKind::I16 | PixelKind::I32 => Capabilities::SIXTEEN_BIT,
            PixelKind::F32 | PixelKind::F64 => Capabilities::FLOAT,
        };
        self.contains(needed)
    }

    /// Tag names of the set flags, kind flags first.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capabilities({})", self.names().join(" | "))
    }
}

impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_union() {
        let caps = Capabilities::ALL_KINDS | Capabilities::PREVIEW;
        assert!(caps.contains(Capabilities::PREVIEW));
        assert!(caps.contains(Capabilities::FLOAT));
        assert!(!caps.contains(Capabilities::STACK_3D));
        assert!(!caps.contains(Capabilities::PREVIEW | Capabilities::AUTO_MASK));
        assert!(caps.contains(Capabilities::empty()));
    }

    #[test]
    fn test_accepts_kind() {
        let caps = Capabilities::EIGHT_BIT | Capabilities::FLOAT;
        assert!(caps.accepts(PixelKind::U8));
        assert!(caps.accepts(PixelKind::F32));
        assert!(!caps.accepts(PixelKind::U16));
        assert!(!caps.accepts(PixelKind::I32));
    }

    #[test]
    fn test_names_and_debug() {
        let caps = Capabilities::ALL_KINDS | Capabilities::STACK_3D;
        assert_eq!(caps.names(), vec!["8bit", "16bit", "float", "stack3d"]);
        assert_eq!(format!("{:?}", Capabilities::PREVIEW), "Capabilities(preview)");
        assert_eq!(
            serde_json::to_string(&Capabilities::AUTO_MASK).unwrap(),
            "[\"auto_mask\"]"
        );
    }
}
