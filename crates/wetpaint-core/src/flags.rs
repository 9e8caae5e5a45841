//! Particle and group behavior flags
//!
//! Plain bit sets over `u32`. Group flag equality is what decides whether
//! two strokes may be merged into one group, so both types compare by value.

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = Self($bit);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

flag_set! {
    /// Per-particle behavior
    ParticleFlags {
        /// Plain fluid particle (no bits set)
        WATER = 0,
        /// Immovable particle
        WALL = 1 << 2,
        /// Mixes its color with touching particles
        COLOR_MIXING = 1 << 8,
        /// Stops fast particles tunnelling through the stroke
        BARRIER = 1 << 16,
    }
}

flag_set! {
    /// Per-group behavior
    GroupFlags {
        /// Group particles keep their shape against pressure
        SOLID = 1 << 0,
        /// Group particles move as one rigid body
        RIGID = 1 << 1,
        /// Group survives losing all of its particles
        CAN_BE_EMPTY = 1 << 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_union_and_contains() {
        let flags = ParticleFlags::WALL | ParticleFlags::BARRIER;
        assert!(flags.contains(ParticleFlags::WALL));
        assert!(flags.contains(ParticleFlags::BARRIER));
        assert!(!flags.contains(ParticleFlags::COLOR_MIXING));
        assert!(flags.contains(ParticleFlags::WATER));
    }

    #[test]
    fn test_group_flag_equality() {
        let a = GroupFlags::SOLID | GroupFlags::CAN_BE_EMPTY;
        let b = GroupFlags::CAN_BE_EMPTY | GroupFlags::SOLID;
        assert_eq!(a, b);
        assert_ne!(a, GroupFlags::CAN_BE_EMPTY);
        assert!(a.intersects(GroupFlags::SOLID));
    }
}
