//! Color Palette
//!
//! Colors are single bits of a fixed-width mask. Zones that overlap never
//! share a color, so the set of zones an agent stands in always fits in one
//! `ColorMask`.

use std::fmt;

/// Number of distinct colors available to a build.
pub const PALETTE_SIZE: usize = 32;

/// One palette slot. Exactly one bit is set; the empty color is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// Returns the color for a palette slot, or `None` past the palette end.
    pub fn from_slot(slot: usize) -> Option<Color> {
        if slot < PALETTE_SIZE {
            Some(Color(1 << slot))
        } else {
            None
        }
    }

    /// Palette slot of this color.
    pub fn slot(self) -> usize {
        self.0.trailing_zeros() as usize
    }

    pub fn bit(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "color_{}", self.slot())
    }
}

/// A set of palette colors packed into a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorMask(u32);

impl ColorMask {
    pub const EMPTY: ColorMask = ColorMask(0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, color: Color) {
        self.0 |= color.bit();
    }

    pub fn remove(&mut self, color: Color) {
        self.0 &= !color.bit();
    }

    pub fn contains(self, color: Color) -> bool {
        self.0 & color.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: ColorMask) -> ColorMask {
        ColorMask(self.0 | other.0)
    }

    /// Lowest color not in the set, or `None` when the palette is exhausted.
    pub fn first_free(self) -> Option<Color> {
        Color::from_slot((!self.0).trailing_zeros() as usize)
    }

    /// Iterates the member colors from the lowest slot up.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let bit = rest & rest.wrapping_neg();
            rest &= !bit;
            Some(Color(bit))
        })
    }
}

impl FromIterator<Color> for ColorMask {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut mask = ColorMask::EMPTY;
        for color in iter {
            mask.insert(color);
        }
        mask
    }
}
