//! Generic register abstractions for type-safe event select programming
//!
//! A [`FieldSpec`] names one bit range inside one register. Event tables,
//! the table validator and the encoder all go through the same accessors,
//! so what a table claims and what the encoder writes cannot drift apart.

use thiserror::Error;

/// Largest register index a field may target (primary + auxiliary slots)
pub const MAX_REGISTERS: usize = 8;

/// Errors raised while placing values into register fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("value 0x{value:x} does not fit in {width}-bit field")]
    ValueOverflow { value: u64, width: u32 },

    #[error("invalid field geometry: offset {offset}, width {width}")]
    BadGeometry { offset: u8, width: u8 },

    #[error("field targets register {index}, beyond the {capacity} available")]
    NoSuchRegister { index: usize, capacity: usize },
}

/// Which register of an encoding a field lives in
///
/// `Primary` is the event select register itself. Auxiliary registers hold
/// extra qualifiers some events need (filters, extended selectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegisterTarget {
    Primary,
    Auxiliary(u8),
}

impl RegisterTarget {
    /// Position of this register in an encoded value list
    pub const fn index(self) -> usize {
        match self {
            RegisterTarget::Primary => 0,
            RegisterTarget::Auxiliary(slot) => 1 + slot as usize,
        }
    }
}

/// A bit range inside one register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub target: RegisterTarget,
    pub offset: u8,
    pub width: u8,
}

impl FieldSpec {
    pub const fn primary(offset: u8, width: u8) -> Self {
        Self {
            target: RegisterTarget::Primary,
            offset,
            width,
        }
    }

    pub const fn auxiliary(slot: u8, offset: u8, width: u8) -> Self {
        Self {
            target: RegisterTarget::Auxiliary(slot),
            offset,
            width,
        }
    }

    /// Single-bit field in the primary register
    pub const fn bit(offset: u8) -> Self {
        Self::primary(offset, 1)
    }

    /// Check that the field lies within a 64-bit register
    pub fn check(&self) -> Result<(), FieldError> {
        if self.width == 0 || self.width > 64 || self.offset as u32 + self.width as u32 > 64 {
            return Err(FieldError::BadGeometry {
                offset: self.offset,
                width: self.width,
            });
        }
        if self.target.index() >= MAX_REGISTERS {
            return Err(FieldError::NoSuchRegister {
                index: self.target.index(),
                capacity: MAX_REGISTERS,
            });
        }
        Ok(())
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Mask of the field's bits within its register, empty when out of range
    pub const fn mask(&self) -> u64 {
        match self.max_value().checked_shl(self.offset as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }

    pub const fn fits(&self, value: u64) -> bool {
        value <= self.max_value()
    }

    /// Two fields overlap when they share a register and at least one bit
    pub fn overlaps(&self, other: &FieldSpec) -> bool {
        self.target == other.target && self.mask() & other.mask() != 0
    }

    /// Place `value` into `reg`, clearing whatever the field held before
    pub fn insert(&self, reg: u64, value: u64) -> Result<u64, FieldError> {
        self.check()?;
        if !self.fits(value) {
            return Err(FieldError::ValueOverflow {
                value,
                width: self.width as u32,
            });
        }
        Ok((reg & !self.mask()) | (value << self.offset))
    }

    pub const fn extract(&self, reg: u64) -> u64 {
        match reg.checked_shr(self.offset as u32) {
            Some(shifted) => shifted & self.max_value(),
            None => 0,
        }
    }
}

/// A logical value scattered over several fields, low bits first
///
/// AMD64 event selects are 12 bits wide but live in bits 0-7 and 32-35 of
/// the select register, which is the canonical user of this type.
#[derive(Debug, Clone, Copy)]
pub struct SplitField<'a> {
    pub pieces: &'a [FieldSpec],
}

impl<'a> SplitField<'a> {
    pub const fn new(pieces: &'a [FieldSpec]) -> Self {
        Self { pieces }
    }

    /// Total logical width
    pub fn width(&self) -> u32 {
        self.pieces.iter().map(|p| p.width as u32).sum()
    }

    pub fn max_value(&self) -> u64 {
        match self.width() {
            0 => 0,
            w if w >= 64 => u64::MAX,
            w => (1u64 << w) - 1,
        }
    }

    pub fn fits(&self, value: u64) -> bool {
        value <= self.max_value()
    }

    /// Scatter `value` into `regs`, indexed by register target
    pub fn insert(&self, regs: &mut [u64], value: u64) -> Result<(), FieldError> {
        if !self.fits(value) {
            return Err(FieldError::ValueOverflow {
                value,
                width: self.width(),
            });
        }

        let capacity = regs.len();
        let mut rest = value;
        for piece in self.pieces {
            let index = piece.target.index();
            let slot = regs
                .get_mut(index)
                .ok_or(FieldError::NoSuchRegister { index, capacity })?;
            *slot = piece.insert(*slot, rest & piece.max_value())?;
            rest = rest.checked_shr(piece.width as u32).unwrap_or(0);
        }
        Ok(())
    }

    /// Reassemble the logical value from `regs`
    pub fn extract(&self, regs: &[u64]) -> u64 {
        let mut value = 0u64;
        let mut shift = 0u32;
        for piece in self.pieces {
            let reg = regs.get(piece.target.index()).copied().unwrap_or(0);
            value |= piece.extract(reg).checked_shl(shift).unwrap_or(0);
            shift += piece.width as u32;
        }
        value
    }
}

/// Trait for register layouts that can be converted to/from raw values
///
/// This provides a structured view over the 64-bit values produced by the
/// encoder, mainly for decoding and display.
///
/// # Example
///
/// ```ignore
/// use pmuflow_raw::register::RegisterLayout;
///
/// #[derive(Debug, Default)]
/// struct MyControl {
///     enable: bool,
///     threshold: u8,
/// }
///
/// impl RegisterLayout for MyControl {
///     fn to_raw(&self) -> u64 {
///         (if self.enable { 1 } else { 0 })
///             | ((self.threshold as u64) << 8)
///     }
///
///     fn from_raw(value: u64) -> Self {
///         Self {
///             enable: (value & 1) != 0,
///             threshold: ((value >> 8) & 0xFF) as u8,
///         }
///     }
/// }
/// ```
pub trait RegisterLayout: Sized {
    /// Convert this register layout to a raw register value
    fn to_raw(&self) -> u64;

    /// Parse a raw register value into this register layout
    fn from_raw(value: u64) -> Self;

    /// Validate that the register values are within acceptable ranges
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_insert_extract() {
        let field = FieldSpec::primary(8, 8);
        let reg = field.insert(0xFFFF_0000_00FF, 0xA5).unwrap();
        assert_eq!(reg, 0xFFFF_0000_A5FF);
        assert_eq!(field.extract(reg), 0xA5);
    }

    #[test]
    fn test_field_rejects_overflow() {
        let field = FieldSpec::primary(24, 8);
        assert_eq!(
            field.insert(0, 0x100),
            Err(FieldError::ValueOverflow {
                value: 0x100,
                width: 8
            })
        );
    }

    #[test]
    fn test_field_geometry() {
        assert!(FieldSpec::primary(60, 4).check().is_ok());
        assert!(FieldSpec::primary(61, 4).check().is_err());
        assert!(FieldSpec::primary(0, 0).check().is_err());
        assert!(FieldSpec::primary(0, 64).check().is_ok());
        assert_eq!(FieldSpec::primary(0, 64).max_value(), u64::MAX);
    }

    #[test]
    fn test_out_of_range_field_is_rejected() {
        let field = FieldSpec::primary(70, 1);
        assert_eq!(field.mask(), 0);
        assert_eq!(field.extract(u64::MAX), 0);
        assert_eq!(
            field.insert(0, 1),
            Err(FieldError::BadGeometry {
                offset: 70,
                width: 1
            })
        );
    }

    #[test]
    fn test_overlap_requires_same_register() {
        let a = FieldSpec::primary(0, 8);
        let b = FieldSpec::primary(7, 2);
        let c = FieldSpec::auxiliary(0, 0, 8);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!b.overlaps(&FieldSpec::primary(9, 1)));
    }

    #[test]
    fn test_split_field_scatter_gather() {
        const PIECES: &[FieldSpec] = &[FieldSpec::primary(0, 8), FieldSpec::primary(32, 4)];
        let split = SplitField::new(PIECES);
        assert_eq!(split.width(), 12);

        let mut regs = [0u64; 1];
        split.insert(&mut regs, 0x1D6).unwrap();
        assert_eq!(regs[0], 0x1_0000_00D6);
        assert_eq!(split.extract(&regs), 0x1D6);

        assert!(split.insert(&mut regs, 0x1000).is_err());
    }

    #[test]
    fn test_split_field_missing_register() {
        const PIECES: &[FieldSpec] = &[FieldSpec::auxiliary(0, 0, 8)];
        let mut regs = [0u64; 1];
        assert_eq!(
            SplitField::new(PIECES).insert(&mut regs, 1),
            Err(FieldError::NoSuchRegister {
                index: 1,
                capacity: 1
            })
        );
    }
}
