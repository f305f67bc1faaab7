use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a BDD node, with the complement bit stored in the sign.
///
/// Index `0` is never a valid node (it is the sentry cell of the unique
/// table), so `Ref(0)` does not occur in practice.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the index of the referenced node in the unique table.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Non-negative encoding (`2*index + negated`), used for hashing.
    pub const fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) + (self.0 < 0) as u32
    }

    /// Strip the complement bit.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!((-r).regular(), r);
    }

    #[test]
    fn test_unsigned() {
        assert_eq!(Ref::positive(3).unsigned(), 6);
        assert_eq!((-Ref::positive(3)).unsigned(), 7);
        assert_eq!(format!("{}", -Ref::positive(3)), "~@3");
    }
}
