use core::iter::Sum;
use core::ops;

use crate::error::{Error, ErrorKind, Result};

/// BER object length, as defined in X.690 section 8.1.3.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Length {
    /// Definite form (X.690 8.1.3.3): content is exactly this many octets.
    Definite(usize),
    /// Indefinite form (X.690 8.1.3.6): content runs until an EOC marker.
    Indefinite,
}

impl Length {
    /// True if the length is definite and equal to zero.
    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Length::Definite(0)
    }

    /// Return the definite length, or an error if indefinite.
    #[inline]
    pub fn definite(&self) -> Result<usize> {
        match self {
            Length::Definite(sz) => Ok(*sz),
            Length::Indefinite => Err(Error::simple(ErrorKind::IndefiniteLengthUnexpected)),
        }
    }

    #[inline]
    pub const fn is_definite(&self) -> bool {
        matches!(self, Length::Definite(_))
    }
}

impl From<usize> for Length {
    fn from(l: usize) -> Self {
        Length::Definite(l)
    }
}

impl ops::Add<Length> for Length {
    type Output = Self;

    fn add(self, rhs: Length) -> Self::Output {
        match self {
            Length::Indefinite => self,
            Length::Definite(lhs) => match rhs {
                Length::Indefinite => rhs,
                Length::Definite(rhs) => Length::Definite(lhs + rhs),
            },
        }
    }
}

impl ops::Add<usize> for Length {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        match self {
            Length::Definite(lhs) => Length::Definite(lhs + rhs),
            Length::Indefinite => self,
        }
    }
}

impl Sum<Length> for Length {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Length::Definite(0), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_length() {
        let l = Length::from(2);
        assert_eq!(l.definite(), Ok(2));

        let l = Length::Indefinite;
        assert!(l.definite().is_err());

        let l = Length::from(2);
        assert_eq!(l + 2, Length::from(4));
        assert_eq!(l + Length::Indefinite, Length::Indefinite);

        let l = Length::Indefinite;
        assert_eq!(l + 2, Length::Indefinite);
        assert!(l.is_null() == false);
        assert!(Length::Definite(0).is_null());
    }
}
