use std::fmt;
use std::str::FromStr;

use super::scoring::AxisScores;
use super::{Axis, Pole};

/// A four-letter type such as `ENFJ`, one pole per axis in EI, SN, TF, JP order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeCode([Pole; 4]);

impl TypeCode {
    pub const ISTJ: TypeCode = TypeCode([Pole::I, Pole::S, Pole::T, Pole::J]);

    /// Builds a code from one resolved pole per axis.
    pub fn from_fn(mut pick: impl FnMut(Axis) -> Pole) -> Self {
        Self(Axis::ALL.map(|axis| {
            let pole = pick(axis);
            debug_assert_eq!(pole.axis(), axis);
            pole
        }))
    }

    pub fn pole(&self, axis: Axis) -> Pole {
        self.0[axis.index()]
    }

    pub fn poles(&self) -> [Pole; 4] {
        self.0
    }
}

/// Resolves each axis independently: values >= 0 pick the positive pole (E/S/T/J),
/// so an exact tie always lands on the positive pole.
pub fn resolve_type(axis_scores: &AxisScores) -> TypeCode {
    TypeCode::from_fn(|axis| {
        if axis_scores.get(axis) >= 0 {
            axis.positive()
        } else {
            axis.negative()
        }
    })
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pole in self.0 {
            write!(f, "{pole}")?;
        }
        Ok(())
    }
}

impl FromStr for TypeCode {
    type Err = TypeCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars = s.chars().collect::<Vec<_>>();
        if chars.len() != 4 {
            return Err(TypeCodeError::Length(chars.len()));
        }
        let mut poles = [Pole::E; 4];
        for (slot, (axis, c)) in poles.iter_mut().zip(Axis::ALL.into_iter().zip(chars)) {
            let pole = Pole::from_char(c.to_ascii_uppercase()).ok_or(TypeCodeError::UnknownLetter(c))?;
            if pole.axis() != axis {
                return Err(TypeCodeError::WrongAxis { axis, pole });
            }
            *slot = pole;
        }
        Ok(Self(poles))
    }
}

impl TryFrom<String> for TypeCode {
    type Error = TypeCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeCode> for String {
    fn from(value: TypeCode) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCodeError {
    Length(usize),
    UnknownLetter(char),
    WrongAxis { axis: Axis, pole: Pole },
}

impl fmt::Display for TypeCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(len) => write!(f, "type code must have 4 letters, got {len}"),
            Self::UnknownLetter(c) => write!(f, "unknown letter '{c}' in type code"),
            Self::WrongAxis { axis, pole } => {
                write!(f, "letter {pole} does not belong to axis {axis}")
            }
        }
    }
}

impl std::error::Error for TypeCodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> TypeCode {
        s.parse().unwrap()
    }

    #[test]
    fn zero_axis_resolves_to_positive_pole() {
        assert_eq!(resolve_type(&AxisScores::default()), code("ESTJ"));
    }

    #[test]
    fn each_axis_resolves_independently() {
        let scores = AxisScores::from_values([-1, 3, 0, -6]);
        assert_eq!(resolve_type(&scores), code("ISTP"));
        let scores = AxisScores::from_values([1, -1, -1, 1]);
        assert_eq!(resolve_type(&scores), code("ENFJ"));
    }

    #[test]
    fn parsing_rejects_bad_codes() {
        assert_eq!("EST".parse::<TypeCode>(), Err(TypeCodeError::Length(3)));
        assert_eq!("ESXJ".parse::<TypeCode>(), Err(TypeCodeError::UnknownLetter('X')));
        assert_eq!(
            "SETJ".parse::<TypeCode>(),
            Err(TypeCodeError::WrongAxis { axis: Axis::EI, pole: Pole::S })
        );
        assert_eq!("infp".parse::<TypeCode>(), Ok(code("INFP")));
    }

    #[test]
    fn serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&code("INTP")).unwrap(), "\"INTP\"");
        assert!(serde_json::from_str::<TypeCode>("\"IXTP\"").is_err());
    }
}
