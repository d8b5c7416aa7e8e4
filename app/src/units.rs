use std::fmt;

use err_derive::Error;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Grams in one avoirdupois ounce.
pub const G_PER_OZ: f64 = 28.3495;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Grams,
    Ounces,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitParseError {
    #[error(display = "unknown unit code: {}", _0)]
    UnknownCode(u64),
    #[error(display = "unknown unit: {:?}", _0)]
    UnknownName(String),
}

impl Unit {
    /// The integer tag used in persisted snapshots.
    pub fn code(self) -> u8 {
        match self {
            Unit::Grams => 0,
            Unit::Ounces => 1,
        }
    }

    pub fn from_code(code: u64) -> Result<Self, UnitParseError> {
        match code {
            0 => Ok(Unit::Grams),
            1 => Ok(Unit::Ounces),
            other => Err(UnitParseError::UnknownCode(other)),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Ounces => "oz",
        }
    }

    pub fn to_grams(self, value: f64) -> f64 {
        match self {
            Unit::Grams => value,
            Unit::Ounces => value * G_PER_OZ,
        }
    }

    pub fn to_ounces(self, value: f64) -> f64 {
        match self {
            Unit::Grams => value / G_PER_OZ,
            Unit::Ounces => value,
        }
    }

    pub fn convert(self, value: f64, to: Unit) -> f64 {
        match to {
            Unit::Grams => self.to_grams(value),
            Unit::Ounces => self.to_ounces(value),
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::Grams
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.symbol())
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitParseError;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        match src.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" | "0" => Ok(Unit::Grams),
            "oz" | "ounce" | "ounces" | "1" => Ok(Unit::Ounces),
            _ => Err(UnitParseError::UnknownName(src.to_string())),
        }
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UnitCodeVisitor;
        impl<'vi> de::Visitor<'vi> for UnitCodeVisitor {
            type Value = Unit;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a unit code (0 = grams, 1 = ounces)")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Unit, E> {
                Unit::from_code(value).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Unit, E> {
                if value < 0 {
                    return Err(E::invalid_value(de::Unexpected::Signed(value), &self));
                }
                self.visit_u64(value as u64)
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Unit, E> {
                if value.fract() != 0.0 || value < 0.0 {
                    return Err(E::invalid_value(de::Unexpected::Float(value), &self));
                }
                self.visit_u64(value as u64)
            }
        }

        deserializer.deserialize_u64(UnitCodeVisitor)
    }
}
