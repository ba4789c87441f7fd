//! Field kinds and their platform input types.
//!
//! `FieldKind` is the single definition shared by the filter pipeline, the
//! wire format and the platform input-type table. The integer values are what
//! crosses the engine boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// What kind of value a text field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form text, no filtering
    #[default]
    Text,
    /// Whole numbers
    Integer,
    /// Whole numbers without sign
    UnsignedInteger,
    /// Decimal numbers with optional leading sign
    Float,
    /// Decimal numbers without sign
    UnsignedFloat,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Text,
        FieldKind::Integer,
        FieldKind::UnsignedInteger,
        FieldKind::Float,
        FieldKind::UnsignedFloat,
    ];

    /// Decode the value the engine sends when it opens a session.
    pub fn from_wire(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Text),
            1 => Ok(Self::Integer),
            2 => Ok(Self::UnsignedInteger),
            3 => Ok(Self::Float),
            4 => Ok(Self::UnsignedFloat),
            other => Err(SessionError::InvalidFieldKind(other)),
        }
    }

    /// Value used on the wire.
    pub fn to_wire(self) -> i32 {
        match self {
            Self::Text => 0,
            Self::Integer => 1,
            Self::UnsignedInteger => 2,
            Self::Float => 3,
            Self::UnsignedFloat => 4,
        }
    }

    /// Numeric kinds are typed on a numeric keypad, which delivers digits as
    /// raw key events instead of committed text.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }

    /// Platform input type requested from the IME.
    pub fn input_type(self) -> InputType {
        match self {
            Self::Text => InputType::FreeForm,
            Self::Integer => InputType::SignedNumber,
            Self::UnsignedInteger => InputType::UnsignedNumber,
            Self::Float => InputType::SignedDecimal,
            Self::UnsignedFloat => InputType::UnsignedDecimal,
        }
    }
}

// Android `android.text.InputType` bits.
const TYPE_CLASS_TEXT: u32 = 0x0000_0001;
const TYPE_CLASS_NUMBER: u32 = 0x0000_0002;
const TYPE_NUMBER_FLAG_SIGNED: u32 = 0x0000_1000;
const TYPE_NUMBER_FLAG_DECIMAL: u32 = 0x0000_2000;
const TYPE_TEXT_FLAG_CAP_SENTENCES: u32 = 0x0000_4000;
const TYPE_TEXT_FLAG_AUTO_CORRECT: u32 = 0x0000_8000;

/// Keyboard layout hint handed to the IME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    FreeForm,
    SignedNumber,
    UnsignedNumber,
    SignedDecimal,
    UnsignedDecimal,
}

impl InputType {
    /// Bit pattern for `EditorInfo.inputType` on Android.
    pub fn android_flags(self) -> u32 {
        match self {
            Self::FreeForm => {
                TYPE_CLASS_TEXT | TYPE_TEXT_FLAG_AUTO_CORRECT | TYPE_TEXT_FLAG_CAP_SENTENCES
            }
            Self::SignedNumber => TYPE_CLASS_NUMBER | TYPE_NUMBER_FLAG_SIGNED,
            Self::UnsignedNumber => TYPE_CLASS_NUMBER,
            Self::SignedDecimal => {
                TYPE_CLASS_NUMBER | TYPE_NUMBER_FLAG_DECIMAL | TYPE_NUMBER_FLAG_SIGNED
            }
            Self::UnsignedDecimal => TYPE_CLASS_NUMBER | TYPE_NUMBER_FLAG_DECIMAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_are_stable() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_wire(kind.to_wire()), Ok(kind));
        }
        assert_eq!(FieldKind::Float.to_wire(), 3);
    }

    #[test]
    fn test_unknown_wire_value() {
        assert_eq!(
            FieldKind::from_wire(9),
            Err(SessionError::InvalidFieldKind(9))
        );
        assert!(FieldKind::from_wire(-1).is_err());
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(!FieldKind::Text.is_numeric());
        assert!(FieldKind::UnsignedFloat.is_numeric());
    }

    #[test]
    fn test_android_flags() {
        assert_eq!(FieldKind::UnsignedInteger.input_type().android_flags(), 0x2);
        assert_eq!(FieldKind::Float.input_type().android_flags(), 0x3002);
        assert_eq!(FieldKind::Text.input_type().android_flags(), 0xC001);
    }
}
