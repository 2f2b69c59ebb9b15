use std::fmt;

use thiserror::Error;

/// The scalar types a `field` member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Integer,
    Float,
    Double,
    Boolean,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Boolean => "boolean",
            ScalarKind::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {text:?} as {kind}")]
pub struct CoercionError {
    pub kind: ScalarKind,
    pub text: String,
}

/// A Rust type that field text can be coerced into.
pub trait Scalar: Sized + 'static {
    const KIND: ScalarKind;

    fn coerce(text: &str) -> Result<Self, CoercionError>;
}

fn numeric<N: std::str::FromStr>(text: &str, kind: ScalarKind) -> Result<N, CoercionError> {
    text.trim().parse().map_err(|_| CoercionError {
        kind,
        text: text.to_string(),
    })
}

macro_rules! numeric_scalar {
    ($kind:expr => $($ty:ty),+) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = $kind;

                fn coerce(text: &str) -> Result<Self, CoercionError> {
                    numeric(text, $kind)
                }
            }
        )+
    };
}

numeric_scalar!(ScalarKind::Integer => i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
numeric_scalar!(ScalarKind::Float => f32);
numeric_scalar!(ScalarKind::Double => f64);

/// Only a case-insensitive `"true"` is true; any other text is false.
impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn coerce(text: &str) -> Result<Self, CoercionError> {
        Ok(text.eq_ignore_ascii_case("true"))
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn coerce(text: &str) -> Result<Self, CoercionError> {
        Ok(text.to_string())
    }
}
