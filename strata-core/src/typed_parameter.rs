use crate::Value;
use std::fmt::{self, Display};

/// How a parameter is handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    String,
    Integer,
    Boolean,
    LargeObject,
    Null,
}

impl BindType {
    /// Default bind type for a value: anything without a more specific
    /// representation travels as a string.
    pub fn of(value: &Value) -> BindType {
        match value {
            v if v.is_null() => BindType::Null,
            Value::Boolean(..) => BindType::Boolean,
            Value::Int32(..) | Value::Int64(..) => BindType::Integer,
            Value::Blob(..) => BindType::LargeObject,
            _ => BindType::String,
        }
    }
}

impl Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindType::String => "string",
            BindType::Integer => "integer",
            BindType::Boolean => "boolean",
            BindType::LargeObject => "lob",
            BindType::Null => "null",
        })
    }
}

/// A value tagged with the bind type the driver must use for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedParameter {
    value: Value,
    bind_type: BindType,
    /// Driver specific hint, opaque to the core.
    option: Option<u32>,
    /// Bind type guessed from the value, the connection converter decides.
    inferred: bool,
}

impl TypedParameter {
    /// A NULL value is always bound as [`BindType::Null`], whatever was requested.
    pub fn new(value: Value, bind_type: BindType) -> Self {
        let bind_type = if value.is_null() {
            BindType::Null
        } else {
            bind_type
        };
        Self {
            value,
            bind_type,
            option: None,
            inferred: false,
        }
    }

    pub fn string(value: impl Into<Value>) -> Self {
        Self::new(value.into(), BindType::String)
    }

    pub fn with_option(mut self, option: u32) -> Self {
        self.option = Some(option);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn bind_type(&self) -> BindType {
        self.bind_type
    }

    pub fn option(&self) -> Option<u32> {
        self.option
    }

    /// True when built straight from a [`Value`] rather than by a converter
    /// or with an explicit bind type.
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for TypedParameter {
    fn from(value: Value) -> Self {
        let bind_type = BindType::of(&value);
        Self {
            inferred: true,
            ..Self::new(value, bind_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BindType, TypedParameter};
    use crate::Value;

    #[test]
    fn null_forces_null_bind_type() {
        let parameter = TypedParameter::new(Value::Int64(None), BindType::Integer);
        assert_eq!(parameter.bind_type(), BindType::Null);
        let parameter = TypedParameter::string(Value::Varchar(None));
        assert_eq!(parameter.bind_type(), BindType::Null);
    }

    #[test]
    fn inferred_bind_types() {
        assert_eq!(
            TypedParameter::from(Value::Int32(Some(3))).bind_type(),
            BindType::Integer
        );
        assert_eq!(
            TypedParameter::from(Value::Blob(Some([1u8, 2].into()))).bind_type(),
            BindType::LargeObject
        );
        assert_eq!(
            TypedParameter::from(Value::Float64(Some(1.5))).bind_type(),
            BindType::String
        );
    }

    #[test]
    fn inferred_only_from_plain_values() {
        assert!(TypedParameter::from(Value::Boolean(Some(true))).is_inferred());
        assert!(!TypedParameter::new(Value::Boolean(Some(true)), BindType::Boolean).is_inferred());
        assert!(!TypedParameter::string("a").is_inferred());
    }
}
