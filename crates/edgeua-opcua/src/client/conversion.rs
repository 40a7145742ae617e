// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Host value ↔ OPC UA value conversion.
//!
//! Conversion is driven by the declared [`ValueType`] of a resource. Each
//! supported type has one entry in a static codec table holding its encode
//! and decode functions:
//!
//! ```text
//! ValueType ──► Codec { encode: Value ──► OpcUaValue,
//!                       decode: OpcUaValue ──► Value }
//! ```
//!
//! Encoding (host → server) is strict: the host value must already be of the
//! declared type. Decoding (server → host) is lenient the way the host
//! framework's own casting is: any numeric kind is accepted as long as it fits
//! the declared type, and strings are parsed.
//!
//! `Binary` and `Object` have no codec and always fail with
//! [`ConversionError::Unsupported`].

use edgeua_core::types::{CommandValue, Value, ValueType};

use crate::error::ConversionError;

use super::transport::OpcUaValue;

type EncodeFn = fn(&Value) -> Result<OpcUaValue, ConversionError>;
type DecodeFn = fn(&OpcUaValue) -> Result<Value, ConversionError>;

/// Encode/decode pair for one declared type.
struct Codec {
    value_type: ValueType,
    encode: EncodeFn,
    decode: DecodeFn,
}

const CODECS: &[Codec] = &[
    Codec { value_type: ValueType::Bool, encode: encode_bool, decode: decode_bool },
    Codec { value_type: ValueType::String, encode: encode_string, decode: decode_string },
    Codec { value_type: ValueType::Uint8, encode: encode_u8, decode: decode_u8 },
    Codec { value_type: ValueType::Uint16, encode: encode_u16, decode: decode_u16 },
    Codec { value_type: ValueType::Uint32, encode: encode_u32, decode: decode_u32 },
    Codec { value_type: ValueType::Uint64, encode: encode_u64, decode: decode_u64 },
    Codec { value_type: ValueType::Int8, encode: encode_i8, decode: decode_i8 },
    Codec { value_type: ValueType::Int16, encode: encode_i16, decode: decode_i16 },
    Codec { value_type: ValueType::Int32, encode: encode_i32, decode: decode_i32 },
    Codec { value_type: ValueType::Int64, encode: encode_i64, decode: decode_i64 },
    Codec { value_type: ValueType::Float32, encode: encode_f32, decode: decode_f32 },
    Codec { value_type: ValueType::Float64, encode: encode_f64, decode: decode_f64 },
];

// =============================================================================
// ValueCoercer
// =============================================================================

/// Table-driven coercion between host and OPC UA values.
///
/// # Examples
///
/// ```
/// use edgeua_core::types::{Value, ValueType};
/// use edgeua_opcua::client::{OpcUaValue, ValueCoercer};
///
/// let wire = ValueCoercer::encode(ValueType::Uint16, &Value::UInt16(7)).unwrap();
/// assert_eq!(wire, OpcUaValue::UInt16(7));
///
/// // Servers may answer with a wider type than declared.
/// let host = ValueCoercer::decode(ValueType::Uint16, &OpcUaValue::Int32(7)).unwrap();
/// assert_eq!(host, Value::UInt16(7));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCoercer;

impl ValueCoercer {
    fn codec(value_type: ValueType) -> Result<&'static Codec, ConversionError> {
        CODECS
            .iter()
            .find(|c| c.value_type == value_type)
            .ok_or(ConversionError::Unsupported { value_type })
    }

    /// Returns `true` if the declared type has a codec.
    pub fn is_supported(value_type: ValueType) -> bool {
        Self::codec(value_type).is_ok()
    }

    /// Converts a host value into the OPC UA value for a write.
    pub fn encode(value_type: ValueType, value: &Value) -> Result<OpcUaValue, ConversionError> {
        (Self::codec(value_type)?.encode)(value)
    }

    /// Converts an OPC UA value into a host value of the declared type.
    pub fn decode(value_type: ValueType, value: &OpcUaValue) -> Result<Value, ConversionError> {
        (Self::codec(value_type)?.decode)(value)
    }

    /// Builds a reading for a resource from an OPC UA value.
    pub fn to_command_value(
        resource: &str,
        value_type: ValueType,
        value: &OpcUaValue,
    ) -> Result<CommandValue, ConversionError> {
        let decoded = Self::decode(value_type, value)?;
        Ok(CommandValue::new(resource, value_type, decoded))
    }

    /// Wraps a method parameter as a string argument.
    #[inline]
    pub fn string_argument(parameter: &str) -> OpcUaValue {
        OpcUaValue::String(parameter.to_string())
    }

    /// Maps an OPC UA value to the closest host value without a declared type.
    pub fn to_core_value(value: &OpcUaValue) -> Value {
        match value {
            OpcUaValue::Boolean(v) => Value::Bool(*v),
            OpcUaValue::SByte(v) => Value::Int8(*v),
            OpcUaValue::Byte(v) => Value::UInt8(*v),
            OpcUaValue::Int16(v) => Value::Int16(*v),
            OpcUaValue::UInt16(v) => Value::UInt16(*v),
            OpcUaValue::Int32(v) => Value::Int32(*v),
            OpcUaValue::UInt32(v) => Value::UInt32(*v),
            OpcUaValue::Int64(v) => Value::Int64(*v),
            OpcUaValue::UInt64(v) => Value::UInt64(*v),
            OpcUaValue::Float(v) => Value::Float32(*v),
            OpcUaValue::Double(v) => Value::Float64(*v),
            OpcUaValue::String(v) => Value::String(v.clone()),
            OpcUaValue::DateTime(v) => Value::DateTime(*v),
            OpcUaValue::Guid(v) => Value::String(v.to_string()),
            OpcUaValue::ByteString(v) => Value::Bytes(v.clone()),
            OpcUaValue::Array(items) => Value::Array(items.iter().map(Self::to_core_value).collect()),
            OpcUaValue::Null => Value::Null,
        }
    }
}

// =============================================================================
// Codecs
// =============================================================================

fn encode_bool(value: &Value) -> Result<OpcUaValue, ConversionError> {
    match value {
        Value::Bool(v) => Ok(OpcUaValue::Boolean(*v)),
        other => Err(ConversionError::mismatch(ValueType::Bool, other.type_name())),
    }
}

fn decode_bool(value: &OpcUaValue) -> Result<Value, ConversionError> {
    let mismatch = || ConversionError::mismatch(ValueType::Bool, value.type_name());
    match value {
        OpcUaValue::Boolean(v) => Ok(Value::Bool(*v)),
        OpcUaValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        other => integer_of(other).map(|n| Value::Bool(n != 0)).ok_or_else(mismatch),
    }
}

fn encode_string(value: &Value) -> Result<OpcUaValue, ConversionError> {
    match value {
        Value::String(v) => Ok(OpcUaValue::String(v.clone())),
        other => Err(ConversionError::mismatch(ValueType::String, other.type_name())),
    }
}

fn decode_string(value: &OpcUaValue) -> Result<Value, ConversionError> {
    match value {
        OpcUaValue::String(s) => Ok(Value::String(s.clone())),
        OpcUaValue::Null | OpcUaValue::Array(_) | OpcUaValue::ByteString(_) => {
            Err(ConversionError::mismatch(ValueType::String, value.type_name()))
        }
        scalar => Ok(Value::String(scalar.to_string())),
    }
}

macro_rules! integer_codec {
    ($encode:ident, $decode:ident, $value_type:ident, $variant:ident, $wire:ident, $ty:ty) => {
        fn $encode(value: &Value) -> Result<OpcUaValue, ConversionError> {
            match value {
                Value::$variant(v) => Ok(OpcUaValue::$wire(*v)),
                other => Err(ConversionError::mismatch(ValueType::$value_type, other.type_name())),
            }
        }

        fn $decode(value: &OpcUaValue) -> Result<Value, ConversionError> {
            let wide = integer_of(value)
                .ok_or_else(|| ConversionError::mismatch(ValueType::$value_type, value.type_name()))?;
            <$ty>::try_from(wide)
                .map(Value::$variant)
                .map_err(|_| ConversionError::out_of_range(wide, ValueType::$value_type))
        }
    };
}

integer_codec!(encode_u8, decode_u8, Uint8, UInt8, Byte, u8);
integer_codec!(encode_u16, decode_u16, Uint16, UInt16, UInt16, u16);
integer_codec!(encode_u32, decode_u32, Uint32, UInt32, UInt32, u32);
integer_codec!(encode_u64, decode_u64, Uint64, UInt64, UInt64, u64);
integer_codec!(encode_i8, decode_i8, Int8, Int8, SByte, i8);
integer_codec!(encode_i16, decode_i16, Int16, Int16, Int16, i16);
integer_codec!(encode_i32, decode_i32, Int32, Int32, Int32, i32);
integer_codec!(encode_i64, decode_i64, Int64, Int64, Int64, i64);

fn encode_f32(value: &Value) -> Result<OpcUaValue, ConversionError> {
    match value {
        Value::Float32(v) => Ok(OpcUaValue::Float(*v)),
        other => Err(ConversionError::mismatch(ValueType::Float32, other.type_name())),
    }
}

fn decode_f32(value: &OpcUaValue) -> Result<Value, ConversionError> {
    match value {
        OpcUaValue::Float(v) => Ok(Value::Float32(*v)),
        other => float_of(other)
            .map(|f| Value::Float32(f as f32))
            .ok_or_else(|| ConversionError::mismatch(ValueType::Float32, other.type_name())),
    }
}

fn encode_f64(value: &Value) -> Result<OpcUaValue, ConversionError> {
    match value {
        Value::Float64(v) => Ok(OpcUaValue::Double(*v)),
        other => Err(ConversionError::mismatch(ValueType::Float64, other.type_name())),
    }
}

fn decode_f64(value: &OpcUaValue) -> Result<Value, ConversionError> {
    float_of(value)
        .map(Value::Float64)
        .ok_or_else(|| ConversionError::mismatch(ValueType::Float64, value.type_name()))
}

// =============================================================================
// Helpers
// =============================================================================

/// Widens any integral value. Floats qualify only when they have no fraction.
fn integer_of(value: &OpcUaValue) -> Option<i128> {
    match value {
        OpcUaValue::Boolean(v) => Some(i128::from(*v)),
        OpcUaValue::SByte(v) => Some(i128::from(*v)),
        OpcUaValue::Byte(v) => Some(i128::from(*v)),
        OpcUaValue::Int16(v) => Some(i128::from(*v)),
        OpcUaValue::UInt16(v) => Some(i128::from(*v)),
        OpcUaValue::Int32(v) => Some(i128::from(*v)),
        OpcUaValue::UInt32(v) => Some(i128::from(*v)),
        OpcUaValue::Int64(v) => Some(i128::from(*v)),
        OpcUaValue::UInt64(v) => Some(i128::from(*v)),
        OpcUaValue::Float(v) => whole(f64::from(*v)),
        OpcUaValue::Double(v) => whole(*v),
        OpcUaValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn whole(v: f64) -> Option<i128> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i128)
}

fn float_of(value: &OpcUaValue) -> Option<f64> {
    match value {
        OpcUaValue::Float(v) => Some(f64::from(*v)),
        OpcUaValue::Double(v) => Some(*v),
        OpcUaValue::String(s) => s.trim().parse().ok(),
        OpcUaValue::Boolean(_) => None,
        other => integer_of(other).map(|n| n as f64),
    }
}

// =============================================================================
// Tests
// =============================================================================
