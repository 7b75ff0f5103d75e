//! Conversion between physical column values and [`ParquetValue`]
//!
//! Reading resolves a physical value through the leaf's [`PrimitiveType`];
//! writing does the reverse and rejects values the column cannot hold.

use bytes::Bytes;
use num::{BigInt, ToPrimitive};
use ordered_float::OrderedFloat;
use std::sync::Arc;

use crate::encoding::{ColumnValues, Int96};
use crate::{ParquetError, ParquetValue, PrimitiveType, Result};

const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;
const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// Converts the value at `index` of a decoded buffer
pub fn physical_to_value(
    values: &ColumnValues,
    index: usize,
    ptype: &PrimitiveType,
) -> Result<ParquetValue> {
    fn at<T>(values: &[T], index: usize) -> Result<&T> {
        values.get(index).ok_or_else(|| {
            ParquetError::internal(format!(
                "value index {} out of range for {} decoded values",
                index,
                values.len()
            ))
        })
    }

    Ok(match values {
        ColumnValues::Boolean(v) => ParquetValue::Boolean(*at(v, index)?),
        ColumnValues::Int32(v) => int32_value(*at(v, index)?, ptype),
        ColumnValues::Int64(v) => int64_value(*at(v, index)?, ptype),
        ColumnValues::Int96(v) => ParquetValue::TimestampNanos(int96_to_nanos(at(v, index)?), None),
        ColumnValues::Float(v) => ParquetValue::Float32(OrderedFloat(*at(v, index)?)),
        ColumnValues::Double(v) => ParquetValue::Float64(OrderedFloat(*at(v, index)?)),
        ColumnValues::ByteArray(v) | ColumnValues::FixedLenByteArray(v) => {
            bytes_value(at(v, index)?, ptype)?
        }
    })
}

fn int32_value(v: i32, ptype: &PrimitiveType) -> ParquetValue {
    match ptype {
        PrimitiveType::Int8 => ParquetValue::Int8(v as i8),
        PrimitiveType::Int16 => ParquetValue::Int16(v as i16),
        PrimitiveType::UInt8 => ParquetValue::UInt8(v as u8),
        PrimitiveType::UInt16 => ParquetValue::UInt16(v as u16),
        PrimitiveType::UInt32 => ParquetValue::UInt32(v as u32),
        PrimitiveType::Date32 => ParquetValue::Date32(v),
        PrimitiveType::TimeMillis => ParquetValue::TimeMillis(v),
        PrimitiveType::Decimal128(_, scale) => ParquetValue::Decimal128(v as i128, *scale),
        PrimitiveType::Decimal256(_, scale) => ParquetValue::Decimal256(BigInt::from(v), *scale),
        _ => ParquetValue::Int32(v),
    }
}

fn int64_value(v: i64, ptype: &PrimitiveType) -> ParquetValue {
    match ptype {
        PrimitiveType::UInt64 => ParquetValue::UInt64(v as u64),
        PrimitiveType::TimestampMillis(tz) => ParquetValue::TimestampMillis(v, tz.clone()),
        PrimitiveType::TimestampMicros(tz) => ParquetValue::TimestampMicros(v, tz.clone()),
        PrimitiveType::TimestampNanos(tz) => ParquetValue::TimestampNanos(v, tz.clone()),
        PrimitiveType::TimeMicros => ParquetValue::TimeMicros(v),
        PrimitiveType::TimeNanos => ParquetValue::TimeNanos(v),
        PrimitiveType::Decimal128(_, scale) => ParquetValue::Decimal128(v as i128, *scale),
        PrimitiveType::Decimal256(_, scale) => ParquetValue::Decimal256(BigInt::from(v), *scale),
        _ => ParquetValue::Int64(v),
    }
}

fn bytes_value(bytes: &Bytes, ptype: &PrimitiveType) -> Result<ParquetValue> {
    Ok(match ptype {
        PrimitiveType::String => ParquetValue::String(Arc::from(std::str::from_utf8(bytes)?)),
        PrimitiveType::Decimal128(_, scale) => {
            ParquetValue::Decimal128(decimal_from_be_bytes(bytes)?, *scale)
        }
        PrimitiveType::Decimal256(_, scale) => {
            ParquetValue::Decimal256(BigInt::from_signed_bytes_be(bytes), *scale)
        }
        PrimitiveType::Uuid => ParquetValue::Uuid(
            uuid::Uuid::from_slice(bytes)
                .map_err(|e| ParquetError::format(format!("invalid UUID value: {}", e)))?,
        ),
        PrimitiveType::Float16 => {
            let raw: [u8; 2] = bytes.as_ref().try_into().map_err(|_| {
                ParquetError::format(format!("FLOAT16 value has {} bytes", bytes.len()))
            })?;
            ParquetValue::Float16(OrderedFloat(f16_to_f32(u16::from_le_bytes(raw))))
        }
        _ => ParquetValue::Bytes(bytes.clone()),
    })
}

/// Big-endian two's complement to `i128`
pub fn decimal_from_be_bytes(bytes: &[u8]) -> Result<i128> {
    if bytes.len() > 16 {
        return BigInt::from_signed_bytes_be(bytes).to_i128().ok_or_else(|| {
            ParquetError::format(format!("{}-byte decimal does not fit 128 bits", bytes.len()))
        });
    }
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let init: i128 = if negative { -1 } else { 0 };
    Ok(bytes.iter().fold(init, |acc, b| (acc << 8) | *b as i128))
}

pub fn int96_to_nanos(words: &Int96) -> i64 {
    let nanos_of_day = (words[0] as i64) | ((words[1] as i64) << 32);
    (words[2] as i64 - JULIAN_DAY_OF_EPOCH)
        .wrapping_mul(NANOS_PER_DAY)
        .wrapping_add(nanos_of_day)
}

pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = (bits >> 10) & 0x1f;
    let mantissa = (bits & 0x3ff) as u32;
    match exponent {
        0 => sign * mantissa as f32 * 2f32.powi(-24),
        0x1f if mantissa == 0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => f32::from_bits(
            ((bits as u32 & 0x8000) << 16) | ((exponent as u32 + 112) << 23) | (mantissa << 13),
        ),
    }
}

/// Rounds to the nearest half-precision value, ties to even
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x7f_ffff;

    if exponent == 0xff {
        return sign | 0x7c00 | if mantissa != 0 { 0x200 } else { 0 };
    }
    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1f {
        return sign | 0x7c00;
    }
    if half_exponent <= 0 {
        if half_exponent < -10 {
            return sign;
        }
        let full = mantissa | 0x80_0000;
        let shift = (14 - half_exponent) as u32;
        let halfway = 1u32 << (shift - 1);
        let remainder = full & ((1 << shift) - 1);
        let mut result = full >> shift;
        if remainder > halfway || (remainder == halfway && result & 1 == 1) {
            result += 1;
        }
        return sign | result as u16;
    }
    let mut result = sign as u32 | ((half_exponent as u32) << 10) | (mantissa >> 13);
    let remainder = mantissa & 0x1fff;
    if remainder > 0x1000 || (remainder == 0x1000 && result & 1 == 1) {
        result += 1;
    }
    result as u16
}

/// True when `value` (non-null) can be stored in a column of `ptype`
pub fn accepts(ptype: &PrimitiveType, value: &ParquetValue) -> bool {
    use ParquetValue as V;
    use PrimitiveType as T;
    matches!(
        (ptype, value),
        (T::Boolean, V::Boolean(_))
            | (T::Int8, V::Int8(_))
            | (T::Int16, V::Int16(_))
            | (T::Int32, V::Int32(_))
            | (T::Int64, V::Int64(_))
            | (T::UInt8, V::UInt8(_))
            | (T::UInt16, V::UInt16(_))
            | (T::UInt32, V::UInt32(_))
            | (T::UInt64, V::UInt64(_))
            | (T::Float16, V::Float16(_))
            | (T::Float32, V::Float32(_))
            | (T::Float64, V::Float64(_))
            | (T::Decimal128(..) | T::Decimal256(..), V::Decimal128(..) | V::Decimal256(..))
            | (T::String, V::String(_))
            | (T::Binary, V::Bytes(_))
            | (T::Uuid, V::Uuid(_))
            | (T::Date32, V::Date32(_))
            | (T::TimestampMillis(_), V::TimestampMillis(..))
            | (T::TimestampMicros(_), V::TimestampMicros(..))
            | (T::TimestampNanos(_), V::TimestampNanos(..))
            | (T::TimeMillis, V::TimeMillis(_))
            | (T::TimeMicros, V::TimeMicros(_))
            | (T::TimeNanos, V::TimeNanos(_))
            | (T::FixedLenByteArray(_), V::Bytes(_))
    )
}

fn mismatch(ptype: &PrimitiveType, value: &ParquetValue) -> ParquetError {
    ParquetError::conversion(format!(
        "cannot store {} in a {} column",
        value.type_name(),
        ptype.type_name()
    ))
}

/// Unscaled decimal as big-endian two's complement, rejecting scale changes
fn decimal_bytes(value: &ParquetValue, column_scale: i8) -> Result<Vec<u8>> {
    let (bytes, scale) = match value {
        ParquetValue::Decimal128(v, scale) => (v.to_be_bytes().to_vec(), *scale),
        ParquetValue::Decimal256(v, scale) => (v.to_signed_bytes_be(), *scale),
        _ => return Err(ParquetError::internal("decimal_bytes on a non-decimal value")),
    };
    if scale != column_scale {
        return Err(ParquetError::conversion(format!(
            "decimal scale {} does not match column scale {}",
            scale, column_scale
        )));
    }
    Ok(bytes)
}

/// Sign-extends or truncates big-endian two's complement to `len` bytes
fn fit_decimal(bytes: &[u8], len: usize) -> Result<Vec<u8>> {
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let pad = if negative { 0xff } else { 0x00 };
    if bytes.len() <= len {
        let mut out = vec![pad; len - bytes.len()];
        out.extend_from_slice(bytes);
        return Ok(out);
    }
    let (dropped, kept) = bytes.split_at(bytes.len() - len);
    let kept_negative = kept.first().is_some_and(|b| b & 0x80 != 0);
    if dropped.iter().any(|b| *b != pad) || kept_negative != negative {
        return Err(ParquetError::conversion(format!(
            "decimal value does not fit in {} bytes",
            len
        )));
    }
    Ok(kept.to_vec())
}

/// Appends a non-null value to a column buffer of the leaf's physical type
pub fn push_value(
    out: &mut ColumnValues,
    value: &ParquetValue,
    ptype: &PrimitiveType,
    type_length: usize,
) -> Result<()> {
    use ParquetValue as V;
    if !accepts(ptype, value) {
        return Err(mismatch(ptype, value));
    }
    let decimal_scale = match ptype {
        PrimitiveType::Decimal128(_, scale) | PrimitiveType::Decimal256(_, scale) => Some(*scale),
        _ => None,
    };

    match out {
        ColumnValues::Boolean(buf) => match value {
            V::Boolean(b) => buf.push(*b),
            _ => return Err(mismatch(ptype, value)),
        },
        ColumnValues::Int32(buf) => buf.push(match value {
            V::Int8(v) => *v as i32,
            V::Int16(v) => *v as i32,
            V::Int32(v) | V::Date32(v) | V::TimeMillis(v) => *v,
            V::UInt8(v) => *v as i32,
            V::UInt16(v) => *v as i32,
            V::UInt32(v) => *v as i32,
            V::Decimal128(..) | V::Decimal256(..) => {
                let bytes = fit_decimal(&decimal_bytes(value, decimal_scale.unwrap_or(0))?, 4)?;
                i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
            _ => return Err(mismatch(ptype, value)),
        }),
        ColumnValues::Int64(buf) => buf.push(match value {
            V::Int64(v)
            | V::TimestampMillis(v, _)
            | V::TimestampMicros(v, _)
            | V::TimestampNanos(v, _)
            | V::TimeMicros(v)
            | V::TimeNanos(v) => *v,
            V::UInt64(v) => *v as i64,
            V::Decimal128(..) | V::Decimal256(..) => {
                let bytes = fit_decimal(&decimal_bytes(value, decimal_scale.unwrap_or(0))?, 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes);
                i64::from_be_bytes(raw)
            }
            _ => return Err(mismatch(ptype, value)),
        }),
        ColumnValues::Float(buf) => match value {
            V::Float32(v) => buf.push(v.0),
            _ => return Err(mismatch(ptype, value)),
        },
        ColumnValues::Double(buf) => match value {
            V::Float64(v) => buf.push(v.0),
            _ => return Err(mismatch(ptype, value)),
        },
        ColumnValues::ByteArray(buf) => buf.push(match value {
            V::String(s) => Bytes::copy_from_slice(s.as_bytes()),
            V::Bytes(b) => b.clone(),
            V::Decimal128(..) | V::Decimal256(..) => {
                Bytes::from(decimal_bytes(value, decimal_scale.unwrap_or(0))?)
            }
            _ => return Err(mismatch(ptype, value)),
        }),
        ColumnValues::FixedLenByteArray(buf) => {
            let bytes = match value {
                V::Bytes(b) => b.clone(),
                V::Uuid(u) => Bytes::copy_from_slice(u.as_bytes()),
                V::Float16(f) => Bytes::copy_from_slice(&f32_to_f16(f.0).to_le_bytes()),
                V::Decimal128(..) | V::Decimal256(..) => Bytes::from(fit_decimal(
                    &decimal_bytes(value, decimal_scale.unwrap_or(0))?,
                    type_length,
                )?),
                _ => return Err(mismatch(ptype, value)),
            };
            if bytes.len() != type_length {
                return Err(ParquetError::conversion(format!(
                    "fixed length value has {} bytes, column requires {}",
                    bytes.len(),
                    type_length
                )));
            }
            buf.push(bytes);
        }
        ColumnValues::Int96(_) => {
            return Err(ParquetError::conversion("INT96 columns are read-only"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_int32_annotations() {
        let values = ColumnValues::Int32(vec![-1, 19000, 12345]);
        assert_eq!(
            physical_to_value(&values, 0, &PrimitiveType::UInt32).unwrap(),
            ParquetValue::UInt32(u32::MAX)
        );
        assert_eq!(
            physical_to_value(&values, 1, &PrimitiveType::Date32).unwrap(),
            ParquetValue::Date32(19000)
        );
        assert_eq!(
            physical_to_value(&values, 2, &PrimitiveType::Decimal128(5, 2)).unwrap(),
            ParquetValue::Decimal128(12345, 2)
        );
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let values = ColumnValues::ByteArray(vec![Bytes::from_static(&[0xff, 0xfe])]);
        let err = physical_to_value(&values, 0, &PrimitiveType::String).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(
            physical_to_value(&values, 0, &PrimitiveType::Binary).unwrap(),
            ParquetValue::Bytes(Bytes::from_static(&[0xff, 0xfe]))
        );
    }

    #[test]
    fn test_int96_epoch() {
        // Midnight of 1970-01-02 plus one nanosecond
        let words = [1, 0, JULIAN_DAY_OF_EPOCH as u32 + 1];
        assert_eq!(int96_to_nanos(&words), NANOS_PER_DAY + 1);
    }

    #[test]
    fn test_decimal_bytes() {
        assert_eq!(decimal_from_be_bytes(&[0xff, 0x85]).unwrap(), -123);
        assert_eq!(decimal_from_be_bytes(&[0x30, 0x39]).unwrap(), 12345);
        assert_eq!(decimal_from_be_bytes(&[]).unwrap(), 0);
        assert_eq!(fit_decimal(&[0xff, 0x85], 4).unwrap(), vec![0xff, 0xff, 0xff, 0x85]);
        assert_eq!(fit_decimal(&(-123i128).to_be_bytes(), 2).unwrap(), vec![0xff, 0x85]);
        assert!(fit_decimal(&(40000i128).to_be_bytes(), 2).is_err());
    }

    #[test]
    fn test_float16_conversion() {
        assert_eq!(f16_to_f32(0x3c00), 1.0);
        assert_eq!(f16_to_f32(0xc000), -2.0);
        assert_eq!(f16_to_f32(0x0001), 2f32.powi(-24));
        assert_eq!(f32_to_f16(1.0), 0x3c00);
        assert_eq!(f32_to_f16(-2.0), 0xc000);
        assert_eq!(f32_to_f16(65504.0), 0x7bff);
        assert_eq!(f32_to_f16(1e6), 0x7c00);
        assert_eq!(f32_to_f16(2f32.powi(-24)), 0x0001);
        assert!(f16_to_f32(f32_to_f16(f32::NAN)).is_nan());
    }

    #[test]
    fn test_push_value_checks_types() {
        let mut buf = ColumnValues::Int32(Vec::new());
        push_value(&mut buf, &ParquetValue::Int16(-7), &PrimitiveType::Int16, 0).unwrap();
        push_value(
            &mut buf,
            &ParquetValue::Decimal128(-123, 2),
            &PrimitiveType::Decimal128(5, 2),
            0,
        )
        .unwrap();
        assert_eq!(buf, ColumnValues::Int32(vec![-7, -123]));

        let err = push_value(&mut buf, &ParquetValue::Int64(1), &PrimitiveType::Int32, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);

        let err = push_value(
            &mut buf,
            &ParquetValue::Decimal128(1, 3),
            &PrimitiveType::Decimal128(5, 2),
            0,
        )
        .unwrap_err();
        assert!(err.to_string().contains("scale"));

        let mut fixed = ColumnValues::FixedLenByteArray(Vec::new());
        let err = push_value(
            &mut fixed,
            &ParquetValue::Bytes(Bytes::from_static(b"abc")),
            &PrimitiveType::FixedLenByteArray(4),
            4,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }
}
