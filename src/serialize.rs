//! Serialization helper for `Network`/`UDP` emits: trivial-copy types get
//! a raw byte-copy fast path; anything else falls back to `serde_json`.
use serde::{de::DeserializeOwned, Serialize};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum SerializeError {
    #[snafu(display("failed to serialize payload: {source}"))]
    Encode { source: serde_json::Error },
    #[snafu(display("failed to deserialize payload: {source}"))]
    Decode { source: serde_json::Error },
}

/// Marker for message types that are safe to reinterpret as a raw byte
/// slice (plain old data: no padding-sensitive invariants, no pointers).
/// Unsafe to implement for any type where that isn't true.
///
/// # Safety
/// Implementors must be `#[repr(C)]` or a primitive, contain no padding
/// whose bits matter, and contain no pointers/references.
pub unsafe trait TriviallyCopyable: Copy + Send + 'static {}

unsafe impl TriviallyCopyable for u8 {}
unsafe impl TriviallyCopyable for u16 {}
unsafe impl TriviallyCopyable for u32 {}
unsafe impl TriviallyCopyable for u64 {}
unsafe impl TriviallyCopyable for i8 {}
unsafe impl TriviallyCopyable for i16 {}
unsafe impl TriviallyCopyable for i32 {}
unsafe impl TriviallyCopyable for i64 {}
unsafe impl TriviallyCopyable for f32 {}
unsafe impl TriviallyCopyable for f64 {}

/// Byte-copy a trivially-copyable value. `deserialize_trivial::<T>` of
/// this output bitwise-equals the original.
pub fn serialize_trivial<T: TriviallyCopyable>(value: &T) -> Vec<u8> {
    let ptr = value as *const T as *const u8;
    unsafe { std::slice::from_raw_parts(ptr, std::mem::size_of::<T>()) }.to_vec()
}

pub fn deserialize_trivial<T: TriviallyCopyable>(bytes: &[u8]) -> Option<T> {
    if bytes.len() != std::mem::size_of::<T>() {
        return None;
    }
    let mut value = std::mem::MaybeUninit::<T>::uninit();
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), value.as_mut_ptr() as *mut u8, bytes.len());
        Some(value.assume_init())
    }
}

/// A contiguous sequence of trivially-copyable values, copied as one
/// block rather than element-by-element.
pub fn serialize_contiguous<T: TriviallyCopyable>(values: &[T]) -> Vec<u8> {
    let ptr = values.as_ptr() as *const u8;
    unsafe { std::slice::from_raw_parts(ptr, std::mem::size_of_val(values)) }.to_vec()
}

/// Fallback path for any `Serialize`/`Deserialize` message that is not
/// trivially copyable (the common case for application messages).
pub fn serialize_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializeError> {
    serde_json::to_vec(value).map_err(|source| SerializeError::Encode { source })
}

pub fn deserialize_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializeError> {
    serde_json::from_slice(bytes).map_err(|source| SerializeError::Decode { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_round_trip_is_bitwise_equal() {
        let value: u64 = 0xDEAD_BEEF_CAFE_F00D;
        let bytes = serialize_trivial(&value);
        assert_eq!(deserialize_trivial::<u64>(&bytes), Some(value));
    }

    #[test]
    fn contiguous_round_trip() {
        let values: [u32; 4] = [1, 2, 3, 4];
        let bytes = serialize_contiguous(&values);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn json_fallback_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Point {
            x: i32,
            y: i32,
        }
        let p = Point { x: 1, y: -2 };
        let bytes = serialize_json(&p).unwrap();
        let back: Point = deserialize_json(&bytes).unwrap();
        assert_eq!(p, back);
    }
}
