//! Endianness conversion for on-disk integers
//!
//! Map files store every multi-byte integer little-endian. Values are read
//! into native integers byte-for-byte and then reordered in place, so the
//! same decode path works on big-endian hosts.
//!
//! Only exact-width types implement [`FileOrder`]; asking for the wrong
//! width is a compile error rather than a runtime failure.

/// Integer types that can be reordered between file order and native order
pub trait FileOrder: Copy {
    /// Width on disk in bytes
    const WIDTH: usize;

    /// Reorder a value read verbatim from disk into native order
    fn file_to_native(&mut self);

    /// Reorder a native value into file order before writing it verbatim
    fn native_to_file(&mut self);
}

macro_rules! impl_file_order {
    ($($ty:ty => $width:expr),* $(,)?) => {
        $(
            impl FileOrder for $ty {
                const WIDTH: usize = $width;

                #[inline]
                fn file_to_native(&mut self) {
                    const _: () = assert!(std::mem::size_of::<$ty>() == $width);
                    *self = <$ty>::from_le(*self);
                }

                #[inline]
                fn native_to_file(&mut self) {
                    *self = self.to_le();
                }
            }
        )*
    };
}

impl_file_order!(u16 => 2, i16 => 2, u32 => 4, i32 => 4);

/// Enumerations stored on disk as a raw 4-byte value
///
/// Enum values cannot hold arbitrary byte patterns, so they are decoded
/// through their raw integer: reorder the `u32` first, then convert.
pub trait RawEnum32: Copy {
    fn to_raw(self) -> u32;
    fn from_raw(raw: u32) -> Self;
}

/// Reorder a value from file order to native order in place
#[inline]
pub fn to_native<T: FileOrder>(value: &mut T) {
    value.file_to_native();
}

/// Reorder a value from native order to file order in place
#[inline]
pub fn to_file<T: FileOrder>(value: &mut T) {
    value.native_to_file();
}

/// Decode two bytes exactly as they appear on disk
pub fn u16_from_file(bytes: [u8; 2]) -> u16 {
    let mut value = u16::from_ne_bytes(bytes);
    to_native(&mut value);
    value
}

/// Decode four bytes exactly as they appear on disk
pub fn u32_from_file(bytes: [u8; 4]) -> u32 {
    let mut value = u32::from_ne_bytes(bytes);
    to_native(&mut value);
    value
}

/// Encode a value into its on-disk bytes
pub fn u16_to_file(value: u16) -> [u8; 2] {
    let mut value = value;
    to_file(&mut value);
    value.to_ne_bytes()
}

/// Encode a value into its on-disk bytes
pub fn u32_to_file(value: u32) -> [u8; 4] {
    let mut value = value;
    to_file(&mut value);
    value.to_ne_bytes()
}

/// Decode a 4-byte enumeration from its on-disk bytes
pub fn enum_from_file<E: RawEnum32>(bytes: [u8; 4]) -> E {
    E::from_raw(u32_from_file(bytes))
}

/// Encode a 4-byte enumeration into its on-disk bytes
pub fn enum_to_file<E: RawEnum32>(value: E) -> [u8; 4] {
    u32_to_file(value.to_raw())
}
