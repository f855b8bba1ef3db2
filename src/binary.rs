/// Read binary data
pub mod read;

/// Marker for an unsigned 8-bit value.
#[derive(Copy, Clone)]
pub enum U8 {}

/// Marker for a signed 8-bit value.
#[derive(Copy, Clone)]
pub enum I8 {}

/// Marker for a big-endian unsigned 16-bit value.
#[derive(Copy, Clone)]
pub enum U16Be {}

/// Marker for a big-endian signed 16-bit value. Also used for the `FWORD` type.
#[derive(Copy, Clone)]
pub enum I16Be {}

/// Marker for a big-endian unsigned 32-bit value.
#[derive(Copy, Clone)]
pub enum U32Be {}
