/// Bits per storage word of the in-memory bitfield.
pub const WORD_BITS: u64 = 64;

/// Widest colour index a pixel can hold.
pub const MAX_COLOR_BIT_WIDTH: u32 = 32;

/// Number of locks guarding pixels that straddle two storage words.
pub const STRADDLE_LOCK_STRIPES: usize = 64;

/// Attribution shown for pixels nobody has placed yet.
pub const ZERO_ADDRESS: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";
