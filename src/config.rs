use std::sync::OnceLock;

static NUMBER_MAX_BITS: OnceLock<u32> = OnceLock::new();

const DEFAULT_NUMBER_MAX_BITS: u32 = 128;

/// The process-wide precision cap for arbitrary-width numbers, in bits.
///
/// Resolved once on first use: an explicit [set_number_max_bits] wins,
/// otherwise the `JSON_NUMBER_BITS` environment variable, otherwise 128.
pub fn number_max_bits() -> u32 {
    *NUMBER_MAX_BITS.get_or_init(|| {
        std::env::var("JSON_NUMBER_BITS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NUMBER_MAX_BITS)
    })
}

/// Configure the bit cap at startup, before any decode. Returns false if the
/// cap was already resolved, in which case the call has no effect.
pub fn set_number_max_bits(bits: u32) -> bool {
    NUMBER_MAX_BITS.set(bits).is_ok()
}

/// Decimal digits representable within the bit cap: ceil(bits * log10(2)) + 1.
pub(crate) fn max_digits() -> usize {
    let bits = number_max_bits() as usize;
    (bits * 30103).div_ceil(100_000) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cap() {
        // 2^128 has 39 decimal digits
        assert_eq!(number_max_bits(), 128);
        assert_eq!(max_digits(), 40);
    }
}
