//! Binary-coded number fields
//!
//! A row of boxes printed right-to-left from the field origin; box `k`
//! carries bit `k` (least significant first).

use super::DecodeContext;
use crate::constants::decoding::ILLEGIBLE_BARCODE;

/// Number of bits needed to hold any `digits`-digit decimal number
pub fn barcode_bits(digits: u32) -> u32 {
    if digits == 0 {
        return 0;
    }
    let max = 10u128.pow(digits) - 1;
    u128::BITS - max.leading_zeros()
}

/// Turn LSB-first bits into a decimal string, `____` when there is nothing to parse
pub fn bits_to_decimal(bits: &[bool]) -> String {
    let binary: String = bits
        .iter()
        .rev()
        .map(|&bit| if bit { '1' } else { '0' })
        .collect();
    u128::from_str_radix(&binary, 2)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| ILLEGIBLE_BARCODE.to_string())
}

pub fn read_barcode(ctx: &mut DecodeContext<'_>, x: f64, y: f64, digits: u32) -> String {
    let config = ctx.config;
    let start = x - config.box_size;
    let pitch = config.box_size + config.box_spacing / 4.0;
    let bits: Vec<bool> = (0..barcode_bits(digits))
        .map(|k| ctx.read_square(start - k as f64 * pitch, y))
        .collect();
    bits_to_decimal(&bits)
}
