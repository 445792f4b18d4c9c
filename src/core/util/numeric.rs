// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use byteorder::{BigEndian, ByteOrder};

pub fn double2sortable_long(value: f64) -> i64 {
    sortable_double_bits(value.to_bits() as i64)
}

pub fn float2sortable_int(value: f32) -> i32 {
    sortable_float_bits(f32::to_bits(value) as i32)
}

/// Converts IEEE 754 representation of a double to sortable order (or back to the original)
pub fn sortable_double_bits(bits: i64) -> i64 {
    bits ^ (bits >> 63i64) & 0x7fff_ffff_ffff_ffffi64
}

pub fn sortable_float_bits(bits: i32) -> i32 {
    bits ^ (bits >> 31) & 0x7fff_ffff
}

/// Encodes an integer `value` such that unsigned byte order comparison
/// is consistent with `i32::cmp`
pub fn int2sortable_bytes(value: i32, result: &mut [u8]) {
    // Flip the sign bit, so negative ints sort before positive ints correctly
    BigEndian::write_u32(result, (value as u32) ^ 0x8000_0000);
}

pub fn long2sortable_bytes(value: i64, result: &mut [u8]) {
    BigEndian::write_u64(result, (value as u64) ^ 0x8000_0000_0000_0000);
}
