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

//! Encoders turning numeric values into the sortable packed bytes stored
//! as point values.

use core::util::numeric;

pub struct IntPoint;

impl IntPoint {
    pub const BYTES: usize = 4;

    pub fn pack(point: &[i32]) -> Vec<u8> {
        let mut packed = vec![0u8; point.len() * Self::BYTES];
        for (dim, value) in point.iter().enumerate() {
            IntPoint::encode_dimension(*value, &mut packed[dim * Self::BYTES..]);
        }
        packed
    }

    pub fn encode_dimension(value: i32, dest: &mut [u8]) {
        numeric::int2sortable_bytes(value, dest)
    }
}

pub struct LongPoint;

impl LongPoint {
    pub const BYTES: usize = 8;

    pub fn pack(point: &[i64]) -> Vec<u8> {
        let mut packed = vec![0u8; point.len() * Self::BYTES];
        for (dim, value) in point.iter().enumerate() {
            LongPoint::encode_dimension(*value, &mut packed[dim * Self::BYTES..]);
        }
        packed
    }

    pub fn encode_dimension(value: i64, dest: &mut [u8]) {
        numeric::long2sortable_bytes(value, dest)
    }
}

pub struct FloatPoint;

impl FloatPoint {
    pub const BYTES: usize = 4;

    pub fn pack(point: &[f32]) -> Vec<u8> {
        let mut packed = vec![0u8; point.len() * Self::BYTES];
        for (dim, value) in point.iter().enumerate() {
            FloatPoint::encode_dimension(*value, &mut packed[dim * Self::BYTES..]);
        }
        packed
    }

    pub fn encode_dimension(value: f32, dest: &mut [u8]) {
        numeric::int2sortable_bytes(numeric::float2sortable_int(value), dest)
    }
}

pub struct DoublePoint;

impl DoublePoint {
    pub const BYTES: usize = 8;

    pub fn pack(point: &[f64]) -> Vec<u8> {
        let mut packed = vec![0u8; point.len() * Self::BYTES];
        for (dim, value) in point.iter().enumerate() {
            DoublePoint::encode_dimension(*value, &mut packed[dim * Self::BYTES..]);
        }
        packed
    }

    pub fn encode_dimension(value: f64, dest: &mut [u8]) {
        numeric::long2sortable_bytes(numeric::double2sortable_long(value), dest)
    }
}
