// Copyright 2015-2020 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::str;
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian, NetworkEndian};

use crate::commands::field_type::FieldType;
use crate::errors::{Error, Result};
use crate::expressions::FilterExpression;
use crate::policy::BatchPolicy;
use crate::{BatchRead, Bins, Key};

// Contains a read operation.
pub(crate) const INFO1_READ: u8 = 1;

// Get all bins.
pub(crate) const INFO1_GET_ALL: u8 = 1 << 1;

// Batch read or exists.
pub(crate) const INFO1_BATCH: u8 = 1 << 3;

// Do not read the bins.
pub(crate) const INFO1_NOBINDATA: u8 = 1 << 5;

// This is the last of a multi-part message.
pub(crate) const INFO3_LAST: u8 = 1;

pub(crate) const BATCH_MSG_REPEAT: u8 = 0x1;

pub(crate) const MSG_TOTAL_HEADER_SIZE: u8 = 30;
pub(crate) const FIELD_HEADER_SIZE: u8 = 5;
pub(crate) const OPERATION_HEADER_SIZE: u8 = 8;
pub(crate) const MSG_REMAINING_HEADER_SIZE: u8 = 22;
const DIGEST_SIZE: u8 = 20;
const CL_MSG_VERSION: u8 = 2;
const AS_MSG_TYPE: u8 = 3;

// Server-assigned wire op code for a bin read.
const OPERATOR_READ: u8 = 1;

// Protects against allocating massive memory blocks from a corrupted or
// malicious size header.
pub(crate) const MAX_BUFFER_SIZE: usize = 120 * 1024 * 1024 + 8; // 1 MB + header

// Holds data buffer for the command
#[derive(Debug, Default)]
pub struct Buffer {
    pub data_buffer: Vec<u8>,
    pub data_offset: usize,
    pub reclaim_threshold: usize,
}

impl Buffer {
    pub(crate) fn new(reclaim_threshold: usize) -> Self {
        Buffer {
            data_buffer: Vec::with_capacity(1024),
            data_offset: 0,
            reclaim_threshold,
        }
    }

    fn begin(&mut self) {
        self.data_offset = MSG_TOTAL_HEADER_SIZE as usize;
    }

    pub(crate) fn size_buffer(&mut self) -> Result<()> {
        let offset = self.data_offset;
        self.resize_buffer(offset)
    }

    pub(crate) fn resize_buffer(&mut self, size: usize) -> Result<()> {
        // Corrupted data streams can result in a huge length.
        // Do a sanity check here.
        if size > MAX_BUFFER_SIZE {
            return Err(Error::InvalidArgument(format!(
                "Invalid size for buffer: {size}"
            )));
        }

        let mem_size = self.data_buffer.capacity();
        self.data_buffer.resize(size, 0);
        if mem_size > self.reclaim_threshold && size < mem_size {
            self.data_buffer.shrink_to_fit();
        }

        Ok(())
    }

    pub(crate) fn reset_offset(&mut self) {
        // reset data offset
        self.data_offset = 0;
    }

    pub(crate) fn end(&mut self) {
        let size = ((self.data_offset - 8) as i64)
            | ((i64::from(CL_MSG_VERSION) << 56) as i64)
            | (i64::from(AS_MSG_TYPE) << 48);

        // reset data offset
        self.reset_offset();
        self.write_i64(size);
    }

    fn estimate_filter_size(&mut self, filter: &Option<FilterExpression>) -> usize {
        filter.as_ref().map_or(0, |filter| {
            let filter_size = filter.size();
            self.data_offset += filter_size + FIELD_HEADER_SIZE as usize;
            filter_size
        })
    }

    /// Estimates the wire size of one batch entry and returns whether its
    /// header and bin selector can be compressed into a one-byte repeat flag
    /// against `prev`.
    fn estimate_batch_read_size(
        &mut self,
        batch_read: &BatchRead,
        prev: Option<&BatchRead>,
        send_set_name: bool,
    ) -> bool {
        self.data_offset += DIGEST_SIZE as usize + 4;

        if let Some(prev) = prev {
            if batch_read.match_header(prev, send_set_name) {
                self.data_offset += 1;
                return true;
            }
        }

        let key = &batch_read.key;
        self.data_offset += 12; // info/gen/ttl(4) + expiration(4) + field_count(2) + op_count(2)
        self.data_offset += key.namespace.len() + FIELD_HEADER_SIZE as usize;
        if send_set_name {
            self.data_offset += key.set_name.len() + FIELD_HEADER_SIZE as usize;
        }
        if let Bins::Some(bin_names) = batch_read.bins.as_ref() {
            for name in bin_names {
                self.data_offset += name.len() + OPERATION_HEADER_SIZE as usize;
            }
        }
        false
    }

    /// Encodes a batch-index read request for `batch_reads`. Entries sharing
    /// a namespace (and, if `send_set_name`, a set) and bin selector with the
    /// immediately preceding entry are wire-compressed to a single repeat
    /// byte, matching the server's batch-index protocol.
    pub(crate) fn set_batch_read(
        &mut self,
        policy: &BatchPolicy,
        batch_reads: &[BatchRead],
    ) -> Result<()> {
        self.begin();

        let mut field_count = 1; // batch-index field is always present
        let filter_size = self.estimate_filter_size(policy.filter_expression());
        if filter_size > 0 {
            field_count += 1;
        }

        self.data_offset += FIELD_HEADER_SIZE as usize + 5; // batch-index field header + count + flags

        let mut prev = None;
        let mut repeats = Vec::with_capacity(batch_reads.len());
        for batch_read in batch_reads {
            let repeat = self.estimate_batch_read_size(batch_read, prev, policy.send_set_name);
            repeats.push(repeat);
            prev = Some(batch_read);
        }

        self.size_buffer()?;
        self.write_header(&policy.base_policy, INFO1_BATCH, field_count);
        self.write_timeout(policy.base_policy.total_timeout);

        if let Some(filter) = policy.filter_expression() {
            self.write_filter_expression(filter, filter_size);
        }

        let field_size_offset = self.data_offset;
        self.write_field_header(0, FieldType::BatchIndex);
        self.write_u32(batch_reads.len() as u32);
        self.write_u8(Self::batch_flags(policy));

        for (idx, batch_read) in batch_reads.iter().enumerate() {
            self.write_u32(idx as u32);
            self.write_bytes(&batch_read.key.digest);

            if repeats[idx] {
                self.write_u8(BATCH_MSG_REPEAT);
                continue;
            }

            self.write_u8(0); // do not repeat
            self.write_batch_read_header(batch_read, policy.send_set_name);
        }

        let field_size = self.data_offset - field_size_offset - FIELD_HEADER_SIZE as usize;
        NetworkEndian::write_u32(
            &mut self.data_buffer[field_size_offset..field_size_offset + 4],
            field_size as u32,
        );

        self.end();
        Ok(())
    }

    fn write_batch_read_header(&mut self, batch_read: &BatchRead, send_set_name: bool) {
        let bin_names = match batch_read.bins.as_ref() {
            Bins::Some(names) => Some(names),
            _ => None,
        };
        let read_attr = match batch_read.bins.as_ref() {
            Bins::All => INFO1_READ | INFO1_GET_ALL,
            Bins::None => INFO1_READ | INFO1_NOBINDATA,
            Bins::Some(_) => INFO1_READ,
        };

        self.write_u8(read_attr);
        self.write_u16(if send_set_name { 2 } else { 1 });
        self.write_u16(bin_names.map_or(0, Vec::len) as u16);
        self.write_field_string(&batch_read.key.namespace, FieldType::Namespace);
        if send_set_name {
            self.write_field_string(&batch_read.key.set_name, FieldType::Table);
        }
        if let Some(bin_names) = bin_names {
            for name in bin_names {
                self.write_operation_for_bin_name(name);
            }
        }
    }

    fn write_operation_for_bin_name(&mut self, name: &str) {
        self.write_i32(name.len() as i32 + 4);
        self.write_u8(OPERATOR_READ);
        self.write_u8(0);
        self.write_u8(0);
        self.write_u8(name.len() as u8);
        self.write_str(name);
    }

    fn batch_flags(policy: &BatchPolicy) -> u8 {
        let mut flags = 0;
        if policy.allow_inline {
            flags |= 0x1;
        }
        if policy.allow_inline_ssd {
            flags |= 0x2;
        }
        if policy.respond_all_keys {
            flags |= 0x4;
        }
        flags
    }

    fn write_header(&mut self, policy: &crate::policy::BasePolicy, read_attr: u8, field_count: u16) {
        // Write all header data except total size which must be written last.
        self.data_buffer[8] = MSG_REMAINING_HEADER_SIZE; // Message header length.
        self.data_buffer[9] = read_attr;
        self.data_buffer[10] = 0; // write_attr

        for i in 11..26 {
            self.data_buffer[i] = 0;
        }

        self.data_offset = 18;
        self.write_u32(policy.read_touch_ttl.into());

        self.data_offset = 26;
        self.write_u16(field_count);
        self.write_u16(0); // operation_count: none in a batch-index request header

        self.data_offset = MSG_TOTAL_HEADER_SIZE as usize;
    }

    fn write_filter_expression(&mut self, filter: &FilterExpression, size: usize) {
        self.write_field_header(size, FieldType::FilterExp);
        filter.write(self);
    }

    fn write_field_header(&mut self, size: usize, ftype: FieldType) {
        self.write_i32(size as i32 + 1);
        self.write_u8(ftype as u8);
    }

    fn write_field_string(&mut self, field: &str, ftype: FieldType) {
        self.write_field_header(field.len(), ftype);
        self.write_str(field);
    }

    // Data buffer implementations

    pub(crate) const fn data_offset(&self) -> usize {
        self.data_offset
    }

    pub(crate) fn skip_bytes(&mut self, count: usize) {
        self.data_offset += count;
    }

    pub(crate) fn skip(&mut self, count: usize) {
        self.data_offset += count;
    }

    pub(crate) fn peek(&self) -> u8 {
        self.data_buffer[self.data_offset]
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u8(&mut self, pos: Option<usize>) -> u8 {
        if let Some(pos) = pos {
            self.data_buffer[pos]
        } else {
            let res = self.data_buffer[self.data_offset];
            self.data_offset += 1;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_i8(&mut self, pos: Option<usize>) -> i8 {
        if let Some(pos) = pos {
            self.data_buffer[pos] as i8
        } else {
            let res = self.data_buffer[self.data_offset] as i8;
            self.data_offset += 1;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u16(&mut self, pos: Option<usize>) -> u16 {
        let len = 2;
        if let Some(pos) = pos {
            NetworkEndian::read_u16(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u16(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    pub(crate) fn read_i16(&mut self, pos: Option<usize>) -> i16 {
        let val = self.read_u16(pos);
        val as i16
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u32(&mut self, pos: Option<usize>) -> u32 {
        let len = 4;
        if let Some(pos) = pos {
            NetworkEndian::read_u32(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u32(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    pub(crate) fn read_i32(&mut self, pos: Option<usize>) -> i32 {
        let val = self.read_u32(pos);
        val as i32
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u64(&mut self, pos: Option<usize>) -> u64 {
        let len = 8;
        if let Some(pos) = pos {
            NetworkEndian::read_u64(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u64(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_le_u64(&mut self, pos: Option<usize>) -> u64 {
        let len = 8;
        if let Some(pos) = pos {
            LittleEndian::read_u64(&self.data_buffer[pos..pos + len])
        } else {
            let res =
                LittleEndian::read_u64(&self.data_buffer[self.data_offset..self.data_offset + len]);
            self.data_offset += len;
            res
        }
    }

    pub(crate) fn read_i64(&mut self, pos: Option<usize>) -> i64 {
        let val = self.read_u64(pos);
        val as i64
    }

    pub(crate) fn read_msg_size(&mut self, pos: Option<usize>) -> usize {
        let size = self.read_i64(pos);
        let size = size & 0xFFFF_FFFF_FFFF;
        size as usize
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_f32(&mut self, pos: Option<usize>) -> f32 {
        let len = 4;
        if let Some(pos) = pos {
            NetworkEndian::read_f32(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_f32(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_f64(&mut self, pos: Option<usize>) -> f64 {
        let len = 8;
        if let Some(pos) = pos {
            NetworkEndian::read_f64(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_f64(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    pub(crate) fn read_str(&mut self, len: usize) -> Result<String> {
        let s = str::from_utf8(&self.data_buffer[self.data_offset..self.data_offset + len])?;
        self.data_offset += len;
        Ok(s.to_owned())
    }

    pub(crate) fn read_slice(&mut self, count: usize) -> &[u8] {
        &self.data_buffer[self.data_offset..self.data_offset + count]
    }

    pub(crate) fn read_blob(&mut self, len: usize) -> Vec<u8> {
        let val = self.data_buffer[self.data_offset..self.data_offset + len].to_vec();
        self.data_offset += len;
        val
    }

    pub(crate) fn write_u8(&mut self, val: u8) -> usize {
        self.data_buffer[self.data_offset] = val;
        self.data_offset += 1;
        1
    }

    pub(crate) fn write_i8(&mut self, val: i8) -> usize {
        self.data_buffer[self.data_offset] = val as u8;
        self.data_offset += 1;
        1
    }

    pub(crate) fn write_u16(&mut self, val: u16) -> usize {
        NetworkEndian::write_u16(
            &mut self.data_buffer[self.data_offset..self.data_offset + 2],
            val,
        );
        self.data_offset += 2;
        2
    }

    pub(crate) fn write_i16(&mut self, val: i16) -> usize {
        self.write_u16(val as u16)
    }

    pub(crate) fn write_u32(&mut self, val: u32) -> usize {
        NetworkEndian::write_u32(
            &mut self.data_buffer[self.data_offset..self.data_offset + 4],
            val,
        );
        self.data_offset += 4;
        4
    }

    pub(crate) fn write_i32(&mut self, val: i32) -> usize {
        self.write_u32(val as u32)
    }

    pub(crate) fn write_u64(&mut self, val: u64) -> usize {
        NetworkEndian::write_u64(
            &mut self.data_buffer[self.data_offset..self.data_offset + 8],
            val,
        );
        self.data_offset += 8;
        8
    }

    pub(crate) fn write_i64(&mut self, val: i64) -> usize {
        self.write_u64(val as u64)
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        for b in bytes {
            self.write_u8(*b);
        }
        bytes.len()
    }

    pub(crate) fn write_str(&mut self, val: &str) -> usize {
        self.write_bytes(val.as_bytes())
    }

    pub(crate) fn write_timeout(&mut self, val: Option<Duration>) {
        if let Some(val) = val {
            let millis: i32 = (val.as_secs() * 1_000) as i32 + val.subsec_millis() as i32;
            NetworkEndian::write_i32(&mut self.data_buffer[22..22 + 4], millis);
        }
    }

    #[allow(dead_code)]
    pub(crate) fn dump_buffer(&self) {
        rhexdump!(&self.data_buffer);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::BasePolicy;
    use crate::Bins;
    use std::sync::Arc;

    fn read(namespace: &str, set_name: &str, digest: [u8; 20], bins: Arc<Bins>) -> BatchRead {
        BatchRead::new(
            Key {
                namespace: namespace.to_string(),
                set_name: set_name.to_string(),
                user_key: None,
                digest,
            },
            bins,
        )
    }

    #[test]
    fn repeated_namespace_and_bins_compress_to_one_byte() {
        let bins = Arc::new(Bins::All);
        let reads = vec![
            read("test", "demo", [1; 20], bins.clone()),
            read("test", "demo", [2; 20], bins),
        ];
        let mut buf = Buffer::new(65536);
        let policy = BatchPolicy::default();
        buf.set_batch_read(&policy, &reads).unwrap();
        assert!(buf.data_buffer.len() > MSG_TOTAL_HEADER_SIZE as usize);
    }

    #[test]
    fn distinct_bin_selectors_do_not_compress() {
        let reads = vec![
            read("test", "demo", [1; 20], Arc::new(Bins::All)),
            read("test", "demo", [2; 20], Arc::new(Bins::None)),
        ];
        let mut buf = Buffer::new(65536);
        let policy = BatchPolicy::default();
        buf.set_batch_read(&policy, &reads).unwrap();
    }

    #[test]
    fn empty_batch_encodes_without_error() {
        let mut buf = Buffer::new(65536);
        let policy = BatchPolicy::default();
        buf.set_batch_read(&policy, &[]).unwrap();
    }

    #[test]
    fn total_timeout_is_written_into_header() {
        let mut policy = BatchPolicy::default();
        policy.base_policy.total_timeout = Some(Duration::from_millis(7_500));
        let reads = vec![read("test", "demo", [1; 20], Arc::new(Bins::All))];
        let mut buf = Buffer::new(65536);
        buf.set_batch_read(&policy, &reads).unwrap();
        assert_eq!(NetworkEndian::read_i32(&buf.data_buffer[22..26]), 7_500);
    }

    #[test]
    fn no_total_timeout_leaves_header_field_zero() {
        let mut policy = BatchPolicy::default();
        policy.base_policy.total_timeout = None;
        let reads = vec![read("test", "demo", [1; 20], Arc::new(Bins::All))];
        let mut buf = Buffer::new(65536);
        buf.set_batch_read(&policy, &reads).unwrap();
        assert_eq!(NetworkEndian::read_i32(&buf.data_buffer[22..26]), 0);
    }
}
