//! RDS group reassembly.
//!
//! The chip latches one RDS group (blocks A–D) at a time into registers
//! 0x0C..=0x0F and raises RDSR. Station name and radio text arrive as small
//! segments in any order, possibly repeated or garbled, so they are collected
//! in private scratch buffers and only copied into [`RdsInfo`] once a whole
//! message is present.

use log::{debug, trace};

use crate::Error;
use crate::bus::RegisterBus;
use crate::registers::{BAND_BOTTOM, BlockB, RegisterFile, word_bytes};

pub const STATION_NAME_LEN: usize = 8;
pub const RADIO_TEXT_LEN: usize = 64;
/// Largest list length an AF count code (225..=249) can announce.
pub const MAX_ALTERNATE_FREQUENCIES: usize = 25;

const RADIO_TEXT_SEGMENTS: u8 = 16;
const STATION_NAME_SEGMENTS: u8 = 4;

const AF_COUNT_BASE: u8 = 224;
const AF_COUNT_END: u8 = 250;
const AF_FREQUENCY_END: u8 = 205;

const CARRIAGE_RETURN: u8 = b'\r';

/// Decoded RDS data as last published.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RdsInfo {
    pub program_identification: u16,
    /// Zero bytes mark the unused tail.
    pub station_name: [u8; STATION_NAME_LEN],
    /// Zero bytes mark the unused tail.
    pub radio_text: [u8; RADIO_TEXT_LEN],
    /// Channels in tenths of MHz. Only the first
    /// `alternate_frequencies_count` entries belong to the announced list.
    pub alternate_frequencies: [u16; MAX_ALTERNATE_FREQUENCIES],
    pub alternate_frequencies_count: u8,
}

impl RdsInfo {
    pub const fn new() -> Self {
        Self {
            program_identification: 0,
            station_name: [0; STATION_NAME_LEN],
            radio_text: [0; RADIO_TEXT_LEN],
            alternate_frequencies: [0; MAX_ALTERNATE_FREQUENCIES],
            alternate_frequencies_count: 0,
        }
    }

    /// Station name without trailing NULs, or `""` if it is not valid UTF-8.
    pub fn station_name_str(&self) -> &str {
        text_until_nul(&self.station_name)
    }

    /// Radio text without trailing NULs, or `""` if it is not valid UTF-8.
    pub fn radio_text_str(&self) -> &str {
        text_until_nul(&self.radio_text)
    }

    /// The announced alternate frequency list.
    pub fn alternate_frequencies(&self) -> &[u16] {
        let len = usize::from(self.alternate_frequencies_count).min(MAX_ALTERNATE_FREQUENCIES);
        &self.alternate_frequencies[..len]
    }
}

impl Default for RdsInfo {
    fn default() -> Self {
        Self::new()
    }
}

fn text_until_nul(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Outcome of one [`RdsDecoder::ingest_one_group`] call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RdsPoll {
    /// RDSR was clear, nothing was decoded.
    Idle,
    /// A group was decoded.
    Consumed,
}

impl RdsPoll {
    /// Suggested wait in milliseconds before the next poll.
    ///
    /// After a group the chip needs about 40 ms to drop RDSR; while idle a
    /// 30 ms cadence keeps up with the 11.4 groups/s RDS rate.
    pub fn pacing_ms(&self) -> u64 {
        match self {
            RdsPoll::Idle => 30,
            RdsPoll::Consumed => 40,
        }
    }
}

#[derive(Debug)]
pub struct RdsDecoder {
    info: RdsInfo,
    station_name: [u8; STATION_NAME_LEN],
    radio_text: [u8; RADIO_TEXT_LEN],
    /// `None` until the first 2A group, so that group always starts clean.
    last_clear_flag: Option<bool>,
    af_cursor: usize,
}

impl Default for RdsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RdsDecoder {
    pub const fn new() -> Self {
        Self {
            info: RdsInfo::new(),
            station_name: [0; STATION_NAME_LEN],
            radio_text: [0; RADIO_TEXT_LEN],
            last_clear_flag: None,
            af_cursor: 0,
        }
    }

    /// Last published data.
    pub fn info(&self) -> &RdsInfo {
        &self.info
    }

    /// Forget everything, published data included. Called after every retune.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read the register file and decode the pending group, if any.
    pub fn ingest_one_group<B: RegisterBus>(&mut self, bus: &mut B) -> Result<RdsPoll, Error> {
        let regs = bus.read_all()?;
        Ok(self.decode(&regs))
    }

    /// Decode the group latched in `regs`.
    pub fn decode(&mut self, regs: &RegisterFile) -> RdsPoll {
        if !regs.rds_ready() {
            return RdsPoll::Idle;
        }

        self.info.program_identification = regs.block_a();

        let block_b = regs.block_b();
        trace!(
            "RDS group {}{} PI {:04X} PTY {}",
            block_b.group_type(),
            if block_b.version_b() { 'B' } else { 'A' },
            regs.block_a(),
            block_b.program_type()
        );
        match (block_b.group_type(), block_b.version_b()) {
            (2, false) => self.radio_text_group(block_b, regs.block_c(), regs.block_d()),
            (0, version_b) => {
                if !version_b {
                    self.alternate_frequency_codes(regs.block_c());
                }
                self.station_name_group(block_b, regs.block_d());
            }
            _ => {}
        }
        RdsPoll::Consumed
    }

    fn radio_text_group(&mut self, block_b: BlockB, block_c: u16, block_d: u16) {
        let clear_flag = block_b.text_clear_flag();
        if self.last_clear_flag != Some(clear_flag) {
            self.last_clear_flag = Some(clear_flag);
            self.radio_text = [0; RADIO_TEXT_LEN];
        }

        let segment = block_b.text_segment();
        if segment >= RADIO_TEXT_SEGMENTS {
            return;
        }
        let start = usize::from(segment) * 4;
        let [a, b] = word_bytes(block_c);
        let [c, d] = word_bytes(block_d);
        self.radio_text[start..start + 4].copy_from_slice(&[a, b, c, d]);

        if let Some(len) = complete_radio_text_len(&self.radio_text) {
            let mut text = [0u8; RADIO_TEXT_LEN];
            text[..len].copy_from_slice(&self.radio_text[..len]);
            if text != self.info.radio_text {
                debug!("RDS radio text complete ({} chars)", len);
            }
            self.info.radio_text = text;
        }
    }

    fn alternate_frequency_codes(&mut self, block_c: u16) {
        for code in word_bytes(block_c) {
            if code > AF_COUNT_BASE && code < AF_COUNT_END {
                self.info.alternate_frequencies_count = code - AF_COUNT_BASE;
                self.af_cursor = 0;
            }
        }
        let count = usize::from(self.info.alternate_frequencies_count);
        for code in word_bytes(block_c) {
            if code > 0 && code < AF_FREQUENCY_END && self.af_cursor < count {
                self.info.alternate_frequencies[self.af_cursor] = BAND_BOTTOM + u16::from(code);
                self.af_cursor += 1;
            }
        }
    }

    fn station_name_group(&mut self, block_b: BlockB, block_d: u16) {
        let segment = block_b.name_segment();
        if segment >= STATION_NAME_SEGMENTS {
            return;
        }
        let start = usize::from(segment) * 2;
        self.station_name[start..start + 2].copy_from_slice(&word_bytes(block_d));

        if self.station_name.iter().all(|&b| b != 0) {
            if self.station_name != self.info.station_name {
                debug!("RDS station name complete");
            }
            self.info.station_name = self.station_name;
        }
    }
}

/// Length of the publishable message in `scratch`, or `None` while segments
/// are still missing.
///
/// A carriage return terminates the message. Senders that skip the terminator
/// fill all 64 characters instead, usually padding with spaces; that padding
/// is cut off.
fn complete_radio_text_len(scratch: &[u8; RADIO_TEXT_LEN]) -> Option<usize> {
    let mut trailing_spaces_from = None;
    for (i, &ch) in scratch.iter().enumerate() {
        match ch {
            CARRIAGE_RETURN => return Some(i),
            0 => return None,
            b' ' => {
                trailing_spaces_from.get_or_insert(i);
            }
            _ => trailing_spaces_from = None,
        }
    }
    Some(trailing_spaces_from.unwrap_or(RADIO_TEXT_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{Bits, Reg};

    fn group(block_a: u16, block_b: u16, block_c: u16, block_d: u16) -> RegisterFile {
        let mut regs = RegisterFile::default();
        regs.set(Reg::STATUSRSSI, Bits::RDSR);
        regs.set(Reg::RDSA, block_a);
        regs.set(Reg::RDSB, block_b);
        regs.set(Reg::RDSC, block_c);
        regs.set(Reg::RDSD, block_d);
        regs
    }

    fn word(text: &[u8]) -> u16 {
        u16::from_be_bytes([text[0], text[1]])
    }

    fn radio_text(segment: u8, clear_flag: bool, chars: &[u8; 4]) -> RegisterFile {
        let block_b = (2 << 12) | (u16::from(clear_flag) << 4) | u16::from(segment);
        group(0x1234, block_b, word(&chars[..2]), word(&chars[2..]))
    }

    fn station_name(segment: u8, chars: &[u8; 2]) -> RegisterFile {
        // 0B carries no AF list in block C
        group(0x1234, (1 << 11) | u16::from(segment), 0, word(chars))
    }

    fn af_codes(first: u8, second: u8) -> RegisterFile {
        group(0x1234, 0, u16::from_be_bytes([first, second]), word(b"AB"))
    }

    fn padded<const N: usize>(text: &[u8]) -> [u8; N] {
        let mut out = [0u8; N];
        out[..text.len()].copy_from_slice(text);
        out
    }

    #[test]
    fn idle_when_rds_not_ready() {
        let mut decoder = RdsDecoder::new();
        let mut regs = radio_text(0, false, b"ABCD");
        regs.set(Reg::STATUSRSSI, 0);
        assert_eq!(decoder.decode(&regs), RdsPoll::Idle);
        assert_eq!(decoder.info(), &RdsInfo::new());
    }

    #[test]
    fn pacing_hint() {
        assert_eq!(RdsPoll::Idle.pacing_ms(), 30);
        assert_eq!(RdsPoll::Consumed.pacing_ms(), 40);
    }

    #[test]
    fn program_identification_copied_from_any_group() {
        let mut decoder = RdsDecoder::new();
        assert_eq!(decoder.decode(&group(0xF201, 0x4000, 0, 0)), RdsPoll::Consumed);
        assert_eq!(decoder.info().program_identification, 0xF201);
    }

    #[test]
    fn radio_text_terminated_by_carriage_return() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(1, false, b"\r   "));
        assert_eq!(decoder.info().radio_text, [0; RADIO_TEXT_LEN]);
        decoder.decode(&radio_text(0, false, b"TEST"));
        assert_eq!(decoder.info().radio_text, padded::<RADIO_TEXT_LEN>(b"TEST"));
        assert_eq!(decoder.info().radio_text_str(), "TEST");
    }

    #[test]
    fn radio_text_without_terminator_trims_trailing_spaces() {
        let mut decoder = RdsDecoder::new();
        let mut message = [b' '; RADIO_TEXT_LEN];
        message[..20].copy_from_slice(b"NOW PLAYING SOMETHIN");
        for segment in 0..16u8 {
            let start = usize::from(segment) * 4;
            let chars: [u8; 4] = message[start..start + 4].try_into().unwrap();
            decoder.decode(&radio_text(segment, false, &chars));
        }
        assert_eq!(decoder.info().radio_text_str(), "NOW PLAYING SOMETHIN");
        assert_eq!(decoder.info().radio_text[20..], [0; 44]);
    }

    #[test]
    fn radio_text_of_only_spaces_publishes_empty() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(0, false, b"HI\r "));
        assert_eq!(decoder.info().radio_text_str(), "HI");

        for segment in 0..16u8 {
            decoder.decode(&radio_text(segment, true, b"    "));
        }
        assert_eq!(decoder.info().radio_text, [0; RADIO_TEXT_LEN]);
    }

    #[test]
    fn radio_text_inner_spaces_are_kept() {
        let mut decoder = RdsDecoder::new();
        let mut message = [b'x'; RADIO_TEXT_LEN];
        message[10] = b' ';
        message[11] = b' ';
        for segment in 0..16u8 {
            let start = usize::from(segment) * 4;
            let chars: [u8; 4] = message[start..start + 4].try_into().unwrap();
            decoder.decode(&radio_text(segment, false, &chars));
        }
        assert_eq!(decoder.info().radio_text, message);
    }

    #[test]
    fn radio_text_incomplete_is_not_published() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(0, false, b"HELL"));
        decoder.decode(&radio_text(2, false, b"\r   "));
        assert_eq!(decoder.info().radio_text, [0; RADIO_TEXT_LEN]);
    }

    #[test]
    fn radio_text_clear_flag_toggle_discards_partial_message() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(0, false, b"OLD "));
        // new message: segment 0 of the old one must not survive
        decoder.decode(&radio_text(1, true, b"\r   "));
        assert_eq!(decoder.info().radio_text, [0; RADIO_TEXT_LEN]);
        decoder.decode(&radio_text(0, true, b"NEW!"));
        assert_eq!(decoder.info().radio_text_str(), "NEW!");
    }

    #[test]
    fn radio_text_published_value_survives_until_next_completion() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(0, false, b"ONE\r"));
        assert_eq!(decoder.info().radio_text_str(), "ONE");
        decoder.decode(&radio_text(1, true, b"XXXX"));
        assert_eq!(decoder.info().radio_text_str(), "ONE");
    }

    #[test]
    fn radio_text_version_b_is_ignored() {
        let mut decoder = RdsDecoder::new();
        let regs = group(0x1234, (2 << 12) | (1 << 11), word(b"AB"), word(b"C\r"));
        assert_eq!(decoder.decode(&regs), RdsPoll::Consumed);
        assert_eq!(decoder.info().radio_text, [0; RADIO_TEXT_LEN]);
    }

    #[test]
    fn station_name_published_only_when_all_segments_present() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&station_name(2, b"DI"));
        decoder.decode(&station_name(0, b"RA"));
        decoder.decode(&station_name(1, b"DI"));
        assert_eq!(decoder.info().station_name, [0; STATION_NAME_LEN]);
        decoder.decode(&station_name(3, b"O1"));
        assert_eq!(decoder.info().station_name_str(), "RADIDIO1");
    }

    #[test]
    fn station_name_update_overwrites_published_once_complete() {
        let mut decoder = RdsDecoder::new();
        for (segment, chars) in [b"RA", b"DI", b"O ", b"1 "].into_iter().enumerate() {
            decoder.decode(&station_name(segment as u8, chars));
        }
        assert_eq!(decoder.info().station_name_str(), "RADIO 1 ");
        decoder.decode(&station_name(3, b"2 "));
        assert_eq!(decoder.info().station_name_str(), "RADIO 2 ");
    }

    #[test]
    fn alternate_frequencies_follow_announced_count() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&af_codes(226, 0));
        assert_eq!(decoder.info().alternate_frequencies_count, 2);
        decoder.decode(&af_codes(10, 98));
        decoder.decode(&af_codes(60, 0));
        assert_eq!(decoder.info().alternate_frequencies(), &[885, 973]);
        assert_eq!(decoder.info().alternate_frequencies[2], 0);
    }

    #[test]
    fn alternate_frequency_count_228_then_two_codes() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&af_codes(228, 0));
        decoder.decode(&af_codes(12, 30));
        assert_eq!(decoder.info().alternate_frequencies_count, 4);
        assert_eq!(decoder.af_cursor, 2);
        assert_eq!(decoder.info().alternate_frequencies(), &[887, 905, 0, 0]);
    }

    #[test]
    fn alternate_frequency_count_reload_restarts_cursor() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&af_codes(227, 1));
        decoder.decode(&af_codes(2, 3));
        assert_eq!(decoder.info().alternate_frequencies(), &[876, 877, 878]);
        decoder.decode(&af_codes(226, 50));
        assert_eq!(decoder.info().alternate_frequencies(), &[925, 877]);
    }

    #[test]
    fn alternate_frequency_codes_out_of_range_are_ignored() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&af_codes(224, 250));
        assert_eq!(decoder.info().alternate_frequencies_count, 0);
        decoder.decode(&af_codes(230, 205));
        decoder.decode(&af_codes(0, 204));
        assert_eq!(decoder.info().alternate_frequencies(), &[1079, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn alternate_frequencies_only_from_version_a() {
        let mut decoder = RdsDecoder::new();
        let regs = group(0x1234, 1 << 11, u16::from_be_bytes([226, 10]), word(b"AB"));
        decoder.decode(&regs);
        assert_eq!(decoder.info().alternate_frequencies_count, 0);
    }

    #[test]
    fn reset_clears_scratch_and_published_state() {
        let mut decoder = RdsDecoder::new();
        decoder.decode(&radio_text(0, true, b"AB\r "));
        decoder.decode(&station_name(0, b"XY"));
        decoder.decode(&af_codes(226, 10));
        decoder.reset();

        assert_eq!(decoder.info(), &RdsInfo::new());
        assert_eq!(decoder.station_name, [0; STATION_NAME_LEN]);
        assert_eq!(decoder.radio_text, [0; RADIO_TEXT_LEN]);
        assert_eq!(decoder.last_clear_flag, None);
        assert_eq!(decoder.af_cursor, 0);
    }

    #[test]
    fn ingest_reads_through_the_bus() {
        struct OneGroup(RegisterFile);
        impl RegisterBus for OneGroup {
            fn read_all(&mut self) -> Result<RegisterFile, Error> {
                Ok(self.0)
            }
            fn write_control_block(&mut self, _: &[u16; 6]) -> Result<(), Error> {
                Ok(())
            }
        }

        let mut decoder = RdsDecoder::new();
        let mut bus = OneGroup(radio_text(0, false, b"HI\r "));
        assert_eq!(decoder.ingest_one_group(&mut bus), Ok(RdsPoll::Consumed));
        assert_eq!(decoder.info().radio_text_str(), "HI");
    }
}
