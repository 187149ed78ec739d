//! Si4703 register map and bit-field accessors.

/// Number of registers in the chip's register file.
pub const REGISTER_COUNT: usize = 16;
/// Number of consecutive control registers written per transaction (0x02..=0x07).
pub const CONTROL_BLOCK_LEN: usize = 6;

pub struct Reg;
impl Reg {
    pub const DEVICEID: usize = 0x00;
    pub const CHIPID: usize = 0x01;
    pub const POWERCFG: usize = 0x02;
    pub const CHANNEL: usize = 0x03;
    pub const SYSCONFIG1: usize = 0x04;
    pub const SYSCONFIG2: usize = 0x05;
    pub const SYSCONFIG3: usize = 0x06;
    pub const TEST1: usize = 0x07;
    pub const TEST2: usize = 0x08;
    pub const BOOTCONFIG: usize = 0x09;
    pub const STATUSRSSI: usize = 0x0A;
    pub const READCHAN: usize = 0x0B;
    pub const RDSA: usize = 0x0C;
    pub const RDSB: usize = 0x0D;
    pub const RDSC: usize = 0x0E;
    pub const RDSD: usize = 0x0F;
    /// First register of the writable control block.
    pub const CONTROL_START: usize = Self::POWERCFG;
}

pub struct Bits;
impl Bits {
    // POWERCFG
    pub const SMUTE: u16 = 1 << 15;
    pub const DMUTE: u16 = 1 << 14;
    pub const SKMODE: u16 = 1 << 10;
    pub const SEEKUP: u16 = 1 << 9;
    pub const SEEK: u16 = 1 << 8;
    pub const DISABLE: u16 = 1 << 6;
    pub const ENABLE: u16 = 1 << 0;
    // CHANNEL
    pub const TUNE: u16 = 1 << 15;
    pub const CHAN_MASK: u16 = 0x03FF;
    // SYSCONFIG1
    pub const RDS: u16 = 1 << 12;
    pub const DE: u16 = 1 << 11;
    // SYSCONFIG2
    pub const SPACE1: u16 = 1 << 5;
    pub const SPACE0: u16 = 1 << 4;
    pub const VOLUME_MASK: u16 = 0x000F;
    // TEST1
    pub const XOSCEN: u16 = 1 << 15;
    pub const AHIZEN: u16 = 1 << 14;
    // STATUSRSSI
    pub const RDSR: u16 = 1 << 15;
    pub const STC: u16 = 1 << 14;
    pub const SFBL: u16 = 1 << 13;
    pub const AFCRL: u16 = 1 << 12;
    pub const RDSS: u16 = 1 << 11;
    pub const STEREO: u16 = 1 << 8;
    pub const RSSI_MASK: u16 = 0x00FF;
    // READCHAN
    pub const READCHAN_MASK: u16 = 0x03FF;
}

/// Lowest channel of the band, in tenths of MHz (87.5 MHz).
pub const BAND_BOTTOM: u16 = 875;
/// Highest channel of the band, in tenths of MHz (108.0 MHz).
pub const BAND_TOP: u16 = 1080;

/// Convert a channel in tenths of MHz (973 = 97.3 MHz) to the chip's CHAN field.
///
/// Assumes 100 kHz spacing on the 87.5–108 MHz band. Channels below the band
/// bottom saturate to 0.
pub fn channel_to_native(channel: u16) -> u16 {
    let native = (u32::from(channel) * 10).saturating_sub(u32::from(BAND_BOTTOM) * 10) / 10;
    (native as u16) & Bits::CHAN_MASK
}

/// Convert a READCHAN value back to tenths of MHz.
pub fn native_to_channel(native: u16) -> u16 {
    (native & Bits::READCHAN_MASK) + BAND_BOTTOM
}

/// A snapshot of the chip's sixteen registers, indexed by register address.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RegisterFile(pub [u16; REGISTER_COUNT]);

impl RegisterFile {
    pub fn get(&self, reg: usize) -> u16 {
        self.0[reg]
    }

    pub fn set(&mut self, reg: usize, value: u16) {
        self.0[reg] = value;
    }

    pub fn set_bits(&mut self, reg: usize, bits: u16) {
        self.0[reg] |= bits;
    }

    pub fn clear_bits(&mut self, reg: usize, bits: u16) {
        self.0[reg] &= !bits;
    }

    /// Replace the bits selected by `mask` in `reg` with `value`.
    pub fn update(&mut self, reg: usize, mask: u16, value: u16) {
        self.0[reg] = (self.0[reg] & !mask) | (value & mask);
    }

    /// The writable registers 0x02..=0x07 in write order.
    pub fn control_block(&self) -> [u16; CONTROL_BLOCK_LEN] {
        let mut block = [0u16; CONTROL_BLOCK_LEN];
        block.copy_from_slice(&self.0[Reg::CONTROL_START..Reg::CONTROL_START + CONTROL_BLOCK_LEN]);
        block
    }

    pub fn seek_tune_complete(&self) -> bool {
        self.0[Reg::STATUSRSSI] & Bits::STC != 0
    }

    pub fn seek_failed(&self) -> bool {
        self.0[Reg::STATUSRSSI] & Bits::SFBL != 0
    }

    pub fn rds_ready(&self) -> bool {
        self.0[Reg::STATUSRSSI] & Bits::RDSR != 0
    }

    pub fn stereo(&self) -> bool {
        self.0[Reg::STATUSRSSI] & Bits::STEREO != 0
    }

    pub fn rssi(&self) -> u8 {
        (self.0[Reg::STATUSRSSI] & Bits::RSSI_MASK) as u8
    }

    pub fn read_channel(&self) -> u16 {
        self.0[Reg::READCHAN] & Bits::READCHAN_MASK
    }

    pub fn volume(&self) -> u8 {
        (self.0[Reg::SYSCONFIG2] & Bits::VOLUME_MASK) as u8
    }

    /// DMUTE is "disable mute": the output is muted while it is clear.
    pub fn muted(&self) -> bool {
        self.0[Reg::POWERCFG] & Bits::DMUTE == 0
    }

    pub fn block_a(&self) -> u16 {
        self.0[Reg::RDSA]
    }

    pub fn block_b(&self) -> BlockB {
        BlockB(self.0[Reg::RDSB])
    }

    pub fn block_c(&self) -> u16 {
        self.0[Reg::RDSC]
    }

    pub fn block_d(&self) -> u16 {
        self.0[Reg::RDSD]
    }
}

/// RDS block B: group type code, version flag and group specific low bits.
///
/// ```text
/// 15..12  group type
/// 11      version B
/// 10      traffic program
/// 9..5    program type
/// 4..0    group specific
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockB(pub u16);

impl BlockB {
    pub fn group_type(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    pub fn version_b(&self) -> bool {
        self.0 & (1 << 11) != 0
    }

    pub fn program_type(&self) -> u8 {
        ((self.0 >> 5) & 0x1F) as u8
    }

    /// Group 2A text A/B flag. A change means the sender started a new message.
    pub fn text_clear_flag(&self) -> bool {
        self.0 & (1 << 4) != 0
    }

    /// Group 2A text segment address (0..=15).
    pub fn text_segment(&self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    /// Group 0A/0B program service name segment address (0..=3).
    pub fn name_segment(&self) -> u8 {
        (self.0 & 0x03) as u8
    }
}

/// Split an RDS data word into its two characters, high byte first.
pub fn word_bytes(word: u16) -> [u8; 2] {
    word.to_be_bytes()
}
