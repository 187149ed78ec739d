/// FM de-emphasis time constant, selected by broadcast region.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DeEmphasis {
    /// 75 µs, USA
    Us75,
    /// 50 µs, Europe, Australia, Japan
    #[default]
    Us50,
}

/// How long the tune/seek protocol waits for the chip's STC transition.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PollLimit {
    /// Spin until the chip answers.
    #[default]
    Unbounded,
    /// Give up with [`Error::NoResponse`](crate::Error::NoResponse) after this
    /// many register reads in a single polling phase.
    Reads(u32),
}

impl PollLimit {
    /// `true` once `reads` register reads have been spent.
    pub(crate) fn exhausted(&self, reads: u32) -> bool {
        match self {
            PollLimit::Unbounded => false,
            PollLimit::Reads(limit) => reads >= *limit,
        }
    }
}

/// Driver configuration applied at power-up and during tune/seek.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    pub de_emphasis: DeEmphasis,
    /// Volume applied at power-up (0..=15).
    pub volume: u8,
    pub poll_limit: PollLimit,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            de_emphasis: DeEmphasis::default(),
            volume: 1,
            poll_limit: PollLimit::default(),
        }
    }
}

impl Config {
    pub fn with_de_emphasis(mut self, de_emphasis: DeEmphasis) -> Self {
        self.de_emphasis = de_emphasis;
        self
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_poll_limit(mut self, poll_limit: PollLimit) -> Self {
        self.poll_limit = poll_limit;
        self
    }
}
