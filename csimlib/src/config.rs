use serde::Deserialize;
use thiserror::Error;

/// Width of the simulated address space in bits
pub const ADDRESS_BITS: u32 = u64::BITS;

/// Errors raised when a geometry can't back a usable cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("a cache set needs at least one line, got E = {lines_per_set}")]
    NoLines { lines_per_set: u64 },
    #[error("s = {set_bits} and b = {block_bits} don't fit together in a 64 bit address")]
    AddressWidth { set_bits: u32, block_bits: u32 },
    #[error("2^{set_bits} sets of {lines_per_set} lines can't be addressed on this host")]
    TooManyLines { set_bits: u32, lines_per_set: u64 },
    #[error("couldn't allocate {lines} cache lines: {reason}")]
    Allocation { lines: usize, reason: String },
}

/// The geometry of a set associative cache, as given on the command line or in a JSON file
///
/// ```json
/// { "s": 4, "E": 1, "b": 4 }
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheGeometry {
    /// Number of set index bits (`s`), giving `2^s` sets
    #[serde(alias = "s")]
    pub set_bits: u32,
    /// Number of lines per set (`E`), the associativity
    #[serde(alias = "E")]
    pub lines_per_set: u64,
    /// Number of block offset bits (`b`), giving `2^b` byte blocks
    #[serde(alias = "b")]
    pub block_bits: u32,
}

impl CacheGeometry {
    pub fn new(set_bits: u32, lines_per_set: u64, block_bits: u32) -> Self {
        Self {
            set_bits,
            lines_per_set,
            block_bits,
        }
    }

    /// Checks the geometry can be simulated, returning the total number of lines if so
    ///
    /// Fails if a set would have no lines, if the set index and block offset don't fit into a
    /// 64 bit address together, or if the line count overflows `usize`
    pub fn validate(&self) -> Result<usize, GeometryError> {
        if self.lines_per_set == 0 {
            return Err(GeometryError::NoLines {
                lines_per_set: self.lines_per_set,
            });
        }
        if self.set_bits > ADDRESS_BITS || self.block_bits > ADDRESS_BITS - self.set_bits {
            return Err(GeometryError::AddressWidth {
                set_bits: self.set_bits,
                block_bits: self.block_bits,
            });
        }
        let too_many = GeometryError::TooManyLines {
            set_bits: self.set_bits,
            lines_per_set: self.lines_per_set,
        };
        let num_sets = 1usize.checked_shl(self.set_bits).ok_or_else(|| too_many.clone())?;
        let lines_per_set = usize::try_from(self.lines_per_set).map_err(|_| too_many.clone())?;
        num_sets.checked_mul(lines_per_set).ok_or(too_many)
    }

    /// Number of sets, `2^s`. Only meaningful for a validated geometry
    pub fn num_sets(&self) -> u64 {
        1u64.checked_shl(self.set_bits).unwrap_or(0)
    }

    /// Total number of lines, `2^s * E`. Only meaningful for a validated geometry
    pub fn total_lines(&self) -> u64 {
        self.num_sets().saturating_mul(self.lines_per_set)
    }

    /// Mask selecting the low `s` bits once the block offset has been shifted out
    fn set_mask(&self) -> u64 {
        match ADDRESS_BITS.checked_sub(self.set_bits) {
            Some(ADDRESS_BITS) | None => 0,
            Some(unused) => u64::MAX >> unused,
        }
    }

    /// Splits an address into its tag and set index, discarding the block offset
    ///
    /// The low `b` bits are dropped, the next `s` bits are the set index, and everything above
    /// is the tag. Shifts by the full address width yield 0 rather than wrapping, so `s = 0`,
    /// `b = 0` and `s + b = 64` are all exact
    ///
    /// # Arguments
    ///
    /// * `address`: The address being accessed
    ///
    /// returns: (u64, u64), the tag then the set index
    ///
    /// # Examples
    ///
    /// ```
    /// use csimlib::config::CacheGeometry;
    /// let geometry = CacheGeometry::new(1, 1, 1);
    /// assert_eq!(geometry.decompose(0b110), (1, 1));
    /// ```
    pub fn decompose(&self, address: u64) -> (u64, u64) {
        let block = address.checked_shr(self.block_bits).unwrap_or(0);
        let set_index = block & self.set_mask();
        let tag = block.checked_shr(self.set_bits).unwrap_or(0);
        (tag, set_index)
    }
}
