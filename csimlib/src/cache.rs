use crate::config::{CacheGeometry, GeometryError};

/// A single cache line
///
/// Only the metadata needed to decide hits, misses and evictions is kept, the simulator never
/// models the data in the block
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    /// Meaningless while the line is invalid
    pub tag: u64,
    /// Trace lines since this line was last touched, 0 is most recent
    pub age: u64,
}

impl Default for CacheLine {
    fn default() -> Self {
        Self {
            valid: false,
            tag: u64::MAX,
            age: 0,
        }
    }
}

/// The line store of a set associative cache
///
/// Lines are kept in one flat vector, set `i` owns the window `[i * E, (i + 1) * E)`. Positions
/// returned by the lookup methods are indices into the whole store, so they can be handed
/// straight back to `install` and `touch`
///
/// Every scan is linear in the set size. Sets are small (usually no more than 16 lines) so this
/// beats maintaining a priority structure per set
pub struct CacheStore {
    lines: Vec<CacheLine>,
    lines_per_set: usize,
}

impl CacheStore {
    /// Allocates an empty store for a geometry
    ///
    /// The geometry is validated first, and allocation failures are reported rather than aborting,
    /// as large `s` values can easily ask for more memory than is available
    pub fn new(geometry: &CacheGeometry) -> Result<Self, GeometryError> {
        let total_lines = geometry.validate()?;
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(total_lines)
            .map_err(|e| GeometryError::Allocation {
                lines: total_lines,
                reason: e.to_string(),
            })?;
        lines.resize(total_lines, CacheLine::default());
        Ok(Self {
            lines,
            // Can't truncate, validate checked the total fits in a usize
            lines_per_set: geometry.lines_per_set as usize,
        })
    }

    #[inline]
    fn base(&self, set_index: u64) -> usize {
        set_index as usize * self.lines_per_set
    }

    /// The lines of a set, in position order
    pub fn set(&self, set_index: u64) -> &[CacheLine] {
        let base = self.base(set_index);
        &self.lines[base..base + self.lines_per_set]
    }

    /// A single line, by position in the whole store
    pub fn line(&self, position: usize) -> &CacheLine {
        &self.lines[position]
    }

    /// Finds the position of the valid line holding `tag` in a set, if there is one
    pub fn find(&self, set_index: u64, tag: u64) -> Option<usize> {
        let base = self.base(set_index);
        self.set(set_index)
            .iter()
            .position(|line| line.valid && line.tag == tag)
            .map(|offset| base + offset)
    }

    /// Finds the lowest positioned invalid line in a set, if there is one
    pub fn first_free(&self, set_index: u64) -> Option<usize> {
        let base = self.base(set_index);
        self.set(set_index)
            .iter()
            .position(|line| !line.valid)
            .map(|offset| base + offset)
    }

    /// Finds the least recently used line of a set
    ///
    /// This is the line with the greatest age. On a tie the lowest position wins, as only a
    /// strictly greater age replaces the current candidate
    pub fn oldest(&self, set_index: u64) -> usize {
        let base = self.base(set_index);
        let mut oldest = base;
        let mut max_age = self.lines[base].age;
        let mut position = base + 1;
        while position < base + self.lines_per_set {
            if self.lines[position].age > max_age {
                max_age = self.lines[position].age;
                oldest = position;
            }
            position += 1;
        }
        oldest
    }

    /// Fills a line with a new block, making it the most recently used line of its set
    pub fn install(&mut self, position: usize, tag: u64) {
        self.lines[position] = CacheLine {
            valid: true,
            tag,
            age: 0,
        };
    }

    /// Marks a line as the most recently used line of its set
    pub fn touch(&mut self, position: usize) {
        self.lines[position].age = 0;
    }

    /// Ages every valid line by one. Invalid lines stay at 0
    pub fn age_all(&mut self) {
        for line in self.lines.iter_mut().filter(|line| line.valid) {
            line.age += 1;
        }
    }

    /// Gets the number of lines which have never been filled. Useful for analysing cache
    /// performance or debugging
    pub fn uninitialised_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
