use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors from reading a trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("line {line}: unknown operation `{operation}`")]
    UnknownOperation { line: usize, operation: char },
    #[error("line {line}: malformed trace record `{content}`, expected `<op> <hex address>,<size>`")]
    Malformed { line: usize, content: String },
    #[error("line {line}: couldn't read the trace: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl TraceError {
    /// Attaches a line number to an error produced without one
    fn at_line(self, line: usize) -> Self {
        match self {
            TraceError::UnknownOperation { operation, .. } => TraceError::UnknownOperation { line, operation },
            TraceError::Malformed { content, .. } => TraceError::Malformed { line, content },
            TraceError::Io { source, .. } => TraceError::Io { line, source },
        }
    }
}

/// The kind of memory access a trace line records
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Instruction fetch, not simulated
    Instruction,
    Load,
    Store,
    /// A load followed by a store to the same address
    Modify,
}

impl Operation {
    /// The number of data cache accesses the operation performs
    pub fn accesses(&self) -> usize {
        match self {
            Operation::Instruction => 0,
            Operation::Load | Operation::Store => 1,
            Operation::Modify => 2,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Operation::Instruction => 'I',
            Operation::Load => 'L',
            Operation::Store => 'S',
            Operation::Modify => 'M',
        }
    }
}

impl TryFrom<char> for Operation {
    type Error = TraceError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'I' => Ok(Operation::Instruction),
            'L' => Ok(Operation::Load),
            'S' => Ok(Operation::Store),
            'M' => Ok(Operation::Modify),
            operation => Err(TraceError::UnknownOperation { line: 0, operation }),
        }
    }
}

/// One decoded trace line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub operation: Operation,
    pub address: u64,
    /// Bytes accessed. Kept for reporting, hits and misses are decided per block
    pub size: u64,
}

impl AccessRecord {
    pub fn new(operation: Operation, address: u64, size: u64) -> Self {
        Self {
            operation,
            address,
            size,
        }
    }
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x},{}", self.operation.as_char(), self.address, self.size)
    }
}

/// Parses a record in the valgrind lackey format, such as ` L 7ff000398,8`
///
/// Data accesses are indented by a space and instruction fetches aren't, but leading whitespace
/// is ignored either way
///
/// # Examples
///
/// ```
/// use csimlib::trace::{AccessRecord, Operation};
/// let record: AccessRecord = " M 7ff000398,8".parse().unwrap();
/// assert_eq!(record, AccessRecord::new(Operation::Modify, 0x7ff000398, 8));
/// ```
impl FromStr for AccessRecord {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TraceError::Malformed {
            line: 0,
            content: s.trim_end().to_string(),
        };
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let operation = Operation::try_from(chars.next().ok_or_else(malformed)?)?;
        let rest = chars.as_str();
        // The operation must be followed by whitespace, `L10,1` isn't a valid record
        if !rest.starts_with(char::is_whitespace) {
            return Err(malformed());
        }
        let (address, size) = rest.trim_start().split_once(',').ok_or_else(malformed)?;
        let address = u64::from_str_radix(address.trim(), 16).map_err(|_| malformed())?;
        let size = size.trim().parse::<u64>().map_err(|_| malformed())?;
        Ok(AccessRecord::new(operation, address, size))
    }
}

/// Reads records from a trace, one per line, skipping blank lines
///
/// Errors carry the line number they were found on. The reader doesn't stop after an error, but
/// the simulator does
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: String,
    line: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
        }
    }

    /// The number of lines read so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            self.line += 1;
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => {
                    self.line -= 1;
                    return None;
                }
                Ok(_) => {}
                Err(source) => return Some(Err(TraceError::Io { line: self.line, source })),
            }
            if self.buffer.trim().is_empty() {
                continue;
            }
            return Some(self.buffer.parse::<AccessRecord>().map_err(|e| e.at_line(self.line)));
        }
    }
}
