use std::fs::File;
use std::io::BufRead;

/// Opens a trace file for sequential reading
///
/// Traces from real programs run to hundreds of megabytes, so on unix systems the file is memory
/// mapped with sequential access advice instead of being read through a buffer
pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Safety: the trace is only read, and isn't expected to change while the simulator runs
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(m))
        }
    }
}
