use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use crate::config::CacheGeometry;

/// Directory holding the regression traces, relative to the crate root
pub const TRACE_FILES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/traces");
/// Directory holding the expected results, one JSON file per trace and geometry
pub const EXPECTED_OUTPUTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/traces/expected");

/// A regression case: a trace, the geometry to replay it with, and the expected result file
pub struct TestCasePaths {
    pub name: String,
    pub trace: PathBuf,
    pub geometry: CacheGeometry,
    pub output: PathBuf,
}

/// Finds every regression case, sorted by name
///
/// Expected results are named `<trace>-s<s>-E<E>-b<b>.json`, and replay `<trace>.trace` with that
/// geometry
pub fn get_cases() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    get_cases_in(Path::new(TRACE_FILES_PATH), Path::new(EXPECTED_OUTPUTS_PATH))
}

pub fn get_cases_in(traces: &Path, expected: &Path) -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let output_pattern = Regex::new(r"^(?P<trace>[0-9a-zA-Z_]+)-s(?P<s>[0-9]+)-E(?P<E>[0-9]+)-b(?P<b>[0-9]+)\.json$")?;
    let mut file_names = Vec::new();
    for entry in fs::read_dir(expected)? {
        let file_name = entry?
            .file_name()
            .into_string()
            .map_err(|e| format!("Can't convert OS string ({e:?}) to standard string"))?;
        if output_pattern.is_match(&file_name) {
            file_names.push(file_name);
        }
    }
    file_names.sort();
    let mut out = Vec::new();
    for file_name in file_names {
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name".to_string())?;
        let trace = tokens.name("trace").ok_or("Couldn't get the trace from the output file name".to_string())?.as_str();
        let geometry = CacheGeometry::new(tokens["s"].parse()?, tokens["E"].parse()?, tokens["b"].parse()?);
        out.push(TestCasePaths {
            name: file_name.trim_end_matches(".json").to_string(),
            trace: traces.join(format!("{trace}.trace")),
            geometry,
            output: expected.join(&file_name),
        })
    }
    Ok(out)
}
