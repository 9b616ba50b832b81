//! GitHub Actions step outputs and workflow commands

use tracing::debug;
use uuid::Uuid;

use crate::errors::AwaitError;
use crate::filesys::file::File;

/// Escape a value for use in a workflow command
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Line(s) appended to `GITHUB_OUTPUT` for one output
///
/// Neither the name nor the value may contain the delimiter, otherwise the
/// runner would end the value early and read the rest as extra outputs.
pub fn output_entry(name: &str, value: &str, delimiter: &str) -> Result<String, AwaitError> {
    if name.contains(delimiter) {
        return Err(AwaitError::Internal(format!(
            "Unexpected input: name should not contain the delimiter \"{}\"",
            delimiter
        )));
    }
    if value.contains(delimiter) {
        return Err(AwaitError::Internal(format!(
            "Unexpected input: value should not contain the delimiter \"{}\"",
            delimiter
        )));
    }
    if name.contains(['\n', '\r', '=']) {
        return Err(AwaitError::Internal(format!("Invalid output name: {:?}", name)));
    }

    if value.contains(['\n', '\r']) {
        Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
    } else {
        Ok(format!("{name}={value}\n"))
    }
}

/// Writes step outputs and failure markers for the invoking workflow
#[derive(Debug, Clone)]
pub struct ActionOutputs {
    output_file: Option<File>,
    failed: bool,
}

impl ActionOutputs {
    pub fn new(output_file: Option<File>) -> Self {
        Self {
            output_file,
            failed: false,
        }
    }

    /// Outputs go to the file named by `GITHUB_OUTPUT` when set
    pub fn from_env() -> Self {
        let output_file = std::env::var("GITHUB_OUTPUT")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(File::new);
        Self::new(output_file)
    }

    /// Whether `set_failed` was called
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Set one step output
    pub async fn set_output(&mut self, name: &str, value: &str) -> Result<(), AwaitError> {
        debug!("Output {}={}", name, value);
        match &self.output_file {
            Some(file) => {
                let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
                file.append_string(&output_entry(name, value, &delimiter)?).await
            }
            None => {
                println!("::set-output name={}::{}", name, escape_data(value));
                Ok(())
            }
        }
    }

    /// Mark the step failed; the process must exit non-zero afterwards
    pub fn set_failed(&mut self, message: &str) {
        self.failed = true;
        println!("::error::{}", escape_data(message));
    }
}
