//! JSON shapes shared by the OctoPrint-style `/api/job` endpoints.
//!
//! Every field is optional: printers omit or null out whatever does not
//! apply to the current state.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileInfo {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobInfo {
    pub file: Option<FileInfo>,
}

impl JobInfo {
    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().and_then(|f| f.name.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobProgress {
    pub completion: Option<f64>,
    #[serde(rename = "printTimeLeft")]
    pub print_time_left: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TempReading {
    pub actual: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Temperatures {
    pub tool0: Option<TempReading>,
    pub bed: Option<TempReading>,
}

impl Temperatures {
    pub fn nozzle(&self) -> Option<f64> {
        self.tool0.as_ref().and_then(|t| t.actual)
    }

    pub fn bed(&self) -> Option<f64> {
        self.bed.as_ref().and_then(|t| t.actual)
    }
}
