//! User-facing run log

use std::fmt;
use std::sync::Arc;

use tracing::info;

/// Observer called with each run-log line as it is written
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Ordered lines describing one run
///
/// Every line is mirrored to tracing and, when set, to the sink.
#[derive(Default, Clone)]
pub struct RunLog {
    lines: Vec<String>,
    sink: Option<LogSink>,
}

impl RunLog {
    pub fn new(sink: Option<LogSink>) -> Self {
        Self { lines: Vec::new(), sink }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "tripplanner::run", "{}", line);
        if let Some(sink) = &self.sink {
            sink(&line);
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("lines", &self.lines.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
