use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::Record;

/// Identifies one load request. Tickets increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(usize),
    /// A newer load was issued after this one; its result was dropped.
    Stale,
    /// The load failed; the previous records are untouched.
    Rejected,
}

/// Session state: the single record collection plus the configuration it
/// was built from.
#[derive(Debug)]
pub struct AppState {
    config: Config,
    records: Vec<Record>,
    issued: u64,
    last_error: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            records: Vec::new(),
            issued: 0,
            last_error: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Replaces the collection wholesale, but only for the newest ticket.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Record>>) -> LoadOutcome {
        if ticket.0 != self.issued {
            warn!(ticket = ticket.0, newest = self.issued, "discarding stale load");
            return LoadOutcome::Stale;
        }

        match result {
            Ok(records) => {
                info!(records = records.len(), "record collection replaced");
                let count = records.len();
                self.records = records;
                self.last_error = None;
                LoadOutcome::Applied(count)
            }
            Err(err) => {
                warn!(error = %err, "load failed, keeping previous records");
                self.last_error = Some(err.to_string());
                LoadOutcome::Rejected
            }
        }
    }
}
