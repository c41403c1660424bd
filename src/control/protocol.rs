//! Messages exchanged with a run: commands in, events out.
//! Both serialize as JSON objects tagged by `type`, with camelCase fields.

use crate::assignment::RegionAggregate;
use crate::config::{BorderWalk, TargetSide};
use crate::error::BorderForgeError;
use crate::fitness::outcome::Tally;
use crate::fitness::SubScores;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Idle,
    Running,
    Stopping,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Start {
        /// Absolute generation to stop at. On resume it must lie ahead of the paused run.
        generations: u64,
        render_every: u64,
        #[serde(default)]
        resume: bool,
        #[serde(default)]
        target_side: Option<TargetSide>,
        #[serde(default)]
        mode: Option<BorderWalk>,
    },
    Stop,
    Reset,
    RestoreBest,
    Snapshot,
}

impl Command {
    pub fn start(generations: u64, render_every: u64) -> Self {
        Command::Start {
            generations,
            render_every,
            resume: false,
            target_side: None,
            mode: None,
        }
    }

    pub fn resume(generations: u64, render_every: u64) -> Self {
        Command::Start {
            generations,
            render_every,
            resume: true,
            target_side: None,
            mode: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub generation: u64,
    /// Unit id to region, for the fittest member of the current population.
    pub assignment: BTreeMap<String, u32>,
    pub region_aggregates: Vec<RegionAggregate>,
    pub score: f64,
    pub subscores: SubScores,
    pub best_score: f64,
    pub best_generation: u64,
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub generation: u64,
    pub target_generations: u64,
    pub best_score: Option<f64>,
    pub best_generation: u64,
    pub target_side: Option<TargetSide>,
    pub fitness: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Configuration,
    InvalidCommand,
    DataIntegrity,
    Io,
}

impl From<&BorderForgeError> for ErrorKind {
    fn from(e: &BorderForgeError) -> Self {
        match e {
            BorderForgeError::Config(_) => ErrorKind::Configuration,
            BorderForgeError::InvalidCommand(_) => ErrorKind::InvalidCommand,
            BorderForgeError::DataIntegrity(_) => ErrorKind::DataIntegrity,
            BorderForgeError::Io(_) | BorderForgeError::Csv(_) | BorderForgeError::Json(_) => {
                ErrorKind::Io
            }
        }
    }
}

impl ErrorKind {
    /// Rebuilds a crate error from an `Error` event on the consumer side.
    pub fn into_error(self, message: String) -> BorderForgeError {
        match self {
            ErrorKind::Configuration => BorderForgeError::Config(message),
            ErrorKind::InvalidCommand => BorderForgeError::InvalidCommand(message),
            ErrorKind::DataIntegrity => BorderForgeError::DataIntegrity(message),
            ErrorKind::Io => BorderForgeError::Io(std::io::Error::other(message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    Started {
        generation: u64,
        total: u64,
        resumed: bool,
    },
    GenerationUpdate(GenerationSummary),
    Paused {
        generation: u64,
        total: u64,
    },
    Stopping,
    Completed {
        generation: u64,
        best_score: f64,
    },
    ResetComplete {
        assignment: BTreeMap<String, u32>,
        region_aggregates: Vec<RegionAggregate>,
    },
    BestRestored {
        score: f64,
        generation: u64,
    },
    Snapshot(RunSnapshot),
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl Event {
    pub fn error(e: &BorderForgeError) -> Self {
        Event::Error {
            kind: e.into(),
            message: e.to_string(),
        }
    }

    /// Intermediate progress that may be dropped when the consumer lags.
    pub fn is_droppable(&self) -> bool {
        matches!(self, Event::GenerationUpdate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"start","generations":500,"renderEvery":10,"targetSide":"side2"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                generations: 500,
                render_every: 10,
                resume: false,
                target_side: Some(TargetSide::Side2),
                mode: None,
            }
        );
        let cmd: Command = serde_json::from_str(
            r#"{"type":"start","generations":80,"renderEvery":1,"resume":true,"mode":"follow_the_leader"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                generations: 80,
                render_every: 1,
                resume: true,
                target_side: None,
                mode: Some(BorderWalk::FollowTheLeader),
            }
        );
        let stop: Command = serde_json::from_str(r#"{"type":"restoreBest"}"#).unwrap();
        assert_eq!(stop, Command::RestoreBest);
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(Event::Paused {
            generation: 7,
            total: 100,
        })
        .unwrap();
        assert_eq!(json["type"], "paused");
        assert_eq!(json["generation"], 7);

        let err = Event::error(&BorderForgeError::InvalidCommand("busy".into()));
        let json = serde_json::to_value(err).unwrap();
        assert_eq!(json["kind"], "invalidCommand");
    }
}
