use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tracking::TrackedPoint2D;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EmptyListSendMode {
    Never,
    Once,
    Always,
}

#[derive(Serialize)]
struct PointsMessage<'a> {
    frame: usize,
    points: &'a [TrackedPoint2D],
}

/// Writes tracked points as JSON lines, one per frame
pub struct PointsOutput {
    empty_list_send_mode: EmptyListSendMode,
    empty_lists_sent: u128,
}

impl PointsOutput {
    pub fn new(empty_list_send_mode: EmptyListSendMode) -> Self {
        PointsOutput {
            empty_list_send_mode,
            empty_lists_sent: 0,
        }
    }

    fn should_send(&self, points: &[TrackedPoint2D]) -> bool {
        if !points.is_empty() {
            return true;
        }
        match self.empty_list_send_mode {
            EmptyListSendMode::Always => true,
            EmptyListSendMode::Once => self.empty_lists_sent < 1,
            EmptyListSendMode::Never => false,
        }
    }

    /// Returns whether a line was written
    pub fn emit<W: Write>(
        &mut self,
        writer: &mut W,
        frame: usize,
        points: &[TrackedPoint2D],
    ) -> Result<bool> {
        let send = self.should_send(points);
        if send {
            serde_json::to_writer(&mut *writer, &PointsMessage { frame, points })?;
            writeln!(writer)?;
        }

        if points.is_empty() {
            self.empty_lists_sent += 1; // count
        } else {
            self.empty_lists_sent = 0; // reset
        }

        Ok(send)
    }
}
