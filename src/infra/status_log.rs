use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};

use crate::control::GlobalPhase;
use crate::sim::StatusSummary;

use super::SimObserver;

const HEADER: &str = "tick,time,phase,agent,x,y,z,buffered,sessions,training,loss";

/// CSV log with one row per agent for every status tick.
pub struct StatusLog {
    path: PathBuf,
    writer: BufWriter<File>,
    status_every: u64,
    failed: bool,
}

impl StatusLog {
    /// Creates `cubestack-<yyyymmdd-hhmmss>.csv` in `folder`, stamped with local time.
    pub fn new(folder: &str, status_every: u64) -> io::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::create(Path::new(folder), now, status_every)
    }

    fn create(folder: &Path, stamp: OffsetDateTime, status_every: u64) -> io::Result<Self> {
        let date_time_str = stamp
            .format(format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .map_err(io::Error::other)?;

        if !folder.exists() {
            std::fs::create_dir_all(folder)?;
        }
        let path = folder.join(format!("cubestack-{}.csv", date_time_str));

        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{}", HEADER)?;
        writer.flush()?;

        info!("Writing status log to {}", path.display());
        Ok(Self {
            path,
            writer,
            status_every,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, status: &StatusSummary) -> io::Result<()> {
        for (index, position) in status.positions.iter().enumerate() {
            let agent = index + 1;
            let learner = status.learner(agent);

            write!(
                self.writer,
                "{},{:.4},{},{},{:.5},{:.5},{:.5}",
                status.tick, status.time, status.phase, agent, position.x, position.y, position.z
            )?;
            match learner {
                Some(learner) => {
                    let loss = learner
                        .mean_loss
                        .map(|loss| format!("{:.6}", loss))
                        .unwrap_or_default();
                    writeln!(
                        self.writer,
                        ",{},{},{},{}",
                        learner.buffered, learner.sessions, learner.training, loss
                    )?;
                }
                None => writeln!(self.writer, ",,,,")?,
            }
        }
        self.writer.flush()
    }

    fn write_status(&mut self, status: &StatusSummary) {
        if self.failed {
            return;
        }
        if let Err(e) = self.append(status) {
            // Stop after the first failure instead of warning every tick
            warn!("Status log {} disabled: {}", self.path.display(), e);
            self.failed = true;
        }
    }
}

impl SimObserver for StatusLog {
    fn on_phase_change(&mut self, _phase: GlobalPhase, _tick: u64) {}

    fn on_tick(&mut self, status: &StatusSummary) {
        if self.status_every > 0 && status.tick % self.status_every == 0 {
            self.write_status(status);
        }
    }

    fn on_finish(&mut self, status: &StatusSummary) {
        self.write_status(status);
    }
}
