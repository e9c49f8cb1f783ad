use std::io::{self, Write};

use bitrans_core::AppViewModel;
use chrono::Local;

/// Prints new console entries and progress changes to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    last_seq: u64,
    last_progress: Option<(usize, usize)>,
}

impl ConsoleRenderer {
    pub fn render(&mut self, view: &AppViewModel, out: &mut impl Write) -> io::Result<()> {
        let stamp = Local::now().format("%H:%M:%S");
        for entry in view.logs.iter() {
            if entry.seq > self.last_seq {
                writeln!(out, "[{stamp}] {entry}")?;
                self.last_seq = entry.seq;
            }
        }
        if let Some(job) = view.job.as_ref().filter(|_| view.is_translating) {
            let progress = (job.processed, job.total);
            if self.last_progress != Some(progress) {
                writeln!(
                    out,
                    "[{stamp}] [PROGRESS] {}/{} segments ({}%)",
                    job.processed, job.total, job.percent
                )?;
                self.last_progress = Some(progress);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitrans_core::{JobStatus, JobView, LogEntry, LogLevel};

    fn entry(seq: u64, message: &str) -> LogEntry {
        LogEntry {
            seq,
            level: LogLevel::Info,
            message: message.to_string(),
        }
    }

    #[test]
    fn entries_are_printed_once() {
        let mut renderer = ConsoleRenderer::default();
        let mut view = AppViewModel {
            logs: vec![entry(1, "first")],
            ..AppViewModel::default()
        };
        let mut out = Vec::new();
        renderer.render(&view, &mut out).unwrap();
        view.logs.push(entry(2, "second"));
        renderer.render(&view, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("first").count(), 1);
        assert!(text.lines().nth(1).unwrap().ends_with("[INFO] second"));
    }

    #[test]
    fn progress_is_printed_on_change() {
        let mut renderer = ConsoleRenderer::default();
        let view = AppViewModel {
            is_translating: true,
            job: Some(JobView {
                job_id: 1,
                status: JobStatus::Running,
                processed: 2,
                total: 4,
                percent: 50,
                failed_batches: Vec::new(),
            }),
            ..AppViewModel::default()
        };
        let mut out = Vec::new();
        renderer.render(&view, &mut out).unwrap();
        renderer.render(&view, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("[PROGRESS] 2/4 segments (50%)"));
    }
}
