use chrono::{DateTime, TimeZone};

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Time left until the next question set, shown on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidnightCountdown {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl MidnightCountdown {
    /// Time from `now` until the next midnight in `now`'s timezone.
    pub fn until_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let local = now.naive_local();
        let remaining = local
            .date()
            .succ_opt()
            .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
            .map(|midnight| (midnight - local).num_seconds())
            .unwrap_or(0)
            .clamp(0, SECONDS_PER_DAY as i64) as u32;

        Self {
            hours: remaining / 3600,
            minutes: remaining % 3600 / 60,
            seconds: remaining % 60,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    /// Share of the day still left, for the progress bar.
    pub fn progress_percent(&self) -> f32 {
        self.remaining_secs() as f32 / SECONDS_PER_DAY as f32 * 100.0
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}
