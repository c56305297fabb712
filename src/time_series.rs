use serde::Serialize;

/// Samples kept for the live speed chart.
pub const MAX_WPM_SAMPLES: usize = 20;

/// Live WPM observed `t` seconds into a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Appends a sample, dropping the oldest once the window is full.
pub fn push_sample(samples: &mut Vec<WpmSample>, sample: WpmSample) {
    if samples.len() >= MAX_WPM_SAMPLES {
        let excess = samples.len() + 1 - MAX_WPM_SAMPLES;
        samples.drain(..excess);
    }
    samples.push(sample);
}
