#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    /// 1-based position of the answered question in the session.
    pub question: f64,
    pub secs: f64,
}

impl TimePoint {
    pub fn new(question: f64, secs: f64) -> Self {
        Self { question, secs }
    }
}

impl From<(f64, f64)> for TimePoint {
    fn from(v: (f64, f64)) -> Self {
        TimePoint {
            question: v.0,
            secs: v.1,
        }
    }
}

impl From<TimePoint> for (f64, f64) {
    fn from(p: TimePoint) -> Self {
        (p.question, p.secs)
    }
}
