use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Measured<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Measured<T> {
    /// Elapsed wall-clock time in whole milliseconds, saturating.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Runs `f` once and records how long it took.
pub fn measure_once<T>(f: impl FnOnce() -> T) -> Measured<T> {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();

    Measured { value, elapsed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_once_returns_value() {
        let m = measure_once(|| {
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(m.value, 42);
        assert!(m.elapsed_ms() >= 5);
    }
}
