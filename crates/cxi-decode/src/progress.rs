use std::io::{self, Read};

/// Callbacks from an import in progress.
///
/// Every method is advisory: the pass always consumes the whole stream.
pub trait ImportListener {
    /// Fraction of the object graph consumed so far, in `0.0..=1.0`.
    fn progress(&self, _fraction: f64) {}

    /// Asked once per space; excluded spaces are still decoded and stored
    /// but flagged in the finished index.
    fn is_space_excluded(&self, _key: &str) -> bool {
        false
    }

    /// Polled after every object.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Listener that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl ImportListener for NoopListener {}

/// Adds a fixed set of excluded space keys to another listener.
pub(crate) struct ExcludingListener<'a> {
    pub(crate) inner: &'a dyn ImportListener,
    pub(crate) keys: &'a [String],
}

impl ImportListener for ExcludingListener<'_> {
    fn progress(&self, fraction: f64) {
        self.inner.progress(fraction);
    }

    fn is_space_excluded(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key) || self.inner.is_space_excluded(key)
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Counts the bytes pulled from the wrapped reader.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Turns byte counts into throttled progress callbacks.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    total: Option<u64>,
    last_percent: u64,
}

impl ProgressTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self { total, last_percent: 0 }
    }

    /// Report `consumed` bytes when they move progress by a whole percent.
    pub(crate) fn update(&mut self, consumed: u64, listener: &dyn ImportListener) {
        let Some(total) = self.total.filter(|t| *t > 0) else {
            return;
        };
        let consumed = consumed.min(total);
        let percent = consumed * 100 / total;
        if percent > self.last_percent {
            self.last_percent = percent;
            listener.progress(consumed as f64 / total as f64);
        }
    }

    /// Report completion.
    pub(crate) fn finish(&mut self, listener: &dyn ImportListener) {
        if self.total.is_some() && self.last_percent < 100 {
            self.last_percent = 100;
            listener.progress(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<f64>>);

    impl ImportListener for Recorder {
        fn progress(&self, fraction: f64) {
            self.0.borrow_mut().push(fraction);
        }
    }

    #[test]
    fn counting_reader_counts() {
        let mut reader = CountingReader::new(&b"hello world"[..]);
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.bytes_read(), 4);
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(reader.bytes_read(), 11);
    }

    #[test]
    fn progress_is_throttled_to_whole_percents() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(Some(1000));
        for consumed in [1, 5, 10, 11, 19, 20, 500] {
            tracker.update(consumed, &recorder);
        }
        tracker.finish(&recorder);
        assert_eq!(*recorder.0.borrow(), vec![0.01, 0.02, 0.5, 1.0]);
    }

    #[test]
    fn unknown_total_reports_nothing() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(None);
        tracker.update(100, &recorder);
        tracker.finish(&recorder);
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn excluding_listener_merges_keys() {
        struct Only(&'static str);
        impl ImportListener for Only {
            fn is_space_excluded(&self, key: &str) -> bool {
                key == self.0
            }
        }
        let keys = vec!["A".to_string()];
        let listener = ExcludingListener { inner: &Only("B"), keys: &keys };
        assert!(listener.is_space_excluded("A"));
        assert!(listener.is_space_excluded("B"));
        assert!(!listener.is_space_excluded("C"));
        assert!(!listener.is_cancelled());
    }
}
