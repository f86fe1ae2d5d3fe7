use time::OffsetDateTime;

pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the server's local offset.
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        // The local offset cannot always be determined once threads are running.
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct FixedClock(std::sync::Arc<std::sync::Mutex<OffsetDateTime>>);

#[cfg(test)]
impl FixedClock {
    pub(crate) fn new(at: OffsetDateTime) -> Self {
        Self(std::sync::Arc::new(std::sync::Mutex::new(at)))
    }

    pub(crate) fn set(&self, at: OffsetDateTime) {
        *self.0.lock().expect("clock lock") = at;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().expect("clock lock")
    }
}
