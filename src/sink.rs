use crate::error::Error;
use crate::models::BookingRecord;
use tracing::info;

/// Destination for accepted bookings.
pub(crate) trait BookingSink: Send + Sync {
    fn emit(&self, record: &BookingRecord) -> Result<(), Error>;
}

/// Writes each booking to the log as a JSON line. Stands in for a booking API.
pub(crate) struct LogSink;

impl BookingSink for LogSink {
    fn emit(&self, record: &BookingRecord) -> Result<(), Error> {
        let payload =
            serde_json::to_string(record).map_err(|e| Error::Emission(e.to_string()))?;
        info!(target: "booking", %payload, "booking submitted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use testing::{FailingSink, MemorySink};

#[cfg(test)]
mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub(crate) struct MemorySink {
        records: Arc<Mutex<Vec<BookingRecord>>>,
    }

    impl MemorySink {
        pub(crate) fn records(&self) -> Vec<BookingRecord> {
            self.records.lock().expect("sink lock").clone()
        }
    }

    impl BookingSink for MemorySink {
        fn emit(&self, record: &BookingRecord) -> Result<(), Error> {
            self.records.lock().expect("sink lock").push(record.clone());
            Ok(())
        }
    }

    pub(crate) struct FailingSink;

    impl BookingSink for FailingSink {
        fn emit(&self, _record: &BookingRecord) -> Result<(), Error> {
            Err(Error::Emission("booking service unavailable".into()))
        }
    }
}
