use crate::clock::Clock;
use crate::error::Error;
use crate::models::{BookingForm, BookingRecord, Field};
use crate::notification::{DismissReason, Notice, Notifications};
use crate::sink::BookingSink;
use time::Time;
use tracing::{debug, error, info, warn};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Submission {
    Sent(BookingRecord),
    MissingFields(Vec<Field>),
    EmissionFailed,
}

/// Owns the booking form, its banners and the defaults captured at creation.
///
/// Every banner shown or closed bumps `epoch`. Auto-dismiss timers carry the
/// epoch they were armed with and only act while it is still current.
pub(crate) struct BookingFormController {
    defaults: BookingForm,
    form: BookingForm,
    notifications: Notifications,
    epoch: u64,
    sink: Box<dyn BookingSink>,
}

impl BookingFormController {
    pub fn new(clock: &dyn Clock, sink: Box<dyn BookingSink>) -> Self {
        let defaults = defaults_at(clock);

        Self {
            form: defaults.clone(),
            defaults,
            notifications: Notifications::default(),
            epoch: 0,
            sink,
        }
    }

    /// Takes fresh defaults for a newly mounted form. A form holding edits is
    /// left alone; returns whether the defaults were replaced.
    pub fn mount(&mut self, clock: &dyn Clock) -> bool {
        if self.form != self.defaults {
            return false;
        }

        self.defaults = defaults_at(clock);
        self.form = self.defaults.clone();
        debug!(date = %self.defaults.date, "form mounted");
        true
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn notifications(&self) -> Notifications {
        self.notifications
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), Error> {
        self.form = self.form.clone().with_field(field, value)?;
        debug!(%field, value, "field updated");
        Ok(())
    }

    /// Applies several changes at once; nothing is kept if any of them fails.
    pub fn set_fields<'a>(
        &mut self,
        changes: impl IntoIterator<Item = (Field, &'a str)>,
    ) -> Result<(), Error> {
        self.form = changes
            .into_iter()
            .try_fold(self.form.clone(), |form, (field, value)| {
                form.with_field(field, value)
            })?;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<Submission, Error> {
        let Some(record) = self.form.record()? else {
            let missing = self.form.missing_required();
            debug!(?missing, "submit rejected");
            self.show(Notice::Warning);
            return Ok(Submission::MissingFields(missing));
        };

        if !self.form.has_ordered_times() {
            warn!(
                start = %self.form.start_time,
                end = %self.form.end_time,
                "booking ends before it starts"
            );
        }

        match self.sink.emit(&record) {
            Ok(()) => {
                info!(
                    tower = record.tower.as_str(),
                    floor = record.floor.number(),
                    room = record.room.number(),
                    "booking accepted"
                );
                self.show(Notice::Success);
                Ok(Submission::Sent(record))
            }
            Err(err) => {
                error!(%err, "booking could not be emitted");
                self.show(Notice::Warning);
                Ok(Submission::EmissionFailed)
            }
        }
    }

    /// Restores the defaults captured at creation. Banners are left alone.
    pub fn clear(&mut self) {
        self.form = self.defaults.clone();
        debug!("form cleared");
    }

    /// Returns whether the banners were closed.
    pub fn dismiss(&mut self, reason: DismissReason) -> bool {
        if reason == DismissReason::Clickaway {
            return false;
        }

        self.notifications.clear();
        self.epoch += 1;
        true
    }

    /// Timer callback: closes the banners unless a newer one replaced them.
    pub fn expire(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }

        self.dismiss(DismissReason::Timeout)
    }

    fn show(&mut self, notice: Notice) {
        self.notifications.show(notice);
        self.epoch += 1;
    }
}

/// Empty selections with the date and minute of the clock's current reading.
fn defaults_at(clock: &dyn Clock) -> BookingForm {
    let now = clock.now();
    let time = Time::from_hms(now.hour(), now.minute(), 0).unwrap_or_else(|_| now.time());
    BookingForm::new(now.date(), time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::Tower;
    use crate::sink::{FailingSink, MemorySink};
    use time::macros::{date, datetime, time};

    fn controller() -> (BookingFormController, MemorySink) {
        let sink = MemorySink::default();
        let clock = FixedClock::new(datetime!(2024-03-15 09:41:27 +3));
        (
            BookingFormController::new(&clock, Box::new(sink.clone())),
            sink,
        )
    }

    fn select(controller: &mut BookingFormController, tower: &str, floor: &str, room: &str) {
        controller.set_field(Field::Tower, tower).expect("tower");
        controller.set_field(Field::Floor, floor).expect("floor");
        controller.set_field(Field::Room, room).expect("room");
    }

    #[test]
    fn defaults_come_from_the_clock() {
        let (controller, _) = controller();
        let form = controller.form();

        assert_eq!(form.date, date!(2024 - 03 - 15));
        assert_eq!(form.start_time, time!(9:41));
        assert_eq!(form.end_time, time!(9:41));
        assert_eq!(form.tower, None);
        assert!(form.comment.is_empty());
        assert!(controller.notifications().is_idle());
    }

    #[test]
    fn submitting_initial_form_raises_warning() {
        let (mut controller, sink) = controller();

        let outcome = controller.submit().expect("submit");

        assert_eq!(
            outcome,
            Submission::MissingFields(vec![Field::Tower, Field::Floor, Field::Room])
        );
        assert!(controller.notifications().warning);
        assert!(!controller.notifications().success);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn any_missing_selection_blocks_submission() {
        for (tower, floor, room) in [("", "5", "3"), ("A", "", "3"), ("A", "5", "")] {
            let (mut controller, sink) = controller();
            select(&mut controller, tower, floor, room);
            controller.set_field(Field::Comment, "kept").expect("comment");

            controller.submit().expect("submit");

            assert!(controller.notifications().warning);
            assert!(!controller.notifications().success);
            assert!(sink.records().is_empty());
            assert_eq!(controller.form().comment, "kept");
        }
    }

    #[test]
    fn complete_selection_is_emitted_once() {
        let (mut controller, sink) = controller();
        select(&mut controller, "A", "5", "3");

        let outcome = controller.submit().expect("submit");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tower, Tower::A);
        assert_eq!(records[0].floor.number(), 5);
        assert_eq!(records[0].room.number(), 3);
        assert_eq!(records[0].date, "2024-03-15");
        assert_eq!(records[0].start_time, "09:41");
        assert_eq!(outcome, Submission::Sent(records[0].clone()));
        assert!(controller.notifications().success);
        assert!(!controller.notifications().warning);
    }

    #[test]
    fn success_replaces_an_earlier_warning() {
        let (mut controller, _) = controller();
        controller.submit().expect("submit");
        select(&mut controller, "B", "27", "10");

        controller.submit().expect("submit");

        assert!(controller.notifications().success);
        assert!(!controller.notifications().warning);
    }

    #[test]
    fn reversed_times_are_still_accepted() {
        let (mut controller, sink) = controller();
        select(&mut controller, "A", "3", "1");
        controller.set_field(Field::StartTime, "18:00").expect("start");
        controller.set_field(Field::EndTime, "09:00").expect("end");

        controller.submit().expect("submit");

        assert_eq!(sink.records().len(), 1);
        assert!(controller.notifications().success);
    }

    #[test]
    fn failed_emission_shows_warning() {
        let clock = FixedClock::new(datetime!(2024-03-15 09:41 UTC));
        let mut controller = BookingFormController::new(&clock, Box::new(FailingSink));
        select(&mut controller, "A", "5", "3");

        let outcome = controller.submit().expect("submit");

        assert_eq!(outcome, Submission::EmissionFailed);
        assert!(controller.notifications().warning);
        assert!(!controller.notifications().success);
    }

    #[test]
    fn invalid_value_leaves_form_untouched() {
        let (mut controller, _) = controller();
        select(&mut controller, "A", "5", "3");
        let before = controller.form().clone();

        assert!(controller.set_field(Field::Floor, "99").is_err());
        assert_eq!(controller.form(), &before);
    }

    #[test]
    fn batch_update_is_all_or_nothing() {
        let (mut controller, _) = controller();

        let result = controller.set_fields([(Field::Tower, "A"), (Field::Room, "0")]);

        assert!(result.is_err());
        assert_eq!(controller.form().tower, None);

        controller
            .set_fields([(Field::Tower, "A"), (Field::Room, "10")])
            .expect("valid batch");
        assert_eq!(controller.form().tower, Some(Tower::A));
        assert_eq!(controller.form().room.map(|r| r.number()), Some(10));
    }

    #[test]
    fn clear_restores_startup_defaults() {
        let (mut controller, _) = controller();
        select(&mut controller, "B", "12", "7");
        controller.set_field(Field::Date, "2024-04-01").expect("date");
        controller.set_field(Field::StartTime, "14:00").expect("start");
        controller.set_field(Field::EndTime, "15:30").expect("end");
        controller.set_field(Field::Comment, "board meeting").expect("comment");
        controller.submit().expect("submit");

        controller.clear();

        let form = controller.form();
        assert_eq!(form.tower, None);
        assert_eq!(form.floor, None);
        assert_eq!(form.room, None);
        assert!(form.comment.is_empty());
        assert_eq!(form.date, date!(2024 - 03 - 15));
        assert_eq!(form.start_time, time!(9:41));
        assert_eq!(form.end_time, time!(9:41));
        assert!(controller.notifications().success);
    }

    #[test]
    fn mounting_an_untouched_form_takes_fresh_defaults() {
        let (mut controller, _) = controller();
        let clock = FixedClock::new(datetime!(2024-03-16 08:05 +3));

        assert!(controller.mount(&clock));
        assert_eq!(controller.form().date, date!(2024 - 03 - 16));
        assert_eq!(controller.form().start_time, time!(8:05));

        controller.set_field(Field::Tower, "B").expect("tower");
        controller.clear();
        assert_eq!(controller.form().date, date!(2024 - 03 - 16));
        assert_eq!(controller.form().end_time, time!(8:05));
    }

    #[test]
    fn mounting_keeps_edits_in_progress() {
        let (mut controller, _) = controller();
        controller.set_field(Field::Comment, "draft").expect("comment");
        let clock = FixedClock::new(datetime!(2024-03-16 08:05 +3));

        assert!(!controller.mount(&clock));
        assert_eq!(controller.form().date, date!(2024 - 03 - 15));
        assert_eq!(controller.form().comment, "draft");
    }

    #[test]
    fn clickaway_never_closes_banners() {
        let (mut controller, _) = controller();
        controller.submit().expect("submit");

        assert!(!controller.dismiss(DismissReason::Clickaway));
        assert!(controller.notifications().warning);
    }

    #[test]
    fn other_reasons_close_both_banners() {
        for reason in [
            DismissReason::Closed,
            DismissReason::EscapeKeyDown,
            DismissReason::Timeout,
        ] {
            let (mut controller, _) = controller();
            select(&mut controller, "A", "5", "3");
            controller.submit().expect("submit");

            assert!(controller.dismiss(reason));
            assert!(controller.notifications().is_idle());
        }
    }

    #[test]
    fn stale_expiry_is_ignored() {
        let (mut controller, _) = controller();
        controller.submit().expect("submit");
        let stale = controller.epoch();

        select(&mut controller, "A", "5", "3");
        controller.submit().expect("submit");

        assert!(!controller.expire(stale));
        assert!(controller.notifications().success);

        assert!(controller.expire(controller.epoch()));
        assert!(controller.notifications().is_idle());
    }
}
