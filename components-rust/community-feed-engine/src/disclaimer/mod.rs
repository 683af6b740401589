use crate::storage::{KeyValueStore, DISCLAIMER_LAST_SHOWN_KEY};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisclaimerState {
    Hidden,
    Shown,
}

/// True when the notice has not been shown yet on `today`'s calendar date.
pub fn should_show(last_shown: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_shown != Some(today)
}

/// One-time-per-day notice gate.
#[derive(Clone, Debug)]
pub struct DisclaimerGate {
    state: DisclaimerState,
}

impl DisclaimerGate {
    /// Shows the notice if it was not shown on `today`, persisting the date immediately.
    pub fn initialize(store: &dyn KeyValueStore, today: NaiveDate) -> Self {
        let last_shown = match store.get(DISCLAIMER_LAST_SHOWN_KEY) {
            Ok(value) => value.and_then(|v| NaiveDate::parse_from_str(&v, DATE_FORMAT).ok()),
            Err(err) => {
                log::warn!("disclaimer - cannot read last shown date: {err}");
                None
            }
        };

        let state = if should_show(last_shown, today) {
            let value = today.format(DATE_FORMAT).to_string();
            if let Err(err) = store.set(DISCLAIMER_LAST_SHOWN_KEY, &value) {
                log::warn!("disclaimer - cannot persist last shown date: {err}");
            }
            log::info!("disclaimer shown - date: {value}");
            DisclaimerState::Shown
        } else {
            DisclaimerState::Hidden
        };

        DisclaimerGate { state }
    }

    pub fn initialize_now(store: &dyn KeyValueStore) -> Self {
        Self::initialize(store, chrono::Local::now().date_naive())
    }

    pub fn state(&self) -> DisclaimerState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == DisclaimerState::Shown
    }

    pub fn dismiss(&mut self) {
        self.state = DisclaimerState::Hidden;
    }
}
