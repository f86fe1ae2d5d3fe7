use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Notice {
    Success,
    Warning,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::Success => "Форма отправлена!",
            Notice::Warning => "Введите данные!",
        }
    }
}

/// Banner flags. Independent booleans, although submit only ever raises one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Notifications {
    pub success: bool,
    pub warning: bool,
}

impl Notifications {
    pub(crate) fn show(&mut self, notice: Notice) {
        *self = match notice {
            Notice::Success => Self {
                success: true,
                warning: false,
            },
            Notice::Warning => Self {
                success: false,
                warning: true,
            },
        };
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        !self.success && !self.warning
    }
}

/// Why a banner is being closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum DismissReason {
    /// Click outside the banner. Never closes it.
    Clickaway,
    Timeout,
    EscapeKeyDown,
    Closed,
}

/// One-shot timer that closes the visible banner. Arming it again aborts the
/// previous task.
pub(crate) struct AutoDismiss {
    after: Duration,
    pending: Option<JoinHandle<()>>,
}

impl AutoDismiss {
    pub(crate) fn new(after: Duration) -> Self {
        Self {
            after,
            pending: None,
        }
    }

    pub(crate) fn arm<F>(&mut self, expire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let after = self.after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            expire.await;
        });

        if let Some(previous) = self.pending.replace(task) {
            previous.abort();
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
