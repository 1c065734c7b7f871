use std::fmt;
use std::time::{Duration, Instant};

use remote::{ContactMessage, ContactTransport};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::PageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContactStatus {
    Idle,
    Sending,
    Sent,
    Error,
}

impl ContactStatus {
    /// Submit button caption for this status.
    pub fn button_label(self) -> &'static str {
        match self {
            ContactStatus::Idle | ContactStatus::Error => "LET THERE BE LIGHT",
            ContactStatus::Sending => "TRANSMITTING...",
            ContactStatus::Sent => "TRANSMISSION SENT",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContactStatus::Idle => "idle",
            ContactStatus::Sending => "sending",
            ContactStatus::Sent => "sent",
            ContactStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Contact form fields and submission state.
///
/// A successful send clears the fields at once and drops back to idle after
/// `reset_after`. A failed send keeps the fields so the visitor can resubmit.
#[derive(Debug, Clone)]
pub struct ContactForm {
    fields: ContactMessage,
    status: ContactStatus,
    reset_at: Option<Instant>,
    reset_after: Duration,
    history: Vec<ContactStatus>,
}

impl ContactForm {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            fields: ContactMessage::default(),
            status: ContactStatus::Idle,
            reset_at: None,
            reset_after,
            history: vec![ContactStatus::Idle],
        }
    }

    pub fn status(&self) -> ContactStatus {
        self.status
    }

    pub fn fields(&self) -> &ContactMessage {
        &self.fields
    }

    /// Every status entered so far, starting with `Idle`.
    pub fn history(&self) -> &[ContactStatus] {
        &self.history
    }

    pub fn fields_disabled(&self) -> bool {
        self.status == ContactStatus::Sending
    }

    /// Edits are ignored while a submission is in flight.
    pub fn set_fields(&mut self, fields: ContactMessage) -> bool {
        if self.fields_disabled() {
            return false;
        }
        self.fields = fields;
        true
    }

    /// Validates the fields and enters `Sending`, returning what to send.
    pub fn begin_submit(&mut self) -> Result<ContactMessage, PageError> {
        if self.status == ContactStatus::Sending {
            return Err(PageError::SubmissionInFlight);
        }
        validate(&self.fields)?;
        self.reset_at = None;
        self.enter(ContactStatus::Sending);
        Ok(self.fields.clone())
    }

    /// Applies the outcome of the request started by [`Self::begin_submit`].
    pub fn finish_submit<E: fmt::Display>(&mut self, outcome: Result<(), E>, now: Instant) {
        if self.status != ContactStatus::Sending {
            debug!("ignoring contact outcome with no submission in flight");
            return;
        }
        match outcome {
            Ok(()) => {
                self.fields = ContactMessage::default();
                self.reset_at = Some(now + self.reset_after);
                self.enter(ContactStatus::Sent);
                info!("contact form sent");
            }
            Err(err) => {
                self.enter(ContactStatus::Error);
                warn!(error = %err, "contact form failed");
            }
        }
    }

    /// Sends once through `transport` and returns the final status.
    ///
    /// `now` is when the request goes out. The reset window is measured from
    /// when the transport returns, so a slow relay does not shorten it.
    pub fn submit(
        &mut self,
        transport: &dyn ContactTransport,
        now: Instant,
    ) -> Result<ContactStatus, PageError> {
        let message = self.begin_submit()?;
        let started = Instant::now();
        let outcome = transport.submit(&message);
        self.finish_submit(outcome, now + started.elapsed());
        Ok(self.status)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.reset_at
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(reset_at) = self.reset_at {
            if now >= reset_at {
                self.reset_at = None;
                self.enter(ContactStatus::Idle);
            }
        }
    }

    pub fn teardown(&mut self) {
        self.reset_at = None;
    }

    fn enter(&mut self, status: ContactStatus) {
        self.status = status;
        self.history.push(status);
    }
}

fn validate(fields: &ContactMessage) -> Result<(), PageError> {
    let blank = [
        ("name", &fields.name),
        ("email", &fields.email),
        ("message", &fields.message),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    if let Some((field, _)) = blank {
        return Err(PageError::InvalidForm(format!("{field} is required")));
    }
    if !fields.email.contains('@') {
        return Err(PageError::InvalidForm("email must contain '@'".into()));
    }
    Ok(())
}
