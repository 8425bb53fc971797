mod webhook;

pub use webhook::{Notifier, NotifyError, WebhookNotifier};
