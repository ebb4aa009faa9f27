use crate::domain::ports::AlertNotifier;
use crate::domain::trading::TargetAlert;
use tracing::warn;

/// Emits target alerts as structured log events.
#[derive(Debug, Default, Clone)]
pub struct LogAlertNotifier;

impl AlertNotifier for LogAlertNotifier {
    fn notify(&self, alert: &TargetAlert) {
        warn!(
            ticker = %alert.ticker,
            target = alert.target_price,
            current = alert.current_price,
            "{}: {}",
            alert.subject(),
            alert.body()
        );
    }
}
