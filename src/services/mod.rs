pub mod gameday;
pub mod lifecycle;
pub mod notifier;
pub mod rotation;
pub mod team;

pub use gameday::GamedayService;
pub use lifecycle::GamedayAction;
pub use notifier::{LogNotifier, Notifier, NotifyError, SharedNotifier, WebhookNotifier};
pub use team::TeamService;
