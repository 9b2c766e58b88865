//! Public extension contracts (notifications, navigation, request signing).
//!
//! The gateway never renders UI. It reports user-visible outcomes through a [`Notifier`],
//! asks the application shell to show the login entry point through a [`Navigator`], and
//! attaches credentials through a [`RequestSignerExt`]. Hosts inject their own implementations
//! at construction time.

pub mod navigator;
pub mod notifier;
pub mod request_signer;

pub use navigator::*;
pub use notifier::*;
pub use request_signer::*;
