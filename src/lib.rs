pub mod config;
pub mod email;
pub mod progress;

// Re-export commonly used types
pub use config::{Account, Config, ConfigError, SmtpServer};
pub use email::{Attachment, Email, EmailError};
pub use progress::{SendProgress, SendStatus};
