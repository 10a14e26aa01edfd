mod contracts;
pub use contracts::*;

mod config;
pub use config::*;

mod state;
pub use state::*;

mod oracle;
pub use oracle::*;
