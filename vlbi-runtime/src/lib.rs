//! Per-session transfer-mode state machine, network parameters,
//! statistics, and the text command dispatch contract (§4.F, §6.1).

mod dispatch;
mod error;
mod netparms;
mod session;
mod stats;
mod transfermode;

pub use dispatch::{dispatch, format_reply, CommandHandler, CommandReply, ReturnCode};
pub use error::{Result, RuntimeError};
pub use netparms::{NetParms, Protocol};
pub use session::{ActiveChain, RuntimeState, Session};
pub use stats::{Stats, StatsSnapshot};
pub use transfermode::{SubMode, TransferMode};
