//! The text command protocol (§6.1): `keyword = arg : arg ;` commands,
//! `keyword? arg : arg ;` queries, replies of the form
//! `!keyword = code : data : … ;`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Success = 0,
    RunningAsync = 1,
    NotImplemented = 2,
    RuntimeError = 4,
    QueryInappropriate = 5,
    BusyOrWrongState = 6,
    Syntax = 7,
    MissingArgs = 8,
}

#[derive(Debug, Clone)]
pub struct CommandReply {
    pub code: ReturnCode,
    pub fields: Vec<String>,
}

impl CommandReply {
    pub fn success(fields: Vec<String>) -> Self {
        CommandReply { code: ReturnCode::Success, fields }
    }

    pub fn error(code: ReturnCode, message: impl Into<String>) -> Self {
        CommandReply { code, fields: vec![message.into()] }
    }
}

/// Format a reply as `!keyword = code : field : field ... ;`.
pub fn format_reply(keyword: &str, reply: &CommandReply) -> String {
    let mut out = format!("!{keyword} = {}", reply.code as i32);
    for field in &reply.fields {
        out.push_str(" : ");
        out.push_str(field);
    }
    out.push_str(" ;");
    out
}

/// One keyword's dispatch entry (§6.1: "a dispatch entry taking
/// `(is_query, args, runtime&) → string`").
pub trait CommandHandler: Send + Sync {
    fn handle(&self, is_query: bool, args: &[&str], session: &Session) -> CommandReply;
}

impl<F> CommandHandler for F
where
    F: Fn(bool, &[&str], &Session) -> CommandReply + Send + Sync,
{
    fn handle(&self, is_query: bool, args: &[&str], session: &Session) -> CommandReply {
        self(is_query, args, session)
    }
}

/// Invoke a handler, converting a panic into a runtime-error reply
/// instead of unwinding into the caller (§7: "command-handler wraps
/// each dispatch").
pub fn dispatch(handler: &dyn CommandHandler, is_query: bool, args: &[&str], session: &Session) -> CommandReply {
    match catch_unwind(AssertUnwindSafe(|| handler.handle(is_query, args, session))) {
        Ok(reply) => reply,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "command handler panicked".to_string());
            log::error!("command handler panicked: {message}");
            CommandReply::error(ReturnCode::RuntimeError, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_is_formatted_per_protocol() {
        let reply = CommandReply::success(vec!["1".to_string(), "on".to_string()]);
        assert_eq!(format_reply("mode", &reply), "!mode = 0 : 1 : on ;");
    }

    #[test]
    fn panicking_handler_yields_runtime_error_reply() {
        let session = Session::new();
        let handler = |_: bool, _: &[&str], _: &Session| -> CommandReply { panic!("boom") };
        let reply = dispatch(&handler, false, &[], &session);
        assert_eq!(reply.code, ReturnCode::RuntimeError);
    }

    #[test]
    fn well_behaved_handler_passes_through() {
        let session = Session::new();
        let handler = |_: bool, _: &[&str], _: &Session| CommandReply::success(vec![]);
        let reply = dispatch(&handler, false, &[], &session);
        assert_eq!(reply.code, ReturnCode::Success);
    }
}
