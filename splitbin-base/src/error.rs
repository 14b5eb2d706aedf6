// Every failure in the table compilers is either a caller mistake (empty
// input, ragged rows), a resource limit (values or offsets too wide for the
// 4-byte storage we emit) or a failed verification pass. None of these are
// retryable, so all we need is:
//
// 1. One error type that anything implementing std::error::Error converts
//    into with `?`, carrying a backtrace from the point of conversion.
// 2. A single spot to set a breakpoint on when chasing a bad table.
// 3. The same spot emitting the error into the tracing system, so a failed
//    build leaves a log line even if the caller swallows the error.

use backtrace_error::DynBacktraceError;
use std::borrow::Cow;
use tracing::error;

#[cfg(test)]
use test_log::test;

#[derive(Debug)]
#[allow(dead_code)]
pub struct Error {
    msg: String,
    bt: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl std::fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        let msg = err.to_string();
        error!(target: "splitbin", "{}", msg);
        let bt = DynBacktraceError::from(err);
        Error { msg, bt }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    let err = SimpleErr(msg.into());
    Error::new(err)
}

#[test]
fn test_error() {
    let e = err("table too wide");
    assert!(e.to_string().contains("table too wide"));
}

#[test]
fn test_error_from_std() {
    fn parse(s: &str) -> Result<u32> {
        Ok(s.parse::<u32>()?)
    }
    assert_eq!(parse("17").ok(), Some(17));
    assert!(parse("seventeen").is_err());
}
