//! Response interpretation
//!
//! Every raw response becomes a JSON document. Successful (200) documents are
//! returned as parsed with `statusCode` stamped on; everything else is
//! normalized into an [`ErrorDocument`] shape so callers branch on `code` /
//! `statusCode` instead of handling errors. Interpreted documents are also
//! broadcast as [`ResponseEvent`]s.

mod document;
mod interpreter;

pub use document::{
    CODE_KEY, DATA_KEY, ErrorDocument, MESSAGE_FRIENDLY_KEY, MESSAGE_KEY, STATUS_CODE_KEY,
    UNPARSEABLE_CODE, friendly_message, parse_body, server_message, status_of,
};
pub use interpreter::{
    AlertPresenter, FALLBACK_ALERT_MESSAGE, ResponseEvent, ResponseInterpreter, SilentAlerts,
    StderrAlerts,
};
