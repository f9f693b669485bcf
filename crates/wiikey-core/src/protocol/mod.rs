//! Protocol module containing report types and the report codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_report, encode_output_report, ReportError};
pub use messages::*;
