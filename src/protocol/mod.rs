//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (line-oriented text)
//!
//! ### Request Format
//! ```text
//! clientId|requestId|typeCode|param1=val1;param2=val2\n
//! ```
//!
//! ### Request Types
//! - 0: ADD_LOCATION   - name, latitude, longitude, type
//! - 1: ADD_ROAD       - sourceId, destId, distance?, roadName, bidirectional?
//! - 2: FIND_PATH      - sourceId, destId
//! - 3: GET_LOCATIONS
//! - 4: GET_ROADS
//! - 5: GET_LOCATION   - id
//! - 6: INIT_SAMPLE
//! - 7: SAVE_DATA
//! - 8: SHUTDOWN
//! - 9: UNKNOWN (any unrecognized code)
//!
//! ### Response Format
//! ```text
//! clientId|requestId|statusCode|escapedMessage|escapedData\n
//! ```
//!
//! ### Status Codes
//! - 0: SUCCESS
//! - 1: FAILURE
//! - 2: NOT_FOUND
//! - 3: INVALID_PARAMS

mod codec;
mod request;
mod response;
mod sink;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, escape_field,
    unescape_field, read_request, read_response, write_request, write_response,
    MAX_LINE_LENGTH,
};
pub use request::{Request, RequestType};
pub use response::{Response, Status};
pub use sink::ResponseSink;
