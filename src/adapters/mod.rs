//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to                      |
//! |----------------|----------------|----------------------------------|
//! | `json_config`  | ConfigPort     | JSON config file                 |
//! | `line_source`  | SignalSource   | Headset bridge text stream       |
//! | `log_sink`     | EventSink      | `log` facade (console)           |
//! | `serial`       | LineTransport  | Actuator controller serial port  |

pub mod json_config;
pub mod line_source;
pub mod log_sink;
pub mod serial;
