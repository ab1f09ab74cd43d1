//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `log_sink` | EventSink          | Serial log output        |
//! | `nvs`      | ConfigPort         | NVS / in-memory store    |
//! |            | StoragePort        |                          |
//! | `time`     | (wall clock)       | SNTP-synced system time  |

pub mod log_sink;
pub mod nvs;
pub mod time;
