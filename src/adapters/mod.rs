//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                     |
//! |-------------|--------------------|---------------------------------|
//! | `device_id` | (boot info)        | eFuse MAC, hardware RNG         |
//! | `http`      | HttpTransport      | EspHttpConnection / TcpStream   |
//! | `log_sink`  | EventSink          | Serial log output               |
//! | `nvs`       | PersistencePort    | NVS / in-memory store           |
//! | `time`      | (monotonic clock)  | ESP32 system timer              |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA                |

pub mod device_id;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
