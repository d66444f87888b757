//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                 |
//! |-------------|---------------------|-----------------------------|
//! | `console`   | —                   | Serial console commands     |
//! | `hardware`  | SampleSource        | PZEM-004T over UART         |
//! |             | CutoffActuator      | Relay + buzzer GPIO         |
//! |             | ModeInput           | Test-mode jumper GPIO       |
//! | `log_sink`  | EventSink           | Serial log output           |
//! |             | DisplayPort         |                             |
//! |             | TelemetrySink       |                             |
//! | `notifier`  | Notifier            | HTTP webhook                |
//! | `time`      | —                   | ESP32 system timer          |
//! | `wifi`      | —                   | ESP-IDF WiFi STA            |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod notifier;
pub mod time;
pub mod wifi;
