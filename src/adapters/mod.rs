//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | SensorPort   | float switch GPIO, battery ADC |
//! |            | InputPort    | directional button GPIOs       |
//! |            | ActuatorPort | solenoid / pump / LED GPIOs    |
//! |            | DisplayPort  | via `display`                  |
//! | `display`  | DisplayPort  | HD44780 over PCF8574 I²C       |
//! | `ds3231`   | ClockPort    | DS3231 RTC over I²C            |
//! | `nvs`      | StoragePort  | NVS flash / in-memory store    |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `time`     | (none)       | monotonic uptime source        |

pub mod display;
pub mod ds3231;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
