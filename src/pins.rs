//! GPIO / peripheral pin assignments for the Verdant garden board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Pin assignments match the original relay board wiring: both relay modules
//! are low-level triggered, so their GPIOs idle HIGH.

// ---------------------------------------------------------------------------
// Relays (active-low relay modules, idle HIGH)
// ---------------------------------------------------------------------------

/// Digital output: main water pump relay.  LOW = relay energised.
pub const PUMP_RELAY_GPIO: i32 = 2;
/// Digital output: orchid nebulizer bank relay.  LOW = relay energised.
pub const NEBULIZER_RELAY_GPIO: i32 = 12;

/// Both relay modules are low-level triggered; their idle (de-energised)
/// line level is HIGH.  The relay driver restores this level on every exit
/// path.
pub const RELAY_ACTIVE_LOW: bool = true;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture sensor — analog voltage via resistive divider.
/// ADC1 channel 0.
pub const MOISTURE_ADC_CHANNEL: u32 = 0;
/// ADC attenuation for the moisture sensor (12 dB → 0 – 3.1 V range).
pub const MOISTURE_ADC_ATTEN: u32 = 3;
