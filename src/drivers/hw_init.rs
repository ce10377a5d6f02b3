//! One-shot hardware peripheral initialization.
//!
//! Configures the moisture ADC channel and the relay output GPIOs using raw
//! ESP-IDF sys calls.  Called once from `main()` before the wake cycle runs.
//!
//! On host targets the module keeps a process-global simulated pin table so
//! drivers and tests can observe line levels and inject write failures.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::{ActuatorError, SensorError};
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

// ── Init entry point ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the wake cycle; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_adc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // Seed the simulated relay lines at their idle (HIGH) level, matching
    // what the hardware pull-ups provide before the first write.
    for gpio in [pins::PUMP_RELAY_GPIO, pins::NEBULIZER_RELAY_GPIO] {
        sim::set_level(gpio, true);
    }
    log::info!("hw_init(sim): relay lines seeded idle-high");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// wake-cycle ADC read path.  No concurrent access is possible because
/// `init_adc()` completes before the cycle starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::MOISTURE_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 configured (CH0=moisture)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once during init_adc() before this
    // function is called; single-threaded wake-cycle access guaranteed.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    Ok(0)
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let relay_pins = [pins::PUMP_RELAY_GPIO, pins::NEBULIZER_RELAY_GPIO];

    for &pin in &relay_pins {
        // The relay modules are active-low: drive the line HIGH *before*
        // switching it to output so the relay never sees an energise pulse
        // during boot.
        unsafe {
            gpio_set_level(pin, 1);
        }
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe {
            gpio_set_level(pin, 1);
        }
    }

    info!("hw_init: relay outputs configured idle-high");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Wake-cycle context only.
    let ret = unsafe { gpio_set_level(pin, if high { 1 } else { 0 }) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    sim::write(pin, high)
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::sync::Mutex;

    use crate::error::ActuatorError;

    struct SimGpio {
        /// Last written level per pin.
        levels: Vec<(i32, bool)>,
        /// Every successful write, in order.
        log: Vec<(i32, bool)>,
        /// `(pin, remaining_ok_writes)` — after that many successful writes
        /// to `pin`, the next write fails once, then the rule clears.
        /// Per-pin rules so concurrently running tests stay isolated.
        fails: Vec<(i32, u32)>,
    }

    static SIM_GPIO: Mutex<SimGpio> = Mutex::new(SimGpio {
        levels: Vec::new(),
        log: Vec::new(),
        fails: Vec::new(),
    });

    pub(super) fn set_level(pin: i32, high: bool) {
        let mut g = SIM_GPIO.lock().unwrap();
        set_level_locked(&mut g, pin, high);
    }

    fn set_level_locked(g: &mut SimGpio, pin: i32, high: bool) {
        if let Some(entry) = g.levels.iter_mut().find(|(p, _)| *p == pin) {
            entry.1 = high;
        } else {
            g.levels.push((pin, high));
        }
    }

    pub(super) fn write(pin: i32, high: bool) -> Result<(), ActuatorError> {
        let mut g = SIM_GPIO.lock().unwrap();
        if let Some(idx) = g.fails.iter().position(|(p, _)| *p == pin) {
            if g.fails[idx].1 == 0 {
                // A failed write leaves the line at its previous level.
                g.fails.swap_remove(idx);
                return Err(ActuatorError::GpioWriteFailed);
            }
            g.fails[idx].1 -= 1;
        }
        set_level_locked(&mut g, pin, high);
        g.log.push((pin, high));
        Ok(())
    }

    pub fn level(pin: i32) -> Option<bool> {
        let g = SIM_GPIO.lock().unwrap();
        g.levels.iter().find(|(p, _)| *p == pin).map(|(_, h)| *h)
    }

    pub fn writes(pin: i32) -> Vec<bool> {
        let g = SIM_GPIO.lock().unwrap();
        g.log
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, h)| *h)
            .collect()
    }

    pub fn clear(pin: i32) {
        let mut g = SIM_GPIO.lock().unwrap();
        g.levels.retain(|(p, _)| *p != pin);
        g.log.retain(|(p, _)| *p != pin);
        g.fails.retain(|(p, _)| *p != pin);
    }

    pub fn fail_after(pin: i32, ok_writes: u32) {
        let mut g = SIM_GPIO.lock().unwrap();
        g.fails.retain(|(p, _)| *p != pin);
        g.fails.push((pin, ok_writes));
    }
}

/// Current simulated level of a pin, if it was ever driven.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> Option<bool> {
    sim::level(pin)
}

/// Ordered list of successful writes to a pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_writes(pin: i32) -> Vec<bool> {
    sim::writes(pin)
}

/// Forget all simulated history for a pin.  Tests touching the same pin
/// must not run concurrently; using distinct pins per test avoids that.
#[cfg(not(target_os = "espidf"))]
pub fn sim_clear_gpio(pin: i32) {
    sim::clear(pin)
}

/// Inject a one-shot write failure: after `ok_writes` further successful
/// writes to `pin`, the next write returns an error, then the rule clears.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_gpio_write_after(pin: i32, ok_writes: u32) {
    sim::fail_after(pin, ok_writes)
}
