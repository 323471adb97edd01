// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Time types.
//!
//! Durations and instants are [`fugit`] types, counted in ticks of the system clock, which runs
//! at [`SYS_FREQUENCY`] ticks per second.  Conversion to milliseconds for the port happens here.

use crate::kconfig::CONFIG_SYS_FREQUENCY;

/// The system clock frequency, in ticks per second.
pub const SYS_FREQUENCY: u32 = CONFIG_SYS_FREQUENCY;

/// The underlying tick type.
pub type Tick = u64;

/// A duration, in system ticks.
pub type Duration = fugit::Duration<Tick, 1, SYS_FREQUENCY>;

/// A point in time since the port was brought up, in system ticks.
pub type Instant = fugit::Instant<Tick, 1, SYS_FREQUENCY>;

/// The current time.
///
/// Reads zero if no port is installed.
pub fn now() -> Instant {
    let ms = crate::sys::port().map(|port| port.uptime_ms()).unwrap_or(0);
    Instant::from_ticks(ms_to_ticks(ms))
}

/// Suspend the calling thread for at least `delay`.
///
/// Without an installed port there is nothing to suspend on, and this returns immediately.
pub fn sleep(delay: Duration) {
    if let Some(port) = crate::sys::port() {
        port.sleep_ms(ticks_to_ms(delay.ticks()));
    }
}

// Whole seconds and the remainder are scaled separately, so only results beyond `u64` saturate.
fn ms_to_ticks(ms: u64) -> Tick {
    let freq = Tick::from(SYS_FREQUENCY);
    (ms / 1000)
        .saturating_mul(freq)
        .saturating_add(ms % 1000 * freq / 1000)
}

// Rounds up, so a sleep is never shorter than asked.
fn ticks_to_ms(ticks: Tick) -> u64 {
    let freq = Tick::from(SYS_FREQUENCY);
    (ticks / freq)
        .saturating_mul(1000)
        .saturating_add((ticks % freq * 1000).div_ceil(freq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_are_exact_at_the_system_rate() {
        for ms in [0, 1, 999, 1000, 1001, 123_456_789] {
            assert_eq!(ticks_to_ms(ms_to_ticks(ms)), ms);
        }
    }

    #[test]
    fn large_durations_do_not_overflow() {
        let delay = Duration::from_ticks(u64::MAX / 10);
        assert!(ticks_to_ms(delay.ticks()) >= u64::MAX / 10 / Tick::from(SYS_FREQUENCY) * 1000);
        assert!(ticks_to_ms(u64::MAX) > 0);
        assert!(ms_to_ticks(u64::MAX) > 0);
    }

    #[test]
    fn sleep_without_port_returns() {
        // No unit test installs a port, so this must not wait.
        sleep(Duration::from_ticks(u64::MAX));
    }
}
