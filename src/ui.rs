//! Status lines for humans. Everything goes to stderr; stdout is the payload.

use colored::Colorize;
use parking_lot::Mutex;

pub mod rgb {
    pub const ELECTRIC_YELLOW: (u8, u8, u8) = (241, 250, 140);
    pub const SUCCESS_GREEN: (u8, u8, u8) = (80, 250, 123);
    pub const ERROR_RED: (u8, u8, u8) = (255, 99, 99);
}

static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

pub fn set_quiet_mode(enabled: bool) {
    let mut quiet_mode = QUIET_MODE.lock();
    *quiet_mode = enabled;
}

pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::SUCCESS_GREEN;
        eprintln!("{}", message.truecolor(r, g, b));
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::ELECTRIC_YELLOW;
        eprintln!("{}", message.truecolor(r, g, b).bold());
    }
}

/// Errors are printed even in quiet mode
pub fn print_error(message: &str) {
    let (r, g, b) = rgb::ERROR_RED;
    eprintln!("{}", message.truecolor(r, g, b).bold());
}
