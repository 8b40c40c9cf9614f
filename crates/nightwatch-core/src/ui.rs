//! Text shown on the HUD. Pure functions of core state.

/// Clock label for a display hour, e.g. `"03:00 AM"`.
pub fn clock_text(display_hour: u32) -> String {
    format!("{display_hour:02}:00 AM")
}

pub fn progress_text(collected: usize, total: usize) -> String {
    format!("Collected Items {collected} / {total}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(clock_text(12), "12:00 AM");
        assert_eq!(clock_text(3), "03:00 AM");
    }

    #[test]
    fn progress_format() {
        assert_eq!(progress_text(1, 3), "Collected Items 1 / 3");
    }
}
