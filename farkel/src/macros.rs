use std::time::Instant;

macro_rules! cfg_test {
    ($($item:item)*) => {
        $(
            #[cfg(test)]
            $item
        )*
    }
}

/// Logs how long it lived, at debug level, when dropped.
pub(crate) struct Timer {
    label: &'static str,
    location: &'static str,
    started: Instant,
}

impl Timer {
    pub fn start(label: &'static str, location: &'static str) -> Self {
        Self {
            label,
            location,
            started: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::debug!(
            location = self.location,
            elapsed = ?self.started.elapsed(),
            "{} finished",
            self.label,
        );
    }
}

macro_rules! time {
    ($label:expr, $b:block) => {{
        let _timer = $crate::macros::Timer::start(
            $label,
            ::std::concat!(::std::file!(), ":", ::std::line!()),
        );
        $b
    }};
    ($label:expr, $e:expr) => {{
        time!($label, { $e })
    }};
}

#[cfg(test)]
mod test {
    #[test]
    fn test_time_passes_value_through() {
        assert_eq!(3, time!("sum", { 1 + 2 }));
        assert_eq!(Some(4), time!("checked add", 2u8.checked_add(2)));
    }
}
