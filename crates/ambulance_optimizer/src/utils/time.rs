/// Runs `$block` and logs its wall-clock duration at debug level.
#[macro_export]
macro_rules! timer_debug {
    ($label:expr, $block:expr) => {{
        let started = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(started);

        tracing::debug!(elapsed = ?elapsed, "{}", $label);

        result
    }};
}
