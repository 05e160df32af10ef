use chart_schema::Tick;

/// Rescales `tick` from one ticks-per-quarter resolution to another,
/// truncating toward zero. Integer arithmetic only, so results are exact and
/// identical on every platform.
///
/// # Panics
///
/// Panics if `from_ppq` is zero.
pub fn convert_ticks(tick: Tick, from_ppq: u32, to_ppq: u32) -> Tick {
    assert!(from_ppq > 0, "source resolution must be positive");
    let scaled = u64::from(tick) * u64::from(to_ppq) / u64::from(from_ppq);
    Tick::try_from(scaled).unwrap_or(Tick::MAX)
}
