//! Reading and writing `.chart` documents.
//!
//! [`parse_str`] / [`parse_file`] turn text into a [`Chart`];
//! [`write_string`] / [`write_file`] render one back in canonical order.
//! The [`convert`] helpers build charts from lane-mapped note sequences.

use std::{fs, path::Path};

use chart_schema::Chart;

mod convert;
mod error;
mod parser;
mod ticks;
mod writer;

pub use convert::{
    build_chart, format_notes_section, format_sync_track, generate_chart_string, min_sustain_ticks,
    ConvertOptions,
};
pub use error::{ChartError, ChartErrorKind};
pub use ticks::convert_ticks;
pub use writer::{
    format_events_section, format_song_section, format_sync_track_section, format_track_section,
    write_chart_string,
};

pub fn parse_str(src: &str) -> Result<Chart, ChartError> {
    parser::parse_chart(src)
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Chart, ChartError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ChartError::new("E2001", format!("failed to read chart: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    parse_str(&src).map_err(|e| e.with_file(path.display().to_string()))
}

pub fn write_string(chart: &Chart) -> Result<String, ChartError> {
    write_chart_string(chart)
}

/// Renders first, so a validation failure leaves any existing file untouched.
pub fn write_file(chart: &Chart, path: impl AsRef<Path>) -> Result<(), ChartError> {
    let path = path.as_ref();
    let text = write_chart_string(chart)?;
    let io_err = |e: std::io::Error| {
        ChartError::new("E2002", format!("failed to write chart: {e}"), 0)
            .with_file(path.display().to_string())
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, text).map_err(io_err)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests;
