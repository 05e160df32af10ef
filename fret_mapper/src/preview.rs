use chart_schema::{Lane, NoteEvent};

/// Text timeline of a lane mapping, Orange on the top row.
pub fn preview_lanes_ascii(notes: &[NoteEvent], lanes: &[Lane], ticks_per_beat: u32, width: usize) -> String {
    let Some(first) = notes.first().filter(|_| !lanes.is_empty()) else {
        return "No notes to preview.".to_string();
    };

    let start_tick = first.start_tick;
    let end_tick = notes.iter().map(|n| n.end_tick).max().unwrap_or(start_tick);
    let total_ticks = end_tick.saturating_sub(start_tick).max(1);

    let row_width = width.saturating_sub(5).max(1);
    let plot_width = width.saturating_sub(10).max(1);
    let mut rows = vec![vec![' '; row_width]; Lane::ALL.len()];

    for (note, lane) in notes.iter().zip(lanes) {
        let offset = f64::from(note.start_tick.saturating_sub(start_tick));
        let pos = (offset / f64::from(total_ticks) * plot_width as f64) as usize;
        if let Some(cell) = rows[lane.index() as usize].get_mut(pos) {
            *cell = '*';
        }
    }

    let rule = "-".repeat(row_width);
    let mut out = Vec::with_capacity(Lane::ALL.len() + 4);
    out.push(format!("Lane Preview ({} notes)", notes.len()));
    out.push(rule.clone());
    for lane in Lane::ALL.iter().rev() {
        let row: String = rows[lane.index() as usize].iter().collect();
        out.push(format!("{}|{}|", lane.initial(), row));
    }
    out.push(rule);

    let beats = f64::from(total_ticks) / f64::from(ticks_per_beat.max(1));
    out.push(format!("Duration: {beats:.1} beats"));
    out.join("\n")
}
