use std::collections::BTreeSet;

use chart_schema::{Chart, Lane, Tick, Track, OPEN_FRET};

/// Renders one track as a tick-by-tick fret grid.
///
/// Note heads show the lane initial (`O` for all five on an open note),
/// held sustains show `|` and a sustain end shows `#`. Flags, tempo and
/// sections go in the Info column.
pub fn render_timeline(chart: &Chart, track: &Track) -> String {
    if track.notes().is_empty() {
        return "Track is empty.\n".to_string();
    }

    let mut ticks = BTreeSet::new();
    for note in track.notes() {
        ticks.insert(note.tick);
        if note.sustain > 0 {
            ticks.insert(note.tick.saturating_add(note.sustain));
        }
    }
    for sp in &track.star_power {
        ticks.insert(sp.tick);
    }
    for bpm in &chart.bpm_changes {
        ticks.insert(bpm.tick);
    }
    for section in &chart.sections {
        ticks.insert(section.tick);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Timeline ({} notes, resolution {})\n",
        track.note_count(),
        chart.meta.resolution
    ));
    out.push_str("    Tick | G R Y B O | Info\n");
    out.push_str("---------|-----------|------------------\n");

    // End tick of the sustain held on each lane.
    let mut holding: [Option<Tick>; 5] = [None; 5];

    for &tick in &ticks {
        let mut info = Vec::new();
        for bpm in chart.bpm_changes.iter().filter(|b| b.tick == tick) {
            info.push(format!("BPM: {:.1}", bpm.bpm));
        }
        for section in chart.sections.iter().filter(|s| s.tick == tick) {
            info.push(format!("Section: {}", section.name));
        }
        for sp in track.star_power.iter().filter(|sp| sp.tick == tick) {
            info.push(format!("SP x{}", sp.length));
        }

        let mut cells = ['.'; 5];
        for (lane, end) in holding.iter_mut().enumerate() {
            match *end {
                Some(e) if e == tick => {
                    cells[lane] = '#';
                    *end = None;
                }
                Some(_) => cells[lane] = '|',
                None => {}
            }
        }

        let chord = track.notes_at_tick(tick);
        for note in chord {
            let sustain_end = (note.sustain > 0).then(|| note.tick.saturating_add(note.sustain));
            if note.fret == OPEN_FRET {
                cells = ['O'; 5];
                info.push("open".to_string());
                if sustain_end.is_some() {
                    holding = [sustain_end; 5];
                }
            } else if let Some(lane) = Lane::from_index(note.fret) {
                let idx = lane.index() as usize;
                cells[idx] = lane.initial();
                if sustain_end.is_some() {
                    holding[idx] = sustain_end;
                }
            }
        }
        if chord.iter().any(|n| n.is_forced) {
            info.push("forced".to_string());
        }
        if chord.iter().any(|n| n.is_tap) {
            info.push("tap".to_string());
        }
        if let Some(max) = chord.iter().map(|n| n.sustain).max().filter(|&s| s > 0) {
            info.push(format!("sustain {max}"));
        }

        let lanes: Vec<String> = cells.iter().map(char::to_string).collect();
        out.push_str(&format!("{tick:8} | {} | {}\n", lanes.join(" "), info.join(", ")));
    }
    out
}
