//! Timeline ruler: label spacing and label text.

/// Zoom at which a band's default interval is used unchanged.
const REFERENCE_PX_PER_SEC: f64 = 50.0;

/// Candidate intervals and marker-count targets for one duration band.
struct RulerBand {
    intervals: &'static [f64],
    default_index: usize,
    min_markers: f64,
    max_markers: f64,
}

const SHORT: RulerBand = RulerBand {
    intervals: &[1.0, 2.0],
    default_index: 1,
    min_markers: 10.0,
    max_markers: 30.0,
};

const MINUTE: RulerBand = RulerBand {
    intervals: &[2.0, 3.0, 4.0, 5.0],
    default_index: 3,
    min_markers: 8.0,
    max_markers: 20.0,
};

const FEW_MINUTES: RulerBand = RulerBand {
    intervals: &[10.0, 12.0, 15.0, 18.0, 20.0],
    default_index: 3,
    min_markers: 7.0,
    max_markers: 18.0,
};

const LONG: RulerBand = RulerBand {
    intervals: &[30.0, 45.0, 60.0, 90.0, 120.0],
    default_index: 0,
    min_markers: 5.0,
    max_markers: 12.0,
};

fn band_for(total: f64) -> RulerBand {
    if total < 30.0 {
        SHORT
    } else if total <= 60.0 {
        MINUTE
    } else if total <= 180.0 {
        FEW_MINUTES
    } else {
        // Long timelines default to the interval giving about nine markers.
        let target = 9.0;
        let default_index = LONG
            .intervals
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (total / **a - target).abs();
                let db = (total / **b - target).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        RulerBand {
            default_index,
            ..LONG
        }
    }
}

/// Seconds between labelled ruler ticks for a timeline of `total_secs` shown
/// at `px_per_sec`.
///
/// Starts from the band default, shifts one step finer when zoomed in and one
/// step coarser when zoomed out, then nudges toward the band's marker-count
/// window. Never exceeds the timeline length; never below 0.1 s.
pub fn ruler_label_interval(total_secs: f64, px_per_sec: f64) -> f64 {
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return 1.0;
    }
    let band = band_for(total_secs);
    let last = band.intervals.len() - 1;
    let mut index = band.default_index;

    if px_per_sec.is_finite() {
        if px_per_sec > REFERENCE_PX_PER_SEC * 1.8 && index > 0 {
            index -= 1;
            if total_secs < 30.0 && px_per_sec > 100.0 {
                index = 0;
            }
        } else if px_per_sec < REFERENCE_PX_PER_SEC * 0.6 && index < last {
            index += 1;
        }
    }

    let markers = |interval: f64| total_secs / interval;
    let in_window = |interval: f64| {
        let m = markers(interval);
        m >= band.min_markers && m <= band.max_markers
    };

    let mut chosen = band.intervals[index];
    if markers(chosen) < band.min_markers && index > 0 {
        if let Some(i) = (0..index)
            .rev()
            .find(|&i| in_window(band.intervals[i]) || i == 0)
        {
            let candidate = band.intervals[i];
            if in_window(candidate) || markers(candidate) < band.min_markers {
                chosen = candidate;
            }
        }
    } else if markers(chosen) > band.max_markers && index < last {
        if let Some(i) = (index + 1..=last).find(|&i| in_window(band.intervals[i]) || i == last) {
            let candidate = band.intervals[i];
            if in_window(candidate) || markers(candidate) > band.max_markers {
                chosen = candidate;
            }
        }
    }

    if chosen > total_secs {
        chosen = band
            .intervals
            .iter()
            .rev()
            .copied()
            .find(|iv| *iv <= total_secs)
            .unwrap_or(total_secs.max(1.0));
    }
    chosen.min(total_secs).max(0.1)
}

/// Label text for a ruler tick: `h:mm:ss`, `m:ss`, `:ss`, or `0`.
pub fn format_ruler_label(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let whole = secs.floor() as u64;
    let (h, m, s) = (whole / 3600, (whole / 60) % 60, whole % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else if m > 0 {
        format!("{m}:{s:02}")
    } else if secs == 0.0 {
        "0".to_string()
    } else {
        format!(":{s:02}")
    }
}

/// Playhead readout, `m:ss.t`.
pub fn format_timecode(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let tenths = (secs * 10.0).floor() as u64;
    let (m, s, t) = (tenths / 600, (tenths / 10) % 60, tenths % 10);
    format!("{m}:{s:02}.{t}")
}

/// Times of the labelled ticks from zero through `total_secs`.
pub fn ruler_ticks(total_secs: f64, px_per_sec: f64) -> Vec<f64> {
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return vec![0.0];
    }
    let interval = ruler_label_interval(total_secs, px_per_sec);
    let count = (total_secs / interval).floor() as usize;
    (0..=count).map(|i| i as f64 * interval).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_timeline_intervals() {
        assert_eq!(ruler_label_interval(20.0, 50.0), 2.0);
        // Zoomed in far enough, short timelines label every second.
        assert_eq!(ruler_label_interval(20.0, 150.0), 1.0);
        // Zoomed out does not go past the band's coarsest step.
        assert_eq!(ruler_label_interval(20.0, 5.0), 2.0);
    }

    #[test]
    fn test_minute_band_prefers_marker_window() {
        // 60 s at 5 s gives 12 markers, inside [8, 20].
        assert_eq!(ruler_label_interval(60.0, 50.0), 5.0);
        // 40 s at 5 s gives 8 markers.
        assert_eq!(ruler_label_interval(40.0, 50.0), 5.0);
        // 35 s at 5 s gives 7 markers; 4 s gives 8.75.
        assert_eq!(ruler_label_interval(35.0, 50.0), 4.0);
    }

    #[test]
    fn test_long_timeline_default_targets_nine_markers() {
        // 600 s: 60 s gives 10 markers, the closest to nine.
        assert_eq!(ruler_label_interval(600.0, 50.0), 60.0);
    }

    #[test]
    fn test_degenerate_totals() {
        assert_eq!(ruler_label_interval(0.0, 50.0), 1.0);
        assert_eq!(ruler_label_interval(f64::NAN, 50.0), 1.0);
        assert_eq!(ruler_label_interval(-3.0, 50.0), 1.0);
        assert_eq!(ruler_label_interval(0.5, 50.0), 0.5);
        assert_eq!(ruler_label_interval(0.05, 50.0), 0.1);
    }

    #[test]
    fn test_label_formats() {
        assert_eq!(format_ruler_label(0.0), "0");
        assert_eq!(format_ruler_label(5.0), ":05");
        assert_eq!(format_ruler_label(65.0), "1:05");
        assert_eq!(format_ruler_label(3_725.0), "1:02:05");
        assert_eq!(format_ruler_label(-4.0), "0");
        assert_eq!(format_timecode(65.37), "1:05.3");
    }

    #[test]
    fn test_ticks_cover_timeline() {
        // 10 s at 2 s gives 5 markers, so the ruler steps down to 1 s.
        let expected: Vec<f64> = (0..=10).map(f64::from).collect();
        assert_eq!(ruler_ticks(10.0, 50.0), expected);
        assert_eq!(ruler_ticks(0.0, 50.0), vec![0.0]);
    }
}
