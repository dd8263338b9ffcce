//! Win-percentage tables.
//!
//! A [`WinPct`] maps (spread, tiles unseen) to an empirical probability
//! of winning. Lookups clamp out-of-range spreads and unseen counts to
//! the table edges. The table itself is an artifact; a synthetic
//! logistic table is provided so the simulator works without one.

#[derive(Debug, Clone)]
pub struct WinPct {
    min_spread: i32,
    max_spread: i32,
    max_unseen: usize,
    /// Row per spread value, column per unseen count (0-indexed by
    /// `unseen - 1`).
    values: Vec<f32>,
}

impl WinPct {
    /// Build from explicit rows: `rows[s][u]` is the win probability at
    /// spread `min_spread + s` with `u + 1` tiles unseen.
    pub fn new(min_spread: i32, rows: Vec<Vec<f32>>) -> WinPct {
        let max_unseen = rows.first().map(Vec::len).unwrap_or(0);
        let max_spread = min_spread + rows.len() as i32 - 1;
        let mut values = Vec::with_capacity(rows.len() * max_unseen);
        for row in &rows {
            debug_assert_eq!(row.len(), max_unseen);
            values.extend_from_slice(row);
        }
        WinPct {
            min_spread,
            max_spread,
            max_unseen,
            values,
        }
    }

    /// A smooth synthetic table: the spread advantage decays with the
    /// number of unseen tiles still to come.
    pub fn synthetic() -> WinPct {
        let min_spread = -300;
        let max_spread = 300;
        let max_unseen = 93;
        let mut rows = Vec::with_capacity((max_spread - min_spread + 1) as usize);
        for spread in min_spread..=max_spread {
            let mut row = Vec::with_capacity(max_unseen);
            for unseen in 1..=max_unseen {
                let scale = 8.0 * ((unseen as f64) + 1.0).sqrt();
                let p = 0.5 * (1.0 + (f64::from(spread) / scale).tanh());
                row.push(p as f32);
            }
            rows.push(row);
        }
        WinPct::new(min_spread, rows)
    }

    /// Win probability for `spread` points with `unseen` tiles unseen.
    pub fn get(&self, spread: i32, unseen: usize) -> f32 {
        if self.values.is_empty() {
            return 0.5;
        }
        let spread = spread.clamp(self.min_spread, self.max_spread);
        let unseen = unseen.clamp(1, self.max_unseen);
        let row = (spread - self.min_spread) as usize;
        self.values[row * self.max_unseen + (unseen - 1)]
    }
}

impl Default for WinPct {
    fn default() -> Self {
        WinPct::synthetic()
    }
}
