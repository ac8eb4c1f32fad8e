// SPDX-License-Identifier: Apache-2.0
//! Owns the process set and the process-level cumulative rate table used
//! to pick a process (and then a site within it) in one weighted draw.

use rustc_hash::FxHashMap;

use crate::process::Process;

/// The process set plus the top-level prefix-sum table over
/// `Process::total_rate()`. Invariant: `total_rate()` equals the sum of
/// every process's own total rate after each matcher commit.
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    processes: Vec<Process>,
    index_by_id: FxHashMap<usize, usize>,
    prefix_sums: Vec<f64>,
    use_custom_rates: bool,
}

impl Interactions {
    /// Builds an interactions table over `processes`. Process ids need not
    /// be contiguous or sorted.
    #[must_use]
    pub fn new(processes: Vec<Process>, use_custom_rates: bool) -> Self {
        let index_by_id = processes.iter().enumerate().map(|(i, p)| (p.id(), i)).collect();
        let mut table = Self {
            processes,
            index_by_id,
            prefix_sums: Vec::new(),
            use_custom_rates,
        };
        table.update_probability_table();
        table
    }

    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    #[must_use]
    pub fn process(&self, id: usize) -> Option<&Process> {
        self.index_by_id.get(&id).map(|&i| &self.processes[i])
    }

    #[must_use]
    pub fn process_mut(&mut self, id: usize) -> Option<&mut Process> {
        self.index_by_id.get(&id).map(|&i| &mut self.processes[i])
    }

    #[must_use]
    pub fn use_custom_rates(&self) -> bool {
        self.use_custom_rates
    }

    /// Rebuilds the process-level prefix sums from each process's current
    /// `total_rate()`. Must be called after a matcher commit mutates any
    /// process's site registry via [`Interactions::process_mut`].
    pub fn update_probability_table(&mut self) {
        let mut running = 0.0;
        self.prefix_sums.clear();
        self.prefix_sums.reserve(self.processes.len());
        for process in &self.processes {
            running += process.total_rate();
            self.prefix_sums.push(running);
        }
    }

    /// Cached total rate `R = Σ_p R_p`, valid as of the last
    /// [`Interactions::update_probability_table`] call.
    #[must_use]
    pub fn total_rate(&self) -> f64 {
        self.prefix_sums.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_rate() <= 0.0
    }

    /// Picks a `(process_id, site)` pair via one weighted draw over
    /// `target` (a value in `[0, total_rate())`): first locates the process
    /// whose cumulative-rate interval contains `target` by binary search,
    /// then delegates the remainder of the draw to that process's own
    /// site pick.
    ///
    /// Returns `None` if no process has any registered site.
    #[must_use]
    pub fn pick_process(&self, target: f64) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let process_index = self.prefix_sums.partition_point(|&cumulative| cumulative <= target);
        let process_index = process_index.min(self.processes.len() - 1);
        let base = if process_index == 0 {
            0.0
        } else {
            self.prefix_sums[process_index - 1]
        };
        let process = &self.processes[process_index];
        Some((process.id(), process.pick_site(target - base)))
    }
}
