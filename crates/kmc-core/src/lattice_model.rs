// SPDX-License-Identifier: Apache-2.0
//! Top-level orchestration: pick a process and site weighted by rate,
//! apply it, re-match the affected neighborhood, advance simulated time.

use tracing::trace;

use crate::configuration::Configuration;
use crate::error::KmcError;
use crate::interactions::Interactions;
use crate::matcher::Matcher;
use crate::msd::OnTheFlyMSD;
use crate::rate_callback::RateCallback;
use crate::rate_table::RateTable;
use crate::rng::RandomSource;
use crate::simulation_timer::SimulationTimer;

/// How far a step's affected-site set is expanded, in lattice-cell shells,
/// before re-matching: one shell around every directly touched site.
const REMATCH_SHELLS: i64 = 1;

/// What one [`LatticeModel::single_step`] call did.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub process_id: usize,
    pub site: usize,
    pub dt: f64,
    pub rematched_sites: Vec<usize>,
}

/// Owns the full simulation state: configuration, the process set, the
/// fingerprint cache, simulated time, the RNG, an optional MSD
/// accumulator, and the rate callback.
pub struct LatticeModel {
    configuration: Configuration,
    interactions: Interactions,
    rate_table: RateTable,
    timer: SimulationTimer,
    rng: Box<dyn RandomSource>,
    callback: Box<dyn RateCallback>,
    msd: Option<OnTheFlyMSD>,
}

impl LatticeModel {
    #[must_use]
    pub fn new(
        configuration: Configuration,
        interactions: Interactions,
        rng: Box<dyn RandomSource>,
        callback: Box<dyn RateCallback>,
        msd: Option<OnTheFlyMSD>,
    ) -> Self {
        Self {
            configuration,
            interactions,
            rate_table: RateTable::new(),
            timer: SimulationTimer::new(),
            rng,
            callback,
            msd,
        }
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[must_use]
    pub fn interactions(&self) -> &Interactions {
        &self.interactions
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.timer.time()
    }

    #[must_use]
    pub fn msd(&self) -> Option<&OnTheFlyMSD> {
        self.msd.as_ref()
    }

    /// Populates every process's site registry by matching against the
    /// whole configuration. Must be called once before the first
    /// [`LatticeModel::single_step`].
    pub fn init_match_lists(&mut self) -> Result<(), KmcError> {
        let longest_match_list = self.interactions.processes().iter().map(|p| p.match_list().len()).max().unwrap_or(0);
        self.configuration.reserve_move_scratch(longest_match_list);
        let all_sites: Vec<usize> = (0..self.configuration.n_sites()).collect();
        Matcher::calculate_matching(
            &all_sites,
            &self.configuration,
            &mut self.interactions,
            &mut self.rate_table,
            self.callback.as_ref(),
        )
    }

    /// Runs one KMC step: picks a process and site weighted by rate,
    /// applies its update deltas, re-matches the affected neighborhood
    /// (expanded by [`REMATCH_SHELLS`]), and advances simulated time by
    /// `-ln(u)/R` using the total rate from *before* this step's
    /// re-matching.
    ///
    /// Returns `Ok(None)` if no process has any registered site: the
    /// configuration has reached an absorbing state.
    pub fn single_step(&mut self) -> Result<Option<StepOutcome>, KmcError> {
        let total_rate = self.interactions.total_rate();
        if total_rate <= 0.0 {
            return Ok(None);
        }

        let draw = self.rng.uniform01() * total_rate;
        let (process_id, site) = self
            .interactions
            .pick_process(draw)
            .ok_or(KmcError::InternalInvariant("total_rate > 0 guarantees pick_process succeeds"))?;

        let process = self
            .interactions
            .process(process_id)
            .ok_or(KmcError::InternalInvariant("pick_process only ever returns a live process id"))?;
        let cutoff = process.cutoff();
        let config_list = self.configuration.match_list_around(site, cutoff);

        let affected = self.configuration.apply(process, site, &config_list)?;

        if let Some(msd) = &mut self.msd {
            msd.register_step(self.timer.time(), &self.configuration);
        }

        let rematched_sites = self.configuration.lattice().superset_neighbor_indices(&affected, REMATCH_SHELLS);
        Matcher::calculate_matching(
            &rematched_sites,
            &self.configuration,
            &mut self.interactions,
            &mut self.rate_table,
            self.callback.as_ref(),
        )?;

        let dt = self.timer.propagate_time(total_rate, self.rng.as_mut());
        trace!(process_id, site, affected = affected.len(), total_rate, dt, "single_step");

        Ok(Some(StepOutcome {
            process_id,
            site,
            dt,
            rematched_sites,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice_map::LatticeMap;
    use crate::process::Process;
    use crate::rate_callback::ConstantRateCallback;
    use crate::rng::MinstdRng;
    use crate::type_bucket::TypeBucket;
    use kmc_geom::Coordinate;

    fn grid_configuration(reps: [usize; 3]) -> Configuration {
        let lattice = LatticeMap::new(1, reps, [true, true, true]);
        let coordinates: Vec<Coordinate> = (0..lattice.total_sites())
            .map(|index| {
                let (i, j, k) = lattice.index_to_cell(index);
                Coordinate::new(i as f64, j as f64, k as f64)
            })
            .collect();
        Configuration::new(lattice, coordinates, 2).unwrap()
    }

    fn hop_in_x_process() -> Process {
        Process::new(
            0,
            vec![Coordinate::origin(), Coordinate::new(1.0, 0.0, 0.0)],
            vec![TypeBucket::from_counts(vec![0, 1]), TypeBucket::from_counts(vec![0, 0])],
            vec![TypeBucket::from_counts(vec![0, 0]), TypeBucket::from_counts(vec![0, 1])],
            vec![Some(Coordinate::new(1.0, 0.0, 0.0)), None],
            vec![0],
            1.0,
            false,
        )
        .unwrap()
    }

    fn model_with_one_occupied_site() -> LatticeModel {
        let mut config = grid_configuration([4, 4, 4]);
        config.apply_delta(0, &TypeBucket::from_counts(vec![0, 1])).unwrap();
        let interactions = Interactions::new(vec![hop_in_x_process()], false);
        LatticeModel::new(
            config,
            interactions,
            Box::new(MinstdRng::seeded(1)),
            Box::new(ConstantRateCallback),
            None,
        )
    }

    #[test]
    fn single_step_before_init_match_lists_finds_no_process() {
        let mut model = model_with_one_occupied_site();
        assert!(model.single_step().unwrap().is_none());
    }

    #[test]
    fn init_match_lists_registers_the_occupied_site() {
        let mut model = model_with_one_occupied_site();
        model.init_match_lists().unwrap();
        assert_eq!(model.interactions().process(0).unwrap().sites(), &[0]);
    }

    #[test]
    fn single_step_hops_the_particle_and_advances_time() {
        let mut model = model_with_one_occupied_site();
        model.init_match_lists().unwrap();
        let outcome = model.single_step().unwrap().expect("process 0 has positive rate");
        assert_eq!(outcome.process_id, 0);
        assert_eq!(outcome.site, 0);
        assert!(outcome.dt > 0.0);
        assert_eq!(model.configuration().occupancy(0).counts(), &[0, 0]);
        assert!(model.time() > 0.0);

        // The particle must have reappeared at exactly one other site.
        let occupied: Vec<usize> = (0..model.configuration().n_sites())
            .filter(|&s| model.configuration().occupancy(s).counts()[1] > 0)
            .collect();
        assert_eq!(occupied.len(), 1);
        assert_ne!(occupied[0], 0);
    }

    #[test]
    fn repeated_steps_keep_exactly_one_particle_on_the_lattice() {
        let mut model = model_with_one_occupied_site();
        model.init_match_lists().unwrap();
        for _ in 0..20 {
            if model.single_step().unwrap().is_none() {
                break;
            }
        }
        let total_occupancy: i64 = (0..model.configuration().n_sites())
            .map(|s| model.configuration().occupancy(s).counts()[1])
            .sum();
        assert_eq!(total_occupancy, 1);
    }
}
