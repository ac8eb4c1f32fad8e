// SPDX-License-Identifier: Apache-2.0
//! Per-step matching engine: decides which (site, process) pairs must be
//! removed, updated or added after a configuration change, evaluates rates
//! for the ones that need them, and commits the result into
//! [`Interactions`] and [`RateTable`].

use tracing::instrument;

use crate::configuration::Configuration;
use crate::error::KmcError;
use crate::fingerprint::fingerprint;
use crate::interactions::Interactions;
use crate::match_list_entry::whatever_match;
use crate::rate_callback::{RateCallback, RateContext};
use crate::rate_table::RateTable;
use crate::type_bucket::TypeBucket;
use kmc_workers::execute_sharded;

/// Worker count for the read-only `decide` pass: the host's parallelism,
/// falling back to one. `evaluate_rates` stays serial since it mutates the
/// shared fingerprint cache; see `calculate_matching`'s doc comment.
fn decide_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// What a (site, process) pair's match state changed to, relative to
/// whether the process already had that site registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Remove,
    Update,
    Add,
}

#[derive(Debug, Clone)]
struct MatchTask {
    site: usize,
    process_id: usize,
    decision: Decision,
    multiplicity: u64,
}

/// Stateless per-step engine. Every method borrows the state it needs for
/// the duration of the call; nothing is owned between calls.
#[derive(Debug, Default)]
pub struct Matcher;

impl Matcher {
    /// Recomputes matches for every site in `sites` against every process
    /// in `interactions`, then commits the result: process registries are
    /// updated in fixed remove → update → add order, `rate_table` absorbs
    /// any newly computed cacheable rates, and `interactions`'s top-level
    /// cumulative table is rebuilt.
    ///
    /// `decide` is embarrassingly parallel (each site reads, never writes,
    /// the shared state) and fans out across `kmc_workers::execute_sharded`.
    /// `evaluate_rates` stays serial: it's the only pass that writes into
    /// `rate_table`, and a per-site lock around a handful of hash-map
    /// inserts isn't worth the contention for the gain.
    #[instrument(skip(configuration, interactions, rate_table, callback))]
    pub fn calculate_matching(
        sites: &[usize],
        configuration: &Configuration,
        interactions: &mut Interactions,
        rate_table: &mut RateTable,
        callback: &dyn RateCallback,
    ) -> Result<(), KmcError> {
        let tasks = Self::decide(sites, configuration, interactions);
        let rates = Self::evaluate_rates(&tasks, configuration, interactions, rate_table, callback)?;
        Self::commit(&tasks, &rates, interactions);
        Ok(())
    }

    #[instrument(skip(configuration, interactions))]
    fn decide(sites: &[usize], configuration: &Configuration, interactions: &Interactions) -> Vec<MatchTask> {
        let per_site = execute_sharded(sites, decide_worker_count(), |_, &site| {
            let basis = configuration.lattice().basis_site_from_index(site);
            let mut site_tasks = Vec::new();
            for process in interactions.processes() {
                if !process.basis_sites().contains(&basis) {
                    continue;
                }
                let config_list = configuration.match_list_around(site, process.cutoff());
                let in_table = process.sites().contains(&site);
                let is_match = whatever_match(process.match_list(), &config_list);
                let decision = match (in_table, is_match) {
                    (true, false) => Decision::Remove,
                    (true, true) => Decision::Update,
                    (false, true) => Decision::Add,
                    (false, false) => continue,
                };
                let multiplicity = if decision == Decision::Remove {
                    1
                } else {
                    process
                        .match_list()
                        .iter()
                        .zip(config_list.iter())
                        .map(|(prototype, observed)| {
                            TypeBucket::multiplicity_factor(prototype.match_types(), observed.match_types())
                        })
                        .product()
                };
                site_tasks.push(MatchTask {
                    site,
                    process_id: process.id(),
                    decision,
                    multiplicity,
                });
            }
            site_tasks
        });
        per_site.into_iter().flatten().collect()
    }

    #[instrument(skip(configuration, interactions, rate_table, callback))]
    fn evaluate_rates(
        tasks: &[MatchTask],
        configuration: &Configuration,
        interactions: &Interactions,
        rate_table: &mut RateTable,
        callback: &dyn RateCallback,
    ) -> Result<Vec<f64>, KmcError> {
        tasks
            .iter()
            .map(|task| {
                if task.decision == Decision::Remove {
                    return Ok(0.0);
                }
                let process = interactions
                    .process(task.process_id)
                    .ok_or(KmcError::InternalInvariant("decide() emitted a task for a process that no longer exists"))?;

                if !interactions.use_custom_rates() {
                    return Ok(process.rate_for_multiplicity(task.multiplicity));
                }

                let key = fingerprint(process.id(), process.match_list());
                if let Some(cached) = rate_table.get(key) {
                    return Ok(cached * task.multiplicity as f64);
                }

                let center = configuration.coordinate(task.site);
                let relative_positions: Vec<_> =
                    process.match_list().iter().map(|entry| entry.relative_coordinate()).collect();
                let types_before: Vec<_> = process.match_list().iter().map(|entry| entry.match_types().clone()).collect();
                let types_after: Vec<_> = process
                    .match_list()
                    .iter()
                    .map(|entry| {
                        let mut after = entry.match_types().clone();
                        after.apply_delta(entry.update_types()).ok();
                        after
                    })
                    .collect();
                let ctx = RateContext {
                    process_number: process.id(),
                    rate_constant: process.base_rate(),
                    center,
                    relative_positions: &relative_positions,
                    types_before: &types_before,
                    types_after: &types_after,
                };
                let per_match_rate = callback.rate(ctx)?;
                if process.cache_rate() {
                    rate_table.insert(key, per_match_rate);
                }
                Ok(per_match_rate * task.multiplicity as f64)
            })
            .collect()
    }

    #[instrument(skip(interactions))]
    fn commit(tasks: &[MatchTask], rates: &[f64], interactions: &mut Interactions) {
        for (task, &rate) in tasks.iter().zip(rates).filter(|(t, _)| t.decision == Decision::Remove) {
            if let Some(process) = interactions.process_mut(task.process_id) {
                process.remove_site(task.site);
            }
            let _ = rate;
        }
        for (task, &rate) in tasks.iter().zip(rates).filter(|(t, _)| t.decision == Decision::Update) {
            if let Some(process) = interactions.process_mut(task.process_id) {
                process.update_rate(task.site, rate);
            }
        }
        for (task, &rate) in tasks.iter().zip(rates).filter(|(t, _)| t.decision == Decision::Add) {
            if let Some(process) = interactions.process_mut(task.process_id) {
                process.add_site(task.site, rate);
            }
        }
        interactions.update_probability_table();
    }
}
