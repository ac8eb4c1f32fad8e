// SPDX-License-Identifier: Apache-2.0
//! On-disk TOML schema for a run, and the glue that turns it into the
//! live [`LatticeModel`] types `kmc-core` actually operates on.

use anyhow::{bail, Context, Result};
use kmc_core::{
    new_random_source, Configuration, Interactions, LatticeMap, LatticeModel, OnTheFlyMSD, Process, TypeBucket,
};
use kmc_geom::Coordinate;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub lattice: LatticeConfig,
    pub n_types: usize,
    #[serde(default)]
    pub initial_occupancy: Vec<SiteOccupancy>,
    pub rng: RngConfig,
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
    pub steps: u64,
    pub msd: Option<MsdConfig>,
}

#[derive(Debug, Deserialize)]
pub struct LatticeConfig {
    pub basis_count: usize,
    pub repetitions: [usize; 3],
    pub periodic: [bool; 3],
    /// One coordinate per site in global-index order. Omit only when
    /// `basis_count == 1`, in which case a simple-cubic embedding
    /// (`(i, j, k)` in cell units) is generated automatically.
    pub coordinates: Option<Vec<[f64; 3]>>,
}

#[derive(Debug, Deserialize)]
pub struct SiteOccupancy {
    pub site: usize,
    pub counts: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RngConfig {
    pub backend: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub time_seed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProcessConfig {
    pub id: usize,
    pub base_rate: f64,
    #[serde(default)]
    pub cache_rate: bool,
    pub basis_sites: Vec<usize>,
    pub positions: Vec<[f64; 3]>,
    pub before: Vec<Vec<i64>>,
    pub after: Vec<Vec<i64>>,
    pub move_vectors: Vec<Option<[f64; 3]>>,
}

#[derive(Debug, Deserialize)]
pub struct MsdConfig {
    pub history_steps: usize,
    pub n_bins: usize,
    pub t_max: f64,
    pub block_size: usize,
    pub abc_to_xyz: [[f64; 3]; 3],
    /// Type index a site must hold to have its occupant's moves sampled.
    pub tracked_type: usize,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {} as a run config", path.display()))
    }
}

fn to_coordinate(components: [f64; 3]) -> Coordinate {
    Coordinate::new(components[0], components[1], components[2])
}

/// Builds the [`Configuration`] named by `config.lattice`/`config.n_types`,
/// then applies every entry of `config.initial_occupancy`.
pub fn build_configuration(config: &RunConfig) -> Result<Configuration> {
    let lattice = LatticeMap::new(config.lattice.basis_count, config.lattice.repetitions, config.lattice.periodic);

    let coordinates: Vec<Coordinate> = match &config.lattice.coordinates {
        Some(raw) => raw.iter().copied().map(to_coordinate).collect(),
        None => {
            if config.lattice.basis_count != 1 {
                bail!("lattice.coordinates is required when basis_count != 1");
            }
            (0..lattice.total_sites())
                .map(|index| {
                    let (i, j, k) = lattice.index_to_cell(index);
                    Coordinate::new(i as f64, j as f64, k as f64)
                })
                .collect()
        }
    };

    let mut configuration = Configuration::new(lattice, coordinates, config.n_types)?;
    for entry in &config.initial_occupancy {
        configuration.set_occupancy(entry.site, TypeBucket::from_counts(entry.counts.clone()));
    }
    Ok(configuration)
}

/// Builds an [`Interactions`] registry from `config.processes`. Custom
/// per-match rates are enabled as soon as any process asks to cache its
/// rate, since caching only matters once a [`kmc_core::RateCallback`] is in
/// play; a pure constant-rate run never needs the fingerprint cache.
pub fn build_interactions(config: &RunConfig) -> Result<Interactions> {
    let use_custom_rates = config.processes.iter().any(|p| p.cache_rate);
    let mut processes = Vec::with_capacity(config.processes.len());
    for p in &config.processes {
        let positions = p.positions.iter().copied().map(to_coordinate).collect();
        let before = p.before.iter().cloned().map(TypeBucket::from_counts).collect();
        let after = p.after.iter().cloned().map(TypeBucket::from_counts).collect();
        let move_vectors = p.move_vectors.iter().map(|m| m.map(to_coordinate)).collect();
        let process = Process::new(
            p.id,
            positions,
            before,
            after,
            move_vectors,
            p.basis_sites.clone(),
            p.base_rate,
            p.cache_rate,
        )
        .with_context(|| format!("building process {}", p.id))?;
        processes.push(process);
    }
    Ok(Interactions::new(processes, use_custom_rates))
}

pub fn build_msd(config: &RunConfig) -> Option<OnTheFlyMSD> {
    let msd = config.msd.as_ref()?;
    let abc_to_xyz = [
        to_coordinate(msd.abc_to_xyz[0]),
        to_coordinate(msd.abc_to_xyz[1]),
        to_coordinate(msd.abc_to_xyz[2]),
    ];
    Some(OnTheFlyMSD::new(
        msd.history_steps,
        msd.n_bins,
        msd.t_max,
        abc_to_xyz,
        msd.block_size,
        msd.tracked_type,
    ))
}

/// Builds a fully wired [`LatticeModel`] from a parsed config, using a
/// plain constant-rate callback: no process in this CLI's schema currently
/// expresses a custom rate function, only base-rate-times-multiplicity.
pub fn build_model(config: &RunConfig) -> Result<LatticeModel> {
    let configuration = build_configuration(config)?;
    let interactions = build_interactions(config)?;
    let rng = new_random_source(&config.rng.backend, config.rng.time_seed, config.rng.seed)?;
    let msd = build_msd(config);
    let mut model = LatticeModel::new(configuration, interactions, rng, Box::new(kmc_core::ConstantRateCallback), msd);
    model.init_match_lists()?;
    Ok(model)
}
