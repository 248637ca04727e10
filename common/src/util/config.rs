use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub budgets: BudgetConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.budgets.validate()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlgorithm {
    Disable,
    Minimax,
    ScaleDelay,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BudgetConfig {
    #[serde(default = "default_algorithm")]
    pub algorithm: BudgetAlgorithm,
    #[serde(default = "default_max_criticality")]
    pub max_criticality: f64,
    #[serde(default = "default_criticality_exp")]
    pub criticality_exp: f64,
    #[serde(default)]
    pub dump_file: Option<String>,
    #[serde(default)]
    pub pert: PertConfig,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            max_criticality: default_max_criticality(),
            criticality_exp: default_criticality_exp(),
            dump_file: None,
            pert: PertConfig::default(),
        }
    }
}

impl BudgetConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.max_criticality > 0.0 && self.max_criticality <= 1.0) {
            return Err(anyhow::anyhow!(
                "budgets.max_criticality must be in (0, 1], got {}",
                self.max_criticality
            ));
        }
        if !(self.criticality_exp > 0.0) {
            return Err(anyhow::anyhow!(
                "budgets.criticality_exp must be positive, got {}",
                self.criticality_exp
            ));
        }
        self.pert.validate()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PertConfig {
    #[serde(default = "default_pert_min_iterations")]
    pub min_iterations: usize,
    #[serde(default = "default_pert_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_pert_convergence_ps")]
    pub convergence_threshold_ps: f64,
    #[serde(default)]
    pub temporary_dump_dir: Option<String>,
}

impl Default for PertConfig {
    fn default() -> Self {
        Self {
            min_iterations: default_pert_min_iterations(),
            max_iterations: default_pert_max_iterations(),
            convergence_threshold_ps: default_pert_convergence_ps(),
            temporary_dump_dir: None,
        }
    }
}

impl PertConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow::anyhow!("budgets.pert.max_iterations must be at least 1"));
        }
        if self.min_iterations > self.max_iterations {
            return Err(anyhow::anyhow!(
                "budgets.pert.min_iterations ({}) exceeds max_iterations ({})",
                self.min_iterations,
                self.max_iterations
            ));
        }
        if self.convergence_threshold_ps < 0.0 {
            return Err(anyhow::anyhow!(
                "budgets.pert.convergence_threshold_ps must not be negative"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_clock_period_ns")]
    pub clock_period_ns: f64,
    #[serde(default = "default_hold_time_ns")]
    pub hold_time_ns: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: default_clock_period_ns(),
            hold_time_ns: default_hold_time_ns(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default = "default_gen_nets")]
    pub nets: usize,
    #[serde(default = "default_gen_max_fanout")]
    pub max_fanout: usize,
    #[serde(default = "default_gen_levels")]
    pub levels: usize,
    #[serde(default = "default_gen_max_atoms_per_pin")]
    pub max_atoms_per_pin: usize,
    #[serde(default = "default_gen_cell_delay_ns")]
    pub cell_delay_ns: f64,
    #[serde(default = "default_gen_max_net_delay_ns")]
    pub max_net_delay_ns: f64,
    #[serde(default = "default_gen_seed")]
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nets: default_gen_nets(),
            max_fanout: default_gen_max_fanout(),
            levels: default_gen_levels(),
            max_atoms_per_pin: default_gen_max_atoms_per_pin(),
            cell_delay_ns: default_gen_cell_delay_ns(),
            max_net_delay_ns: default_gen_max_net_delay_ns(),
            seed: default_gen_seed(),
        }
    }
}

fn default_algorithm() -> BudgetAlgorithm {
    BudgetAlgorithm::Minimax
}

fn default_max_criticality() -> f64 {
    0.99
}

fn default_criticality_exp() -> f64 {
    1.0
}

fn default_pert_min_iterations() -> usize {
    3
}

fn default_pert_max_iterations() -> usize {
    8
}

fn default_pert_convergence_ps() -> f64 {
    800.0
}

fn default_clock_period_ns() -> f64 {
    10.0
}

fn default_hold_time_ns() -> f64 {
    0.0
}

fn default_gen_nets() -> usize {
    500
}

fn default_gen_max_fanout() -> usize {
    4
}

fn default_gen_levels() -> usize {
    6
}

fn default_gen_max_atoms_per_pin() -> usize {
    2
}

fn default_gen_cell_delay_ns() -> f64 {
    0.4
}

fn default_gen_max_net_delay_ns() -> f64 {
    1.5
}

fn default_gen_seed() -> u64 {
    1
}
