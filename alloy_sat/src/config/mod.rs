/*!
Configuration of a solving context.

All tunables for a [Context](crate::context::Context) live here, grouped the
way the teacher groups them: a small [ConfigOption] wrapper records a name
alongside a value (useful for reporting/validating against a min/max range),
and the top-level [Config] struct groups options by the subsystem they tune.
*/

use crate::generic::luby::LubyRepresentation;

/// A single named, bounded configuration value.
#[derive(Clone, Copy, Debug)]
pub struct ConfigOption<T> {
    pub name: &'static str,
    pub min: T,
    pub max: T,
    pub value: T,
}

/// Configuration of the clause database: when and how much to reduce.
#[derive(Clone, Copy, Debug)]
pub struct ClauseDBConfig {
    /// Learned-clause count above which a reduction pass is triggered.
    pub max_learned: usize,
    /// Amount `max_learned` grows by after each reduction.
    pub max_learned_increment: usize,
    /// Clause activity decay factor, applied once per conflict.
    pub clause_decay: f64,
}

impl Default for ClauseDBConfig {
    fn default() -> Self {
        ClauseDBConfig {
            max_learned: 2000,
            max_learned_increment: 500,
            clause_decay: 0.999,
        }
    }
}

/// Configuration of the atom database / VSIDS.
#[derive(Clone, Copy, Debug)]
pub struct AtomDBConfig {
    /// VSIDS activity decay factor, applied once per conflict.
    pub variable_decay: f64,
    /// Whether to default to the last-assigned phase for a decision.
    pub phase_saving: bool,
}

impl Default for AtomDBConfig {
    fn default() -> Self {
        AtomDBConfig {
            variable_decay: 0.95,
            phase_saving: true,
        }
    }
}

/// The primary configuration structure for a [Context](crate::context::Context).
#[derive(Clone, Debug)]
pub struct Config {
    pub atom_db: AtomDBConfig,
    pub clause_db: ClauseDBConfig,

    /// The base conflict count multiplied by the Luby sequence to decide restarts.
    pub luby_base: ConfigOption<LubyRepresentation>,

    /// Whether restarts are permitted at all.
    pub restart: ConfigOption<bool>,

    /// A wall-clock budget; zero means unbounded. The solver itself has no
    /// clock of its own beyond this check --- timers are a caller concern.
    pub time_limit: ConfigOption<std::time::Duration>,

    /// How many conflicts elapse between progress-callback invocations.
    pub progress_interval: ConfigOption<u64>,
}

impl Default for Config {
    /// Configured to produce quick, deterministic results suitable for tests
    /// and for driving an Alloy-style `run`/`check` command.
    fn default() -> Self {
        Config {
            atom_db: AtomDBConfig::default(),
            clause_db: ClauseDBConfig::default(),

            luby_base: ConfigOption {
                name: "luby_base",
                min: 1,
                max: LubyRepresentation::MAX,
                value: 100,
            },

            restart: ConfigOption {
                name: "restart",
                min: false,
                max: true,
                value: true,
            },

            time_limit: ConfigOption {
                name: "time_limit",
                min: std::time::Duration::from_secs(0),
                max: std::time::Duration::MAX,
                value: std::time::Duration::from_secs(0),
            },

            progress_interval: ConfigOption {
                name: "progress_interval",
                min: 1,
                max: u64::MAX,
                value: 1000,
            },
        }
    }
}
