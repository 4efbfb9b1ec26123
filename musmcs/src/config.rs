//! Tuning parameters, settable from environment variables.
//!
//! Each parameter is a static [`EnvParam`] holding the name of an environment variable and a
//! string representing its default value. The value is read from the environment on first access
//! and cached for the rest of the process: any later change of the variable is ignored.
//!
//! ```
//! use musmcs::config::EnvParam;
//! static MY_PARAM: EnvParam<u32> = EnvParam::new("MUSMCS_DOC_PARAM", "3");
//!
//! // environment variable not set, using default value "3"
//! assert_eq!(MY_PARAM.get(), 3);
//! ```
//!
//! The parameters are only defaults: [`ExplainConfig`] and [`MarcoConfig`](crate::marco::MarcoConfig)
//! are plain structs whose fields can be overridden by the caller.

use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::marco::{MapSolverMode, SubsetSolverOptiMode};

/// Timeout of each oracle call in milliseconds. `0` means no timeout.
pub static ORACLE_TIMEOUT_MS: EnvParam<u64> = EnvParam::new("MUSMCS_ORACLE_TIMEOUT_MS", "0");

/// Strategy of the MARCO map solver when proposing seeds.
pub static MAP_SOLVER_MODE: EnvParam<MapSolverMode> = EnvParam::new("MUSMCS_MAP_SOLVER_MODE", "high-preferred");

/// Whether shrinking may skip the members of known singleton MCSes.
pub static SKIP_SINGLETON_MCSES: EnvParam<bool> = EnvParam::new("MUSMCS_SKIP_SINGLETON_MCSES", "true");

/// Whether the optimal MUS search grows each satisfiable hitting set into an MSS
/// before learning its complement as a correction set.
pub static GROW_CORRECTION_SETS: EnvParam<bool> = EnvParam::new("MUSMCS_GROW_CORRECTION_SETS", "true");

pub struct EnvParam<T> {
    value: OnceCell<T>,
    env: &'static str,
    default: &'static str,
}

impl<T> EnvParam<T> {
    /// Creates a new parameter that will be initialized from the environment variable `env` or set
    /// `default` if the environment variable is not set.
    pub const fn new(env: &'static str, default: &'static str) -> EnvParam<T> {
        EnvParam {
            value: OnceCell::new(),
            env,
            default,
        }
    }

    pub fn name(&self) -> &'static str {
        self.env
    }
}

impl<T: FromStr> EnvParam<T> {
    fn read_default(&self) -> T {
        match T::from_str(self.default) {
            Ok(v) => v,
            Err(_) => panic!("[musmcs] {}: invalid default value \"{}\".", self.env, self.default),
        }
    }

    fn read(&self) -> T {
        match std::env::var(self.env) {
            Ok(param) => match T::from_str(&param) {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(
                        "could not parse the value \"{}\" of environment variable \"{}\", using default \"{}\"",
                        param,
                        self.env,
                        self.default
                    );
                    self.read_default()
                }
            },
            Err(std::env::VarError::NotPresent) => self.read_default(),
            Err(err) => {
                tracing::warn!("{}: {}, using default \"{}\"", self.env, err, self.default);
                self.read_default()
            }
        }
    }

    /// Returns the value of the parameter, reading it from the environment on the first call.
    ///
    /// # Panic
    /// Panics if the default value cannot be parsed, which is a programming error.
    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.get_ref()
    }

    pub fn get_ref(&self) -> &T {
        self.value.get_or_init(|| self.read())
    }

    /// Forces the value of the parameter.
    ///
    /// # Panic
    /// Panics if the parameter was already initialized (i.e. previously read).
    pub fn set(&self, value: T) {
        if self.value.set(value).is_err() {
            panic!("Parameter {} is already initialized (i.e. was previously accessed).", self.env);
        }
    }
}

/// Knobs shared by the single-explanation algorithms.
#[derive(Clone, Debug)]
pub struct ExplainConfig {
    /// Time limit given to the backend for each oracle call.
    pub oracle_timeout: Option<Duration>,
    /// See [`GROW_CORRECTION_SETS`].
    pub grow_correction_sets: bool,
}

impl ExplainConfig {
    pub fn from_env() -> Self {
        ExplainConfig {
            oracle_timeout: oracle_timeout_from_env(),
            grow_correction_sets: GROW_CORRECTION_SETS.get(),
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub(crate) fn oracle_timeout_from_env() -> Option<Duration> {
    match ORACLE_TIMEOUT_MS.get() {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

pub(crate) fn subset_solver_opti_mode_from_env() -> SubsetSolverOptiMode {
    if SKIP_SINGLETON_MCSES.get() {
        SubsetSolverOptiMode::KnownSingletonMCSes
    } else {
        SubsetSolverOptiMode::None
    }
}
