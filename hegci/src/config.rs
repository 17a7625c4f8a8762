//! Run configuration loaded from a JSON file.

use super::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Full configuration of a solver run.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// System type; this solver only engages for `"heg"`.
    #[serde(rename = "type")]
    pub system: String,
    /// Number of spin-up electrons.
    pub n_up: usize,
    /// Number of spin-down electrons.
    pub n_dn: usize,
    /// Wigner–Seitz radius.
    pub r_s: f64,
    /// Ascending variational momentum cutoffs.
    pub rcut_vars: Vec<f64>,
    /// Descending variational thresholds.
    pub eps_vars: Vec<f64>,
    /// Multiplier yielding the mat-vec threshold for pre-existing
    /// determinants.
    pub eps_var_ham_old_ratio: f64,
    /// Multiplier yielding the mat-vec threshold for freshly added
    /// determinants.
    pub eps_var_ham_new_ratio: f64,
    /// Cutoffs reserved for the perturbation stage; parsed but unused.
    #[serde(default)]
    pub rcut_pts: Vec<f64>,
    /// Thresholds reserved for the perturbation stage; parsed but unused.
    #[serde(default)]
    pub eps_pts: Vec<f64>,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Checks the configuration for use by the electron-gas solver.
    /// Consecutive equal ladder values are tolerated; the solver skips them.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported system type, an empty or
    /// non-monotonic ladder, or unphysical parameters.
    pub fn validate(&self) -> Result<()> {
        if self.system != "heg" {
            return Err(Error::UnsupportedType(self.system.clone()));
        }
        if self.n_up + self.n_dn == 0 {
            return Err(Error::InvalidConfig(
                "n_up + n_dn must be positive".to_owned(),
            ));
        }
        if self.r_s <= 0.0 {
            return Err(Error::InvalidConfig("r_s must be positive".to_owned()));
        }
        if self.rcut_vars.is_empty() {
            return Err(Error::InvalidConfig(
                "rcut_vars must not be empty".to_owned(),
            ));
        }
        if self.eps_vars.is_empty() {
            return Err(Error::InvalidConfig(
                "eps_vars must not be empty".to_owned(),
            ));
        }
        if self.rcut_vars.iter().any(|&rcut| rcut <= 0.0) {
            return Err(Error::InvalidConfig(
                "rcut_vars must be positive".to_owned(),
            ));
        }
        if self.eps_vars.iter().any(|&eps| eps < 0.0) {
            return Err(Error::InvalidConfig(
                "eps_vars must be non-negative".to_owned(),
            ));
        }
        if self.rcut_vars.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(Error::InvalidConfig(
                "rcut_vars must be ascending".to_owned(),
            ));
        }
        if self.eps_vars.windows(2).any(|pair| pair[1] > pair[0]) {
            return Err(Error::InvalidConfig(
                "eps_vars must be descending".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        serde_json::from_str(
            r#"{
                "type": "heg",
                "n_up": 7,
                "n_dn": 7,
                "r_s": 1.0,
                "rcut_vars": [1.0, 2.0],
                "eps_vars": [0.1, 0.01],
                "eps_var_ham_old_ratio": 0.5,
                "eps_var_ham_new_ratio": 0.2
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_required_keys_and_defaults() {
        let config = config();

        assert_eq!(config.system, "heg");
        assert_eq!(config.n_up, 7);
        assert_eq!(config.n_dn, 7);
        assert_eq!(config.rcut_vars, [1.0, 2.0]);
        assert_eq!(config.eps_vars, [0.1, 0.01]);
        assert!(config.rcut_pts.is_empty());
        assert!(config.eps_pts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_type() {
        let mut config = config();
        config.system = "hubbard".to_owned();

        assert!(matches!(
            config.validate(),
            Err(Error::UnsupportedType(system)) if system == "hubbard"
        ));
    }

    #[test]
    fn rejects_zero_electrons() {
        let mut config = config();
        config.n_up = 0;
        config.n_dn = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_monotonic_ladders() {
        let mut ascending = config();
        ascending.rcut_vars = vec![2.0, 1.0];
        assert!(ascending.validate().is_err());

        let mut descending = config();
        descending.eps_vars = vec![0.01, 0.1];
        assert!(descending.validate().is_err());
    }

    #[test]
    fn tolerates_consecutive_equal_ladder_values() {
        let mut config = config();
        config.rcut_vars = vec![1.0, 1.0, 2.0];
        config.eps_vars = vec![0.1, 0.1, 0.01];

        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_required_key_fails_to_parse() {
        let result: std::result::Result<Config, _> = serde_json::from_str(
            r#"{"type": "heg", "n_up": 1, "n_dn": 1, "r_s": 1.0}"#,
        );

        assert!(result.is_err());
    }
}
