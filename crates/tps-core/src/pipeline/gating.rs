use serde::{Deserialize, Serialize};

/// Contador contra el que se evalúa `counter % interval == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingPolicy {
    /// Contador global `g` de steps terminados (todas las cadenas, en orden de
    /// llegada).
    #[default]
    Global,
    /// `step_number` del step dentro de su cadena.
    PerChain,
}

impl GatingPolicy {
    pub fn should_run(self, interval: u64, global_step: u64, step_number: u64) -> bool {
        if interval == 1 {
            return true;
        }
        let counter = match self {
            GatingPolicy::Global => global_step,
            GatingPolicy::PerChain => step_number,
        };
        interval != 0 && counter % interval == 0
    }
}

impl std::str::FromStr for GatingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per_chain" | "per-chain" | "chain" => Ok(Self::PerChain),
            other => Err(format!("unknown gating policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_one_always_runs() {
        for g in 1..10 {
            assert!(GatingPolicy::Global.should_run(1, g, 0));
        }
    }

    #[test]
    fn global_uses_g_per_chain_uses_step_number() {
        assert!(GatingPolicy::Global.should_run(3, 6, 1));
        assert!(!GatingPolicy::Global.should_run(3, 5, 3));
        assert!(GatingPolicy::PerChain.should_run(3, 5, 3));
        assert!(!GatingPolicy::PerChain.should_run(3, 6, 1));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("Global".parse::<GatingPolicy>().unwrap(), GatingPolicy::Global);
        assert_eq!("per-chain".parse::<GatingPolicy>().unwrap(), GatingPolicy::PerChain);
        assert!("sometimes".parse::<GatingPolicy>().is_err());
    }
}
