/// Knobs applied when a session is created
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Activate this PMU by name instead of running detection
    pub force_pmu: Option<String>,
    pub verbose: bool,
}

impl SessionConfig {
    pub const FORCE_PMU_VAR: &'static str = "PMUFLOW_FORCE_PMU";
    pub const VERBOSE_VAR: &'static str = "PMUFLOW_VERBOSE";

    /// Build a configuration from `PMUFLOW_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let force_pmu = lookup(Self::FORCE_PMU_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let config = Self {
            force_pmu,
            verbose: lookup(Self::VERBOSE_VAR).is_some_and(|v| Self::is_truthy(&v)),
        };

        if let Some(pmu) = &config.force_pmu {
            tracing::info!("{} set, forcing PMU {}", Self::FORCE_PMU_VAR, pmu);
        }

        config
    }

    fn is_truthy(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    }

    pub fn with_force_pmu(self, pmu: Option<String>) -> Self {
        Self {
            force_pmu: pmu.or(self.force_pmu),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PMUFLOW_FORCE_PMU", " amd64_k8_revc "),
            ("PMUFLOW_VERBOSE", "yes"),
        ]
        .into_iter()
        .collect();

        let config = SessionConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.force_pmu.as_deref(), Some("amd64_k8_revc"));
        assert!(config.verbose);
    }

    #[test]
    fn test_empty_force_is_ignored() {
        let config = SessionConfig::from_lookup(|k| {
            (k == SessionConfig::FORCE_PMU_VAR).then(|| "  ".to_string())
        });
        assert_eq!(config.force_pmu, None);
    }

    #[test]
    fn test_cli_force_overrides_env() {
        let config = SessionConfig {
            force_pmu: Some("env".to_string()),
            ..Default::default()
        };
        let config = config.with_force_pmu(Some("cli".to_string()));
        assert_eq!(config.force_pmu.as_deref(), Some("cli"));
        let config = config.with_force_pmu(None);
        assert_eq!(config.force_pmu.as_deref(), Some("cli"));
    }
}
