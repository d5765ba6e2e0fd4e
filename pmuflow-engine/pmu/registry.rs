use std::collections::HashSet;

use once_cell::sync::OnceCell;

use crate::common::HostProbe;
use crate::config::SessionConfig;
use crate::error::{PmuError, Result, ValidationError};
use crate::events::validate;
use crate::pmu::{detect, PmuDescriptor, PmuId};

/// Collects descriptors and validates them into a [`PmuRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    pmus: Vec<PmuDescriptor>,
}

impl RegistryBuilder {
    pub fn register(mut self, pmu: PmuDescriptor) -> Self {
        self.pmus.push(pmu);
        self
    }

    pub fn register_all(mut self, pmus: impl IntoIterator<Item = PmuDescriptor>) -> Self {
        self.pmus.extend(pmus);
        self
    }

    /// Validate every descriptor; failures are excluded, never used
    pub fn build(self) -> PmuRegistry {
        let mut accepted: Vec<PmuDescriptor> = Vec::with_capacity(self.pmus.len());
        let mut rejected = Vec::new();
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for pmu in self.pmus {
            if ids.contains(&pmu.id) || names.contains(pmu.name) {
                tracing::warn!("Excluding {} (id {}): already registered", pmu.name, pmu.id);
                rejected.push(PmuError::Validation {
                    pmu: pmu.name.to_string(),
                    errors: vec![ValidationError::DuplicatePmu {
                        name: pmu.name.to_string(),
                        id: pmu.id.0,
                    }],
                });
                continue;
            }

            if let Err(errors) = validate::validate(&pmu) {
                for e in &errors {
                    tracing::error!("{}: {}", pmu.name, e);
                }
                tracing::error!("Excluding {}: event table failed validation", pmu.name);
                rejected.push(PmuError::Validation {
                    pmu: pmu.name.to_string(),
                    errors,
                });
                continue;
            }

            ids.insert(pmu.id);
            names.insert(pmu.name);
            accepted.push(pmu);
        }

        tracing::info!(
            "PMU registry built: {} registered, {} excluded",
            accepted.len(),
            rejected.len()
        );

        PmuRegistry {
            pmus: accepted,
            rejected,
            active: OnceCell::new(),
        }
    }
}

/// Read-only collection of validated descriptors plus the session's active one
#[derive(Debug)]
pub struct PmuRegistry {
    pmus: Vec<PmuDescriptor>,
    rejected: Vec<PmuError>,
    /// Memoised activation outcome: index of the active PMU or the failure message
    active: OnceCell<std::result::Result<usize, String>>,
}

impl PmuRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry of every compiled-in descriptor
    pub fn builtin() -> Self {
        Self::builder()
            .register_all(crate::tables::builtin())
            .build()
    }

    pub fn pmus(&self) -> &[PmuDescriptor] {
        &self.pmus
    }

    pub fn len(&self) -> usize {
        self.pmus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pmus.is_empty()
    }

    /// Descriptors excluded at build time, with the reason
    pub fn rejected(&self) -> &[PmuError] {
        &self.rejected
    }

    pub fn find(&self, name: &str) -> Option<&PmuDescriptor> {
        self.pmus.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, id: PmuId) -> Option<&PmuDescriptor> {
        self.pmus.iter().find(|p| p.id == id)
    }

    /// Activate with the default configuration
    pub fn activate(&self, probe: &dyn HostProbe) -> Result<&PmuDescriptor> {
        self.activate_with(&SessionConfig::default(), probe)
    }

    /// Run the detection cascade once; later calls return the same outcome
    pub fn activate_with(
        &self,
        config: &SessionConfig,
        probe: &dyn HostProbe,
    ) -> Result<&PmuDescriptor> {
        let outcome = self
            .active
            .get_or_init(|| self.run_activation(config, probe));

        match outcome {
            Ok(i) => Ok(&self.pmus[*i]),
            Err(msg) => Err(PmuError::NotSupported(msg.clone())),
        }
    }

    /// The active descriptor, if activation succeeded
    pub fn active(&self) -> Option<&PmuDescriptor> {
        match self.active.get() {
            Some(Ok(i)) => self.pmus.get(*i),
            _ => None,
        }
    }

    fn run_activation(
        &self,
        config: &SessionConfig,
        probe: &dyn HostProbe,
    ) -> std::result::Result<usize, String> {
        if let Some(name) = &config.force_pmu {
            return match self.pmus.iter().position(|p| p.name.eq_ignore_ascii_case(name)) {
                Some(i) => {
                    tracing::warn!("Forcing PMU {}, detection skipped", self.pmus[i].name);
                    Ok(i)
                }
                None => Err(format!("forced PMU {name} is not registered")),
            };
        }

        let host = probe
            .identity()
            .map_err(|e| format!("cannot identify host CPU: {e}"))?;

        match detect::cascade(&self.pmus, &host) {
            Ok(i) => {
                let pmu = &self.pmus[i];
                tracing::info!("Activated PMU {} ({})", pmu.name, pmu.description);
                Ok(i)
            }
            Err(e) => {
                tracing::warn!("PMU activation failed: {}", e);
                Err(e.to_string())
            }
        }
    }
}
