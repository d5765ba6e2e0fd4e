// Host CPU identity probing

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::common::cpuid;
use crate::error::{PmuError, Result};

/// Vendor, family, model and stepping of the running CPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub vendor: String,
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
}

impl HostIdentity {
    pub fn new(vendor: impl Into<String>, family: u32, model: u32, stepping: u32) -> Self {
        Self {
            vendor: vendor.into(),
            family,
            model,
            stepping,
        }
    }

    /// Decode a CPUID leaf 1 EAX signature into display family/model
    pub fn from_signature(vendor: impl Into<String>, eax: u32) -> Self {
        let stepping = eax & 0xF;
        let model = (eax >> 4) & 0xF;
        let family = (eax >> 8) & 0xF;
        let extended_model = (eax >> 16) & 0xF;
        let extended_family = (eax >> 20) & 0xFF;

        let display_family = if family == 0xF {
            family + extended_family
        } else {
            family
        };

        let display_model = if family == 0x6 || family == 0xF {
            (extended_model << 4) + model
        } else {
            model
        };

        Self::new(vendor, display_family, display_model, stepping)
    }

    /// Parse the first processor block of `/proc/cpuinfo`
    pub fn parse_cpuinfo(text: &str) -> Result<Self> {
        let mut vendor = None;
        let mut family = None;
        let mut model = None;
        let mut stepping = None;

        for line in text.lines() {
            if line.trim().is_empty() && vendor.is_some() {
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "vendor_id" => vendor = Some(value.to_string()),
                "cpu family" => family = value.parse::<u32>().ok(),
                "model" => model = value.parse::<u32>().ok(),
                "stepping" => stepping = value.parse::<u32>().ok(),
                _ => {}
            }
        }

        match (vendor, family, model, stepping) {
            (Some(vendor), Some(family), Some(model), Some(stepping)) => {
                Ok(Self::new(vendor, family, model, stepping))
            }
            _ => Err(PmuError::ParseError(
                "cpuinfo lacks vendor_id/cpu family/model/stepping".to_string(),
            )),
        }
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} family {:#x} model {:#x} stepping {}",
            self.vendor, self.family, self.model, self.stepping
        )
    }
}

fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

impl FromStr for HostIdentity {
    type Err = PmuError;

    /// `[vendor:]family:model:stepping`, vendor defaults to AuthenticAMD
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let (vendor, numbers) = match parts.len() {
            3 => ("AuthenticAMD", &parts[..]),
            4 => (parts[0], &parts[1..]),
            _ => {
                return Err(PmuError::ParseError(format!(
                    "expected [vendor:]family:model:stepping, got {s}"
                )))
            }
        };

        let parsed: Option<Vec<u32>> = numbers.iter().map(|n| parse_number(n)).collect();
        match parsed.as_deref() {
            Some(&[family, model, stepping]) => Ok(Self::new(vendor, family, model, stepping)),
            _ => Err(PmuError::ParseError(format!("invalid CPU signature: {s}"))),
        }
    }
}

/// Source of the host identity used by the detection cascade
pub trait HostProbe: Send + Sync {
    fn identity(&self) -> Result<HostIdentity>;
}

/// Probe the running CPU with `cpuid`, falling back to `/proc/cpuinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuidProbe;

impl HostProbe for CpuidProbe {
    fn identity(&self) -> Result<HostIdentity> {
        if cfg!(target_arch = "x86_64") {
            let identity = HostIdentity::from_signature(cpuid::vendor(), cpuid::signature());
            tracing::debug!(
                "CPU: {} Family {:X}, Model {:X}, Stepping {:X}",
                identity.vendor,
                identity.family,
                identity.model,
                identity.stepping
            );
            Ok(identity)
        } else {
            CpuinfoProbe::default().identity()
        }
    }
}

/// Probe through a cpuinfo-formatted file
#[derive(Debug, Clone)]
pub struct CpuinfoProbe {
    path: PathBuf,
}

impl CpuinfoProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CpuinfoProbe {
    fn default() -> Self {
        Self::new("/proc/cpuinfo")
    }
}

impl HostProbe for CpuinfoProbe {
    fn identity(&self) -> Result<HostIdentity> {
        let text = std::fs::read_to_string(&self.path)?;
        HostIdentity::parse_cpuinfo(&text)
    }
}

/// Fixed identity, for simulation and tests
#[derive(Debug, Clone)]
pub struct StaticProbe(pub HostIdentity);

impl HostProbe for StaticProbe {
    fn identity(&self) -> Result<HostIdentity> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_decoding() {
        // Opteron 248, family 0Fh model 05h stepping 1
        let id = HostIdentity::from_signature("AuthenticAMD", 0x0000_0F51);
        assert_eq!((id.family, id.model, id.stepping), (0xF, 0x5, 0x1));

        // Phenom II X4 (Family 10h, model 4, stepping 2)
        let id = HostIdentity::from_signature("AuthenticAMD", 0x0010_0F42);
        assert_eq!((id.family, id.model, id.stepping), (0x10, 0x4, 0x2));
    }

    #[test]
    fn test_parse_cpuinfo() {
        let text = "processor\t: 0\nvendor_id\t: AuthenticAMD\ncpu family\t: 15\n\
                    model\t\t: 65\nmodel name\t: Dual-Core AMD Opteron\nstepping\t: 2\n\n\
                    processor\t: 1\nvendor_id\t: GenuineIntel\n";
        let id = HostIdentity::parse_cpuinfo(text).unwrap();
        assert_eq!(id, HostIdentity::new("AuthenticAMD", 15, 65, 2));

        assert!(HostIdentity::parse_cpuinfo("processor: 0\n").is_err());
    }

    #[test]
    fn test_from_str() {
        let id: HostIdentity = "15:0x41:2".parse().unwrap();
        assert_eq!(id, HostIdentity::new("AuthenticAMD", 15, 0x41, 2));

        let id: HostIdentity = "GenuineIntel:6:85:4".parse().unwrap();
        assert_eq!(id.vendor, "GenuineIntel");

        assert!("15:65".parse::<HostIdentity>().is_err());
        assert!("15:x:2".parse::<HostIdentity>().is_err());
    }

    #[test]
    fn test_static_probe() {
        let probe = StaticProbe(HostIdentity::new("AuthenticAMD", 16, 4, 2));
        assert_eq!(probe.identity().unwrap().family, 16);
    }
}
