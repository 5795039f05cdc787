//! Sample extension catalogs for tests.
//!
//! The LTTng catalog schedules, for every table, into:
//!
//! ```text
//! pass 0: LTTng/Threads, LTTng/Stacks | LTTng/Syscalls, LTTng/CpuSamples
//! pass 1: LTTng/ContextSwitches
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Table requiring `/CpuUsage` and the `Symbols` processor.
pub const CPU_USAGE_TABLE: Uuid = Uuid::from_u128(0x6b0c1a4e_2f1d_4e8e_9e53_0c8a8f3c2d11);
/// Table requiring `LTTng/Syscalls`.
pub const SYSCALLS_TABLE: Uuid = Uuid::from_u128(0x6b0c1a4e_2f1d_4e8e_9e53_0c8a8f3c2d12);
/// Table requiring `LTTng/CpuSamples`.
pub const CPU_SAMPLES_TABLE: Uuid = Uuid::from_u128(0x6b0c1a4e_2f1d_4e8e_9e53_0c8a8f3c2d13);
/// Table requiring `ETW/DiskIo`.
pub const DISK_TABLE: Uuid = Uuid::from_u128(0x6b0c1a4e_2f1d_4e8e_9e53_0c8a8f3c2d21);
/// Table requiring a cooker with a missing requirement.
pub const BROKEN_TABLE: Uuid = Uuid::from_u128(0x6b0c1a4e_2f1d_4e8e_9e53_0c8a8f3c2d31);

/// A catalog file to write into a test directory.
#[derive(Clone, Debug)]
pub struct CatalogFixture {
    pub name: String,
    pub content: String,
}

impl CatalogFixture {
    /// LTTng cookers covering every strategy and dependency type, with three tables.
    pub fn lttng() -> Self {
        Self {
            name: "lttng".to_string(),
            content: r#"
[[source_cookers]]
source = "LTTng"
id = "Threads"

[[source_cookers]]
source = "LTTng"
id = "ContextSwitches"
requires = ["LTTng/Threads"]

[[source_cookers]]
source = "LTTng"
id = "Syscalls"
strategy = "as-consumed"
requires = ["LTTng/Threads"]
[source_cookers.dependency_types]
"LTTng/Threads" = "as-consumed"

[[source_cookers]]
source = "LTTng"
id = "Stacks"
strategy = "as-required"

[[source_cookers]]
source = "LTTng"
id = "CpuSamples"
requires = ["LTTng/Stacks"]

[[composite_cookers]]
id = "CpuUsage"
requires = ["LTTng/ContextSwitches"]

[[data_processors]]
id = "Symbols"
requires = ["LTTng/Threads"]

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d11"
name = "CPU Usage"
category = "Computation"
requires = ["/CpuUsage"]
requires_processors = ["Symbols"]

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d12"
name = "Syscalls"
category = "System"
requires = ["LTTng/Syscalls"]

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d13"
name = "CPU Samples"
category = "Computation"
requires = ["LTTng/CpuSamples"]
"#
            .trim()
            .to_string(),
        }
    }

    /// One ETW cooker and its table.
    pub fn etw() -> Self {
        Self {
            name: "etw".to_string(),
            content: r#"
[[source_cookers]]
source = "ETW"
id = "DiskIo"

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d21"
name = "Disk"
category = "IO"
requires = ["ETW/DiskIo"]
"#
            .trim()
            .to_string(),
        }
    }

    /// A cooker requiring an unregistered cooker, and a table reading it.
    pub fn broken() -> Self {
        Self {
            name: "broken".to_string(),
            content: r#"
[[source_cookers]]
source = "LTTng"
id = "Broken"
requires = ["LTTng/Missing"]

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d31"
name = "Broken"
requires = ["LTTng/Broken"]
"#
            .trim()
            .to_string(),
        }
    }

    /// Two cookers requiring each other.
    pub fn cyclic() -> Self {
        Self {
            name: "cyclic".to_string(),
            content: r#"
[[source_cookers]]
source = "S"
id = "A"
requires = ["S/B"]

[[source_cookers]]
source = "S"
id = "B"
requires = ["S/A"]
"#
            .trim()
            .to_string(),
        }
    }

    /// Catalog that is not valid TOML.
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: "[[source_cookers]\nsource = \"S\"".to_string(),
        }
    }

    /// Write the catalog as `<name>.toml` under `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.toml", self.name));
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write catalog fixture {}", path.display()))?;
        Ok(path)
    }
}
