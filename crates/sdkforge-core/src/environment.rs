//! Which toolchain executables are installed.

use crate::config::Toolchain;
use crate::process::resolve_executable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolution result for one executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAvailability {
    pub role: String,
    pub program: String,
    /// Absolute path when the executable was found.
    pub resolved: Option<PathBuf>,
}

impl ToolAvailability {
    pub fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Resolve every toolchain executable from `cwd`.
pub fn check_environment(toolchain: &Toolchain, cwd: &Path) -> Vec<ToolAvailability> {
    toolchain
        .entries()
        .into_iter()
        .map(|(role, program)| ToolAvailability {
            role: role.to_string(),
            program: program.to_string(),
            resolved: resolve_executable(program, cwd).ok(),
        })
        .collect()
}

/// Human-readable summary, ending with what to install when something is
/// missing.
pub fn render_environment(tools: &[ToolAvailability]) -> String {
    let mut text = String::from("Java SDK environment:\n\n");
    for tool in tools {
        match &tool.resolved {
            Some(path) => text.push_str(&format!("  {:<11} {}\n", tool.role, path.display())),
            None => text.push_str(&format!("  {:<11} missing ({})\n", tool.role, tool.program)),
        }
    }

    let missing: Vec<&str> = tools
        .iter()
        .filter(|t| !t.is_available())
        .map(|t| t.role.as_str())
        .collect();
    if missing.is_empty() {
        text.push_str("\nAll tools are available.\n");
    } else {
        text.push_str(&format!("\nInstall before generating: {}\n", missing.join(", ")));
        if missing.iter().any(|role| *role == "tsp" || *role == "tsp-client") {
            text.push_str(
                "TypeSpec tools: npm install -g @typespec/compiler @azure-tools/typespec-client-generator-cli\n",
            );
        }
        if missing.contains(&"maven") {
            text.push_str("Maven needs a JDK 8 or newer on PATH.\n");
        }
    }
    text
}
