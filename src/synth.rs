//! Cloud assembly output.
//!
//! Synthesizing writes the stack template and a small manifest into an output
//! directory (`cdk.out` by default), laid out so the AWS CDK toolkit can also
//! deploy it:
//!
//! ```text
//! cdk.out/
//! ├── manifest.json
//! └── ClaudeServerStack.template.json
//! ```

use crate::error::Result;
use crate::stack::ClaudeServerStack;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default assembly directory
pub const DEFAULT_OUT_DIR: &str = "cdk.out";

/// Cloud assembly schema version written to the manifest
pub const MANIFEST_VERSION: &str = "36.0.0";

/// `manifest.json` contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub artifacts: IndexMap<String, Artifact>,
}

/// One assembly artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: String,
    pub environment: String,
    pub properties: ArtifactProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    pub template_file: String,
}

/// Paths of a written assembly.
#[derive(Debug, Clone)]
pub struct CloudAssembly {
    pub template_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// File name of a stack's template inside the assembly.
pub fn template_file_name(stack_name: &str) -> String {
    format!("{stack_name}.template.json")
}

/// Build the manifest for a stack.
pub fn manifest_for(stack: &ClaudeServerStack) -> Manifest {
    let mut artifacts = IndexMap::new();
    artifacts.insert(
        stack.name().to_string(),
        Artifact {
            kind: "aws:cloudformation:stack".to_string(),
            environment: stack.environment().uri(),
            properties: ArtifactProperties {
                template_file: template_file_name(stack.name()),
            },
        },
    );

    Manifest {
        version: MANIFEST_VERSION.to_string(),
        artifacts,
    }
}

/// Write the stack template and manifest into `out_dir`.
pub fn synthesize(stack: &ClaudeServerStack, out_dir: &Path) -> Result<CloudAssembly> {
    std::fs::create_dir_all(out_dir)?;

    let template_path = out_dir.join(template_file_name(stack.name()));
    std::fs::write(&template_path, stack.template().to_json()?)?;

    let manifest_path = out_dir.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest_for(stack))?)?;

    info!("Synthesized {} into {}", stack.name(), out_dir.display());

    Ok(CloudAssembly {
        template_path,
        manifest_path,
    })
}
