use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

/// Placeholder in a tool's command template that is replaced with the
/// benchmark's absolute path.
pub const AIGER_PLACEHOLDER: &str = "$aiger";

const DEFAULT_TIMEOUT: u64 = 60;

/// mcbench benchmark harness for hardware model checkers
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// root directory of the benchmark corpus,
    /// every .aig/.aag file below it is evaluated
    pub corpus: PathBuf,

    /// tool manifest in toml format
    #[arg(short, long, default_value = "mcbench.toml")]
    pub config: PathBuf,

    /// cohort timeout in seconds, overrides the manifest
    #[arg(long)]
    pub timeout: Option<u64>,

    /// path to the aigsim witness checker, overrides the manifest
    #[arg(long)]
    pub aigsim: Option<PathBuf>,
}

/// One competitor configuration, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub cmd: Vec<String>,
    pub validate: bool,
}

impl Tool {
    /// Argument vector for one invocation, with every `$aiger` occurrence
    /// substituted by the benchmark path. No shell is involved.
    pub fn argv(&self, benchmark: &Path) -> Vec<String> {
        let path = benchmark.to_string_lossy();
        self.cmd
            .iter()
            .map(|arg| arg.replace(AIGER_PLACEHOLDER, &path))
            .collect()
    }
}

#[derive(Deserialize, Debug)]
struct Manifest {
    timeout: Option<u64>,
    aigsim: Option<PathBuf>,
    #[serde(default)]
    tool: Vec<ToolEntry>,
}

#[derive(Deserialize, Debug)]
struct ToolEntry {
    name: String,
    cmd: Vec<String>,
    #[serde(default)]
    validate: bool,
}

impl Manifest {
    fn parse(content: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(content)?;
        Ok(manifest)
    }

    fn from_file<P: AsRef<Path>>(p: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(p.as_ref())
            .with_context(|| format!("cannot read manifest {}", p.as_ref().display()))?;
        Self::parse(&content)
    }
}

/// Fully resolved run configuration: manifest merged with CLI overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub corpus: PathBuf,
    pub tools: Vec<Tool>,
    /// cohort deadline in seconds
    pub timeout: u64,
    pub aigsim: Option<PathBuf>,
}

impl Config {
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let manifest = Manifest::from_file(&cli.config)?;
        let corpus = cli
            .corpus
            .canonicalize()
            .with_context(|| format!("corpus root not found: {}", cli.corpus.display()))?;
        let tools = manifest
            .tool
            .into_iter()
            .map(|t| Tool {
                name: t.name,
                cmd: t.cmd,
                validate: t.validate,
            })
            .collect();
        let cfg = Self {
            corpus,
            tools,
            timeout: cli.timeout.or(manifest.timeout).unwrap_or(DEFAULT_TIMEOUT),
            aigsim: cli.aigsim.or(manifest.aigsim),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.tools.is_empty() {
            anyhow::bail!("manifest configures no tools");
        }
        if self.timeout == 0 {
            anyhow::bail!("timeout must be at least 1 second");
        }
        let mut seen = HashSet::new();
        for tool in self.tools.iter() {
            if !seen.insert(tool.name.as_str()) {
                anyhow::bail!("duplicate tool name: {}", tool.name);
            }
            if tool.cmd.is_empty() {
                anyhow::bail!("tool {} has an empty command", tool.name);
            }
            if !tool.cmd.iter().any(|a| a.contains(AIGER_PLACEHOLDER)) {
                anyhow::bail!(
                    "tool {} command has no {} placeholder",
                    tool.name,
                    AIGER_PLACEHOLDER
                );
            }
            if tool.validate && self.aigsim.is_none() {
                anyhow::bail!(
                    "tool {} requires witness validation but no aigsim path is configured",
                    tool.name
                );
            }
        }
        Ok(())
    }
}
