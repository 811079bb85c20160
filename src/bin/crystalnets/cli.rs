use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use crystalnets::StructureType;

#[derive(Parser)]
#[command(
    name = "CrystalNets",
    version,
    about = "Identify the topology of a crystal net",
    help_template = "\
usage: {usage}

{about}

{all-args}"
)]
pub struct Cli {
    /// Input structure file (CIF)
    #[arg(value_name = "FILE", required_unless_present = "genome")]
    pub input: Option<PathBuf>,

    /// Look up a topological genome string directly
    #[arg(short, long, value_name = "GENOME", conflicts_with = "input")]
    pub genome: Option<String>,

    /// Archive to match against (default: the built-in archive)
    #[arg(short, long, value_name = "PATH")]
    pub archive: Option<PathBuf>,

    /// How to interpret the structure
    #[arg(short = 'c', long = "structure", value_name = "TYPE", default_value = "auto")]
    pub structure: StructureKind,

    /// Suppress warnings; only errors are printed
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StructureKind {
    /// Use every heuristic that fits the input
    Auto,
    /// Metal-organic framework conventions (wide metal radii, relaxed
    /// valences)
    Mof,
    /// Vertices are pre-clustered building units (requires residues)
    Cluster,
    /// Zeolite conventions (drop O–O bonds)
    Zeolite,
    /// Always guess bonds from geometry
    Guess,
    /// Every atom is a vertex
    Atom,
}

impl From<StructureKind> for StructureType {
    fn from(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Auto => StructureType::Auto,
            StructureKind::Mof => StructureType::Mof,
            StructureKind::Cluster => StructureType::Cluster,
            StructureKind::Zeolite => StructureType::Zeolite,
            StructureKind::Guess => StructureType::Guess,
            StructureKind::Atom => StructureType::Atom,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
