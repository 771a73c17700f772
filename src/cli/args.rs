//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Collate module css, js and templates into a site
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, default_value = "collate.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Delete the build directory, then build styles, scripts, assets and documents
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build stylesheet collations
    Styles {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build script collations
    Scripts {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Mirror module assets into the build directory
    Mirror {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Render every page document
    Documents {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Render one module as a document
    Document {
        /// Module path relative to base (e.g. src/home/about)
        module: String,

        /// Document path to write instead of the derived one (e.g. /about/index.html)
        #[arg(long)]
        doc: Option<String>,

        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Delete the build directory
    Clean {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Print the modules of every collation
    #[command(visible_alias = "m")]
    Modules {
        #[command(flatten)]
        args: QueryArgs,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        args: QueryArgs,
    },
}

/// Shared build arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build for development (loaders and symlinked assets)
    #[arg(short, long)]
    pub dev: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Output arguments for the printing commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

impl Commands {
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match self {
            Self::Build { build_args }
            | Self::Styles { build_args }
            | Self::Scripts { build_args }
            | Self::Mirror { build_args }
            | Self::Documents { build_args }
            | Self::Document { build_args, .. }
            | Self::Clean { build_args } => Some(build_args),
            Self::Modules { .. } | Self::Config { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["collate", "-C", "site.toml", "build", "--dev", "-V"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        let args = cli.command.build_args().unwrap();
        assert!(args.dev && args.verbose);
    }

    #[test]
    fn test_parse_document() {
        let cli = Cli::parse_from(["collate", "document", "src/home/about", "--doc", "/a.html"]);
        match cli.command {
            Commands::Document { module, doc, .. } => {
                assert_eq!(module, "src/home/about");
                assert_eq!(doc.as_deref(), Some("/a.html"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_query_commands_have_no_build_args() {
        let cli = Cli::parse_from(["collate", "modules", "--pretty"]);
        assert!(cli.command.build_args().is_none());
    }
}
