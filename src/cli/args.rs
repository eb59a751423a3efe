//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate pydantic schema modules from ORM entity definitions
#[derive(Parser, Debug)]
#[command(name = "modelgen")]
#[command(about = "Generate pydantic schema modules from ORM entity definitions")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect entities and write one schema module per source module
    Generate {
        /// Schema files or directories (overrides the config file)
        schema: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Entities to start from, e.g. app.user.User (can be repeated)
        #[arg(long)]
        seed: Vec<String>,

        /// Attributes to keep, `field` or `Entity.field` (can be repeated)
        #[arg(long, conflicts_with = "exclude")]
        include: Vec<String>,

        /// Attributes to leave out, `field` or `Entity.field` (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Import prefix of the generated tree
        #[arg(long)]
        package: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (python, json)
        #[arg(long)]
        format: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Collect entities and report what would be generated
    Check {
        /// Schema files or directories (overrides the config file)
        schema: Vec<PathBuf>,

        /// Entities to start from (can be repeated)
        #[arg(long)]
        seed: Vec<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let args = Args::try_parse_from(["modelgen", "generate"]).unwrap();
        match args.command {
            Command::Generate {
                schema,
                output,
                seed,
                format,
                verbose,
                ..
            } => {
                assert!(schema.is_empty());
                assert_eq!(output, None);
                assert!(seed.is_empty());
                assert_eq!(format, None);
                assert!(!verbose);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let args = Args::try_parse_from([
            "modelgen", "generate", "schema/", "extra.toml",
            "--output", "/tmp/gen",
            "--seed", "app.user.User",
            "--seed", "Address",
            "--exclude", "User.password",
            "--package", "gen",
            "--config", "custom.toml",
            "--format", "json",
            "--verbose",
        ])
        .unwrap();

        match args.command {
            Command::Generate {
                schema,
                output,
                seed,
                include,
                exclude,
                package,
                config,
                format,
                verbose,
            } => {
                assert_eq!(schema, vec![PathBuf::from("schema/"), PathBuf::from("extra.toml")]);
                assert_eq!(output, Some(PathBuf::from("/tmp/gen")));
                assert_eq!(seed, vec!["app.user.User".to_string(), "Address".to_string()]);
                assert!(include.is_empty());
                assert_eq!(exclude, vec!["User.password".to_string()]);
                assert_eq!(package, Some("gen".to_string()));
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
                assert_eq!(format, Some("json".to_string()));
                assert!(verbose);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_include() {
        let args = Args::try_parse_from([
            "modelgen", "generate", "--include", "User.email", "--include", "id",
        ])
        .unwrap();
        match args.command {
            Command::Generate { include, exclude, .. } => {
                assert_eq!(include, vec!["User.email".to_string(), "id".to_string()]);
                assert!(exclude.is_empty());
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_include_conflicts_with_exclude() {
        let result = Args::try_parse_from([
            "modelgen", "generate", "--include", "id", "--exclude", "password",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_command() {
        let args = Args::try_parse_from(["modelgen", "check", "models.toml", "--seed", "User"]).unwrap();
        match args.command {
            Command::Check { schema, seed, .. } => {
                assert_eq!(schema, vec![PathBuf::from("models.toml")]);
                assert_eq!(seed, vec!["User".to_string()]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_version_command() {
        let args = Args::try_parse_from(["modelgen", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));
    }
}
