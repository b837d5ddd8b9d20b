//! CLI Module
//!
//! Command-line interface for graphing and sonifying functions.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::expr::DEFAULT_EXPRESSION;
use crate::state::Session;

/// Fxtone - graph a function of x and hear it
#[derive(Parser, Debug)]
#[command(name = "fxtone")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Preference file (dark mode)
    #[arg(long, global = true, default_value = "fxtone-prefs.json")]
    pub prefs: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Function definition and domain shared by several commands
#[derive(Args, Debug, Clone)]
pub struct FunctionArgs {
    /// f(x), e.g. "x * x", "Math.sin(x)", or "collatz"
    #[arg(short, long, default_value = DEFAULT_EXPRESSION)]
    pub expr: String,

    /// Lower limit of the domain
    #[arg(long, allow_negative_numbers = true)]
    pub lower: Option<f64>,

    /// Upper limit of the domain
    #[arg(long, allow_negative_numbers = true)]
    pub upper: Option<f64>,
}

impl FunctionArgs {
    /// Build a session the way the form fields would fill it in
    pub fn to_session(&self) -> Session {
        let mut session = Session::default();
        session.set_expression(self.expr.clone());
        if let Some(lower) = self.lower {
            session.set_lower(lower);
        }
        if let Some(upper) = self.upper {
            session.set_upper(upper);
        }
        session
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate f at the given x values
    #[command(name = "eval")]
    Eval {
        /// f(x)
        expression: String,

        /// x values
        #[arg(required = true, allow_negative_numbers = true)]
        xs: Vec<f64>,
    },

    /// Print the sample series as JSON
    #[command(name = "samples")]
    Samples {
        #[command(flatten)]
        function: FunctionArgs,

        /// Sampling step (defaults to the configured graph step)
        #[arg(long)]
        step: Option<f64>,
    },

    /// Render the graph to an SVG file
    #[command(name = "graph")]
    Graph {
        #[command(flatten)]
        function: FunctionArgs,

        /// Output SVG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Sonify the function into a WAV file
    #[command(name = "play")]
    Play {
        #[command(flatten)]
        function: FunctionArgs,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Stop after this many notes, then resume from there
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        stop_after: Option<u32>,
    },

    /// Show or toggle the dark-mode preference
    #[command(name = "theme")]
    Theme {
        /// Flip the stored setting
        #[arg(long)]
        toggle: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::Domain;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_graph_with_negative_bound() {
        let cli = Cli::try_parse_from([
            "fxtone", "graph", "--expr", "x * x", "--lower", "-5", "--upper", "5", "-o", "g.svg",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Graph { function, output }) => {
                assert_eq!(function.to_session().domain, Domain::new(-5.0, 5.0));
                assert_eq!(output, PathBuf::from("g.svg"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_collatz_defaults_domain_but_flags_override() {
        let args = FunctionArgs {
            expr: "collatz".into(),
            lower: None,
            upper: Some(50.0),
        };
        assert_eq!(args.to_session().domain, Domain::new(0.0, 50.0));
    }

    #[test]
    fn test_stop_after_must_be_positive() {
        assert!(Cli::try_parse_from(["fxtone", "play", "-o", "a.wav", "--stop-after", "0"]).is_err());
    }
}
