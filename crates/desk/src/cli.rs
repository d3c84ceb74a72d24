use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use forms::EntityKind;

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Buyer profile and property listing forms")]
pub struct Cli {
    /// Override the data directory (store files)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Validate a form input file and print every result
    Validate {
        #[arg(value_enum)]
        form: FormArg,
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Validate and submit; the record is appended to the local store
    Submit {
        #[arg(value_enum)]
        form: FormArg,
        #[arg(long, short)]
        input: PathBuf,
        /// Skip the simulated latency and reset delay
        #[arg(long)]
        no_delay: bool,
    },
    /// Save the input as the form's draft, without validation
    Draft {
        #[arg(value_enum)]
        form: FormArg,
        #[arg(long, short)]
        input: PathBuf,
    },
    /// List the form's fields
    Fields {
        #[arg(value_enum)]
        form: FormArg,
        /// Print the schema as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormArg {
    Buyer,
    Property,
}

impl From<FormArg> for EntityKind {
    fn from(value: FormArg) -> Self {
        match value {
            FormArg::Buyer => EntityKind::Buyer,
            FormArg::Property => EntityKind::Property,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_global_data_dir() {
        let cli = Cli::try_parse_from([
            "desk",
            "submit",
            "property",
            "--input",
            "listing.json",
            "--no-delay",
            "--data-dir",
            "/tmp/desk",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/desk")));
        match cli.cmd {
            Cmd::Submit {
                form,
                input,
                no_delay,
            } => {
                assert_eq!(EntityKind::from(form), EntityKind::Property);
                assert_eq!(input, PathBuf::from("listing.json"));
                assert!(no_delay);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_form() {
        assert!(Cli::try_parse_from(["desk", "fields", "tenant"]).is_err());
    }
}
