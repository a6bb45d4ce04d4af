use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Transfer one or more source tables to the destination endpoint
    Transfer {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(
            long = "table",
            help = "Source table to transfer (repeatable)",
            value_name = "NAME"
        )]
        tables: Vec<String>,

        #[arg(
            long = "group",
            help = "Named table group from the config (repeatable)",
            value_name = "NAME"
        )]
        groups: Vec<String>,

        #[arg(long, help = "Concurrent upload workers per table")]
        workers: Option<usize>,

        #[arg(long, help = "Records per batch")]
        batch_size: Option<usize>,

        #[arg(long, help = "Scan and decode without uploading anything")]
        dry_run: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON summary to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// List configured table groups and name mappings
    Tables {
        #[arg(long, help = "Config file path")]
        config: String,
    },
}
