//! chainkb CLI: forward-chaining knowledge base with truth maintenance.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use chainkb::config::SessionConfig;
use chainkb::kb::KnowledgeBase;
use chainkb::parse::{parse_item, parse_statement};

#[derive(Parser)]
#[command(name = "chainkb", version, about = "Forward-chaining rule engine with truth maintenance")]
struct Cli {
    /// Session config (TOML).
    #[arg(long, global = true, default_value = "chainkb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a knowledge file, chain to fixpoint and print the result.
    Show {
        /// Knowledge file with `fact:` and `rule:` lines.
        #[arg(long)]
        file: PathBuf,

        /// Print the store as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask which facts match a statement, e.g. "(isa ?x block)".
    Ask {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        query: String,
    },

    /// Retract an item, e.g. "fact: (isa cube block)", and print what remains.
    Retract {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        item: String,

        /// Print the remaining store as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Explain why a fact is believed.
    Why {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        fact: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let config = SessionConfig::load_or_default(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Show { file, json } => {
            let kb = config.open_kb(&[file])?;
            print_kb(&kb, &config, json)?;
        }

        Commands::Ask { file, query } => {
            let kb = config.open_kb(&[file])?;
            let statement = parse_statement(&query)?;
            let answers = kb.ask_statement(&statement);
            if answers.is_empty() {
                println!("No facts match {statement}.");
            } else {
                println!("Answers for {statement} ({}):", answers.len());
                for (i, answer) in answers.iter().enumerate() {
                    println!("  {}. {answer}", i + 1);
                }
            }
        }

        Commands::Retract { file, item, json } => {
            let mut kb = config.open_kb(&[file])?;
            let target = parse_item(&item)?;
            let result = kb.retract(&target);

            if result.is_noop() {
                println!("Nothing retracted for {target}.");
            } else if let Some(id) = result.demoted {
                println!("{id} {target} is still derived; it is no longer asserted.");
            } else {
                println!(
                    "Retracted {} item(s), cascade depth {}:",
                    result.retracted.len(),
                    result.cascade_depth
                );
                for (id, removed) in &result.retracted {
                    println!("  - {id} {removed}");
                }
            }
            println!();
            print_kb(&kb, &config, json)?;
        }

        Commands::Why { file, fact } => {
            let kb = config.open_kb(&[file])?;
            let statement = parse_statement(&fact)?;
            match kb.find_fact(&statement) {
                Some(found) => {
                    let explanation = kb.explain(found.id()).unwrap_or_default();
                    print!("{explanation}");
                }
                None => println!("{statement} is not in the knowledge base."),
            }
        }
    }

    Ok(())
}

fn print_kb(kb: &KnowledgeBase, config: &SessionConfig, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(&kb.export()).into_diagnostic()?;
        println!("{out}");
        return Ok(());
    }

    print!("{kb}");
    if config.show_support {
        for item in kb.facts().chain(kb.rules()) {
            for support in item.supported_by() {
                println!(
                    "  {} <- {} + {}",
                    item.id(),
                    support.fact,
                    support.rule
                );
            }
        }
    }
    Ok(())
}
